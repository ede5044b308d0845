//! Pipeline over the sled-backed store

use super::support::FaultyStore;
use arbor::ingest::{IngestOptions, IngestPipeline, RetryPolicy, UploadRequest};
use arbor::store::{find_unlinked, ItemStore, SledItemStore};
use arbor::tree::{rebuild_forest, parse_directory_text, FlatItem};
use std::sync::Arc;

const LISTING: &str = "\
workspace
├── api
│   ├── handlers
│   │   ├── users.rs
│   │   └── orders.rs
│   └── mod.rs
├── web
│   └── index.html
└── README.md
";

fn options(batch_size: usize) -> IngestOptions {
    IngestOptions {
        batch_size,
        retry: RetryPolicy::immediate(3),
        ..IngestOptions::default()
    }
}

#[tokio::test]
async fn upload_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let forest_id = {
        let store = Arc::new(SledItemStore::open(dir.path()).unwrap());
        let pipeline = IngestPipeline::new(store, options(3));
        let outcome = pipeline
            .upload(LISTING.as_bytes(), UploadRequest::new("workspace"))
            .await
            .unwrap();
        assert_eq!(outcome.batches, 3);
        assert_eq!(outcome.links.written, 8);
        outcome.forest.id
    };

    let store = SledItemStore::open(dir.path()).unwrap();
    let forest = store.get_forest(forest_id).await.unwrap().unwrap();
    assert!(forest.linked);
    assert_eq!(forest.total_batches, Some(3));

    let items = store.list_items(forest_id).await.unwrap();
    assert_eq!(items.len(), 9);
    assert!(find_unlinked(&items).is_empty());

    let flat: Vec<FlatItem> = items.into_iter().map(|item| item.item).collect();
    assert_eq!(rebuild_forest(&flat).unwrap(), parse_directory_text(LISTING));
}

#[tokio::test]
async fn parent_ids_match_parent_orders() {
    let store = Arc::new(SledItemStore::temporary().unwrap());
    let pipeline = IngestPipeline::new(store.clone(), options(2));
    let outcome = pipeline
        .upload(LISTING.as_bytes(), UploadRequest::new("ids"))
        .await
        .unwrap();

    let items = store.list_items(outcome.forest.id).await.unwrap();
    for item in &items {
        let expected = item
            .item
            .parent_order
            .map(|order| items[order as usize].id);
        assert_eq!(item.parent_id, expected, "item {}", item.item.name);
    }
}

#[tokio::test]
async fn two_forests_from_the_same_listing_are_independent() {
    let store = Arc::new(SledItemStore::temporary().unwrap());
    let pipeline = IngestPipeline::new(store.clone(), options(4));

    let first = pipeline
        .upload(LISTING.as_bytes(), UploadRequest::new("one"))
        .await
        .unwrap();
    let second = pipeline
        .upload(LISTING.as_bytes(), UploadRequest::new("two"))
        .await
        .unwrap();
    assert_ne!(first.forest.id, second.forest.id);
    assert_eq!(second.receipt.inserted, 9);

    assert!(store.delete_forest(first.forest.id).await.unwrap());
    assert_eq!(store.list_items(second.forest.id).await.unwrap().len(), 9);
    let names: Vec<String> = store
        .list_forests()
        .await
        .unwrap()
        .into_iter()
        .map(|forest| forest.name)
        .collect();
    assert_eq!(names, vec!["two".to_string()]);
}

#[tokio::test]
async fn faulty_wrapper_reports_same_outcome_shape() {
    let store = Arc::new(FaultyStore::failing_links(1));
    let pipeline = IngestPipeline::new(store.clone(), options(5));
    let outcome = pipeline
        .upload(LISTING.as_bytes(), UploadRequest::new("flaky"))
        .await
        .unwrap();
    // One link chunk, written twice.
    assert_eq!(store.link_calls(), 2);
    assert!(outcome.forest.linked);
}
