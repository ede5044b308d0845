//! End-to-end scenarios over the in-memory store

use super::support::FaultyStore;
use arbor::error::IngestError;
use arbor::ingest::{IngestOptions, IngestPipeline, RetryPolicy, UploadRequest};
use arbor::store::{find_unlinked, ItemStore, MemoryItemStore};
use arbor::tree::{flatten, flatten_levelled, parse_directory_text, rebuild_forest, LinkStrategy};
use arbor::types::ItemKind;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn options() -> IngestOptions {
    IngestOptions {
        retry: RetryPolicy::immediate(3),
        ..IngestOptions::default()
    }
}

#[test]
fn space_listing_flattens_to_linked_items() {
    let forest = parse_directory_text("root\n  docs\n    readme.md\n  src");
    let items = flatten(&forest, LinkStrategy::SamePass);

    let summary: Vec<(&str, ItemKind, u64, Option<u64>)> = items
        .iter()
        .map(|item| (item.name.as_str(), item.kind, item.order, item.parent_order))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("root", ItemKind::Folder, 0, None),
            ("docs", ItemKind::Folder, 1, Some(0)),
            ("readme.md", ItemKind::File, 2, Some(1)),
            ("src", ItemKind::Folder, 3, Some(0)),
        ]
    );
}

#[tokio::test]
async fn linking_flat_list_reproduces_hierarchy() {
    let store = Arc::new(MemoryItemStore::new());
    let pipeline = IngestPipeline::new(store.clone(), options());
    let outcome = pipeline
        .upload(
            "root\n  docs\n    readme.md\n  src".as_bytes(),
            UploadRequest::new("scenario-b"),
        )
        .await
        .unwrap();

    let items = store.list_items(outcome.forest.id).await.unwrap();
    let names: Vec<&str> = items.iter().map(|item| item.item.name.as_str()).collect();
    assert_eq!(names, vec!["root", "docs", "readme.md", "src"]);

    let id_of = |name: &str| items.iter().find(|i| i.item.name == name).unwrap().id;
    let parent_of = |name: &str| items.iter().find(|i| i.item.name == name).unwrap().parent_id;
    assert_eq!(parent_of("root"), None);
    assert_eq!(parent_of("docs"), Some(id_of("root")));
    assert_eq!(parent_of("readme.md"), Some(id_of("docs")));
    assert_eq!(parent_of("src"), Some(id_of("root")));
    assert!(find_unlinked(&items).is_empty());
}

#[test]
fn levelled_entries_link_like_parsed_text() {
    let items = flatten_levelled([
        ("root", ItemKind::Folder, 0),
        ("docs", ItemKind::Folder, 1),
        ("readme.md", ItemKind::File, 2),
        ("src", ItemKind::Folder, 1),
    ]);
    let parents: Vec<Option<u64>> = items.iter().map(|item| item.parent_order).collect();
    assert_eq!(parents, vec![None, Some(0), Some(1), Some(0)]);

    let rebuilt = rebuild_forest(&items).unwrap();
    assert_eq!(rebuilt, parse_directory_text("root\n  docs\n    readme.md\n  src"));
}

#[tokio::test]
async fn oversized_input_is_rejected_before_parsing() {
    let store = Arc::new(MemoryItemStore::new());
    let pipeline = IngestPipeline::new(
        store.clone(),
        IngestOptions {
            max_input_bytes: 1024,
            ..options()
        },
    );
    let blob = "folder\n  file.txt\n".repeat(100);

    match pipeline.upload(blob.as_bytes(), UploadRequest::new("big")).await {
        Err(IngestError::InputTooLarge { size, limit }) => {
            assert_eq!(size, blob.len());
            assert_eq!(limit, 1024);
        }
        other => panic!("expected InputTooLarge, got {:?}", other),
    }
    assert!(store.list_forests().await.unwrap().is_empty());
}

#[tokio::test]
async fn failing_link_writes_keep_content_rows() {
    let store = Arc::new(FaultyStore::failing_links(u32::MAX));
    let pipeline = IngestPipeline::new(store.clone(), options());

    let err = pipeline
        .upload(
            "root\n  docs\n    readme.md\n  src".as_bytes(),
            UploadRequest::new("scenario-d"),
        )
        .await
        .unwrap_err();
    let forest_id = err.forest_id().expect("failure carries a continuation token");
    match err {
        IngestError::LinkResolutionFailed {
            attempts,
            resolved,
            pending,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(resolved, 0);
            assert_eq!(pending, 3);
        }
        other => panic!("expected LinkResolutionFailed, got {:?}", other),
    }
    assert_eq!(store.link_calls(), 3);

    let items = store.list_items(forest_id).await.unwrap();
    assert_eq!(items.len(), 4);
    let unlinked: Vec<&str> = find_unlinked(&items)
        .into_iter()
        .map(|item| item.item.name.as_str())
        .collect();
    assert_eq!(unlinked, vec!["docs", "readme.md", "src"]);
    assert!(!store.get_forest(forest_id).await.unwrap().unwrap().linked);
}

#[tokio::test]
async fn resuming_after_link_failure_converges() {
    let store = Arc::new(FaultyStore::failing_links(3));
    let pipeline = IngestPipeline::new(store.clone(), options());
    let text = "root\n├── docs\n│   └── readme.md\n└── src";

    let forest_id = pipeline
        .upload(text.as_bytes(), UploadRequest::new("flaky"))
        .await
        .unwrap_err()
        .forest_id()
        .unwrap();
    let before = store.inner.identities_for_orders(forest_id, &[0, 1, 2, 3]).await.unwrap();

    let outcome = pipeline
        .upload(text.as_bytes(), UploadRequest::resuming("flaky", forest_id))
        .await
        .unwrap();
    assert_eq!(outcome.forest.id, forest_id);
    assert_eq!(outcome.receipt.inserted, 0);
    assert_eq!(outcome.receipt.skipped, 4);
    assert_eq!(outcome.links.written, 3);
    assert!(outcome.forest.linked);

    let after = store.inner.identities_for_orders(forest_id, &[0, 1, 2, 3]).await.unwrap();
    assert_eq!(before, after);
    assert_eq!(store.list_forests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_batch_blocks_linking_until_resumed() {
    let store = Arc::new(FaultyStore::failing_batch(2, 3));
    let pipeline = IngestPipeline::new(
        store.clone(),
        IngestOptions {
            batch_size: 2,
            ..options()
        },
    );
    let text = "a\n  b\n  c\n  d\n  e";

    let err = pipeline
        .upload(text.as_bytes(), UploadRequest::new("partial"))
        .await
        .unwrap_err();
    let forest_id = err.forest_id().unwrap();
    assert!(matches!(
        err,
        IngestError::BatchWriteFailed {
            batch_number: 2,
            total_batches: 3,
            attempts: 3,
            ..
        }
    ));
    assert_eq!(store.link_calls(), 0);
    assert_eq!(
        store.received_batches(forest_id).await.unwrap().into_iter().collect::<Vec<_>>(),
        vec![1]
    );

    let outcome = pipeline
        .upload(text.as_bytes(), UploadRequest::resuming("partial", forest_id))
        .await
        .unwrap();
    assert_eq!(outcome.receipt.inserted, 3);
    assert_eq!(outcome.receipt.skipped, 2);
    assert!(outcome.forest.linked);
}

#[tokio::test]
async fn transient_batch_failure_is_retried() {
    let store = Arc::new(FaultyStore::failing_batch(1, 2));
    let pipeline = IngestPipeline::new(store.clone(), options());

    let outcome = pipeline
        .upload(b"a\n  b.txt", UploadRequest::new("retry"))
        .await
        .unwrap();
    assert_eq!(outcome.receipt.inserted, 2);
    assert!(outcome.forest.linked);
}

#[tokio::test]
async fn empty_listing_uploads_an_empty_linked_forest() {
    let store = Arc::new(MemoryItemStore::new());
    let pipeline = IngestPipeline::new(store.clone(), options());

    let outcome = pipeline
        .upload(b"\n\n   \n", UploadRequest::new("empty"))
        .await
        .unwrap();
    assert_eq!(outcome.batches, 1);
    assert_eq!(outcome.receipt.inserted, 0);
    assert!(outcome.forest.linked);
    assert!(store.list_items(outcome.forest.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn resumed_rows_unlink_a_linked_forest_until_relinked() {
    let store = Arc::new(FaultyStore::default());
    let pipeline = IngestPipeline::new(store.clone(), options());

    let first = pipeline
        .upload(b"a", UploadRequest::new("growing"))
        .await
        .unwrap();
    assert!(first.forest.linked);

    store.link_failures.store(u32::MAX, Ordering::SeqCst);
    let err = pipeline
        .upload(b"a\n  b\n  c", UploadRequest::resuming("growing", first.forest.id))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::LinkResolutionFailed { pending: 2, .. }));
    assert_eq!(err.forest_id(), Some(first.forest.id));

    let items = store.list_items(first.forest.id).await.unwrap();
    assert_eq!(find_unlinked(&items).len(), 2);
    let forest = store.get_forest(first.forest.id).await.unwrap().unwrap();
    assert!(!forest.linked);

    store.link_failures.store(0, Ordering::SeqCst);
    let outcome = pipeline
        .upload(b"a\n  b\n  c", UploadRequest::resuming("growing", first.forest.id))
        .await
        .unwrap();
    assert_eq!(outcome.links.written, 2);
    assert!(outcome.forest.linked);
}

#[tokio::test]
async fn failing_identity_lookup_keeps_resume_token() {
    let store = Arc::new(FaultyStore::failing_identities(u32::MAX));
    let pipeline = IngestPipeline::new(store.clone(), options());
    let text = "root\n  docs\n    readme.md\n  src";

    let err = pipeline
        .upload(text.as_bytes(), UploadRequest::new("lookup"))
        .await
        .unwrap_err();
    let forest_id = err.forest_id().expect("forest was created before the failure");
    match err {
        IngestError::ForestReadFailed {
            operation, attempts, ..
        } => {
            assert_eq!(operation, "identities_for_orders");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected ForestReadFailed, got {:?}", other),
    }
    assert_eq!(store.list_forests().await.unwrap().len(), 1);
    assert_eq!(store.list_items(forest_id).await.unwrap().len(), 4);
    assert_eq!(store.link_calls(), 0);

    store.identity_failures.store(0, Ordering::SeqCst);
    let outcome = pipeline
        .upload(text.as_bytes(), UploadRequest::resuming("lookup", forest_id))
        .await
        .unwrap();
    assert_eq!(outcome.links.written, 3);
    assert!(outcome.forest.linked);
}

#[tokio::test]
async fn transient_identity_lookup_is_retried() {
    let store = Arc::new(FaultyStore::failing_identities(2));
    let pipeline = IngestPipeline::new(store.clone(), options());

    let outcome = pipeline
        .upload(b"a\n  b.txt", UploadRequest::new("blip"))
        .await
        .unwrap();
    assert!(outcome.forest.linked);
    assert_eq!(outcome.links.written, 1);
}
