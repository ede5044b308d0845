//! Real-world listing shapes

use arbor::tree::{
    flatten, parse_directory_text, DirectoryParser, LinkStrategy, Node, ScanOptions,
};
use arbor::types::ItemKind;

/// (depth, name, kind) for every node in pre-order.
fn outline(forest: &[Node]) -> Vec<(usize, String, ItemKind)> {
    flatten(forest, LinkStrategy::SamePass)
        .into_iter()
        .map(|item| (item.depth, item.name, item.kind))
        .collect()
}

fn names_at(forest: &[Node]) -> Vec<(usize, String)> {
    outline(forest)
        .into_iter()
        .map(|(depth, name, _)| (depth, name))
        .collect()
}

#[test]
fn unix_tree_output_with_summary_line() {
    let text = "\
.
├── Cargo.toml
├── src
│   ├── lib.rs
│   └── tree
│       └── parser.rs
└── tests
    └── it.rs
";
    let forest = parse_directory_text(text);
    assert_eq!(
        names_at(&forest),
        vec![
            (0, ".".to_string()),
            (1, "Cargo.toml".to_string()),
            (1, "src".to_string()),
            (2, "lib.rs".to_string()),
            (2, "tree".to_string()),
            (3, "parser.rs".to_string()),
            (1, "tests".to_string()),
            (2, "it.rs".to_string()),
        ]
    );
    assert_eq!(outline(&forest)[0].2, ItemKind::Folder);
}

#[test]
fn windows_tree_output_with_file_continuations() {
    let text = "\
C:.
│   notes.txt
│
├───photos
│       beach.jpg
│
└───work
    └───reports
            q1.xlsx
";
    let forest = parse_directory_text(text);
    assert_eq!(
        names_at(&forest),
        vec![
            (0, "C:.".to_string()),
            (1, "notes.txt".to_string()),
            (1, "photos".to_string()),
            (2, "beach.jpg".to_string()),
            (1, "work".to_string()),
            (2, "reports".to_string()),
            (3, "q1.xlsx".to_string()),
        ]
    );
}

#[test]
fn cjk_export_with_continuation_bars() {
    let text = "根目录\n│   文档\n│   │   说明.txt\n├── 源码\n│   └── 主.rs";
    let forest = parse_directory_text(text);
    assert_eq!(
        names_at(&forest),
        vec![
            (0, "根目录".to_string()),
            (1, "文档".to_string()),
            (2, "说明.txt".to_string()),
            (1, "源码".to_string()),
            (2, "主.rs".to_string()),
        ]
    );
}

#[test]
fn saved_web_page_noise_is_ignored() {
    let text = "\u{feff}<!DOCTYPE html>\r\n<HTML lang=\"en\">\r\nsite\r\n  index.html\r\n\r\n  assets\r\n    logo.svg\r\n";
    let forest = parse_directory_text(text);
    assert_eq!(
        names_at(&forest),
        vec![
            (0, "site".to_string()),
            (1, "index.html".to_string()),
            (1, "assets".to_string()),
            (2, "logo.svg".to_string()),
        ]
    );
}

#[test]
fn annotations_override_the_dot_heuristic() {
    let text = "📁 release-1.2\n  Makefile [file]\n  📄 LICENSE\n  vendor/\n    lib.a";
    let kinds: Vec<(String, ItemKind)> = outline(&parse_directory_text(text))
        .into_iter()
        .map(|(_, name, kind)| (name, kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("release-1.2".to_string(), ItemKind::Folder),
            ("Makefile".to_string(), ItemKind::File),
            ("LICENSE".to_string(), ItemKind::File),
            ("vendor".to_string(), ItemKind::Folder),
            ("lib.a".to_string(), ItemKind::File),
        ]
    );
}

#[test]
fn tab_indented_listing() {
    let forest = parse_directory_text("root\n\tsub\n\t\tleaf.txt\n\tother.txt");
    assert_eq!(
        names_at(&forest),
        vec![
            (0, "root".to_string()),
            (1, "sub".to_string()),
            (2, "leaf.txt".to_string()),
            (1, "other.txt".to_string()),
        ]
    );
}

#[test]
fn four_space_exports_need_matching_unit() {
    let text = "top\n    mid\n        low.txt";
    let parser = DirectoryParser::new(ScanOptions {
        indent_unit: 4,
        ..ScanOptions::default()
    });
    assert_eq!(
        names_at(&parser.parse(text)),
        vec![
            (0, "top".to_string()),
            (1, "mid".to_string()),
            (2, "low.txt".to_string()),
        ]
    );
}

#[test]
fn skipped_levels_still_attach_to_nearest_folder() {
    let forest = parse_directory_text("a\n      deep.txt\n  b");
    let items = flatten(&forest, LinkStrategy::SamePass);
    let parents: Vec<(String, Option<u64>, usize)> = items
        .into_iter()
        .map(|item| (item.name, item.parent_order, item.depth))
        .collect();
    assert_eq!(
        parents,
        vec![
            ("a".to_string(), None, 0),
            ("deep.txt".to_string(), Some(0), 1),
            ("b".to_string(), Some(0), 1),
        ]
    );
}

#[test]
fn garbage_lines_never_fail_parsing() {
    let text = "│\n├\n└x\n───\n  ok.txt\n│ │ │";
    let forest = parse_directory_text(text);
    assert!(outline(&forest).iter().any(|(_, name, _)| name == "ok.txt"));
}
