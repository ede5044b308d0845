//! Text rendering for CLI output.

use crate::ingest::UploadOutcome;
use crate::store::{ForestRecord, PersistedItem};
use crate::tree::{Node, ParseStats};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::slice;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Render a forest as `tree`-style text. Folders carry a trailing `/`.
pub fn render_tree(forest: &[Node]) -> String {
    let mut out = String::new();
    for root in forest {
        push_node(&mut out, "", root);
        let mut open: Vec<(slice::Iter<'_, Node>, String)> =
            vec![(root.children.iter(), String::new())];
        while let Some((children, prefix)) = open.last_mut() {
            let Some(child) = children.next() else {
                open.pop();
                continue;
            };
            let (branch, pad) = if children.len() == 0 {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            let line_prefix = format!("{}{}", prefix, branch);
            let child_prefix = format!("{}{}", prefix, pad);
            push_node(&mut out, &line_prefix, child);
            if !child.children.is_empty() {
                open.push((child.children.iter(), child_prefix));
            }
        }
    }
    out
}

fn push_node(out: &mut String, prefix: &str, node: &Node) {
    out.push_str(prefix);
    out.push_str(&node.name);
    if node.effective_kind().is_folder() {
        out.push('/');
    }
    out.push('\n');
}

pub fn format_parse_stats(stats: &ParseStats, items: usize) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Lines", "Glyph", "Space", "Malformed", "Annotated", "Max depth", "Items"]);
    table.add_row(vec![
        stats.lines.to_string(),
        stats.glyph_lines.to_string(),
        stats.space_lines.to_string(),
        stats.malformed_lines.to_string(),
        stats.annotated_lines.to_string(),
        stats.max_depth.to_string(),
        items.to_string(),
    ]);
    table.to_string()
}

pub fn format_forest_table(forests: &[ForestRecord]) -> String {
    if forests.is_empty() {
        return "No forests stored.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["ID", "Name", "Batches", "Linked", "Updated"]);
    for forest in forests {
        table.add_row(vec![
            forest.id.to_string(),
            forest.name.clone(),
            forest
                .total_batches
                .map(|total| total.to_string())
                .unwrap_or_else(|| "-".to_string()),
            if forest.linked { "yes" } else { "no" }.to_string(),
            forest.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    table.to_string()
}

pub fn format_upload_outcome(outcome: &UploadOutcome, dry_run: bool) -> String {
    let heading = if dry_run { "Dry run" } else { "Imported" };
    let mut out = format!("{}\n\n", format_section_heading(heading));
    out.push_str(&format!(
        "  Forest: {} ({})\n",
        outcome.forest.name, outcome.forest.id
    ));
    out.push_str(&format!(
        "  Items: {} inserted, {} already present\n",
        outcome.receipt.inserted, outcome.receipt.skipped
    ));
    out.push_str(&format!("  Batches: {}\n", outcome.batches));
    out.push_str(&format!(
        "  Links: {} written, {} already linked\n",
        outcome.links.written, outcome.links.already_linked
    ));
    out.push_str(&format!("  Linked: {}\n", if outcome.forest.linked { "yes" } else { "no" }));
    out
}

/// Integrity report for one forest
pub struct CheckReport<'a> {
    pub forest: &'a ForestRecord,
    pub missing_batches: Vec<usize>,
    pub items: usize,
    pub unlinked: Vec<&'a PersistedItem>,
}

pub fn format_check_report(report: &CheckReport<'_>) -> String {
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("Forest {} ({})", report.forest.name, report.forest.id))
    );
    out.push_str(&format!("  Items: {}\n", report.items));
    if report.missing_batches.is_empty() {
        out.push_str("  Batches: complete\n");
    } else {
        let missing: Vec<String> = report.missing_batches.iter().map(|n| n.to_string()).collect();
        out.push_str(&format!("  Batches: missing {}\n", missing.join(", ")));
    }
    out.push_str(&format!("  Unlinked items: {}\n", report.unlinked.len()));

    if !report.unlinked.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Order", "Name", "Parent order"]);
        for item in &report.unlinked {
            table.add_row(vec![
                item.item.order.to_string(),
                item.item.name.clone(),
                item.item
                    .parent_order
                    .map(|order| order.to_string())
                    .unwrap_or_default(),
            ]);
        }
        out.push_str(&format!("\n{}\n", table));
    }
    out
}
