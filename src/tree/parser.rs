//! Directory listing parser
//!
//! Builds a forest from classified lines with a stack of open folders: pop
//! while the top is at the new line's depth or deeper, attach to whatever is
//! left on top (or make a root), and push the line if it is a folder.

use super::kind::{DotHeuristic, KindClassifier};
use super::line::{IndentMarker, LineScanner, RawLine, ScanOptions};
use super::node::Node;
use super::stack::DepthStack;
use serde::Serialize;

/// Counters describing what the parser saw
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub lines: usize,
    pub glyph_lines: usize,
    pub space_lines: usize,
    pub malformed_lines: usize,
    pub annotated_lines: usize,
    pub max_depth: usize,
}

impl ParseStats {
    fn record(&mut self, line: &RawLine<'_>) {
        self.lines += 1;
        match line.marker {
            marker if marker.is_glyph() => self.glyph_lines += 1,
            IndentMarker::Malformed => self.malformed_lines += 1,
            _ => self.space_lines += 1,
        }
        if line.annotated_kind.is_some() {
            self.annotated_lines += 1;
        }
        self.max_depth = self.max_depth.max(line.depth);
    }
}

/// Parser for exported directory listings
#[derive(Debug, Clone)]
pub struct DirectoryParser<C = DotHeuristic> {
    options: ScanOptions,
    classifier: C,
}

impl DirectoryParser<DotHeuristic> {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            classifier: DotHeuristic,
        }
    }
}

impl Default for DirectoryParser<DotHeuristic> {
    fn default() -> Self {
        Self::new(ScanOptions::default())
    }
}

impl<C: KindClassifier> DirectoryParser<C> {
    /// Replace the kind inference used for lines without an annotation.
    pub fn with_classifier<D: KindClassifier>(self, classifier: D) -> DirectoryParser<D> {
        DirectoryParser {
            options: self.options,
            classifier,
        }
    }

    pub fn options(&self) -> ScanOptions {
        self.options
    }

    pub fn parse(&self, text: &str) -> Vec<Node> {
        self.parse_with_stats(text).0
    }

    pub fn parse_with_stats(&self, text: &str) -> (Vec<Node>, ParseStats) {
        let mut roots = Vec::new();
        let mut open: DepthStack<Node> = DepthStack::new();
        let mut stats = ParseStats::default();

        for line in LineScanner::new(text, self.options) {
            stats.record(&line);

            while let Some((closed, _)) = open.pop_at_or_below(line.depth) {
                attach(&mut open, &mut roots, closed);
            }

            let kind = line
                .annotated_kind
                .unwrap_or_else(|| self.classifier.classify(line.name));
            let node = Node::new(line.name, kind, line.depth);

            if kind.is_folder() {
                open.push(node, line.depth);
            } else {
                attach(&mut open, &mut roots, node);
            }
        }

        while let Some((closed, _)) = open.pop() {
            attach(&mut open, &mut roots, closed);
        }

        (roots, stats)
    }
}

fn attach(open: &mut DepthStack<Node>, roots: &mut Vec<Node>, node: Node) {
    match open.top_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

/// Parse with the default options and the dot heuristic.
pub fn parse_directory_text(text: &str) -> Vec<Node> {
    DirectoryParser::new(ScanOptions::default()).parse(text)
}
