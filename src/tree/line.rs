//! Line scanning for exported directory listings
//!
//! Normalises the raw text (BOM, CRLF, blank lines, stray HTML) and classifies
//! each remaining line into an indentation dialect with an inferred depth and
//! display name. Scanning never fails; lines it cannot make sense of degrade to
//! their leading-whitespace depth.

use super::kind::strip_annotation;
use crate::types::ItemKind;

const BOM: char = '\u{feff}';
const VERTICAL: char = '│';
const TEE: char = '├';
const CORNER: char = '└';
const HORIZONTAL: char = '─';

/// Columns occupied by one ancestor group (`│   ` or four spaces).
const GLYPH_GROUP_WIDTH: usize = 4;

/// Markers of HTML pages saved in place of the export.
const HTML_MARKERS: [&str; 2] = ["<!doctype", "<html"];

/// How a line expressed its indentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentMarker {
    /// `[│ ]*[├└]──` prefix
    Branch,
    /// Only `│` continuation bars before the name
    Continuation,
    /// Leading spaces/tabs
    Space,
    /// No indentation at all
    Plain,
    /// Looked like glyph dialect but did not match; depth from whitespace only
    Malformed,
}

impl IndentMarker {
    pub fn is_glyph(self) -> bool {
        matches!(self, IndentMarker::Branch | IndentMarker::Continuation)
    }
}

/// One classified input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine<'a> {
    /// 1-based line number in the normalised input
    pub line_number: usize,
    pub raw: &'a str,
    pub marker: IndentMarker,
    pub depth: usize,
    pub name: &'a str,
    /// Kind stated explicitly in the listing, if any
    pub annotated_kind: Option<ItemKind>,
}

/// Options controlling depth inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Spaces per level in the space dialect; a tab counts as one level
    pub indent_unit: usize,
    /// Nest glyph lines under the most recent unindented header line, so that
    /// `tree`-style output (`root` followed by `├── child`) keeps its root
    pub anchor_glyph_lines: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            indent_unit: 2,
            anchor_glyph_lines: true,
        }
    }
}

/// Iterator over the classified lines of one listing.
pub struct LineScanner<'a> {
    lines: std::iter::Enumerate<std::str::Split<'a, char>>,
    options: ScanOptions,
    /// Depth of the last space/plain dialect line
    header_depth: Option<usize>,
}

impl<'a> LineScanner<'a> {
    pub fn new(text: &'a str, options: ScanOptions) -> Self {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        Self {
            lines: text.split('\n').enumerate(),
            options: ScanOptions {
                indent_unit: options.indent_unit.max(1),
                ..options
            },
            header_depth: None,
        }
    }

    fn classify(&mut self, line_number: usize, raw: &'a str) -> Option<RawLine<'a>> {
        let shape = shape_of(raw, self.options.indent_unit);
        let (name, annotated_kind) = strip_annotation(shape.rest);
        if name.is_empty() {
            return None;
        }

        let depth = match shape.marker {
            IndentMarker::Space | IndentMarker::Plain => {
                self.header_depth = Some(shape.depth);
                shape.depth
            }
            IndentMarker::Branch if self.options.anchor_glyph_lines => {
                shape.depth + self.header_depth.map_or(0, |header| header + 1)
            }
            IndentMarker::Continuation if self.options.anchor_glyph_lines => {
                shape.depth + self.header_depth.unwrap_or(0)
            }
            _ => shape.depth,
        };

        Some(RawLine {
            line_number,
            raw,
            marker: shape.marker,
            depth,
            name,
            annotated_kind,
        })
    }
}

impl<'a> Iterator for LineScanner<'a> {
    type Item = RawLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (index, line) = self.lines.next()?;
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim().is_empty() || is_html_noise(line) {
                continue;
            }
            if let Some(classified) = self.classify(index + 1, line) {
                return Some(classified);
            }
        }
    }
}

fn is_html_noise(line: &str) -> bool {
    let lowered = line.to_ascii_lowercase();
    HTML_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Indentation shape of a single line, before header anchoring
struct LineShape<'a> {
    marker: IndentMarker,
    depth: usize,
    rest: &'a str,
}

fn shape_of(line: &str, indent_unit: usize) -> LineShape<'_> {
    let first_visible = line.trim_start_matches(is_pad);
    let starts_with_glyph = first_visible
        .chars()
        .next()
        .is_some_and(|c| c == VERTICAL || c == TEE || c == CORNER);

    if starts_with_glyph {
        if let Some(shape) = glyph_shape(line) {
            return shape;
        }
        return LineShape {
            marker: IndentMarker::Malformed,
            depth: whitespace_depth(line, indent_unit),
            rest: line.trim_start_matches(|c: char| is_pad(c) || is_box_drawing(c)),
        };
    }

    let depth = whitespace_depth(line, indent_unit);
    let marker = if first_visible.len() == line.len() {
        IndentMarker::Plain
    } else {
        IndentMarker::Space
    };
    LineShape {
        marker,
        depth,
        rest: first_visible,
    }
}

/// Match `[│ ]*[├└]─+\s*` (branch) or `[│ ]+` followed by a name
/// (continuation), counting one depth level per ancestor group.
fn glyph_shape(line: &str) -> Option<LineShape<'_>> {
    let mut groups: usize = 0;
    let mut chars = line.char_indices().peekable();

    while let Some(&(index, c)) = chars.peek() {
        match c {
            VERTICAL => {
                groups += 1;
                chars.next();
                let mut skipped = 0;
                while skipped < GLYPH_GROUP_WIDTH - 1
                    && chars.next_if(|&(_, c)| is_pad(c)).is_some()
                {
                    skipped += 1;
                }
            }
            c if is_pad(c) => {
                let mut run: usize = 0;
                while let Some((_, c)) = chars.next_if(|&(_, c)| is_pad(c)) {
                    run += if c == '\t' { GLYPH_GROUP_WIDTH } else { 1 };
                }
                groups += run.div_ceil(GLYPH_GROUP_WIDTH);
            }
            TEE | CORNER => {
                chars.next();
                let mut dashes = 0;
                while chars.next_if(|&(_, c)| c == HORIZONTAL).is_some() {
                    dashes += 1;
                }
                if dashes == 0 {
                    return None;
                }
                let rest = chars.peek().map_or("", |&(start, _)| &line[start..]);
                return Some(LineShape {
                    marker: IndentMarker::Branch,
                    depth: groups,
                    rest: rest.trim(),
                });
            }
            _ => {
                if groups == 0 {
                    return None;
                }
                return Some(LineShape {
                    marker: IndentMarker::Continuation,
                    depth: groups,
                    rest: line[index..].trim(),
                });
            }
        }
    }
    // Only glyphs and padding: nothing to name.
    Some(LineShape {
        marker: IndentMarker::Continuation,
        depth: groups,
        rest: "",
    })
}

fn whitespace_depth(line: &str, indent_unit: usize) -> usize {
    let width: usize = line
        .chars()
        .take_while(|c| is_pad(*c))
        .map(|c| if c == '\t' { indent_unit } else { 1 })
        .sum();
    width / indent_unit
}

fn is_pad(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\u{a0}'
}

fn is_box_drawing(c: char) -> bool {
    ('\u{2500}'..='\u{257f}').contains(&c)
}
