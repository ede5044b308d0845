//! File/folder kind inference
//!
//! Explicit annotations in the listing always win. Without one, a
//! `KindClassifier` guesses from the name.

use crate::types::ItemKind;

/// Guess the kind of an entry from its display name.
pub trait KindClassifier {
    fn classify(&self, name: &str) -> ItemKind;
}

/// A name with a dot before its last character is a file; everything else
/// is a folder. Trailing dots (`.`, `C:.` from `tree /F`) name folders.
///
/// Misclassifies dotted folder names (`v1.2`) and extensionless files
/// (`Makefile`); annotate those explicitly in the listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotHeuristic;

impl KindClassifier for DotHeuristic {
    fn classify(&self, name: &str) -> ItemKind {
        if name.trim_end_matches('.').contains('.') {
            ItemKind::File
        } else {
            ItemKind::Folder
        }
    }
}

impl<F> KindClassifier for F
where
    F: Fn(&str) -> ItemKind,
{
    fn classify(&self, name: &str) -> ItemKind {
        self(name)
    }
}

const FOLDER_ICON: &str = "📁";
const FILE_ICON: &str = "📄";
const FOLDER_TAG: &str = "[folder]";
const FILE_TAG: &str = "[file]";

/// Strip an explicit kind annotation from a display name.
///
/// Recognised forms: a leading `📁`/`📄` icon, a trailing `[folder]`/`[file]`
/// tag (case-insensitive), and a trailing `/` for folders.
pub fn strip_annotation(name: &str) -> (&str, Option<ItemKind>) {
    let name = name.trim();

    if let Some(rest) = name.strip_prefix(FOLDER_ICON) {
        return (rest.trim(), Some(ItemKind::Folder));
    }
    if let Some(rest) = name.strip_prefix(FILE_ICON) {
        return (rest.trim(), Some(ItemKind::File));
    }
    if let Some(rest) = strip_suffix_ignore_case(name, FOLDER_TAG) {
        return (rest.trim_end(), Some(ItemKind::Folder));
    }
    if let Some(rest) = strip_suffix_ignore_case(name, FILE_TAG) {
        return (rest.trim_end(), Some(ItemKind::File));
    }
    if let Some(rest) = name.strip_suffix('/') {
        return (rest.trim_end(), Some(ItemKind::Folder));
    }
    (name, None)
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = name.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
