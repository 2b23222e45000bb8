//! Named collections selected from the discovered documents by glob.

use crate::compiler::document::Document;
use glob_match::glob_match;
use std::cmp::Ordering;

/// `(name, glob)` pair; the glob is matched against root-relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDef {
    pub name: String,
    pub glob: String,
}

impl CollectionDef {
    pub fn new(name: impl Into<String>, glob: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            glob: glob.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        glob_match(self.glob.trim_start_matches("./"), &doc.rel_path)
    }

    /// Matching documents in collection order.
    pub fn select<'a>(&self, docs: &'a [Document]) -> Vec<&'a Document> {
        let mut selected: Vec<_> = docs.iter().filter(|doc| self.matches(doc)).collect();
        selected.sort_by(|a, b| collection_order(a, b));
        selected
    }
}

/// Every document, in collection order.
pub fn all(docs: &[Document]) -> Vec<&Document> {
    let mut selected: Vec<_> = docs.iter().collect();
    selected.sort_by(|a, b| collection_order(a, b));
    selected
}

/// Date ascending, then input path.
fn collection_order(a: &Document, b: &Document) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.rel_path.cmp(&b.rel_path))
}
