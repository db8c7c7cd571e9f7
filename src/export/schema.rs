//! Column set unification
//!
//! Decides which columns a sheet gets and in which order. Without a caller
//! override every top-level property seen in any document becomes a column,
//! sorted byte-wise. Nested documents are not flattened.

use std::collections::{BTreeSet, HashSet};

use mongodb::bson::Document;
use tracing::warn;

/// Ordered list of unique column names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    names: Vec<String>,
}

impl ColumnSet {
    /// Build from caller-supplied names, keeping caller order
    ///
    /// Repeated names keep their first position only.
    pub fn from_override<S: AsRef<str>>(names: &[S]) -> Self {
        let mut seen = HashSet::with_capacity(names.len());
        let mut unique = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref();
            if seen.insert(name) {
                unique.push(name.to_string());
            } else {
                warn!("Column '{}' listed more than once, keeping first occurrence", name);
            }
        }

        Self { names: unique }
    }

    /// Derive the sorted union of top-level property names
    pub fn derive(docs: &[Document]) -> Self {
        let mut field_set = BTreeSet::new();
        for doc in docs {
            for key in doc.keys() {
                field_set.insert(key.clone());
            }
        }

        Self {
            names: field_set.into_iter().collect(),
        }
    }

    /// Column names in output order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Determine the column set for a batch of documents
///
/// A non-empty override wins and is not checked against the documents;
/// names that never occur simply produce blank cells.
pub fn unify<S: AsRef<str>>(docs: &[Document], column_override: Option<&[S]>) -> ColumnSet {
    match column_override {
        Some(names) if !names.is_empty() => ColumnSet::from_override(names),
        _ => ColumnSet::derive(docs),
    }
}
