//! Groups a top-level document with its components into one logical unit.

use chrono::{DateTime, Utc};

use crate::record::DocumentRecord;

/// A top-level document plus the latest modification time across it and its
/// components.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub record: DocumentRecord,
    /// Always `>= record.last_modified`.
    pub effective_modified: DateTime<Utc>,
}

impl Bundle {
    pub fn new(record: DocumentRecord) -> Bundle {
        let effective_modified = effective_modified(&record);
        Bundle {
            record,
            effective_modified,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }
}

/// Max of the document's own timestamp and each component's. Components are
/// treated as flat.
pub fn effective_modified(record: &DocumentRecord) -> DateTime<Utc> {
    record
        .components
        .iter()
        .map(|c| c.last_modified)
        .fold(record.last_modified, std::cmp::max)
}

/// One bundle per input document, same order as the input.
pub fn bundle(documents: &[DocumentRecord]) -> Vec<Bundle> {
    documents.iter().cloned().map(Bundle::new).collect()
}
