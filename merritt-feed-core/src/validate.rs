//! Duplicate detection over an assembled feed, and the publication gate.

use std::collections::{BTreeSet, HashMap};

use crate::feed::Feed;

/// Values occurring more than once.
pub fn duplicate_values<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        *counts.entry(value.as_ref().to_string()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(value, _)| value)
        .collect()
}

/// Local identifiers emitted more than once in `feed`. Empty means clean.
pub fn find_duplicate_identifiers(feed: &Feed) -> BTreeSet<String> {
    duplicate_values(feed.local_identifiers())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishGate {
    Clean,
    HasDuplicates(BTreeSet<String>),
}

impl PublishGate {
    pub fn evaluate(feed: &Feed) -> PublishGate {
        let duplicates = find_duplicate_identifiers(feed);
        if duplicates.is_empty() {
            PublishGate::Clean
        } else {
            PublishGate::HasDuplicates(duplicates)
        }
    }

    pub fn is_publishable(&self) -> bool {
        matches!(self, PublishGate::Clean)
    }
}
