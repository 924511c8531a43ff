//! Orders bundles and assembles them, with the header, into one feed.

use chrono::{DateTime, Utc};

use crate::bundle::Bundle;
use crate::entry::{EntryAssembler, FeedEntry, AUTHOR};

pub const FEED_TITLE: &str = "UCLDC Metadata Feed";
pub const FEED_FILE_PREFIX: &str = "ucldc_collection_";
pub const FEED_FILE_EXTENSION: &str = ".atom";
pub const FEED_CONTENT_TYPE: &str = "application/atom+xml";

/// On-disk name and object-store key suffix of a collection's feed.
pub fn feed_filename(collection_id: &str) -> String {
    format!("{FEED_FILE_PREFIX}{collection_id}{FEED_FILE_EXTENSION}")
}

/// Everything the header needs, gathered by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Destination-system collection id.
    pub sync_id: String,
    /// Where the feed will be published. Also the feed id and paging links.
    pub feed_url: String,
    pub collection_title: String,
    pub collection_url: String,
    /// Assembly time, captured once per run.
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderField {
    Updated(DateTime<Utc>),
    Id(String),
    Title(String),
    Author(String),
    Link {
        rel: &'static str,
        href: String,
        title: Option<String>,
    },
    SyncCollectionId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub header: Vec<HeaderField>,
    /// Non-decreasing in `effective_modified`.
    pub entries: Vec<FeedEntry>,
}

impl Feed {
    pub fn local_identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.local_identifier.as_str())
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.header.iter().find_map(|f| match f {
            HeaderField::Updated(at) => Some(*at),
            _ => None,
        })
    }
}

pub fn header_fields(info: &HeaderInfo) -> Vec<HeaderField> {
    // Paging is not implemented: self, first and last are the feed itself.
    let page_link = |rel| HeaderField::Link {
        rel,
        href: info.feed_url.clone(),
        title: None,
    };
    vec![
        HeaderField::Updated(info.updated),
        HeaderField::Id(info.feed_url.clone()),
        HeaderField::Title(FEED_TITLE.to_string()),
        HeaderField::Author(AUTHOR.to_string()),
        HeaderField::Link {
            rel: "alternate",
            href: info.collection_url.clone(),
            title: Some(info.collection_title.clone()),
        },
        page_link("self"),
        page_link("first"),
        page_link("last"),
        HeaderField::SyncCollectionId(info.sync_id.clone()),
    ]
}

/// Sorts bundles by effective modification time (stable) and renders each.
pub fn compose(bundles: &[Bundle], header: &HeaderInfo, assembler: &EntryAssembler) -> Feed {
    let mut ordered: Vec<&Bundle> = bundles.iter().collect();
    ordered.sort_by_key(|b| b.effective_modified);

    Feed {
        header: header_fields(header),
        entries: ordered.into_iter().map(|b| assembler.assemble(b)).collect(),
    }
}
