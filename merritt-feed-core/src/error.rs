//! Error types for merritt-feed-core.
//!
//! Configuration faults (bad source metadata, unknown collections) and
//! collaborator failures are both fatal to a run. Duplicate identifiers are
//! not an error: see [`crate::synchronise::RunOutcome::Blocked`].

use std::path::PathBuf;

use crate::contract::BoxError;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A required field is missing from source metadata. Usually means the
    /// harvester's property selection does not include the schema.
    #[error("document {document}: metadata does not contain '{field}'{hint}")]
    MissingField {
        document: String,
        field: String,
        hint: &'static str,
    },

    #[error("document {document}: invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        document: String,
        value: String,
        source: chrono::ParseError,
    },

    /// The collection resolver has no mapping for the collection.
    #[error("collection {collection_id}: no {what} mapping")]
    MissingMapping {
        collection_id: String,
        what: &'static str,
    },

    #[error("document {document}: invalid type '{doc_type}', expected one of {expected:?}")]
    UnknownDocumentType {
        document: String,
        doc_type: String,
        expected: Vec<&'static str>,
    },

    #[error("document {document}: video metadata lacks 'vid:info' dimensions")]
    MissingVideoInfo { document: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("document source error: {0}")]
    Source(#[source] BoxError),

    #[error("collection resolver error: {0}")]
    Resolver(#[source] BoxError),

    #[error("object store error: {0}")]
    Store(#[source] BoxError),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML write error: {0}")]
    XmlWrite(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeedError>;

/// Hint attached to missing `properties/...` fields.
pub const PROPERTIES_HINT: &str =
    ". Make sure the X-NXDocumentProperties header sent by the harvester includes the schema";

impl FeedError {
    pub fn missing(document: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            document: document.into(),
            field: field.into(),
            hint: "",
        }
    }

    pub fn missing_property(document: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            document: document.into(),
            field: field.into(),
            hint: PROPERTIES_HINT,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for faults in source data or configuration, as opposed to
    /// collaborator or local I/O failures.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::InvalidTimestamp { .. }
                | Self::MissingMapping { .. }
                | Self::UnknownDocumentType { .. }
                | Self::MissingVideoInfo { .. }
                | Self::Config(_)
        )
    }
}
