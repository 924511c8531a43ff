//! # contract: interfaces to the collaborators a feed run depends on
//!
//! The core never talks to the network itself. It needs three things from
//! the outside world:
//!
//! - a [`DocumentSource`] that lists a collection's documents and their
//!   components,
//! - a [`CollectionResolver`] that maps a collection id to its source path
//!   and destination collection id,
//! - an [`ObjectStore`] the finished feed is published to.
//!
//! ## Mocking & Testing
//! - Each trait is annotated for `mockall`; the generated `Mock*` types are
//!   exported under the default `test-export-mocks` feature so downstream
//!   crates can use them in their own tests.
//!
//! ## Errors
//! - All methods return a boxed error. The core wraps it in the matching
//!   [`crate::error::FeedError`] variant without retrying.

use async_trait::async_trait;

use mockall::automock;

use crate::record::DocumentRecord;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The collection folder itself, as seen by the document source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub uid: String,
    pub title: String,
}

/// Supplies harvested document records.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Metadata for the collection folder at `collection_path`.
    async fn fetch_collection(&self, collection_path: &str) -> Result<CollectionInfo, BoxError>;

    /// Every harvestable top-level document under `collection_path`.
    /// Components are left empty; see [`DocumentSource::fetch_components`].
    async fn fetch_top_level_documents(
        &self,
        collection_path: &str,
    ) -> Result<Vec<DocumentRecord>, BoxError>;

    /// The component files of a compound document, flattened.
    async fn fetch_components(
        &self,
        document: &DocumentRecord,
    ) -> Result<Vec<DocumentRecord>, BoxError>;
}

/// Maps a collection id to where its documents live and where its feed goes.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CollectionResolver: Send + Sync {
    async fn resolve_path(&self, collection_id: &str) -> Result<String, BoxError>;

    async fn resolve_destination_id(&self, collection_id: &str) -> Result<String, BoxError>;
}

/// Durable key/blob storage.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Vec<u8>, BoxError>;

    /// Overwrites any existing object at `key`.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), BoxError>;

    /// Keys under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BoxError>;
}
