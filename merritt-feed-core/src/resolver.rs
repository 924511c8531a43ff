//! Collection resolution from an injected lookup table.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::contract::{BoxError, CollectionResolver};
use crate::error::FeedError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMapping {
    /// Source repository path of the collection folder.
    pub path: String,
    /// Destination-system collection id.
    pub destination_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct StaticCollectionResolver {
    mappings: HashMap<String, CollectionMapping>,
}

impl StaticCollectionResolver {
    pub fn new(mappings: HashMap<String, CollectionMapping>) -> Self {
        Self { mappings }
    }

    pub fn contains(&self, collection_id: &str) -> bool {
        self.mappings.contains_key(collection_id)
    }

    fn mapping(&self, collection_id: &str, what: &'static str) -> Result<&CollectionMapping, BoxError> {
        self.mappings.get(collection_id).ok_or_else(|| {
            Box::new(FeedError::MissingMapping {
                collection_id: collection_id.to_string(),
                what,
            }) as BoxError
        })
    }
}

#[async_trait]
impl CollectionResolver for StaticCollectionResolver {
    async fn resolve_path(&self, collection_id: &str) -> Result<String, BoxError> {
        Ok(self.mapping(collection_id, "source path")?.path.clone())
    }

    async fn resolve_destination_id(&self, collection_id: &str) -> Result<String, BoxError> {
        Ok(self
            .mapping(collection_id, "destination id")?
            .destination_id
            .clone())
    }
}
