//! Collection lookups against the UCLDC collection registry.
//!
//! `GET {registry}collection/{id}/?format=json` returns, among other things,
//! the Nuxeo path of the collection (`harvest_extra_data`) and its Merritt
//! collection id (`merritt_id`).

use async_trait::async_trait;
use merritt_feed_core::contract::{BoxError, CollectionResolver};
use merritt_feed_core::FeedError;
use serde_json::Value;

pub const PATH_FIELD: &str = "harvest_extra_data";
pub const DESTINATION_FIELD: &str = "merritt_id";

pub struct RegistryClient {
    http: reqwest::Client,
    api_base: String,
}

impl RegistryClient {
    pub fn new(api_base: &str) -> Self {
        let api_base = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{api_base}/")
        };
        RegistryClient {
            http: reqwest::Client::new(),
            api_base,
        }
    }

    pub fn collection_url(&self, collection_id: &str) -> String {
        format!("{}collection/{collection_id}/?format=json", self.api_base)
    }

    async fn field(
        &self,
        collection_id: &str,
        field: &str,
        what: &'static str,
    ) -> Result<String, BoxError> {
        let url = self.collection_url(collection_id);
        tracing::debug!(%url, field, "Querying collection registry");
        let body: Value = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| {
                tracing::error!(error = ?e, %url, "Registry returned an error status");
                e
            })?
            .json()
            .await?;

        match body.get(field).and_then(Value::as_str).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => {
                tracing::error!(collection_id, field, "Registry record lacks field");
                Err(Box::new(FeedError::MissingMapping {
                    collection_id: collection_id.to_string(),
                    what,
                }))
            }
        }
    }
}

#[async_trait]
impl CollectionResolver for RegistryClient {
    async fn resolve_path(&self, collection_id: &str) -> Result<String, BoxError> {
        self.field(collection_id, PATH_FIELD, "source path").await
    }

    async fn resolve_destination_id(&self, collection_id: &str) -> Result<String, BoxError> {
        self.field(collection_id, DESTINATION_FIELD, "destination id")
            .await
    }
}
