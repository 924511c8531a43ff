//! # Nuxeo document source
//!
//! Implements the core's [`DocumentSource`] against the Nuxeo REST API.
//!
//! - Documents are looked up by path (`{api}/path{path}`) and listed with
//!   paged NXQL queries (`{api}/query`).
//! - Every request sends `X-NXDocumentProperties: *` so that all schemas the
//!   feed reads are present; records are built with
//!   [`DocumentRecord::from_nuxeo`].
//! - Collection children are ordered by `ecm:name`; children of folders and
//!   compound objects by `ecm:pos`.

use async_trait::async_trait;
use merritt_feed_core::contract::{BoxError, CollectionInfo, DocumentSource};
use merritt_feed_core::record::{DocumentRecord, ORGANIZATION_TYPE};
use serde::Deserialize;
use serde_json::Value;

use crate::load_config::NuxeoSettings;

const PROPERTIES_HEADER: &str = "X-NXDocumentProperties";
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryPage {
    #[serde(default)]
    entries: Vec<Value>,
    #[serde(default)]
    is_next_page_available: bool,
}

/// NXQL selecting the live children of `parent_uid`.
pub fn children_query(parent_uid: &str, order_by: &str) -> String {
    format!(
        "SELECT * FROM Document WHERE ecm:parentId = '{parent_uid}' AND ecm:isTrashed = 0 ORDER BY {order_by}"
    )
}

pub struct NuxeoClient {
    http: reqwest::Client,
    api: String,
    user: String,
    password: String,
}

impl NuxeoClient {
    pub fn new(settings: &NuxeoSettings) -> Result<Self, BoxError> {
        let user = settings.user.clone().ok_or_else(|| {
            tracing::error!("Nuxeo user missing from settings and environment");
            BoxError::from("Nuxeo user not configured (set nuxeo.user or NUXEO_USER)")
        })?;
        let password = settings.password.clone().ok_or_else(|| {
            tracing::error!("Nuxeo password missing from settings and environment");
            BoxError::from("Nuxeo password not configured (set nuxeo.password or NUXEO_PASSWORD)")
        })?;
        let api = settings.api.trim_end_matches('/').to_string();
        tracing::info!(api = %api, user = %user, "Initialized NuxeoClient");
        Ok(NuxeoClient {
            http: reqwest::Client::new(),
            api,
            user,
            password,
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, BoxError> {
        let response = self
            .http
            .get(url)
            .basic_auth(&self.user, Some(&self.password))
            .header(PROPERTIES_HEADER, "*")
            .query(query)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, url, "Nuxeo request failed");
                e
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!(error = ?e, url, "Nuxeo returned an error status");
                e
            })?;
        Ok(response.json::<Value>().await?)
    }

    /// Raw document at a repository path.
    pub async fn document_by_path(&self, path: &str) -> Result<Value, BoxError> {
        let path = path.trim_end_matches('/');
        let url = format!("{}/path{}", self.api, path);
        self.get_json(&url, &[]).await
    }

    /// Every result of an NXQL query, following pages until exhausted.
    pub async fn query(&self, nxql: &str) -> Result<Vec<Value>, BoxError> {
        let url = format!("{}/query", self.api);
        let mut documents = Vec::new();
        let mut page_index = 0usize;
        loop {
            let raw = self
                .get_json(
                    &url,
                    &[
                        ("query", nxql.to_string()),
                        ("pageSize", PAGE_SIZE.to_string()),
                        ("currentPageIndex", page_index.to_string()),
                    ],
                )
                .await?;
            let page: QueryPage = serde_json::from_value(raw)?;
            tracing::debug!(
                page_index,
                entries = page.entries.len(),
                "[HARVEST] Nuxeo query page"
            );
            documents.extend(page.entries);
            if !page.is_next_page_available {
                break;
            }
            page_index += 1;
        }
        Ok(documents)
    }

    async fn children(&self, parent_uid: &str, order_by: &str) -> Result<Vec<Value>, BoxError> {
        self.query(&children_query(parent_uid, order_by)).await
    }
}

fn str_field<'a>(raw: &'a Value, key: &str) -> Result<&'a str, BoxError> {
    raw.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| BoxError::from(format!("Nuxeo document has no '{key}'")))
}

fn to_record(raw: &Value) -> Result<DocumentRecord, BoxError> {
    DocumentRecord::from_nuxeo(raw).map_err(|e| Box::new(e) as BoxError)
}

#[async_trait]
impl DocumentSource for NuxeoClient {
    async fn fetch_collection(&self, collection_path: &str) -> Result<CollectionInfo, BoxError> {
        let raw = self.document_by_path(collection_path).await?;
        Ok(CollectionInfo {
            uid: str_field(&raw, "uid")?.to_string(),
            title: str_field(&raw, "title")?.to_string(),
        })
    }

    /// Harvestable objects are collection children that are not folders,
    /// plus the contents of `Organization` folders, searched depth first.
    async fn fetch_top_level_documents(
        &self,
        collection_path: &str,
    ) -> Result<Vec<DocumentRecord>, BoxError> {
        let collection = self.document_by_path(collection_path).await?;
        let collection_uid = str_field(&collection, "uid")?;

        let mut pending = self.children(collection_uid, "ecm:name").await?;
        pending.reverse();

        let mut documents = Vec::new();
        while let Some(current) = pending.pop() {
            if str_field(&current, "type")? == ORGANIZATION_TYPE {
                let uid = str_field(&current, "uid")?;
                tracing::debug!(uid, "[HARVEST] Descending into organization folder");
                let mut nested = self.children(uid, "ecm:pos").await?;
                nested.reverse();
                pending.extend(nested);
            } else {
                documents.push(to_record(&current)?);
            }
        }
        Ok(documents)
    }

    /// Every descendant of `document`, in depth-first `ecm:pos` order.
    async fn fetch_components(
        &self,
        document: &DocumentRecord,
    ) -> Result<Vec<DocumentRecord>, BoxError> {
        let mut pending = self.children(&document.id, "ecm:pos").await?;
        pending.reverse();

        let mut components = Vec::new();
        while let Some(current) = pending.pop() {
            let record = to_record(&current)?;
            let mut nested = self.children(&record.id, "ecm:pos").await?;
            nested.reverse();
            pending.extend(nested);
            components.push(record);
        }
        Ok(components)
    }
}
