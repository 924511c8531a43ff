//! Harvested document records and their construction from Nuxeo JSON.
//!
//! [`DocumentRecord::from_nuxeo`] is the only place raw source metadata is
//! read. Every field the feed relies on is checked here so that later stages
//! can work with plain typed values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FeedError, Result};

/// Placeholder blob Nuxeo attaches to pictures without real content.
pub const PLACEHOLDER_FILE_NAME: &str = "empty_picture.png";

/// Folder type that groups objects without being harvestable itself.
pub const ORGANIZATION_TYPE: &str = "Organization";

/// A file reference: download URL plus optional MD5 digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: Option<String>,
    pub url: String,
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u64,
    pub height: u64,
}

/// One unit from the source repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub path: String,
    pub doc_type: String,
    pub title: String,
    pub creators: Vec<String>,
    pub primary_date: Option<String>,
    pub external_identifier: Option<String>,
    pub collection_tag: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub main_file: Option<FileRef>,
    pub auxiliary_files: Vec<FileRef>,
    pub video: Option<VideoInfo>,
    /// Component files of a compound object. Always flat.
    pub components: Vec<DocumentRecord>,
}

impl DocumentRecord {
    pub fn has_file(&self) -> bool {
        self.main_file.is_some()
    }

    pub fn is_parent(&self) -> bool {
        !self.components.is_empty()
    }

    /// Builds a record from a Nuxeo document as returned by the REST API
    /// with `X-NXDocumentProperties: *`.
    pub fn from_nuxeo(raw: &Value) -> Result<DocumentRecord> {
        let id = required_str(raw, "uid", "<unknown>")?.to_string();
        let path = required_str(raw, "path", &id)?.to_string();
        let doc_type = required_str(raw, "type", &id)?.to_string();
        let title = required_str(raw, "title", &id)?.to_string();
        let last_modified = parse_timestamp(&id, required_str(raw, "lastModified", &id)?)?;

        let properties = raw
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| FeedError::missing_property(&id, "properties"))?;

        let creators = creators(properties, &id)?;
        let primary_date = primary_date(properties, &id)?;

        let external_identifier = required_property(properties, "ucldc_schema:identifier", &id)?
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let collection_tag = required_property(properties, "ucldc_schema:collection", &id)?
            .as_array()
            .and_then(|tags| tags.first())
            .and_then(Value::as_str)
            .map(str::to_string);

        let main_file = main_file(properties, &id)?;
        let auxiliary_files = auxiliary_files(properties);
        let video = video_info(properties);

        Ok(DocumentRecord {
            id,
            path,
            doc_type,
            title,
            creators,
            primary_date,
            external_identifier,
            collection_tag,
            last_modified,
            main_file,
            auxiliary_files,
            video,
            components: Vec::new(),
        })
    }
}

/// Parses an ISO-8601 / RFC 3339 timestamp as emitted by Nuxeo.
pub fn parse_timestamp(document: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| FeedError::InvalidTimestamp {
            document: document.to_string(),
            value: value.to_string(),
            source,
        })
}

/// Rewrites Nuxeo download URLs to the path served behind basic auth.
pub fn basic_auth_url(url: &str) -> String {
    url.replace("/nuxeo/", "/Nuxeo/")
}

fn required_str<'a>(raw: &'a Value, key: &str, document: &str) -> Result<&'a str> {
    raw.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| FeedError::missing(document, key))
}

fn required_property<'a>(
    properties: &'a Map<String, Value>,
    key: &str,
    document: &str,
) -> Result<&'a Value> {
    properties
        .get(key)
        .ok_or_else(|| FeedError::missing_property(document, format!("properties/{key}")))
}

/// Property lists where `null` means absent. Any other non-array value is
/// malformed.
fn property_list<'a>(
    properties: &'a Map<String, Value>,
    key: &str,
    document: &str,
) -> Result<&'a [Value]> {
    match required_property(properties, key, document)? {
        Value::Null => Ok(&[][..]),
        Value::Array(list) => Ok(list.as_slice()),
        _ => Err(FeedError::missing_property(
            document,
            format!("properties/{key}"),
        )),
    }
}

fn creators(properties: &Map<String, Value>, document: &str) -> Result<Vec<String>> {
    property_list(properties, "ucldc_schema:creator", document)?
        .iter()
        .map(|creator| {
            creator
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    FeedError::missing_property(document, "properties/ucldc_schema:creator/name")
                })
        })
        .collect()
}

/// The first listed date. Its `date` key must be present; a `null` value
/// means no date.
fn primary_date(properties: &Map<String, Value>, document: &str) -> Result<Option<String>> {
    let Some(first) = property_list(properties, "ucldc_schema:date", document)?.first() else {
        return Ok(None);
    };
    match first.get("date") {
        Some(Value::Null) => Ok(None),
        Some(Value::String(date)) => Ok(Some(date.clone())),
        _ => Err(FeedError::missing_property(
            document,
            "properties/ucldc_schema:date/date",
        )),
    }
}

fn main_file(properties: &Map<String, Value>, document: &str) -> Result<Option<FileRef>> {
    let content = required_property(properties, "file:content", document)?;
    if content.is_null() {
        return Ok(None);
    }
    let content = content
        .as_object()
        .ok_or_else(|| FeedError::missing_property(document, "properties/file:content"))?;

    let name = content.get("name").and_then(Value::as_str);
    if name == Some(PLACEHOLDER_FILE_NAME) {
        return Ok(None);
    }
    let url = content
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| FeedError::missing_property(document, "properties/file:content/data"))?;
    if !content.contains_key("digest") {
        return Err(FeedError::missing_property(
            document,
            "properties/file:content/digest",
        ));
    }

    Ok(Some(FileRef {
        name: name.map(str::to_string),
        // Rewritten like auxiliary file URLs, unlike the older harvester.
        url: basic_auth_url(url),
        checksum: non_empty_str(content.get("digest")),
    }))
}

/// Attachments (`files:files`) first, then extra files (`extra_files:file`).
/// Entries without a download URL are skipped.
fn auxiliary_files(properties: &Map<String, Value>) -> Vec<FileRef> {
    let attachments = blobs(properties, "files:files", "file");
    let extras = blobs(properties, "extra_files:file", "blob");

    attachments
        .chain(extras)
        .filter_map(|blob| {
            let url = non_empty_str(blob.get("data"))?;
            Some(FileRef {
                name: non_empty_str(blob.get("name")),
                url: basic_auth_url(&url),
                checksum: non_empty_str(blob.get("digest")),
            })
        })
        .collect()
}

fn blobs<'a>(
    properties: &'a Map<String, Value>,
    list_key: &str,
    blob_key: &'a str,
) -> impl Iterator<Item = &'a Value> + 'a {
    properties
        .get(list_key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(move |item| item.get(blob_key).filter(|b| b.is_object()))
}

fn video_info(properties: &Map<String, Value>) -> Option<VideoInfo> {
    let info = properties.get("vid:info")?;
    Some(VideoInfo {
        width: info.get("width")?.as_u64()?,
        height: info.get("height")?.as_u64()?,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholder_picture_counts_as_no_file() {
        let raw = json!({
            "uid": "u1", "path": "/a/u1", "type": "SampleCustomPicture",
            "title": "T", "lastModified": "2020-01-01T00:00:00.000Z",
            "properties": {
                "ucldc_schema:creator": [], "ucldc_schema:date": [],
                "ucldc_schema:identifier": null, "ucldc_schema:collection": [],
                "file:content": {"name": "empty_picture.png", "data": "https://x/nuxeo/f", "digest": "d"}
            }
        });
        let record = DocumentRecord::from_nuxeo(&raw).unwrap();
        assert!(!record.has_file());
    }

    #[test]
    fn basic_auth_rewrite_only_touches_nuxeo_segment() {
        assert_eq!(
            basic_auth_url("https://host/nuxeo/nxfile/default/abc"),
            "https://host/Nuxeo/nxfile/default/abc"
        );
        assert_eq!(basic_auth_url("https://host/other"), "https://host/other");
    }
}
