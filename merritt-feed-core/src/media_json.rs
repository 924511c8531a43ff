//! `media.json` structural metadata for an object and its components, read
//! by downstream deep-harvest consumers through the entry's deep-structure
//! link.

use serde::{Deserialize, Serialize};

use crate::error::{FeedError, Result};
use crate::record::DocumentRecord;

const TYPE_FORMATS: [(&str, &str); 6] = [
    ("SampleCustomPicture", "image"),
    ("CustomAudio", "audio"),
    ("CustomVideo", "video"),
    ("CustomFile", "file"),
    ("Organization", "file"),
    ("CustomThreeD", "3d"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaJson {
    pub label: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(rename = "structMap", skip_serializing_if = "Option::is_none")]
    pub struct_map: Option<Vec<MediaJson>>,
}

/// Maps a source document type to its media format.
pub fn media_format(record: &DocumentRecord) -> Result<&'static str> {
    TYPE_FORMATS
        .iter()
        .find(|(doc_type, _)| *doc_type == record.doc_type)
        .map(|(_, format)| *format)
        .ok_or_else(|| FeedError::UnknownDocumentType {
            document: record.id.clone(),
            doc_type: record.doc_type.clone(),
            expected: TYPE_FORMATS.iter().map(|(t, _)| *t).collect(),
        })
}

fn content(record: &DocumentRecord) -> Result<MediaJson> {
    let mut media = MediaJson {
        label: record.title.clone(),
        id: record.id.clone(),
        href: None,
        format: None,
        dimensions: None,
        struct_map: None,
    };
    if let Some(file) = &record.main_file {
        let format = media_format(record)?;
        if format == "video" {
            let video = record.video.ok_or_else(|| FeedError::MissingVideoInfo {
                document: record.id.clone(),
            })?;
            media.dimensions = Some(format!("{}:{}", video.width, video.height));
        }
        media.href = Some(file.url.clone());
        media.format = Some(format.to_string());
    }
    Ok(media)
}

pub fn create_media_json(record: &DocumentRecord) -> Result<MediaJson> {
    let mut media = content(record)?;
    if record.is_parent() {
        media.struct_map = Some(
            record
                .components
                .iter()
                .map(content)
                .collect::<Result<Vec<_>>>()?,
        );
    }
    Ok(media)
}

pub fn media_json_filename(id: &str) -> String {
    format!("{id}-media.json")
}
