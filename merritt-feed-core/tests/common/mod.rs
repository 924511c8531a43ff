#![allow(dead_code)]

use chrono::{DateTime, Utc};
use merritt_feed_core::entry::{EntryAssembler, LinkTemplates};
use merritt_feed_core::record::{DocumentRecord, FileRef};

pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid RFC 3339 timestamp")
}

pub fn record(id: &str, last_modified: &str) -> DocumentRecord {
    DocumentRecord {
        id: id.to_string(),
        path: format!("/asset-library/UCX/test/{id}"),
        doc_type: "SampleCustomPicture".to_string(),
        title: format!("Title {id}"),
        creators: vec![],
        primary_date: None,
        external_identifier: None,
        collection_tag: None,
        last_modified: ts(last_modified),
        main_file: None,
        auxiliary_files: vec![],
        video: None,
        components: vec![],
    }
}

pub fn file(url: &str, checksum: Option<&str>) -> FileRef {
    FileRef {
        name: None,
        url: url.to_string(),
        checksum: checksum.map(str::to_string),
    }
}

pub fn with_main_file(mut record: DocumentRecord, checksum: Option<&str>) -> DocumentRecord {
    record.main_file = Some(file(
        &format!("https://nuxeo.example.org/Nuxeo/nxfile/default/{}/file:content", record.id),
        checksum,
    ));
    record
}

pub fn templates() -> LinkTemplates {
    LinkTemplates::new(
        "https://nuxeo.example.org/Nuxeo/nxdoc/default/{id}/view_documents",
        "https://nuxeo.example.org/Merritt/{id}.xml",
        "https://s3.amazonaws.com/media/{id}-media.json",
    )
    .expect("templates are valid")
}

pub fn assembler() -> EntryAssembler {
    EntryAssembler::new(templates())
}
