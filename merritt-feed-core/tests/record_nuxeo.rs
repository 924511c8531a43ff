use merritt_feed_core::record::{DocumentRecord, VideoInfo};
use merritt_feed_core::FeedError;
use serde_json::{json, Value};

fn nuxeo_doc() -> Value {
    json!({
        "entity-type": "document",
        "uid": "0a1b2c",
        "path": "/asset-library/UCM/Letters/0a1b2c",
        "type": "CustomVideo",
        "title": "Interview",
        "lastModified": "2021-07-09T18:20:31.123Z",
        "properties": {
            "ucldc_schema:creator": [
                {"name": "Smith, Ann", "roletype": "creator"},
                {"name": "Jones, Bob"}
            ],
            "ucldc_schema:date": [{"date": "1968-05", "datetype": "created"}],
            "ucldc_schema:identifier": "ark:/13030/xyz",
            "ucldc_schema:collection": ["https://registry.cdlib.org/api/v1/collection/108/"],
            "file:content": {
                "name": "interview.mp4",
                "data": "https://nuxeo.cdlib.org/nuxeo/nxfile/default/0a1b2c/file:content/interview.mp4",
                "digest": "5eb63bbbe01eeed093cb22bb8f5acdc3"
            },
            "files:files": [
                {"file": {"name": "transcript.pdf",
                          "data": "https://nuxeo.cdlib.org/nuxeo/nxfile/default/0a1b2c/files:files/0/file/transcript.pdf",
                          "digest": "aaa"}},
                {"file": null}
            ],
            "extra_files:file": [
                {"blob": {"name": "captions.vtt",
                          "data": "https://nuxeo.cdlib.org/nuxeo/nxfile/default/0a1b2c/extra_files:file/0/blob/captions.vtt",
                          "digest": ""}}
            ],
            "vid:info": {"width": 1920, "height": 1080, "duration": 61.5}
        }
    })
}

#[test]
fn reads_descriptive_metadata_and_files() {
    let record = DocumentRecord::from_nuxeo(&nuxeo_doc()).expect("valid document");

    assert_eq!(record.id, "0a1b2c");
    assert_eq!(record.doc_type, "CustomVideo");
    assert_eq!(record.creators, vec!["Smith, Ann", "Jones, Bob"]);
    assert_eq!(record.primary_date.as_deref(), Some("1968-05"));
    assert_eq!(record.external_identifier.as_deref(), Some("ark:/13030/xyz"));
    assert_eq!(
        record.collection_tag.as_deref(),
        Some("https://registry.cdlib.org/api/v1/collection/108/")
    );
    assert_eq!(
        record.last_modified,
        "2021-07-09T18:20:31.123Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
    );
    assert_eq!(record.video, Some(VideoInfo { width: 1920, height: 1080 }));
    assert!(record.components.is_empty());

    let main = record.main_file.expect("main file");
    assert_eq!(
        main.url,
        "https://nuxeo.cdlib.org/Nuxeo/nxfile/default/0a1b2c/file:content/interview.mp4"
    );
    assert_eq!(main.checksum.as_deref(), Some("5eb63bbbe01eeed093cb22bb8f5acdc3"));
}

#[test]
fn auxiliary_files_keep_attachment_then_extra_order() {
    let record = DocumentRecord::from_nuxeo(&nuxeo_doc()).expect("valid document");
    let names: Vec<Option<&str>> = record
        .auxiliary_files
        .iter()
        .map(|f| f.name.as_deref())
        .collect();
    assert_eq!(names, vec![Some("transcript.pdf"), Some("captions.vtt")]);
    assert!(record.auxiliary_files.iter().all(|f| f.url.contains("/Nuxeo/")));
    assert_eq!(record.auxiliary_files[1].checksum, None);
}

#[test]
fn null_content_means_no_file() {
    let mut raw = nuxeo_doc();
    raw["properties"]["file:content"] = Value::Null;
    let record = DocumentRecord::from_nuxeo(&raw).expect("valid document");
    assert!(!record.has_file());
}

#[test]
fn missing_content_property_is_a_configuration_error() {
    let mut raw = nuxeo_doc();
    raw["properties"]
        .as_object_mut()
        .unwrap()
        .remove("file:content");
    let err = DocumentRecord::from_nuxeo(&raw).unwrap_err();
    assert!(matches!(err, FeedError::MissingField { ref field, .. } if field.contains("file:content")));
    assert!(err.is_configuration());
    assert!(err.to_string().contains("X-NXDocumentProperties"));
}

#[test]
fn content_without_download_url_is_rejected() {
    let mut raw = nuxeo_doc();
    raw["properties"]["file:content"]
        .as_object_mut()
        .unwrap()
        .remove("data");
    let err = DocumentRecord::from_nuxeo(&raw).unwrap_err();
    assert!(matches!(err, FeedError::MissingField { ref document, .. } if document == "0a1b2c"));
}

#[test]
fn content_without_digest_key_is_rejected() {
    let mut raw = nuxeo_doc();
    raw["properties"]["file:content"]
        .as_object_mut()
        .unwrap()
        .remove("digest");
    assert!(matches!(
        DocumentRecord::from_nuxeo(&raw),
        Err(FeedError::MissingField { .. })
    ));
}

#[test]
fn unparseable_timestamp_names_the_document() {
    let mut raw = nuxeo_doc();
    raw["lastModified"] = json!("yesterday");
    match DocumentRecord::from_nuxeo(&raw) {
        Err(FeedError::InvalidTimestamp { document, value, .. }) => {
            assert_eq!(document, "0a1b2c");
            assert_eq!(value, "yesterday");
        }
        other => panic!("expected InvalidTimestamp, got {other:?}"),
    }
}

#[test]
fn missing_top_level_key_is_reported() {
    let mut raw = nuxeo_doc();
    raw.as_object_mut().unwrap().remove("title");
    assert!(matches!(
        DocumentRecord::from_nuxeo(&raw),
        Err(FeedError::MissingField { ref field, .. }) if field == "title"
    ));
}

#[test]
fn creator_without_name_is_rejected() {
    let mut raw = nuxeo_doc();
    raw["properties"]["ucldc_schema:creator"] = json!([{"role": "author"}, {"name": "Doe"}]);
    assert!(matches!(
        DocumentRecord::from_nuxeo(&raw),
        Err(FeedError::MissingField { ref field, .. }) if field == "properties/ucldc_schema:creator/name"
    ));
}

#[test]
fn creator_given_as_text_is_rejected() {
    let mut raw = nuxeo_doc();
    raw["properties"]["ucldc_schema:creator"] = json!("Doe, Jane");
    assert!(matches!(
        DocumentRecord::from_nuxeo(&raw),
        Err(FeedError::MissingField { ref field, .. }) if field == "properties/ucldc_schema:creator"
    ));
}

#[test]
fn date_entry_without_date_is_rejected() {
    let mut raw = nuxeo_doc();
    raw["properties"]["ucldc_schema:date"] = json!([{"type": "created"}]);
    assert!(matches!(
        DocumentRecord::from_nuxeo(&raw),
        Err(FeedError::MissingField { ref field, .. }) if field == "properties/ucldc_schema:date/date"
    ));
}

#[test]
fn null_creator_and_date_mean_absent() {
    let mut raw = nuxeo_doc();
    raw["properties"]["ucldc_schema:creator"] = Value::Null;
    raw["properties"]["ucldc_schema:date"] = Value::Null;
    let record = DocumentRecord::from_nuxeo(&raw).expect("null lists are accepted");
    assert!(record.creators.is_empty());
    assert_eq!(record.primary_date, None);

    raw["properties"]["ucldc_schema:date"] = json!([{"date": null, "datetype": "created"}]);
    let record = DocumentRecord::from_nuxeo(&raw).expect("null date is accepted");
    assert_eq!(record.primary_date, None);
}
