mod common;

use common::{assembler, file, record, ts, with_main_file};
use merritt_feed_core::atom::{
    format_timestamp, read_local_identifiers, to_xml, ATOM_NS, DC_NS, NX_NS, OPENSEARCH_NS,
    SYNC_ID_ELEMENT,
};
use merritt_feed_core::bundle::bundle;
use merritt_feed_core::feed::{compose, Feed, HeaderInfo};
use merritt_feed_core::validate::duplicate_values;

fn sample_feed() -> Feed {
    let mut parent = with_main_file(record("P", "2020-01-01T00:00:00Z"), Some("abc123"));
    parent.creators = vec!["Doe, Jane".to_string()];
    parent.primary_date = Some("1920".to_string());
    parent.external_identifier = Some("ark:/13030/ext".to_string());
    parent.components = vec![with_main_file(record("C", "2020-02-01T00:00:00Z"), None)];

    let mut plain = record("Q", "2019-01-01T00:00:00Z");
    plain.auxiliary_files = vec![file("https://host/Nuxeo/aux & more", Some("def"))];

    let header = HeaderInfo {
        sync_id: "ark:/13030/m5sync".to_string(),
        feed_url: "https://s3.amazonaws.com/static/merritt/ucldc_collection_7.atom".to_string(),
        collection_title: "Letters <1900>".to_string(),
        collection_url: "https://nuxeo.example.org/coll".to_string(),
        updated: ts("2024-05-01T12:00:00Z"),
    };
    compose(&bundle(&[parent, plain]), &header, &assembler())
}

fn render() -> String {
    String::from_utf8(to_xml(&sample_feed()).expect("serializes")).expect("utf-8")
}

#[test]
fn root_declares_every_namespace() {
    let xml = render();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    for ns in [ATOM_NS, DC_NS, NX_NS, OPENSEARCH_NS] {
        assert!(xml.contains(ns), "missing namespace {ns}");
    }
    assert!(xml.ends_with("</feed>\n"));
}

#[test]
fn header_carries_sync_id_and_escaped_title() {
    let xml = render();
    assert!(xml.contains(&format!(
        "<{SYNC_ID_ELEMENT}>ark:/13030/m5sync</{SYNC_ID_ELEMENT}>"
    )));
    assert!(xml.contains("Letters &lt;1900&gt;"));
    assert!(xml.contains("<updated>2024-05-01T12:00:00+00:00</updated>"));
}

#[test]
fn checksum_is_nested_inside_its_link() {
    let xml = render();
    assert!(xml.contains("<opensearch:checksum algorithm=\"MD5\">abc123</opensearch:checksum>"));
    assert!(xml.contains("<opensearch:checksum algorithm=\"MD5\">def</opensearch:checksum>"));
    assert!(xml.contains("aux &amp; more"));
}

#[test]
fn missing_date_is_written_as_empty_element() {
    let xml = render();
    assert!(xml.contains("<dc:date>1920</dc:date>"));
    assert!(xml.contains("<dc:date/>"));
    assert!(xml.contains("<nx:identifier>ark:/13030/ext</nx:identifier>"));
    assert!(xml.contains("<nx:collection/>"));
}

#[test]
fn written_identifiers_read_back_in_entry_order() {
    let feed = sample_feed();
    let xml = to_xml(&feed).expect("serializes");
    let ids = read_local_identifiers(&xml).expect("parses");
    let expected: Vec<String> = feed.local_identifiers().map(str::to_string).collect();
    assert_eq!(ids, expected);
    assert_eq!(ids, vec!["Q", "P"]);
}

#[test]
fn identifiers_in_other_namespaces_are_ignored() {
    let xml = format!(
        r#"<?xml version="1.0"?>
<feed xmlns="{ATOM_NS}" xmlns:dc="{DC_NS}" xmlns:nx="{NX_NS}">
  <entry><dc:identifier>A</dc:identifier><nx:identifier>ignored</nx:identifier></entry>
  <entry><dc:identifier>A</dc:identifier></entry>
</feed>"#
    );
    let ids = read_local_identifiers(xml.as_bytes()).expect("parses");
    assert_eq!(ids, vec!["A", "A"]);
}

#[test]
fn cdata_identifiers_and_whitespace_are_kept_verbatim() {
    let xml = format!(
        r#"<?xml version="1.0"?>
<feed xmlns="{ATOM_NS}" xmlns:dc="{DC_NS}">
  <entry><dc:identifier><![CDATA[A]]></dc:identifier></entry>
  <entry><dc:identifier><![CDATA[B]]></dc:identifier></entry>
  <entry><dc:identifier> C</dc:identifier></entry>
  <entry><dc:identifier>C</dc:identifier></entry>
</feed>"#
    );
    let ids = read_local_identifiers(xml.as_bytes()).expect("parses");
    assert_eq!(ids, vec!["A", "B", " C", "C"]);
    assert!(duplicate_values(ids).is_empty());
}

#[test]
fn timestamps_keep_fractional_seconds_when_present() {
    assert_eq!(
        format_timestamp(&ts("2021-03-04T05:06:07.250Z")),
        "2021-03-04T05:06:07.250+00:00"
    );
    assert_eq!(
        format_timestamp(&ts("2021-03-04T05:06:07Z")),
        "2021-03-04T05:06:07+00:00"
    );
}
