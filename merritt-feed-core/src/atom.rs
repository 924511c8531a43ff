//! ATOM serialization of a [`Feed`], and reading identifiers back out of a
//! written feed.

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{NsReader, Writer};

use crate::entry::{FeedEntry, Link};
use crate::error::Result;
use crate::feed::{Feed, HeaderField};

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const NX_NS: &str = "http://www.nuxeo.org/ecm/project/schemas/tingle-california-digita/ucldc_schema";
pub const OPENSEARCH_NS: &str = "http://a9.com/-/spec/opensearch/1.1/";

/// Header element carrying the destination collection id.
pub const SYNC_ID_ELEMENT: &str = "merritt_collection_id";

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Serializes `feed` as a pretty-printed, UTF-8 XML document.
pub fn to_xml(feed: &Feed) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let root = BytesStart::new("feed").with_attributes([
        ("xmlns", ATOM_NS),
        ("xmlns:nx", NX_NS),
        ("xmlns:dc", DC_NS),
        ("xmlns:opensearch", OPENSEARCH_NS),
    ]);
    writer.write_event(Event::Start(root))?;

    for field in &feed.header {
        write_header_field(&mut writer, field)?;
    }
    for entry in &feed.entries {
        write_entry(&mut writer, entry)?;
    }

    writer.write_event(Event::End(BytesEnd::new("feed")))?;
    let mut xml = writer.into_inner();
    xml.push(b'\n');
    Ok(xml)
}

fn write_header_field(writer: &mut Writer<Vec<u8>>, field: &HeaderField) -> Result<()> {
    match field {
        HeaderField::Updated(at) => text_element(writer, "updated", Some(&format_timestamp(at))),
        HeaderField::Id(id) => text_element(writer, "id", Some(id)),
        HeaderField::Title(title) => text_element(writer, "title", Some(title)),
        HeaderField::Author(author) => text_element(writer, "author", Some(author)),
        HeaderField::Link { rel, href, title } => {
            let mut link = BytesStart::new("link");
            link.push_attribute(("rel", *rel));
            link.push_attribute(("href", href.as_str()));
            if let Some(title) = title {
                link.push_attribute(("title", title.as_str()));
            }
            writer.write_event(Event::Empty(link))?;
            Ok(())
        }
        HeaderField::SyncCollectionId(id) => text_element(writer, SYNC_ID_ELEMENT, Some(id)),
    }
}

fn write_entry(writer: &mut Writer<Vec<u8>>, entry: &FeedEntry) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("entry")))?;

    text_element(writer, "id", Some(&entry.id))?;
    text_element(writer, "title", Some(&entry.title))?;
    text_element(writer, "updated", Some(&format_timestamp(&entry.updated)))?;
    text_element(writer, "author", Some(entry.author))?;

    for link in &entry.links {
        write_link(writer, link)?;
    }

    for creator in &entry.creators {
        text_element(writer, "dc:creator", Some(creator))?;
    }
    text_element(writer, "dc:title", Some(&entry.title))?;
    text_element(writer, "dc:date", entry.date.as_deref())?;
    text_element(writer, "dc:identifier", Some(&entry.local_identifier))?;
    if let Some(external) = &entry.external_identifier {
        text_element(writer, "nx:identifier", Some(external))?;
    }
    text_element(writer, "nx:collection", entry.collection_tag.as_deref())?;

    writer.write_event(Event::End(BytesEnd::new("entry")))?;
    Ok(())
}

fn write_link(writer: &mut Writer<Vec<u8>>, link: &Link) -> Result<()> {
    let mut start = BytesStart::new("link");
    start.push_attribute(("rel", link.rel));
    start.push_attribute(("href", link.href.as_str()));
    if let Some(mime_type) = link.mime_type() {
        start.push_attribute(("type", mime_type));
    }
    start.push_attribute(("title", link.title()));

    match &link.checksum {
        None => writer.write_event(Event::Empty(start))?,
        Some(checksum) => {
            writer.write_event(Event::Start(start))?;
            let mut element = BytesStart::new("opensearch:checksum");
            element.push_attribute(("algorithm", checksum.algorithm));
            writer.write_event(Event::Start(element))?;
            writer.write_event(Event::Text(BytesText::new(&checksum.value)))?;
            writer.write_event(Event::End(BytesEnd::new("opensearch:checksum")))?;
            writer.write_event(Event::End(BytesEnd::new("link")))?;
        }
    }
    Ok(())
}

/// `<name>text</name>`, or `<name/>` when there is no value.
fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: Option<&str>) -> Result<()> {
    match text {
        None => writer.write_event(Event::Empty(BytesStart::new(name)))?,
        Some(text) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(text)))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
    }
    Ok(())
}

/// Every `dc:identifier` value in a written feed, in document order.
pub fn read_local_identifiers(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = NsReader::from_reader(xml);
    let mut buf = Vec::new();
    let mut identifiers = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_resolved_event_into(&mut buf)? {
            (ResolveResult::Bound(Namespace(ns)), Event::Start(e))
                if ns == DC_NS.as_bytes() && e.local_name().as_ref() == b"identifier" =>
            {
                current = Some(String::new());
            }
            (ResolveResult::Bound(Namespace(ns)), Event::Empty(e))
                if ns == DC_NS.as_bytes() && e.local_name().as_ref() == b"identifier" =>
            {
                identifiers.push(String::new());
            }
            (_, Event::Text(text)) => {
                if let Some(value) = current.as_mut() {
                    value.push_str(&text.unescape()?);
                }
            }
            (_, Event::CData(data)) => {
                if let Some(value) = current.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&data));
                }
            }
            (_, Event::End(_)) => {
                if let Some(value) = current.take() {
                    identifiers.push(value);
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(identifiers)
}
