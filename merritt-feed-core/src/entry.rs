//! Renders one [`Bundle`] into a feed entry.
//!
//! Components are flattened into the parent's link list; they never become
//! entries of their own.

use chrono::{DateTime, Utc};
use url::Url;

use crate::bundle::Bundle;
use crate::error::{FeedError, Result};
use crate::record::{DocumentRecord, FileRef};

/// Author rendered on the feed and on every entry.
pub const AUTHOR: &str = "UC Libraries Digital Collection";

/// The only digest type the source supplies.
pub const CHECKSUM_ALGORITHM: &str = "MD5";

const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    FullMetadata,
    DeepStructure,
    MainContent,
    Auxiliary,
}

impl LinkKind {
    pub fn title(self) -> &'static str {
        match self {
            LinkKind::FullMetadata => "Full metadata for this object from Nuxeo",
            LinkKind::DeepStructure => "Deep Harvest metadata for this object",
            LinkKind::MainContent => "Main content file",
            LinkKind::Auxiliary => "Auxiliary file",
        }
    }

    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            LinkKind::FullMetadata => Some("application/xml"),
            LinkKind::DeepStructure => Some("application/json"),
            LinkKind::MainContent | LinkKind::Auxiliary => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub kind: LinkKind,
    pub rel: &'static str,
    pub href: String,
    pub checksum: Option<Checksum>,
}

impl Link {
    fn new(kind: LinkKind, href: String) -> Link {
        Link {
            kind,
            rel: "alternate",
            href,
            checksum: None,
        }
    }

    fn file(kind: LinkKind, file: &FileRef) -> Link {
        Link {
            checksum: file.checksum.clone().map(|value| Checksum {
                algorithm: CHECKSUM_ALGORITHM,
                value,
            }),
            ..Link::new(kind, file.url.clone())
        }
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    pub fn mime_type(&self) -> Option<&'static str> {
        self.kind.mime_type()
    }
}

/// URL templates for the per-document links. Each contains `{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTemplates {
    pub view: String,
    pub full_metadata: String,
    pub deep_structure: String,
}

impl LinkTemplates {
    pub fn new(
        view: impl Into<String>,
        full_metadata: impl Into<String>,
        deep_structure: impl Into<String>,
    ) -> Result<LinkTemplates> {
        let templates = LinkTemplates {
            view: view.into(),
            full_metadata: full_metadata.into(),
            deep_structure: deep_structure.into(),
        };
        for template in [
            &templates.view,
            &templates.full_metadata,
            &templates.deep_structure,
        ] {
            if !template.contains(ID_PLACEHOLDER) {
                return Err(FeedError::Config(format!(
                    "link template '{template}' has no {ID_PLACEHOLDER} placeholder"
                )));
            }
        }
        Ok(templates)
    }

    /// Templates for a Nuxeo instance, derived from its REST API base URL,
    /// with media.json files served from `media_json_bucket` on S3.
    pub fn for_nuxeo(api_base: &str, media_json_bucket: &str) -> Result<LinkTemplates> {
        let api = Url::parse(api_base)
            .map_err(|e| FeedError::Config(format!("invalid Nuxeo API URL '{api_base}': {e}")))?;
        let host = api
            .host_str()
            .ok_or_else(|| FeedError::Config(format!("Nuxeo API URL '{api_base}' has no host")))?;
        let origin = match api.port() {
            Some(port) => format!("{}://{host}:{port}", api.scheme()),
            None => format!("{}://{host}", api.scheme()),
        };
        LinkTemplates::new(
            format!("{origin}/Nuxeo/nxdoc/default/{ID_PLACEHOLDER}/view_documents"),
            format!("{origin}/Merritt/{ID_PLACEHOLDER}.xml"),
            format!(
                "https://s3.amazonaws.com/{}/{ID_PLACEHOLDER}-media.json",
                media_json_bucket.trim_matches('/')
            ),
        )
    }

    pub fn view_url(&self, id: &str) -> String {
        self.view.replace(ID_PLACEHOLDER, id)
    }

    pub fn full_metadata_url(&self, id: &str) -> String {
        self.full_metadata.replace(ID_PLACEHOLDER, id)
    }

    pub fn deep_structure_url(&self, id: &str) -> String {
        self.deep_structure.replace(ID_PLACEHOLDER, id)
    }
}

/// The rendering of one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    pub author: &'static str,
    /// The parent document's own modification time.
    pub updated: DateTime<Utc>,
    pub links: Vec<Link>,
    pub creators: Vec<String>,
    pub date: Option<String>,
    pub local_identifier: String,
    pub external_identifier: Option<String>,
    pub collection_tag: Option<String>,
    /// Sort key of the source bundle. Not rendered.
    pub effective_modified: DateTime<Utc>,
}

impl FeedEntry {
    pub fn links_of(&self, kind: LinkKind) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.kind == kind)
    }
}

#[derive(Debug, Clone)]
pub struct EntryAssembler {
    templates: LinkTemplates,
}

impl EntryAssembler {
    pub fn new(templates: LinkTemplates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &LinkTemplates {
        &self.templates
    }

    pub fn assemble(&self, bundle: &Bundle) -> FeedEntry {
        let record = &bundle.record;
        let mut links = vec![Link::new(
            LinkKind::FullMetadata,
            self.templates.full_metadata_url(&record.id),
        )];
        if record.is_parent() {
            links.push(Link::new(
                LinkKind::DeepStructure,
                self.templates.deep_structure_url(&record.id),
            ));
        }
        push_file_links(&mut links, record);

        for component in &record.components {
            links.push(Link::new(
                LinkKind::FullMetadata,
                self.templates.full_metadata_url(&component.id),
            ));
            push_file_links(&mut links, component);
        }

        FeedEntry {
            id: self.templates.view_url(&record.id),
            title: record.title.clone(),
            author: AUTHOR,
            updated: record.last_modified,
            links,
            creators: record.creators.clone(),
            date: record.primary_date.clone(),
            local_identifier: record.id.clone(),
            external_identifier: record.external_identifier.clone(),
            collection_tag: record.collection_tag.clone(),
            effective_modified: bundle.effective_modified,
        }
    }
}

fn push_file_links(links: &mut Vec<Link>, record: &DocumentRecord) {
    if let Some(main) = &record.main_file {
        links.push(Link::file(LinkKind::MainContent, main));
    }
    links.extend(
        record
            .auxiliary_files
            .iter()
            .map(|aux| Link::file(LinkKind::Auxiliary, aux)),
    );
}
