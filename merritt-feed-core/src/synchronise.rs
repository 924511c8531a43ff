//! High-level pipeline: harvest → bundle → compose → validate → publish.
//!
//! This module orchestrates one feed run for a collection:
//!   - Resolves the collection's source path and destination id via a [`CollectionResolver`]
//!   - Harvests documents and their components from a [`DocumentSource`]
//!   - Bundles, orders and renders them into a [`Feed`](crate::feed::Feed), plus one media.json per object
//!   - Writes the feed locally, then publishes it to an [`ObjectStore`] only if no
//!     duplicate identifiers were emitted
//!
//! # Outcomes
//! A run either fails with a [`FeedError`] (nothing is published), or returns a
//! [`SynchroniseReport`] whose [`RunOutcome`] says whether the feed was published,
//! written locally only, or blocked by duplicates.
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Batch helpers: [`refresh_all`], [`stored_collection_ids`], [`download_feeds`]

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::atom;
use crate::bucket::BucketLocation;
use crate::bundle::{bundle, Bundle};
use crate::contract::{BoxError, CollectionResolver, DocumentSource, ObjectStore};
use crate::entry::{EntryAssembler, LinkTemplates};
use crate::error::{FeedError, Result};
use crate::feed::{
    compose, feed_filename, HeaderInfo, FEED_CONTENT_TYPE, FEED_FILE_EXTENSION, FEED_FILE_PREFIX,
};
use crate::harvest::{harvest, source_error};
use crate::media_json::{create_media_json, media_json_filename};
use crate::validate::PublishGate;

pub const DEFAULT_BUCKET: &str = "static.ucldc.cdlib.org/merritt";
pub const DEFAULT_MEDIA_JSON_BUCKET: &str = "static.ucldc.cdlib.org/merritt_media_json";
pub const MEDIA_JSON_DIR: &str = "media_json";

/// Options for a feed run.
#[derive(Debug, Clone)]
pub struct SynchroniseConfig {
    /// Where feeds are published; also determines each feed's URL.
    pub bucket: BucketLocation,
    /// Local directory the feed and media.json files are written to.
    pub output_dir: PathBuf,
    /// Write locally but never publish.
    pub nostash: bool,
    pub templates: LinkTemplates,
}

impl SynchroniseConfig {
    /// Default bucket, current directory, publishing enabled.
    pub fn new(templates: LinkTemplates) -> Result<Self> {
        Ok(Self {
            bucket: BucketLocation::parse(DEFAULT_BUCKET)?,
            output_dir: PathBuf::from("."),
            nostash: false,
            templates,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Written locally and uploaded.
    Published { key: String, url: String },
    /// Written locally; publishing was switched off.
    WrittenLocally,
    /// Written locally; upload withheld because identifiers repeat.
    Blocked { duplicates: BTreeSet<String> },
}

impl RunOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, RunOutcome::Blocked { .. })
    }
}

#[derive(Debug, Clone)]
pub struct SynchroniseReport {
    pub collection_id: String,
    pub feed_path: PathBuf,
    pub entries: usize,
    pub media_json_files: usize,
    pub outcome: RunOutcome,
}

fn resolver_error(e: BoxError) -> FeedError {
    match e.downcast::<FeedError>() {
        Ok(inner) => *inner,
        Err(e) => FeedError::Resolver(e),
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            error!(error = ?e, path = %parent.display(), "Failed to create output directory");
            FeedError::io(parent, e)
        })?;
    }
    fs::write(path, contents).map_err(|e| {
        error!(error = ?e, path = %path.display(), "Failed to write file");
        FeedError::io(path, e)
    })
}

fn write_media_json(bundles: &[Bundle], output_dir: &Path) -> Result<usize> {
    let dir = output_dir.join(MEDIA_JSON_DIR);
    for bundle in bundles {
        let media = create_media_json(&bundle.record)?;
        let path = dir.join(media_json_filename(bundle.id()));
        write_file(&path, serde_json::to_string_pretty(&media)?.as_bytes())?;
        debug!(path = %path.display(), "[SYNC] Wrote media.json");
    }
    Ok(bundles.len())
}

/// Builds, writes and (when clean) publishes the feed for one collection.
pub async fn synchronise<S, R, O>(
    collection_id: &str,
    config: &SynchroniseConfig,
    source: &S,
    resolver: &R,
    store: &O,
) -> Result<SynchroniseReport>
where
    S: DocumentSource + ?Sized,
    R: CollectionResolver + ?Sized,
    O: ObjectStore + ?Sized,
{
    info!(collection_id, "[SYNC] Starting feed run");

    let collection_path = resolver
        .resolve_path(collection_id)
        .await
        .map_err(resolver_error)?;
    let sync_id = resolver
        .resolve_destination_id(collection_id)
        .await
        .map_err(resolver_error)?;
    if sync_id.trim().is_empty() {
        error!(collection_id, "[SYNC][ERROR] Empty destination id");
        return Err(FeedError::MissingMapping {
            collection_id: collection_id.to_string(),
            what: "destination id",
        });
    }
    info!(collection_id, %collection_path, %sync_id, "[SYNC] Resolved collection");

    let filename = feed_filename(collection_id);
    let feed_url = config.bucket.public_url(&filename);
    let feed_path = config.output_dir.join(&filename);

    let collection = source
        .fetch_collection(&collection_path)
        .await
        .map_err(source_error)?;
    let documents = harvest(source, &collection_path).await?;
    let bundles = bundle(&documents);

    let header = HeaderInfo {
        sync_id,
        feed_url,
        collection_title: collection.title,
        collection_url: config.templates.view_url(&collection.uid),
        updated: Utc::now(),
    };
    let feed = compose(&bundles, &header, &EntryAssembler::new(config.templates.clone()));
    info!(entries = feed.entries.len(), "[SYNC] Composed feed");

    let media_json_files = write_media_json(&bundles, &config.output_dir)?;

    let xml = atom::to_xml(&feed)?;
    write_file(&feed_path, &xml)?;
    info!(path = %feed_path.display(), "[SYNC] Feed written to file");

    let outcome = match PublishGate::evaluate(&feed) {
        PublishGate::HasDuplicates(duplicates) => {
            warn!(
                path = %feed_path.display(),
                duplicates = ?duplicates,
                "[SYNC] Duplicates in feed; will not publish"
            );
            RunOutcome::Blocked { duplicates }
        }
        PublishGate::Clean if config.nostash => {
            info!("[SYNC] Publishing disabled; feed kept locally");
            RunOutcome::WrittenLocally
        }
        PublishGate::Clean => {
            let key = config.bucket.key_for(&filename);
            store
                .put(&key, xml, FEED_CONTENT_TYPE)
                .await
                .map_err(|e| {
                    error!(error = ?e, %key, "[SYNC][ERROR] Failed to publish feed");
                    FeedError::Store(e)
                })?;
            let url = config.bucket.public_url(&filename);
            info!(%key, %url, "[SYNC] Feed published");
            RunOutcome::Published { key, url }
        }
    };

    Ok(SynchroniseReport {
        collection_id: collection_id.to_string(),
        feed_path,
        entries: feed.entries.len(),
        media_json_files,
        outcome,
    })
}

fn feed_key_pattern() -> Result<Regex> {
    let pattern = format!(
        r"(?:^|/){}([^/]+){}$",
        regex::escape(FEED_FILE_PREFIX),
        regex::escape(FEED_FILE_EXTENSION)
    );
    Regex::new(&pattern).map_err(|e| FeedError::Config(format!("feed key pattern: {e}")))
}

/// Collection ids of every feed already stored under `bucket`.
pub async fn stored_collection_ids<O>(store: &O, bucket: &BucketLocation) -> Result<Vec<String>>
where
    O: ObjectStore + ?Sized,
{
    let pattern = feed_key_pattern()?;
    let keys = store
        .list(&bucket.list_prefix())
        .await
        .map_err(FeedError::Store)?;
    Ok(keys
        .iter()
        .filter_map(|key| pattern.captures(key))
        .map(|caps| caps[1].to_string())
        .collect())
}

/// Rebuilds every feed already stored under the configured bucket. Stops at
/// the first failed run.
pub async fn refresh_all<S, R, O>(
    config: &SynchroniseConfig,
    source: &S,
    resolver: &R,
    store: &O,
) -> Result<Vec<SynchroniseReport>>
where
    S: DocumentSource + ?Sized,
    R: CollectionResolver + ?Sized,
    O: ObjectStore + ?Sized,
{
    let ids = stored_collection_ids(store, &config.bucket).await?;
    info!(collections = ids.len(), bucket = %config.bucket, "[SYNC] Refreshing stored feeds");

    let mut reports = Vec::with_capacity(ids.len());
    for collection_id in &ids {
        reports.push(synchronise(collection_id, config, source, resolver, store).await?);
    }
    Ok(reports)
}

/// Copies every stored feed into `dir`, named by its filename.
pub async fn download_feeds<O>(
    store: &O,
    bucket: &BucketLocation,
    dir: &Path,
) -> Result<Vec<PathBuf>>
where
    O: ObjectStore + ?Sized,
{
    let keys = store
        .list(&bucket.list_prefix())
        .await
        .map_err(FeedError::Store)?;

    let mut written = Vec::new();
    for key in keys.iter().filter(|k| k.ends_with(FEED_FILE_EXTENSION)) {
        let filename = key.rsplit('/').next().unwrap_or(key.as_str());
        let body = store.get(key).await.map_err(FeedError::Store)?;
        let path = dir.join(filename);
        write_file(&path, &body)?;
        info!(%key, path = %path.display(), "[DOWNLOAD] Stored feed copied");
        written.push(path);
    }
    Ok(written)
}
