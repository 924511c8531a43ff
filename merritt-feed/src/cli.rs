///
/// This module implements the CLI for merritt-feed: command parsing, wiring of
/// the real collaborators (Nuxeo, collection registry, S3), and user-visible
/// output.
///
/// All feed logic (bundling, entry assembly, composition, duplicate checks,
/// publishing decisions) lives in the [`merritt-feed-core`] crate. This module
/// is CLI glue only.
///
/// ## How To Use
/// - From the command line: `merritt-feed --help`.
/// - Programmatically or in tests: call [`run`] with a constructed [`Cli`] and
///   map the returned [`CliOutcome`] to an exit code.
///
/// [`merritt-feed-core`]: ../../merritt-feed-core/
use crate::load_config::{default_settings_path, load_config, FeedSettings, Overrides};
use crate::nuxeo::NuxeoClient;
use crate::registry::RegistryClient;
use crate::s3::S3Store;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use merritt_feed_core::atom::read_local_identifiers;
use merritt_feed_core::bucket::BucketLocation;
use merritt_feed_core::contract::CollectionResolver;
use merritt_feed_core::resolver::StaticCollectionResolver;
use merritt_feed_core::synchronise::{
    download_feeds, refresh_all, synchronise, RunOutcome, SynchroniseReport, DEFAULT_BUCKET,
};
use merritt_feed_core::validate::duplicate_values;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status when a feed was withheld, or a checked file contains duplicates.
pub const EXIT_DUPLICATES: u8 = 3;

/// CLI for merritt-feed: build and publish UCLDC collection feeds for Merritt.
#[derive(Parser)]
#[clap(
    name = "merritt-feed",
    version,
    about = "Create ATOM feeds of UCLDC collections in Nuxeo for harvesting by Merritt"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

/// Options shared by the feed-building commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Settings file; defaults to ~/.merritt-feed.yaml
    #[clap(long)]
    pub credentials: Option<PathBuf>,
    /// S3 bucket path the feed is published to, e.g. static.ucldc.cdlib.org/merritt
    #[clap(long)]
    pub bucket: Option<String>,
    /// Local directory for the feed and media.json files
    #[clap(long)]
    pub dir: Option<PathBuf>,
    /// Write files locally but do not publish
    #[clap(long)]
    pub nostash: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the feed for one collection and publish it if it is clean
    Create {
        /// Collection registry id
        collection_id: String,
        #[clap(flatten)]
        args: RunArgs,
    },
    /// Rebuild every feed already published in the bucket
    RefreshAll {
        #[clap(flatten)]
        args: RunArgs,
    },
    /// Report repeated dc:identifier values in a local feed file
    CheckDuplicates {
        /// Path to the feed file
        path: PathBuf,
    },
    /// Copy every published feed into a local directory
    Download {
        #[clap(long)]
        bucket: Option<String>,
        #[clap(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliOutcome {
    Success,
    /// A feed was withheld or a checked file has duplicates.
    DuplicatesFound,
}

impl CliOutcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            CliOutcome::Success => ExitCode::SUCCESS,
            CliOutcome::DuplicatesFound => ExitCode::from(EXIT_DUPLICATES),
        }
    }
}

fn settings_for(args: &RunArgs) -> Result<FeedSettings> {
    let path = match &args.credentials {
        Some(path) => path.clone(),
        None => default_settings_path()?,
    };
    let mut settings = load_config(path)?;
    settings.apply(&Overrides {
        bucket: args.bucket.clone(),
        dir: args.dir.clone(),
        nostash: args.nostash,
    });
    Ok(settings)
}

fn resolver_for(settings: &FeedSettings) -> Box<dyn CollectionResolver> {
    if settings.collections.is_empty() {
        tracing::info!(registry = %settings.registry_api, "Resolving collections via registry");
        Box::new(RegistryClient::new(&settings.registry_api))
    } else {
        tracing::info!(
            collections = settings.collections.len(),
            "Resolving collections from settings table"
        );
        Box::new(StaticCollectionResolver::new(settings.collections.clone()))
    }
}

fn print_report(report: &SynchroniseReport) {
    println!(
        "Collection {}: {} entries written to {}",
        report.collection_id,
        report.entries,
        report.feed_path.display()
    );
    match &report.outcome {
        RunOutcome::Published { url, .. } => println!("Feed published: {url}"),
        RunOutcome::WrittenLocally => println!("Feed not published (nostash)"),
        RunOutcome::Blocked { duplicates } => {
            println!("Duplicates in feed; not published:");
            for id in duplicates {
                println!("  {id}");
            }
        }
    }
}

fn outcome_of<'a>(reports: impl IntoIterator<Item = &'a SynchroniseReport>) -> CliOutcome {
    if reports.into_iter().any(|r| r.outcome.is_blocked()) {
        CliOutcome::DuplicatesFound
    } else {
        CliOutcome::Success
    }
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<CliOutcome> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Create {
            collection_id,
            args,
        } => {
            let settings = settings_for(&args)?;
            let config = settings.synchronise_config()?;
            let source = NuxeoClient::new(&settings.nuxeo)
                .map_err(|e| anyhow::anyhow!("Nuxeo client: {e}"))?;
            let resolver = resolver_for(&settings);
            let store = S3Store::from_env(config.bucket.bucket.clone()).await;

            tracing::info!(command = "create", %collection_id, "Starting feed run");
            let report = synchronise(&collection_id, &config, &source, &*resolver, &store)
                .await
                .with_context(|| format!("Feed run for collection {collection_id} failed"))?;
            print_report(&report);
            Ok(outcome_of([&report]))
        }
        Commands::RefreshAll { args } => {
            let settings = settings_for(&args)?;
            let config = settings.synchronise_config()?;
            let source = NuxeoClient::new(&settings.nuxeo)
                .map_err(|e| anyhow::anyhow!("Nuxeo client: {e}"))?;
            let resolver = resolver_for(&settings);
            let store = S3Store::from_env(config.bucket.bucket.clone()).await;

            tracing::info!(command = "refresh-all", bucket = %config.bucket, "Refreshing feeds");
            let reports = refresh_all(&config, &source, &*resolver, &store)
                .await
                .context("Refreshing stored feeds failed")?;
            for report in &reports {
                print_report(report);
            }
            Ok(outcome_of(&reports))
        }
        Commands::CheckDuplicates { path } => {
            let xml = std::fs::read(&path)
                .with_context(|| format!("Failed to read feed file {}", path.display()))?;
            let identifiers = read_local_identifiers(&xml)
                .with_context(|| format!("Failed to parse feed file {}", path.display()))?;
            let duplicates = duplicate_values(&identifiers);
            tracing::info!(
                command = "check-duplicates",
                path = %path.display(),
                identifiers = identifiers.len(),
                duplicates = duplicates.len(),
                "Checked feed for duplicates"
            );
            if duplicates.is_empty() {
                println!("No duplicate identifiers in {}", path.display());
                Ok(CliOutcome::Success)
            } else {
                println!("Duplicate identifiers in {}:", path.display());
                for id in &duplicates {
                    println!("  {id}");
                }
                Ok(CliOutcome::DuplicatesFound)
            }
        }
        Commands::Download { bucket, dir } => {
            let location = BucketLocation::parse(bucket.as_deref().unwrap_or(DEFAULT_BUCKET))?;
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            let store = S3Store::from_env(location.bucket.clone()).await;

            tracing::info!(command = "download", bucket = %location, "Downloading feeds");
            let written = download_feeds(&store, &location, &dir)
                .await
                .context("Downloading feeds failed")?;
            println!("Downloaded {} feeds to {}", written.len(), dir.display());
            Ok(CliOutcome::Success)
        }
    }
}
