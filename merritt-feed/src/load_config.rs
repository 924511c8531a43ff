/// `load_config` module: reads the YAML settings file, injects secrets from the
/// environment and applies command-line overrides.
///
/// This is the only place untrusted YAML is parsed. Everything downstream works
/// with [`FeedSettings`] and the core's [`SynchroniseConfig`].
///
/// # Sources, lowest precedence first
/// 1. Built-in defaults (bucket names, registry URL, output directory)
/// 2. The settings file, `~/.merritt-feed.yaml` unless `--credentials` is given
/// 3. `NUXEO_USER` / `NUXEO_PASSWORD` from the environment (or `.env`)
/// 4. `--bucket`, `--dir`, `--nostash` on the command line
///
/// # Errors
/// All errors use `anyhow::Error` and surface at the CLI boundary.
use anyhow::{Context, Result};
use merritt_feed_core::bucket::BucketLocation;
use merritt_feed_core::entry::LinkTemplates;
use merritt_feed_core::resolver::CollectionMapping;
use merritt_feed_core::synchronise::{
    SynchroniseConfig, DEFAULT_BUCKET, DEFAULT_MEDIA_JSON_BUCKET,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const SETTINGS_FILE_NAME: &str = ".merritt-feed.yaml";
pub const DEFAULT_REGISTRY_API: &str = "https://registry.cdlib.org/api/v1/";
pub const NUXEO_USER_ENV: &str = "NUXEO_USER";
pub const NUXEO_PASSWORD_ENV: &str = "NUXEO_PASSWORD";

#[derive(Debug, Clone, Deserialize)]
pub struct NuxeoSettings {
    /// REST API base, e.g. `https://nuxeo.cdlib.org/Nuxeo/site/api/v1`.
    pub api: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    pub nuxeo: NuxeoSettings,
    #[serde(default = "default_registry_api")]
    pub registry_api: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_media_json_bucket")]
    pub media_json_bucket: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub nostash: bool,
    /// Static collection table. When present, the registry is not consulted.
    #[serde(default)]
    pub collections: HashMap<String, CollectionMapping>,
}

fn default_registry_api() -> String {
    DEFAULT_REGISTRY_API.to_string()
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_media_json_bucket() -> String {
    DEFAULT_MEDIA_JSON_BUCKET.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Command-line values that win over the settings file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bucket: Option<String>,
    pub dir: Option<PathBuf>,
    pub nostash: bool,
}

/// `~/.merritt-feed.yaml`.
pub fn default_settings_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine the home directory")?;
    Ok(home.join(SETTINGS_FILE_NAME))
}

/// Loads the settings file at `path` and injects Nuxeo credentials from the
/// environment when set.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FeedSettings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut settings: FeedSettings = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Ok(user) = std::env::var(NUXEO_USER_ENV) {
        info!("{NUXEO_USER_ENV} found in env");
        settings.nuxeo.user = Some(user);
    }
    if let Ok(password) = std::env::var(NUXEO_PASSWORD_ENV) {
        info!("{NUXEO_PASSWORD_ENV} found in env");
        settings.nuxeo.password = Some(password);
    }

    Ok(settings)
}

impl FeedSettings {
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(bucket) = &overrides.bucket {
            self.bucket = bucket.clone();
        }
        if let Some(dir) = &overrides.dir {
            self.output_dir = dir.clone();
        }
        self.nostash |= overrides.nostash;
    }

    pub fn bucket_location(&self) -> Result<BucketLocation> {
        BucketLocation::parse(&self.bucket)
            .with_context(|| format!("Invalid bucket setting '{}'", self.bucket))
    }

    pub fn synchronise_config(&self) -> Result<SynchroniseConfig> {
        let templates = LinkTemplates::for_nuxeo(&self.nuxeo.api, &self.media_json_bucket)
            .context("Invalid Nuxeo settings")?;
        let config = SynchroniseConfig {
            bucket: self.bucket_location()?,
            output_dir: self.output_dir.clone(),
            nostash: self.nostash,
            templates,
        };
        info!(
            bucket = %config.bucket,
            output_dir = %config.output_dir.display(),
            nostash = config.nostash,
            "Config loaded and merged successfully"
        );
        Ok(config)
    }
}
