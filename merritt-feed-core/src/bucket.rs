//! Bucket paths of the form `bucket/prefix/...`, as feeds are configured.

use std::fmt;

use crate::error::{FeedError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketLocation {
    pub bucket: String,
    /// Key prefix without leading or trailing slash. May be empty.
    pub prefix: String,
}

impl BucketLocation {
    pub fn parse(path: &str) -> Result<BucketLocation> {
        let trimmed = path.trim_matches('/');
        let (bucket, prefix) = trimmed.split_once('/').unwrap_or((trimmed, ""));
        if bucket.is_empty() {
            return Err(FeedError::Config(format!("invalid bucket path '{path}'")));
        }
        Ok(BucketLocation {
            bucket: bucket.to_string(),
            prefix: prefix.trim_matches('/').to_string(),
        })
    }

    pub fn key_for(&self, filename: &str) -> String {
        if self.prefix.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{filename}", self.prefix)
        }
    }

    /// Listing prefix that matches every key under this location.
    pub fn list_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        }
    }

    pub fn public_url(&self, filename: &str) -> String {
        format!("https://s3.amazonaws.com/{self}/{filename}")
    }
}

impl fmt::Display for BucketLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.bucket)
        } else {
            write!(f, "{}/{}", self.bucket, self.prefix)
        }
    }
}
