//! S3-backed [`ObjectStore`] for published feeds.
//!
//! Credentials and region come from the standard AWS provider chain
//! (environment, shared config files, instance profile).

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use merritt_feed_core::contract::{BoxError, ObjectStore};

pub struct S3Store {
    client: Client,
    bucket: String,
}

fn sdk_error<E>(operation: &str, key: &str, e: E) -> BoxError
where
    E: std::error::Error,
{
    let message = format!("S3 {operation} '{key}' failed: {}", DisplayErrorContext(&e));
    tracing::error!(operation, key, error = %message, "S3 request failed");
    message.into()
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        S3Store {
            client,
            bucket: bucket.into(),
        }
    }

    /// Client configured from the environment, bound to `bucket`.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        let bucket = bucket.into();
        tracing::info!(bucket = %bucket, "Initialized S3 client from environment");
        S3Store::new(Client::new(&config), bucket)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str) -> Result<Vec<u8>, BoxError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error("get", key, e))?;
        let body = object
            .body
            .collect()
            .await
            .map_err(|e| sdk_error("read", key, e))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), BoxError> {
        tracing::info!(bucket = %self.bucket, key, bytes = body.len(), "Uploading object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| sdk_error("put", key, e))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, BoxError> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| sdk_error("list", prefix, e))?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(str::to_string),
            );

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        tracing::debug!(bucket = %self.bucket, prefix, keys = keys.len(), "Listed objects");
        Ok(keys)
    }
}
