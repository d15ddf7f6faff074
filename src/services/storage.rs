// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! S3 storage for export files.

use crate::config::ObjectStoreConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};

/// Object storage the warehouse can bulk-load from.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object.
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<()>;

    /// Fully-qualified URI of `key`, as the warehouse expects it.
    fn uri(&self, key: &str) -> String;
}

/// `s3://{bucket}/{key}`
pub fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}

/// S3 client bound to a single bucket.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(config: &ObjectStoreConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "strava-elt",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::debug!(bucket = %config.bucket, "S3 client initialized");

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("text/csv")
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| PipelineError::Storage(format!("Failed to upload {}: {}", key, e)))?;

        tracing::info!(bucket = %self.bucket, key, size, "Export file uploaded to S3");
        Ok(())
    }

    fn uri(&self, key: &str) -> String {
        s3_uri(&self.bucket, key)
    }
}
