//! Uploads archives to S3.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use derive_more::{Display, Error};
use object_store::aws::AmazonS3Builder;
use object_store::buffered::BufWriter;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tokio::io::AsyncWriteExt;

use crate::config::StorageConfig;

/// 10 MiB, well above the 5 MiB minimum part size of S3.
pub const DEFAULT_PART_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Display, Error)]
/// Errors of the [Uploader].
pub enum UploadError {
    /// The S3 client can't be built from the config.
    #[display("Creating the S3 client failed: {_0}")]
    Session(object_store::Error),
    /// The local archive can't be opened.
    #[display("Opening {} failed: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    /// Reading the archive or writing the object failed.
    #[display("Uploading to {key} failed: {source}")]
    Transfer { key: String, source: io::Error },
}

/// Puts local files into one bucket.
#[derive(Debug, Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    part_size: usize,
}

impl Uploader {
    /// Wraps an already configured store.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            part_size: DEFAULT_PART_SIZE,
        }
    }

    /// Size of a single part of a multipart upload.
    ///
    /// Smaller files are sent with one request.
    pub fn with_part_size(mut self, part_size: usize) -> Self {
        self.part_size = part_size;
        self
    }

    /// S3 client authenticated with the static credentials of `config`.
    pub fn from_config(config: &StorageConfig) -> Result<Self, UploadError> {
        let mut builder = AmazonS3Builder::new()
            .with_access_key_id(&config.access_key)
            .with_secret_access_key(&config.access_secret)
            .with_region(&config.region)
            .with_bucket_name(&config.bucket);

        if let Some(endpoint) = &config.endpoint {
            log::debug!(target: "upload", "Using S3 endpoint {endpoint}");
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder.build().map_err(UploadError::Session)?;
        Ok(Self::new(Arc::new(store), &config.bucket))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Streams the file at `archive` to `key` and returns the uploaded size.
    ///
    /// Files larger than the part size are sent as multipart upload. It is
    /// aborted when the transfer fails before the whole file was handed over.
    pub async fn upload(&self, archive: &Path, key: &str) -> Result<u64, UploadError> {
        let mut file = tokio::fs::File::open(archive)
            .await
            .map_err(|source| UploadError::Open {
                path: archive.to_path_buf(),
                source,
            })?;

        log::debug!(target: "upload", "Uploading {} to {}/{key}", archive.display(), self.bucket);

        let transfer_err = |source| UploadError::Transfer {
            key: key.to_string(),
            source,
        };
        let mut writer = BufWriter::with_capacity(
            Arc::clone(&self.store),
            ObjectPath::from(key),
            self.part_size,
        );

        let size = match tokio::io::copy(&mut file, &mut writer).await {
            Ok(size) => size,
            Err(source) => {
                // parts already sent must not linger in the bucket
                if let Err(e) = writer.abort().await {
                    log::warn!(target: "upload", "Aborting the upload of {key} failed: {e}");
                }
                return Err(transfer_err(source));
            }
        };
        // a writer can't be aborted once shutdown started
        writer.shutdown().await.map_err(transfer_err)?;

        Ok(size)
    }
}
