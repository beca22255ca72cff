//! S3-based image storage and scoped credential issuance
mod error;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{presigning::PresigningConfig, Client as S3Client};
use chrono::Utc;

pub use error::{ObjectStoreError, ObjectStoreResult};

/// Default file extension when the client supplies none or an unusable one
const DEFAULT_EXTENSION: &str = "jpg";

/// Issues time-limited, single-verb URLs scoped to exactly one storage key
///
/// A URL confers the one verb it was minted for and nothing else; it stops
/// working once its TTL elapses. Presigning failures are reported to the
/// caller without retry.
#[async_trait]
pub trait ScopedUrls: Send + Sync {
    /// Presigned GET URL for `key`, valid for `ttl_secs`
    async fn read_url(&self, key: &str, ttl_secs: u64) -> ObjectStoreResult<String>;

    /// Presigned PUT URL for `key` with the declared content type, valid for `ttl_secs`
    async fn write_url(
        &self,
        key: &str,
        content_type: &str,
        ttl_secs: u64,
    ) -> ObjectStoreResult<String>;
}

/// Image storage client for S3 operations
pub struct ImageStore {
    s3_client: Arc<S3Client>,
    bucket_name: String,
}

impl ImageStore {
    /// Creates a new image store client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket name for image storage
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String) -> Self {
        Self {
            s3_client,
            bucket_name,
        }
    }

    fn presigning_config(ttl_secs: u64) -> ObjectStoreResult<PresigningConfig> {
        PresigningConfig::expires_in(Duration::from_secs(ttl_secs)).map_err(|e| {
            ObjectStoreError::Presign(format!("Failed to create presigning config: {e}"))
        })
    }

    fn require_key(key: &str) -> ObjectStoreResult<()> {
        if key.is_empty() {
            return Err(ObjectStoreError::InvalidKey(
                "storage key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ScopedUrls for ImageStore {
    async fn read_url(&self, key: &str, ttl_secs: u64) -> ObjectStoreResult<String> {
        Self::require_key(key)?;

        let presigned = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(Self::presigning_config(ttl_secs)?)
            .await
            .map_err(|e| ObjectStoreError::Presign(format!("Failed to presign GET: {e}")))?;

        Ok(presigned.uri().to_string())
    }

    async fn write_url(
        &self,
        key: &str,
        content_type: &str,
        ttl_secs: u64,
    ) -> ObjectStoreResult<String> {
        Self::require_key(key)?;

        let presigned = self
            .s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(Self::presigning_config(ttl_secs)?)
            .await
            .map_err(|e| ObjectStoreError::Presign(format!("Failed to presign PUT: {e}")))?;

        Ok(presigned.uri().to_string())
    }
}

/// Derives a fresh upload key namespaced by the owning subject
///
/// Keys follow `users/<subject_id>/image-<epoch-ms>.<extension>`. The history
/// and recognition flows rely on this prefix to tie a key to its owner, so
/// the namespace is fixed at creation time.
#[must_use]
pub fn derive_image_key(subject_id: &str, requested_extension: Option<&str>) -> String {
    let extension = sanitize_extension(requested_extension);
    let timestamp = Utc::now().timestamp_millis();

    format!("users/{subject_id}/image-{timestamp}.{extension}")
}

/// Normalizes a client-supplied file extension
///
/// Strips a leading dot and falls back to `jpg` when the value is missing,
/// empty, or contains anything the `image/<extension>` content type could not
/// carry.
#[must_use]
pub fn sanitize_extension(requested: Option<&str>) -> String {
    let Some(raw) = requested else {
        return DEFAULT_EXTENSION.to_string();
    };

    let stripped = raw.strip_prefix('.').unwrap_or(raw);

    if stripped.is_empty() || !stripped.chars().all(|c| c.is_ascii_alphanumeric()) {
        return DEFAULT_EXTENSION.to_string();
    }

    stripped.to_ascii_lowercase()
}
