use async_trait::async_trait;
use chrono::{DateTime, Utc};
use object_store::{path::Path as ObjectPath, signer::Signer};
use std::{sync::Arc, time::Duration};
use thiserror::Error;

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        value_objects::ObjectKey,
    },
    ports::storage::UploadSigner,
};

/// Presigned `PUT` URLs from any object_store backend that can sign (S3, GCS, Azure)
#[derive(Debug, Clone)]
pub struct ObjectStoreUploadSigner {
    signer: Arc<dyn Signer>,
}

impl ObjectStoreUploadSigner {
    pub fn new(signer: Arc<dyn Signer>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl UploadSigner for ObjectStoreUploadSigner {
    async fn presign_put(&self, key: &ObjectKey, expires_in: Duration) -> StorageResult<String> {
        let path = ObjectPath::from(key.as_str());
        let url = self
            .signer
            .signed_url(http::Method::PUT, &path, expires_in)
            .await
            .map_err(StorageError::from)?;
        Ok(url.to_string())
    }

    fn accepts_unsigned_headers(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Upload URL expired")]
    Expired,
    #[error("Upload signature does not match")]
    Mismatch,
}

/// Signs upload URLs served by this application's own `PUT /uploads/{*key}` route.
/// Used with the in-memory backend, which has no native signing.
#[derive(Debug, Clone)]
pub struct LocalUploadSigner {
    base_url: String,
    secret: String,
}

impl LocalUploadSigner {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }

    fn signature(&self, key: &str, expires: i64) -> String {
        format!(
            "{:x}",
            md5::compute(format!("{}:{}:{}", self.secret, key, expires))
        )
    }

    /// URL for `key`, valid until `expires` (unix seconds)
    pub fn url_for(&self, key: &ObjectKey, expires: i64) -> String {
        format!(
            "{}/uploads/{}?expires={}&signature={}",
            self.base_url,
            key,
            expires,
            self.signature(key.as_str(), expires)
        )
    }

    pub fn verify(
        &self,
        key: &ObjectKey,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let expected = self.signature(key.as_str(), expires);
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(SignatureError::Mismatch);
        }
        if now.timestamp() > expires {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }
}

/// Equality whose running time depends only on the lengths
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[async_trait]
impl UploadSigner for LocalUploadSigner {
    async fn presign_put(&self, key: &ObjectKey, expires_in: Duration) -> StorageResult<String> {
        let ttl = chrono::Duration::from_std(expires_in).map_err(|e| {
            StorageError::ValidationError {
                message: format!("Invalid upload URL lifetime: {}", e),
            }
        })?;
        let expires = (Utc::now() + ttl).timestamp();
        Ok(self.url_for(key, expires))
    }
}
