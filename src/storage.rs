//! Object storage staging for images awaiting inference.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, Url};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::credentials::{fetch_access_token, CredentialSource};
use crate::error::DocBrainError;

const UPLOAD_CONTENT_TYPE: &str = "image/png";

/// Pushes a byte buffer to object storage under a caller-chosen key.
#[async_trait]
pub trait StorageUploader: Send + Sync {
    /// Write `bytes` under `key` and return the canonical location of the
    /// uploaded object. Empty buffers are legal; no size validation happens
    /// here.
    async fn upload(&self, bytes: Bytes, key: &str) -> Result<String, DocBrainError>;
}

/// Google Cloud Storage uploader using the JSON API media upload.
///
/// Objects are written with an `authenticatedRead` ACL and an `image/png`
/// content type. The bearer token is resolved on first use and reused for
/// the lifetime of the uploader.
#[derive(Debug, Clone)]
pub struct GcsUploader {
    http: Client,
    endpoint: Url,
    bucket: String,
    source: CredentialSource,
    token: OnceCell<String>,
}

impl GcsUploader {
    pub fn new(
        http: Client,
        endpoint: &str,
        bucket: impl Into<String>,
        source: CredentialSource,
    ) -> Result<Self, DocBrainError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| DocBrainError::InvalidBaseUrl(endpoint.to_string()))?;
        Ok(Self {
            http,
            endpoint,
            bucket: bucket.into(),
            source,
            token: OnceCell::new(),
        })
    }

    async fn bearer_token(&self) -> Result<&str, DocBrainError> {
        let token = self
            .token
            .get_or_try_init(|| fetch_access_token(&self.source, &self.http))
            .await?;
        Ok(token.as_str())
    }

    fn upload_url(&self) -> Result<Url, DocBrainError> {
        let path = format!("upload/storage/v1/b/{}/o", self.bucket);
        self.endpoint
            .join(&path)
            .map_err(|source| DocBrainError::UrlJoin { path, source })
    }
}

#[async_trait]
impl StorageUploader for GcsUploader {
    async fn upload(&self, bytes: Bytes, key: &str) -> Result<String, DocBrainError> {
        let token = self.bearer_token().await?;
        let url = self.upload_url()?;
        let size = bytes.len();

        let response = self
            .http
            .post(url)
            .query(&[
                ("uploadType", "media"),
                ("name", key),
                ("predefinedAcl", "authenticatedRead"),
            ])
            .header(header::CONTENT_TYPE, UPLOAD_CONTENT_TYPE)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(bytes)
            .send()
            .await
            .map_err(|source| DocBrainError::Upload { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocBrainError::UploadStatus {
                status: status.as_u16(),
            });
        }

        debug!(bucket = %self.bucket, key, size, "image staged in object storage");
        Ok(format!("gs://{}/{}", self.bucket, key))
    }
}
