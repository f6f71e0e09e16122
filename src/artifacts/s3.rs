//! S3 object store
//!
//! Uploads artifacts with a single signed `PUT` under
//! `generated-images/<name>` and returns either a CDN URL or the bucket's
//! default public URL.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use super::sigv4::{amz_date, encode_path, sha256_hex, Signer};
use super::{
    validate_name, ArtifactReference, ArtifactStore, StoreError, ARTIFACT_CONTENT_TYPE,
    ARTIFACT_PREFIX,
};
use crate::config::S3Config;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct S3Store {
    config: S3Config,
    client: Client,
}

impl S3Store {
    /// Create the store; fails fast when the bucket or credentials are missing
    pub fn new(config: &S3Config) -> Result<Self, StoreError> {
        if config.bucket.trim().is_empty() {
            return Err(StoreError::Configuration(
                "S3 bucket name is required for the s3 storage backend".to_string(),
            ));
        }
        if config.access_key_id.is_empty() || config.secret_access_key.is_empty() {
            return Err(StoreError::Configuration(
                "S3 access key id and secret access key are required".to_string(),
            ));
        }

        let client = Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        info!(
            "S3 artifact store for bucket {} in {}",
            config.bucket, config.region
        );
        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    /// Object key for an artifact name
    pub fn object_key(file_name: &str) -> String {
        format!("{}/{}", ARTIFACT_PREFIX, file_name)
    }

    /// Where the object is uploaded
    pub fn upload_url(&self, key: &str) -> Result<Url, StoreError> {
        let raw = match &self.config.endpoint {
            Some(endpoint) => format!(
                "{}{}",
                endpoint.trim_end_matches('/'),
                encode_path(&format!("/{}/{}", self.config.bucket, key))
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com{}",
                self.config.bucket,
                self.config.region,
                encode_path(&format!("/{}", key))
            ),
        };
        Url::parse(&raw)
            .map_err(|e| StoreError::Configuration(format!("invalid upload URL {}: {}", raw, e)))
    }

    /// Public URL handed back to callers
    pub fn public_url(&self, key: &str) -> String {
        match self.config.cdn_domain.as_deref().filter(|d| !d.is_empty()) {
            Some(cdn) => format!("https://{}/{}", cdn.trim_end_matches('/'), key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.config.bucket, key),
        }
    }

    fn signer(&self) -> Signer<'_> {
        Signer {
            access_key_id: &self.config.access_key_id,
            secret_access_key: &self.config.secret_access_key,
            region: &self.config.region,
            service: "s3",
        }
    }
}

#[async_trait]
impl ArtifactStore for S3Store {
    async fn persist(
        &self,
        local_file: &Path,
        file_name: &str,
    ) -> Result<ArtifactReference, StoreError> {
        validate_name(file_name)?;
        let body = tokio::fs::read(local_file).await?;
        let key = Self::object_key(file_name);
        let url = self.upload_url(&key)?;

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(StoreError::Configuration(format!(
                    "upload URL {} has no host",
                    url
                )))
            }
        };
        let now = chrono::Utc::now();
        let date = amz_date(now);
        let payload_hash = sha256_hex(&body);
        let authorization = self.signer().authorization(
            "PUT",
            url.path(),
            &[
                ("content-type", ARTIFACT_CONTENT_TYPE),
                ("host", &host),
                ("x-amz-content-sha256", &payload_hash),
                ("x-amz-date", &date),
            ],
            &payload_hash,
            now,
        );

        debug!("Uploading {} bytes to {}", body.len(), url);
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, ARTIFACT_CONTENT_TYPE)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &date)
            .header(AUTHORIZATION, authorization)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("S3 upload of {} failed: {} - {}", key, status, body);
            return Err(StoreError::Upload {
                status: status.as_u16(),
                body,
            });
        }

        Ok(ArtifactReference::new(self.public_url(&key)))
    }

    fn backend(&self) -> &'static str {
        "s3"
    }
}
