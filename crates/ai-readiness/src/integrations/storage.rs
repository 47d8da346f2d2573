use std::fmt;

use reqwest::Url;

use super::{ensure_success, http_client};
use crate::assessment::gateways::{CollaboratorError, ObjectStorage};
use crate::config::StorageConfig;

const UPLOAD_BASE_URL: &str = "https://storage.googleapis.com/upload/storage/v1";
const PUBLIC_BASE_URL: &str = "https://storage.googleapis.com";

/// Cloud Storage bucket written through the JSON API media upload.
#[derive(Clone)]
pub struct CloudStorageBucket {
    config: StorageConfig,
    upload_base_url: String,
}

impl fmt::Debug for CloudStorageBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudStorageBucket")
            .field("bucket", &self.config.bucket)
            .field("upload_base_url", &self.upload_base_url)
            .finish()
    }
}

impl CloudStorageBucket {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            upload_base_url: UPLOAD_BASE_URL.to_string(),
        }
    }

    pub fn with_upload_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.upload_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    fn upload_url(&self, key: &str) -> Result<Url, CollaboratorError> {
        Url::parse_with_params(
            &format!("{}/b/{}/o", self.upload_base_url, self.config.bucket),
            &[("uploadType", "media"), ("name", key)],
        )
        .map_err(|err| CollaboratorError::InvalidResponse(format!("invalid upload url: {err}")))
    }
}

/// Public object URL, matching the layout the bucket serves objects under.
pub fn public_url(bucket: &str, key: &str) -> String {
    format!("{PUBLIC_BASE_URL}/{bucket}/{key}")
}

impl ObjectStorage for CloudStorageBucket {
    fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, CollaboratorError> {
        let response = http_client()?
            .post(self.upload_url(key)?)
            .bearer_auth(&self.config.access_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()?;
        ensure_success(response)?;
        Ok(public_url(&self.config.bucket, key))
    }
}
