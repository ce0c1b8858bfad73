//! Image storage client
//!
//! Re-hosts downloaded images: POSTs the bytes to the storage service under
//! a content-addressed name (SHA-256 of the bytes) and returns the hosted URL
//! from the `{url}` response.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::images::ImageStorage;
use crate::types::ImageError;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

pub struct HttpImageStorage {
    http_client: Client,
    endpoint: String,
}

impl HttpImageStorage {
    pub fn new(http_client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }
}

/// `<sha256 hex>.<extension>` for the image bytes
pub fn hosted_name(bytes: &[u8], content_type: &str) -> String {
    let digest = Sha256::digest(bytes);
    let extension = match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    };
    format!("{:x}.{}", digest, extension)
}

#[async_trait]
impl ImageStorage for HttpImageStorage {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, ImageError> {
        let name = hosted_name(&bytes, content_type);
        let size = bytes.len();

        let response = self
            .http_client
            .post(&self.endpoint)
            .query(&[("name", name.as_str())])
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ImageError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Upload(format!("storage returned {}", status)));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| ImageError::Upload(e.to_string()))?;

        debug!(name = %name, bytes = size, url = %uploaded.url, "Image stored");
        Ok(uploaded.url)
    }
}
