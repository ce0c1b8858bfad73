//! Image Migration Pipeline
//!
//! Downloads listing images with a bounded worker pool and hands each one to
//! the image storage collaborator for re-hosting. Every image gets a single
//! attempt under its own timeout; a failure drops that image and is counted,
//! never failing the migration. Hosted URLs keep the original order.
//!
//! Cancelling the token (orchestrator deadline) stops in-flight and queued
//! downloads; images not finished by then are counted as skipped.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{header, Client, Url};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ImageConfig;
use crate::types::ImageError;

/// Image storage collaborator: re-host bytes, return the hosted URL
#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, ImageError>;
}

/// Counts and hosted URLs produced by one pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagePipelineReport {
    /// Hosted URLs of migrated images, in source order
    pub images: Vec<String>,
    /// Distinct image references found in the listing
    pub found: usize,
    pub migrated: usize,
    pub failed: usize,
    /// Over the `max_images` limit or cut off by cancellation
    pub skipped: usize,
    /// `"<url>: <reason>"` per failed image
    pub failures: Vec<String>,
}

#[derive(Clone)]
pub struct ImagePipeline {
    client: Client,
    storage: Arc<dyn ImageStorage>,
    config: ImageConfig,
}

impl ImagePipeline {
    pub fn new(client: Client, storage: Arc<dyn ImageStorage>, config: ImageConfig) -> Self {
        Self {
            client,
            storage,
            config,
        }
    }

    /// Migrate the listing's images
    ///
    /// # Arguments
    /// * `references` - Image URLs as found in the listing (may be relative)
    /// * `listing_url` - Base for resolving relative references
    /// * `cancel` - Stops outstanding work when cancelled
    pub async fn run(
        &self,
        references: &[String],
        listing_url: &str,
        cancel: &CancellationToken,
    ) -> ImagePipelineReport {
        let mut report = ImagePipelineReport::default();

        let (targets, invalid) = resolve_references(references, listing_url);
        report.found = targets.len() + invalid.len();
        for reference in invalid {
            report.failures.push(format!(
                "{}: {}",
                reference,
                ImageError::InvalidUrl(reference.clone())
            ));
            report.failed += 1;
        }

        let limit = self.config.max_images;
        if targets.len() > limit {
            report.skipped += targets.len() - limit;
        }
        let targets: Vec<Url> = targets.into_iter().take(limit).collect();
        if targets.is_empty() {
            return report;
        }

        let concurrency = self.config.effective_concurrency();
        info!(
            images = targets.len(),
            concurrency, "Migrating listing images"
        );

        let mut results: Vec<(usize, Url, Result<String, ImageError>)> =
            stream::iter(targets.into_iter().enumerate())
                .map(|(index, url)| {
                    let cancel = cancel.clone();
                    async move {
                        let result = self.migrate_one(&url, &cancel).await;
                        (index, url, result)
                    }
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

        results.sort_by_key(|(index, _, _)| *index);

        for (_, url, result) in results {
            match result {
                Ok(hosted) => {
                    report.images.push(hosted);
                    report.migrated += 1;
                }
                Err(ImageError::Cancelled) => report.skipped += 1,
                Err(e) => {
                    warn!(url = %url, error = %e, "Image dropped");
                    report.failures.push(format!("{}: {}", url, e));
                    report.failed += 1;
                }
            }
        }

        info!(
            migrated = report.migrated,
            failed = report.failed,
            skipped = report.skipped,
            "Image migration finished"
        );
        report
    }

    /// One attempt: download, check, upload
    async fn migrate_one(&self, url: &Url, cancel: &CancellationToken) -> Result<String, ImageError> {
        if cancel.is_cancelled() {
            return Err(ImageError::Cancelled);
        }

        let timeout = self.config.timeout();
        tokio::select! {
            _ = cancel.cancelled() => Err(ImageError::Cancelled),
            result = tokio::time::timeout(timeout, self.download_and_store(url)) => {
                result.unwrap_or(Err(ImageError::Timeout(timeout.as_secs())))
            }
        }
    }

    async fn download_and_store(&self, url: &Url) -> Result<String, ImageError> {
        let (bytes, content_type) = self.download(url).await?;
        let hosted = self.storage.upload(bytes, &content_type).await?;
        debug!(url = %url, hosted = %hosted, "Image re-hosted");
        Ok(hosted)
    }

    /// Fetch an image, enforcing the size cap while streaming
    ///
    /// Returns the bytes and the sniffed MIME type.
    async fn download(&self, url: &Url) -> Result<(Vec<u8>, String), ImageError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status(status.as_u16()));
        }

        if let Some(declared) = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !self.config.allows(declared) {
                return Err(ImageError::ContentType(declared.to_string()));
            }
        }

        let limit = self.config.max_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(ImageError::TooLarge { limit });
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImageError::Fetch(e.to_string()))?
        {
            if bytes.len() + chunk.len() > limit {
                return Err(ImageError::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        // The declared type is not trusted; the bytes must be an allowed image
        let sniffed = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");
        if !self.config.allows(sniffed) {
            return Err(ImageError::ContentType(sniffed.to_string()));
        }

        Ok((bytes, sniffed.to_string()))
    }
}

/// Resolve references against the listing URL, dropping duplicates
///
/// Returns the resolvable http(s) URLs in order, plus references that could
/// not be resolved.
pub fn resolve_references(references: &[String], listing_url: &str) -> (Vec<Url>, Vec<String>) {
    let base = Url::parse(listing_url).ok();
    let mut resolved: Vec<Url> = Vec::new();
    let mut invalid: Vec<String> = Vec::new();

    for reference in references {
        let reference = reference.trim();
        if reference.is_empty() {
            continue;
        }
        // Protocol-relative and relative references need the listing as base
        let parsed = match &base {
            Some(base) => base.join(reference),
            None => Url::parse(reference),
        };
        match parsed {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                if !resolved.contains(&url) {
                    resolved.push(url);
                }
            }
            _ => {
                if !invalid.iter().any(|r| r == reference) {
                    invalid.push(reference.to_string());
                }
            }
        }
    }

    (resolved, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_relative_references_resolved() {
        let (urls, invalid) = resolve_references(
            &refs(&["/img/1.jpg", "2.jpg", "//cdn.example.com/3.jpg", "https://other.org/4.png"]),
            "https://www.devalk.nl/en/yacht/123",
        );
        let urls: Vec<String> = urls.iter().map(Url::to_string).collect();
        assert_eq!(
            urls,
            [
                "https://www.devalk.nl/img/1.jpg",
                "https://www.devalk.nl/en/yacht/2.jpg",
                "https://cdn.example.com/3.jpg",
                "https://other.org/4.png",
            ]
        );
        assert!(invalid.is_empty());
    }

    #[test]
    fn test_duplicates_removed_in_order() {
        let (urls, _) = resolve_references(
            &refs(&["https://a.org/1.jpg", "/1.jpg", "https://a.org/2.jpg", "https://a.org/1.jpg"]),
            "https://a.org/listing",
        );
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "https://a.org/1.jpg");
    }

    #[test]
    fn test_non_http_references_invalid() {
        let (urls, invalid) = resolve_references(
            &refs(&["mailto:broker@example.com", "ftp://a.org/x.jpg", " "]),
            "https://a.org/listing",
        );
        assert!(urls.is_empty());
        assert_eq!(invalid.len(), 2);
    }
}
