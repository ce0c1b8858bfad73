//! Shared test fixtures: in-process fakes for the scraping service and image
//! storage, plus an orchestrator wired to them.

#![allow(dead_code)]

use async_trait::async_trait;
use harbor_migrate::config::MigratorConfig;
use harbor_migrate::images::ImageStorage;
use harbor_migrate::knowledge_base::StaticKnowledgeBase;
use harbor_migrate::services::ScrapingService;
use harbor_migrate::types::{FetchError, ImageError, SourceContent};
use harbor_migrate::MigrationOrchestrator;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Smallest byte sequence `infer` recognizes as PNG
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

/// Canned scraper responses keyed by listing URL
///
/// Unknown URLs answer `Unreachable`.
#[derive(Default)]
pub struct FakeScraper {
    responses: HashMap<String, Result<SourceContent, FetchError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structured(mut self, url: &str, value: Value) -> Self {
        self.responses
            .insert(url.to_string(), Ok(SourceContent::Structured(value)));
        self
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.responses
            .insert(url.to_string(), Ok(SourceContent::Page(html.to_string())));
        self
    }

    pub fn failing(mut self, url: &str, error: FetchError) -> Self {
        self.responses.insert(url.to_string(), Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScrapingService for FakeScraper {
    async fn fetch(&self, url: &str) -> Result<SourceContent, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Unreachable(format!("no route to {}", url))))
    }
}

/// In-memory image storage handing out sequential CDN URLs
#[derive(Default)]
pub struct FakeStorage {
    uploads: Mutex<Vec<(usize, String)>>,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// (byte count, content type) per upload
    pub fn uploads(&self) -> Vec<(usize, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStorage for FakeStorage {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, ImageError> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((bytes.len(), content_type.to_string()));
        Ok(format!("https://cdn.harbor.test/images/{}.png", uploads.len()))
    }
}

/// Orchestrator over the fakes with the built-in model knowledge base
pub fn orchestrator(scraper: FakeScraper, storage: Arc<FakeStorage>) -> MigrationOrchestrator {
    orchestrator_with_config(scraper, storage, &MigratorConfig::default())
}

pub fn orchestrator_with_config(
    scraper: FakeScraper,
    storage: Arc<FakeStorage>,
    config: &MigratorConfig,
) -> MigrationOrchestrator {
    MigrationOrchestrator::new(
        Arc::new(scraper),
        storage,
        Arc::new(StaticKnowledgeBase::builtin()),
        reqwest::Client::new(),
        config,
    )
}
