//! Pipeline services and HTTP collaborators
//!
//! - Scraping service client (listing URL → raw content)
//! - Image storage client (image bytes → hosted URL)
//! - Migration orchestrator (drives one migration end to end)

pub mod image_storage;
pub mod migration_orchestrator;
pub mod scraper_client;

pub use image_storage::HttpImageStorage;
pub use migration_orchestrator::MigrationOrchestrator;
pub use scraper_client::{HttpScrapingService, ScrapingService};
