//! Configuration for harbor-migrate
//!
//! Settings come from an optional TOML file (see
//! [`harbor_common::config::resolve_config_path`]) with CLI and environment
//! overrides for host and port applied by the binary. Every setting has a
//! built-in default, so running without a file is supported.

use harbor_common::config::{load_toml_config, resolve_config_path, LoggingConfig};
use harbor_common::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "HARBOR_CONFIG";
/// Config file name under `<config_dir>/harbor/`
pub const CONFIG_FILE_NAME: &str = "migrate.toml";

/// Upper bound on concurrent image downloads
pub const MAX_IMAGE_CONCURRENCY: usize = 16;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigratorConfig {
    pub host: String,
    pub port: u16,
    /// Scraping service endpoint (POST `{url}`)
    pub scraper_url: String,
    /// Image storage endpoint (POST image bytes)
    pub storage_url: String,
    /// Wall-clock ceiling of one migration
    pub deadline_secs: u64,
    /// Extra yacht model records (TOML)
    pub knowledge_base_path: Option<PathBuf>,
    pub images: ImageConfig,
    pub logging: LoggingConfig,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
            scraper_url: "http://localhost:5000/webhook/v2/extract".to_string(),
            storage_url: "http://localhost:5001/images".to_string(),
            deadline_secs: 120,
            knowledge_base_path: None,
            images: ImageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MigratorConfig {
    /// Resolve and load the config file, falling back to defaults
    ///
    /// # Errors
    /// `Config` when a config file exists but is malformed.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        load_toml_config(path.as_deref())
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs.max(1))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Image migration limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Parallel downloads (clamped to 1..=16)
    pub concurrency: usize,
    /// Per-image timeout covering download and upload
    pub timeout_secs: u64,
    /// Maximum accepted image size
    pub max_bytes: usize,
    /// Images beyond this many are skipped
    pub max_images: usize,
    /// Accepted MIME types
    pub allowed_types: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            concurrency: 6,
            timeout_secs: 15,
            max_bytes: 10 * 1024 * 1024,
            max_images: 30,
            allowed_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
                "image/gif".to_string(),
            ],
        }
    }
}

impl ImageConfig {
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_IMAGE_CONCURRENCY)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// True when `mime` (parameters ignored) is on the allow-list
    pub fn allows(&self, mime: &str) -> bool {
        let essence = mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase();
        self.allowed_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&essence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MigratorConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:5780");
        assert_eq!(config.deadline(), Duration::from_secs(120));
        assert_eq!(config.images.effective_concurrency(), 6);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: MigratorConfig =
            toml::from_str("port = 6100\n[images]\nconcurrency = 64\n").unwrap();
        assert_eq!(config.port, 6100);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.images.effective_concurrency(), MAX_IMAGE_CONCURRENCY);
        assert_eq!(config.images.max_images, 30);
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let images = ImageConfig {
            concurrency: 0,
            ..ImageConfig::default()
        };
        assert_eq!(images.effective_concurrency(), 1);
    }

    #[test]
    fn test_allow_list_ignores_parameters_and_case() {
        let images = ImageConfig::default();
        assert!(images.allows("image/JPEG; charset=binary"));
        assert!(!images.allows("text/html"));
    }
}
