//! Configuration loading and config file resolution
//!
//! Config file location follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`<config_dir>/harbor/<file_name>`)
//! 4. No file: built-in defaults

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Logging configuration shared by all Harbor services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (e.g. "info", "harbor_migrate=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolve which TOML config file to read, if any
///
/// # Arguments
/// * `cli_arg` - Path given on the command line
/// * `env_var_name` - Environment variable holding a path
/// * `file_name` - File name looked up under the platform config directory
///
/// # Returns
/// The chosen path, or `None` when nothing was specified and no platform
/// default file exists.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    let default_path = dirs::config_dir().map(|d| d.join("harbor").join(file_name))?;
    if default_path.exists() {
        Some(default_path)
    } else {
        debug!("No config file at {}", default_path.display());
        None
    }
}

/// Load a TOML config file, falling back to defaults
///
/// A `None` path or a file that does not exist yields `T::default()`.
/// A file that exists but cannot be read or parsed is a `Config` error.
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        info!("No config file specified, using built-in defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        info!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::TempDir;

    #[derive(Debug, Default, Deserialize)]
    struct SampleConfig {
        #[serde(default)]
        port: u16,
        #[serde(default)]
        logging: LoggingConfig,
    }

    #[test]
    fn test_missing_path_uses_defaults() {
        let config: SampleConfig = load_toml_config(None).unwrap();
        assert_eq!(config.port, 0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_nonexistent_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let config: SampleConfig = load_toml_config(Some(&path)).unwrap();
        assert_eq!(config.port, 0);
    }

    #[test]
    fn test_parses_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("migrate.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "port = 6000\n[logging]\nlevel = \"debug\"").unwrap();

        let config: SampleConfig = load_toml_config(Some(&path)).unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "port = [not toml").unwrap();

        let result: Result<SampleConfig> = load_toml_config(Some(&path));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_logging_default_level() {
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    #[serial]
    fn test_cli_argument_wins_over_env() {
        std::env::set_var("HARBOR_TEST_CONFIG", "/tmp/from-env.toml");
        let resolved = resolve_config_path(
            Some(Path::new("/tmp/from-cli.toml")),
            "HARBOR_TEST_CONFIG",
            "migrate.toml",
        );
        std::env::remove_var("HARBOR_TEST_CONFIG");
        assert_eq!(resolved, Some(PathBuf::from("/tmp/from-cli.toml")));
    }

    #[test]
    #[serial]
    fn test_env_var_used_without_cli_argument() {
        std::env::set_var("HARBOR_TEST_CONFIG", "/tmp/from-env.toml");
        let resolved = resolve_config_path(None, "HARBOR_TEST_CONFIG", "migrate.toml");
        std::env::remove_var("HARBOR_TEST_CONFIG");
        assert_eq!(resolved, Some(PathBuf::from("/tmp/from-env.toml")));
    }
}
