//! Configuration file resolution and loading
//!
//! Tests touching HARBOR_CONFIG are marked #[serial] so they do not race on
//! the process environment.

use harbor_migrate::config::{MigratorConfig, CONFIG_ENV_VAR};
use harbor_migrate::knowledge_base::{ModelKnowledgeBase, StaticKnowledgeBase};
use serial_test::serial;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_cli_path_loaded() {
    let file = config_file(
        r#"
port = 6200
scraper_url = "http://scraper.internal/extract"
deadline_secs = 30

[images]
concurrency = 4
max_images = 12

[logging]
level = "debug"
"#,
    );

    let config = MigratorConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.port, 6200);
    assert_eq!(config.scraper_url, "http://scraper.internal/extract");
    assert_eq!(config.deadline(), Duration::from_secs(30));
    assert_eq!(config.images.effective_concurrency(), 4);
    assert_eq!(config.images.max_images, 12);
    assert_eq!(config.logging.level, "debug");
    // Unset keys keep their defaults
    assert_eq!(config.host, "127.0.0.1");
}

#[test]
#[serial]
fn test_env_var_path_used() {
    let file = config_file("port = 6300\n");
    std::env::set_var(CONFIG_ENV_VAR, file.path());

    let config = MigratorConfig::load(None);
    std::env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.unwrap().port, 6300);
}

#[test]
#[serial]
fn test_cli_path_wins_over_env_var() {
    let from_env = config_file("port = 6400\n");
    let from_cli = config_file("port = 6500\n");
    std::env::set_var(CONFIG_ENV_VAR, from_env.path());

    let config = MigratorConfig::load(Some(from_cli.path()));
    std::env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.unwrap().port, 6500);
}

#[test]
#[serial]
fn test_malformed_file_is_config_error() {
    let file = config_file("port = \"not a number\"\n");
    let result = MigratorConfig::load(Some(file.path()));
    assert!(matches!(result, Err(harbor_common::Error::Config(_))));
}

#[test]
fn test_knowledge_base_file_extends_builtin() {
    let file = config_file(
        r#"
[[model]]
model = "Dufour 412 Grand Large"
make = "Dufour"
boat_type = "Sailing"
length_ft = 41.5
first_built = 2015
"#,
    );

    let kb = StaticKnowledgeBase::load(Some(file.path())).unwrap();
    assert_eq!(kb.len(), StaticKnowledgeBase::builtin().len() + 1);

    let spec = kb.lookup("dufour 412 grand large").unwrap();
    assert_eq!(spec.length_ft, Some(41.5));
    assert!(kb.lookup("Najad 460").is_some());
}
