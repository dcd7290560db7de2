//! Configuration files and environment overrides feeding the engine

use std::collections::HashMap;

use ddms_meta::catalog::TITLE;
use ddms_meta::config::{Config, ConfigManager, EnvProvider};
use ddms_meta::engine::Ddms;
use ddms_meta::error::ConfigError;
use ddms_meta::vocabulary::file_name;
use tempfile::TempDir;

use crate::common::mocks::vocabulary_document;

/// A title whose owner/producer token is in no vocabulary
const UNKNOWN_OWNER_TITLE_XML: &str = r#"<ddms:title xmlns:ddms="urn:us:mil:ces:metadata:ddms:5" xmlns:ISM="urn:us:gov:ic:ism" ISM:classification="U" ISM:ownerProducer="ZZZ">Title</ddms:title>"#;

#[derive(Default)]
struct MapEnv(HashMap<String, String>);

impl MapEnv {
    fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }
}

impl EnvProvider for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

fn load(dir: &TempDir, name: &str, content: &str) -> Result<Config, ConfigError> {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    let file_config = tokio_test::block_on(ConfigManager::load_from_file(&path))?;
    let config = ConfigManager::merge_configs(Config::default(), file_config);
    ConfigManager::validate_config(&config)?;
    Ok(config)
}

#[test]
fn test_vocabulary_misses_as_warnings_from_file() {
    let temp_dir = TempDir::new().unwrap();

    let strict = Ddms::new().unwrap();
    let error = strict.read(UNKNOWN_OWNER_TITLE_XML, &TITLE).unwrap_err();
    assert!(error.is_validation());

    let config = load(
        &temp_dir,
        "ddms-meta.toml",
        "[vocabulary]\nvalidation_as_errors = false\n",
    )
    .unwrap();
    let lenient = Ddms::from_config(&config).unwrap();
    let title = lenient.read(UNKNOWN_OWNER_TITLE_XML, &TITLE).unwrap();
    assert!(!title.warnings().is_empty());
    assert!(title.warnings().iter().all(|warning| warning.severity.is_warning()));
}

#[test]
fn test_vocabulary_directory_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let tables = temp_dir.path().join("tables");
    std::fs::create_dir_all(tables.join("ism/v9")).unwrap();
    std::fs::write(
        tables.join("ism/v9").join(file_name("OwnerProducer")),
        vocabulary_document("OwnerProducer", &["XYZ"], &[]),
    )
    .unwrap();

    let config = load(
        &temp_dir,
        "ddms-meta.toml",
        &format!("[vocabulary]\ndirectory = '{}'\n", tables.display()),
    )
    .unwrap();
    let engine = Ddms::from_config(&config).unwrap();
    let v5 = engine.registry().resolve("5.0").unwrap();

    assert!(engine.vocabulary().check("OwnerProducer", "XYZ", &v5).unwrap());
    assert!(!engine.vocabulary().check("OwnerProducer", "USA", &v5).unwrap());
}

#[test]
fn test_output_settings_from_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = load(
        &temp_dir,
        "ddms-meta.json",
        r#"{"output": {"json_pretty_print": true, "index_level": 2}}"#,
    )
    .unwrap();

    let engine = Ddms::from_config(&config).unwrap();
    assert!(engine.output_config().json_pretty_print);
    assert_eq!(engine.renderer().options().index_level, 2);
}

#[test]
fn test_bad_alias_in_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let result = load(
        &temp_dir,
        "ddms-meta.toml",
        "[registry.aliases]\n\"6\" = \"6.0\"\n",
    );
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn test_environment_sets_ambient_version() {
    let env = MapEnv::default().with("DDMS_DEFAULT_VERSION", "3.1");
    let config = ConfigManager::apply_environment_overrides_with(&env, Config::default()).unwrap();
    ConfigManager::validate_config(&config).unwrap();

    let engine = Ddms::from_config(&config).unwrap();
    assert_eq!(engine.registry().current().token(), "3.1");
    assert_eq!(engine.current_session().version().token(), "3.1");
}

#[test]
fn test_environment_prefix_reaches_markup() {
    let env = MapEnv::default().with("DDMS_PREFIX", "d");
    let config = ConfigManager::apply_environment_overrides_with(&env, Config::default()).unwrap();

    let engine = Ddms::from_config(&config).unwrap();
    let keyword = engine
        .session("5.0")
        .unwrap()
        .build(
            &ddms_meta::catalog::KEYWORD,
            ddms_meta::component::RawFields::new().text("value", "x"),
        )
        .unwrap();
    assert_eq!(keyword.qualified_name(), "d:keyword");
    assert!(keyword.to_xml().starts_with("<d:keyword xmlns:d="));
}

#[test]
fn test_environment_rejects_bad_values() {
    let env = MapEnv::default().with("DDMS_CVE_AS_ERRORS", "sometimes");
    assert!(matches!(
        ConfigManager::apply_environment_overrides_with(&env, Config::default()),
        Err(ConfigError::Environment(_))
    ));
}

#[test]
fn test_unsupported_default_version() {
    let env = MapEnv::default().with("DDMS_DEFAULT_VERSION", "1.0");
    let config = ConfigManager::apply_environment_overrides_with(&env, Config::default()).unwrap();
    assert!(ConfigManager::validate_config(&config).is_err());
    assert!(Ddms::from_config(&config).is_err());
}
