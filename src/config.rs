use crate::cli::Cli;
use crate::error::{ConfigError, ConfigResult as Result};
use crate::version::Subsystem;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Main library configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub prefixes: PrefixConfig,
    pub vocabulary: VocabularyConfig,
    pub output: OutputConfig,
}

/// Supported versions, aliases and the default (ambient) version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Version used for raw-data construction until changed
    pub default_version: String,
    /// Syntactic duplicates mapped to their canonical token
    pub aliases: BTreeMap<String, String>,
    /// Versions in registration order
    pub versions: Vec<VersionEntry>,
}

/// One row of the version table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionEntry {
    pub token: String,
    pub namespace: String,
    pub schema: String,
    /// Base location of the vocabulary tables for this version
    pub vocabulary: String,
    #[serde(default)]
    pub auxiliary: BTreeMap<Subsystem, String>,
}

/// Namespace prefixes used when assembling markup and naming output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrefixConfig {
    pub ddms: String,
    pub ism: String,
    pub gml: String,
    pub xlink: String,
    pub ntk: String,
    pub tspi: String,
    pub virt: String,
}

/// Controlled vocabulary configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VocabularyConfig {
    /// On-disk tables replacing the embedded ones
    pub directory: Option<PathBuf>,
    /// Vocabulary misses on security markings are errors (true) or warnings
    pub validation_as_errors: bool,
    /// Number of parsed tables the cache is presized for
    pub cache_capacity: u64,
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub json_pretty_print: bool,
    /// Merge security attributes into the component object
    pub json_inline_attributes: bool,
    /// 0 never indexes repeated fields, 1 only when a field repeats, 2 always
    pub index_level: u8,
}

const ISM_V2: &str = "urn:us:gov:ic:ism:v2";
const ISM: &str = "urn:us:gov:ic:ism";
const GML: &str = "http://www.opengis.net/gml";
const GML_32: &str = "http://www.opengis.net/gml/3.2";
const XLINK: &str = "http://www.w3.org/1999/xlink";
const NTK: &str = "urn:us:gov:ic:ntk";
const TSPI: &str = "http://metadata.ces.mil/mdr/ns/GSIP/tspi/2.0";
const VIRT: &str = "urn:us:gov:ic:virt";

impl VersionEntry {
    fn builtin(
        token: &str,
        namespace: &str,
        vocabulary: &str,
        auxiliary: &[(Subsystem, &str)],
    ) -> Self {
        Self {
            token: token.to_string(),
            namespace: namespace.to_string(),
            schema: format!("/schemas/{}/DDMS/ddms.xsd", token),
            vocabulary: vocabulary.to_string(),
            auxiliary: auxiliary
                .iter()
                .map(|(subsystem, uri)| (*subsystem, uri.to_string()))
                .collect(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        use Subsystem::*;

        let versions = vec![
            VersionEntry::builtin(
                "2.0",
                "http://metadata.dod.mil/mdr/ns/DDMS/2.0/",
                "ism/v2",
                &[(Classification, ISM_V2), (Geography, GML), (Linking, XLINK)],
            ),
            VersionEntry::builtin(
                "3.0",
                "http://metadata.dod.mil/mdr/ns/DDMS/3.0/",
                "ism/v5",
                &[(Classification, ISM), (Geography, GML), (Linking, XLINK)],
            ),
            VersionEntry::builtin(
                "3.1",
                "http://metadata.dod.mil/mdr/ns/DDMS/3.1/",
                "ism/v5",
                &[(Classification, ISM), (Geography, GML_32), (Linking, XLINK)],
            ),
            VersionEntry::builtin(
                "4.0.1",
                "urn:us:mil:ces:metadata:ddms:4",
                "ism/v9",
                &[
                    (Classification, ISM),
                    (Geography, GML_32),
                    (Linking, XLINK),
                    (Access, NTK),
                ],
            ),
            VersionEntry::builtin(
                "4.1",
                "urn:us:mil:ces:metadata:ddms:4",
                "ism/v9",
                &[
                    (Classification, ISM),
                    (Geography, GML_32),
                    (Linking, XLINK),
                    (Access, NTK),
                ],
            ),
            VersionEntry::builtin(
                "5.0",
                "urn:us:mil:ces:metadata:ddms:5",
                "ism/v9",
                &[
                    (Classification, ISM),
                    (Geography, GML_32),
                    (Linking, XLINK),
                    (Access, NTK),
                    (Tasking, TSPI),
                    (Virtual, VIRT),
                ],
            ),
        ];

        let aliases = [("3.0.1", "3.0"), ("4.0", "4.0.1")]
            .iter()
            .map(|(alias, target)| (alias.to_string(), target.to_string()))
            .collect();

        Self {
            default_version: "5.0".to_string(),
            aliases,
            versions,
        }
    }
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self {
            ddms: "ddms".to_string(),
            ism: "ISM".to_string(),
            gml: "gml".to_string(),
            xlink: "xlink".to_string(),
            ntk: "ntk".to_string(),
            tspi: "tspi".to_string(),
            virt: "virt".to_string(),
        }
    }
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            directory: None,
            validation_as_errors: true,
            cache_capacity: 256,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_pretty_print: false,
            json_inline_attributes: false,
            index_level: 0,
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        // Start with default configuration
        let mut config = Config::default();

        // Load from configuration file if specified
        if let Some(config_path) = &cli.config {
            let file_config = Self::load_from_file(config_path).await?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = Self::merge_configs(config, found_config);
        }

        // Apply environment variable overrides
        config = Self::apply_environment_overrides(config)?;

        // Apply CLI argument overrides (highest precedence)
        config = Self::merge_with_cli(config, cli);

        // Validate the final configuration
        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;
        debug!(path = %path.display(), "Loading configuration file");

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                let config: Config = toml::from_str(&content)?;
                Ok(config)
            }
            Some("json") => {
                let config: Config = serde_json::from_str(&content)?;
                Ok(config)
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    let config: Config = serde_json::from_str(&content)?;
                    Ok(config)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "ddms-meta.toml",
            "ddms-meta.json",
            ".ddms-meta.toml",
            ".ddms-meta.json",
        ];

        // Check current directory first
        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("ddms-meta");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        } else {
            warn!("No user configuration directory available");
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        // Registry settings
        if let Some(version) = env.get("DDMS_DEFAULT_VERSION") {
            config.registry.default_version = version.trim().to_string();
        }

        // Vocabulary settings
        if let Some(directory) = env.get("DDMS_VOCABULARY_DIR") {
            config.vocabulary.directory = Some(PathBuf::from(directory));
        }

        if let Some(as_errors) = env.get("DDMS_CVE_AS_ERRORS") {
            config.vocabulary.validation_as_errors = as_errors.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid DDMS_CVE_AS_ERRORS value: {}", as_errors))
            })?;
        }

        // Output settings
        if let Some(pretty) = env.get("DDMS_JSON_PRETTY") {
            config.output.json_pretty_print = pretty.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid DDMS_JSON_PRETTY value: {}", pretty))
            })?;
        }

        if let Some(inline) = env.get("DDMS_JSON_INLINE") {
            config.output.json_inline_attributes = inline.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid DDMS_JSON_INLINE value: {}", inline))
            })?;
        }

        if let Some(index_level) = env.get("DDMS_INDEX_LEVEL") {
            config.output.index_level = index_level.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid DDMS_INDEX_LEVEL value: {}", index_level))
            })?;
        }

        // Prefix settings
        if let Some(prefix) = env.get("DDMS_PREFIX") {
            config.prefixes.ddms = prefix.trim().to_string();
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        // Vocabulary settings
        if let Some(directory) = &cli.vocabulary_dir {
            config.vocabulary.directory = Some(directory.clone());
        }
        if cli.cve_warnings {
            config.vocabulary.validation_as_errors = false;
        }

        // Output settings
        if cli.pretty {
            config.output.json_pretty_print = true;
        }
        if cli.inline_attributes {
            config.output.json_inline_attributes = true;
        }
        if let Some(index_level) = cli.index_level {
            config.output.index_level = index_level;
        }

        config
    }

    /// Merge two configurations (second takes precedence)
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        // Registry settings
        base.registry.default_version = override_config.registry.default_version;
        if !override_config.registry.versions.is_empty() {
            base.registry.versions = override_config.registry.versions;
        }
        base.registry.aliases.extend(override_config.registry.aliases);

        // Prefix settings
        base.prefixes = override_config.prefixes;

        // Vocabulary settings
        if override_config.vocabulary.directory.is_some() {
            base.vocabulary.directory = override_config.vocabulary.directory;
        }
        base.vocabulary.validation_as_errors = override_config.vocabulary.validation_as_errors;
        base.vocabulary.cache_capacity = override_config.vocabulary.cache_capacity;

        // Output settings
        base.output = override_config.output;

        base
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        let registry = &config.registry;

        // Validate the version table
        if registry.versions.is_empty() {
            return Err(ConfigError::Validation(
                "At least one DDMS version must be configured".to_string(),
            ));
        }

        let mut tokens = HashSet::new();
        for entry in &registry.versions {
            if !tokens.insert(entry.token.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate DDMS version: {}",
                    entry.token
                )));
            }
            if entry.namespace.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "DDMS version {} has no namespace",
                    entry.token
                )));
            }
        }

        // Validate aliases
        for (alias, target) in &registry.aliases {
            if tokens.contains(alias.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Alias {} shadows a registered version",
                    alias
                )));
            }
            if !tokens.contains(target.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Alias {} points to unregistered version {}",
                    alias, target
                )));
            }
        }

        // Validate the default version
        let default_token = registry
            .aliases
            .get(&registry.default_version)
            .unwrap_or(&registry.default_version);
        if !tokens.contains(default_token.as_str()) {
            return Err(ConfigError::UnsupportedVersion {
                token: registry.default_version.clone(),
            });
        }

        // Validate prefixes
        let prefixes = &config.prefixes;
        for (name, prefix) in [
            ("ddms", &prefixes.ddms),
            ("ism", &prefixes.ism),
            ("gml", &prefixes.gml),
            ("xlink", &prefixes.xlink),
            ("ntk", &prefixes.ntk),
            ("tspi", &prefixes.tspi),
            ("virt", &prefixes.virt),
        ] {
            if !is_valid_prefix(prefix) {
                return Err(ConfigError::Validation(format!(
                    "Invalid {} prefix: '{}'",
                    name, prefix
                )));
            }
        }

        // Validate vocabulary settings
        if config.vocabulary.cache_capacity == 0 {
            return Err(ConfigError::Validation(
                "Vocabulary cache capacity must be greater than 0".to_string(),
            ));
        }

        // Validate output settings
        if config.output.index_level > 2 {
            return Err(ConfigError::Validation(
                "Index level must be 0, 1 or 2".to_string(),
            ));
        }

        Ok(())
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => chars
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'),
        _ => false,
    }
}
