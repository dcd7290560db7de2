use std::path::PathBuf;

use thiserror::Error;

/// Main library error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum DdmsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Unknown component: {name}")]
    UnknownComponent { name: String },

    #[error("IO error: {path} - {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File discovery error: {0}")]
    Walk(#[from] ignore::Error),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl DdmsError {
    /// Prefixes the locator of a validation failure with `/qualified_name`.
    /// Other kinds carry no locator and pass through unchanged.
    pub fn within(self, qualified_name: &str) -> Self {
        match self {
            DdmsError::Validation(failure) => DdmsError::Validation(failure.within(qualified_name)),
            other => other,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DdmsError::Validation(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, DdmsError::Config(_))
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, DdmsError::Usage(_))
    }

    /// The locator of a validation failure, if this is one.
    pub fn locator(&self) -> Option<&str> {
        match self {
            DdmsError::Validation(failure) => Some(failure.locator()),
            _ => None,
        }
    }
}

/// Configuration and deployment errors. None of these depend on document data.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unsupported DDMS version: {token}")]
    UnsupportedVersion { token: String },

    #[error("No supported DDMS version uses the namespace {uri}")]
    UnsupportedNamespace { uri: String },

    #[error("Controlled vocabulary not found: {key} at {location}")]
    VocabularyNotFound { key: String, location: String },

    #[error("Malformed controlled vocabulary: {key} - {details}")]
    VocabularyMalformed { key: String, details: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

/// A structural validation error, located by a slash-delimited path of
/// qualified names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}{}", locator_suffix(.locator))]
pub struct ValidationFailure {
    message: String,
    locator: String,
}

fn locator_suffix(locator: &str) -> String {
    if locator.is_empty() {
        String::new()
    } else {
        format!(" (at {})", locator)
    }
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locator: String::new(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Prefixes the locator with `/qualified_name`.
    pub fn within(mut self, qualified_name: &str) -> Self {
        self.locator = format!("/{}{}", qualified_name, self.locator);
        self
    }
}

/// Misuse of the API, as opposed to bad document data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("No controlled vocabulary could be found for this key: {key}")]
    UnknownVocabulary { key: String },

    #[error("{name} must not be blank")]
    BlankArgument { name: String },

    #[error("The {component} component has no field named {field}")]
    UnknownField { component: String, field: String },

    #[error("The {field} field holds {expected} values")]
    FieldKind { field: String, expected: String },

    #[error("The token {token} appears in more than one classification ordering")]
    OverlappingOrdering { token: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DdmsError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Validation result type alias
pub type ValidationResult<T> = std::result::Result<T, ValidationFailure>;

/// Usage result type alias
pub type UsageResult<T> = std::result::Result<T, UsageError>;
