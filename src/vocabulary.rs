//! Controlled vocabularies
//!
//! Token tables are parsed once per (location, key) and shared read-only
//! afterwards. Membership checks the literal tokens first and only falls back
//! to the regular-expression entries on a miss.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use regex::Regex;
use tracing::debug;

use crate::config::VocabularyConfig;
use crate::error::{ConfigError, ConfigResult, DdmsError, UsageError, UsageResult, ValidationFailure};
use crate::version::VersionDescriptor;

/// Counters used to observe how membership checks were answered
#[derive(Debug, Default)]
pub struct MatchStats {
    literal_hits: AtomicU64,
    pattern_evaluations: AtomicU64,
}

impl MatchStats {
    pub fn literal_hits(&self) -> u64 {
        self.literal_hits.load(Ordering::Relaxed)
    }

    pub fn pattern_evaluations(&self) -> u64 {
        self.pattern_evaluations.load(Ordering::Relaxed)
    }
}

/// The tokens and patterns of one vocabulary key in one version
#[derive(Debug)]
pub struct VocabularyTable {
    key: String,
    tokens: Vec<String>,
    token_set: HashSet<String>,
    patterns: Vec<Regex>,
    stats: MatchStats,
}

impl VocabularyTable {
    pub fn new(
        key: impl Into<String>,
        tokens: impl IntoIterator<Item = impl Into<String>>,
        patterns: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> ConfigResult<Self> {
        let key = key.into();
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let token_set = tokens.iter().cloned().collect();
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                    ConfigError::VocabularyMalformed {
                        key: key.clone(),
                        details: format!("invalid pattern '{}': {}", pattern, e),
                    }
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Self {
            key,
            tokens,
            token_set,
            patterns,
            stats: MatchStats::default(),
        })
    }

    /// Parse a table document: `Term` entries holding a `Value`, which is a
    /// pattern when its `regularExpression` attribute is true.
    pub fn parse(key: &str, xml: &str) -> ConfigResult<Self> {
        let malformed = |details: String| ConfigError::VocabularyMalformed {
            key: key.to_string(),
            details,
        };

        let document = roxmltree::Document::parse(xml).map_err(|e| malformed(e.to_string()))?;

        let mut tokens = Vec::new();
        let mut patterns = Vec::new();
        for term in document
            .descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == "Term")
        {
            let value = term
                .children()
                .find(|node| node.is_element() && node.tag_name().name() == "Value")
                .ok_or_else(|| malformed("Term without a Value".to_string()))?;
            let text = value.text().unwrap_or_default().trim();
            if text.is_empty() {
                return Err(malformed("empty Value".to_string()));
            }
            match value.attribute("regularExpression") {
                Some("true") => patterns.push(text.to_string()),
                _ => tokens.push(text.to_string()),
            }
        }

        if tokens.is_empty() && patterns.is_empty() {
            return Err(malformed("no Term entries".to_string()));
        }

        Self::new(key, tokens, patterns)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Literal tokens in document order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn stats(&self) -> &MatchStats {
        &self.stats
    }

    pub fn contains(&self, value: &str) -> bool {
        if self.token_set.contains(value) {
            self.stats.literal_hits.fetch_add(1, Ordering::Relaxed);
            return true;
        }
        self.patterns.iter().any(|pattern| {
            self.stats.pattern_evaluations.fetch_add(1, Ordering::Relaxed);
            pattern.is_match(value)
        })
    }
}

/// Where vocabulary documents come from
#[cfg_attr(test, mockall::automock)]
pub trait VocabularySource: Send + Sync {
    /// Read the document for `key` under a version's vocabulary location
    fn read(&self, location: &str, key: &str) -> ConfigResult<String>;
}

/// File name of the document holding a vocabulary key
pub fn file_name(key: &str) -> String {
    format!("CVEnumISM{}.xml", key)
}

macro_rules! embedded_tables {
    ($($path:literal),* $(,)?) => {
        &[$(($path, include_str!(concat!("../resources/", $path)))),*]
    };
}

static EMBEDDED: &[(&str, &str)] = embedded_tables![
    "ism/v2/CVEnumISMClassificationAll.xml",
    "ism/v2/CVEnumISMDeclassExemption.xml",
    "ism/v2/CVEnumISMDissem.xml",
    "ism/v2/CVEnumISMExemptedSource.xml",
    "ism/v2/CVEnumISMFGIsourceOpen.xml",
    "ism/v2/CVEnumISMFGIsourceProtected.xml",
    "ism/v2/CVEnumISMNonIC.xml",
    "ism/v2/CVEnumISMOwnerProducer.xml",
    "ism/v2/CVEnumISMRelTo.xml",
    "ism/v2/CVEnumISMSARIdentifier.xml",
    "ism/v2/CVEnumISMSCIcontrols.xml",
    "ism/v5/CVEnumISMAtomicEnergyMarkings.xml",
    "ism/v5/CVEnumISMClassificationAll.xml",
    "ism/v5/CVEnumISMCompliesWith.xml",
    "ism/v5/CVEnumISMDeclassExemption.xml",
    "ism/v5/CVEnumISMDissem.xml",
    "ism/v5/CVEnumISMExemptedSource.xml",
    "ism/v5/CVEnumISMFGIsourceOpen.xml",
    "ism/v5/CVEnumISMFGIsourceProtected.xml",
    "ism/v5/CVEnumISMNonIC.xml",
    "ism/v5/CVEnumISMNonUSControls.xml",
    "ism/v5/CVEnumISMOwnerProducer.xml",
    "ism/v5/CVEnumISMRelTo.xml",
    "ism/v5/CVEnumISMSARIdentifier.xml",
    "ism/v5/CVEnumISMSCIcontrols.xml",
    "ism/v9/CVEnumISMAtomicEnergyMarkings.xml",
    "ism/v9/CVEnumISMClassificationAll.xml",
    "ism/v9/CVEnumISMCompliesWith.xml",
    "ism/v9/CVEnumISMDeclassExemption.xml",
    "ism/v9/CVEnumISMDissem.xml",
    "ism/v9/CVEnumISMFGIsourceOpen.xml",
    "ism/v9/CVEnumISMFGIsourceProtected.xml",
    "ism/v9/CVEnumISMNonIC.xml",
    "ism/v9/CVEnumISMNonUSControls.xml",
    "ism/v9/CVEnumISMOwnerProducer.xml",
    "ism/v9/CVEnumISMRelTo.xml",
    "ism/v9/CVEnumISMSARIdentifier.xml",
    "ism/v9/CVEnumISMSCIcontrols.xml",
];

/// Tables compiled into the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedSource;

impl VocabularySource for EmbeddedSource {
    fn read(&self, location: &str, key: &str) -> ConfigResult<String> {
        let path = format!("{}/{}", location.trim_matches('/'), file_name(key));
        EMBEDDED
            .iter()
            .find(|(name, _)| *name == path)
            .map(|(_, content)| content.to_string())
            .ok_or_else(|| ConfigError::VocabularyNotFound {
                key: key.to_string(),
                location: location.to_string(),
            })
    }
}

/// Tables read from a directory laid out like the embedded resources
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl VocabularySource for DirectorySource {
    fn read(&self, location: &str, key: &str) -> ConfigResult<String> {
        let path = self
            .root
            .join(location.trim_matches('/'))
            .join(file_name(key));
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::VocabularyNotFound {
                key: key.to_string(),
                location: path.display().to_string(),
            },
            _ => ConfigError::Io(e),
        })
    }
}

/// Two disjoint classification hierarchies plus tokens whose relative order
/// is undefined. Review tokens may hold a place in the secondary hierarchy
/// but never get an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationOrdering {
    primary: Vec<String>,
    secondary: Vec<String>,
    review: HashSet<String>,
}

impl ClassificationOrdering {
    pub fn new(
        primary: impl IntoIterator<Item = impl Into<String>>,
        secondary: impl IntoIterator<Item = impl Into<String>>,
        review: impl IntoIterator<Item = impl Into<String>>,
    ) -> UsageResult<Self> {
        let primary: Vec<String> = primary.into_iter().map(Into::into).collect();
        let secondary: Vec<String> = secondary.into_iter().map(Into::into).collect();
        let review_list: Vec<String> = review.into_iter().map(Into::into).collect();

        let overlap = |token: &String| UsageError::OverlappingOrdering {
            token: token.clone(),
        };

        let mut ordered = HashSet::new();
        if let Some(token) = primary
            .iter()
            .chain(&secondary)
            .find(|token| !ordered.insert(token.as_str()))
        {
            return Err(overlap(token));
        }

        let mut review = HashSet::new();
        if let Some(token) = review_list
            .iter()
            .find(|token| primary.contains(token) || !review.insert(token.to_string()))
        {
            return Err(overlap(token));
        }

        Ok(Self {
            primary,
            secondary,
            review,
        })
    }

    /// Position in the primary list, else in the secondary list, else -1.
    /// Review tokens are always -1.
    pub fn index(&self, token: &str) -> i32 {
        if let Some(position) = self.primary.iter().position(|t| t == token) {
            return position as i32;
        }
        if self.review.contains(token) {
            return -1;
        }
        self.secondary
            .iter()
            .position(|t| t == token)
            .map_or(-1, |position| position as i32)
    }

    pub fn needs_review(&self, token: &str) -> UsageResult<bool> {
        if token.trim().is_empty() {
            return Err(UsageError::BlankArgument {
                name: "classification token".to_string(),
            });
        }
        Ok(self.review.contains(token))
    }

    pub fn primary(&self) -> &[String] {
        &self.primary
    }

    pub fn secondary(&self) -> &[String] {
        &self.secondary
    }
}

impl Default for ClassificationOrdering {
    fn default() -> Self {
        Self {
            primary: ["U", "C", "S", "TS"].map(String::from).to_vec(),
            secondary: [
                "NU", "R", "NR", "NC", "NCA", "NS", "NSAT", "CTS", "CTS-B", "CTS-BALK", "CTSA",
            ]
            .map(String::from)
            .to_vec(),
            review: ["CTS-B", "CTS-BALK", "R"].map(String::from).into_iter().collect(),
        }
    }
}

type TableKey = (String, String);

/// Lazily populated cache of vocabulary tables
pub struct ControlledVocabulary {
    source: Arc<dyn VocabularySource>,
    tables: Cache<TableKey, Arc<VocabularyTable>>,
    ordering: ClassificationOrdering,
}

impl std::fmt::Debug for ControlledVocabulary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlledVocabulary")
            .field("tables", &self.tables.entry_count())
            .field("ordering", &self.ordering)
            .finish()
    }
}

impl ControlledVocabulary {
    pub fn new(source: Arc<dyn VocabularySource>) -> Self {
        Self::with_capacity(source, VocabularyConfig::default().cache_capacity)
    }

    /// `capacity` only presizes the cache. Loaded tables are never evicted,
    /// so a table is read from its source at most once.
    pub fn with_capacity(source: Arc<dyn VocabularySource>, capacity: u64) -> Self {
        Self {
            source,
            tables: Cache::builder()
                .initial_capacity(usize::try_from(capacity).unwrap_or(usize::MAX))
                .build(),
            ordering: ClassificationOrdering::default(),
        }
    }

    /// Vocabulary over the embedded tables
    pub fn embedded() -> Self {
        Self::new(Arc::new(EmbeddedSource))
    }

    pub fn from_config(config: &VocabularyConfig) -> Self {
        let source: Arc<dyn VocabularySource> = match &config.directory {
            Some(directory) => Arc::new(DirectorySource::new(directory)),
            None => Arc::new(EmbeddedSource),
        };
        Self::with_capacity(source, config.cache_capacity)
    }

    pub fn with_ordering(mut self, ordering: ClassificationOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn ordering(&self) -> &ClassificationOrdering {
        &self.ordering
    }

    /// Parse the table for `key` in `version` unless it is already cached.
    /// Concurrent first loads of the same table are coalesced into one parse.
    pub fn load(&self, key: &str, version: &VersionDescriptor) -> ConfigResult<Arc<VocabularyTable>> {
        let location = version.vocabulary_location();
        let cache_key = (location.to_string(), key.to_string());

        self.tables
            .try_get_with(cache_key, || -> ConfigResult<Arc<VocabularyTable>> {
                let content = self.source.read(location, key)?;
                let table = VocabularyTable::parse(key, &content)?;
                debug!(
                    key,
                    location,
                    tokens = table.tokens().len(),
                    patterns = table.pattern_count(),
                    "Loaded controlled vocabulary"
                );
                Ok(Arc::new(table))
            })
            .map_err(unshare)
    }

    /// The already loaded table, or a usage error if it never was
    pub fn table(&self, key: &str, version: &VersionDescriptor) -> UsageResult<Arc<VocabularyTable>> {
        self.tables
            .get(&(version.vocabulary_location().to_string(), key.to_string()))
            .ok_or_else(|| UsageError::UnknownVocabulary {
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &str, value: &str, version: &VersionDescriptor) -> UsageResult<bool> {
        Ok(self.table(key, version)?.contains(value))
    }

    /// Like [`contains`](Self::contains), but a miss is a validation failure
    pub fn validate(&self, key: &str, value: &str, version: &VersionDescriptor) -> Result<(), DdmsError> {
        if self.contains(key, value, version)? {
            Ok(())
        } else {
            Err(ValidationFailure::new(invalid_token_message(key, value)).into())
        }
    }

    /// Loads the table if needed, then checks membership
    pub fn check(&self, key: &str, value: &str, version: &VersionDescriptor) -> ConfigResult<bool> {
        Ok(self.load(key, version)?.contains(value))
    }

    pub fn classification_index(&self, token: &str) -> i32 {
        self.ordering.index(token)
    }

    pub fn needs_review(&self, token: &str) -> UsageResult<bool> {
        self.ordering.needs_review(token)
    }
}

pub fn invalid_token_message(key: &str, value: &str) -> String {
    format!(
        "{} is not a valid enumeration token for this attribute, as specified in {}.",
        value, key
    )
}

/// Recover an owned error from the cache's shared one
fn unshare(error: Arc<ConfigError>) -> ConfigError {
    Arc::try_unwrap(error).unwrap_or_else(|shared| match shared.as_ref() {
        ConfigError::VocabularyNotFound { key, location } => ConfigError::VocabularyNotFound {
            key: key.clone(),
            location: location.clone(),
        },
        ConfigError::VocabularyMalformed { key, details } => ConfigError::VocabularyMalformed {
            key: key.clone(),
            details: details.clone(),
        },
        ConfigError::Io(e) => ConfigError::Io(std::io::Error::new(e.kind(), e.to_string())),
        other => ConfigError::Validation(other.to_string()),
    })
}
