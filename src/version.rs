//! DDMS version registry
//!
//! Every supported version is described by an immutable [`VersionDescriptor`]
//! built once from the registry configuration. Lookups go through the alias
//! table first, and reverse lookups by namespace prefer the most recently
//! registered version, since 4.0.1 and 4.1 share a namespace.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{PrefixConfig, RegistryConfig};
use crate::error::{ConfigError, ConfigResult};

/// Auxiliary namespaces a version may bind, keyed by what they are used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    /// Security markings (ISM)
    Classification,
    /// Geospatial coverage (GML)
    Geography,
    /// Links (XLink)
    Linking,
    /// Need-to-know access (NTK)
    Access,
    /// Tasking and point information (TSPI)
    Tasking,
    /// Virtual coverage
    Virtual,
}

impl Subsystem {
    pub fn prefix<'a>(&self, prefixes: &'a PrefixConfig) -> &'a str {
        match self {
            Subsystem::Classification => &prefixes.ism,
            Subsystem::Geography => &prefixes.gml,
            Subsystem::Linking => &prefixes.xlink,
            Subsystem::Access => &prefixes.ntk,
            Subsystem::Tasking => &prefixes.tspi,
            Subsystem::Virtual => &prefixes.virt,
        }
    }
}

/// A prefix and namespace URI pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceBinding {
    pub prefix: String,
    pub uri: String,
}

/// Immutable identity of one DDMS version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    token: String,
    segments: Vec<u32>,
    namespace: String,
    prefix: String,
    schema_location: String,
    vocabulary_location: String,
    auxiliary: BTreeMap<Subsystem, NamespaceBinding>,
}

impl VersionDescriptor {
    pub fn new(
        token: impl Into<String>,
        namespace: impl Into<String>,
        prefix: impl Into<String>,
        schema_location: impl Into<String>,
        vocabulary_location: impl Into<String>,
    ) -> Self {
        let token = token.into();
        Self {
            segments: parse_segments(&token),
            token,
            namespace: namespace.into(),
            prefix: prefix.into(),
            schema_location: schema_location.into(),
            vocabulary_location: vocabulary_location.into(),
            auxiliary: BTreeMap::new(),
        }
    }

    pub fn with_auxiliary(
        mut self,
        subsystem: Subsystem,
        prefix: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        self.auxiliary.insert(
            subsystem,
            NamespaceBinding {
                prefix: prefix.into(),
                uri: uri.into(),
            },
        );
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Prefix used for elements and attributes in the primary namespace
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn schema_location(&self) -> &str {
        &self.schema_location
    }

    pub fn vocabulary_location(&self) -> &str {
        &self.vocabulary_location
    }

    pub fn auxiliary(&self, subsystem: Subsystem) -> Option<&NamespaceBinding> {
        self.auxiliary.get(&subsystem)
    }

    pub fn namespace_for(&self, subsystem: Subsystem) -> Option<&str> {
        self.auxiliary(subsystem).map(|binding| binding.uri.as_str())
    }

    pub fn auxiliaries(&self) -> impl Iterator<Item = (Subsystem, &NamespaceBinding)> {
        self.auxiliary.iter().map(|(subsystem, binding)| (*subsystem, binding))
    }

    /// Segment-wise comparison, so "4.0.1" is at least "4.0" and below "4.1".
    pub fn is_at_least(&self, token: &str) -> bool {
        compare_segments(&self.segments, &parse_segments(token)) != Ordering::Less
    }

    /// True if this version sorts strictly before `token`.
    pub fn is_before(&self, token: &str) -> bool {
        !self.is_at_least(token)
    }
}

impl fmt::Display for VersionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DDMS {}", self.token)
    }
}

fn parse_segments(token: &str) -> Vec<u32> {
    token
        .split('.')
        .map(|segment| segment.parse().unwrap_or(0))
        .collect()
}

fn compare_segments(left: &[u32], right: &[u32]) -> Ordering {
    let len = left.len().max(right.len());
    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Lookup table of supported versions plus the ambient "current" version.
///
/// The ambient version is a convenience for single-threaded construction
/// sequences. Concurrent callers should pin a descriptor explicitly through a
/// [`Session`](crate::engine::Session) instead.
#[derive(Debug)]
pub struct VersionRegistry {
    versions: Vec<Arc<VersionDescriptor>>,
    aliases: HashMap<String, String>,
    default: Arc<VersionDescriptor>,
    current: RwLock<Arc<VersionDescriptor>>,
}

impl VersionRegistry {
    pub fn new(config: &RegistryConfig, prefixes: &PrefixConfig) -> ConfigResult<Self> {
        let versions: Vec<Arc<VersionDescriptor>> = config
            .versions
            .iter()
            .map(|entry| {
                let mut descriptor = VersionDescriptor::new(
                    entry.token.as_str(),
                    entry.namespace.as_str(),
                    prefixes.ddms.as_str(),
                    entry.schema.as_str(),
                    entry.vocabulary.as_str(),
                );
                for (subsystem, uri) in &entry.auxiliary {
                    descriptor =
                        descriptor.with_auxiliary(*subsystem, subsystem.prefix(prefixes), uri.as_str());
                }
                Arc::new(descriptor)
            })
            .collect();

        let aliases: HashMap<String, String> = config
            .aliases
            .iter()
            .map(|(alias, target)| (alias.clone(), target.clone()))
            .collect();

        let default_token = aliases
            .get(&config.default_version)
            .unwrap_or(&config.default_version);
        let default = versions
            .iter()
            .find(|descriptor| descriptor.token() == default_token)
            .cloned()
            .ok_or_else(|| ConfigError::UnsupportedVersion {
                token: config.default_version.clone(),
            })?;

        debug!(
            versions = versions.len(),
            aliases = aliases.len(),
            default = default.token(),
            "Version registry initialized"
        );

        Ok(Self {
            versions,
            aliases,
            current: RwLock::new(default.clone()),
            default,
        })
    }

    /// Registry over the built-in version table
    pub fn builtin() -> ConfigResult<Self> {
        Self::new(&RegistryConfig::default(), &PrefixConfig::default())
    }

    /// Resolves an alias to its canonical token. Unknown tokens pass through.
    pub fn canonical_token<'a>(&'a self, token: &'a str) -> &'a str {
        self.aliases
            .get(token)
            .map(String::as_str)
            .unwrap_or(token)
    }

    pub fn resolve(&self, token: &str) -> ConfigResult<Arc<VersionDescriptor>> {
        let canonical = self.canonical_token(token.trim());
        self.versions
            .iter()
            .find(|descriptor| descriptor.token() == canonical)
            .cloned()
            .ok_or_else(|| ConfigError::UnsupportedVersion {
                token: token.to_string(),
            })
    }

    /// The most recently registered version using this namespace
    pub fn resolve_for_namespace(&self, uri: &str) -> ConfigResult<Arc<VersionDescriptor>> {
        self.versions
            .iter()
            .rev()
            .find(|descriptor| descriptor.namespace() == uri)
            .cloned()
            .ok_or_else(|| ConfigError::UnsupportedNamespace {
                uri: uri.to_string(),
            })
    }

    pub fn is_supported(&self, token: &str) -> bool {
        self.resolve(token).is_ok()
    }

    /// Canonical tokens in registration order
    pub fn supported_versions(&self) -> Vec<&str> {
        self.versions.iter().map(|descriptor| descriptor.token()).collect()
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .map(|(alias, target)| (alias.as_str(), target.as_str()))
    }

    pub fn default_version(&self) -> Arc<VersionDescriptor> {
        self.default.clone()
    }

    /// The ambient version
    pub fn current(&self) -> Arc<VersionDescriptor> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the ambient version. The token is validated first, so a failed
    /// call leaves the current version untouched.
    pub fn set_current(&self, token: &str) -> ConfigResult<Arc<VersionDescriptor>> {
        let descriptor = self.resolve(token)?;
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = descriptor.clone();
        debug!(version = descriptor.token(), "Ambient DDMS version changed");
        Ok(descriptor)
    }

    /// Resets the ambient version to the configured default
    pub fn clear_current(&self) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = self.default.clone();
    }
}
