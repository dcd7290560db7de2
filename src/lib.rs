//! # ddms-meta Library
//!
//! Versioned DDMS metadata components: read them from markup or build them
//! from raw values, validate them against the rules of their schema version,
//! and render them as markup, text, HTML meta tags or JSON.
//!
//! Element types are data, not code: each one is a
//! [`ComponentSchema`](schema::ComponentSchema) in [`catalog`], interpreted by
//! the generic [`Component`](component::Component).

pub mod builder;
pub mod catalog;
pub mod cli;
pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod extensible;
pub mod file_discovery;
pub mod output;
pub mod processor;
pub mod render;
pub mod schema;
pub mod security;
pub mod validator;
pub mod version;
pub mod vocabulary;
pub mod xml;

pub use builder::ComponentBuilder;
pub use cli::{Cli, VerbosityLevel};
pub use component::{Component, RawFields, Slot};
pub use config::{Config, ConfigManager, OutputConfig};
pub use engine::{Ddms, Session, ValidationSettings};
pub use error::{ConfigError, DdmsError, UsageError, ValidationFailure};
pub use extensible::{ExtensibleAttributes, ExtensibleAttributesBuilder};
pub use file_discovery::{DiscoveryStats, FileDiscovery};
pub use output::Output;
pub use processor::{DocumentProcessor, DocumentReport, DocumentStatus, ProcessingResults};
pub use render::{OutputFormat, Renderer};
pub use schema::ComponentSchema;
pub use security::{SecurityAttributes, SecurityAttributesBuilder};
pub use validator::{Severity, ValidationMessage};
pub use version::{VersionDescriptor, VersionRegistry};
pub use vocabulary::{ClassificationOrdering, ControlledVocabulary, VocabularySource};
pub use xml::{Attribute, Element};
