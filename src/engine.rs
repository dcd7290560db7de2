//! The engine and its version-pinned sessions
//!
//! [`Ddms`] owns the shared state: the version registry, the vocabulary
//! cache and the validation settings. Construction never reads the ambient
//! version implicitly; a [`Session`] carries the version explicitly, and the
//! ambient one is only consulted through [`Ddms::current_session`].

use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::builder::ComponentBuilder;
use crate::catalog;
use crate::component::{Component, RawFields};
use crate::config::{Config, OutputConfig};
use crate::error::{ConfigResult, DdmsError, Result};
use crate::render::Renderer;
use crate::schema::ComponentSchema;
use crate::version::{VersionDescriptor, VersionRegistry};
use crate::vocabulary::ControlledVocabulary;
use crate::xml::Element;

static GLOBAL: OnceLock<Ddms> = OnceLock::new();

/// Settings consulted while validating components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSettings {
    /// Vocabulary misses on security markings fail construction when set,
    /// and become warnings otherwise
    pub vocabulary_as_errors: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            vocabulary_as_errors: true,
        }
    }
}

#[derive(Debug)]
pub struct Ddms {
    registry: VersionRegistry,
    vocabulary: ControlledVocabulary,
    settings: ValidationSettings,
    output: OutputConfig,
}

impl Ddms {
    /// An engine over the built-in version table and embedded vocabularies
    pub fn new() -> ConfigResult<Self> {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let registry = VersionRegistry::new(&config.registry, &config.prefixes)?;
        let vocabulary = ControlledVocabulary::from_config(&config.vocabulary);
        info!(
            versions = ?registry.supported_versions(),
            aliases = ?registry.aliases().collect::<Vec<_>>(),
            default = registry.default_version().token(),
            vocabulary_dir = ?config.vocabulary.directory,
            "DDMS engine initialized"
        );
        Ok(Self {
            registry,
            vocabulary,
            settings: ValidationSettings {
                vocabulary_as_errors: config.vocabulary.validation_as_errors,
            },
            output: config.output.clone(),
        })
    }

    /// Replaces the vocabulary, e.g. with one over a test source
    pub fn with_vocabulary(mut self, vocabulary: ControlledVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_settings(mut self, settings: ValidationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The process-wide engine with the default configuration
    pub fn global() -> ConfigResult<&'static Ddms> {
        if let Some(engine) = GLOBAL.get() {
            return Ok(engine);
        }
        let engine = Ddms::new()?;
        Ok(GLOBAL.get_or_init(|| engine))
    }

    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    pub fn vocabulary(&self) -> &ControlledVocabulary {
        &self.vocabulary
    }

    pub fn settings(&self) -> ValidationSettings {
        self.settings
    }

    pub fn output_config(&self) -> &OutputConfig {
        &self.output
    }

    pub fn renderer(&self) -> Renderer {
        Renderer::new(self.output.clone())
    }

    /// A session pinned to `token`
    pub fn session(&self, token: &str) -> ConfigResult<Session<'_>> {
        Ok(self.session_for(self.registry.resolve(token)?))
    }

    pub fn session_for(&self, version: Arc<VersionDescriptor>) -> Session<'_> {
        Session {
            engine: self,
            version,
        }
    }

    /// A session pinned to whatever the ambient version is right now. Later
    /// ambient changes do not affect the returned session.
    pub fn current_session(&self) -> Session<'_> {
        self.session_for(self.registry.current())
    }

    pub fn set_current_version(&self, token: &str) -> ConfigResult<Arc<VersionDescriptor>> {
        self.registry.set_current(token)
    }

    /// Parses `xml` and reads its root as a `schema` component
    pub fn read(&self, xml: &str, schema: &'static ComponentSchema) -> Result<Component> {
        let element = Element::parse(xml)?;
        self.read_element(&element, schema)
    }

    pub fn read_element(&self, element: &Element, schema: &'static ComponentSchema) -> Result<Component> {
        Component::from_element(self, schema, element)
    }

    /// Parses `xml` and reads its root with whichever descriptor answers to
    /// the root's local name
    pub fn read_any(&self, xml: &str) -> Result<Component> {
        let element = Element::parse(xml)?;
        let schema = catalog::find(&element.local_name).ok_or_else(|| DdmsError::UnknownComponent {
            name: element.qualified_name(),
        })?;
        debug!(element = %element.qualified_name(), schema = schema.id, "Reading component");
        self.read_element(&element, schema)
    }
}

/// An engine paired with one pinned version
#[derive(Debug, Clone)]
pub struct Session<'a> {
    engine: &'a Ddms,
    version: Arc<VersionDescriptor>,
}

impl<'a> Session<'a> {
    pub fn engine(&self) -> &'a Ddms {
        self.engine
    }

    pub fn version(&self) -> &Arc<VersionDescriptor> {
        &self.version
    }

    pub fn vocabulary(&self) -> &'a ControlledVocabulary {
        &self.engine.vocabulary
    }

    pub fn settings(&self) -> ValidationSettings {
        self.engine.settings
    }

    /// Builds a component from raw values in this session's version
    pub fn build(&self, schema: &'static ComponentSchema, raw: RawFields) -> Result<Component> {
        Component::from_raw(self, schema, raw)
    }

    pub fn read(&self, element: &Element, schema: &'static ComponentSchema) -> Result<Component> {
        Component::read(self, schema, element)
    }

    pub fn builder(&self, schema: &'static ComponentSchema) -> ComponentBuilder {
        ComponentBuilder::new(schema)
    }

    pub fn commit(&self, builder: &ComponentBuilder) -> Result<Option<Component>> {
        builder.commit(self)
    }
}
