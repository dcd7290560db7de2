//! Foreign-namespace attributes carried through the `xs:anyAttribute` escape
//! hatch.
//!
//! Reading is lenient: attributes that collide with the element's own
//! structure are dropped without complaint. Writing is strict: the same
//! collision on an element being assembled is a validation failure.

use std::hash::{Hash, Hasher};

use crate::error::{ValidationFailure, ValidationResult};
use crate::schema::{ComponentSchema, FieldSource, Namespace};
use crate::security::ISM_ATTRIBUTES;
use crate::version::{Subsystem, VersionDescriptor};
use crate::xml::{Attribute, Element};

/// Names in the classification namespace that are owned by the resource
/// level, from 3.0 on
const RESERVED_ISM_NAMES: &[&str] = &["resourceElement", "createDate", "DESVersion"];

/// An immutable list of extensible attributes
#[derive(Debug, Clone, Default)]
pub struct ExtensibleAttributes {
    version: Option<String>,
    attributes: Vec<Attribute>,
}

impl ExtensibleAttributes {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(version: &VersionDescriptor, attributes: Vec<Attribute>) -> Self {
        Self {
            version: Some(version.token().to_string()),
            attributes,
        }
    }

    /// Collects every attribute of `element` that is not reserved in
    /// `version` and not one of the schema's own attribute fields.
    pub fn from_element(
        element: &Element,
        version: &VersionDescriptor,
        schema: &ComponentSchema,
    ) -> Self {
        let reserved = reserved_names(version);
        let attributes = element
            .attributes
            .iter()
            .filter(|attr| !is_structural(attr, version, &reserved))
            .filter(|attr| !is_schema_field(attr, version, schema))
            .cloned()
            .collect();
        Self::new(version, attributes)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Checked write onto an element being assembled
    pub fn add_to(&self, element: &mut Element, version: &VersionDescriptor) -> ValidationResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        if self.version.as_deref().is_some_and(|token| token != version.token()) {
            return Err(ValidationFailure::new(
                "These extensible attributes cannot decorate a DDMS component with a different DDMS version.",
            ));
        }

        let reserved = reserved_names(version);
        for attribute in &self.attributes {
            let collides = element
                .attributes
                .iter()
                .any(|existing| existing.same_name(attribute))
                || is_structural(attribute, version, &reserved);
            if collides {
                return Err(ValidationFailure::new(format!(
                    "The extensible attribute with the name, {} conflicts with a pre-existing attribute on the element.",
                    attribute.qualified_name()
                )));
            }
            element.add_attribute(attribute.clone());
        }
        Ok(())
    }

    /// Unchecked write
    pub fn append_to(&self, element: &mut Element) {
        for attribute in &self.attributes {
            element.add_attribute(attribute.clone());
        }
    }
}

impl PartialEq for ExtensibleAttributes {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl Eq for ExtensibleAttributes {}

impl Hash for ExtensibleAttributes {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attributes.hash(state);
    }
}

/// (namespace, local name) pairs no extensible attribute may use in `version`
pub fn reserved_names(version: &VersionDescriptor) -> Vec<(String, &'static str)> {
    let mut reserved = Vec::new();

    if let Some(ism) = version.namespace_for(Subsystem::Classification) {
        reserved.extend(
            ISM_ATTRIBUTES
                .iter()
                .filter(|attr| attr.allowed_in(version))
                .map(|attr| (ism.to_string(), attr.name)),
        );
        if version.is_at_least("3.0") {
            reserved.extend(RESERVED_ISM_NAMES.iter().map(|name| (ism.to_string(), *name)));
        }
    }
    if version.is_at_least("4.1")
        && let Some(ntk) = version.namespace_for(Subsystem::Access)
    {
        reserved.push((ntk.to_string(), "DESVersion"));
    }

    reserved
}

fn is_structural(
    attribute: &Attribute,
    version: &VersionDescriptor,
    reserved: &[(String, &'static str)],
) -> bool {
    attribute.namespace.is_empty()
        || attribute.namespace == version.namespace()
        || reserved
            .iter()
            .any(|(namespace, name)| *namespace == attribute.namespace && *name == attribute.local_name)
}

fn is_schema_field(attribute: &Attribute, version: &VersionDescriptor, schema: &ComponentSchema) -> bool {
    schema.fields.iter().any(|spec| match spec.source {
        FieldSource::Attribute(Namespace::Auxiliary(subsystem)) => {
            spec.name == attribute.local_name
                && version.namespace_for(subsystem) == Some(attribute.namespace.as_str())
        }
        _ => false,
    })
}

/// Mutable staging for [`ExtensibleAttributes`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensibleAttributesBuilder {
    pub attributes: Vec<Attribute>,
}

impl ExtensibleAttributesBuilder {
    pub fn from_attributes(attributes: &ExtensibleAttributes) -> Self {
        Self {
            attributes: attributes.attributes().to_vec(),
        }
    }

    pub fn push(&mut self, attribute: Attribute) -> &mut Self {
        self.attributes.push(attribute);
        self
    }

    /// True when no attribute carries a value
    pub fn is_empty(&self) -> bool {
        self.attributes.iter().all(|attr| attr.value.trim().is_empty())
    }

    /// Always yields a group, possibly empty. Valueless attributes are dropped.
    pub fn commit(&self, version: &VersionDescriptor) -> ExtensibleAttributes {
        let attributes = self
            .attributes
            .iter()
            .filter(|attr| !attr.value.trim().is_empty())
            .cloned()
            .collect();
        ExtensibleAttributes::new(version, attributes)
    }
}
