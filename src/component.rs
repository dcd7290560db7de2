//! The generic component
//!
//! A [`Component`] is one element instance described by a
//! [`ComponentSchema`]. Both construction paths, from a parsed tree or from
//! raw values, cache the same field slots and then run the same two
//! validation phases. A component that exists is free of errors; it may
//! still carry warnings.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::trace;

use crate::engine::{Ddms, Session};
use crate::error::{DdmsError, Result, UsageError, ValidationFailure};
use crate::extensible::ExtensibleAttributes;
use crate::schema::{ComponentSchema, FieldSource, FieldSpec, Namespace, Rule, ValueKind};
use crate::security::SecurityAttributes;
use crate::validator::{
    ValidationMessage, cardinality_message, is_blank, is_date_family, is_valid_uri, parse_decimal,
    parse_xs_boolean,
};
use crate::version::VersionDescriptor;
use crate::xml::{Attribute, Element};

/// Cached values of one field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Texts(Vec<String>),
    Children(Vec<Component>),
}

impl Slot {
    fn empty_for(spec: &FieldSpec) -> Self {
        match spec.source {
            FieldSource::Child(_) => Slot::Children(Vec::new()),
            _ => Slot::Texts(Vec::new()),
        }
    }

    pub fn texts(&self) -> &[String] {
        match self {
            Slot::Texts(values) => values,
            Slot::Children(_) => &[],
        }
    }

    pub fn children(&self) -> &[Component] {
        match self {
            Slot::Children(children) => children,
            Slot::Texts(_) => &[],
        }
    }

    /// True if any value is non-blank or any child exists
    pub fn has_value(&self) -> bool {
        match self {
            Slot::Texts(values) => values.iter().any(|value| !is_blank(value)),
            Slot::Children(children) => !children.is_empty(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Slot::Texts(values) => values.len(),
            Slot::Children(children) => children.len(),
        }
    }
}

/// A raw value for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    List(Vec<String>),
    Components(Vec<Component>),
}

/// Named raw values for programmatic construction
#[derive(Debug, Clone, Default)]
pub struct RawFields {
    values: Vec<(String, RawValue)>,
    security: Option<SecurityAttributes>,
    extensible: Option<ExtensibleAttributes>,
}

impl RawFields {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(mut self, name: &str, value: RawValue) -> Self {
        self.values.retain(|(existing, _)| existing != name);
        self.values.push((name.to_string(), value));
        self
    }

    pub fn text(self, name: &str, value: impl Into<String>) -> Self {
        self.put(name, RawValue::Text(value.into()))
    }

    pub fn list(self, name: &str, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.put(name, RawValue::List(values.into_iter().map(Into::into).collect()))
    }

    /// Appends one nested component
    pub fn child(mut self, name: &str, component: Component) -> Self {
        if let Some((_, RawValue::Components(children))) =
            self.values.iter_mut().find(|(existing, _)| existing == name)
        {
            children.push(component);
            return self;
        }
        self.put(name, RawValue::Components(vec![component]))
    }

    pub fn children(self, name: &str, components: Vec<Component>) -> Self {
        self.put(name, RawValue::Components(components))
    }

    pub fn security(mut self, attributes: SecurityAttributes) -> Self {
        self.security = Some(attributes);
        self
    }

    pub fn extensible(mut self, attributes: ExtensibleAttributes) -> Self {
        self.extensible = Some(attributes);
        self
    }
}

/// An immutable, validated element instance
#[derive(Debug, Clone)]
pub struct Component {
    schema: &'static ComponentSchema,
    version: Arc<VersionDescriptor>,
    name: &'static str,
    prefix: String,
    namespace: String,
    slots: Vec<Slot>,
    security: SecurityAttributes,
    extensible: ExtensibleAttributes,
    warnings: Vec<ValidationMessage>,
}

/// Everything cached before validation runs
struct Parts {
    local_name: String,
    prefix: String,
    namespace: String,
    slots: Vec<Slot>,
    security: SecurityAttributes,
    extensible: ExtensibleAttributes,
}

impl Component {
    /// Reads a component from a tree node. The version is the one whose
    /// namespace the node uses.
    pub fn from_element(
        engine: &Ddms,
        schema: &'static ComponentSchema,
        element: &Element,
    ) -> Result<Self> {
        let version = engine
            .registry()
            .resolve_for_namespace(&element.namespace)?;
        let session = engine.session_for(version);
        Self::read(&session, schema, element)
    }

    /// Reads a component from a tree node in the session's version
    pub fn read(session: &Session<'_>, schema: &'static ComponentSchema, element: &Element) -> Result<Self> {
        let version = session.version();
        let prefix = if element.prefix.is_empty() {
            version.prefix().to_string()
        } else {
            element.prefix.clone()
        };
        let qualified_name = qualify(&prefix, &element.local_name);

        Self::read_parts(session, schema, element, prefix)
            .and_then(|parts| Self::finish(session, schema, parts))
            .map_err(|e| e.within(&qualified_name))
    }

    fn read_parts(
        session: &Session<'_>,
        schema: &'static ComponentSchema,
        element: &Element,
        prefix: String,
    ) -> Result<Parts> {
        let version = session.version();
        let mut slots = Vec::with_capacity(schema.fields.len());

        for spec in schema.fields {
            let slot = match spec.source {
                FieldSource::Attribute(namespace) => {
                    let value = attribute_namespace(namespace, version, &element.namespace)
                        .and_then(|uri| element.attribute_value(spec.name, uri))
                        .map(str::trim)
                        .filter(|value| !value.is_empty());
                    Slot::Texts(value.into_iter().map(String::from).collect())
                }
                FieldSource::Text => {
                    let text = element.text.trim();
                    Slot::Texts(if text.is_empty() {
                        Vec::new()
                    } else {
                        vec![text.to_string()]
                    })
                }
                FieldSource::ChildText => Slot::Texts(
                    element
                        .children_named(spec.name, &element.namespace)
                        .map(|child| child.text.trim().to_string())
                        .collect(),
                ),
                FieldSource::Child(child_schema) => Slot::Children(
                    element
                        .children
                        .iter()
                        .filter(|child| {
                            child.namespace == element.namespace
                                && child_schema.answers_to(&child.local_name)
                        })
                        .map(|child| Self::read(session, child_schema, child))
                        .collect::<Result<Vec<_>>>()?,
                ),
            };
            slots.push(slot);
        }

        let security = if schema.security.is_supported() {
            SecurityAttributes::from_element(element, version)
        } else {
            SecurityAttributes::empty()
        };
        let extensible = if schema.extensible.is_supported() {
            ExtensibleAttributes::from_element(element, version, schema)
        } else {
            ExtensibleAttributes::empty()
        };

        Ok(Parts {
            local_name: element.local_name.clone(),
            prefix,
            namespace: element.namespace.clone(),
            slots,
            security,
            extensible,
        })
    }

    /// Builds a component from raw values in the session's version
    pub fn from_raw(session: &Session<'_>, schema: &'static ComponentSchema, raw: RawFields) -> Result<Self> {
        let version = session.version();
        let name = schema.element_name(version);
        let prefix = version.prefix().to_string();
        let qualified_name = qualify(&prefix, name);

        let mut slots: Vec<Slot> = schema.fields.iter().map(Slot::empty_for).collect();
        for (field, value) in raw.values {
            let index = schema
                .field_index(&field)
                .ok_or_else(|| UsageError::UnknownField {
                    component: schema.id.to_string(),
                    field: field.clone(),
                })?;
            slots[index] = raw_slot(&schema.fields[index], value)?;
        }

        let parts = Parts {
            local_name: name.to_string(),
            prefix,
            namespace: version.namespace().to_string(),
            slots,
            security: raw.security.unwrap_or_default(),
            extensible: raw.extensible.unwrap_or_default(),
        };

        check_assembly(schema, version, &parts)
            .and_then(|()| Self::finish(session, schema, parts))
            .map_err(|e| e.within(&qualified_name))
    }

    fn finish(session: &Session<'_>, schema: &'static ComponentSchema, parts: Parts) -> Result<Self> {
        let version = session.version().clone();
        let vocabulary_warnings = validate(session, schema, &parts)?;

        let mut component = Component {
            schema,
            name: schema.element_name(&version),
            version,
            prefix: parts.prefix,
            namespace: parts.namespace,
            slots: parts.slots,
            security: parts.security,
            extensible: parts.extensible,
            warnings: Vec::new(),
        };
        component.warnings = component.collect_warnings(vocabulary_warnings);

        trace!(
            element = %component.qualified_name(),
            version = component.version.token(),
            warnings = component.warnings.len(),
            "Constructed component"
        );
        Ok(component)
    }

    fn collect_warnings(&self, vocabulary_warnings: Vec<ValidationMessage>) -> Vec<ValidationMessage> {
        let qualified_name = self.qualified_name();
        let mut own = vocabulary_warnings;

        for (spec, slot) in self.fields() {
            if spec.warn_if_empty
                && matches!(spec.source, FieldSource::ChildText)
                && slot.texts().iter().any(|value| is_blank(value))
            {
                own.push(ValidationMessage::warning(format!(
                    "A {} element was found with no value.",
                    qualify(&self.prefix, spec.name)
                )));
            }
        }

        for rule in self.schema.rules {
            match *rule {
                Rule::WarnSetWithout {
                    field,
                    missing,
                    message,
                } => {
                    if self.has_value(field) && !self.has_value(missing) {
                        own.push(ValidationMessage::warning(message));
                    }
                }
                Rule::WarnIfEmpty { message } => {
                    if self.slots.iter().all(|slot| !slot.has_value()) {
                        own.push(ValidationMessage::warning(
                            message.replace("{qname}", &qualified_name),
                        ));
                    }
                }
                Rule::WarnDuplicates { field, message } => {
                    let children = self.children(field);
                    let duplicated = children
                        .iter()
                        .enumerate()
                        .any(|(i, child)| children[i + 1..].contains(child));
                    if duplicated {
                        own.push(ValidationMessage::warning(message));
                    }
                }
                Rule::WarnBefore {
                    field,
                    before,
                    message,
                } => {
                    if self.version.is_before(before) && self.has_value(field) {
                        own.push(ValidationMessage::warning(
                            message.replace("{field}", &qualify(&self.prefix, field)),
                        ));
                    }
                }
                _ => {}
            }
        }

        let nested = self
            .slots
            .iter()
            .flat_map(|slot| slot.children())
            .flat_map(|child| child.warnings().iter().cloned());

        own.into_iter()
            .chain(nested)
            .map(|message| message.within(&qualified_name))
            .collect()
    }

    pub fn schema(&self) -> &'static ComponentSchema {
        self.schema
    }

    pub fn version(&self) -> &Arc<VersionDescriptor> {
        &self.version
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn qualified_name(&self) -> String {
        qualify(&self.prefix, self.name)
    }

    /// Field descriptors paired with their cached values, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldSpec, &Slot)> {
        self.schema.fields.iter().zip(&self.slots)
    }

    fn slot(&self, field: &str) -> Option<&Slot> {
        self.schema.field_index(field).map(|index| &self.slots[index])
    }

    /// The first value of a text field
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values(field).first().map(String::as_str)
    }

    pub fn values(&self, field: &str) -> &[String] {
        self.slot(field).map(Slot::texts).unwrap_or_default()
    }

    pub fn children(&self, field: &str) -> &[Component] {
        self.slot(field).map(Slot::children).unwrap_or_default()
    }

    pub fn child(&self, field: &str) -> Option<&Component> {
        self.children(field).first()
    }

    pub fn has_value(&self, field: &str) -> bool {
        self.slot(field).is_some_and(Slot::has_value)
    }

    pub fn security_attributes(&self) -> &SecurityAttributes {
        &self.security
    }

    pub fn extensible_attributes(&self) -> &ExtensibleAttributes {
        &self.extensible
    }

    /// Warnings of this component and its descendants, located from here
    pub fn warnings(&self) -> &[ValidationMessage] {
        &self.warnings
    }

    /// Regenerates the tree node from the cached values
    pub fn to_element(&self) -> Element {
        let mut node = Element::new(self.prefix.as_str(), self.name, self.namespace.as_str());
        append_fields(&mut node, self.schema, &self.version, &self.prefix, &self.namespace, &self.slots);
        self.security.append_to(&mut node, &self.version);
        self.extensible.append_to(&mut node);
        node
    }

    pub fn to_xml(&self) -> String {
        self.to_element().to_xml()
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.schema.id == other.schema.id
            && self.name == other.name
            && self.namespace == other.namespace
            && self.slots == other.slots
            && self.security == other.security
            && self.extensible == other.extensible
    }
}

impl Eq for Component {}

impl Hash for Component {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema.id.hash(state);
        self.name.hash(state);
        self.namespace.hash(state);
        self.slots.hash(state);
        self.security.hash(state);
        self.extensible.hash(state);
    }
}

fn raw_slot(spec: &FieldSpec, value: RawValue) -> Result<Slot> {
    let kind_error = |expected: &str| -> DdmsError {
        UsageError::FieldKind {
            field: spec.name.to_string(),
            expected: expected.to_string(),
        }
        .into()
    };

    match (spec.source, value) {
        (FieldSource::Child(_), RawValue::Components(children)) => Ok(Slot::Children(children)),
        (FieldSource::Child(_), _) => Err(kind_error("component")),
        (_, RawValue::Components(_)) => Err(kind_error("text")),
        (FieldSource::ChildText, RawValue::List(values)) => Ok(Slot::Texts(
            values
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(String::from)
                .collect(),
        )),
        (_, RawValue::List(_)) => Err(kind_error("single text")),
        (_, RawValue::Text(value)) => {
            let value = value.trim();
            Ok(Slot::Texts(if value.is_empty() {
                Vec::new()
            } else {
                vec![value.to_string()]
            }))
        }
    }
}

/// Namespace URI of an attribute field; the primary one is the element's own
fn attribute_namespace<'a>(
    namespace: Namespace,
    version: &'a VersionDescriptor,
    element_namespace: &'a str,
) -> Option<&'a str> {
    match namespace {
        Namespace::Primary => Some(element_namespace),
        Namespace::Auxiliary(subsystem) => version.namespace_for(subsystem),
    }
}

/// Assembles the node from raw parts with checked attribute-group writes, so
/// collisions surface before the component exists
fn check_assembly(schema: &ComponentSchema, version: &VersionDescriptor, parts: &Parts) -> Result<()> {
    let mut node = Element::new(
        parts.prefix.as_str(),
        parts.local_name.as_str(),
        parts.namespace.as_str(),
    );
    append_fields(&mut node, schema, version, &parts.prefix, &parts.namespace, &parts.slots);
    parts.security.add_to(&mut node, version)?;
    parts.extensible.add_to(&mut node, version)?;
    Ok(())
}

fn append_fields(
    node: &mut Element,
    schema: &ComponentSchema,
    version: &VersionDescriptor,
    prefix: &str,
    namespace: &str,
    slots: &[Slot],
) {
    for (spec, slot) in schema.fields.iter().zip(slots) {
        match (spec.source, slot) {
            (FieldSource::Attribute(Namespace::Primary), Slot::Texts(values)) => {
                if let Some(value) = values.first() {
                    node.add_attribute(Attribute::new(prefix, spec.name, namespace, value.as_str()));
                }
            }
            (FieldSource::Attribute(Namespace::Auxiliary(subsystem)), Slot::Texts(values)) => {
                if let (Some(value), Some(binding)) = (values.first(), version.auxiliary(subsystem)) {
                    node.add_attribute(Attribute::new(
                        binding.prefix.as_str(),
                        spec.name,
                        binding.uri.as_str(),
                        value.as_str(),
                    ));
                }
            }
            (FieldSource::Text, Slot::Texts(values)) => {
                if let Some(value) = values.first() {
                    node.text = value.clone();
                }
            }
            (FieldSource::ChildText, Slot::Texts(values)) => {
                for value in values {
                    node.add_child(Element::new(prefix, spec.name, namespace).with_text(value.as_str()));
                }
            }
            (_, Slot::Children(children)) => {
                for child in children {
                    node.add_child(child.to_element());
                }
            }
            _ => {}
        }
    }
}

fn qualify(prefix: &str, local_name: &str) -> String {
    if prefix.is_empty() {
        local_name.to_string()
    } else {
        format!("{}:{}", prefix, local_name)
    }
}

fn failure(message: impl Into<String>) -> DdmsError {
    ValidationFailure::new(message).into()
}

/// Structural validation. Returns the vocabulary misses that were demoted to
/// warnings.
fn validate(session: &Session<'_>, schema: &ComponentSchema, parts: &Parts) -> Result<Vec<ValidationMessage>> {
    let version = session.version();
    let qualified_name = qualify(&parts.prefix, &parts.local_name);

    if parts.namespace != version.namespace() || parts.local_name != schema.element_name(version) {
        return Err(failure(format!(
            "Unexpected namespace URI and local name encountered: {}",
            qualified_name
        )));
    }
    if let Some(since) = schema.since.filter(|since| version.is_before(since)) {
        return Err(failure(format!(
            "The {} element cannot be used until DDMS {} or later.",
            qualified_name, since
        )));
    }

    for (spec, slot) in schema.fields.iter().zip(&parts.slots) {
        validate_field(spec, slot, schema, version)?;
    }

    let mut warnings = Vec::new();
    if !parts.security.is_empty() || schema.security.required_in(version) {
        if !schema.security.allowed_in(version) {
            return Err(failure(match schema.security.since {
                Some(since) if schema.security.is_supported() => format!(
                    "Security attributes cannot be applied to this component until DDMS {} or later.",
                    since
                ),
                _ => "Security attributes cannot be applied to this component.".to_string(),
            }));
        }
        if schema.security.required_in(version) {
            parts.security.require_classification()?;
        }
        warnings = parts.security.validate(
            version,
            session.vocabulary(),
            session.settings().vocabulary_as_errors,
        )?;
    }

    if !parts.extensible.is_empty() && !schema.extensible.allowed_in(version) {
        return Err(failure(format!(
            "xs:anyAttribute cannot be applied to {} in DDMS {}.",
            qualified_name,
            version.token()
        )));
    }

    for rule in schema.rules {
        validate_rule(rule, schema, &parts.slots, version)?;
    }

    Ok(warnings)
}

fn validate_field(
    spec: &FieldSpec,
    slot: &Slot,
    schema: &ComponentSchema,
    version: &VersionDescriptor,
) -> Result<()> {
    let noun = if spec.is_attribute() { "attribute" } else { "element" };

    if !spec.allowed_in(version) {
        if !slot.has_value() {
            return Ok(());
        }
        return Err(failure(match (spec.since, spec.until) {
            (Some(since), _) if version.is_before(since) => format!(
                "The {} {} cannot be used until DDMS {} or later.",
                spec.name, noun, since
            ),
            (_, Some(until)) => format!(
                "The {} {} can only be used in DDMS versions before {}.",
                spec.name, noun, until
            ),
            _ => format!("The {} {} cannot be used in DDMS {}.", spec.name, noun, version.token()),
        }));
    }

    let present = match slot {
        Slot::Texts(values) => values.iter().filter(|value| !is_blank(value)).count(),
        Slot::Children(children) => children.len(),
    };
    if present < spec.min {
        return Err(failure(match spec.source {
            FieldSource::Text => format!("{} value is required.", schema.output),
            _ if spec.max == 1 => format!("{} is required.", spec.name),
            _ => cardinality_message(spec.name, present, spec.min, spec.max)
                .unwrap_or_else(|| format!("{} is required.", spec.name)),
        }));
    }
    if let Some(message) = cardinality_message(spec.name, slot.len(), 0, spec.max) {
        return Err(failure(message));
    }

    match slot {
        Slot::Texts(values) => {
            for value in values.iter().filter(|value| !is_blank(value)) {
                check_kind(spec, value)?;
            }
        }
        Slot::Children(children) => {
            for child in children {
                if child.version().token() != version.token() {
                    return Err(failure(format!(
                        "A child component, {}, is using a different version of DDMS from its parent.",
                        child.qualified_name()
                    )));
                }
            }
        }
    }
    Ok(())
}

fn check_kind(spec: &FieldSpec, value: &str) -> Result<()> {
    let message = match spec.kind {
        ValueKind::Uri if !is_valid_uri(value) => format!("Invalid URI for {}: {}", spec.name, value),
        ValueKind::Boolean if parse_xs_boolean(value).is_none() => {
            format!("The {} attribute must be a boolean value.", spec.name)
        }
        ValueKind::Decimal if parse_decimal(value).is_none() => {
            format!("The {} value must be a number: {}", spec.name, value)
        }
        ValueKind::Date if !is_date_family(value) => format!(
            "The {} attribute must be in a valid date format (xs:date, xs:dateTime, xs:gYear or xs:gYearMonth).",
            spec.name
        ),
        ValueKind::Token(tokens) if !tokens.contains(&value) => {
            format!("The {} must be one of {}.", spec.name, tokens.join(", "))
        }
        _ => return Ok(()),
    };
    Err(failure(message))
}

fn validate_rule(
    rule: &Rule,
    schema: &ComponentSchema,
    slots: &[Slot],
    version: &VersionDescriptor,
) -> Result<()> {
    let slot = |field: &str| schema.field_index(field).map(|index| &slots[index]);
    let has = |field: &str| slot(field).is_some_and(Slot::has_value);
    let first = |field: &str| {
        slot(field)
            .and_then(|slot| slot.texts().first())
            .map(String::as_str)
    };

    match *rule {
        Rule::RequiredWith { field, when } => {
            if has(when) && !has(field) {
                return Err(failure(format!("{} is required.", field)));
            }
        }
        Rule::AtLeastOne { fields, message } => {
            if !fields.iter().any(|field| has(field)) {
                return Err(failure(message));
            }
        }
        Rule::NotGreater {
            lower,
            upper,
            message,
        } => {
            let lower = first(lower).and_then(parse_decimal);
            let upper = first(upper).and_then(parse_decimal);
            if let (Some(lower), Some(upper)) = (lower, upper)
                && lower > upper
            {
                return Err(failure(message));
            }
        }
        Rule::Fixed { field, value } => {
            let applies = schema.field(field).is_some_and(|spec| spec.allowed_in(version));
            if applies && first(field).is_some_and(|actual| actual != value) {
                return Err(failure(format!(
                    "The {} attribute must have a fixed value of {}.",
                    field, value
                )));
            }
        }
        Rule::WarnSetWithout { .. }
        | Rule::WarnIfEmpty { .. }
        | Rule::WarnDuplicates { .. }
        | Rule::WarnBefore { .. } => {}
    }
    Ok(())
}
