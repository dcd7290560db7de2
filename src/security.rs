//! Security markings attribute group
//!
//! The attributes live in the version's classification namespace. Which of
//! them are allowed, and which vocabulary checks their tokens, is table data
//! in [`ISM_ATTRIBUTES`].

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::error::{DdmsError, Result, UsageError, UsageResult, ValidationFailure, ValidationResult};
use crate::validator::{ValidationMessage, is_xs_date, parse_xs_boolean};
use crate::version::{Subsystem, VersionDescriptor};
use crate::vocabulary::{ControlledVocabulary, invalid_token_message};
use crate::xml::{Attribute, Element};

/// Value shape of a security attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsmKind {
    Text,
    /// A single vocabulary token
    Token,
    /// A whitespace-separated list of vocabulary tokens
    TokenList,
    Date,
    Boolean,
}

/// Table entry for one security attribute
#[derive(Debug, Clone, Copy)]
pub struct IsmAttribute {
    pub name: &'static str,
    pub kind: IsmKind,
    pub vocabulary: Option<&'static str>,
    pub since: Option<&'static str>,
    /// First version in which the attribute is no longer allowed
    pub until: Option<&'static str>,
}

impl IsmAttribute {
    const fn new(name: &'static str, kind: IsmKind, vocabulary: Option<&'static str>) -> Self {
        Self {
            name,
            kind,
            vocabulary,
            since: None,
            until: None,
        }
    }

    const fn since(mut self, version: &'static str) -> Self {
        self.since = Some(version);
        self
    }

    const fn until(mut self, version: &'static str) -> Self {
        self.until = Some(version);
        self
    }

    pub fn allowed_in(&self, version: &VersionDescriptor) -> bool {
        self.since.is_none_or(|since| version.is_at_least(since))
            && self.until.is_none_or(|until| version.is_before(until))
    }
}

/// Security attributes in output order
pub static ISM_ATTRIBUTES: &[IsmAttribute] = &[
    IsmAttribute::new("classification", IsmKind::Token, Some("ClassificationAll")),
    IsmAttribute::new("ownerProducer", IsmKind::TokenList, Some("OwnerProducer")),
    IsmAttribute::new("SCIcontrols", IsmKind::TokenList, Some("SCIcontrols")),
    IsmAttribute::new("SARIdentifier", IsmKind::TokenList, Some("SARIdentifier")),
    IsmAttribute::new("atomicEnergyMarkings", IsmKind::TokenList, Some("AtomicEnergyMarkings"))
        .since("3.1"),
    IsmAttribute::new("disseminationControls", IsmKind::TokenList, Some("Dissem")),
    IsmAttribute::new("displayOnlyTo", IsmKind::TokenList, Some("RelTo")).since("3.1"),
    IsmAttribute::new("FGIsourceOpen", IsmKind::TokenList, Some("FGIsourceOpen")),
    IsmAttribute::new("FGIsourceProtected", IsmKind::TokenList, Some("FGIsourceProtected")),
    IsmAttribute::new("releasableTo", IsmKind::TokenList, Some("RelTo")),
    IsmAttribute::new("nonICmarkings", IsmKind::TokenList, Some("NonIC")),
    IsmAttribute::new("classifiedBy", IsmKind::Text, None),
    IsmAttribute::new("compilationReason", IsmKind::Text, None).since("3.0"),
    IsmAttribute::new("derivativelyClassifiedBy", IsmKind::Text, None),
    IsmAttribute::new("classificationReason", IsmKind::Text, None),
    IsmAttribute::new("nonUSControls", IsmKind::TokenList, Some("NonUSControls")).since("3.1"),
    IsmAttribute::new("derivedFrom", IsmKind::Text, None),
    IsmAttribute::new("declassDate", IsmKind::Date, None),
    IsmAttribute::new("declassEvent", IsmKind::Text, None),
    IsmAttribute::new("declassException", IsmKind::TokenList, Some("DeclassExemption")),
    IsmAttribute::new("typeOfExemptedSource", IsmKind::TokenList, Some("ExemptedSource"))
        .until("3.1"),
    IsmAttribute::new("dateOfExemptedSource", IsmKind::Date, None).until("3.1"),
    IsmAttribute::new("declassManualReview", IsmKind::Boolean, None).until("3.0"),
    IsmAttribute::new("compliesWith", IsmKind::TokenList, Some("CompliesWith")).since("3.1"),
];

/// Classification tokens retired after the first version
const RETIRED_CLASSIFICATIONS: &[&str] = &["NS-S", "NS-A"];

pub fn ism_attribute(name: &str) -> Option<&'static IsmAttribute> {
    ISM_ATTRIBUTES.iter().find(|attr| attr.name == name)
}

/// An immutable set of security attribute values
#[derive(Debug, Clone, Default)]
pub struct SecurityAttributes {
    version: Option<String>,
    /// (table name, value) pairs in table order; list values are
    /// single-space separated
    values: Vec<(&'static str, String)>,
}

impl SecurityAttributes {
    /// An empty group, bound to no version
    pub fn empty() -> Self {
        Self::default()
    }

    /// The common case: a classification and its owners
    pub fn new(
        version: &VersionDescriptor,
        classification: &str,
        owner_producers: &[&str],
    ) -> Self {
        let mut builder = SecurityAttributesBuilder::default();
        builder.classification = classification.to_string();
        builder.owner_producers = owner_producers.iter().map(|s| s.to_string()).collect();
        builder.commit(version)
    }

    /// A group from any named attributes. Unknown names are a usage error.
    pub fn from_values(
        version: &VersionDescriptor,
        values: &BTreeMap<String, String>,
    ) -> UsageResult<Self> {
        let mut collected = Vec::new();
        for (name, value) in values {
            if ism_attribute(name).is_none() {
                return Err(UsageError::UnknownField {
                    component: "security attributes".to_string(),
                    field: name.clone(),
                });
            }
            collected.push((name.as_str(), value.as_str()));
        }
        Ok(Self::collect(version, collected))
    }

    fn collect<'a>(
        version: &VersionDescriptor,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let pairs: Vec<(&str, &str)> = pairs.into_iter().collect();
        let values = ISM_ATTRIBUTES
            .iter()
            .filter_map(|attr| {
                let value = pairs
                    .iter()
                    .find(|(name, _)| *name == attr.name)
                    .map(|(_, value)| normalize(attr.kind, value))?;
                (!value.is_empty()).then_some((attr.name, value))
            })
            .collect();
        Self {
            version: Some(version.token().to_string()),
            values,
        }
    }

    /// Reads every known attribute in the version's classification namespace
    pub fn from_element(element: &Element, version: &VersionDescriptor) -> Self {
        let Some(namespace) = version.namespace_for(Subsystem::Classification) else {
            return Self {
                version: Some(version.token().to_string()),
                values: Vec::new(),
            };
        };
        let pairs = ISM_ATTRIBUTES.iter().filter_map(|attr| {
            element
                .attribute_value(attr.name, namespace)
                .map(|value| (attr.name, value))
        });
        Self::collect(version, pairs)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(attr, _)| *attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// Tokens of a list attribute
    pub fn list(&self, name: &str) -> Vec<&str> {
        self.get(name)
            .map(|value| value.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn classification(&self) -> Option<&str> {
        self.get("classification")
    }

    pub fn owner_producers(&self) -> Vec<&str> {
        self.list("ownerProducer")
    }

    /// Attribute values in table order
    pub fn iter(&self) -> impl Iterator<Item = (&'static IsmAttribute, &str)> {
        self.values.iter().filter_map(|(name, value)| {
            ism_attribute(name).map(|attr| (attr, value.as_str()))
        })
    }

    /// Checked write: the element must belong to the same version and must not
    /// already carry any of these attributes.
    pub fn add_to(&self, element: &mut Element, version: &VersionDescriptor) -> ValidationResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        if self.version.as_deref().is_some_and(|token| token != version.token()) {
            return Err(ValidationFailure::new(
                "These security attributes cannot decorate a DDMS component with a different DDMS version.",
            ));
        }
        for attribute in self.attributes(version) {
            if element
                .attributes
                .iter()
                .any(|existing| existing.same_name(&attribute))
            {
                return Err(ValidationFailure::new(format!(
                    "The security attribute, {} conflicts with a pre-existing attribute on the element.",
                    attribute.qualified_name()
                )));
            }
            element.add_attribute(attribute);
        }
        Ok(())
    }

    /// Unchecked write, for components that already validated
    pub fn append_to(&self, element: &mut Element, version: &VersionDescriptor) {
        for attribute in self.attributes(version) {
            element.add_attribute(attribute);
        }
    }

    fn attributes(&self, version: &VersionDescriptor) -> Vec<Attribute> {
        let Some(binding) = version.auxiliary(Subsystem::Classification) else {
            return Vec::new();
        };
        self.values
            .iter()
            .map(|(name, value)| {
                Attribute::new(binding.prefix.as_str(), *name, binding.uri.as_str(), value.as_str())
            })
            .collect()
    }

    /// Fails unless a classification and at least one owner are set
    pub fn require_classification(&self) -> ValidationResult<()> {
        if self.classification().is_none() {
            return Err(ValidationFailure::new("classification is required."));
        }
        if self.owner_producers().is_empty() {
            return Err(ValidationFailure::new("At least 1 ownerProducer must be set."));
        }
        Ok(())
    }

    /// Validates every value for `version`. Vocabulary misses are returned as
    /// warnings when `vocabulary_as_errors` is false.
    pub fn validate(
        &self,
        version: &VersionDescriptor,
        vocabulary: &ControlledVocabulary,
        vocabulary_as_errors: bool,
    ) -> Result<Vec<ValidationMessage>> {
        let mut warnings = Vec::new();

        for (attr, value) in self.iter() {
            if let Some(since) = attr.since.filter(|since| version.is_before(since)) {
                return Err(failure(format!(
                    "The {} attribute cannot be used until DDMS {} or later.",
                    attr.name, since
                )));
            }
            if let Some(until) = attr.until.filter(|until| version.is_at_least(until)) {
                return Err(failure(format!(
                    "The {} attribute can only be used in DDMS versions before {}.",
                    attr.name, until
                )));
            }

            match attr.kind {
                IsmKind::Date if !is_xs_date(value) => {
                    return Err(failure(format!(
                        "The {} attribute must be in the xs:date format (YYYY-MM-DD).",
                        attr.name
                    )));
                }
                IsmKind::Boolean if parse_xs_boolean(value).is_none() => {
                    return Err(failure(format!(
                        "The {} attribute must be a boolean value.",
                        attr.name
                    )));
                }
                _ => {}
            }

            if attr.name == "classification"
                && RETIRED_CLASSIFICATIONS.contains(&value)
                && version.is_at_least("3.0")
            {
                return Err(failure(format!(
                    "The {} classification can only be used in DDMS 2.0.",
                    value
                )));
            }

            if let Some(key) = attr.vocabulary {
                for token in value.split_whitespace() {
                    if vocabulary.check(key, token, version)? {
                        continue;
                    }
                    let message = invalid_token_message(key, token);
                    if vocabulary_as_errors {
                        return Err(failure(message));
                    }
                    warnings.push(ValidationMessage::warning(message));
                }
            }
        }

        Ok(warnings)
    }
}

fn failure(message: String) -> DdmsError {
    ValidationFailure::new(message).into()
}

fn normalize(kind: IsmKind, value: &str) -> String {
    match kind {
        IsmKind::TokenList => value.split_whitespace().collect::<Vec<_>>().join(" "),
        _ => value.trim().to_string(),
    }
}

impl PartialEq for SecurityAttributes {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for SecurityAttributes {}

impl Hash for SecurityAttributes {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.hash(state);
    }
}

/// Mutable staging for [`SecurityAttributes`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityAttributesBuilder {
    pub classification: String,
    pub owner_producers: Vec<String>,
    /// Every other attribute by table name; list values space separated
    pub others: BTreeMap<String, String>,
}

impl SecurityAttributesBuilder {
    pub fn from_attributes(attributes: &SecurityAttributes) -> Self {
        let mut builder = Self::default();
        for (attr, value) in attributes.iter() {
            match attr.name {
                "classification" => builder.classification = value.to_string(),
                "ownerProducer" => {
                    builder.owner_producers = value.split_whitespace().map(String::from).collect()
                }
                name => {
                    builder.others.insert(name.to_string(), value.to_string());
                }
            }
        }
        builder
    }

    /// Sets any attribute by name
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> UsageResult<&mut Self> {
        let value = value.into();
        match name {
            "classification" => self.classification = value,
            "ownerProducer" => {
                self.owner_producers = value.split_whitespace().map(String::from).collect()
            }
            _ if ism_attribute(name).is_some() => {
                self.others.insert(name.to_string(), value);
            }
            _ => {
                return Err(UsageError::UnknownField {
                    component: "security attributes".to_string(),
                    field: name.to_string(),
                });
            }
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.classification.trim().is_empty()
            && self.owner_producers.iter().all(|owner| owner.trim().is_empty())
            && self.others.values().all(|value| value.trim().is_empty())
    }

    pub fn commit(&self, version: &VersionDescriptor) -> SecurityAttributes {
        let owners = self.owner_producers.join(" ");
        let mut pairs: Vec<(&str, &str)> = vec![
            ("classification", self.classification.as_str()),
            ("ownerProducer", owners.as_str()),
        ];
        pairs.extend(
            self.others
                .iter()
                .filter(|(name, _)| ism_attribute(name).is_some())
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );
        SecurityAttributes::collect(version, pairs)
    }
}
