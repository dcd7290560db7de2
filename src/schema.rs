//! Per-element descriptors
//!
//! A [`ComponentSchema`] is the data that makes one element type differ from
//! another: its name in each version, its fields with their cardinality and
//! lexical kind, which attribute groups it carries, and the cross-field rules
//! that apply to it. The algorithms in [`crate::component`] and
//! [`crate::render`] are shared by every schema.

use crate::version::{Subsystem, VersionDescriptor};

/// Upper bound for repeatable fields
pub const UNBOUNDED: usize = usize::MAX;

/// Namespace of an attribute field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// The version's primary namespace
    Primary,
    /// One of the version's auxiliary namespaces
    Auxiliary(Subsystem),
}

/// Where a field's values live in the tree
#[derive(Debug, Clone, Copy)]
pub enum FieldSource {
    Attribute(Namespace),
    /// The element's own text content
    Text,
    /// Text content of child elements in the primary namespace
    ChildText,
    /// Nested components
    Child(&'static ComponentSchema),
}

/// Lexical kind of a text value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Uri,
    Boolean,
    Decimal,
    /// xs:date, xs:dateTime, xs:gYear or xs:gYearMonth
    Date,
    /// One of a closed set of tokens
    Token(&'static [&'static str]),
}

impl ValueKind {
    pub fn is_boolean(&self) -> bool {
        matches!(self, ValueKind::Boolean)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Decimal)
    }
}

/// One field of a component
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Local name in the tree
    pub name: &'static str,
    /// Name used by the text, HTML and JSON projections. Empty for the
    /// element's own text, which renders under the component's name.
    pub output: &'static str,
    pub source: FieldSource,
    pub kind: ValueKind,
    pub min: usize,
    pub max: usize,
    pub since: Option<&'static str>,
    /// First version in which the field is no longer allowed
    pub until: Option<&'static str>,
    /// Warn when a child element is present with no text
    pub warn_if_empty: bool,
}

impl FieldSpec {
    const fn base(name: &'static str, source: FieldSource, max: usize) -> Self {
        Self {
            name,
            output: name,
            source,
            kind: ValueKind::String,
            min: 0,
            max,
            since: None,
            until: None,
            warn_if_empty: false,
        }
    }

    /// An attribute in the primary namespace
    pub const fn attribute(name: &'static str) -> Self {
        Self::base(name, FieldSource::Attribute(Namespace::Primary), 1)
    }

    /// An attribute in an auxiliary namespace
    pub const fn foreign_attribute(name: &'static str, subsystem: Subsystem) -> Self {
        Self::base(
            name,
            FieldSource::Attribute(Namespace::Auxiliary(subsystem)),
            1,
        )
    }

    /// The element's text content
    pub const fn text() -> Self {
        let mut spec = Self::base("value", FieldSource::Text, 1);
        spec.output = "";
        spec
    }

    /// A child element holding text; at most one unless widened
    pub const fn child_text(name: &'static str) -> Self {
        Self::base(name, FieldSource::ChildText, 1)
    }

    /// Nested components; any number unless narrowed
    pub const fn child(name: &'static str, schema: &'static ComponentSchema) -> Self {
        Self::base(name, FieldSource::Child(schema), UNBOUNDED)
    }

    pub const fn output(mut self, output: &'static str) -> Self {
        self.output = output;
        self
    }

    pub const fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub const fn required(mut self) -> Self {
        self.min = 1;
        self
    }

    pub const fn bounds(mut self, min: usize, max: usize) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub const fn since(mut self, version: &'static str) -> Self {
        self.since = Some(version);
        self
    }

    pub const fn until(mut self, version: &'static str) -> Self {
        self.until = Some(version);
        self
    }

    pub const fn warn_if_empty(mut self) -> Self {
        self.warn_if_empty = true;
        self
    }

    pub fn allowed_in(&self, version: &VersionDescriptor) -> bool {
        self.since.is_none_or(|since| version.is_at_least(since))
            && self.until.is_none_or(|until| version.is_before(until))
    }

    /// Key used in JSON output
    pub fn json_key(&self) -> &'static str {
        if self.output.is_empty() { "value" } else { self.output }
    }

    pub fn is_repeatable(&self) -> bool {
        self.max > 1
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.source, FieldSource::Attribute(_))
    }

    pub fn child_schema(&self) -> Option<&'static ComponentSchema> {
        match self.source {
            FieldSource::Child(schema) => Some(schema),
            _ => None,
        }
    }
}

/// Whether an attribute group may decorate a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Forbidden,
    Optional,
    Required,
}

/// Presence of an attribute group, optionally gated on a version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRule {
    pub presence: Presence,
    pub since: Option<&'static str>,
}

impl GroupRule {
    pub const FORBIDDEN: GroupRule = GroupRule {
        presence: Presence::Forbidden,
        since: None,
    };
    pub const OPTIONAL: GroupRule = GroupRule {
        presence: Presence::Optional,
        since: None,
    };
    pub const REQUIRED: GroupRule = GroupRule {
        presence: Presence::Required,
        since: None,
    };

    pub const fn since(mut self, version: &'static str) -> Self {
        self.since = Some(version);
        self
    }

    /// True if the group may be read and written at all
    pub fn is_supported(&self) -> bool {
        self.presence != Presence::Forbidden
    }

    pub fn allowed_in(&self, version: &VersionDescriptor) -> bool {
        self.is_supported() && self.since.is_none_or(|since| version.is_at_least(since))
    }

    pub fn required_in(&self, version: &VersionDescriptor) -> bool {
        self.presence == Presence::Required && self.allowed_in(version)
    }
}

/// Cross-field rules. Field names refer to [`FieldSpec::name`].
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// `field` must have a value whenever `when` has one
    RequiredWith {
        field: &'static str,
        when: &'static str,
    },
    /// At least one of the fields must have a value
    AtLeastOne {
        fields: &'static [&'static str],
        message: &'static str,
    },
    /// The numeric value of `lower` must not exceed that of `upper`
    NotGreater {
        lower: &'static str,
        upper: &'static str,
        message: &'static str,
    },
    /// The field, when allowed, must hold exactly this value
    Fixed {
        field: &'static str,
        value: &'static str,
    },
    /// Warn when `field` has a value but `missing` does not
    WarnSetWithout {
        field: &'static str,
        missing: &'static str,
        message: &'static str,
    },
    /// Warn when every field is empty. `{qname}` in the message is replaced
    /// by the component's qualified name.
    WarnIfEmpty { message: &'static str },
    /// Warn when two nested components of `field` are equal
    WarnDuplicates {
        field: &'static str,
        message: &'static str,
    },
    /// Warn when `field` has a value in a version before `before`. `{field}`
    /// in the message is replaced by the field's qualified name.
    WarnBefore {
        field: &'static str,
        before: &'static str,
        message: &'static str,
    },
}

/// Warning text for a component with no value
pub const NO_VALUE: &str = "A {qname} element was found with no value.";

/// Warning text for a component with no fields at all
pub const COMPLETELY_EMPTY: &str = "A completely empty {qname} element was found.";

/// Descriptor of one element type
#[derive(Debug)]
pub struct ComponentSchema {
    /// Identity of the element type; equal components share it
    pub id: &'static str,
    /// Element local names, each with the first version using it, ascending
    pub names: &'static [(&'static str, &'static str)],
    /// Name used by the text, HTML and JSON projections
    pub output: &'static str,
    pub since: Option<&'static str>,
    pub fields: &'static [FieldSpec],
    pub security: GroupRule,
    pub extensible: GroupRule,
    pub rules: &'static [Rule],
}

impl ComponentSchema {
    /// The local name used in `version`
    pub fn element_name(&self, version: &VersionDescriptor) -> &'static str {
        self.names
            .iter()
            .rev()
            .find(|(since, _)| version.is_at_least(since))
            .or_else(|| self.names.first())
            .map_or(self.id, |(_, name)| *name)
    }

    /// True if `local_name` is this element's name in any version
    pub fn answers_to(&self, local_name: &str) -> bool {
        self.names.iter().any(|(_, name)| *name == local_name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|spec| spec.name == name)
    }

    pub fn allowed_in(&self, version: &VersionDescriptor) -> bool {
        self.since.is_none_or(|since| version.is_at_least(since))
    }
}

impl PartialEq for ComponentSchema {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentSchema {}
