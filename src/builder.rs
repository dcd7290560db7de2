//! Staged, mutable counterpart of [`Component`]
//!
//! A builder holds plain values that may be blank. Nested builders and value
//! lists are created on first access, so `builder.child("keyword", 2)` works
//! without adding the first two keywords. Committing an all-blank builder
//! yields `None`.

use crate::component::{Component, RawFields, Slot};
use crate::engine::Session;
use crate::error::{Result, UsageError, UsageResult};
use crate::extensible::ExtensibleAttributesBuilder;
use crate::schema::{ComponentSchema, FieldSource};
use crate::security::SecurityAttributesBuilder;
use crate::validator::is_blank;

#[derive(Debug, Clone, PartialEq)]
pub enum BuilderSlot {
    Texts(Vec<String>),
    Children(Vec<ComponentBuilder>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentBuilder {
    schema: &'static ComponentSchema,
    slots: Vec<BuilderSlot>,
    security: Option<SecurityAttributesBuilder>,
    extensible: Option<ExtensibleAttributesBuilder>,
}

impl ComponentBuilder {
    pub fn new(schema: &'static ComponentSchema) -> Self {
        let slots = schema
            .fields
            .iter()
            .map(|spec| match spec.source {
                FieldSource::Child(_) => BuilderSlot::Children(Vec::new()),
                _ => BuilderSlot::Texts(Vec::new()),
            })
            .collect();
        Self {
            schema,
            slots,
            security: None,
            extensible: None,
        }
    }

    /// A builder holding the values of an existing component
    pub fn from_component(component: &Component) -> Self {
        let slots = component
            .fields()
            .map(|(_, slot)| match slot {
                Slot::Texts(values) => BuilderSlot::Texts(values.clone()),
                Slot::Children(children) => {
                    BuilderSlot::Children(children.iter().map(Self::from_component).collect())
                }
            })
            .collect();

        let security = component.security_attributes();
        let extensible = component.extensible_attributes();
        Self {
            schema: component.schema(),
            slots,
            security: (!security.is_empty())
                .then(|| SecurityAttributesBuilder::from_attributes(security)),
            extensible: (!extensible.is_empty())
                .then(|| ExtensibleAttributesBuilder::from_attributes(extensible)),
        }
    }

    pub fn schema(&self) -> &'static ComponentSchema {
        self.schema
    }

    fn slot_mut(&mut self, field: &str) -> UsageResult<&mut BuilderSlot> {
        let index = self
            .schema
            .field_index(field)
            .ok_or_else(|| UsageError::UnknownField {
                component: self.schema.id.to_string(),
                field: field.to_string(),
            })?;
        Ok(&mut self.slots[index])
    }

    /// The value list of a text field
    pub fn values_mut(&mut self, field: &str) -> UsageResult<&mut Vec<String>> {
        match self.slot_mut(field)? {
            BuilderSlot::Texts(values) => Ok(values),
            BuilderSlot::Children(_) => Err(UsageError::FieldKind {
                field: field.to_string(),
                expected: "component".to_string(),
            }),
        }
    }

    /// Replaces the value of a text field
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> UsageResult<&mut Self> {
        let values = self.values_mut(field)?;
        values.clear();
        values.push(value.into());
        Ok(self)
    }

    /// Appends a value to a text field
    pub fn push(&mut self, field: &str, value: impl Into<String>) -> UsageResult<&mut Self> {
        self.values_mut(field)?.push(value.into());
        Ok(self)
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        let index = self.schema.field_index(field)?;
        match &self.slots[index] {
            BuilderSlot::Texts(values) => values.first().map(String::as_str),
            BuilderSlot::Children(_) => None,
        }
    }

    /// The nested builders of a component field
    pub fn children_mut(&mut self, field: &str) -> UsageResult<&mut Vec<ComponentBuilder>> {
        let child_schema = self
            .schema
            .field(field)
            .and_then(|spec| spec.child_schema());
        match (self.slot_mut(field)?, child_schema) {
            (BuilderSlot::Children(children), Some(_)) => Ok(children),
            _ => Err(UsageError::FieldKind {
                field: field.to_string(),
                expected: "text".to_string(),
            }),
        }
    }

    /// The nested builder at `index`, creating it and any before it
    pub fn child(&mut self, field: &str, index: usize) -> UsageResult<&mut ComponentBuilder> {
        let child_schema = self
            .schema
            .field(field)
            .and_then(|spec| spec.child_schema());
        let children = self.children_mut(field)?;
        if let Some(schema) = child_schema {
            while children.len() <= index {
                children.push(ComponentBuilder::new(schema));
            }
        }
        Ok(&mut children[index])
    }

    pub fn security_attributes(&mut self) -> &mut SecurityAttributesBuilder {
        self.security.get_or_insert_with(SecurityAttributesBuilder::default)
    }

    pub fn extensible_attributes(&mut self) -> &mut ExtensibleAttributesBuilder {
        self.extensible
            .get_or_insert_with(ExtensibleAttributesBuilder::default)
    }

    /// Recomputed on every call since builders are mutated in place
    pub fn is_empty(&self) -> bool {
        let slots_empty = self.slots.iter().all(|slot| match slot {
            BuilderSlot::Texts(values) => values.iter().all(|value| is_blank(value)),
            BuilderSlot::Children(children) => children.iter().all(ComponentBuilder::is_empty),
        });
        slots_empty
            && self.security.as_ref().is_none_or(SecurityAttributesBuilder::is_empty)
            && self
                .extensible
                .as_ref()
                .is_none_or(ExtensibleAttributesBuilder::is_empty)
    }

    /// Validates and freezes the staged values in the session's version.
    /// Empty nested builders are skipped.
    pub fn commit(&self, session: &Session<'_>) -> Result<Option<Component>> {
        if self.is_empty() {
            return Ok(None);
        }

        let version = session.version();
        let mut raw = RawFields::new();
        for (spec, slot) in self.schema.fields.iter().zip(&self.slots) {
            raw = match slot {
                BuilderSlot::Texts(values) if spec.is_repeatable() => {
                    raw.list(spec.name, values.iter().cloned())
                }
                BuilderSlot::Texts(values) => match values.first() {
                    Some(value) => raw.text(spec.name, value.as_str()),
                    None => raw,
                },
                BuilderSlot::Children(builders) => {
                    let mut children = Vec::with_capacity(builders.len());
                    for builder in builders {
                        let committed = builder.commit(session).map_err(|e| {
                            e.within(&format!("{}:{}", version.prefix(), self.schema.element_name(version)))
                        })?;
                        children.extend(committed);
                    }
                    raw.children(spec.name, children)
                }
            };
        }

        if let Some(security) = self.security.as_ref().filter(|builder| !builder.is_empty()) {
            raw = raw.security(security.commit(version));
        }
        if let Some(extensible) = self.extensible.as_ref().filter(|builder| !builder.is_empty()) {
            raw = raw.extensible(extensible.commit(version));
        }

        Component::from_raw(session, self.schema, raw).map(Some)
    }
}
