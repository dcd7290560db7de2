//! Output projections of a component
//!
//! Every projection walks the cached field slots in declaration order, so a
//! component renders the same whether it was read from a tree or built from
//! raw values.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::component::{Component, Slot};
use crate::config::OutputConfig;
use crate::schema::{FieldSpec, ValueKind};
use crate::security::IsmKind;
use crate::validator::{is_blank, parse_decimal, parse_xs_boolean};
use crate::xml::xml_escape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markup, regenerated from the cached values
    #[default]
    Xml,
    /// `name: value` lines
    Text,
    /// HTML meta tags
    Html,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: OutputConfig,
}

impl Renderer {
    pub fn new(options: OutputConfig) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &OutputConfig {
        &self.options
    }

    pub fn render(&self, component: &Component, format: OutputFormat) -> String {
        match format {
            OutputFormat::Xml => component.to_xml(),
            OutputFormat::Text => self.to_text(component, ""),
            OutputFormat::Html => self.to_html(component, ""),
            OutputFormat::Json => self.to_json(component),
        }
    }

    /// Flat `(name, value)` pairs. `prefix` is prepended, dot separated, to
    /// every name.
    pub fn entries(&self, component: &Component, prefix: &str) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        self.collect(component, &join(prefix, component.schema().output), &mut entries);
        entries
    }

    fn collect(&self, component: &Component, base: &str, entries: &mut Vec<(String, String)>) {
        for (spec, slot) in component.fields() {
            match slot {
                Slot::Texts(values) => {
                    let name = if spec.output.is_empty() {
                        base.to_string()
                    } else {
                        join(base, spec.output)
                    };
                    let shown: Vec<&String> = values
                        .iter()
                        .filter(|value| spec.warn_if_empty || !is_blank(value))
                        .collect();
                    for (i, value) in shown.iter().enumerate() {
                        entries.push((self.indexed(&name, spec, i, shown.len()), value.to_string()));
                    }
                }
                Slot::Children(children) => {
                    let name = join(base, spec.output);
                    for (i, child) in children.iter().enumerate() {
                        self.collect(child, &self.indexed(&name, spec, i, children.len()), entries);
                    }
                }
            }
        }

        for (attr, value) in component.security_attributes().iter() {
            entries.push((join(base, attr.name), value.to_string()));
        }
        for attr in component.extensible_attributes().attributes() {
            entries.push((
                join(base, &format!("{}.{}", attr.prefix, attr.local_name)),
                attr.value.clone(),
            ));
        }
    }

    fn indexed(&self, name: &str, spec: &FieldSpec, index: usize, total: usize) -> String {
        let show = match self.options.index_level {
            0 => false,
            1 => total > 1,
            _ => spec.is_repeatable(),
        };
        if show {
            format!("{}[{}]", name, index + 1)
        } else {
            name.to_string()
        }
    }

    pub fn to_text(&self, component: &Component, prefix: &str) -> String {
        let mut output = String::new();
        for (name, value) in self.entries(component, prefix) {
            output.push_str(&format!("{}: {}\n", name, value));
        }
        output
    }

    pub fn to_html(&self, component: &Component, prefix: &str) -> String {
        let mut output = String::new();
        for (name, value) in self.entries(component, prefix) {
            output.push_str(&format!(
                "<meta name=\"{}\" content=\"{}\" />\n",
                xml_escape(&name),
                xml_escape(&value)
            ));
        }
        output
    }

    pub fn to_json_value(&self, component: &Component) -> Value {
        let mut object = Map::new();

        for (spec, slot) in component.fields() {
            match slot {
                Slot::Texts(values) => {
                    let shown: Vec<Value> = values
                        .iter()
                        .filter(|value| spec.warn_if_empty || !is_blank(value))
                        .map(|value| json_scalar(spec.kind, value))
                        .collect();
                    if shown.is_empty() {
                        continue;
                    }
                    let value = if spec.is_repeatable() {
                        Value::Array(shown)
                    } else {
                        shown.into_iter().next().unwrap_or(Value::Null)
                    };
                    object.insert(spec.json_key().to_string(), value);
                }
                Slot::Children(children) => {
                    if children.is_empty() {
                        continue;
                    }
                    let mut values: Vec<Value> =
                        children.iter().map(|child| self.to_json_value(child)).collect();
                    let value = if spec.is_repeatable() {
                        Value::Array(values)
                    } else {
                        values.swap_remove(0)
                    };
                    object.insert(spec.json_key().to_string(), value);
                }
            }
        }

        let security = component.security_attributes();
        if !security.is_empty() {
            let mut attributes = Map::new();
            for (attr, value) in security.iter() {
                let value = match attr.kind {
                    IsmKind::TokenList => Value::Array(
                        value
                            .split_whitespace()
                            .map(|token| Value::String(token.to_string()))
                            .collect(),
                    ),
                    IsmKind::Boolean => parse_xs_boolean(value)
                        .map_or_else(|| Value::String(value.to_string()), Value::Bool),
                    _ => Value::String(value.to_string()),
                };
                attributes.insert(attr.name.to_string(), value);
            }
            if self.options.json_inline_attributes {
                object.extend(attributes);
            } else {
                object.insert("securityAttributes".to_string(), Value::Object(attributes));
            }
        }

        let extensible = component.extensible_attributes();
        if !extensible.is_empty() {
            let attributes: Map<String, Value> = extensible
                .attributes()
                .iter()
                .map(|attr| (attr.qualified_name(), Value::String(attr.value.clone())))
                .collect();
            object.insert("extensibleAttributes".to_string(), Value::Object(attributes));
        }

        Value::Object(object)
    }

    pub fn to_json(&self, component: &Component) -> String {
        let value = self.to_json_value(component);
        if self.options.json_pretty_print {
            format!("{:#}", value)
        } else {
            value.to_string()
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Booleans and numbers become native JSON values when they parse
fn json_scalar(kind: ValueKind, value: &str) -> Value {
    match kind {
        ValueKind::Boolean => parse_xs_boolean(value)
            .map_or_else(|| Value::String(value.to_string()), Value::Bool),
        ValueKind::Decimal => value
            .trim()
            .parse::<i64>()
            .ok()
            .map(Number::from)
            .or_else(|| parse_decimal(value).and_then(Number::from_f64))
            .map_or_else(|| Value::String(value.to_string()), Value::Number),
        _ => Value::String(value.to_string()),
    }
}
