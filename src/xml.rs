//! Owned XML tree abstraction
//!
//! Components read their values from an [`Element`] and assemble one when they
//! are built from raw values. Parsing is delegated to `roxmltree`; the tree is
//! copied out so components never hold on to the source document.

use std::collections::BTreeMap;

/// A namespace-qualified attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub prefix: String,
    pub local_name: String,
    pub namespace: String,
    pub value: String,
}

impl Attribute {
    pub fn new(
        prefix: impl Into<String>,
        local_name: impl Into<String>,
        namespace: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            local_name: local_name.into(),
            namespace: namespace.into(),
            value: value.into(),
        }
    }

    /// `prefix:local`, or just the local name when unprefixed
    pub fn qualified_name(&self) -> String {
        qualify(&self.prefix, &self.local_name)
    }

    /// True if both attributes name the same (namespace, local name) pair
    pub fn same_name(&self, other: &Attribute) -> bool {
        self.local_name == other.local_name && self.namespace == other.namespace
    }
}

/// An element node with its attributes, children and text content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub prefix: String,
    pub local_name: String,
    pub namespace: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn new(
        prefix: impl Into<String>,
        local_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            local_name: local_name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Parse a well-formed document and return its root element
    pub fn parse(xml: &str) -> Result<Element, roxmltree::Error> {
        let document = roxmltree::Document::parse(xml)?;
        Ok(Self::from_node(document.root_element()))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Element {
        let tag = node.tag_name();
        let namespace = tag.namespace().unwrap_or_default();
        let prefix = lookup_prefix(node, namespace);

        let attributes = node
            .attributes()
            .map(|attr| {
                let attr_ns = attr.namespace().unwrap_or_default();
                Attribute::new(
                    lookup_prefix(node, attr_ns),
                    attr.name(),
                    attr_ns,
                    attr.value(),
                )
            })
            .collect();

        let children = node
            .children()
            .filter(|child| child.is_element())
            .map(Self::from_node)
            .collect();

        let text = node
            .children()
            .filter(|child| child.is_text())
            .filter_map(|child| child.text())
            .collect::<String>();

        Element {
            prefix,
            local_name: tag.name().to_string(),
            namespace: namespace.to_string(),
            attributes,
            children,
            text,
        }
    }

    pub fn qualified_name(&self) -> String {
        qualify(&self.prefix, &self.local_name)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, local_name: &str, namespace: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attr| attr.local_name == local_name && attr.namespace == namespace)
    }

    pub fn attribute_value(&self, local_name: &str, namespace: &str) -> Option<&str> {
        self.attribute(local_name, namespace)
            .map(|attr| attr.value.as_str())
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn children_named<'a>(
        &'a self,
        local_name: &'a str,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children
            .iter()
            .filter(move |child| child.local_name == local_name && child.namespace == namespace)
    }

    pub fn first_child<'a>(&'a self, local_name: &'a str, namespace: &'a str) -> Option<&'a Element> {
        self.children_named(local_name, namespace).next()
    }

    /// Serialize the subtree, declaring every namespace it uses on this element
    pub fn to_xml(&self) -> String {
        let mut bindings = BTreeMap::new();
        self.collect_bindings(&mut bindings);

        let mut output = String::new();
        self.write(&mut output, &bindings);
        output
    }

    fn collect_bindings(&self, bindings: &mut BTreeMap<String, String>) {
        if !self.namespace.is_empty() {
            bindings
                .entry(self.prefix.clone())
                .or_insert_with(|| self.namespace.clone());
        }
        for attr in &self.attributes {
            if !attr.namespace.is_empty() && !attr.prefix.is_empty() {
                bindings
                    .entry(attr.prefix.clone())
                    .or_insert_with(|| attr.namespace.clone());
            }
        }
        for child in &self.children {
            child.collect_bindings(bindings);
        }
    }

    fn write(&self, output: &mut String, declarations: &BTreeMap<String, String>) {
        let name = self.qualified_name();
        output.push('<');
        output.push_str(&name);

        for (prefix, uri) in declarations {
            if prefix.is_empty() {
                output.push_str(&format!(" xmlns=\"{}\"", xml_escape(uri)));
            } else {
                output.push_str(&format!(" xmlns:{}=\"{}\"", prefix, xml_escape(uri)));
            }
        }
        for attr in &self.attributes {
            output.push_str(&format!(
                " {}=\"{}\"",
                attr.qualified_name(),
                xml_escape(&attr.value)
            ));
        }

        if self.children.is_empty() && self.text.is_empty() {
            output.push_str(" />");
            return;
        }

        output.push('>');
        output.push_str(&xml_escape(&self.text));
        let none = BTreeMap::new();
        for child in &self.children {
            child.write(output, &none);
        }
        output.push_str("</");
        output.push_str(&name);
        output.push('>');
    }
}

fn lookup_prefix(node: roxmltree::Node<'_, '_>, namespace: &str) -> String {
    if namespace.is_empty() {
        return String::new();
    }
    node.lookup_prefix(namespace)
        .unwrap_or_default()
        .to_string()
}

fn qualify(prefix: &str, local_name: &str) -> String {
    if prefix.is_empty() {
        local_name.to_string()
    } else {
        format!("{}:{}", prefix, local_name)
    }
}

/// Escape the five XML special characters
pub fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
