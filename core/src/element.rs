//! Structured element tree for command text
//!
//! Commands arrive as a single XML element:
//! ```text
//! <Command Name="Echo" Text="hi"/>
//! ```
//!
//! The processor never inspects the text itself. It hands it to an
//! [`ElementParser`] and works with the resulting [`Element`] tree.

use std::str::FromStr;

use crate::error::{ConfigError, ParseError};

/// A parsed element: tag name, attributes in document order, children and text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    /// Create an element with no attributes, children or text
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an attribute, replacing any existing value under the same name
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Append a child element
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Set the text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set an attribute, replacing any existing value under the same name
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Tag name as written in the source
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an attribute (case-sensitive)
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up an attribute that must be present
    pub fn require_attribute(&self, name: &str) -> Result<&str, ConfigError> {
        self.attribute(name)
            .ok_or_else(|| ConfigError::MissingAttribute(name.to_string()))
    }

    /// Look up an optional attribute and parse it
    ///
    /// Returns `Ok(None)` when the attribute is absent and an error when it is
    /// present but does not parse.
    pub fn attribute_as<T: FromStr>(&self, name: &str) -> Result<Option<T>, ConfigError> {
        match self.attribute(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidAttribute {
                    attribute: name.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    /// All attributes in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Direct child elements
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First direct child with the given tag name (case-sensitive)
    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Trimmed text content, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Converts command text into an element tree
pub trait ElementParser: Send + Sync {
    /// Parse `text` into its root element
    fn parse(&self, text: &str) -> Result<Element, ParseError>;
}

/// Default parser backed by `roxmltree`
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlElementParser;

impl ElementParser for XmlElementParser {
    fn parse(&self, text: &str) -> Result<Element, ParseError> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(convert(doc.root_element()))
    }
}

fn convert(node: roxmltree::Node<'_, '_>) -> Element {
    let mut element = Element::new(node.tag_name().name());
    for attr in node.attributes() {
        element.set_attribute(attr.name(), attr.value());
    }

    for child in node.children().filter(|c| c.is_element()) {
        element = element.with_child(convert(child));
    }

    match node.text().map(str::trim) {
        Some(text) if !text.is_empty() => element.with_text(text),
        _ => element,
    }
}
