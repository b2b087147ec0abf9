//! In-memory XML tree and its serialization.
//!
//! The compiler assembles the whole script as a tree of [`XmlElement`]s and
//! serializes it in one pass at the end. Attribute and text values are kept
//! raw in the tree; the writer escapes them exactly once on the way out.

use std::fmt;
use std::str::FromStr;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{CompileError, Result};

/// A child of an element: a nested element or a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// One element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute, replacing an earlier value under the same name
    /// while keeping its position.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.attributes.push((name, value));
        }
        self
    }

    /// Builder-style variant of [`set_attr`](Self::set_attr).
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Nested elements, skipping text runs.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First nested element carrying `name`.
    pub fn find_child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|child| child.name == name)
    }
}

/// Output encodings the serializer declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
    Utf16,
}

impl Encoding {
    /// IANA charset name written into the XML declaration.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Utf16 => "UTF-16",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Ok(Encoding::Utf8),
            "ISO-8859-1" | "LATIN1" => Ok(Encoding::Latin1),
            "UTF-16" | "UTF16" => Ok(Encoding::Utf16),
            other => Err(format!("unsupported encoding '{other}'")),
        }
    }
}

/// How to serialize a finished document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pretty-print with four-space indentation.
    pub indent: bool,
    pub encoding: Encoding,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: true,
            encoding: Encoding::default(),
        }
    }
}

/// Serializes `root` as a standalone XML 1.1 document.
pub fn render(root: &XmlElement, options: &RenderOptions) -> Result<String> {
    let buffer = Vec::new();
    let mut writer = if options.indent {
        Writer::new_with_indent(buffer, b' ', 4)
    } else {
        Writer::new(buffer)
    };

    writer
        .write_event(Event::Decl(BytesDecl::new(
            "1.1",
            Some(options.encoding.name()),
            None,
        )))
        .map_err(|e| CompileError::render(e.to_string()))?;
    write_element(&mut writer, root)?;

    String::from_utf8(writer.into_inner()).map_err(|e| CompileError::render(e.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name());
    for (name, value) in element.attributes() {
        start.push_attribute((name, value));
    }

    if element.children.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| CompileError::render(e.to_string()))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| CompileError::render(e.to_string()))?;
    for child in element.children() {
        match child {
            XmlNode::Element(nested) => write_element(writer, nested)?,
            XmlNode::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| CompileError::render(e.to_string()))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name())))
        .map_err(|e| CompileError::render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> XmlElement {
        let mut root = XmlElement::new("root").with_attr("version", "1");
        let mut child = XmlElement::new("data")
            .with_attr("source", "a&b")
            .with_attr("name", "out");
        child.push(XmlElement::new("trim"));
        root.push(child);
        root
    }

    #[test]
    fn renders_declaration_and_nesting() {
        let document = render(&sample(), &RenderOptions::default()).unwrap();
        assert!(document.starts_with(r#"<?xml version="1.1" encoding="UTF-8"?>"#));
        assert!(document.contains("<root version=\"1\">"));
        assert!(document.contains("    <data source=\"a&amp;b\" name=\"out\">"));
        assert!(document.contains("<trim/>"));
        assert!(document.ends_with("</root>"));
    }

    #[test]
    fn compact_rendering_drops_indentation() {
        let options = RenderOptions {
            indent: false,
            encoding: Encoding::Latin1,
        };
        let document = render(&sample(), &options).unwrap();
        assert!(document.contains(r#"encoding="ISO-8859-1""#));
        assert!(!document.contains('\n'));
    }

    #[test]
    fn attributes_replace_in_place() {
        let mut element = XmlElement::new("e")
            .with_attr("first", "1")
            .with_attr("second", "2");
        element.set_attr("first", "updated");
        let names: Vec<&str> = element.attributes().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(element.attr("first"), Some("updated"));
    }

    #[test]
    fn encoding_parses_common_spellings() {
        assert_eq!("utf-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("latin1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert!("ebcdic".parse::<Encoding>().is_err());
    }
}
