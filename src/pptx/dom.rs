/// Owned XML element tree for slide parts.
///
/// Slide XML is parsed into a mutable tree, navigated by local element name,
/// mutated, and serialized back. Unknown elements and attributes round-trip
/// untouched so that everything the merge does not understand (animations,
/// color maps, extension lists) survives generation intact.
///
/// Mutation always rebuilds a node's child `Vec` (`retain`, `insert`,
/// splice); nodes carry no parent pointers, and relation lookups (siblings
/// of a shape) go through the owning slide.
use crate::common::xml::escape_xml;
use crate::pptx::error::{PptxError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as FmtWrite;

/// A node in the element tree: a child element or character data.
#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlNode {
    /// This node as an element, if it is one.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        }
    }

    /// This node as a mutable element, if it is one.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        }
    }
}

/// An XML element with its attributes and children, in document order.
#[derive(Debug, Clone)]
pub struct XmlElement {
    /// Qualified name as it appears in the document (e.g. "p:sp")
    name: String,

    /// Attributes in document order, qualified name to raw value
    attrs: Vec<(String, String)>,

    /// Child nodes in document order
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element with the given qualified name.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute.
    pub fn with_attr<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Builder: append a child element.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder: append a text child.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// The qualified name (e.g. "p:sp").
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The local name with any namespace prefix stripped (e.g. "sp").
    #[inline]
    pub fn local_name(&self) -> &str {
        match self.name.rfind(':') {
            Some(pos) => &self.name[pos + 1..],
            None => &self.name,
        }
    }

    /// Check the local name.
    #[inline]
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Get an attribute value by qualified name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value or appending.
    pub fn set_attr<V: Into<String>>(&mut self, key: &str, value: V) {
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.into(),
            None => self.attrs.push((key.to_string(), value.into())),
        }
    }

    /// Child nodes in document order.
    #[inline]
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Mutable access to the child list.
    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Append a child element.
    pub fn push_element(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Iterate over child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Iterate over child elements mutably.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(XmlNode::as_element_mut)
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.is(local))
    }

    /// First child element with the given local name, mutably.
    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|el| el.is(local))
    }

    /// Descend through a path of local names.
    pub fn find(&self, path: &[&str]) -> Option<&XmlElement> {
        let mut current = self;
        for local in path {
            current = current.child(local)?;
        }
        Some(current)
    }

    /// Descend through a path of local names, mutably.
    pub fn find_mut(&mut self, path: &[&str]) -> Option<&mut XmlElement> {
        let mut current = self;
        for local in path {
            current = current.child_mut(local)?;
        }
        Some(current)
    }

    /// Position of the first child element with the given local name.
    pub fn position_of(&self, local: &str) -> Option<usize> {
        self.children.iter().position(|n| {
            n.as_element().map(|el| el.is(local)).unwrap_or(false)
        })
    }

    /// Concatenated character data of this element's direct text children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let XmlNode::Text(t) = node {
                out.push_str(t);
            }
        }
        out
    }

    /// Concatenated character data of all descendant text nodes.
    pub fn deep_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Parse a document and return its root element.
    ///
    /// Comments, processing instructions and the XML declaration are
    /// dropped; everything else is preserved. Whitespace inside elements is
    /// kept as-is since character data in runs is significant.
    pub fn parse(xml: &[u8]) -> Result<XmlElement> {
        let mut reader = Reader::from_reader(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let el = Self::element_from_event(e)?;
                    stack.push(el);
                },
                Ok(Event::Empty(ref e)) => {
                    let el = Self::element_from_event(e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(el)),
                        None if root.is_none() => root = Some(el),
                        None => {
                            return Err(PptxError::Xml(
                                "multiple root elements".to_string(),
                            ));
                        },
                    }
                },
                Ok(Event::End(_)) => {
                    let el = stack.pop().ok_or_else(|| {
                        PptxError::Xml("unbalanced end tag".to_string())
                    })?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(el)),
                        None if root.is_none() => root = Some(el),
                        None => {
                            return Err(PptxError::Xml(
                                "multiple root elements".to_string(),
                            ));
                        },
                    }
                },
                Ok(Event::Text(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let decoded = e
                            .decode()
                            .map_err(|e| PptxError::Xml(e.to_string()))?;
                        let text = quick_xml::escape::unescape(&decoded)
                            .map_err(|e| PptxError::Xml(e.to_string()))?
                            .into_owned();
                        parent.children.push(XmlNode::Text(text));
                    }
                },
                Ok(Event::GeneralRef(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let name = e
                            .decode()
                            .map_err(|e| PptxError::Xml(e.to_string()))?;
                        let entity = format!("&{};", name);
                        let text = quick_xml::escape::unescape(&entity)
                            .map_err(|e| PptxError::Xml(e.to_string()))?
                            .into_owned();
                        parent.children.push(XmlNode::Text(text));
                    }
                },
                Ok(Event::CData(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                        parent.children.push(XmlNode::Text(text));
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(PptxError::Xml(e.to_string())),
                _ => {},
            }
            buf.clear();
        }

        root.ok_or_else(|| PptxError::Xml("document has no root element".to_string()))
    }

    fn element_from_event(e: &quick_xml::events::BytesStart<'_>) -> Result<XmlElement> {
        let name = std::str::from_utf8(e.name().as_ref())
            .map_err(|e| PptxError::Xml(e.to_string()))?
            .to_string();
        let mut el = XmlElement::new(name);
        for attr in e.attributes() {
            let attr = attr.map_err(|e| PptxError::Xml(e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| PptxError::Xml(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| PptxError::Xml(e.to_string()))?
                .into_owned();
            el.attrs.push((key, value));
        }
        Ok(el)
    }

    /// Serialize this element (and its subtree) to XML text.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(1024);
        self.write_xml(&mut out);
        out
    }

    /// Serialize as a standalone document with the XML declaration.
    pub fn to_document_xml(&self) -> String {
        let mut out = String::with_capacity(1024 + 64);
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            let _ = write!(out, r#" {}="{}""#, key, escape_xml(value));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.children {
            match node {
                XmlNode::Element(el) => el.write_xml(out),
                XmlNode::Text(t) => out.push_str(&escape_xml(t)),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}
