//! Minimal lossless XML tree over quick-xml events.
//!
//! Every event is kept in owned form, so writing an untouched document reproduces it
//! byte for byte. Only elements that are edited get re-serialized.

use quick_xml::{
    Reader, Writer,
    events::{BytesStart, BytesText, Event},
};

use crate::error::Error;

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    /// Any non-element event: text, CDATA, comments, declarations, processing instructions.
    Event(Event<'static>),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(element) => Some(element),
            XmlNode::Event(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(element) => Some(element),
            XmlNode::Event(_) => None,
        }
    }

    /// Returns the raw text if this node is whitespace-only text.
    pub fn as_whitespace(&self) -> Option<&str> {
        match self {
            XmlNode::Event(Event::Text(text)) if text.iter().all(u8::is_ascii_whitespace) => {
                std::str::from_utf8(text).ok()
            }
            _ => None,
        }
    }

    pub fn whitespace(raw: &str) -> Self {
        XmlNode::Event(Event::Text(BytesText::from_escaped(raw.to_string())))
    }
}

#[derive(Debug, Clone)]
pub struct XmlElement {
    start: BytesStart<'static>,
    children: Vec<XmlNode>,
    self_closing: bool,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        XmlElement {
            start: BytesStart::new(name.to_string()),
            children: Vec::new(),
            self_closing: true,
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.start.push_attribute((name, value));
        self
    }

    pub fn with_text(mut self, value: &str) -> Self {
        self.set_text(value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.self_closing = false;
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Local (namespace-free) element name.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.start.local_name().as_ref()).into_owned()
    }

    pub fn is(&self, local_name: &str) -> bool {
        self.start.local_name().as_ref() == local_name.as_bytes()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.start
            .attributes()
            .with_checks(false)
            .filter_map(Result::ok)
            .find(|attr| attr.key.as_ref() == name.as_bytes())
            .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Replaces (or appends) one attribute, keeping the order of the others.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let qualified = String::from_utf8_lossy(self.start.name().as_ref()).into_owned();
        let mut start = BytesStart::new(qualified);
        let mut replaced = false;
        for attr in self.start.attributes().with_checks(false).filter_map(Result::ok) {
            if attr.key.as_ref() == name.as_bytes() {
                start.push_attribute((name, value));
                replaced = true;
            } else {
                start.push_attribute(attr);
            }
        }
        if !replaced {
            start.push_attribute((name, value));
        }
        self.start = start;
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        self.self_closing = false;
        &mut self.children
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn element(&self, local_name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(local_name))
    }

    pub fn element_mut(&mut self, local_name: &str) -> Option<&mut XmlElement> {
        self.children
            .iter_mut()
            .filter_map(XmlNode::as_element_mut)
            .find(|e| e.is(local_name))
    }

    /// Removes the first child element with the given name; returns whether one existed.
    pub fn remove_element(&mut self, local_name: &str) -> bool {
        let Some(position) = self
            .children
            .iter()
            .position(|n| n.as_element().is_some_and(|e| e.is(local_name)))
        else {
            return false;
        };
        self.remove_child_with_indent(position);
        true
    }

    /// Removes the child at `position` together with the whitespace right before it.
    pub fn remove_child_with_indent(&mut self, position: usize) -> Vec<XmlNode> {
        let start = if position > 0 && self.children[position - 1].as_whitespace().is_some() {
            position - 1
        } else {
            position
        };
        self.children.drain(start..=position).collect()
    }

    /// Inserts an element right after the child at `after`, or first when `after` is `None`,
    /// using `indent` as the whitespace in front of it.
    pub fn insert_element(&mut self, after: Option<usize>, element: XmlElement, indent: &str) {
        self.self_closing = false;
        match after {
            Some(index) => {
                let position = (index + 1).min(self.children.len());
                self.children.insert(position, XmlNode::Element(element));
                self.children.insert(position, XmlNode::whitespace(indent));
            }
            None => {
                let position = self
                    .children
                    .iter()
                    .position(|n| n.as_whitespace().is_none())
                    .unwrap_or(self.children.len());
                self.children.insert(position, XmlNode::whitespace(indent));
                self.children.insert(position, XmlNode::Element(element));
            }
        }
    }

    /// Appends an element before trailing whitespace, indented like the last child element.
    pub fn append_element(&mut self, element: XmlElement, default_indent: &str) {
        let last_element = self
            .children
            .iter()
            .rposition(|n| n.as_element().is_some());
        match last_element {
            Some(index) => {
                let indent = self
                    .indentation_of(index)
                    .unwrap_or(default_indent)
                    .to_string();
                self.insert_element(Some(index), element, &indent);
            }
            None => {
                self.self_closing = false;
                let trailing = self
                    .children
                    .last()
                    .and_then(XmlNode::as_whitespace)
                    .is_some();
                let position = if trailing {
                    self.children.len() - 1
                } else {
                    self.children.len()
                };
                self.children.insert(position, XmlNode::Element(element));
                self.children
                    .insert(position, XmlNode::whitespace(default_indent));
            }
        }
    }

    /// Whitespace text directly in front of the child at `position`.
    pub fn indentation_of(&self, position: usize) -> Option<&str> {
        if position == 0 {
            return None;
        }
        self.children[position - 1].as_whitespace()
    }

    /// Concatenated, unescaped text and CDATA content.
    pub fn text(&self) -> Result<String, Error> {
        let mut out = String::new();
        for child in &self.children {
            match child {
                XmlNode::Event(Event::Text(text)) => out.push_str(&text.unescape()?),
                XmlNode::Event(Event::CData(data)) => out.push_str(&String::from_utf8_lossy(data)),
                _ => {}
            }
        }
        Ok(out)
    }

    pub fn set_text(&mut self, value: &str) {
        self.children = vec![XmlNode::Event(Event::Text(BytesText::new(value).into_owned()))];
        self.self_closing = false;
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        if self.self_closing && self.children.is_empty() {
            writer.write_event(Event::Empty(self.start.borrow()))?;
            return Ok(());
        }
        writer.write_event(Event::Start(self.start.borrow()))?;
        for child in &self.children {
            write_node(child, writer)?;
        }
        writer.write_event(Event::End(self.start.to_end()))?;
        Ok(())
    }
}

/// A parsed document: prolog nodes, the root element and anything after it.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn parse(content: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut nodes: Vec<XmlNode> = Vec::new();

        fn push(stack: &mut [XmlElement], nodes: &mut Vec<XmlNode>, node: XmlNode) {
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => nodes.push(node),
            }
        }

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(XmlElement {
                    start: start.into_owned(),
                    children: Vec::new(),
                    self_closing: false,
                }),
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        Error::DataMismatch("unexpected closing tag".to_string())
                    })?;
                    push(&mut stack, &mut nodes, XmlNode::Element(element));
                }
                Event::Empty(start) => {
                    let element = XmlElement {
                        start: start.into_owned(),
                        children: Vec::new(),
                        self_closing: true,
                    };
                    push(&mut stack, &mut nodes, XmlNode::Element(element));
                }
                Event::Eof => break,
                other => push(&mut stack, &mut nodes, XmlNode::Event(other.into_owned())),
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::DataMismatch(format!(
                "unclosed element `{}`",
                open.name()
            )));
        }
        Ok(XmlDocument { nodes })
    }

    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(XmlNode::as_element)
    }

    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.nodes.iter_mut().find_map(XmlNode::as_element_mut)
    }

    pub fn render(&self) -> Result<String, Error> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(node, &mut writer)?;
        }
        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::DataMismatch(format!("rendered XML is not UTF-8: {}", e)))
    }
}

fn write_node<W: std::io::Write>(node: &XmlNode, writer: &mut Writer<W>) -> Result<(), Error> {
    match node {
        XmlNode::Element(element) => element.write(writer),
        XmlNode::Event(event) => {
            writer.write_event(event.borrow())?;
            Ok(())
        }
    }
}
