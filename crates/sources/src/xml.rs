use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::SourceError;

/// Namespace-free element tree, enough for the small service responses we read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn parse(xml: &str) -> Result<XmlNode, SourceError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        // Synthetic root so documents with a prolog or several top-level nodes still parse
        let mut stack = vec![XmlNode::default()];

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(element(&e)?),
                Event::Empty(e) => {
                    let node = element(&e)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
                Event::End(_) => {
                    if stack.len() > 1 {
                        if let Some(node) = stack.pop() {
                            if let Some(parent) = stack.last_mut() {
                                parent.children.push(node);
                            }
                        }
                    }
                }
                Event::Text(t) => {
                    if let Some(node) = stack.last_mut() {
                        node.text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(c) => {
                    if let Some(node) = stack.last_mut() {
                        node.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        // Unclosed elements are folded into their parents
        while stack.len() > 1 {
            if let Some(node) = stack.pop() {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
        }

        Ok(stack.pop().unwrap_or_default())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All descendants with the given local name, in document order
    pub fn descendants<'a>(&'a self, name: &'a str) -> Vec<&'a XmlNode> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    /// First descendant with the given local name
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find_map(|child| {
            if child.name == name {
                Some(child)
            } else {
                child.find(name)
            }
        })
    }

    pub fn find_text(&self, name: &str) -> Option<&str> {
        self.find(name).map(|node| node.text.as_str())
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlNode>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect(name, found);
        }
    }
}

fn element(start: &BytesStart) -> Result<XmlNode, SourceError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).to_string();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        attributes.push((key, value));
    }

    Ok(XmlNode {
        name,
        attributes,
        ..Default::default()
    })
}
