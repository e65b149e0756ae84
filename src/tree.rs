//! Intermediate document tree between parsed markdown and rendered HTML.

/// A node in the document tree.
///
/// `Raw` carries literal HTML embedded in the source. It is kept verbatim
/// through parsing so the filter pass can decide whether to strip it or
/// display it as escaped text.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Text(String),
    Raw(String),
    Element(Element),
}

/// An element node: tag name, ordered attributes, ordered children.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value for the same name.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

/// The tree root. Not an element; never visited by element policies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Root {
    pub children: Vec<Node>,
}
