//! Tree node types: documents, elements, and the opaque sibling kinds.

use std::path::Path;

use crate::error::{TreeError, TreeResult};
use crate::write::{self, WriteOptions};

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A single child of an element (or a top-level prolog/epilog item).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// Character data, already unescaped.
    Text(String),
    /// A `<![CDATA[...]]>` section.
    CData(String),
    /// A `<!-- ... -->` comment (content without the delimiters).
    Comment(String),
    /// A `<?target data?>` processing instruction.
    ProcessingInstruction { target: String, data: String },
    /// A `<!DOCTYPE ...>` declaration (content after the keyword).
    DocType(String),
}

impl Node {
    /// Borrow the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Mutably borrow the element if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Character content of a text or CDATA node.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(t) | Self::CData(t) => Some(t),
            _ => None,
        }
    }

    /// Returns `true` for text and CDATA nodes.
    pub fn is_text(&self) -> bool {
        self.text().is_some()
    }

    /// Returns `true` for text nodes that contain only whitespace.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Self::Text(t) if t.trim().is_empty())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// A single `name="value"` attribute, value unescaped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An element: tag name, ordered attributes, and ordered children.
///
/// Cloning is a deep copy of the whole subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// The qualified tag name, verbatim (no namespace resolution).
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<Attribute>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Builder: append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder: append a text node.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Look up an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Direct element children, in order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Direct element children with the given tag name, in order.
    pub fn child_elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.child_elements().filter(move |e| e.name == name)
    }

    /// First direct element child with the given tag name.
    pub fn first_child_named(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name == name)
    }

    /// Mutable access to the element at child position `index`.
    ///
    /// Returns `None` if the position is out of range or not an element.
    pub fn child_element_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.children.get_mut(index).and_then(Node::as_element_mut)
    }

    /// Returns `true` if any direct child is an element.
    pub fn has_element_children(&self) -> bool {
        self.children.iter().any(|c| c.as_element().is_some())
    }

    /// Concatenation of the direct text and CDATA children.
    pub fn own_text(&self) -> String {
        self.children.iter().filter_map(Node::text).collect()
    }

    /// Concatenation of all text beneath this element, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) | Node::CData(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
                _ => {}
            }
        }
    }

    /// Replace this element's own text with a single text node.
    ///
    /// Element children and other non-text children are kept in place. The
    /// new text goes where the first existing text node was, or first if
    /// there was none.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let at = self.children.iter().position(Node::is_text).unwrap_or(0);
        self.children.retain(|c| !c.is_text());
        self.children.insert(at, Node::Text(text.into()));
    }

    /// Returns `true` if this element or any descendant element holds a
    /// non-blank text value.
    pub fn has_data(&self) -> bool {
        self.children.iter().any(|child| match child {
            Node::Text(t) | Node::CData(t) => !t.trim().is_empty(),
            Node::Element(e) => e.has_data(),
            _ => false,
        })
    }

    /// Number of elements in this subtree, including `self`.
    pub fn element_count(&self) -> usize {
        1 + self.child_elements().map(Element::element_count).sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The `<?xml ...?>` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".into(),
            encoding: Some("UTF-8".into()),
            standalone: None,
        }
    }
}

/// A parsed document: one root element plus whatever surrounds it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// The declaration, if the source had one.
    pub declaration: Option<Declaration>,
    /// Comments, processing instructions, and doctype before the root.
    pub prolog: Vec<Node>,
    /// The root element.
    pub root: Element,
    /// Comments and processing instructions after the root.
    pub epilog: Vec<Node>,
}

impl Document {
    /// Create a document with just a root element.
    pub fn new(root: Element) -> Self {
        Self {
            declaration: None,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Parse a document from a string.
    pub fn parse(input: &str) -> TreeResult<Self> {
        crate::parse::parse_str(input)
    }

    /// Read and parse a document from a file.
    pub fn from_file(path: impl AsRef<Path>) -> TreeResult<Self> {
        crate::parse::parse_file(path)
    }

    /// Serialize to a string.
    pub fn to_xml_string(&self, options: &WriteOptions) -> TreeResult<String> {
        write::to_string(self, options)
    }

    /// Serialize and write to a file, replacing any existing content.
    pub fn write_file(&self, path: impl AsRef<Path>, options: &WriteOptions) -> TreeResult<()> {
        let path = path.as_ref();
        let xml = self.to_xml_string(options)?;
        std::fs::write(path, xml).map_err(|e| TreeError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, text: &str) -> Element {
        Element::new(name).with_text(text)
    }

    #[test]
    fn own_text_ignores_descendants() {
        let e = Element::new("a").with_text("x").with_child(leaf("b", "y"));
        assert_eq!(e.own_text(), "x");
        assert_eq!(e.text_content(), "xy");
    }

    #[test]
    fn set_text_replaces_existing_text() {
        let mut e = Element::new("a").with_text("  ").with_text("old");
        e.set_text("new");
        assert_eq!(e.children, vec![Node::Text("new".into())]);
    }

    #[test]
    fn set_text_keeps_element_children() {
        let mut e = Element::new("a").with_child(leaf("b", "1"));
        e.set_text("t");
        assert_eq!(e.children.len(), 2);
        assert_eq!(e.children[0], Node::Text("t".into()));
        assert_eq!(e.first_child_named("b").map(Element::own_text), Some("1".into()));
    }

    #[test]
    fn set_text_on_empty_leaf() {
        let mut e = Element::new("a");
        e.set_text("v");
        assert_eq!(e.own_text(), "v");
    }

    #[test]
    fn has_data_looks_through_nesting() {
        let empty = Element::new("a").with_text("\n  ").with_child(Element::new("b").with_text(" "));
        assert!(!empty.has_data());

        let deep = Element::new("a").with_child(Element::new("b").with_child(leaf("c", "v")));
        assert!(deep.has_data());

        assert!(leaf("a", "x").has_data());
    }

    #[test]
    fn comments_are_not_data() {
        let mut e = Element::new("a");
        e.children.push(Node::Comment("note".into()));
        assert!(!e.has_data());
    }

    #[test]
    fn child_elements_named_filters_by_tag() {
        let e = Element::new("r")
            .with_child(leaf("x", "1"))
            .with_child(leaf("y", "2"))
            .with_child(leaf("x", "3"));
        let xs: Vec<String> = e.child_elements_named("x").map(Element::own_text).collect();
        assert_eq!(xs, vec!["1", "3"]);
        assert!(e.has_element_children());
        assert_eq!(e.element_count(), 4);
    }

    #[test]
    fn attribute_lookup() {
        let e = Element::new("a").with_attribute("id", "7");
        assert_eq!(e.attribute("id"), Some("7"));
        assert_eq!(e.attribute("missing"), None);
    }

    #[test]
    fn child_element_mut_skips_non_elements() {
        let mut e = Element::new("a").with_text("t").with_child(Element::new("b"));
        assert!(e.child_element_mut(0).is_none());
        assert!(e.child_element_mut(1).is_some());
        assert!(e.child_element_mut(5).is_none());
    }
}
