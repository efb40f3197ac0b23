//! Serialization of the owned tree back to XML text.

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::node::{Declaration, Document, Element, Node};

/// Controls how a document is written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Re-indent with this many spaces per level, dropping whitespace-only
    /// text. `None` writes every node verbatim.
    pub indent: Option<usize>,
    /// Emit an XML declaration (the document's own, or a UTF-8 default).
    pub declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: Some(2),
            declaration: true,
        }
    }
}

impl WriteOptions {
    /// Verbatim output: no re-indentation, declaration kept.
    pub fn verbatim() -> Self {
        Self {
            indent: None,
            declaration: true,
        }
    }

    /// Builder: set the indentation width (`0` means verbatim).
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent = (width > 0).then_some(width);
        self
    }
}

pub(crate) fn to_string(doc: &Document, options: &WriteOptions) -> TreeResult<String> {
    let mut out = XmlOut::new(options);

    if options.declaration {
        let decl = doc.declaration.clone().unwrap_or_default();
        out.declaration(&decl)?;
    }
    for node in &doc.prolog {
        out.node(node)?;
        out.top_level_break();
    }
    out.element(&doc.root)?;
    for node in &doc.epilog {
        out.top_level_break();
        out.node(node)?;
    }

    let bytes = out.writer.into_inner();
    String::from_utf8(bytes).map_err(|e| TreeError::Encoding(e.to_string()))
}

/// Thin wrapper that knows whether whitespace text should be dropped.
struct XmlOut {
    writer: Writer<Vec<u8>>,
    pretty: bool,
}

impl XmlOut {
    fn new(options: &WriteOptions) -> Self {
        let writer = match options.indent {
            Some(width) => Writer::new_with_indent(Vec::new(), b' ', width),
            None => Writer::new(Vec::new()),
        };
        Self {
            writer,
            pretty: options.indent.is_some(),
        }
    }

    fn emit(&mut self, event: Event<'_>) -> TreeResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| TreeError::Write(e.to_string()))
    }

    /// The indenting writer breaks lines itself; verbatim output needs an
    /// explicit newline between top-level items.
    fn top_level_break(&mut self) {
        if !self.pretty {
            self.writer.get_mut().push(b'\n');
        }
    }

    fn declaration(&mut self, decl: &Declaration) -> TreeResult<()> {
        self.emit(Event::Decl(BytesDecl::new(
            &decl.version,
            decl.encoding.as_deref(),
            decl.standalone.as_deref(),
        )))?;
        self.top_level_break();
        Ok(())
    }

    fn element(&mut self, element: &Element) -> TreeResult<()> {
        let mut start = BytesStart::new(element.name.as_str());
        for attr in &element.attributes {
            start.push_attribute((attr.name.as_str(), attr.value.as_str()));
        }

        let children: Vec<&Node> = element
            .children
            .iter()
            .filter(|c| !(self.pretty && c.is_whitespace()))
            .collect();

        if children.is_empty() {
            return self.emit(Event::Empty(start));
        }

        self.emit(Event::Start(start))?;
        for child in children {
            self.node(child)?;
        }
        self.emit(Event::End(BytesEnd::new(element.name.as_str())))
    }

    fn node(&mut self, node: &Node) -> TreeResult<()> {
        match node {
            Node::Element(e) => self.element(e),
            Node::Text(t) => self.emit(Event::Text(BytesText::new(t))),
            Node::CData(t) => self.emit(Event::CData(BytesCData::new(t.as_str()))),
            Node::Comment(t) => self.emit(Event::Comment(BytesText::from_escaped(t.as_str()))),
            Node::ProcessingInstruction { target, data } => {
                let content = if data.is_empty() {
                    target.clone()
                } else {
                    format!("{target} {data}")
                };
                self.emit(Event::PI(BytesPI::new(content)))
            }
            Node::DocType(t) => self.emit(Event::DocType(BytesText::from_escaped(t.as_str()))),
        }
    }
}
