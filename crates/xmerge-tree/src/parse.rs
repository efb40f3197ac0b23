//! XML parsing into the owned tree, built on `quick-xml`'s pull reader.

use std::path::Path;

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;

use crate::error::{TreeError, TreeResult};
use crate::node::{Attribute, Declaration, Document, Element, Node};

/// Parse a document from a string.
///
/// Text is unescaped. Whitespace-only text inside the root is kept;
/// whitespace between top-level items is dropped.
pub fn parse_str(input: &str) -> TreeResult<Document> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);

    let mut builder = DocumentBuilder::default();

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| TreeError::parse(position, e))?;

        match event {
            Event::Start(e) => {
                let element = start_element(&reader, &e, position)?;
                builder.open.push(element);
            }
            Event::Empty(e) => {
                let element = start_element(&reader, &e, position)?;
                builder.attach(Node::Element(element), position)?;
            }
            Event::End(_) => {
                let element = builder
                    .open
                    .pop()
                    .ok_or_else(|| TreeError::parse(position, "unexpected closing tag"))?;
                builder.attach(Node::Element(element), position)?;
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| TreeError::parse(position, e))?;
                builder.text(Node::Text(text.into_owned()), position)?;
            }
            Event::CData(e) => {
                let text = decode(&reader, &e, position)?;
                builder.text(Node::CData(text), position)?;
            }
            Event::Comment(e) => {
                let text = decode(&reader, &e, position)?;
                builder.attach(Node::Comment(text), position)?;
            }
            Event::PI(e) => {
                let target = decode(&reader, e.target(), position)?;
                let data = decode(&reader, e.content(), position)?;
                builder.attach(
                    Node::ProcessingInstruction {
                        target,
                        data: data.trim_start().to_string(),
                    },
                    position,
                )?;
            }
            Event::DocType(e) => {
                let text = decode(&reader, &e, position)?;
                builder.attach(Node::DocType(text.trim().to_string()), position)?;
            }
            Event::Decl(e) => {
                builder.declaration = Some(declaration(&e, position)?);
            }
            Event::Eof => break,
        }
    }

    builder.finish(reader.buffer_position() as u64)
}

/// Read and parse a document from a file.
pub fn parse_file(path: impl AsRef<Path>) -> TreeResult<Document> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| TreeError::io(path, e))?;
    let input = String::from_utf8(bytes)
        .map_err(|e| TreeError::Encoding(format!("{}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), bytes = input.len(), "parsing document");
    parse_str(&input)
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Accumulates the document while events stream in.
#[derive(Default)]
struct DocumentBuilder {
    declaration: Option<Declaration>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
    /// Elements whose start tag has been read but not their end tag.
    open: Vec<Element>,
}

impl DocumentBuilder {
    /// Attach a finished node to the innermost open element, or to the top
    /// level if none is open.
    fn attach(&mut self, node: Node, position: u64) -> TreeResult<()> {
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(node);
            return Ok(());
        }

        match node {
            Node::Element(element) => {
                if self.root.is_some() {
                    return Err(TreeError::MultipleRoots(element.name));
                }
                self.root = Some(element);
            }
            Node::Text(_) | Node::CData(_) => {
                return Err(TreeError::parse(position, "text outside the root element"));
            }
            other => {
                if self.root.is_some() {
                    self.epilog.push(other);
                } else {
                    self.prolog.push(other);
                }
            }
        }
        Ok(())
    }

    fn text(&mut self, node: Node, position: u64) -> TreeResult<()> {
        if self.open.is_empty() && node.is_whitespace() {
            return Ok(());
        }
        self.attach(node, position)
    }

    fn finish(self, position: u64) -> TreeResult<Document> {
        if let Some(unclosed) = self.open.last() {
            return Err(TreeError::parse(
                position,
                format!("unclosed element <{}>", unclosed.name),
            ));
        }
        let root = self.root.ok_or(TreeError::NoRoot)?;
        Ok(Document {
            declaration: self.declaration,
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn start_element(reader: &Reader<&[u8]>, start: &BytesStart<'_>, position: u64) -> TreeResult<Element> {
    let name = decode(reader, start.name().as_ref(), position)?;
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| TreeError::parse(position, e))?;
        let key = decode(reader, attr.key.as_ref(), position)?;
        let value = attr
            .unescape_value()
            .map_err(|e| TreeError::parse(position, e))?;
        element.attributes.push(Attribute::new(key, value.into_owned()));
    }

    Ok(element)
}

fn declaration(decl: &BytesDecl<'_>, position: u64) -> TreeResult<Declaration> {
    let field = |raw: &[u8]| String::from_utf8_lossy(raw).into_owned();

    let version = decl
        .version()
        .map_err(|e| TreeError::parse(position, e))?;
    let encoding = decl
        .encoding()
        .transpose()
        .map_err(|e| TreeError::parse(position, e))?;
    let standalone = decl
        .standalone()
        .transpose()
        .map_err(|e| TreeError::parse(position, e))?;

    Ok(Declaration {
        version: field(&version),
        encoding: encoding.as_deref().map(field),
        standalone: standalone.as_deref().map(field),
    })
}

fn decode(reader: &Reader<&[u8]>, raw: &[u8], position: u64) -> TreeResult<String> {
    reader
        .decoder()
        .decode(raw)
        .map(|s| s.into_owned())
        .map_err(|e| TreeError::parse(position, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_in_order() {
        let doc = parse_str("<r><a>1</a><b><c>2</c></b><a>3</a></r>").unwrap();
        let names: Vec<&str> = doc.root.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
        assert_eq!(doc.root.text_content(), "123");
    }

    #[test]
    fn keeps_whitespace_text_inside_root() {
        let doc = parse_str("<r>\n  <a/>\n</r>").unwrap();
        assert_eq!(doc.root.children.len(), 3);
        assert!(doc.root.children[0].is_whitespace());
    }

    #[test]
    fn unescapes_text_and_attributes() {
        let doc = parse_str(r#"<r k="a &amp; b">x &lt; y</r>"#).unwrap();
        assert_eq!(doc.root.attribute("k"), Some("a & b"));
        assert_eq!(doc.root.own_text(), "x < y");
    }

    #[test]
    fn reads_declaration_prolog_and_epilog() {
        let input = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n\
                     <!-- head -->\n<r/>\n<!-- tail -->";
        let doc = parse_str(input).unwrap();
        let decl = doc.declaration.unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("UTF-8"));
        assert_eq!(decl.standalone.as_deref(), Some("no"));
        assert_eq!(doc.prolog, vec![Node::Comment(" head ".into())]);
        assert_eq!(doc.epilog, vec![Node::Comment(" tail ".into())]);
    }

    #[test]
    fn keeps_comments_and_cdata_inside_elements() {
        let doc = parse_str("<r><!--Zero or more repetitions:--><a><![CDATA[<raw>]]></a></r>").unwrap();
        assert_eq!(doc.root.children[0], Node::Comment("Zero or more repetitions:".into()));
        let a = doc.root.first_child_named("a").unwrap();
        assert_eq!(a.children, vec![Node::CData("<raw>".into())]);
    }

    #[test]
    fn processing_instruction_split_into_target_and_data() {
        let doc = parse_str("<?style href=\"a.css\"?><r/>").unwrap();
        assert_eq!(
            doc.prolog,
            vec![Node::ProcessingInstruction {
                target: "style".into(),
                data: "href=\"a.css\"".into(),
            }]
        );
    }

    #[test]
    fn mismatched_end_tag_is_a_parse_error() {
        let err = parse_str("<r><a></b></r>").unwrap_err();
        assert!(matches!(err, TreeError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn unclosed_element_is_a_parse_error() {
        let err = parse_str("<r><a>").unwrap_err();
        assert!(matches!(err, TreeError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn empty_input_has_no_root() {
        assert!(matches!(parse_str("").unwrap_err(), TreeError::NoRoot));
        assert!(matches!(parse_str("<!-- only -->").unwrap_err(), TreeError::NoRoot));
    }

    #[test]
    fn second_root_is_rejected() {
        let err = parse_str("<a/><b/>").unwrap_err();
        assert!(matches!(err, TreeError::MultipleRoots(ref name) if name == "b"));
    }

    #[test]
    fn text_outside_root_is_rejected() {
        let err = parse_str("<a/>junk").unwrap_err();
        assert!(matches!(err, TreeError::Parse { .. }));
    }

    #[test]
    fn parse_file_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_file(dir.path().join("missing.xml")).unwrap_err();
        assert!(matches!(err, TreeError::Io { .. }));
    }

    #[test]
    fn parse_file_reads_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.xml");
        std::fs::write(&path, "<r><a>v</a></r>").unwrap();
        let doc = parse_file(&path).unwrap();
        assert_eq!(doc.root.name, "r");
    }

    #[test]
    fn parse_file_rejects_invalid_utf8_as_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.xml");
        std::fs::write(&path, b"<r><a>caf\xe9</a></r>").unwrap();
        let err = parse_file(&path).unwrap_err();
        assert!(matches!(err, TreeError::Encoding(ref m) if m.contains("latin1.xml")));
    }
}
