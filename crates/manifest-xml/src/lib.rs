//! Read manifest XML into an owned element tree using quick-xml.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml: {0}")]
    Xml(String),
    #[error("invalid document: {0}")]
    Invalid(String),
}

/// Read-only view of a node in a parsed document.
///
/// Lookups only ever consider direct children, in document order.
pub trait TreeNode {
    /// Qualified tag name as written in the document.
    fn name(&self) -> &str;
    /// All direct children whose tag equals `tag`.
    fn find_children(&self, tag: &str) -> Vec<&Self>;
    /// Raw (unescaped, untrimmed) attribute value.
    fn attribute(&self, name: &str) -> Option<&str>;
    /// Untrimmed text directly owned by the node, excluding descendants.
    /// Whitespace-only text reads as empty.
    fn text(&self) -> &str;
}

/// One element of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn count(&self) -> usize {
        1 + self.children.iter().map(Element::count).sum::<usize>()
    }
}

impl TreeNode for Element {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_children(&self, tag: &str) -> Vec<&Self> {
        self.children.iter().filter(|child| child.name == tag).collect()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(xml: &str) -> Result<Element, XmlError> {
    // Text runs are kept verbatim; values are trimmed where they are read.
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                open.push(start_element(&e)?);
            }
            Ok(Event::Empty(e)) => {
                let element = start_element(&e)?;
                attach(element, &mut open, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let element = open
                    .pop()
                    .ok_or_else(|| XmlError::Invalid("unbalanced end tag".into()))?;
                attach(element, &mut open, &mut root)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| XmlError::Xml(err.to_string()))?;
                append_text(&text, &mut open)?;
            }
            Ok(Event::CData(e)) => {
                let raw = e.into_inner();
                let text = std::str::from_utf8(&raw)
                    .map_err(|err| XmlError::Xml(format!("invalid UTF-8 in CDATA: {err}")))?;
                append_text(text, &mut open)?;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(XmlError::Xml(err.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if let Some(unclosed) = open.last() {
        return Err(XmlError::Invalid(format!(
            "document ended inside <{}>",
            unclosed.name
        )));
    }
    let root = root.ok_or_else(|| XmlError::Invalid("no root element".into()))?;
    debug!(root = %root.name, elements = root.count(), "parsed xml document");
    Ok(root)
}

fn start_element(event: &BytesStart<'_>) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(event.name().as_ref())
        .map_err(|err| XmlError::Xml(format!("invalid UTF-8 in tag name: {err}")))?
        .to_string();
    let mut attributes = Vec::new();
    for attr in event.attributes() {
        let attr = attr.map_err(|err| XmlError::Xml(err.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| XmlError::Xml(format!("invalid UTF-8 in attribute name: {err}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| XmlError::Xml(err.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(
    mut element: Element,
    open: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), XmlError> {
    if element.text.trim().is_empty() {
        element.text.clear();
    }
    match open.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_some() => Err(XmlError::Invalid(format!(
            "second root element <{}>",
            element.name
        ))),
        None => {
            *root = Some(element);
            Ok(())
        }
    }
}

fn append_text(text: &str, open: &mut [Element]) -> Result<(), XmlError> {
    match open.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(XmlError::Invalid("text outside of root element".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nested_tree() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <!-- platform manifest -->
            <Firmware version=" 1.0 " platform="X">
                <VersionAddr>0x1000</VersionAddr>
                <SignedImage>
                    <PublicKey>abc</PublicKey>
                    <Region><StartAddr>0x0</StartAddr><EndAddr>0x100</EndAddr></Region>
                    <Region/>
                </SignedImage>
            </Firmware>
        "#;
        let root = parse_document(xml).expect("parse xml");
        assert_eq!(root.name(), "Firmware");
        assert_eq!(root.attribute("version"), Some(" 1.0 "));
        assert_eq!(root.attribute("platform"), Some("X"));
        assert_eq!(root.attribute("missing"), None);
        assert_eq!(root.children.len(), 2);

        let addr = root.find_children("VersionAddr");
        assert_eq!(addr.len(), 1);
        assert_eq!(addr[0].text(), "0x1000");

        let image = root.find_children("SignedImage")[0];
        assert_eq!(image.find_children("Region").len(), 2);
        let region = image.find_children("Region")[0];
        assert_eq!(region.find_children("EndAddr")[0].text(), "0x100");
        // direct children only
        assert!(root.find_children("Region").is_empty());
    }

    #[test]
    fn text_is_unescaped_and_joins_cdata() {
        let xml = r#"<Root a="x &amp; y"><Value>A&lt;B<![CDATA[ C&D ]]></Value></Root>"#;
        let root = parse_document(xml).expect("parse xml");
        assert_eq!(root.attribute("a"), Some("x & y"));
        assert_eq!(root.find_children("Value")[0].text(), "A<B C&D ");
        assert_eq!(root.attributes, vec![("a".to_string(), "x & y".to_string())]);
    }

    #[test]
    fn whitespace_around_comments_and_cdata_is_kept() {
        let xml = "<R>\n  <K>key one<!-- c --> two</K>\n  <S>AB <![CDATA[CD]]></S>\n</R>";
        let root = parse_document(xml).expect("parse xml");
        assert_eq!(root.find_children("K")[0].text(), "key one two");
        assert_eq!(root.find_children("S")[0].text(), "AB CD");
        // indentation between child elements is not text
        assert_eq!(root.text(), "");
    }

    #[test]
    fn leaf_text_is_not_trimmed() {
        let root = parse_document("<R><V>\n  0x10\n</V><E>   </E></R>").expect("parse xml");
        assert_eq!(root.find_children("V")[0].text(), "\n  0x10\n");
        assert_eq!(root.find_children("E")[0].text(), "");
    }

    #[test]
    fn mismatched_end_tag_is_rejected() {
        let err = parse_document("<A><B></A>").expect_err("mismatched tags");
        assert!(matches!(err, XmlError::Xml(_)), "{err:?}");
    }

    #[test]
    fn unclosed_document_is_rejected() {
        // reported either by the reader or by the open-element check
        assert!(parse_document("<A><B></B>").is_err());
    }

    #[test]
    fn empty_and_multi_root_documents_are_rejected() {
        let err = parse_document("  <!-- nothing -->  ").expect_err("no root");
        assert!(matches!(err, XmlError::Invalid(_)), "{err:?}");

        let err = parse_document("<A/><B/>").expect_err("two roots");
        assert!(matches!(err, XmlError::Invalid(_)), "{err:?}");
    }
}
