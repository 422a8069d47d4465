//! Owned, read-only XML tree.
//!
//! `roxmltree` does the well-formedness work; its borrowed tree is copied into
//! [`XmlElement`] values so a [`ParsedDocument`] owns everything it refers to
//! and can move freely between threads. Element and attribute names are stored
//! by local name only, which makes every lookup prefix-agnostic: `fpml:trade`,
//! `ns2:trade` and an unprefixed `trade` in the default namespace all match
//! `"trade"`.
//!
//! DTDs are refused by the parser, so entity declarations (and therefore
//! entity-expansion bombs and external entity references) never get as far as
//! expansion.
//!
//! Nesting depth is checked on the raw token stream before `roxmltree` sees
//! the text. Its tree builder recurses per level, so over-deep input has to be
//! turned away while it is still flat.
use roxmltree::{Children, Node, ParsingOptions};
use xmlparser::{ElementEnd, Token, Tokenizer};

use crate::config::{IngestConfig, MAX_DEPTH_LIMIT};
use crate::error::{IngestError, QueryError};
use crate::path::LocalPath;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// An attribute, keyed by local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

/// One element of the owned tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Local name with any prefix stripped.
    pub name: String,
    /// Namespace URI, when the element is in one.
    pub namespace: Option<String>,
    pub attributes: Vec<XmlAttribute>,
    /// Concatenation of the element's direct text children (including CDATA).
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Direct text, trimmed. Whitespace-only text is treated as absent.
    pub fn text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Child elements with the given local name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// This element followed by all of its descendants, in document order.
    pub fn descendants_and_self(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// All descendants (excluding `self`), in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

/// Pre-order traversal without recursion.
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// A parsed FpML document owned by one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    root: XmlElement,
    byte_len: usize,
    element_count: usize,
}

impl ParsedDocument {
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Local name of the top-level element.
    pub fn root_name(&self) -> &str {
        &self.root.name
    }

    /// Size of the decoded content this document was parsed from.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// First element with the given local name anywhere in the tree.
    pub fn find_first(&self, name: &str) -> Option<&XmlElement> {
        self.root
            .descendants_and_self()
            .find(|element| element.name == name)
    }

    pub fn contains_element(&self, name: &str) -> bool {
        self.find_first(name).is_some()
    }

    /// Elements selected by an already-parsed path.
    pub fn select(&self, path: &LocalPath) -> Vec<&XmlElement> {
        path.select(&self.root)
    }

    /// Scalar value of a path: the selected attribute, or the trimmed direct
    /// text of the first selected element. Absence is `None`.
    pub fn value(&self, path: &LocalPath) -> Option<String> {
        path.first_value(&self.root)
    }

    /// Parse `expression` and evaluate it as a scalar.
    ///
    /// Only a malformed expression is an error; a well-formed path that
    /// matches nothing yields `Ok(None)`.
    pub fn query(&self, expression: &str) -> Result<Option<String>, QueryError> {
        let path = LocalPath::parse(expression)?;
        Ok(self.value(&path))
    }
}

pub(crate) fn parse_xml(bytes: &[u8], cfg: &IngestConfig) -> Result<ParsedDocument, IngestError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|err| IngestError::Parse(format!("content is not valid UTF-8: {err}")))?;

    let max_depth = cfg.max_depth.min(MAX_DEPTH_LIMIT);
    check_depth(text, max_depth)?;

    let options = ParsingOptions {
        allow_dtd: false,
        nodes_limit: cfg.max_nodes,
    };
    let document = roxmltree::Document::parse_with_options(text, options)
        .map_err(|err| IngestError::Parse(err.to_string()))?;

    let (root, element_count) = copy_tree(document.root_element(), max_depth)?;

    Ok(ParsedDocument {
        root,
        byte_len: bytes.len(),
        element_count,
    })
}

/// Track open elements over the token stream and fail as soon as nesting
/// passes `max_depth`. Text the tokenizer cannot read never reaches the tree
/// builder.
fn check_depth(text: &str, max_depth: usize) -> Result<(), IngestError> {
    let mut depth = 0usize;
    for token in Tokenizer::from(text) {
        match token {
            Ok(Token::ElementStart { .. }) => {
                depth += 1;
                if depth > max_depth {
                    tracing::debug!(limit = max_depth, "nesting limit hit while tokenizing");
                    return Err(IngestError::DepthExceeded { limit: max_depth });
                }
            }
            Ok(Token::ElementEnd {
                end: ElementEnd::Close(..) | ElementEnd::Empty,
                ..
            }) => depth = depth.saturating_sub(1),
            Ok(_) => {}
            Err(err) => return Err(IngestError::Parse(err.to_string())),
        }
    }
    Ok(())
}

/// An element whose children are still being copied.
struct OpenElement<'a, 'input> {
    element: XmlElement,
    pending: Children<'a, 'input>,
}

impl<'a, 'input> OpenElement<'a, 'input> {
    fn new(node: Node<'a, 'input>) -> Self {
        let tag = node.tag_name();
        let attributes = node
            .attributes()
            .map(|attr| XmlAttribute {
                name: attr.name().to_string(),
                value: attr.value().to_string(),
            })
            .collect();

        Self {
            element: XmlElement {
                name: tag.name().to_string(),
                namespace: tag.namespace().map(str::to_string),
                attributes,
                text: String::new(),
                children: Vec::new(),
            },
            pending: node.children(),
        }
    }
}

/// Copy the borrowed tree into owned elements, depth-first, on an explicit
/// stack. Returns the root and the number of elements copied.
fn copy_tree(root: Node<'_, '_>, max_depth: usize) -> Result<(XmlElement, usize), IngestError> {
    if max_depth == 0 {
        return Err(IngestError::DepthExceeded { limit: max_depth });
    }
    let mut element_count = 1;
    let mut open = vec![OpenElement::new(root)];

    while let Some(current) = open.last_mut() {
        match current.pending.next() {
            Some(child) if child.is_element() => {
                if open.len() >= max_depth {
                    return Err(IngestError::DepthExceeded { limit: max_depth });
                }
                element_count += 1;
                open.push(OpenElement::new(child));
            }
            Some(child) => {
                if let Some(fragment) = child.text().filter(|_| child.is_text()) {
                    current.element.text.push_str(fragment);
                }
            }
            None => {
                let Some(finished) = open.pop() else { break };
                match open.last_mut() {
                    Some(parent) => parent.element.children.push(finished.element),
                    None => return Ok((finished.element, element_count)),
                }
            }
        }
    }

    Err(IngestError::Parse("document has no root element".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPML_NS: &str = "http://www.fpml.org/FpML-5/confirmation";

    fn parse(xml: &str) -> Result<ParsedDocument, IngestError> {
        parse_xml(xml.as_bytes(), &IngestConfig::default())
    }

    #[test]
    fn strips_namespace_prefixes() {
        let xml = format!(
            r#"<fpml:dataDocument xmlns:fpml="{FPML_NS}">
                 <fpml:trade><fpml:tradeDate>2024-03-01</fpml:tradeDate></fpml:trade>
               </fpml:dataDocument>"#
        );
        let doc = parse(&xml).expect("well-formed");
        assert_eq!(doc.root_name(), "dataDocument");
        assert_eq!(doc.root().namespace.as_deref(), Some(FPML_NS));
        let trade_date = doc.find_first("tradeDate").expect("tradeDate present");
        assert_eq!(trade_date.text(), Some("2024-03-01"));
        assert_eq!(doc.element_count(), 3);
    }

    #[test]
    fn default_and_prefixed_namespaces_look_the_same() {
        let prefixed = parse(&format!(
            r#"<ns2:requestConfirmation xmlns:ns2="{FPML_NS}"><ns2:trade/></ns2:requestConfirmation>"#
        ))
        .unwrap();
        let default = parse(&format!(
            r#"<requestConfirmation xmlns="{FPML_NS}"><trade/></requestConfirmation>"#
        ))
        .unwrap();

        assert_eq!(prefixed.root(), default.root());
    }

    #[test]
    fn attributes_are_keyed_by_local_name() {
        let doc = parse(
            r#"<party xmlns:x="urn:x" id="p1"><partyId x:partyIdScheme="urn:lei">ABC</partyId></party>"#,
        )
        .unwrap();
        assert_eq!(doc.root().attribute("id"), Some("p1"));
        let party_id = doc.find_first("partyId").unwrap();
        assert_eq!(party_id.attribute("partyIdScheme"), Some("urn:lei"));
    }

    #[test]
    fn cdata_counts_as_text() {
        let doc = parse("<a><b><![CDATA[ 5000000 ]]></b></a>").unwrap();
        assert_eq!(doc.find_first("b").unwrap().text(), Some("5000000"));
    }

    #[test]
    fn whitespace_only_text_is_absent() {
        let doc = parse("<a>\n   <b/>\n</a>").unwrap();
        assert_eq!(doc.root().text(), None);
    }

    #[test]
    fn descendants_are_in_document_order() {
        let doc = parse("<r><a><b/><c/></a><d><e/></d></r>").unwrap();
        let names: Vec<&str> = doc
            .root()
            .descendants_and_self()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, ["r", "a", "b", "c", "d", "e"]);

        let below: Vec<&str> = doc.root().descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(below, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn rejects_unclosed_tags() {
        let err = parse("<dataDocument><trade></dataDocument>").unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
    }

    #[test]
    fn rejects_non_utf8_content() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>caf\xE9</a>";
        let err = parse_xml(bytes, &IngestConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::Parse(msg) if msg.contains("UTF-8")));
    }

    #[test]
    fn rejects_entity_expansion_bombs() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE lolz [
  <!ENTITY lol "lol">
  <!ENTITY lol2 "&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;">
  <!ENTITY lol3 "&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;">
]>
<lolz>&lol3;</lolz>"#;
        let err = parse(xml).unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
    }

    #[test]
    fn rejects_external_entities() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE data [ <!ENTITY ext SYSTEM "file:///etc/passwd"> ]>
<dataDocument>&ext;</dataDocument>"#;
        assert!(matches!(parse(xml), Err(IngestError::Parse(_))));
    }

    #[test]
    fn enforces_depth_limit() {
        let cfg = IngestConfig {
            max_depth: 3,
            ..Default::default()
        };
        assert!(parse_xml(b"<a><b><c/></b></a>", &cfg).is_ok());
        let err = parse_xml(b"<a><b><c><d/></c></b></a>", &cfg).unwrap_err();
        assert_eq!(err, IngestError::DepthExceeded { limit: 3 });
    }

    #[test]
    fn deeply_nested_input_is_rejected_before_tree_building() {
        let depth = 50_000;
        let xml = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let err = parse(&xml).unwrap_err();
        assert_eq!(err, IngestError::DepthExceeded { limit: 256 });
    }

    #[test]
    fn unclosed_deep_input_still_hits_the_depth_limit() {
        let xml = "<a>".repeat(100_000);
        assert_eq!(
            parse(&xml).unwrap_err(),
            IngestError::DepthExceeded { limit: 256 }
        );
    }

    #[test]
    fn siblings_do_not_accumulate_depth() {
        let cfg = IngestConfig {
            max_depth: 2,
            ..Default::default()
        };
        let xml = format!("<r>{}</r>", "<leaf/><open>x</open>".repeat(1_000));
        let doc = parse_xml(xml.as_bytes(), &cfg).expect("flat document");
        assert_eq!(doc.element_count(), 2_001);
        assert_eq!(doc.root().children.len(), 2_000);
    }

    #[test]
    fn oversized_depth_setting_is_clamped() {
        let cfg = IngestConfig {
            max_depth: usize::MAX,
            ..Default::default()
        };
        let depth = MAX_DEPTH_LIMIT + 1;
        let xml = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        assert_eq!(
            parse_xml(xml.as_bytes(), &cfg).unwrap_err(),
            IngestError::DepthExceeded {
                limit: MAX_DEPTH_LIMIT
            }
        );
    }

    #[test]
    fn enforces_node_limit() {
        let cfg = IngestConfig {
            max_nodes: 4,
            ..Default::default()
        };
        let err = parse_xml(b"<a><b/><b/><b/><b/><b/><b/></a>", &cfg).unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
    }

    #[test]
    fn leading_bom_is_ignored() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"<dataDocument/>");
        let doc = parse_xml(&bytes, &IngestConfig::default()).expect("bom tolerated");
        assert_eq!(doc.root_name(), "dataDocument");
        assert_eq!(doc.byte_len(), "<dataDocument/>".len());
    }

    #[test]
    fn query_distinguishes_absent_from_malformed() {
        let doc = parse("<a><b>x</b></a>").unwrap();
        assert_eq!(doc.query("//b").unwrap(), Some("x".to_string()));
        assert_eq!(doc.query("//missing").unwrap(), None);
        assert!(doc.query("//b[").is_err());
    }
}
