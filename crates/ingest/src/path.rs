//! A deliberately small, namespace-agnostic path language.
//!
//! Supported syntax:
//!
//! | Form | Meaning |
//! |------|---------|
//! | `/name` | root element (first step) or child elements (later steps) |
//! | `//name` | descendant elements (descendant-or-self on the first step) |
//! | `*` | any element name |
//! | `[n]` | keep the n-th (1-based) element of the step's result |
//! | `[@attr='v']` | keep elements whose attribute `attr` equals `v` |
//! | `/@attr` | final step only: select an attribute value |
//!
//! All names are local names. Positional predicates index the whole result of
//! the step in document order, so `//party[2]` is the second `party` element
//! of the document regardless of nesting. That differs from XPath, where the
//! position is relative to each parent.
//!
//! ```rust
//! use ingest::LocalPath;
//!
//! let path = LocalPath::parse("//party[1]/partyId[@partyIdScheme='lei']").unwrap();
//! assert_eq!(path.to_string(), "//party[1]/partyId[@partyIdScheme='lei']");
//! assert!(LocalPath::parse("party").is_err());
//! ```
use std::collections::HashSet;
use std::fmt;

use crate::document::XmlElement;
use crate::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Local(String),
}

impl NameTest {
    fn matches(&self, element: &XmlElement) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Local(name) => element.name == *name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    AttributeEquals { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

/// A parsed path expression. Parse once, evaluate against many documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPath {
    steps: Vec<Step>,
    attribute: Option<String>,
}

impl LocalPath {
    pub fn parse(expression: &str) -> Result<Self, QueryError> {
        Parser {
            source: expression,
            rest: expression.trim(),
        }
        .parse()
    }

    /// Elements matched by this path, starting from the document root.
    pub fn select<'a>(&self, root: &'a XmlElement) -> Vec<&'a XmlElement> {
        let mut context: Vec<&'a XmlElement> = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            let mut matched: Vec<&'a XmlElement> = Vec::new();
            let mut seen: HashSet<*const XmlElement> = HashSet::new();
            let mut push = |element: &'a XmlElement| {
                if step.test.matches(element) && seen.insert(element as *const XmlElement) {
                    matched.push(element);
                }
            };

            if index == 0 {
                match step.axis {
                    Axis::Child => push(root),
                    Axis::Descendant => root.descendants_and_self().for_each(&mut push),
                }
            } else {
                for parent in context.iter().copied() {
                    match step.axis {
                        Axis::Child => parent.children.iter().for_each(&mut push),
                        Axis::Descendant => parent.descendants().for_each(&mut push),
                    }
                }
            }

            for predicate in &step.predicates {
                matched = apply_predicate(predicate, matched);
            }
            if matched.is_empty() {
                return matched;
            }
            context = matched;
        }

        context
    }

    /// Scalar value: the selected attribute of the first element carrying it,
    /// or the trimmed direct text of the first selected element.
    pub fn first_value(&self, root: &XmlElement) -> Option<String> {
        let selected = self.select(root);
        match &self.attribute {
            Some(attribute) => selected
                .iter()
                .find_map(|element| element.attribute(attribute))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            None => selected
                .first()
                .and_then(|element| element.text())
                .map(str::to_string),
        }
    }
}

fn apply_predicate<'a>(predicate: &Predicate, elements: Vec<&'a XmlElement>) -> Vec<&'a XmlElement> {
    match predicate {
        Predicate::Position(position) => elements
            .get(position - 1)
            .map(|element| vec![*element])
            .unwrap_or_default(),
        Predicate::AttributeEquals { name, value } => elements
            .into_iter()
            .filter(|element| element.attribute(name) == Some(value.as_str()))
            .collect(),
    }
}

struct Parser<'a> {
    source: &'a str,
    rest: &'a str,
}

impl<'a> Parser<'a> {
    fn parse(mut self) -> Result<LocalPath, QueryError> {
        if self.rest.is_empty() {
            return Err(self.error("empty expression"));
        }
        if !self.rest.starts_with('/') {
            return Err(self.error("path must start with `/` or `//`"));
        }

        let mut steps = Vec::new();
        let mut attribute = None;

        while !self.rest.is_empty() {
            if attribute.is_some() {
                return Err(self.error("attribute selection must be the final step"));
            }

            let axis = if let Some(rest) = self.rest.strip_prefix("//") {
                self.rest = rest;
                Axis::Descendant
            } else if let Some(rest) = self.rest.strip_prefix('/') {
                self.rest = rest;
                Axis::Child
            } else {
                return Err(self.error("expected `/` between steps"));
            };

            if let Some(rest) = self.rest.strip_prefix('@') {
                self.rest = rest;
                if axis == Axis::Descendant || steps.is_empty() {
                    return Err(self.error("attribute selection needs an element step"));
                }
                attribute = Some(self.name()?);
                continue;
            }

            let name = self.name()?;
            let test = if name == "*" {
                NameTest::Any
            } else {
                NameTest::Local(name)
            };

            let mut predicates = Vec::new();
            while self.rest.starts_with('[') {
                predicates.push(self.predicate()?);
            }

            steps.push(Step {
                axis,
                test,
                predicates,
            });
        }

        if steps.is_empty() {
            return Err(self.error("no element steps"));
        }

        Ok(LocalPath { steps, attribute })
    }

    fn name(&mut self) -> Result<String, QueryError> {
        if let Some(rest) = self.rest.strip_prefix('*') {
            self.rest = rest;
            return Ok("*".to_string());
        }
        let end = self
            .rest
            .find(|c: char| !is_name_char(c))
            .unwrap_or(self.rest.len());
        let (name, rest) = self.rest.split_at(end);
        if name.is_empty() {
            return Err(self.error("expected a name"));
        }
        if rest.starts_with(':') {
            return Err(self.error("prefixed names are not supported; use local names"));
        }
        self.rest = rest;
        Ok(name.to_string())
    }

    fn predicate(&mut self) -> Result<Predicate, QueryError> {
        // Find the closing bracket outside of quotes.
        let mut quote = None;
        let mut close = None;
        for (offset, c) in self.rest.char_indices().skip(1) {
            match (quote, c) {
                (None, '\'' | '"') => quote = Some(c),
                (Some(q), _) if q == c => quote = None,
                (None, ']') => {
                    close = Some(offset);
                    break;
                }
                _ => {}
            }
        }
        let close = close.ok_or_else(|| self.error("unterminated predicate"))?;
        let body = self.rest[1..close].trim();
        self.rest = &self.rest[close + 1..];

        if let Some(attr) = body.strip_prefix('@') {
            let (name, value) = attr
                .split_once('=')
                .ok_or_else(|| self.error("attribute predicate needs `=`"))?;
            let name = name.trim();
            if name.is_empty() || !name.chars().all(is_name_char) {
                return Err(self.error("invalid attribute name in predicate"));
            }
            let value = value.trim();
            let unquoted = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                .ok_or_else(|| self.error("attribute predicate value must be quoted"))?;
            return Ok(Predicate::AttributeEquals {
                name: name.to_string(),
                value: unquoted.to_string(),
            });
        }

        match body.parse::<usize>() {
            Ok(0) => Err(self.error("positions are 1-based")),
            Ok(position) => Ok(Predicate::Position(position)),
            Err(_) => Err(self.error("unsupported predicate")),
        }
    }

    fn error(&self, reason: &'static str) -> QueryError {
        QueryError::malformed(self.source, reason)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

impl fmt::Display for LocalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            f.write_str(match step.axis {
                Axis::Child => "/",
                Axis::Descendant => "//",
            })?;
            match &step.test {
                NameTest::Any => f.write_str("*")?,
                NameTest::Local(name) => f.write_str(name)?,
            }
            for predicate in &step.predicates {
                match predicate {
                    Predicate::Position(n) => write!(f, "[{n}]")?,
                    Predicate::AttributeEquals { name, value } => {
                        write!(f, "[@{name}='{value}']")?
                    }
                }
            }
        }
        if let Some(attribute) = &self.attribute {
            write!(f, "/@{attribute}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use crate::document::parse_xml;

    const DOC: &str = r#"
<dataDocument xmlns="http://www.fpml.org/FpML-5/confirmation">
  <trade>
    <tradeHeader>
      <partyTradeIdentifier>
        <tradeId tradeIdScheme="urn:bank-a">TRD-1</tradeId>
      </partyTradeIdentifier>
      <partyTradeIdentifier>
        <tradeId tradeIdScheme="urn:bank-b">TRD-2</tradeId>
      </partyTradeIdentifier>
      <tradeDate>2024-03-01</tradeDate>
    </tradeHeader>
  </trade>
  <party id="partyA">
    <partyId partyIdScheme="urn:bic">BANKAAAA</partyId>
    <partyId partyIdScheme="urn:lei">LEI-A</partyId>
  </party>
  <party id="partyB">
    <partyId partyIdScheme="urn:lei">LEI-B</partyId>
  </party>
</dataDocument>"#;

    fn root() -> XmlElement {
        parse_xml(DOC.as_bytes(), &IngestConfig::default())
            .expect("fixture parses")
            .root()
            .clone()
    }

    fn value(expression: &str) -> Option<String> {
        LocalPath::parse(expression).unwrap().first_value(&root())
    }

    #[test]
    fn root_step_matches_only_the_root() {
        let root = root();
        let path = LocalPath::parse("/*").unwrap();
        let selected = path.select(&root);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "dataDocument");

        assert!(LocalPath::parse("/trade").unwrap().select(&root).is_empty());
    }

    #[test]
    fn descendant_step_searches_everywhere() {
        assert_eq!(value("//tradeDate").as_deref(), Some("2024-03-01"));
        assert_eq!(value("//trade/tradeHeader/tradeDate").as_deref(), Some("2024-03-01"));
        assert_eq!(value("/dataDocument//tradeDate").as_deref(), Some("2024-03-01"));
        assert_eq!(value("//dataDocument/trade//tradeId").as_deref(), Some("TRD-1"));
    }

    #[test]
    fn positions_index_document_order() {
        assert_eq!(value("//tradeId[2]").as_deref(), Some("TRD-2"));
        assert_eq!(value("//party[2]/partyId").as_deref(), Some("LEI-B"));
        assert_eq!(value("//party[3]/partyId"), None);
    }

    #[test]
    fn attribute_predicates_filter_by_value() {
        assert_eq!(
            value("//party[1]/partyId[@partyIdScheme='urn:lei']").as_deref(),
            Some("LEI-A")
        );
        assert_eq!(
            value(r#"//tradeId[@tradeIdScheme="urn:bank-b"]"#).as_deref(),
            Some("TRD-2")
        );
        assert_eq!(value("//party[2]/partyId[@partyIdScheme='urn:bic']"), None);
    }

    #[test]
    fn trailing_attribute_selects_values() {
        assert_eq!(value("//party/@id").as_deref(), Some("partyA"));
        assert_eq!(value("//party[2]/@id").as_deref(), Some("partyB"));
        assert_eq!(value("//tradeId/@missing"), None);
    }

    #[test]
    fn nested_descendant_steps_do_not_duplicate() {
        let xml = "<r><a><a><b/></a></a></r>";
        let doc = parse_xml(xml.as_bytes(), &IngestConfig::default()).unwrap();
        let path = LocalPath::parse("//a//b").unwrap();
        assert_eq!(doc.select(&path).len(), 1);
    }

    #[test]
    fn malformed_expressions_are_errors() {
        for expression in [
            "",
            "trade",
            "//",
            "//trade[",
            "//trade[0]",
            "//trade[last()]",
            "//trade[@id]",
            "//trade[@id=unquoted]",
            "//@id",
            "/@id",
            "//party/@id/partyId",
            "//fpml:trade",
            "//trade]",
        ] {
            assert!(
                LocalPath::parse(expression).is_err(),
                "`{expression}` should be rejected"
            );
        }
    }

    #[test]
    fn quoted_brackets_inside_predicates() {
        let xml = r#"<r><x k="a]b">hit</x></r>"#;
        let doc = parse_xml(xml.as_bytes(), &IngestConfig::default()).unwrap();
        assert_eq!(
            doc.query("//x[@k='a]b']").unwrap().as_deref(),
            Some("hit")
        );
    }

    #[test]
    fn display_round_trips() {
        for expression in [
            "/*",
            "//tradeId[@tradeIdScheme='urn:x'][1]",
            "//party[2]/partyId/@partyIdScheme",
        ] {
            let path = LocalPath::parse(expression).unwrap();
            assert_eq!(path.to_string(), expression);
            assert_eq!(LocalPath::parse(&path.to_string()).unwrap(), path);
        }
    }
}
