//! A small namespace-aware XML tree with path queries.
//!
//! Multistatus responses are read into a [`Document`] and queried with
//! [`NodePath`] expressions such as `//d:response`, `d:href` or
//! `.//d:resourcetype/c:calendar`. Prefixes are fixed: `d` is `DAV:`, `c`
//! is CalDAV and `cs` is the CalendarServer namespace. An unprefixed name
//! matches elements in no namespace, `*` matches any element.

use std::collections::HashSet;

use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;

use crate::error::{CalDavError, CalDavResult};

/// DAV namespace
pub const DAV_NS: &str = "DAV:";
/// CalDAV namespace
pub const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";
/// CalendarServer namespace (for Apple servers)
pub const CS_NS: &str = "http://calendarserver.org/ns/";

/// Maps a query prefix to its namespace URI.
fn namespace_for_prefix(prefix: &str) -> Option<&'static str> {
    match prefix {
        "d" => Some(DAV_NS),
        "c" => Some(CALDAV_NS),
        "cs" => Some(CS_NS),
        _ => None,
    }
}

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    namespace: Option<String>,
    local_name: String,
    children: Vec<Node>,
}

impl Element {
    fn new(namespace: Option<String>, local_name: String) -> Self {
        Self {
            namespace,
            local_name,
            children: Vec::new(),
        }
    }

    /// Returns the namespace URI, if the element is in one.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the local (unprefixed) name.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Iterates over the child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Returns the concatenated text of this element and all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Selects all elements matching `path`, with this element as context.
    ///
    /// Absolute paths are evaluated as if this element were the document root.
    pub fn select(&self, path: &NodePath) -> Vec<&Element> {
        let start = match path.anchor {
            Anchor::Root => Context::Document(self),
            Anchor::Current => Context::Element(self),
        };
        path.evaluate(start)
    }

    /// Selects the first element matching `path`.
    pub fn select_first(&self, path: &NodePath) -> Option<&Element> {
        self.select(path).into_iter().next()
    }

    fn matches(&self, test: &NameTest) -> bool {
        match test {
            NameTest::Any => true,
            NameTest::Name {
                namespace,
                local_name,
            } => self.local_name == *local_name && self.namespace.as_deref() == *namespace,
        }
    }

    fn push_descendants<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            out.push(child);
            child.push_descendants(out);
        }
    }
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Parses an XML document.
    ///
    /// Character and entity references are expanded, CDATA sections become
    /// plain text and whitespace-only text between elements is dropped.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidXml`](crate::error::CalDavErrorCode::InvalidXml)
    /// error if the input is not a well-formed document.
    pub fn parse(xml: &str) -> CalDavResult<Self> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_resolved_event()? {
                (ns, Event::Start(e)) => {
                    let element = Element::new(
                        resolved_namespace(ns),
                        String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                    );
                    stack.push(element);
                }
                (ns, Event::Empty(e)) => {
                    let element = Element::new(
                        resolved_namespace(ns),
                        String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                    );
                    attach(&mut stack, &mut root, element)?;
                }
                (_, Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| CalDavError::invalid_xml("unexpected closing tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                (_, Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|err| CalDavError::invalid_xml(format!("bad text content: {}", err)))?;
                    push_text(&mut stack, &text);
                }
                (_, Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    push_text(&mut stack, &text);
                }
                (_, Event::Eof) => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(CalDavError::invalid_xml("unexpected end of document"));
        }

        root.map(|root| Self { root })
            .ok_or_else(|| CalDavError::invalid_xml("document has no root element"))
    }

    /// Returns the root element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Selects all elements matching `path`, in document order.
    ///
    /// Relative paths are evaluated from the document node, so
    /// `d:multistatus/d:response` and `/d:multistatus/d:response` agree.
    pub fn select(&self, path: &NodePath) -> Vec<&Element> {
        path.evaluate(Context::Document(&self.root))
    }

    /// Selects the first element matching `path`.
    pub fn select_first(&self, path: &NodePath) -> Option<&Element> {
        self.select(path).into_iter().next()
    }
}

fn resolved_namespace(ns: ResolveResult<'_>) -> Option<String> {
    match ns {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> CalDavResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(CalDavError::invalid_xml("multiple root elements"));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) {
    if text.trim().is_empty() {
        return;
    }
    // Text outside the root element is ignored
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Text(text.to_string()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Root,
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Name {
        namespace: Option<&'static str>,
        local_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
}

/// Where a step starts: the virtual document node or an element.
#[derive(Clone, Copy)]
enum Context<'a> {
    Document(&'a Element),
    Element(&'a Element),
}

/// A compiled path expression.
///
/// Supported syntax is the subset of XPath used against multistatus
/// documents: `/` and `//` separators, an optional leading `.` and name
/// tests of the form `prefix:name`, `name` or `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    anchor: Anchor,
    steps: Vec<Step>,
}

impl NodePath {
    /// Compiles a path expression.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidXml`](crate::error::CalDavErrorCode::InvalidXml)
    /// error for empty paths, empty steps and unknown prefixes.
    pub fn parse(expr: &str) -> CalDavResult<Self> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(CalDavError::invalid_xml("empty path expression"));
        }

        let (anchor, rest) = if let Some(rest) = expr.strip_prefix('.') {
            if rest.is_empty() {
                return Err(CalDavError::invalid_xml(format!(
                    "path `{}` selects no element",
                    expr
                )));
            }
            (Anchor::Current, rest)
        } else if expr.starts_with('/') {
            (Anchor::Root, expr)
        } else {
            (Anchor::Current, expr)
        };

        // A leading single `/` is a plain child step from the anchor
        let mut axis = Axis::Child;
        let rest = if let Some(rest) = rest.strip_prefix("//") {
            axis = Axis::Descendant;
            rest
        } else {
            rest.strip_prefix('/').unwrap_or(rest)
        };

        let mut steps = Vec::new();
        for token in rest.split('/') {
            if token.is_empty() {
                if axis == Axis::Descendant {
                    return Err(CalDavError::invalid_xml(format!(
                        "invalid path expression `{}`",
                        expr
                    )));
                }
                axis = Axis::Descendant;
                continue;
            }
            steps.push(Step {
                axis,
                test: parse_name_test(token, expr)?,
            });
            axis = Axis::Child;
        }

        if axis == Axis::Descendant || steps.is_empty() {
            return Err(CalDavError::invalid_xml(format!(
                "path `{}` ends without a name",
                expr
            )));
        }

        Ok(Self { anchor, steps })
    }

    fn evaluate<'a>(&self, start: Context<'a>) -> Vec<&'a Element> {
        let mut contexts = vec![start];
        let mut selected: Vec<&'a Element> = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            selected = Vec::new();
            // Overlapping descendant scans from nested contexts reach the same
            // element more than once
            let mut seen: HashSet<*const Element> = HashSet::new();
            let dedup = contexts.len() > 1 && step.axis == Axis::Descendant;

            for &context in &contexts {
                let mut candidates = Vec::new();
                match (step.axis, context) {
                    (Axis::Child, Context::Document(root)) => candidates.push(root),
                    (Axis::Child, Context::Element(el)) => candidates.extend(el.child_elements()),
                    (Axis::Descendant, Context::Document(root)) => {
                        candidates.push(root);
                        root.push_descendants(&mut candidates);
                    }
                    (Axis::Descendant, Context::Element(el)) => el.push_descendants(&mut candidates),
                }
                for candidate in candidates {
                    if !candidate.matches(&step.test) {
                        continue;
                    }
                    if dedup && !seen.insert(candidate as *const Element) {
                        continue;
                    }
                    selected.push(candidate);
                }
            }
            if index + 1 < self.steps.len() {
                contexts = selected.iter().map(|el| Context::Element(*el)).collect();
            }
        }

        selected
    }
}

fn parse_name_test(token: &str, expr: &str) -> CalDavResult<NameTest> {
    if token == "*" {
        return Ok(NameTest::Any);
    }
    match token.split_once(':') {
        Some((prefix, local)) => {
            let namespace = namespace_for_prefix(prefix).ok_or_else(|| {
                CalDavError::invalid_xml(format!(
                    "unknown namespace prefix `{}` in `{}`",
                    prefix, expr
                ))
            })?;
            if local.is_empty() {
                return Err(CalDavError::invalid_xml(format!(
                    "invalid path expression `{}`",
                    expr
                )));
            }
            Ok(NameTest::Name {
                namespace: Some(namespace),
                local_name: local.to_string(),
            })
        }
        None => Ok(NameTest::Name {
            namespace: None,
            local_name: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalDavErrorCode;

    const MULTISTATUS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/calendars/user/work/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/><c:calendar/></d:resourcetype>
        <d:href>/nested/</d:href>
      </d:prop>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/calendars/user/contacts/</d:href>
  </d:response>
</d:multistatus>"#;

    fn path(expr: &str) -> NodePath {
        NodePath::parse(expr).unwrap()
    }

    mod parsing {
        use super::*;

        #[test]
        fn resolves_namespaces() {
            let doc = Document::parse(MULTISTATUS).unwrap();
            assert_eq!(doc.root().local_name(), "multistatus");
            assert_eq!(doc.root().namespace(), Some(DAV_NS));
        }

        #[test]
        fn default_namespace_is_resolved() {
            let doc = Document::parse(r#"<multistatus xmlns="DAV:"><response/></multistatus>"#).unwrap();
            assert_eq!(doc.root().namespace(), Some(DAV_NS));
            assert_eq!(doc.select(&path("//d:response")).len(), 1);
        }

        #[test]
        fn prefix_in_document_does_not_matter() {
            let doc = Document::parse(
                r#"<D:multistatus xmlns:D="DAV:" xmlns:CAL="urn:ietf:params:xml:ns:caldav"><D:response><CAL:calendar-data>x</CAL:calendar-data></D:response></D:multistatus>"#,
            )
            .unwrap();
            assert_eq!(doc.select(&path("//d:response/c:calendar-data")).len(), 1);
        }

        #[test]
        fn entities_and_cdata() {
            let doc = Document::parse(
                "<a><b>Tom &amp; Jerry &lt;3 &#65;</b><c><![CDATA[BEGIN:VCALENDAR & <raw>]]></c></a>",
            )
            .unwrap();
            assert_eq!(doc.select_first(&path("//b")).unwrap().text(), "Tom & Jerry <3 A");
            assert_eq!(
                doc.select_first(&path("//c")).unwrap().text(),
                "BEGIN:VCALENDAR & <raw>"
            );
        }

        #[test]
        fn malformed_is_invalid_xml() {
            for xml in ["", "not xml at all", "<a><b></a>", "<a>", "<a/><b/>"] {
                let err = Document::parse(xml).unwrap_err();
                assert_eq!(err.code(), CalDavErrorCode::InvalidXml, "input: {xml:?}");
            }
        }

        #[test]
        fn text_concatenates_descendants() {
            let doc = Document::parse("<a>one<b>two</b>three</a>").unwrap();
            assert_eq!(doc.root().text(), "onetwothree");
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn descendant_from_root() {
            let doc = Document::parse(MULTISTATUS).unwrap();
            let hrefs: Vec<String> = doc.select(&path("//d:href")).iter().map(|e| e.text()).collect();
            assert_eq!(
                hrefs,
                vec!["/calendars/user/work/", "/nested/", "/calendars/user/contacts/"]
            );
        }

        #[test]
        fn child_from_context() {
            let doc = Document::parse(MULTISTATUS).unwrap();
            let responses = doc.select(&path("//d:response"));
            assert_eq!(responses.len(), 2);

            let own = responses[0].select_first(&path("d:href")).unwrap();
            assert_eq!(own.text(), "/calendars/user/work/");
        }

        #[test]
        fn nested_relative_path() {
            let doc = Document::parse(MULTISTATUS).unwrap();
            let responses = doc.select(&path("//d:response"));
            let calendar = path(".//d:resourcetype/c:calendar");

            assert!(responses[0].select_first(&calendar).is_some());
            assert!(responses[1].select_first(&calendar).is_none());
        }

        #[test]
        fn absolute_child_path() {
            let doc = Document::parse(MULTISTATUS).unwrap();
            assert_eq!(doc.select(&path("/d:multistatus/d:response/d:href")).len(), 2);
            assert!(doc.select(&path("/d:response")).is_empty());
        }

        #[test]
        fn namespace_must_match() {
            let doc = Document::parse(MULTISTATUS).unwrap();
            assert!(doc.select(&path("//c:href")).is_empty());
            assert!(doc.select(&path("//href")).is_empty());
        }

        #[test]
        fn nested_descendant_scans_select_once() {
            let doc = Document::parse("<a><a><b>1</b></a><b>2</b></a>").unwrap();
            let found: Vec<String> = doc.select(&path("//a//b")).iter().map(|e| e.text()).collect();
            assert_eq!(found, vec!["1", "2"]);
        }

        #[test]
        fn wildcard() {
            let doc = Document::parse(MULTISTATUS).unwrap();
            let children = doc.select(&path("/d:multistatus/*"));
            assert_eq!(children.len(), 2);
        }
    }

    mod path_syntax {
        use super::*;

        #[test]
        fn rejects_bad_expressions() {
            for expr in ["", ".", "//", "a//", "a///b", "x:foo", "d:"] {
                let err = NodePath::parse(expr).unwrap_err();
                assert_eq!(err.code(), CalDavErrorCode::InvalidXml, "expr: {expr:?}");
            }
        }

        #[test]
        fn accepts_supported_forms() {
            for expr in [
                "//d:href",
                "/d:multistatus",
                "d:href",
                "./d:href",
                ".//cs:getctag",
                "//d:current-user-principal/d:href",
                "//c:calendar-home-set//d:href",
            ] {
                assert!(NodePath::parse(expr).is_ok(), "expr: {expr:?}");
            }
        }
    }
}
