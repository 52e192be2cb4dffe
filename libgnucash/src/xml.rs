use crate::{GnucashError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use std::fmt;
use std::io::BufRead;

/// XML namespaces used by the GnuCash v2 file format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ns {
    /// Unqualified elements: `gnc-v2`, `price`, `slot`, `gdate`.
    None,
    Gnc,
    Book,
    Cd,
    Cmdty,
    Act,
    Trn,
    Split,
    Price,
    Ts,
    Slot,
}

impl Ns {
    pub fn uri(&self) -> Option<&'static str> {
        match self {
            Ns::None => None,
            Ns::Gnc => Some("http://www.gnucash.org/XML/gnc"),
            Ns::Book => Some("http://www.gnucash.org/XML/book"),
            Ns::Cd => Some("http://www.gnucash.org/XML/cd"),
            Ns::Cmdty => Some("http://www.gnucash.org/XML/cmdty"),
            Ns::Act => Some("http://www.gnucash.org/XML/act"),
            Ns::Trn => Some("http://www.gnucash.org/XML/trn"),
            Ns::Split => Some("http://www.gnucash.org/XML/split"),
            Ns::Price => Some("http://www.gnucash.org/XML/price"),
            Ns::Ts => Some("http://www.gnucash.org/XML/ts"),
            Ns::Slot => Some("http://www.gnucash.org/XML/slot"),
        }
    }

    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            Ns::None => None,
            Ns::Gnc => Some("gnc"),
            Ns::Book => Some("book"),
            Ns::Cd => Some("cd"),
            Ns::Cmdty => Some("cmdty"),
            Ns::Act => Some("act"),
            Ns::Trn => Some("trn"),
            Ns::Split => Some("split"),
            Ns::Price => Some("price"),
            Ns::Ts => Some("ts"),
            Ns::Slot => Some("slot"),
        }
    }
}

/// A qualified element name: namespace plus local name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tag {
    pub ns: Ns,
    pub local: &'static str,
}

impl Tag {
    pub const fn new(ns: Ns, local: &'static str) -> Tag {
        Tag { ns, local }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ns.prefix() {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// One element of a parsed document, namespace already resolved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    namespace: Option<String>,
    prefix: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn open(namespace: Option<String>, start: &BytesStart<'_>) -> Result<Element> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml)?;
            let key = attr.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }
            let local = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml)?.into_owned();
            attributes.push((local, value));
        }

        Ok(Element {
            namespace,
            prefix: start
                .name()
                .prefix()
                .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned()),
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    /// Namespace URI, `None` for unqualified elements.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Local name, without prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as written in the source, e.g. `act:name`.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Attribute value by local name; prefixes on attributes are ignored.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == local)
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, tag: Tag) -> bool {
        self.name == tag.local && self.namespace.as_deref() == tag.ns.uri()
    }

    pub fn child(&self, tag: Tag) -> Option<&Element> {
        self.children.iter().find(|c| c.is(tag))
    }

    pub fn children_tagged(&self, tag: Tag) -> impl Iterator<Item = &Element> {
        self.children.iter().filter(move |c| c.is(tag))
    }

    /// Follows `path` one child at a time, first match at every step.
    pub fn find(&self, path: &[Tag]) -> Option<&Element> {
        path.iter().try_fold(self, |el, tag| el.child(*tag))
    }

    pub fn find_text(&self, path: &[Tag]) -> Option<&str> {
        self.find(path).map(Element::text)
    }

    /// Like [`find`][Element::find], but an absent element is a format error.
    pub fn require(&self, path: &[Tag]) -> Result<&Element> {
        self.find(path).ok_or_else(|| {
            let path = path
                .iter()
                .map(Tag::to_string)
                .collect::<Vec<_>>()
                .join("/");
            crate::format_err(format!(
                "missing element `{}' in `{}'",
                path,
                self.qualified_name()
            ))
        })
    }

    pub fn require_text(&self, path: &[Tag]) -> Result<&str> {
        self.require(path).map(Element::text)
    }
}

fn xml<E: fmt::Display>(e: E) -> GnucashError {
    GnucashError::Xml(e.to_string())
}

fn namespace_of(resolved: ResolveResult<'_>) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(String::from_utf8_lossy(uri).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(GnucashError::Xml(format!(
            "undeclared namespace prefix `{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

/// Deepest element nesting [`read_document`] accepts.
pub const MAX_DEPTH: usize = 256;

/// Reads a whole document into memory and returns its root element.
///
/// Text is kept verbatim. Whitespace-only text of an element that has child
/// elements is dropped.
pub fn read_document<R: BufRead>(input: R) -> Result<Element> {
    let mut reader = NsReader::from_reader(input);
    reader.expand_empty_elements(true);

    let mut buf = Vec::new();
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event_into(&mut buf) {
            Ok((ns, Event::Start(start))) => {
                if root.is_some() {
                    return Err(GnucashError::Xml(
                        "content after the document element".into(),
                    ));
                }
                if open.len() == MAX_DEPTH {
                    return Err(GnucashError::Xml(format!(
                        "elements nested deeper than {}",
                        MAX_DEPTH
                    )));
                }
                open.push(Element::open(namespace_of(ns)?, &start)?);
            }
            Ok((_, Event::Text(text))) => {
                if let Some(top) = open.last_mut() {
                    top.text.push_str(&text.unescape().map_err(xml)?);
                }
            }
            Ok((_, Event::CData(data))) => {
                if let Some(top) = open.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok((_, Event::End(_))) => {
                let mut element = open
                    .pop()
                    .ok_or_else(|| GnucashError::Xml("unbalanced end tag".into()))?;
                if !element.children.is_empty() && element.text.trim().is_empty() {
                    element.text.clear();
                }
                match open.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => return Err(xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if !open.is_empty() {
        return Err(GnucashError::Xml(format!(
            "unexpected end of document inside `{}'",
            open.last().map(Element::qualified_name).unwrap_or_default()
        )));
    }

    root.ok_or_else(|| GnucashError::Xml("empty document".into()))
}
