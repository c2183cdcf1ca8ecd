//! Canonical XML 1.0 (without comments).
//!
//! Covers what signed UBL documents need: the XML declaration, comments,
//! doctype and anything outside the document element are dropped; empty
//! elements are expanded; namespace declarations are rendered only where
//! they change the in-scope set and come first, followed by attributes
//! sorted by namespace URI and local name.
//!
//! Input is read the way an XML 1.0 parser reads it: literal `\r\n` and
//! `\r` in text become `\n`, and literal whitespace in attribute values
//! becomes a space. Character references (`&#xD;`) survive and are
//! rendered back as references.

use std::borrow::Cow;
use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::core::CpeError;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// prefix ("" for the default namespace) -> namespace URI
type Scope = BTreeMap<String, String>;

/// Canonicalizer for a whole document or a detached subtree.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    inherited: Scope,
    exclude: Option<String>,
}

impl Canonicalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespaces in scope at the position the input will occupy.
    /// They are rendered on the apex element.
    pub fn inherit_namespaces<I, P, U>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        for (prefix, uri) in namespaces {
            self.inherited.insert(prefix.into(), uri.into());
        }
        self
    }

    /// Leave out every element with this qualified name, with its subtree.
    pub fn exclude_element(mut self, qname: impl Into<String>) -> Self {
        self.exclude = Some(qname.into());
        self
    }

    pub fn canonicalize(&self, xml: &str) -> Result<String, CpeError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().expand_empty_elements = true;

        let mut out = String::with_capacity(xml.len());
        let mut scopes: Vec<Scope> = Vec::new();
        let mut depth = 0usize;
        let mut skip_from: Option<usize> = None;

        loop {
            match reader.read_event().map_err(xml_err)? {
                Event::Start(e) => {
                    depth += 1;
                    if skip_from.is_some() {
                        continue;
                    }
                    let qname = e.name();
                    let name = utf8(qname.as_ref())?;
                    if self.exclude.as_deref() == Some(name) {
                        skip_from = Some(depth);
                        continue;
                    }

                    let (decls, attrs) = split_attributes(&e)?;
                    let empty = Scope::new();
                    let parent = scopes.last().unwrap_or(&empty);
                    let mut scope = scopes.last().cloned().unwrap_or_else(|| self.inherited.clone());
                    scope.extend(decls);

                    out.push('<');
                    out.push_str(name);
                    for (prefix, uri) in &scope {
                        if parent.get(prefix) == Some(uri) {
                            continue;
                        }
                        if prefix.is_empty() && uri.is_empty() && parent.get(prefix).is_none_or(|u| u.is_empty()) {
                            continue;
                        }
                        if prefix.is_empty() {
                            out.push_str(" xmlns=\"");
                        } else {
                            out.push_str(" xmlns:");
                            out.push_str(prefix);
                            out.push_str("=\"");
                        }
                        escape_attr(uri, &mut out);
                        out.push('"');
                    }

                    let mut attrs: Vec<_> = attrs
                        .into_iter()
                        .map(|(qname, value)| {
                            let (uri, local) = match qname.split_once(':') {
                                Some(("xml", local)) => (XML_NS.to_string(), local.to_string()),
                                Some((prefix, local)) => (
                                    scope.get(prefix).cloned().unwrap_or_default(),
                                    local.to_string(),
                                ),
                                None => (String::new(), qname.clone()),
                            };
                            (uri, local, qname, value)
                        })
                        .collect();
                    attrs.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
                    for (_, _, qname, value) in attrs {
                        out.push(' ');
                        out.push_str(&qname);
                        out.push_str("=\"");
                        escape_attr(&value, &mut out);
                        out.push('"');
                    }
                    out.push('>');
                    scopes.push(scope);
                }
                Event::End(e) => {
                    if let Some(from) = skip_from {
                        if from == depth {
                            skip_from = None;
                        }
                        depth -= 1;
                        continue;
                    }
                    depth = depth.saturating_sub(1);
                    scopes.pop();
                    out.push_str("</");
                    out.push_str(utf8(e.name().as_ref())?);
                    out.push('>');
                }
                Event::Text(e) => {
                    if depth > 0 && skip_from.is_none() {
                        let raw = normalize_line_endings(utf8(&e)?);
                        escape_text(&unescape(&raw).map_err(escape_err)?, &mut out);
                    }
                }
                Event::CData(e) => {
                    if depth > 0 && skip_from.is_none() {
                        escape_text(&normalize_line_endings(utf8(&e)?), &mut out);
                    }
                }
                Event::PI(e) => {
                    if depth > 0 && skip_from.is_none() {
                        out.push_str("<?");
                        out.push_str(utf8(&e)?);
                        out.push_str("?>");
                    }
                }
                Event::Eof => break,
                // Declaration, comments, doctype
                _ => {}
            }
        }

        if depth != 0 {
            return Err(CpeError::Xml("unexpected end of document".into()));
        }
        Ok(out)
    }
}

/// Canonical form of a whole document.
pub fn canonicalize(xml: &str) -> Result<String, CpeError> {
    Canonicalizer::new().canonicalize(xml)
}

/// Namespaces in scope at the first element named `qname`, including its
/// own declarations, sorted by prefix.
pub fn in_scope_namespaces(xml: &str, qname: &str) -> Result<Vec<(String, String)>, CpeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().expand_empty_elements = true;
    let mut scopes: Vec<Scope> = Vec::new();

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => {
                let (decls, _) = split_attributes(&e)?;
                let mut scope = scopes.last().cloned().unwrap_or_default();
                scope.extend(decls);
                if e.name().as_ref() == qname.as_bytes() {
                    return Ok(scope.into_iter().collect());
                }
                scopes.push(scope);
            }
            Event::End(_) => {
                scopes.pop();
            }
            Event::Eof => {
                return Err(CpeError::Xml(format!("element {qname} not found")));
            }
            _ => {}
        }
    }
}

/// Namespace declarations and ordinary attributes, values unescaped.
#[allow(clippy::type_complexity)]
fn split_attributes(
    e: &BytesStart<'_>,
) -> Result<(Vec<(String, String)>, Vec<(String, String)>), CpeError> {
    let mut decls = Vec::new();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| CpeError::Xml(format!("invalid attribute: {err}")))?;
        let key = utf8(attr.key.as_ref())?.to_string();
        let raw = normalize_attribute_value(utf8(&attr.value)?);
        let value = unescape(&raw).map_err(escape_err)?.into_owned();
        if key == "xmlns" {
            decls.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            decls.push((prefix.to_string(), value));
        } else {
            attrs.push((key, value));
        }
    }
    Ok((decls, attrs))
}

/// XML 1.0 end-of-line handling: `\r\n` and lone `\r` become `\n`.
fn normalize_line_endings(s: &str) -> Cow<'_, str> {
    if s.contains('\r') {
        Cow::Owned(s.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(s)
    }
}

/// Attribute-value normalization for CDATA attributes, before references
/// are expanded.
fn normalize_attribute_value(s: &str) -> String {
    normalize_line_endings(s).replace(['\t', '\n'], " ")
}

fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, CpeError> {
    std::str::from_utf8(bytes).map_err(|e| CpeError::Xml(format!("invalid UTF-8: {e}")))
}

fn xml_err(e: quick_xml::Error) -> CpeError {
    CpeError::Xml(format!("XML parse error: {e}"))
}

fn escape_err(e: quick_xml::escape::EscapeError) -> CpeError {
    CpeError::Xml(format!("XML parse error: {e}"))
}
