use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::io::Cursor;

use crate::core::CpeError;

pub type XmlResult = Result<String, CpeError>;

fn xml_io(e: std::io::Error) -> CpeError {
    CpeError::Xml(format!("XML write error: {e}"))
}

pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    /// Indented writer, starting with the UTF-8 XML declaration.
    pub fn new() -> Result<Self, CpeError> {
        Self::with_writer(Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2))
    }

    /// Writer without indentation, for wire messages.
    pub fn compact() -> Result<Self, CpeError> {
        Self::with_writer(Writer::new(Cursor::new(Vec::new())))
    }

    fn with_writer(mut writer: Writer<Cursor<Vec<u8>>>) -> Result<Self, CpeError> {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, CpeError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| CpeError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, CpeError> {
        let elem = BytesStart::new(name);
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, CpeError> {
        let values: Vec<Cow<'_, str>> = attrs.iter().map(|(_, v)| escape_attribute(v)).collect();
        let mut elem = BytesStart::new(name);
        for ((k, _), v) in attrs.iter().zip(&values) {
            elem.push_attribute((k.as_bytes(), v.as_bytes()));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, CpeError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// Start tag, text, end tag on one line. An empty `text` still yields
    /// a start/end pair (`<a></a>`), never `<a/>`.
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, CpeError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(escape_text(text))))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, CpeError> {
        self.start_element_with_attrs(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(escape_text(text))))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Write a decimal amount with currencyID attribute.
    pub fn amount_element(
        &mut self,
        name: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<&mut Self, CpeError> {
        self.text_element_with_attrs(name, &format_decimal(amount), &[("currencyID", currency)])
    }

    /// Write a quantity with unitCode attribute.
    pub fn quantity_element(
        &mut self,
        name: &str,
        qty: Decimal,
        unit: &str,
    ) -> Result<&mut Self, CpeError> {
        self.text_element_with_attrs(name, &format_decimal(qty), &[("unitCode", unit)])
    }
}

/// Markup escaping plus `\r` as `&#xD;`, which a parser would otherwise
/// turn into `\n` before the document is digested.
fn escape_text(text: &str) -> Cow<'_, str> {
    let escaped = escape(text);
    if escaped.contains('\r') {
        Cow::Owned(escaped.replace('\r', "&#xD;"))
    } else {
        escaped
    }
}

/// Attribute values also keep tabs and newlines as references; a parser
/// turns literal ones into spaces.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if escaped.contains(['\r', '\n', '\t']) {
        Cow::Owned(
            escaped
                .replace('\r', "&#xD;")
                .replace('\n', "&#xA;")
                .replace('\t', "&#x9;"),
        )
    } else {
        escaped
    }
}

/// Format a Decimal for XML output: at least 2 decimal places,
/// trailing zeros beyond that stripped.
pub fn format_decimal(d: Decimal) -> String {
    let s = d.normalize().to_string();
    if let Some(dot_pos) = s.find('.') {
        let decimals = s.len() - dot_pos - 1;
        if decimals < 2 {
            format!("{s}{}", "0".repeat(2 - decimals))
        } else {
            s
        }
    } else {
        format!("{s}.00")
    }
}
