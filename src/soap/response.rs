//! Decoding of `billService` replies.
//!
//! SUNAT and OSE providers answer with either a prefixed envelope
//! (`soap-env:Envelope`, `S:Envelope`, ...) or an unprefixed one. Each
//! shape has its own [`EnvelopeDecoder`]; [`decode_envelope`] tries them in
//! order, and whichever matches is checked for a `Fault` the same way.

use base64ct::{Base64, Encoding};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{SendBillResponse, StatusResponse};
use crate::core::CpeError;

/// Minimal element tree: qualified name split into prefix and local part,
/// concatenated text content and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub prefix: Option<String>,
    pub local: String,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// First child with this local name, any prefix.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.local == local)
    }

    pub fn child_text(&self, local: &str) -> Option<&str> {
        self.child(local).map(|c| c.text.trim())
    }

    /// Parse a document into its root element.
    pub fn parse(xml: &str) -> Result<XmlElement, CpeError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().expand_empty_elements = true;
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            match reader.read_event().map_err(xml_err)? {
                Event::Start(e) => stack.push(element_from(&e)?),
                Event::End(_) => {
                    let Some(done) = stack.pop() else {
                        return Err(CpeError::Xml("unbalanced end tag".into()));
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => return Ok(done),
                    }
                }
                Event::Text(t) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&t.unescape().map_err(xml_err)?);
                    }
                }
                Event::CData(t) => {
                    if let Some(current) = stack.last_mut() {
                        let text = std::str::from_utf8(&t)
                            .map_err(|e| CpeError::Xml(format!("invalid UTF-8: {e}")))?;
                        current.text.push_str(text);
                    }
                }
                Event::Eof => return Err(CpeError::Xml("no root element".into())),
                _ => {}
            }
        }
    }
}

fn element_from(e: &BytesStart<'_>) -> Result<XmlElement, CpeError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|e| CpeError::Xml(format!("invalid UTF-8: {e}")))?
        .to_string();
    let (prefix, local) = match name.split_once(':') {
        Some((p, l)) => (Some(p.to_string()), l.to_string()),
        None => (None, name),
    };
    Ok(XmlElement {
        prefix,
        local,
        ..Default::default()
    })
}

fn xml_err(e: quick_xml::Error) -> CpeError {
    CpeError::Xml(format!("SOAP reply is not well-formed: {e}"))
}

/// One accepted reply shape. Returns the `Body` element when the shape
/// matches, `None` otherwise.
pub trait EnvelopeDecoder {
    fn name(&self) -> &'static str;
    fn body<'a>(&self, root: &'a XmlElement) -> Option<&'a XmlElement>;
}

/// `<x:Envelope><x:Body>` with any namespace prefix.
pub struct NamespacedEnvelope;

impl EnvelopeDecoder for NamespacedEnvelope {
    fn name(&self) -> &'static str {
        "namespaced"
    }

    fn body<'a>(&self, root: &'a XmlElement) -> Option<&'a XmlElement> {
        if root.prefix.is_none() || root.local != "Envelope" {
            return None;
        }
        root.children
            .iter()
            .find(|c| c.prefix.is_some() && c.local == "Body")
    }
}

/// `<Envelope><Body>` without prefixes.
pub struct BareEnvelope;

impl EnvelopeDecoder for BareEnvelope {
    fn name(&self) -> &'static str {
        "bare"
    }

    fn body<'a>(&self, root: &'a XmlElement) -> Option<&'a XmlElement> {
        if root.prefix.is_some() || root.local != "Envelope" {
            return None;
        }
        root.children
            .iter()
            .find(|c| c.prefix.is_none() && c.local == "Body")
    }
}

const DECODERS: &[&(dyn EnvelopeDecoder + Sync)] = &[&NamespacedEnvelope, &BareEnvelope];

/// Decode a reply into the payload element of its body.
///
/// A `Fault` in the body becomes [`CpeError::ProtocolFault`] whichever
/// shape matched.
pub fn decode_envelope(xml: &str) -> Result<XmlElement, CpeError> {
    let root = XmlElement::parse(xml)?;

    for decoder in DECODERS {
        let Some(body) = decoder.body(&root) else {
            continue;
        };
        tracing::trace!(shape = decoder.name(), "reply envelope matched");

        if let Some(fault) = body.child("Fault") {
            return Err(CpeError::ProtocolFault {
                code: fault.child_text("faultcode").unwrap_or_default().to_string(),
                message: fault
                    .child_text("faultstring")
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        return body
            .children
            .first()
            .cloned()
            .ok_or_else(|| CpeError::Xml("empty SOAP body".into()));
    }

    Err(CpeError::Xml(format!(
        "unrecognized reply root element {}",
        root.local
    )))
}

fn expect_payload<'a>(payload: &'a XmlElement, local: &str) -> Result<&'a XmlElement, CpeError> {
    if payload.local == local {
        Ok(payload)
    } else {
        Err(CpeError::Xml(format!(
            "expected {local}, got {}",
            payload.local
        )))
    }
}

fn required<'a>(element: &'a XmlElement, local: &str) -> Result<&'a str, CpeError> {
    element
        .child_text(local)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CpeError::Xml(format!("missing {local} in {}", element.local)))
}

/// Base64 with embedded whitespace, as SUNAT wraps long content.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, CpeError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    Base64::decode_vec(&compact).map_err(|e| CpeError::Xml(format!("invalid base64 content: {e}")))
}

pub fn parse_send_bill(xml: &str) -> Result<SendBillResponse, CpeError> {
    let payload = decode_envelope(xml)?;
    let payload = expect_payload(&payload, "sendBillResponse")?;
    Ok(SendBillResponse {
        application_response: decode_base64(required(payload, "applicationResponse")?)?,
    })
}

pub fn parse_send_summary(xml: &str) -> Result<String, CpeError> {
    let payload = decode_envelope(xml)?;
    let payload = expect_payload(&payload, "sendSummaryResponse")?;
    Ok(required(payload, "ticket")?.to_string())
}

pub fn parse_get_status(xml: &str) -> Result<StatusResponse, CpeError> {
    let payload = decode_envelope(xml)?;
    let payload = expect_payload(&payload, "getStatusResponse")?;
    let status = payload
        .child("status")
        .ok_or_else(|| CpeError::Xml("missing status in getStatusResponse".into()))?;

    let content = match status.child_text("content") {
        Some(text) if !text.is_empty() => Some(decode_base64(text)?),
        _ => None,
    };
    Ok(StatusResponse {
        status_code: required(status, "statusCode")?.to_string(),
        content,
        error: status
            .child_text("error")
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMESPACED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soap-env:Envelope xmlns:soap-env="http://schemas.xmlsoap.org/soap/envelope/">
  <soap-env:Header/>
  <soap-env:Body>
    <br:sendSummaryResponse xmlns:br="http://service.sunat.gob.pe">
      <ticket>1700000000001</ticket>
    </br:sendSummaryResponse>
  </soap-env:Body>
</soap-env:Envelope>"#;

    const BARE: &str = r#"<Envelope><Body><sendSummaryResponse><ticket>1700000000001</ticket></sendSummaryResponse></Body></Envelope>"#;

    #[test]
    fn both_shapes_decode_the_same() {
        assert_eq!(parse_send_summary(NAMESPACED).unwrap(), "1700000000001");
        assert_eq!(parse_send_summary(BARE).unwrap(), "1700000000001");
    }

    #[test]
    fn fault_in_either_shape() {
        let namespaced = r#"<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/"><S:Body><S:Fault><faultcode>S:Client</faultcode><faultstring>El numero de RUC no esta activo</faultstring></S:Fault></S:Body></S:Envelope>"#;
        let bare = "<Envelope><Body><Fault><faultcode>0111</faultcode><faultstring>No tiene el perfil</faultstring></Fault></Body></Envelope>";

        match decode_envelope(namespaced) {
            Err(CpeError::ProtocolFault { code, message }) => {
                assert_eq!(code, "S:Client");
                assert_eq!(message, "El numero de RUC no esta activo");
            }
            other => panic!("expected fault, got {other:?}"),
        }
        assert!(matches!(
            decode_envelope(bare),
            Err(CpeError::ProtocolFault { code, .. }) if code == "0111"
        ));
    }

    #[test]
    fn unknown_root_is_xml_error() {
        assert!(matches!(
            decode_envelope("<html><body>502</body></html>"),
            Err(CpeError::Xml(_))
        ));
        assert!(matches!(decode_envelope("not xml at all"), Err(CpeError::Xml(_))));
    }

    #[test]
    fn wrong_payload_is_xml_error() {
        assert!(matches!(parse_send_bill(BARE), Err(CpeError::Xml(_))));
    }

    #[test]
    fn send_bill_decodes_wrapped_base64() {
        let xml = "<Envelope><Body><sendBillResponse><applicationResponse>UEsD\n  BA==</applicationResponse></sendBillResponse></Body></Envelope>";
        let parsed = parse_send_bill(xml).unwrap();
        assert_eq!(parsed.application_response, b"PK\x03\x04");
    }

    #[test]
    fn status_with_error_and_no_content() {
        let xml = "<Envelope><Body><getStatusResponse><status><statusCode>98</statusCode><content></content><error>En proceso</error></status></getStatusResponse></Body></Envelope>";
        let status = parse_get_status(xml).unwrap();
        assert_eq!(status.status_code, "98");
        assert_eq!(status.content, None);
        assert_eq!(status.error.as_deref(), Some("En proceso"));
    }

    #[test]
    fn element_tree() {
        let root = XmlElement::parse("<a:r xmlns:a=\"urn:a\"><x>1 &amp; 2</x><y/></a:r>").unwrap();
        assert_eq!(root.prefix.as_deref(), Some("a"));
        assert_eq!(root.local, "r");
        assert_eq!(root.child_text("x"), Some("1 & 2"));
        assert_eq!(root.child_text("y"), Some(""));
    }
}
