//! Outgoing SOAP 1.1 messages for SUNAT's `billService`.

use base64ct::{Base64, Encoding};

use crate::core::CpeError;
use crate::ubl::xml_utils::XmlWriter;

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
pub const SERVICE_NS: &str = "http://service.sunat.gob.pe";

/// A `billService` operation with its arguments.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    SendBill { file_name: &'a str, zip: &'a [u8] },
    SendSummary { file_name: &'a str, zip: &'a [u8] },
    GetStatus { ticket: &'a str },
}

impl Operation<'_> {
    /// Local name of the request element; the reply is `{name}Response`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendBill { .. } => "sendBill",
            Self::SendSummary { .. } => "sendSummary",
            Self::GetStatus { .. } => "getStatus",
        }
    }
}

/// Serialize `operation` in an envelope whose header carries a WS-Security
/// `UsernameToken` with the plaintext SOL credentials.
pub fn build_envelope(
    operation: &Operation<'_>,
    username: &str,
    password: &str,
) -> Result<String, CpeError> {
    let mut w = XmlWriter::compact()?;

    w.start_element_with_attrs("soap:Envelope", &[("xmlns:soap", SOAP_ENV_NS)])?;

    w.start_element("soap:Header")?;
    w.start_element_with_attrs("wsse:Security", &[("xmlns:wsse", WSSE_NS)])?;
    w.start_element("wsse:UsernameToken")?;
    w.text_element("wsse:Username", username)?;
    w.text_element("wsse:Password", password)?;
    w.end_element("wsse:UsernameToken")?;
    w.end_element("wsse:Security")?;
    w.end_element("soap:Header")?;

    w.start_element("soap:Body")?;
    let element = format!("ser:{}", operation.name());
    w.start_element_with_attrs(&element, &[("xmlns:ser", SERVICE_NS)])?;
    match operation {
        Operation::SendBill { file_name, zip } | Operation::SendSummary { file_name, zip } => {
            w.text_element("fileName", file_name)?;
            w.text_element("contentFile", &Base64::encode_string(zip))?;
        }
        Operation::GetStatus { ticket } => {
            w.text_element("ticket", ticket)?;
        }
    }
    w.end_element(&element)?;
    w.end_element("soap:Body")?;

    w.end_element("soap:Envelope")?;
    w.into_string()
}
