//! SUNAT `billService` transport: SOAP 1.1 with a WS-Security
//! `UsernameToken` header, over HTTPS.
//!
//! | Operation     | Used for                          | Reply                        |
//! |---------------|-----------------------------------|------------------------------|
//! | `sendBill`    | facturas, notes (synchronous)     | zipped CDR                   |
//! | `sendSummary` | boletas and summaries (ticketed)  | ticket                       |
//! | `getStatus`   | polling a ticket                  | status code, zipped CDR      |
//!
//! [`BillService`] is the seam the submission orchestrator depends on;
//! [`SoapClient`] is the HTTP implementation.

mod cdr;
mod client;
mod envelope;
mod response;

use std::future::Future;

pub use cdr::{parse_cdr_xml, read_cdr};
pub use client::{Credentials, SoapClient};
pub use envelope::{Operation, SERVICE_NS, SOAP_ENV_NS, WSSE_NS, build_envelope};
pub use response::{
    BareEnvelope, EnvelopeDecoder, NamespacedEnvelope, XmlElement, decode_envelope,
    parse_get_status, parse_send_bill, parse_send_summary,
};

use crate::core::CpeError;

/// Reply to `sendBill`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendBillResponse {
    /// Zipped ApplicationResponse (CDR), already base64-decoded.
    pub application_response: Vec<u8>,
}

/// Reply to `getStatus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    /// `0` processed, `98` in process, `99` processed with errors.
    pub status_code: String,
    /// Zipped CDR when processing finished.
    pub content: Option<Vec<u8>>,
    pub error: Option<String>,
}

/// The three `billService` operations.
pub trait BillService {
    fn send_bill(
        &self,
        file_name: &str,
        zip: &[u8],
    ) -> impl Future<Output = Result<SendBillResponse, CpeError>> + Send;

    /// Returns the ticket to poll with [`BillService::get_status`].
    fn send_summary(
        &self,
        file_name: &str,
        zip: &[u8],
    ) -> impl Future<Output = Result<String, CpeError>> + Send;

    fn get_status(
        &self,
        ticket: &str,
    ) -> impl Future<Output = Result<StatusResponse, CpeError>> + Send;
}
