use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use super::envelope::{Operation, build_envelope};
use super::response::{decode_envelope, parse_get_status, parse_send_bill, parse_send_summary};
use super::{BillService, SendBillResponse, StatusResponse};
use crate::core::{CpeError, TransportKind};

/// SOL user (`{RUC}{USER}`) and password.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `billService` client.
///
/// # Examples
/// ```rust,no_run
/// use std::time::Duration;
/// use factura_pe::soap::{Credentials, SoapClient};
///
/// let client = SoapClient::new(
///     "https://e-beta.sunat.gob.pe/ol-ti-itcpfegem-beta/billService",
///     Credentials::new("20123456789MODDATOS", "moddatos"),
///     Duration::from_secs(30),
/// )?;
/// # let _ = client;
/// # Ok::<(), factura_pe::CpeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SoapClient {
    http: Client,
    endpoint: String,
    credentials: Credentials,
}

impl SoapClient {
    /// Build a client with a per-request `timeout`.
    ///
    /// # Errors
    /// Returns [`CpeError::Config`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, CpeError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CpeError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            credentials,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST one operation and return the reply body of a 2xx answer.
    async fn call(&self, operation: &Operation<'_>) -> Result<String, CpeError> {
        let envelope = build_envelope(
            operation,
            &self.credentials.username,
            &self.credentials.password,
        )?;
        tracing::debug!(
            operation = operation.name(),
            endpoint = %self.endpoint,
            bytes = envelope.len(),
            "calling billService"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", "\"\"")
            .body(envelope)
            .send()
            .await
            .map_err(transport_err)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_err)?;
        tracing::debug!(operation = operation.name(), %status, bytes = body.len(), "billService replied");

        if !status.is_success() {
            return Err(match decode_envelope(&body) {
                Err(fault @ CpeError::ProtocolFault { .. }) => {
                    tracing::warn!(operation = operation.name(), %status, error = %fault, "SOAP fault");
                    fault
                }
                _ => CpeError::transport(
                    TransportKind::HttpStatus(status.as_u16()),
                    format!("{} answered {status}", operation.name()),
                ),
            });
        }
        Ok(body)
    }
}

fn transport_err(e: reqwest::Error) -> CpeError {
    let kind = if e.is_timeout() {
        TransportKind::Timeout
    } else if e.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Other
    };
    CpeError::transport(kind, e.to_string())
}

impl BillService for SoapClient {
    async fn send_bill(&self, file_name: &str, zip: &[u8]) -> Result<SendBillResponse, CpeError> {
        let body = self.call(&Operation::SendBill { file_name, zip }).await?;
        parse_send_bill(&body)
    }

    async fn send_summary(&self, file_name: &str, zip: &[u8]) -> Result<String, CpeError> {
        let body = self.call(&Operation::SendSummary { file_name, zip }).await?;
        parse_send_summary(&body)
    }

    async fn get_status(&self, ticket: &str) -> Result<StatusResponse, CpeError> {
        let body = self.call(&Operation::GetStatus { ticket }).await?;
        parse_get_status(&body)
    }
}
