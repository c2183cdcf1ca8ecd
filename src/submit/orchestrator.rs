use std::sync::Arc;

use super::SubmissionStrategy;
use crate::config::Config;
use crate::core::*;
use crate::package::zip_single;
use crate::signature::Signer;
use crate::soap::{BillService, SoapClient, read_cdr};
use crate::ubl;

/// Everything produced for one document before it goes on the wire.
/// Storing these is up to the caller.
#[derive(Debug, Clone)]
pub struct SubmissionArtifacts {
    pub xml_file_name: String,
    pub zip_file_name: String,
    pub signed_xml: String,
    pub zip: Vec<u8>,
    pub signature_mode: SignatureMode,
}

/// Runs documents through build, sign, package and send.
///
/// The issuer is fixed at construction and shared read-only; an
/// orchestrator can serve concurrent submissions through `&self`.
#[derive(Debug)]
pub struct Orchestrator<S> {
    issuer: Arc<Company>,
    signer: Signer,
    transport: S,
}

impl Orchestrator<SoapClient> {
    /// Orchestrator talking to the configured `billService` endpoint.
    pub fn from_config(config: &Config) -> Result<Self, CpeError> {
        Ok(Self::new(
            config.issuer.clone(),
            config.signing.signer()?,
            config.soap_client()?,
        ))
    }
}

impl<S: BillService> Orchestrator<S> {
    pub fn new(issuer: impl Into<Arc<Company>>, signer: Signer, transport: S) -> Self {
        Self {
            issuer: issuer.into(),
            signer,
            transport,
        }
    }

    pub fn issuer(&self) -> &Company {
        &self.issuer
    }

    pub fn transport(&self) -> &S {
        &self.transport
    }

    /// A `Draft` document issued by this orchestrator's issuer.
    pub fn create_document(&self, request: &CreateDocumentRequest) -> Result<Document, CpeError> {
        let doc = create_document(request, &self.issuer)?;
        tracing::info!(id = %doc.id(), document_type = %doc.document_type, total = %doc.total_amount, "document created");
        Ok(doc)
    }

    /// Render, sign and zip `doc` without sending it.
    ///
    /// The supplier party and file name come from this orchestrator's
    /// issuer; a document carrying another RUC is refused.
    pub fn build_artifacts(&self, doc: &Document) -> Result<SubmissionArtifacts, CpeError> {
        if doc.issuer.document_number != self.issuer.document_number {
            return Err(CpeError::from_validation(&[ValidationError::new(
                "issuer.document_number",
                format!(
                    "document issued by {} cannot be sent as {}",
                    doc.issuer.document_number, self.issuer.document_number
                ),
            )]));
        }

        let xml = ubl::to_xml(doc, &self.issuer)?;
        let signed = self.signer.sign(&xml)?;

        let name = FileName::new(
            &self.issuer.document_number,
            doc.document_type,
            &doc.series,
            &doc.number,
        );
        let xml_file_name = name.xml();
        let zip = zip_single(&xml_file_name, signed.xml.as_bytes())?;

        Ok(SubmissionArtifacts {
            xml_file_name,
            zip_file_name: name.zip(),
            signed_xml: signed.xml,
            zip,
            signature_mode: signed.mode,
        })
    }

    /// Submit `doc` and record the outcome on it.
    ///
    /// Only `Draft` and `Rejected` documents can be sent. On error the
    /// document is left in the status the error implies: unchanged when
    /// nothing reached SUNAT, `Sent` when SUNAT answered but the reply or
    /// its CDR could not be read, `Rejected` when SUNAT refused it.
    #[tracing::instrument(skip_all, fields(id = %doc.id(), document_type = %doc.document_type))]
    pub async fn send_document(&self, doc: &mut Document) -> Result<(), CpeError> {
        if !matches!(doc.status, DocumentStatus::Draft | DocumentStatus::Rejected) {
            return Err(CpeError::from_validation(&[ValidationError::new(
                "status",
                format!("a {:?} document cannot be sent", doc.status),
            )]));
        }

        let artifacts = self.build_artifacts(doc)?;
        doc.signature_mode = Some(artifacts.signature_mode);

        let strategy = SubmissionStrategy::for_document_type(doc.document_type);
        tracing::info!(?strategy, file = %artifacts.zip_file_name, "submitting");

        match strategy {
            SubmissionStrategy::Ticketed => {
                match self
                    .transport
                    .send_summary(&artifacts.zip_file_name, &artifacts.zip)
                    .await
                {
                    Ok(ticket) => {
                        tracing::info!(%ticket, "accepted for processing");
                        doc.ticket = Some(ticket);
                        doc.transition(DocumentStatus::Pending);
                        Ok(())
                    }
                    Err(e) => Err(self.fail(doc, e)),
                }
            }
            SubmissionStrategy::Synchronous => {
                let outcome = match self
                    .transport
                    .send_bill(&artifacts.zip_file_name, &artifacts.zip)
                    .await
                {
                    Ok(response) => read_cdr(&response.application_response),
                    Err(e) => Err(e),
                };
                match outcome {
                    Ok(cdr) if cdr.is_accepted() => {
                        tracing::info!(code = %cdr.response_code, notes = cdr.notes.len(), "accepted");
                        doc.cdr = Some(cdr);
                        doc.transition(DocumentStatus::Accepted);
                        Ok(())
                    }
                    Ok(cdr) => {
                        tracing::warn!(code = %cdr.response_code, description = %cdr.description, "rejected");
                        let error = CpeError::Rejection {
                            code: cdr.response_code.clone(),
                            message: cdr.description.clone(),
                        };
                        doc.cdr = Some(cdr);
                        doc.transition(DocumentStatus::Rejected);
                        Err(error)
                    }
                    Err(e) => Err(self.fail(doc, e)),
                }
            }
        }
    }

    /// Record a failed exchange. Connectivity failures keep the status.
    ///
    /// An unreadable 2xx reply means SUNAT may have registered the
    /// document, so it is marked `Sent` and cannot be resent blindly.
    fn fail(&self, doc: &mut Document, error: CpeError) -> CpeError {
        match error {
            ref e if e.is_connectivity() => {
                tracing::warn!(error = %e, "not delivered, status unchanged");
            }
            CpeError::Xml(_) | CpeError::Package(_) => {
                tracing::error!(%error, "delivered but the reply is unreadable");
                doc.transition(DocumentStatus::Sent);
            }
            _ => {
                tracing::warn!(%error, "submission failed");
                doc.transition(DocumentStatus::Rejected);
            }
        }
        error
    }

    /// Ask SUNAT about a ticket. Read-only: no document is updated.
    pub async fn check_status(&self, ticket: &str) -> Result<Cdr, CpeError> {
        let status = self.transport.get_status(ticket).await?;
        tracing::debug!(%ticket, code = %status.status_code, "status checked");

        if let Some(content) = &status.content {
            return read_cdr(content);
        }
        Ok(Cdr {
            description: status_description(&status.status_code).to_string(),
            response_code: status.status_code,
            notes: status.error.into_iter().collect(),
        })
    }

    /// Void (comunicación de baja) is not available.
    pub async fn void_document(&self, request: &VoidDocumentRequest) -> Result<(), CpeError> {
        tracing::warn!(
            document_type = %request.document_type,
            series = %request.series,
            number = %request.number,
            "void requested"
        );
        Err(CpeError::NotImplemented("void_document"))
    }
}

fn status_description(code: &str) -> &'static str {
    match code {
        "0" => "Procesó correctamente",
        "98" => "En proceso",
        "99" => "Proceso con errores",
        _ => "",
    }
}
