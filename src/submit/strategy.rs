use crate::core::DocumentType;

/// How a document reaches SUNAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStrategy {
    /// `sendBill`, answered with the CDR.
    Synchronous,
    /// `sendSummary`, answered with a ticket to poll.
    Ticketed,
}

impl SubmissionStrategy {
    pub fn for_document_type(document_type: DocumentType) -> Self {
        if document_type.requires_ticket_flow() {
            Self::Ticketed
        } else {
            Self::Synchronous
        }
    }
}
