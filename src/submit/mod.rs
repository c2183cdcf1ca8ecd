//! Submission pipeline: UBL rendering, signing, packaging and transport,
//! with the resulting document status transitions.
//!
//! ```text
//! draft ──sendBill──────▶ accepted | rejected
//!   │
//!   └────sendSummary───▶ pending (ticket) | rejected
//! ```
//!
//! Transport failures that may not have reached SUNAT (timeouts,
//! refused connections) leave the status untouched.

mod orchestrator;
mod strategy;

pub use orchestrator::{Orchestrator, SubmissionArtifacts};
pub use strategy::SubmissionStrategy;
