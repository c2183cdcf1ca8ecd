//! Submit a factura and a boleta to SUNAT's beta service.
//!
//! ```sh
//! RUST_LOG=factura_pe=debug cargo run --example submit_invoice -- config.json
//! ```
//!
//! `config.json` deserializes into [`factura_pe::config::Config`]:
//!
//! ```json
//! {
//!   "environment": "beta",
//!   "credentials": {"username": "20123456789MODDATOS", "password": "moddatos"},
//!   "issuer": {"document_type": "6", "document_number": "20123456789", "name": "ACME S.A.C."},
//!   "signing": {"private_key_path": "key.pem", "certificate_path": "cert.pem"}
//! }
//! ```
//!
//! Set `FACTURA_PE_ENDPOINT` to send somewhere else.

use factura_pe::config::Config;
use factura_pe::core::*;
use factura_pe::submit::Orchestrator;
use tracing_subscriber::EnvFilter;

const FACTURA: &str = r#"{
    "type": "01",
    "serie": "F001",
    "number": "1",
    "issue_date": "2024-06-15",
    "currency_code": "PEN",
    "customer": {"document_type": "6", "document_number": "20987654321", "name": "Cliente S.A."},
    "lines": [
        {"quantity": "10", "unit_code": "NIU", "description": "Teclado", "unit_price": "150",
         "taxes": [{"type": "IGV", "code": "10", "rate": "18"}]}
    ],
    "payment_terms": {"payment_means_code": "Contado", "due_date": "2024-06-15", "amount": "1770"}
}"#;

const BOLETA: &str = r#"{
    "type": "03",
    "serie": "B001",
    "number": "1",
    "issue_date": "2024-06-15",
    "currency_code": "PEN",
    "customer": {"document_type": "1", "document_number": "12345678", "name": "Juan Pérez"},
    "lines": [
        {"quantity": "1", "unit_code": "NIU", "description": "Mouse", "unit_price": "50",
         "taxes": [{"type": "IGV", "code": "10", "rate": "18"}]}
    ],
    "payment_terms": {"payment_means_code": "Contado", "due_date": "2024-06-15", "amount": "59"}
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let path = std::env::args().nth(1).ok_or("usage: submit_invoice CONFIG.json")?;
    let config: Config = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let orchestrator = Orchestrator::from_config(&config)?;
    println!("endpoint: {}", orchestrator.transport().endpoint());

    for request in [FACTURA, BOLETA] {
        let request: CreateDocumentRequest = serde_json::from_str(request)?;
        let mut doc = orchestrator.create_document(&request)?;

        match orchestrator.send_document(&mut doc).await {
            Ok(()) => println!("{} {:?}", doc.id(), doc.status),
            Err(e) => println!("{} {:?}: {e}", doc.id(), doc.status),
        }
        if let Some(cdr) = &doc.cdr {
            println!("  CDR {}: {}", cdr.response_code, cdr.description);
        }
        if let Some(ticket) = doc.ticket.clone() {
            let cdr = orchestrator.check_status(&ticket).await?;
            println!("  ticket {ticket}: {} {}", cdr.response_code, cdr.description);
        }
    }

    Ok(())
}
