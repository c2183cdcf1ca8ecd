//! UBL 2.1 generation for SUNAT electronic vouchers.
//!
//! # Supported schemas
//!
//! - **Invoice** for facturas (01) and boletas (03) (`to_invoice_xml`)
//! - **CreditNote** for notas de crédito (07) (`to_credit_note_xml`)
//! - **DebitNote** for notas de débito (08) (`to_debit_note_xml`)
//!
//! Every document carries an empty `ext:ExtensionContent` element
//! ([`SIGNATURE_PLACEHOLDER`]) where the enveloped signature goes.
//!
//! # Example
//!
//! ```no_run
//! use factura_pe::core::*;
//! use factura_pe::ubl;
//!
//! let doc: Document = todo!(); // build via DocumentBuilder
//! let xml = ubl::to_xml(&doc, &doc.issuer).unwrap();
//! assert!(xml.contains(ubl::SIGNATURE_PLACEHOLDER));
//! ```

mod common;
mod invoice;
mod note;
pub(crate) mod xml_utils;

pub use invoice::to_invoice_xml;
pub use note::{to_credit_note_xml, to_debit_note_xml};
pub use xml_utils::format_decimal;

use crate::core::{Company, Document, UblSchema};
use xml_utils::XmlResult;

/// The exact empty slot the signer replaces.
pub const SIGNATURE_PLACEHOLDER: &str = "<ext:ExtensionContent></ext:ExtensionContent>";

pub const UBL_VERSION_ID: &str = "2.1";
pub const UBL_CUSTOMIZATION_ID: &str = "2.0";

/// `cac:Signature/cbc:ID`.
pub const SIGNATURE_ID: &str = "IDSignST";
/// Reference from `cac:Signature` to the `ds:Signature` element.
pub const SIGNATURE_URI: &str = "#SignatureST";

pub const CATALOG_01_URI: &str = "urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo01";
pub const CATALOG_06_URI: &str = "urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo06";

/// UBL 2.1 namespace URIs.
pub mod ns {
    pub const INVOICE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
    pub const CREDIT_NOTE: &str = "urn:oasis:names:specification:ubl:schema:xsd:CreditNote-2";
    pub const DEBIT_NOTE: &str = "urn:oasis:names:specification:ubl:schema:xsd:DebitNote-2";
    pub const CAC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
    pub const CBC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
    pub const EXT: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2";
}

/// Render `doc` with the schema its document type maps to.
pub fn to_xml(doc: &Document, issuer: &Company) -> XmlResult {
    match doc.document_type.ubl_schema() {
        UblSchema::Invoice => to_invoice_xml(doc, issuer),
        UblSchema::CreditNote => to_credit_note_xml(doc, issuer),
        UblSchema::DebitNote => to_debit_note_xml(doc, issuer),
    }
}
