use super::common::*;
use super::ns;
use super::xml_utils::{XmlResult, XmlWriter};
use crate::core::*;

/// Schema-specific names of a credit or debit note.
struct NoteSchema {
    root: &'static str,
    namespace: &'static str,
    line: &'static str,
    quantity: &'static str,
    monetary_total: &'static str,
    /// Catalog 09 (credit) / 10 (debit) reason.
    response_code: &'static str,
    description: &'static str,
}

const CREDIT_NOTE: NoteSchema = NoteSchema {
    root: "CreditNote",
    namespace: ns::CREDIT_NOTE,
    line: "cac:CreditNoteLine",
    quantity: "cbc:CreditedQuantity",
    monetary_total: "cac:LegalMonetaryTotal",
    response_code: "01",
    description: "Anulación de la operación",
};

const DEBIT_NOTE: NoteSchema = NoteSchema {
    root: "DebitNote",
    namespace: ns::DEBIT_NOTE,
    line: "cac:DebitNoteLine",
    quantity: "cbc:DebitedQuantity",
    monetary_total: "cac:RequestedMonetaryTotal",
    response_code: "02",
    description: "Aumento en el valor",
};

/// Generate a UBL 2.1 CreditNote (nota de crédito).
pub fn to_credit_note_xml(doc: &Document, issuer: &Company) -> XmlResult {
    write_note(doc, issuer, &CREDIT_NOTE)
}

/// Generate a UBL 2.1 DebitNote (nota de débito).
pub fn to_debit_note_xml(doc: &Document, issuer: &Company) -> XmlResult {
    write_note(doc, issuer, &DEBIT_NOTE)
}

fn write_note(doc: &Document, issuer: &Company, schema: &NoteSchema) -> XmlResult {
    if doc.related_documents.is_empty() {
        return Err(CpeError::from_validation(&[ValidationError::new(
            "related_documents",
            "a note must reference the document it corrects",
        )]));
    }

    let currency = &doc.currency_code;
    let mut w = XmlWriter::new()?;

    write_root_start(&mut w, schema.root, schema.namespace)?;
    write_extensions(&mut w)?;
    write_header(&mut w, doc)?;
    w.text_element("cbc:DocumentCurrencyCode", currency)?;

    write_note_references(&mut w, doc, schema.response_code, schema.description)?;

    write_signature(&mut w, issuer)?;
    write_supplier_party(&mut w, issuer)?;
    write_customer_party(&mut w, &doc.customer)?;

    write_tax_total(&mut w, &doc.lines, currency)?;
    write_monetary_total(&mut w, schema.monetary_total, doc)?;

    for line in &doc.lines {
        write_line(&mut w, line, schema.line, schema.quantity, currency)?;
    }

    w.end_element(schema.root)?;
    let xml = w.into_string()?;
    tracing::debug!(id = %doc.id(), root = schema.root, bytes = xml.len(), "rendered UBL note");
    Ok(xml)
}
