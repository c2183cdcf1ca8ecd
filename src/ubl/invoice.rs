use super::common::*;
use super::xml_utils::{XmlResult, XmlWriter, format_decimal};
use super::{CATALOG_01_URI, ns};
use crate::core::*;

/// Legend code for the amount in words (catalog 52).
const AMOUNT_IN_WORDS_LEGEND: &str = "1000";

/// Generate a UBL 2.1 Invoice (factura or boleta).
pub fn to_invoice_xml(doc: &Document, issuer: &Company) -> XmlResult {
    let terms = doc.payment_terms.as_ref().ok_or_else(|| {
        CpeError::from_validation(&[ValidationError::new(
            "payment_terms",
            "payment terms (forma de pago) are required for invoices",
        )])
    })?;
    if terms.payment_means_code.trim().is_empty() {
        return Err(CpeError::from_validation(&[ValidationError::new(
            "payment_terms.payment_means_code",
            "payment means code must not be empty",
        )]));
    }

    let currency = &doc.currency_code;
    let mut w = XmlWriter::new()?;

    write_root_start(&mut w, "Invoice", ns::INVOICE)?;
    write_extensions(&mut w)?;
    write_header(&mut w, doc)?;

    if let Some(due) = &doc.due_date {
        w.text_element("cbc:DueDate", &due.format("%Y-%m-%d").to_string())?;
    }
    w.text_element_with_attrs(
        "cbc:InvoiceTypeCode",
        doc.document_type.code(),
        &[
            ("listAgencyName", "PE:SUNAT"),
            ("listName", "Tipo de Documento"),
            ("listURI", CATALOG_01_URI),
        ],
    )?;
    w.text_element_with_attrs(
        "cbc:Note",
        &amount_in_words(doc.total_amount, currency),
        &[("languageLocaleID", AMOUNT_IN_WORDS_LEGEND)],
    )?;
    w.text_element("cbc:DocumentCurrencyCode", currency)?;

    write_signature(&mut w, issuer)?;
    write_supplier_party(&mut w, issuer)?;
    write_customer_party(&mut w, &doc.customer)?;

    w.start_element("cac:PaymentTerms")?;
    w.text_element("cbc:ID", "FormaPago")?;
    w.text_element("cbc:PaymentMeansID", &terms.payment_means_code)?;
    w.amount_element("cbc:Amount", terms.amount, currency)?;
    w.text_element(
        "cbc:PaymentDueDate",
        &terms.due_date.format("%Y-%m-%d").to_string(),
    )?;
    w.end_element("cac:PaymentTerms")?;

    write_tax_total(&mut w, &doc.lines, currency)?;
    write_monetary_total(&mut w, "cac:LegalMonetaryTotal", doc)?;

    for line in &doc.lines {
        write_line(&mut w, line, "cac:InvoiceLine", "cbc:InvoicedQuantity", currency)?;
    }

    w.end_element("Invoice")?;
    let xml = w.into_string()?;
    tracing::debug!(
        id = %doc.id(),
        bytes = xml.len(),
        total = %format_decimal(doc.total_amount),
        "rendered UBL invoice"
    );
    Ok(xml)
}
