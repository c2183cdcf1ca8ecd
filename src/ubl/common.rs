//! Aggregates shared by the invoice and note schemas.

use super::xml_utils::XmlWriter;
use super::{
    CATALOG_06_URI, SIGNATURE_ID, SIGNATURE_URI, UBL_CUSTOMIZATION_ID, UBL_VERSION_ID, ns,
};
use crate::core::*;

/// Root element with the fixed namespace set.
pub(crate) fn write_root_start(
    w: &mut XmlWriter,
    root_tag: &str,
    default_ns: &str,
) -> Result<(), CpeError> {
    w.start_element_with_attrs(
        root_tag,
        &[
            ("xmlns", default_ns),
            ("xmlns:cac", ns::CAC),
            ("xmlns:cbc", ns::CBC),
            ("xmlns:ext", ns::EXT),
        ],
    )?;
    Ok(())
}

/// `ext:UBLExtensions` with the empty slot the signer fills in.
pub(crate) fn write_extensions(w: &mut XmlWriter) -> Result<(), CpeError> {
    w.start_element("ext:UBLExtensions")?;
    w.start_element("ext:UBLExtension")?;
    w.text_element("ext:ExtensionContent", "")?;
    w.end_element("ext:UBLExtension")?;
    w.end_element("ext:UBLExtensions")?;
    Ok(())
}

/// UBLVersionID, CustomizationID, ID, IssueDate, IssueTime.
pub(crate) fn write_header(w: &mut XmlWriter, doc: &Document) -> Result<(), CpeError> {
    w.text_element("cbc:UBLVersionID", UBL_VERSION_ID)?;
    w.text_element("cbc:CustomizationID", UBL_CUSTOMIZATION_ID)?;
    w.text_element("cbc:ID", &doc.id())?;
    w.text_element("cbc:IssueDate", &doc.issue_date.format("%Y-%m-%d").to_string())?;
    w.text_element("cbc:IssueTime", &doc.issue_time.format("%H:%M:%S").to_string())?;
    Ok(())
}

/// `cac:Signature` pointing at the enveloped signature.
pub(crate) fn write_signature(w: &mut XmlWriter, issuer: &Company) -> Result<(), CpeError> {
    w.start_element("cac:Signature")?;
    w.text_element("cbc:ID", SIGNATURE_ID)?;
    w.start_element("cac:SignatoryParty")?;
    w.start_element("cac:PartyIdentification")?;
    w.text_element("cbc:ID", &issuer.document_number)?;
    w.end_element("cac:PartyIdentification")?;
    w.start_element("cac:PartyName")?;
    w.text_element("cbc:Name", &issuer.name)?;
    w.end_element("cac:PartyName")?;
    w.end_element("cac:SignatoryParty")?;
    w.start_element("cac:DigitalSignatureAttachment")?;
    w.start_element("cac:ExternalReference")?;
    w.text_element("cbc:URI", SIGNATURE_URI)?;
    w.end_element("cac:ExternalReference")?;
    w.end_element("cac:DigitalSignatureAttachment")?;
    w.end_element("cac:Signature")?;
    Ok(())
}

fn identity_attrs<'a>(company: &'a Company, scheme_name: &'a str) -> [(&'a str, &'a str); 4] {
    [
        ("schemeID", company.document_type.as_str()),
        ("schemeName", scheme_name),
        ("schemeAgencyName", "PE:SUNAT"),
        ("schemeURI", CATALOG_06_URI),
    ]
}

fn write_party_identification(w: &mut XmlWriter, company: &Company) -> Result<(), CpeError> {
    w.start_element("cac:PartyIdentification")?;
    w.text_element_with_attrs(
        "cbc:ID",
        &company.document_number,
        &identity_attrs(company, "Documento de Identidad"),
    )?;
    w.end_element("cac:PartyIdentification")?;
    Ok(())
}

fn write_legal_entity(w: &mut XmlWriter, company: &Company, with_address: bool) -> Result<(), CpeError> {
    w.start_element("cac:PartyLegalEntity")?;
    w.text_element("cbc:RegistrationName", &company.name)?;
    if with_address && company.has_address() {
        w.start_element("cac:RegistrationAddress")?;
        // Establishment code; "0000" is the fiscal domicile.
        w.text_element("cbc:AddressTypeCode", "0000")?;
        if !company.district.is_empty() {
            w.text_element("cbc:District", &company.district)?;
        }
        if !company.province.is_empty() {
            w.text_element("cbc:CityName", &company.province)?;
        }
        if !company.department.is_empty() {
            w.text_element("cbc:CountrySubentity", &company.department)?;
        }
        if !company.address.is_empty() {
            w.start_element("cac:AddressLine")?;
            w.text_element("cbc:Line", &company.address)?;
            w.end_element("cac:AddressLine")?;
        }
        if !company.country.is_empty() {
            w.start_element("cac:Country")?;
            w.text_element("cbc:IdentificationCode", &company.country)?;
            w.end_element("cac:Country")?;
        }
        w.end_element("cac:RegistrationAddress")?;
    }
    w.end_element("cac:PartyLegalEntity")?;
    Ok(())
}

/// `cac:AccountingSupplierParty` for the issuer.
pub(crate) fn write_supplier_party(w: &mut XmlWriter, issuer: &Company) -> Result<(), CpeError> {
    w.start_element("cac:AccountingSupplierParty")?;
    w.start_element("cac:Party")?;
    write_party_identification(w, issuer)?;

    w.start_element("cac:PartyName")?;
    w.text_element("cbc:Name", &issuer.trade_name)?;
    w.end_element("cac:PartyName")?;

    w.start_element("cac:PartyTaxScheme")?;
    w.text_element("cbc:RegistrationName", &issuer.name)?;
    w.text_element_with_attrs(
        "cbc:CompanyID",
        &issuer.document_number,
        &identity_attrs(issuer, "SUNAT:Identificador de Documento de Identidad"),
    )?;
    w.start_element("cac:TaxScheme")?;
    w.text_element("cbc:ID", "9999")?;
    w.text_element("cbc:Name", "SUNAT")?;
    w.end_element("cac:TaxScheme")?;
    w.end_element("cac:PartyTaxScheme")?;

    write_legal_entity(w, issuer, true)?;

    if !issuer.email.is_empty() || !issuer.phone.is_empty() {
        w.start_element("cac:Contact")?;
        if !issuer.phone.is_empty() {
            w.text_element("cbc:Telephone", &issuer.phone)?;
        }
        if !issuer.email.is_empty() {
            w.text_element("cbc:ElectronicMail", &issuer.email)?;
        }
        w.end_element("cac:Contact")?;
    }

    w.end_element("cac:Party")?;
    w.end_element("cac:AccountingSupplierParty")?;
    Ok(())
}

/// `cac:AccountingCustomerParty`.
pub(crate) fn write_customer_party(w: &mut XmlWriter, customer: &Company) -> Result<(), CpeError> {
    w.start_element("cac:AccountingCustomerParty")?;
    w.start_element("cac:Party")?;
    write_party_identification(w, customer)?;
    write_legal_entity(w, customer, false)?;
    w.end_element("cac:Party")?;
    w.end_element("cac:AccountingCustomerParty")?;
    Ok(())
}

/// `cac:DiscrepancyResponse` plus one `cac:BillingReference` per related document.
pub(crate) fn write_note_references(
    w: &mut XmlWriter,
    doc: &Document,
    response_code: &str,
    description: &str,
) -> Result<(), CpeError> {
    let first = doc.related_documents.first().ok_or_else(|| {
        CpeError::from_validation(&[ValidationError::new(
            "related_documents",
            "a note must reference the document it corrects",
        )])
    })?;

    w.start_element("cac:DiscrepancyResponse")?;
    w.text_element("cbc:ReferenceID", &first.id())?;
    w.text_element("cbc:ResponseCode", response_code)?;
    w.text_element("cbc:Description", description)?;
    w.end_element("cac:DiscrepancyResponse")?;

    for related in &doc.related_documents {
        w.start_element("cac:BillingReference")?;
        w.start_element("cac:InvoiceDocumentReference")?;
        w.text_element("cbc:ID", &related.id())?;
        w.text_element("cbc:DocumentTypeCode", related.document_type.code())?;
        w.end_element("cac:InvoiceDocumentReference")?;
        w.end_element("cac:BillingReference")?;
    }
    Ok(())
}

/// `cac:TaxTotal` with one subtotal per `(tax type, code)` group.
pub(crate) fn write_tax_total<'a>(
    w: &mut XmlWriter,
    lines: impl IntoIterator<Item = &'a DocumentLine>,
    currency: &str,
) -> Result<(), CpeError> {
    let subtotals = tax_subtotals(lines)?;
    let total = subtotals
        .iter()
        .try_fold(rust_decimal::Decimal::ZERO, |acc, s| acc.checked_add(s.tax_amount))
        .ok_or_else(|| CpeError::Validation("tax total exceeds the representable range".into()))?;

    w.start_element("cac:TaxTotal")?;
    w.amount_element("cbc:TaxAmount", total, currency)?;
    for sub in &subtotals {
        w.start_element("cac:TaxSubtotal")?;
        w.amount_element("cbc:TaxableAmount", sub.taxable_amount, currency)?;
        w.amount_element("cbc:TaxAmount", sub.tax_amount, currency)?;
        w.start_element("cac:TaxCategory")?;
        w.text_element("cbc:ID", &sub.code)?;
        w.text_element("cbc:Percent", &super::xml_utils::format_decimal(sub.rate))?;
        w.start_element("cac:TaxScheme")?;
        w.text_element("cbc:ID", sub.tax_type.scheme_id())?;
        w.text_element("cbc:Name", sub.tax_type.name())?;
        w.end_element("cac:TaxScheme")?;
        w.end_element("cac:TaxCategory")?;
        w.end_element("cac:TaxSubtotal")?;
    }
    w.end_element("cac:TaxTotal")?;
    Ok(())
}

/// `cac:LegalMonetaryTotal` or `cac:RequestedMonetaryTotal`.
pub(crate) fn write_monetary_total(
    w: &mut XmlWriter,
    tag: &str,
    doc: &Document,
) -> Result<(), CpeError> {
    let currency = &doc.currency_code;
    w.start_element(tag)?;
    w.amount_element("cbc:LineExtensionAmount", doc.sub_total, currency)?;
    w.amount_element("cbc:TaxInclusiveAmount", doc.total_amount, currency)?;
    w.amount_element("cbc:TaxExclusiveAmount", doc.sub_total, currency)?;
    w.amount_element("cbc:PayableAmount", doc.total_amount, currency)?;
    w.end_element(tag)?;
    Ok(())
}

/// One `cac:InvoiceLine` / `cac:CreditNoteLine` / `cac:DebitNoteLine`.
pub(crate) fn write_line(
    w: &mut XmlWriter,
    line: &DocumentLine,
    line_tag: &str,
    quantity_tag: &str,
    currency: &str,
) -> Result<(), CpeError> {
    w.start_element(line_tag)?;
    w.text_element("cbc:ID", &line.id)?;
    w.quantity_element(quantity_tag, line.quantity, &line.unit_code)?;
    w.amount_element("cbc:LineExtensionAmount", line.total_price, currency)?;

    w.start_element("cac:PricingReference")?;
    w.start_element("cac:AlternativeConditionPrice")?;
    w.amount_element("cbc:PriceAmount", reference_unit_price(line)?, currency)?;
    // 01: unit price including taxes
    w.text_element("cbc:PriceTypeCode", "01")?;
    w.end_element("cac:AlternativeConditionPrice")?;
    w.end_element("cac:PricingReference")?;

    if !line.taxes.is_empty() {
        write_tax_total(w, std::iter::once(line), currency)?;
    }

    w.start_element("cac:Item")?;
    w.text_element("cbc:Description", &line.description)?;
    if let Some(code) = &line.product_code {
        w.start_element("cac:SellersItemIdentification")?;
        w.text_element("cbc:ID", code)?;
        w.end_element("cac:SellersItemIdentification")?;
    }
    w.end_element("cac:Item")?;

    w.start_element("cac:Price")?;
    w.amount_element("cbc:PriceAmount", line.unit_price, currency)?;
    w.end_element("cac:Price")?;

    w.end_element(line_tag)?;
    Ok(())
}
