use rust_decimal::Decimal;

use super::catalogs;
use super::error::ValidationError;
use super::types::*;

/// Maximum number of lines accepted on one document.
pub const MAX_LINES: usize = 10_000;

/// Validate a document before it is rendered or submitted.
///
/// Returns all errors found (not just the first).
pub fn validate_document(doc: &Document) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if doc.series.trim().is_empty() {
        errors.push(ValidationError::new("series", "series is required"));
    }
    if doc.number.trim().is_empty() {
        errors.push(ValidationError::new("number", "number is required"));
    }
    if !is_currency_code(&doc.currency_code) {
        errors.push(ValidationError::new(
            "currency_code",
            format!("'{}' is not an ISO 4217 code", doc.currency_code),
        ));
    }
    if let Some(due) = doc.due_date {
        if due < doc.issue_date {
            errors.push(ValidationError::new(
                "due_date",
                "due date must not precede the issue date",
            ));
        }
    }

    validate_issuer(&doc.issuer, &mut errors);
    validate_customer(&doc.customer, &mut errors);

    if doc.lines.is_empty() {
        errors.push(ValidationError::new(
            "lines",
            "at least one line is required",
        ));
    }
    if doc.lines.len() > MAX_LINES {
        errors.push(ValidationError::new(
            "lines",
            format!("a document cannot have more than {MAX_LINES} lines"),
        ));
    }
    for (i, line) in doc.lines.iter().enumerate() {
        validate_line(i, line, &mut errors);
    }

    errors
}

fn validate_issuer(issuer: &Company, errors: &mut Vec<ValidationError>) {
    if issuer.document_type != catalogs::RUC {
        errors.push(ValidationError::new(
            "issuer.document_type",
            "the issuer must be identified by RUC",
        ));
    }
    if !is_ruc(&issuer.document_number) {
        errors.push(ValidationError::new(
            "issuer.document_number",
            "a RUC has exactly 11 digits",
        ));
    }
    if issuer.name.trim().is_empty() {
        errors.push(ValidationError::new("issuer.name", "legal name is required"));
    }
}

fn validate_customer(customer: &Company, errors: &mut Vec<ValidationError>) {
    if !catalogs::is_known_identity_document_type(&customer.document_type) {
        errors.push(ValidationError::new(
            "customer.document_type",
            format!(
                "'{}' is not a catalog 06 identity document type",
                customer.document_type
            ),
        ));
    }
    if customer.document_number.trim().is_empty() {
        errors.push(ValidationError::new(
            "customer.document_number",
            "document number is required",
        ));
    }
    if customer.name.trim().is_empty() {
        errors.push(ValidationError::new(
            "customer.name",
            "legal name is required",
        ));
    }
}

fn validate_line(i: usize, line: &DocumentLine, errors: &mut Vec<ValidationError>) {
    let field = |name: &str| format!("lines[{i}].{name}");

    if line.quantity <= Decimal::ZERO {
        errors.push(ValidationError::new(
            field("quantity"),
            "quantity must be greater than zero",
        ));
    }
    if line.unit_code.trim().is_empty() {
        errors.push(ValidationError::new(field("unit_code"), "unit code is required"));
    }
    if line.description.trim().is_empty() {
        errors.push(ValidationError::new(
            field("description"),
            "description is required",
        ));
    }
    if line.taxes.is_empty() {
        errors.push(ValidationError::new(
            field("taxes"),
            "every line needs at least one tax",
        ));
    }
    for (j, tax) in line.taxes.iter().enumerate() {
        if tax.rate < Decimal::ZERO {
            errors.push(ValidationError::new(
                format!("lines[{i}].taxes[{j}].rate"),
                "tax rate must not be negative",
            ));
        }
        if tax.tax_type == TaxType::Igv && !catalogs::is_known_igv_affectation_code(&tax.code) {
            errors.push(ValidationError::new(
                format!("lines[{i}].taxes[{j}].code"),
                format!("'{}' is not a catalog 07 affectation code", tax.code),
            ));
        }
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// 11 ASCII digits.
pub fn is_ruc(value: &str) -> bool {
    value.len() == 11 && value.bytes().all(|b| b.is_ascii_digit())
}
