use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::builder::{DocumentBuilder, LineBuilder};
use super::error::{CpeError, ValidationError};
use super::types::*;

/// Input for [`create_document`], as received from an API layer.
///
/// Dates are `YYYY-MM-DD` strings and are parsed during creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    #[serde(rename = "serie")]
    pub series: String,
    pub number: String,
    pub issue_date: String,
    /// `HH:MM:SS`, midnight when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub currency_code: String,
    pub customer: Company,
    pub lines: Vec<CreateDocumentLineRequest>,
    #[serde(default)]
    pub payment_terms: Option<PaymentTerms>,
    /// Documents corrected by a credit or debit note.
    #[serde(default)]
    pub related_documents: Vec<RelatedDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentLineRequest {
    pub quantity: Decimal,
    pub unit_code: String,
    pub description: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub taxes: Vec<Tax>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
}

/// Input of the void workflow (comunicación de baja).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoidDocumentRequest {
    pub document_type: DocumentType,
    #[serde(rename = "serie")]
    pub series: String,
    pub number: String,
    pub void_date: String,
    pub reason: String,
}

/// Turn a request into a validated `Draft` document with computed totals.
pub fn create_document(
    request: &CreateDocumentRequest,
    issuer: &Company,
) -> Result<Document, CpeError> {
    let issue_date = parse_date("issue_date", &request.issue_date)?;

    let mut builder = DocumentBuilder::new(
        request.document_type,
        &request.series,
        &request.number,
        issue_date,
    )
    .currency(&request.currency_code)
    .issuer(issuer.clone())
    .customer(request.customer.clone())
    .payment_terms_opt(request.payment_terms.clone());

    if let Some(time) = request.issue_time.as_deref().filter(|t| !t.is_empty()) {
        builder = builder.issue_time(parse_time("issue_time", time)?);
    }
    if let Some(due) = request.due_date.as_deref().filter(|d| !d.is_empty()) {
        builder = builder.due_date(parse_date("due_date", due)?);
    }
    for related in &request.related_documents {
        builder = builder.related_document(
            related.document_type,
            &related.series,
            &related.number,
        );
    }
    for line in &request.lines {
        let mut lb = LineBuilder::new(
            line.quantity,
            &line.unit_code,
            &line.description,
            line.unit_price,
        );
        for tax in &line.taxes {
            lb = lb.tax(tax.tax_type.clone(), &tax.code, tax.rate);
        }
        if let Some(code) = &line.product_code {
            lb = lb.product_code(code);
        }
        builder = builder.add_line(lb.build());
    }

    builder.build()
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, CpeError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        CpeError::from_validation(&[ValidationError::new(
            field,
            format!("invalid date '{value}', expected YYYY-MM-DD: {e}"),
        )])
    })
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, CpeError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S").map_err(|e| {
        CpeError::from_validation(&[ValidationError::new(
            field,
            format!("invalid time '{value}', expected HH:MM:SS: {e}"),
        )])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn issuer() -> Company {
        Company {
            document_type: "6".into(),
            document_number: "20123456789".into(),
            name: "ACME SAC".into(),
            ..Company::default()
        }
    }

    fn request() -> CreateDocumentRequest {
        CreateDocumentRequest {
            document_type: DocumentType::Factura,
            series: "F001".into(),
            number: "42".into(),
            issue_date: "2024-03-01".into(),
            issue_time: None,
            due_date: None,
            currency_code: "PEN".into(),
            customer: Company {
                document_type: "6".into(),
                document_number: "20987654321".into(),
                name: "Cliente SAC".into(),
                ..Company::default()
            },
            lines: vec![CreateDocumentLineRequest {
                quantity: dec!(2),
                unit_code: "NIU".into(),
                description: "Producto".into(),
                unit_price: dec!(100),
                taxes: vec![Tax {
                    tax_type: TaxType::Igv,
                    code: "10".into(),
                    rate: dec!(18),
                    amount: Decimal::ZERO,
                }],
                product_code: Some("P-1".into()),
            }],
            payment_terms: None,
            related_documents: Vec::new(),
        }
    }

    #[test]
    fn computes_line_and_document_totals() {
        let doc = create_document(&request(), &issuer()).unwrap();
        assert_eq!(doc.lines[0].id, "1");
        assert_eq!(doc.lines[0].total_price, dec!(200));
        assert_eq!(doc.lines[0].taxes[0].amount, dec!(36));
        assert_eq!(doc.sub_total, dec!(200));
        assert_eq!(doc.total_taxes, dec!(36));
        assert_eq!(doc.total_amount, dec!(236));
        assert_eq!(doc.issuer.document_number, "20123456789");
        assert_eq!(doc.issue_time, NaiveTime::MIN);
    }

    #[test]
    fn bad_issue_date() {
        let mut req = request();
        req.issue_date = "01/03/2024".into();
        let err = create_document(&req, &issuer()).unwrap_err();
        assert!(matches!(err, CpeError::Validation(ref m) if m.starts_with("issue_date")));
    }

    #[test]
    fn bad_due_date() {
        let mut req = request();
        req.due_date = Some("2024-13-01".into());
        assert!(create_document(&req, &issuer()).is_err());
    }

    #[test]
    fn empty_due_date_is_absent() {
        let mut req = request();
        req.due_date = Some(String::new());
        let doc = create_document(&req, &issuer()).unwrap();
        assert_eq!(doc.due_date, None);
    }

    #[test]
    fn issue_time_is_parsed() {
        let mut req = request();
        req.issue_time = Some("14:30:05".into());
        let doc = create_document(&req, &issuer()).unwrap();
        assert_eq!(doc.issue_time, NaiveTime::from_hms_opt(14, 30, 5).unwrap());
    }

    #[test]
    fn line_without_taxes_rejected() {
        let mut req = request();
        req.lines[0].taxes.clear();
        let err = create_document(&req, &issuer()).unwrap_err();
        assert!(err.to_string().contains("lines[0].taxes"));
    }

    #[test]
    fn deserializes_api_payload() {
        let json = r#"{
            "type": "03",
            "serie": "B001",
            "number": "9",
            "issue_date": "2024-03-01",
            "currency_code": "PEN",
            "customer": {"document_type": "1", "document_number": "12345678", "name": "Juan Pérez"},
            "lines": [{"quantity": "1", "unit_code": "NIU", "description": "Bolsa", "unit_price": "0.50",
                       "taxes": [{"type": "IGV", "code": "10", "rate": "18"}]}],
            "payment_terms": {"payment_means_code": "Contado", "due_date": "2024-03-01", "amount": "0.59"}
        }"#;
        let req: CreateDocumentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.document_type, DocumentType::Boleta);
        let doc = create_document(&req, &issuer()).unwrap();
        assert_eq!(doc.total_amount, dec!(0.59));
    }
}
