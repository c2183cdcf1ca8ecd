use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use super::calculation;
use super::error::CpeError;
use super::types::*;
use super::validation;

/// Builder for constructing valid documents.
///
/// ```
/// use factura_pe::core::*;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let issue = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let doc = DocumentBuilder::new(DocumentType::Factura, "F001", "123", issue)
///     .issuer(CompanyBuilder::new("6", "20123456789", "ACME SAC").build())
///     .customer(CompanyBuilder::new("6", "20987654321", "Cliente SAC").build())
///     .add_line(LineBuilder::new(dec!(2), "NIU", "Producto", dec!(100))
///         .tax(TaxType::Igv, "10", dec!(18))
///         .build())
///     .payment_terms("Contado", issue, dec!(236))
///     .build()
///     .unwrap();
///
/// assert_eq!(doc.total_amount, dec!(236));
/// ```
pub struct DocumentBuilder {
    document_type: DocumentType,
    series: String,
    number: String,
    issue_date: NaiveDate,
    issue_time: NaiveTime,
    due_date: Option<NaiveDate>,
    currency_code: String,
    issuer: Option<Company>,
    customer: Option<Company>,
    lines: Vec<DocumentLine>,
    payment_terms: Option<PaymentTerms>,
    related_documents: Vec<RelatedDocument>,
}

impl DocumentBuilder {
    pub fn new(
        document_type: DocumentType,
        series: impl Into<String>,
        number: impl Into<String>,
        issue_date: NaiveDate,
    ) -> Self {
        Self {
            document_type,
            series: series.into(),
            number: number.into(),
            issue_date,
            issue_time: NaiveTime::MIN,
            due_date: None,
            currency_code: "PEN".to_string(),
            issuer: None,
            customer: None,
            lines: Vec::new(),
            payment_terms: None,
            related_documents: Vec::new(),
        }
    }

    pub fn issue_time(mut self, time: NaiveTime) -> Self {
        self.issue_time = time;
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency_code = code.into();
        self
    }

    pub fn issuer(mut self, company: Company) -> Self {
        self.issuer = Some(company);
        self
    }

    pub fn customer(mut self, company: Company) -> Self {
        self.customer = Some(company);
        self
    }

    pub fn add_line(mut self, line: DocumentLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn payment_terms(
        mut self,
        payment_means_code: impl Into<String>,
        due_date: NaiveDate,
        amount: Decimal,
    ) -> Self {
        self.payment_terms = Some(PaymentTerms {
            payment_means_code: payment_means_code.into(),
            due_date,
            amount,
        });
        self
    }

    pub fn payment_terms_opt(mut self, terms: Option<PaymentTerms>) -> Self {
        self.payment_terms = terms;
        self
    }

    pub fn related_document(
        mut self,
        document_type: DocumentType,
        series: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        self.related_documents.push(RelatedDocument {
            document_type,
            series: series.into(),
            number: number.into(),
        });
        self
    }

    /// Assign line ids, calculate totals and run validation.
    /// Returns all validation errors (not just the first).
    pub fn build(self) -> Result<Document, CpeError> {
        let doc = self.build_unchecked()?;
        let errors = validation::validate_document(&doc);
        if !errors.is_empty() {
            return Err(CpeError::from_validation(&errors));
        }
        Ok(doc)
    }

    /// Build without validation, useful for tests that need a broken document.
    /// Amounts must still fit in a `Decimal`.
    pub fn build_unchecked(self) -> Result<Document, CpeError> {
        let issuer = self
            .issuer
            .ok_or_else(|| CpeError::Validation("issuer is required".into()))?;
        let customer = self
            .customer
            .ok_or_else(|| CpeError::Validation("customer is required".into()))?;

        let mut lines = self.lines;
        for (i, line) in lines.iter_mut().enumerate() {
            line.id = (i + 1).to_string();
        }

        let now = Utc::now();
        let mut doc = Document {
            series: self.series,
            number: self.number,
            document_type: self.document_type,
            issue_date: self.issue_date,
            issue_time: self.issue_time,
            due_date: self.due_date,
            currency_code: self.currency_code,
            issuer,
            customer,
            lines,
            sub_total: Decimal::ZERO,
            total_taxes: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            payment_terms: self.payment_terms,
            related_documents: self.related_documents,
            status: DocumentStatus::Draft,
            ticket: None,
            cdr: None,
            signature_mode: None,
            created_at: now,
            updated_at: now,
        };
        calculation::calculate_totals(&mut doc)?;
        Ok(doc)
    }
}

/// Builder for Company (issuer/customer).
pub struct CompanyBuilder {
    company: Company,
}

impl CompanyBuilder {
    pub fn new(
        document_type: impl Into<String>,
        document_number: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            company: Company {
                document_type: document_type.into(),
                document_number: document_number.into(),
                name: name.into(),
                ..Company::default()
            },
        }
    }

    pub fn trade_name(mut self, name: impl Into<String>) -> Self {
        self.company.trade_name = name.into();
        self
    }

    pub fn address(
        mut self,
        address: impl Into<String>,
        district: impl Into<String>,
        province: impl Into<String>,
        department: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        self.company.address = address.into();
        self.company.district = district.into();
        self.company.province = province.into();
        self.company.department = department.into();
        self.company.country = country.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.company.email = email.into();
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.company.phone = phone.into();
        self
    }

    pub fn build(self) -> Company {
        self.company
    }
}

/// Builder for DocumentLine. The id is assigned by [`DocumentBuilder`].
pub struct LineBuilder {
    quantity: Decimal,
    unit_code: String,
    description: String,
    unit_price: Decimal,
    taxes: Vec<Tax>,
    product_code: Option<String>,
}

impl LineBuilder {
    pub fn new(
        quantity: Decimal,
        unit_code: impl Into<String>,
        description: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            quantity,
            unit_code: unit_code.into(),
            description: description.into(),
            unit_price,
            taxes: Vec::new(),
            product_code: None,
        }
    }

    pub fn tax(mut self, tax_type: TaxType, code: impl Into<String>, rate: Decimal) -> Self {
        self.taxes.push(Tax {
            tax_type,
            code: code.into(),
            rate,
            amount: Decimal::ZERO,
        });
        self
    }

    pub fn product_code(mut self, code: impl Into<String>) -> Self {
        self.product_code = Some(code.into());
        self
    }

    /// The line as entered. Amounts are computed when the line is added
    /// to a document (see [`DocumentBuilder::build`]).
    pub fn build(self) -> DocumentLine {
        DocumentLine {
            id: String::new(),
            quantity: self.quantity,
            unit_code: self.unit_code,
            description: self.description,
            unit_price: self.unit_price,
            total_price: Decimal::ZERO,
            taxable_amount: Decimal::ZERO,
            taxes: self.taxes,
            product_code: self.product_code,
        }
    }
}
