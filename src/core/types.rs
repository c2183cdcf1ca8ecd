use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A SUNAT electronic payment voucher (CPE), the top-level document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Series, e.g. "F001" (factura) or "B001" (boleta).
    pub series: String,
    /// Correlative number within the series.
    pub number: String,
    /// Catalog 01: document type.
    pub document_type: DocumentType,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Issue time (SUNAT requires `cbc:IssueTime`).
    pub issue_time: NaiveTime,
    /// Payment due date.
    pub due_date: Option<NaiveDate>,
    /// ISO 4217 currency code, e.g. "PEN".
    pub currency_code: String,
    /// Emisor.
    pub issuer: Company,
    /// Adquiriente / usuario.
    pub customer: Company,
    /// Document lines in order.
    pub lines: Vec<DocumentLine>,
    /// Σ line total price (valor de venta).
    pub sub_total: Decimal,
    /// Σ tax amounts across all lines.
    pub total_taxes: Decimal,
    /// sub_total + total_taxes (importe total).
    pub total_amount: Decimal,
    /// Forma de pago. Mandatory for facturas and boletas.
    pub payment_terms: Option<PaymentTerms>,
    /// Documents corrected by a credit/debit note.
    pub related_documents: Vec<RelatedDocument>,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Ticket returned by `sendSummary` (asynchronous flow only).
    pub ticket: Option<String>,
    /// Constancia de recepción returned by SUNAT.
    pub cdr: Option<Cdr>,
    /// How the last generated XML was signed, if it was generated at all.
    pub signature_mode: Option<SignatureMode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// `{series}-{number}`, the value of `cbc:ID`.
    pub fn id(&self) -> String {
        format!("{}-{}", self.series, self.number)
    }

    /// Move to a new status and refresh `updated_at`.
    pub fn transition(&mut self, status: DocumentStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Catalog 01: document types supported by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// 01: Factura.
    #[serde(rename = "01")]
    Factura,
    /// 03: Boleta de venta.
    #[serde(rename = "03")]
    Boleta,
    /// 07: Nota de crédito.
    #[serde(rename = "07")]
    NotaCredito,
    /// 08: Nota de débito.
    #[serde(rename = "08")]
    NotaDebito,
}

/// Which UBL 2.1 main document schema a document type maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UblSchema {
    Invoice,
    CreditNote,
    DebitNote,
}

impl DocumentType {
    /// Catalog 01 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Factura => "01",
            Self::Boleta => "03",
            Self::NotaCredito => "07",
            Self::NotaDebito => "08",
        }
    }

    /// Parse from catalog 01 code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "01" => Some(Self::Factura),
            "03" => Some(Self::Boleta),
            "07" => Some(Self::NotaCredito),
            "08" => Some(Self::NotaDebito),
            _ => None,
        }
    }

    /// Boletas are reported through `sendSummary` and answered with a ticket.
    pub fn requires_ticket_flow(&self) -> bool {
        matches!(self, Self::Boleta)
    }

    pub fn ubl_schema(&self) -> UblSchema {
        match self {
            Self::Factura | Self::Boleta => UblSchema::Invoice,
            Self::NotaCredito => UblSchema::CreditNote,
            Self::NotaDebito => UblSchema::DebitNote,
        }
    }

    /// Notes must reference the document they correct.
    pub fn requires_related_document(&self) -> bool {
        matches!(self, Self::NotaCredito | Self::NotaDebito)
    }

    /// Forma de pago is mandatory for facturas and boletas.
    pub fn requires_payment_terms(&self) -> bool {
        matches!(self, Self::Factura | Self::Boleta)
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Document lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Created, not yet submitted (or submission never reached SUNAT).
    Draft,
    /// Submitted through the ticket flow, awaiting validation.
    Pending,
    /// Reserved: transmitted without a final answer.
    Sent,
    /// SUNAT accepted the document.
    Accepted,
    /// SUNAT (or the transport) rejected the document.
    Rejected,
    /// Reserved for the void workflow (comunicación de baja).
    Cancelled,
}

/// Whether the generated XML carries a real signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureMode {
    /// Enveloped XML signature made with a configured certificate.
    Signed,
    /// Test mode: the signature slot was left empty on purpose.
    Unsigned,
}

/// Emisor or adquiriente.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Catalog 06 identity document type ("6" RUC, "1" DNI, ...).
    pub document_type: String,
    /// RUC / DNI number.
    pub document_number: String,
    /// Razón social.
    pub name: String,
    /// Nombre comercial.
    #[serde(default)]
    pub trade_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub department: String,
    /// ISO 3166-1 alpha-2, normally "PE".
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl Company {
    /// True when any address component is filled in.
    pub fn has_address(&self) -> bool {
        [
            &self.address,
            &self.district,
            &self.province,
            &self.department,
            &self.country,
        ]
        .iter()
        .any(|s| !s.trim().is_empty())
    }
}

/// A document line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLine {
    /// 1-based position.
    pub id: String,
    pub quantity: Decimal,
    /// Catalog 03 unit of measure, e.g. "NIU" (unit) or "ZZ" (service).
    pub unit_code: String,
    pub description: String,
    /// Unit value before taxes.
    pub unit_price: Decimal,
    /// quantity × unit_price.
    pub total_price: Decimal,
    /// Base for the line taxes (equals `total_price`).
    pub taxable_amount: Decimal,
    pub taxes: Vec<Tax>,
    /// Seller's product code.
    pub product_code: Option<String>,
}

impl DocumentLine {
    /// Σ tax rates, used for the tax-inclusive reference price.
    /// `None` on overflow.
    pub fn total_tax_rate(&self) -> Option<Decimal> {
        self.taxes
            .iter()
            .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.rate))
    }

    pub fn total_tax_amount(&self) -> Option<Decimal> {
        self.taxes
            .iter()
            .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.amount))
    }
}

/// A tax applied to a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tax {
    #[serde(rename = "type")]
    pub tax_type: TaxType,
    /// Catalog 07 affectation code (e.g. "10" gravado - operación onerosa).
    pub code: String,
    /// Rate in percent.
    pub rate: Decimal,
    /// taxable_amount × rate / 100, set when the document is created.
    #[serde(default)]
    pub amount: Decimal,
}

/// Catalog 05: tax types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaxType {
    /// Impuesto General a las Ventas.
    #[serde(rename = "IGV")]
    Igv,
    /// Impuesto Selectivo al Consumo.
    #[serde(rename = "ISC")]
    Isc,
    /// Impuesto al consumo de bolsas de plástico.
    #[serde(rename = "ICBP", alias = "ICBPER")]
    Icbper,
    /// Any other tax, carried by name.
    #[serde(untagged)]
    Other(String),
}

impl TaxType {
    /// Catalog 05 tax scheme id.
    pub fn scheme_id(&self) -> &'static str {
        match self {
            Self::Igv => "1000",
            Self::Isc => "2000",
            Self::Icbper => "7152",
            Self::Other(_) => "9999",
        }
    }

    /// Name written to `cac:TaxScheme/cbc:Name`.
    pub fn name(&self) -> &str {
        match self {
            Self::Igv => "IGV",
            Self::Isc => "ISC",
            Self::Icbper => "ICBP",
            Self::Other(name) => name,
        }
    }
}

/// Forma de pago.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTerms {
    /// e.g. "Contado" or "Credito".
    pub payment_means_code: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

/// A prior document corrected by a credit or debit note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedDocument {
    pub document_type: DocumentType,
    pub series: String,
    pub number: String,
}

impl RelatedDocument {
    pub fn id(&self) -> String {
        format!("{}-{}", self.series, self.number)
    }
}

/// Constancia de Recepción, SUNAT's acceptance/rejection record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cdr {
    pub response_code: String,
    pub description: String,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Cdr {
    /// Code 0 is accepted; 4000+ is accepted with observations.
    /// 0100–3999 are exceptions or rejections.
    pub fn is_accepted(&self) -> bool {
        match self.response_code.trim().parse::<u32>() {
            Ok(0) => true,
            Ok(code) => code >= 4000,
            Err(_) => false,
        }
    }
}
