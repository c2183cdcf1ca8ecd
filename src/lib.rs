//! # factura-pe
//!
//! Peruvian electronic invoicing (SUNAT CPE): facturas, boletas, notas de
//! crédito and notas de débito, from the in-memory model to SUNAT's
//! `billService` and back.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use factura_pe::core::*;
//! use rust_decimal_macros::dec;
//!
//! let issue = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
//! let doc = DocumentBuilder::new(DocumentType::Factura, "F001", "123", issue)
//!     .issuer(CompanyBuilder::new("6", "20123456789", "ACME S.A.C.").build())
//!     .customer(CompanyBuilder::new("6", "20987654321", "Cliente S.A.").build())
//!     .add_line(LineBuilder::new(dec!(10), "NIU", "Servicio", dec!(150))
//!         .tax(TaxType::Igv, "10", dec!(18)).build())
//!     .payment_terms("Contado", issue, dec!(1770))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(doc.total_amount, dec!(1770));
//! assert_eq!(
//!     amount_in_words(doc.total_amount, &doc.currency_code),
//!     "MIL SETECIENTOS SETENTA CON 00/100 SOLES"
//! );
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Document model, totals, validation, amount in words, file names |
//! | `ubl` | UBL 2.1 Invoice / CreditNote / DebitNote generation |
//! | `signature` | Canonical XML and enveloped RSA XML signature |
//! | `package` | Single-entry ZIP archives |
//! | `soap` | `billService` SOAP client and reply decoding |
//! | `submit` | Submission orchestrator and configuration |
//! | `all` (default) | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "ubl")]
pub mod ubl;

#[cfg(feature = "signature")]
pub mod signature;

#[cfg(feature = "package")]
pub mod package;

#[cfg(feature = "soap")]
pub mod soap;

#[cfg(feature = "submit")]
pub mod config;

#[cfg(feature = "submit")]
pub mod submit;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
