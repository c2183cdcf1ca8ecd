//! Core document types, totals, validation, and naming.
//!
//! This module provides the in-memory model of SUNAT electronic payment
//! vouchers (factura, boleta, notas de crédito y débito) with exact
//! decimal totals and the Spanish amount legend.

mod amount_words;
mod builder;
mod calculation;
pub mod catalogs;
mod error;
mod naming;
mod request;
mod types;
mod validation;

pub use amount_words::*;
pub use builder::*;
pub use calculation::*;
pub use error::*;
pub use naming::*;
pub use request::*;
pub use types::*;
pub use validation::*;
