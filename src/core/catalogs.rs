//! SUNAT code catalogs.
//!
//! Lookups for the subset of the published SUNAT catalogs this crate
//! validates against: catalog 06 (identity documents) and catalog 07
//! (IGV affectation), plus the currency names used in the amount legend.

/// Check whether `code` is a catalog 06 identity document type.
pub fn is_known_identity_document_type(code: &str) -> bool {
    IDENTITY_DOCUMENT_TYPES.binary_search(&code).is_ok()
}

/// Check whether `code` is a catalog 07 IGV affectation code.
pub fn is_known_igv_affectation_code(code: &str) -> bool {
    IGV_AFFECTATION_CODES.binary_search(&code).is_ok()
}

/// Catalog 06 code for a RUC.
pub const RUC: &str = "6";

/// Singular and plural currency names for the amount legend.
///
/// Unknown codes fall back to the code itself in both forms.
pub fn currency_name(code: &str) -> (&str, &str) {
    match code {
        "PEN" => ("SOL", "SOLES"),
        "USD" => ("DÓLAR AMERICANO", "DÓLARES AMERICANOS"),
        "EUR" => ("EURO", "EUROS"),
        other => (other, other),
    }
}

/// Sorted for binary search.
static IDENTITY_DOCUMENT_TYPES: &[&str] = &[
    "0", // Doc. trib. no dom. sin RUC
    "1", // DNI
    "4", // Carnet de extranjería
    "6", // RUC
    "7", // Pasaporte
    "A", // Cédula diplomática de identidad
    "B", // Doc. identidad país residencia no domiciliado
    "C", // TIN
    "D", // IN
    "E", // TAM
    "F", // Permiso temporal de permanencia
    "G", // Salvoconducto
];

/// Sorted for binary search.
static IGV_AFFECTATION_CODES: &[&str] = &[
    "10", // Gravado - operación onerosa
    "11", // Gravado - retiro por premio
    "12", // Gravado - retiro por donación
    "13", // Gravado - retiro
    "14", // Gravado - retiro por publicidad
    "15", // Gravado - bonificaciones
    "16", // Gravado - retiro por entrega a trabajadores
    "17", // Gravado - IVAP
    "20", // Exonerado - operación onerosa
    "21", // Exonerado - transferencia gratuita
    "30", // Inafecto - operación onerosa
    "31", // Inafecto - retiro por bonificación
    "32", // Inafecto - retiro
    "33", // Inafecto - retiro por muestras médicas
    "34", // Inafecto - retiro por convenio colectivo
    "35", // Inafecto - retiro por premio
    "36", // Inafecto - retiro por publicidad
    "37", // Inafecto - transferencia gratuita
    "40", // Exportación
];
