//! Spanish amount legend ("monto en letras") required on every invoice.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::catalogs::currency_name;

/// Integer parts from here on are written with digits.
const WORDS_LIMIT: u64 = 1_000_000;

/// Render `amount` as the uppercase Spanish legend SUNAT expects.
///
/// ```
/// use factura_pe::core::amount_in_words;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(
///     amount_in_words(dec!(1234.56), "PEN"),
///     "MIL DOSCIENTOS TREINTA Y CUATRO CON 56/100 SOLES"
/// );
/// ```
///
/// The sign is ignored. Integer parts of one million or more are written
/// with digits.
pub fn amount_in_words(amount: Decimal, currency_code: &str) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let integer = rounded.trunc();
    let cents = ((rounded - integer) * Decimal::ONE_HUNDRED)
        .to_u64()
        .unwrap_or(0);

    let (singular, plural) = currency_name(currency_code);
    let currency = if integer == Decimal::ONE { singular } else { plural };

    let integer_text = match integer.to_u64() {
        Some(n) if n < WORDS_LIMIT => integer_to_words(n),
        _ => integer.normalize().to_string(),
    };

    format!("{integer_text} CON {cents:02}/100 {currency}")
}

/// Spell out a non-negative integer below one million.
fn integer_to_words(n: u64) -> String {
    if n == 0 {
        return "CERO".to_string();
    }
    let thousands = n / 1000;
    let rest = n % 1000;

    let mut parts = Vec::new();
    match thousands {
        0 => {}
        1 => parts.push("MIL".to_string()),
        t => parts.push(format!("{} MIL", apocope(&hundreds(t)))),
    }
    if rest > 0 {
        parts.push(hundreds(rest));
    }
    parts.join(" ")
}

/// "UNO" shortens to "UN" in front of a noun ("VEINTIUN MIL", "CIENTO UN MIL").
fn apocope(words: &str) -> String {
    match words.strip_suffix("UNO") {
        Some(stem) => format!("{stem}UN"),
        None => words.to_string(),
    }
}

fn hundreds(n: u64) -> String {
    const HUNDREDS: [&str; 10] = [
        "",
        "CIENTO",
        "DOSCIENTOS",
        "TRESCIENTOS",
        "CUATROCIENTOS",
        "QUINIENTOS",
        "SEISCIENTOS",
        "SETECIENTOS",
        "OCHOCIENTOS",
        "NOVECIENTOS",
    ];
    if n == 100 {
        return "CIEN".to_string();
    }
    let h = (n / 100) as usize;
    let rest = n % 100;
    match (h, rest) {
        (0, r) => tens(r),
        (h, 0) => HUNDREDS[h].to_string(),
        (h, r) => format!("{} {}", HUNDREDS[h], tens(r)),
    }
}

fn tens(n: u64) -> String {
    const UNITS: [&str; 30] = [
        "",
        "UNO",
        "DOS",
        "TRES",
        "CUATRO",
        "CINCO",
        "SEIS",
        "SIETE",
        "OCHO",
        "NUEVE",
        "DIEZ",
        "ONCE",
        "DOCE",
        "TRECE",
        "CATORCE",
        "QUINCE",
        "DIECISEIS",
        "DIECISIETE",
        "DIECIOCHO",
        "DIECINUEVE",
        "VEINTE",
        "VEINTIUNO",
        "VEINTIDOS",
        "VEINTITRES",
        "VEINTICUATRO",
        "VEINTICINCO",
        "VEINTISEIS",
        "VEINTISIETE",
        "VEINTIOCHO",
        "VEINTINUEVE",
    ];
    const TENS: [&str; 10] = [
        "", "", "", "TREINTA", "CUARENTA", "CINCUENTA", "SESENTA", "SETENTA", "OCHENTA", "NOVENTA",
    ];
    if n < 30 {
        return UNITS[n as usize].to_string();
    }
    let t = (n / 10) as usize;
    match n % 10 {
        0 => TENS[t].to_string(),
        u => format!("{} Y {}", TENS[t], UNITS[u as usize]),
    }
}
