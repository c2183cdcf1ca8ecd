use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::{CpeError, ValidationError};
use super::types::*;

fn overflow(field: impl Into<String>) -> ValidationError {
    ValidationError::new(field, "amount exceeds the representable range")
}

fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

fn line_amounts(line: &mut DocumentLine) -> Result<(), ValidationError> {
    line.total_price = line
        .quantity
        .checked_mul(line.unit_price)
        .ok_or_else(|| overflow("total_price"))?;
    line.taxable_amount = line.total_price;
    for (j, tax) in line.taxes.iter_mut().enumerate() {
        tax.amount = line
            .taxable_amount
            .checked_mul(tax.rate)
            .and_then(|v| v.checked_div(dec!(100)))
            .ok_or_else(|| overflow(format!("taxes[{j}].amount")))?;
    }
    Ok(())
}

/// Compute `total_price`, `taxable_amount` and every tax amount of a line.
///
/// Amounts are exact decimals; nothing is rounded here. A product that
/// does not fit in a `Decimal` is a `Validation` error.
pub fn calculate_line(line: &mut DocumentLine) -> Result<(), CpeError> {
    line_amounts(line).map_err(|e| CpeError::from_validation(&[e]))
}

/// Compute every line, then `sub_total`, `total_taxes` and `total_amount`.
///
/// Overflowing lines are all reported, with `lines[i]` field paths.
pub fn calculate_totals(doc: &mut Document) -> Result<(), CpeError> {
    let errors: Vec<_> = doc
        .lines
        .iter_mut()
        .enumerate()
        .filter_map(|(i, line)| {
            line_amounts(line)
                .err()
                .map(|e| ValidationError::new(format!("lines[{i}].{}", e.field), e.message))
        })
        .collect();
    if !errors.is_empty() {
        return Err(CpeError::from_validation(&errors));
    }

    let sub_total = checked_sum(doc.lines.iter().map(|l| l.total_price))
        .ok_or_else(|| overflow("sub_total"));
    let total_taxes = checked_sum(doc.lines.iter().flat_map(|l| &l.taxes).map(|t| t.amount))
        .ok_or_else(|| overflow("total_taxes"));
    let (sub_total, total_taxes) = match (sub_total, total_taxes) {
        (Ok(s), Ok(t)) => (s, t),
        (s, t) => {
            let errors: Vec<_> = [s.err(), t.err()].into_iter().flatten().collect();
            return Err(CpeError::from_validation(&errors));
        }
    };
    doc.total_amount = sub_total
        .checked_add(total_taxes)
        .ok_or_else(|| CpeError::from_validation(&[overflow("total_amount")]))?;
    doc.sub_total = sub_total;
    doc.total_taxes = total_taxes;
    Ok(())
}

/// Unit price including all line taxes, for `cac:PricingReference`.
pub fn reference_unit_price(line: &DocumentLine) -> Result<Decimal, CpeError> {
    line.total_tax_rate()
        .and_then(|rate| rate.checked_div(dec!(100)))
        .and_then(|rate| Decimal::ONE.checked_add(rate))
        .and_then(|factor| factor.checked_mul(line.unit_price))
        .ok_or_else(|| {
            CpeError::from_validation(&[overflow(format!("lines[{}].unit_price", line.id))])
        })
}

/// One `cac:TaxSubtotal`: taxes of the same type and affectation code.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxSubtotal {
    pub tax_type: TaxType,
    pub code: String,
    /// Rate of the first tax seen in the group.
    pub rate: Decimal,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
}

/// Group the taxes of `lines` by `(tax_type, code)`.
///
/// Groups come out ordered by tax type, then code.
pub fn tax_subtotals<'a>(
    lines: impl IntoIterator<Item = &'a DocumentLine>,
) -> Result<Vec<TaxSubtotal>, CpeError> {
    let mut groups: BTreeMap<(TaxType, String), TaxSubtotal> = BTreeMap::new();
    for line in lines {
        for tax in &line.taxes {
            let entry = groups
                .entry((tax.tax_type.clone(), tax.code.clone()))
                .or_insert_with(|| TaxSubtotal {
                    tax_type: tax.tax_type.clone(),
                    code: tax.code.clone(),
                    rate: tax.rate,
                    taxable_amount: Decimal::ZERO,
                    tax_amount: Decimal::ZERO,
                });
            entry.taxable_amount = entry
                .taxable_amount
                .checked_add(line.taxable_amount)
                .ok_or_else(|| CpeError::from_validation(&[overflow("tax_subtotal.taxable_amount")]))?;
            entry.tax_amount = entry
                .tax_amount
                .checked_add(tax.amount)
                .ok_or_else(|| CpeError::from_validation(&[overflow("tax_subtotal.tax_amount")]))?;
        }
    }
    Ok(groups.into_values().collect())
}
