//! Lines billed to the buyer of a sold property.

use serde::{Deserialize, Serialize};

use estate_core::{DomainError, DomainResult, Money};

use crate::invoice::InvoiceLine;

pub const ADMINISTRATIVE_FEE_LABEL: &str = "Administrative fees";

/// Commission rate and flat fee applied on every sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionTerms {
    /// Basis points of the selling price (600 = 6%).
    pub rate_bps: u32,
    pub administrative_fee: Money,
}

impl Default for CommissionTerms {
    fn default() -> Self {
        Self {
            rate_bps: 600,
            administrative_fee: Money::from_units(100),
        }
    }
}

/// Invoice lines for the sale of `property_name` at `selling_price`:
/// the commission first, then the administrative fee. Zero-amount lines are
/// left out, so the result may be empty.
pub fn sale_invoice_lines(
    property_name: &str,
    selling_price: Money,
    terms: &CommissionTerms,
) -> DomainResult<Vec<InvoiceLine>> {
    if !selling_price.is_positive() {
        return Err(DomainError::guard(
            "a property needs a positive selling price to be invoiced",
        ));
    }

    let charges = [
        (
            format!("Commission for {property_name}"),
            selling_price.apply_rate_bps(terms.rate_bps),
        ),
        (ADMINISTRATIVE_FEE_LABEL.to_string(), terms.administrative_fee),
    ];

    Ok(charges
        .into_iter()
        .filter(|(_, amount)| amount.is_positive())
        .zip(1..)
        .map(|((description, unit_price), line_no)| InvoiceLine {
            line_no,
            description,
            quantity: 1,
            unit_price,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_sale_produces_commission_and_fee() {
        let lines = sale_invoice_lines(
            "Seaside villa",
            Money::from_units(280_000),
            &CommissionTerms::default(),
        )
        .unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].description, "Commission for Seaside villa");
        assert_eq!(lines[0].unit_price, Money::from_units(16_800));
        assert_eq!(lines[1].description, "Administrative fees");
        assert_eq!(lines[1].unit_price, Money::from_units(100));
        assert!(lines.iter().all(|l| l.quantity == 1));
    }

    #[test]
    fn commission_rounds_to_the_cent() {
        // 6% of 0.25 is 0.015, rounded half-up.
        let lines =
            sale_invoice_lines("Hut", Money::from_cents(25), &CommissionTerms::default()).unwrap();
        assert_eq!(lines[0].unit_price, Money::from_cents(2));
    }

    #[test]
    fn zero_amount_lines_are_left_out() {
        let terms = CommissionTerms {
            rate_bps: 0,
            ..CommissionTerms::default()
        };
        let lines = sale_invoice_lines("Hut", Money::from_units(1_000), &terms).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[0].description, ADMINISTRATIVE_FEE_LABEL);

        let free = CommissionTerms {
            rate_bps: 0,
            administrative_fee: Money::ZERO,
        };
        assert!(sale_invoice_lines("Hut", Money::from_units(1_000), &free).unwrap().is_empty());
    }

    #[test]
    fn unpriced_sale_cannot_be_invoiced() {
        let err = sale_invoice_lines("Hut", Money::ZERO, &CommissionTerms::default()).unwrap_err();
        assert!(err.is_guard());
    }
}
