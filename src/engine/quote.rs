//! Quote arithmetic
//!
//! One formula for every call site: quote submission, the client-facing quote
//! summary, and payment settlement all go through `company_fee_on`.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use super::{EngineError, EngineResult};
use crate::domain::{Quote, QuoteInput, QuoteItem, QuoteSummary, QuoteTotals};

/// Platform cut, 10%
pub const FEE_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Round to the nearest whole currency unit, halves rounding up
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Company fee charged on `amount`
pub fn company_fee_on(amount: Decimal) -> Decimal {
    round_currency(amount * FEE_RATE)
}

/// Compute subtotal, fee and total. Subtotal keeps full precision.
pub fn compute(items: &[QuoteItem]) -> QuoteTotals {
    let subtotal: Decimal = items.iter().map(QuoteItem::line_total).sum();
    let company_fee = company_fee_on(subtotal);

    QuoteTotals {
        subtotal,
        company_fee,
        total: subtotal + company_fee,
    }
}

/// Reject empty quotes, non-positive quantities and negative prices
pub fn validate_items(items: &[QuoteItem]) -> EngineResult<()> {
    if items.is_empty() {
        return Err(EngineError::invalid_field(
            "items",
            "a quote needs at least one item",
        ));
    }

    for (idx, item) in items.iter().enumerate() {
        if item.description.trim().is_empty() {
            return Err(EngineError::invalid_field(
                &format!("items[{}].description", idx),
                "item description is required",
            ));
        }
        if item.quantity <= Decimal::ZERO {
            return Err(EngineError::invalid_field(
                &format!("items[{}].quantity", idx),
                "quantity must be greater than zero",
            ));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(EngineError::invalid_field(
                &format!("items[{}].unit_price", idx),
                "unit price cannot be negative",
            ));
        }
    }

    Ok(())
}

/// Validate input and build the quote with freshly derived totals
pub fn build_quote(input: QuoteInput, now: DateTime<Utc>) -> EngineResult<Quote> {
    validate_items(&input.items)?;
    let totals = compute(&input.items);

    Ok(Quote {
        items: input.items,
        work_type: input.work_type,
        duration: input.duration,
        payment_terms: input.payment_terms,
        notes: input.notes,
        subtotal: totals.subtotal,
        company_fee: totals.company_fee,
        total: totals.total,
        submitted_at: now,
    })
}

/// Display-boundary view of a set of items
pub fn summarize(items: &[QuoteItem]) -> QuoteSummary {
    let totals = compute(items);

    QuoteSummary {
        items: items.to_vec(),
        subtotal: round_currency(totals.subtotal),
        company_fee: totals.company_fee,
        total: round_currency(totals.total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(qty: i64, price: i64) -> QuoteItem {
        QuoteItem {
            description: "work".to_string(),
            quantity: Decimal::from(qty),
            unit_price: Decimal::from(price),
        }
    }

    #[test]
    fn computes_subtotal_fee_and_total() {
        let totals = compute(&[item(2, 1000), item(1, 500)]);

        assert_eq!(totals.subtotal, Decimal::from(2500));
        assert_eq!(totals.company_fee, Decimal::from(250));
        assert_eq!(totals.total, Decimal::from(2750));
    }

    #[test]
    fn fee_rounds_half_up() {
        // 10% of 1005 is 100.5
        assert_eq!(company_fee_on(Decimal::from(1005)), Decimal::from(101));
        // 10% of 1004 is 100.4
        assert_eq!(company_fee_on(Decimal::from(1004)), Decimal::from(100));
    }

    #[test]
    fn subtotal_keeps_precision_until_display() {
        let items = vec![
            QuoteItem {
                description: "cable".to_string(),
                quantity: Decimal::new(25, 1),
                unit_price: Decimal::new(3333, 2),
            },
            QuoteItem {
                description: "sockets".to_string(),
                quantity: Decimal::from(3),
                unit_price: Decimal::new(3333, 2),
            },
        ];

        let totals = compute(&items);
        // 2.5 * 33.33 + 3 * 33.33 = 183.315
        assert_eq!(totals.subtotal, Decimal::new(183315, 3));
        assert_eq!(totals.company_fee, Decimal::from(18));

        let summary = summarize(&items);
        assert_eq!(summary.subtotal, Decimal::from(183));
        assert_eq!(summary.total, Decimal::from(201));
    }

    #[test]
    fn rejects_invalid_items() {
        assert!(matches!(
            validate_items(&[]),
            Err(EngineError::Validation { .. })
        ));
        assert!(validate_items(&[item(0, 100)]).is_err());
        assert!(validate_items(&[item(1, -1)]).is_err());
        assert!(validate_items(&[item(1, 0)]).is_ok());
    }

    #[test]
    fn build_quote_recomputes_totals_from_items() {
        let input: QuoteInput = serde_json::from_value(serde_json::json!({
            "items": [{"description": "tiles", "quantity": 4, "unitPrice": 1000}],
            "workType": "Tiling",
            "total": 1
        }))
        .unwrap();

        let quote = build_quote(input, Utc::now()).unwrap();
        assert_eq!(quote.work_type.as_deref(), Some("Tiling"));
        assert_eq!(quote.total, Decimal::from(4400));
    }
}
