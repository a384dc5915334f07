//! Bill data models produced by receipt extraction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One purchased product line on a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Sanitized item name.
    pub item: String,

    /// Number of units.
    pub quantity: u64,

    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,

    /// Extended price for the line.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Structured billing data extracted from one receipt.
///
/// Every figure is optional: `None` means the label was not found in the
/// text, never zero. Absent figures serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillSummary {
    /// Line items in order of appearance.
    pub items: Vec<LineItem>,

    /// Pre-tax total.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,

    /// Central GST.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub cgst: Option<Decimal>,

    /// State GST.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sgst: Option<Decimal>,

    /// Value added tax.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub vat: Option<Decimal>,

    /// Grand total.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub final_amount: Option<Decimal>,
}

impl BillSummary {
    /// Returns true when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
            && self.total_amount.is_none()
            && self.cgst.is_none()
            && self.sgst.is_none()
            && self.vat.is_none()
            && self.final_amount.is_none()
    }

    /// Sum of all line amounts.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|i| i.amount).sum()
    }

    /// Sum of the tax components that were found.
    pub fn taxes_total(&self) -> Option<Decimal> {
        let taxes = [self.cgst, self.sgst, self.vat];
        if taxes.iter().all(Option::is_none) {
            return None;
        }
        Some(taxes.iter().flatten().sum())
    }

    /// Check the extracted figures against each other and return any issues.
    ///
    /// A check is only made when every figure it needs is present. The notes
    /// are advisory; the summary itself is never altered.
    pub fn validate(&self, tolerance: Decimal) -> Vec<String> {
        let mut issues = Vec::new();

        if let Some(total) = self.total_amount {
            if !self.items.is_empty() {
                let items_total = self.items_total();
                if (items_total - total).abs() > tolerance {
                    issues.push(format!(
                        "Line item total ({}) differs from total amount ({})",
                        items_total, total
                    ));
                }
            }
        }

        for item in &self.items {
            let expected = item.rate * Decimal::from(item.quantity);
            if (expected - item.amount).abs() > tolerance {
                issues.push(format!(
                    "Line '{}': {} x {} = {}, but amount is {}",
                    item.item, item.quantity, item.rate, expected, item.amount
                ));
            }
        }

        if let (Some(total), Some(taxes), Some(final_amount)) =
            (self.total_amount, self.taxes_total(), self.final_amount)
        {
            let expected = total + taxes;
            if (expected - final_amount).abs() > tolerance {
                issues.push(format!(
                    "Total plus taxes ({}) differs from final amount ({})",
                    expected, final_amount
                ));
            }
        }

        issues
    }
}
