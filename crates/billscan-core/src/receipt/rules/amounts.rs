//! Labeled amount extraction: totals and tax components.
//!
//! Labels are searched over the whole text rather than line by line, so a
//! label and its number may be separated by a line break. The first
//! occurrence of a label wins.

use regex::{Captures, Regex};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::patterns::{CGST, FINAL_AMOUNT, SGST, TOTAL_AMOUNT, VAT};
use super::{ExtractionMatch, FieldExtractor};

/// The labeled figures a receipt may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmountLabel {
    /// "Total" / "Total Amount" (pre-tax).
    Total,
    /// "Grand Total" / "Final Total" / "Final Amount".
    Final,
    /// Central GST.
    Cgst,
    /// State GST.
    Sgst,
    /// Value added tax.
    Vat,
}

impl AmountLabel {
    /// All labels, in the order they are reported.
    pub const ALL: [AmountLabel; 5] = [
        AmountLabel::Total,
        AmountLabel::Cgst,
        AmountLabel::Sgst,
        AmountLabel::Vat,
        AmountLabel::Final,
    ];

    /// Compiled pattern for this label.
    pub fn pattern(self) -> &'static Regex {
        match self {
            AmountLabel::Total => &*TOTAL_AMOUNT,
            AmountLabel::Final => &*FINAL_AMOUNT,
            AmountLabel::Cgst => &*CGST,
            AmountLabel::Sgst => &*SGST,
            AmountLabel::Vat => &*VAT,
        }
    }

    /// Field name used in the bill summary.
    pub fn field_name(self) -> &'static str {
        match self {
            AmountLabel::Total => "total_amount",
            AmountLabel::Final => "final_amount",
            AmountLabel::Cgst => "cgst",
            AmountLabel::Sgst => "sgst",
            AmountLabel::Vat => "vat",
        }
    }
}

impl fmt::Display for AmountLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Parse a receipt number token such as `45.50` or `1,250`.
///
/// Commas are dropped, so `1,250` reads as 1250. A trailing `.` is ignored.
pub fn parse_amount(token: &str) -> Option<Decimal> {
    let cleaned = token.replace(',', "");
    let cleaned = cleaned.trim_end_matches('.');
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

/// Find the first number following `label` anywhere in `text`.
///
/// Scanning stops at the first match. If that match's number does not
/// parse, the field is absent; later occurrences are not consulted.
pub fn find_labeled_amount(text: &str, label: AmountLabel) -> Option<Decimal> {
    let caps = label.pattern().captures(text)?;

    let value = parse_amount(&caps["value"]);
    match value {
        Some(v) => debug!("Found {} = {} in {:?}", label, v, &caps[0]),
        None => debug!("Unparseable {} in {:?}", label, &caps[0]),
    }
    value
}

/// Extractor for one labeled amount.
pub struct LabeledAmountExtractor {
    label: AmountLabel,
}

impl LabeledAmountExtractor {
    pub fn new(label: AmountLabel) -> Self {
        Self { label }
    }

    pub fn label(&self) -> AmountLabel {
        self.label
    }
}

impl FieldExtractor for LabeledAmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let caps = self.label.pattern().captures(text)?;
        to_match(&caps)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.label
            .pattern()
            .captures_iter(text)
            .filter_map(|caps| to_match(&caps))
            .collect()
    }
}

fn to_match(caps: &Captures<'_>) -> Option<ExtractionMatch<Decimal>> {
    let full = caps.get(0)?;
    let value = parse_amount(&caps["value"])?;
    Some(ExtractionMatch::new(value, full.as_str()).with_position(full.start(), full.end()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("45.50"), Some(dec("45.50")));
        assert_eq!(parse_amount("1,250"), Some(dec("1250")));
        assert_eq!(parse_amount("500."), Some(dec("500")));
        assert_eq!(parse_amount("0"), Some(Decimal::ZERO));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("99999999999999999999999999999999999"), None);
    }

    #[test]
    fn test_tax_labels() {
        let text = "Sub Total 400.00\nCGST: 45.50\nSGST - 45.50\nVAT 12";
        assert_eq!(find_labeled_amount(text, AmountLabel::Cgst), Some(dec("45.50")));
        assert_eq!(find_labeled_amount(text, AmountLabel::Sgst), Some(dec("45.50")));
        assert_eq!(find_labeled_amount(text, AmountLabel::Vat), Some(dec("12")));
    }

    #[test]
    fn test_missing_label_is_absent() {
        let text = "CGST: 45.50";
        assert_eq!(find_labeled_amount(text, AmountLabel::Sgst), None);
        assert_eq!(find_labeled_amount(text, AmountLabel::Final), None);
        assert_eq!(find_labeled_amount("", AmountLabel::Total), None);
    }

    #[test]
    fn test_label_without_number_is_absent() {
        assert_eq!(find_labeled_amount("VAT included", AmountLabel::Vat), None);
        assert_eq!(find_labeled_amount("Total: Rs. 500", AmountLabel::Total), None);
    }

    #[test]
    fn test_total_then_grand_total() {
        let text = "Total Amount 500\nGrand Total 550";
        assert_eq!(find_labeled_amount(text, AmountLabel::Total), Some(dec("500")));
        assert_eq!(find_labeled_amount(text, AmountLabel::Final), Some(dec("550")));
    }

    #[test]
    fn test_total_inside_grand_total_label() {
        // "Grand Total" also carries a "Total" label; whichever comes first wins.
        let reversed = "Grand Total 550\nTotal Amount 500";
        assert_eq!(find_labeled_amount(reversed, AmountLabel::Total), Some(dec("550")));
        assert_eq!(find_labeled_amount(reversed, AmountLabel::Final), Some(dec("550")));

        assert_eq!(find_labeled_amount("Grand Total 550", AmountLabel::Total), Some(dec("550")));

        let text = "Grand Total Amount: 630";
        assert_eq!(find_labeled_amount(text, AmountLabel::Total), Some(dec("630")));
        assert_eq!(find_labeled_amount(text, AmountLabel::Final), None);
    }

    #[test]
    fn test_final_label_variants() {
        assert_eq!(find_labeled_amount("FINAL TOTAL: 99.90", AmountLabel::Final), Some(dec("99.90")));
        assert_eq!(find_labeled_amount("Final Amount-1,050", AmountLabel::Final), Some(dec("1050")));
        assert_eq!(find_labeled_amount("grand total\n720", AmountLabel::Final), Some(dec("720")));
    }

    #[test]
    fn test_first_match_wins() {
        let text = "CGST 10\nCGST 20";
        assert_eq!(find_labeled_amount(text, AmountLabel::Cgst), Some(dec("10")));

        let all = LabeledAmountExtractor::new(AmountLabel::Cgst).extract_all(text);
        let values: Vec<Decimal> = all.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![dec("10"), dec("20")]);
        assert_eq!(all[0].source, "CGST 10");
        assert_eq!(all[0].position, Some((0, 7)));
    }

    #[test]
    fn test_unparseable_first_match_stops_the_scan() {
        let text = "VAT 99999999999999999999999999999999\nVAT 5";
        assert_eq!(find_labeled_amount(text, AmountLabel::Vat), None);

        // Collecting every occurrence still sees the later, parseable one.
        let all = LabeledAmountExtractor::new(AmountLabel::Vat).extract_all(text);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, dec("5"));
    }

    #[test]
    fn test_extractor_positions_inside_grand_total() {
        let text = "Grand Total 550\nSubtotal 500";
        let extractor = LabeledAmountExtractor::new(AmountLabel::Total);

        let first = extractor.extract(text).unwrap();
        assert_eq!(first.value, dec("550"));
        assert_eq!(first.position, Some((6, 15)));

        let values: Vec<Decimal> = extractor.extract_all(text).iter().map(|m| m.value).collect();
        assert_eq!(values, vec![dec("550"), dec("500")]);
    }
}
