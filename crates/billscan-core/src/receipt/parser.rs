//! Receipt parser: turns raw OCR text into a bill summary.

use std::collections::HashMap;
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::models::bill::BillSummary;
use crate::models::config::ExtractionConfig;
use crate::ocr::OcrResult;

use super::rules::{
    amounts::{find_labeled_amount, AmountLabel, LabeledAmountExtractor},
    lines::extract_line_items,
    FieldExtractor,
};
use super::ReceiptExtractor;

/// Extract structured bill data from raw OCR text.
///
/// Pure and deterministic. Item lines are classified one line at a time;
/// labeled figures are searched over the whole text, first match wins.
pub fn extract(raw_text: &str) -> BillSummary {
    BillSummary {
        items: extract_line_items(raw_text),
        total_amount: find_labeled_amount(raw_text, AmountLabel::Total),
        cgst: find_labeled_amount(raw_text, AmountLabel::Cgst),
        sgst: find_labeled_amount(raw_text, AmountLabel::Sgst),
        vat: find_labeled_amount(raw_text, AmountLabel::Vat),
        final_amount: find_labeled_amount(raw_text, AmountLabel::Final),
    }
}

/// Result of receipt extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted bill data.
    pub summary: BillSummary,
    /// Raw text the summary was extracted from.
    pub raw_text: String,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Receipt parser with post-extraction diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ReceiptParser {
    config: ExtractionConfig,
}

impl ReceiptParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set extraction configuration.
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable or disable cross-checking of totals.
    pub fn with_total_validation(mut self, validate: bool) -> Self {
        self.config.validate_totals = validate;
        self
    }

    /// Parse a receipt. Never fails; problems are reported as warnings.
    pub fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();

        info!("Parsing receipt from {} characters of text", text.len());

        let summary = extract(text);
        let mut warnings = Vec::new();

        if summary.items.is_empty() {
            warnings.push("Could not extract line items".to_string());
        }
        if summary.total_amount.is_none() {
            warnings.push("Could not extract total amount".to_string());
        }
        if summary.final_amount.is_none() {
            warnings.push("Could not extract final amount".to_string());
        }
        if summary.taxes_total().is_none() {
            warnings.push("Could not extract any tax (CGST, SGST, VAT)".to_string());
        }

        warnings.extend(conflicting_labels(text));

        if self.config.validate_totals {
            warnings.extend(summary.validate(self.config.tolerance));
        }

        debug!(
            "Extracted {} line items with {} warnings",
            summary.items.len(),
            warnings.len()
        );

        ExtractionResult {
            summary,
            raw_text: text.to_string(),
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Report labels printed more than once with different values.
///
/// A "Total" that is part of a grand/final total label is not counted as a
/// repeat of the plain total.
fn conflicting_labels(text: &str) -> Vec<String> {
    let final_spans: Vec<(usize, usize)> = LabeledAmountExtractor::new(AmountLabel::Final)
        .extract_all(text)
        .iter()
        .filter_map(|m| m.position)
        .collect();

    let mut warnings = Vec::new();

    for label in AmountLabel::ALL {
        let mut found = LabeledAmountExtractor::new(label).extract_all(text);
        let Some(used) = found.first().map(|m| m.value) else {
            continue;
        };
        if label == AmountLabel::Total {
            found.retain(|m| !within_any(m.position, &final_spans));
        }

        let mut seen: HashMap<Decimal, usize> = HashMap::new();
        for m in &found {
            *seen.entry(m.value.normalize()).or_default() += 1;
        }
        if seen.len() > 1 {
            warnings.push(format!(
                "{} appears {} times with different values; using {}",
                label,
                found.len(),
                used
            ));
        }
    }

    warnings
}

fn within_any(position: Option<(usize, usize)>, spans: &[(usize, usize)]) -> bool {
    position.is_some_and(|(start, end)| {
        spans
            .iter()
            .any(|&(outer_start, outer_end)| outer_start <= start && end <= outer_end)
    })
}

impl ReceiptExtractor for ReceiptParser {
    fn extract(&self, ocr_result: &OcrResult) -> BillSummary {
        if ocr_result.is_blank() {
            info!("OCR result has no text, nothing to extract");
        }
        self.parse(&ocr_result.text).summary
    }

    fn extract_from_text(&self, text: &str) -> BillSummary {
        self.parse(text).summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const RECEIPT: &str = r#"
        SPICE GARDEN RESTAURANT
        MG Road, Bengaluru
        Item            Qty  Rate   Amount
        Paneer Butter Masala 2 150 300
        Butter Naan     4    45     180
        Sweet Lassi     2    60.00  120.00
        Total Amount: 600.00
        CGST 2.5%: 15.00
        SGST: 15.00
        Grand Total: 630.00
        Thank you, visit again!
    "#;

    #[test]
    fn test_parse_full_receipt() {
        let result = ReceiptParser::new().parse(RECEIPT);
        let summary = &result.summary;

        let names: Vec<&str> = summary.items.iter().map(|i| i.item.as_str()).collect();
        assert_eq!(names, vec!["Paneer Butter Masala", "Butter Naan", "Sweet Lassi"]);
        assert_eq!(summary.total_amount, Some(dec("600")));
        assert_eq!(summary.sgst, Some(dec("15")));
        assert_eq!(summary.vat, None);
        assert_eq!(summary.final_amount, Some(dec("630")));
        assert_eq!(result.raw_text, RECEIPT);
    }

    #[test]
    fn test_cgst_with_rate_takes_rate() {
        // The number right after the label wins, even if it is a percentage.
        let summary = extract("CGST 2.5%: 15.00");
        assert_eq!(summary.cgst, Some(dec("2.5")));
    }

    #[test]
    fn test_empty_text_warnings() {
        let result = ReceiptParser::new().parse("");
        assert!(result.summary.is_empty());
        assert_eq!(
            result.warnings,
            vec![
                "Could not extract line items",
                "Could not extract total amount",
                "Could not extract final amount",
                "Could not extract any tax (CGST, SGST, VAT)",
            ]
        );
    }

    #[test]
    fn test_validation_warnings_follow_config() {
        let text = "Tea 2 20 40\nTotal 50\nVAT 5\nGrand Total 55";

        let result = ReceiptParser::new().parse(text);
        assert!(result.warnings.iter().any(|w| w.starts_with("Line item total")));

        let result = ReceiptParser::new().with_total_validation(false).parse(text);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_conflicting_labels_warning() {
        let text = "Total 100\nTotal 120";
        let warnings = conflicting_labels(text);
        assert_eq!(
            warnings,
            vec!["total_amount appears 2 times with different values; using 100"]
        );

        assert!(conflicting_labels("VAT 5.0\nVAT 5").is_empty());
    }

    #[test]
    fn test_grand_total_is_not_a_repeated_total() {
        assert!(conflicting_labels("Total 500\nGrand Total 550").is_empty());
        assert!(conflicting_labels("Total Amount: 600\nFinal Total - 630").is_empty());

        let warnings = conflicting_labels("Total 500\nGrand Total 550\nTotal 520");
        assert_eq!(
            warnings,
            vec!["total_amount appears 2 times with different values; using 500"]
        );

        // The nested grand total comes first, so it is the value in use.
        let warnings = conflicting_labels("Grand Total 550\nTotal 500\nTotal 520");
        assert_eq!(
            warnings,
            vec!["total_amount appears 2 times with different values; using 550"]
        );
    }

    #[test]
    fn test_extractor_trait() {
        let parser = ReceiptParser::new();
        let ocr = OcrResult::from_text("Idli 2 30 60\nGrand Total 60");
        let summary = ReceiptExtractor::extract(&parser, &ocr);
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.final_amount, Some(dec("60")));
        assert_eq!(parser.extract_from_text(&ocr.text), summary);
    }
}
