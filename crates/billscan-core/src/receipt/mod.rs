//! Restaurant receipt field extraction.

mod parser;
pub mod rules;

pub use parser::{extract, ExtractionResult, ReceiptParser};

use crate::models::bill::BillSummary;
use crate::ocr::OcrResult;

/// Trait for receipt extractors.
///
/// Extraction never fails: text that carries nothing recognizable yields an
/// empty [`BillSummary`].
pub trait ReceiptExtractor {
    /// Extract bill data from an OCR result.
    fn extract(&self, ocr_result: &OcrResult) -> BillSummary;

    /// Extract bill data from plain text.
    fn extract_from_text(&self, text: &str) -> BillSummary;
}
