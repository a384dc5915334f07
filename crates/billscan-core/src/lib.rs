//! Core library for restaurant receipt OCR processing.
//!
//! This crate provides:
//! - Receipt text extraction (line items, CGST/SGST/VAT, totals)
//! - An OCR boundary with a Tesseract-backed recognizer (feature `tesseract`)
//! - Bill data models and pipeline configuration

pub mod error;
pub mod models;
pub mod ocr;
pub mod receipt;

pub use error::{BillscanError, OcrError, Result};
pub use models::bill::{BillSummary, LineItem};
pub use models::config::BillscanConfig;
pub use ocr::{create_recognizer, OcrResult, TextRecognizer};
#[cfg(feature = "tesseract")]
pub use ocr::TesseractRecognizer;
pub use receipt::{extract, ExtractionResult, ReceiptExtractor, ReceiptParser};
