//! OCR boundary: turning a receipt image into raw text.
//!
//! Recognition is delegated to Tesseract when the `tesseract` feature is
//! enabled. Without it every recognition fails with
//! [`OcrError::Unavailable`], so text inputs keep working on machines that
//! lack the Tesseract and Leptonica libraries. Everything past this module
//! works on the returned string only.

mod preprocessing;
#[cfg(feature = "tesseract")]
mod tesseract;
#[cfg(not(feature = "tesseract"))]
mod unavailable;

pub use preprocessing::ImagePreprocessor;
#[cfg(feature = "tesseract")]
pub use tesseract::{create_recognizer, TesseractRecognizer};
#[cfg(not(feature = "tesseract"))]
pub use unavailable::{create_recognizer, UnavailableRecognizer};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Anything that can recognize the text on a receipt image.
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text in the image at `image`.
    fn recognize(&self, image: &Path) -> Result<OcrResult, OcrError>;
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    /// Full recognized text, newline-delimited.
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height), when an image was processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<(u32, u32)>,
}

impl OcrResult {
    /// Wrap text that was recognized elsewhere.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// True when the recognizer produced no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
