//! Recognizer used when the crate is built without an OCR engine.

use std::path::Path;

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{OcrResult, TextRecognizer};

/// Recognizer that rejects every image.
#[derive(Debug, Clone, Default)]
pub struct UnavailableRecognizer;

impl TextRecognizer for UnavailableRecognizer {
    fn recognize(&self, _image: &Path) -> Result<OcrResult, OcrError> {
        Err(OcrError::Unavailable)
    }
}

/// Build the default recognizer for the given configuration.
pub fn create_recognizer(_config: &OcrConfig) -> Box<dyn TextRecognizer> {
    Box::new(UnavailableRecognizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_reports_missing_feature() {
        let recognizer = create_recognizer(&OcrConfig::default());
        let err = recognizer.recognize(Path::new("receipt.png")).unwrap_err();
        assert!(matches!(err, OcrError::Unavailable));
        assert!(err.to_string().contains("tesseract"));
    }
}
