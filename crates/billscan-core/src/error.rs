//! Error types for the billscan-core library.
//!
//! Receipt extraction itself has no error type: a line or label that does
//! not match is simply absent from the result. Errors only arise at the
//! OCR and configuration boundaries.

use thiserror::Error;

/// Error type for loading and saving configuration.
#[derive(Error, Debug)]
pub enum BillscanError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while recognizing text on a receipt image.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The crate was built without an OCR engine.
    #[error("OCR support is not compiled in; rebuild with the `tesseract` feature")]
    Unavailable,

    /// Tesseract could not be initialized (missing library or language data).
    #[error("failed to initialize Tesseract: {0}")]
    Init(String),

    /// Tesseract ran but could not produce text.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),
}

/// Result type for the billscan library.
pub type Result<T> = std::result::Result<T, BillscanError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::BillscanConfig;

    #[test]
    fn test_missing_config_file_is_io_error() {
        let path = std::env::temp_dir().join("billscan-no-such-dir/config.json");
        let err = BillscanConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, BillscanError::Io(_)), "{err}");
        assert!(err.to_string().starts_with("I/O error: "));
    }
}
