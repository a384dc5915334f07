//! Configuration structures for the receipt pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BillscanError, Result};

/// Main configuration for the billscan pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillscanConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Receipt extraction configuration.
    pub extraction: ExtractionConfig,
}

/// OCR recognizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory holding Tesseract language data; the library default when unset.
    pub tessdata_dir: Option<String>,

    /// Recognition language.
    pub language: String,

    /// Tesseract page segmentation mode.
    pub psm: u8,

    /// Normalize the image before recognition.
    pub preprocess: bool,

    /// Convert to grayscale during preprocessing.
    pub grayscale: bool,

    /// Images whose longer side is below this are upscaled.
    pub min_image_size: u32,

    /// Images whose longer side is above this are downscaled.
    pub max_image_size: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tessdata_dir: None,
            language: "eng".to_string(),
            psm: 6, // Single uniform block, suits narrow receipts
            preprocess: true,
            grayscale: true,
            min_image_size: 1000,
            max_image_size: 4000,
        }
    }
}

/// Receipt extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Cross-check line items, taxes and totals after extraction.
    pub validate_totals: bool,

    /// Allowed difference when cross-checking amounts.
    #[serde(with = "rust_decimal::serde::float")]
    pub tolerance: Decimal,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            validate_totals: true,
            tolerance: Decimal::new(1, 2),
        }
    }
}

impl BillscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| BillscanError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| BillscanError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: BillscanConfig =
            serde_json::from_str(r#"{"ocr": {"language": "hin"}}"#).unwrap();

        assert_eq!(config.ocr.language, "hin");
        assert_eq!(config.ocr.tessdata_dir, None);
        assert_eq!(config.ocr.psm, 6);
        assert!(config.extraction.validate_totals);
        assert_eq!(config.extraction.tolerance, Decimal::new(1, 2));
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let dir = std::env::temp_dir().join(format!("billscan-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = BillscanConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, BillscanError::Config(_)));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
