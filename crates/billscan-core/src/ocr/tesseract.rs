//! Text recognizer backed by libtesseract (through `leptess`).

use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, ImageFormat};
use leptess::{LepTess, Variable};
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{ImagePreprocessor, OcrResult, TextRecognizer};

/// Resolution reported to Tesseract for in-memory images.
const SOURCE_DPI: i32 = 300;

/// Recognizer that runs Tesseract in-process.
///
/// A fresh engine is created for every image, so one recognizer can be
/// shared between threads.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    tessdata_dir: Option<String>,
    language: String,
    psm: u8,
    preprocessor: Option<ImagePreprocessor>,
}

impl TesseractRecognizer {
    /// Create a recognizer from OCR configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            tessdata_dir: config.tessdata_dir.clone(),
            language: config.language.clone(),
            psm: config.psm,
            preprocessor: config
                .preprocess
                .then(|| ImagePreprocessor::from_config(config)),
        }
    }

    /// Enable or disable preprocessing.
    pub fn with_preprocessor(mut self, preprocessor: Option<ImagePreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    fn engine(&self) -> Result<LepTess, OcrError> {
        let mut engine = LepTess::new(self.tessdata_dir.as_deref(), &self.language)
            .map_err(|e| OcrError::Init(format!("language {:?}: {}", self.language, e)))?;
        engine
            .set_variable(Variable::TesseditPagesegMode, &self.psm.to_string())
            .map_err(|e| OcrError::Init(format!("page segmentation mode {}: {}", self.psm, e)))?;
        Ok(engine)
    }

    fn read_text(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| OcrError::Preprocessing(e.to_string()))?;

        let mut engine = self.engine()?;
        engine
            .set_image_from_mem(&png)
            .map_err(|e| OcrError::Recognition(format!("loading image: {}", e)))?;
        engine.set_source_resolution(SOURCE_DPI);

        engine
            .get_utf8_text()
            .map_err(|e| OcrError::Recognition(e.to_string()))
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::from_config(&OcrConfig::default())
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &Path) -> Result<OcrResult, OcrError> {
        let start = Instant::now();

        let decoded = image::open(image)
            .map_err(|e| OcrError::InvalidImage(format!("{}: {}", image.display(), e)))?;
        let image_size = (decoded.width(), decoded.height());

        let text = match &self.preprocessor {
            Some(preprocessor) => self.read_text(&preprocessor.process(&decoded))?,
            None => self.read_text(&decoded)?,
        };
        debug!("Tesseract returned {} bytes for {}", text.len(), image.display());

        let result = OcrResult {
            text,
            processing_time_ms: start.elapsed().as_millis() as u64,
            image_size: Some(image_size),
        };

        if result.is_blank() {
            warn!("No text recognized in {}", image.display());
        } else {
            info!(
                "Recognized {} characters in {}ms",
                result.text.len(),
                result.processing_time_ms
            );
        }

        Ok(result)
    }
}

/// Build the default recognizer for the given configuration.
pub fn create_recognizer(config: &OcrConfig) -> Box<dyn TextRecognizer> {
    Box::new(TesseractRecognizer::from_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_png(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("receipt.png");
        DynamicImage::ImageRgb8(RgbImage::new(40, 80))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_invalid_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-image.png");
        std::fs::write(&path, b"plain text").unwrap();

        for preprocess in [true, false] {
            let config = OcrConfig {
                preprocess,
                ..Default::default()
            };
            let err = TesseractRecognizer::from_config(&config)
                .recognize(&path)
                .unwrap_err();
            assert!(matches!(err, OcrError::InvalidImage(_)), "{err}");
        }
    }

    #[test]
    fn test_missing_language_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path());
        let empty_tessdata = tempfile::tempdir().unwrap();

        let config = OcrConfig {
            tessdata_dir: Some(empty_tessdata.path().display().to_string()),
            ..Default::default()
        };
        let err = TesseractRecognizer::from_config(&config)
            .recognize(&path)
            .unwrap_err();
        assert!(matches!(err, OcrError::Init(_)), "{err}");
        assert!(err.to_string().contains("\"eng\""));
    }

    #[test]
    fn test_config_reaches_recognizer() {
        let config = OcrConfig {
            language: "hin".to_string(),
            psm: 4,
            preprocess: false,
            ..Default::default()
        };
        let recognizer = TesseractRecognizer::from_config(&config);
        assert_eq!(recognizer.language, "hin");
        assert_eq!(recognizer.psm, 4);
        assert!(recognizer.preprocessor.is_none());

        let recognizer = recognizer.with_preprocessor(Some(ImagePreprocessor::new()));
        assert!(recognizer.preprocessor.is_some());
    }
}
