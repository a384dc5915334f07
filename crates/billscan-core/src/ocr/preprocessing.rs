//! Image preprocessing for OCR.

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use tracing::debug;

use crate::models::config::OcrConfig;

/// Image preprocessor run before recognition.
///
/// Brings the longer side into `[min_size, max_size]` and optionally drops
/// color.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Longer side below this is upscaled.
    min_size: u32,
    /// Longer side above this is downscaled.
    max_size: u32,
    /// Convert to grayscale.
    grayscale: bool,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self::from_config(&OcrConfig::default())
    }

    /// Create a preprocessor from OCR configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            min_size: config.min_image_size,
            max_size: config.max_image_size.max(config.min_image_size),
            grayscale: config.grayscale,
        }
    }

    /// Prepare an image for recognition.
    pub fn process(&self, image: &DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (new_width, new_height) = self.calculate_resize_dimensions(width, height);

        let resized = if (new_width, new_height) == (width, height) {
            image.clone()
        } else {
            debug!(
                "Resizing image {}x{} -> {}x{}",
                width, height, new_width, new_height
            );
            image.resize_exact(new_width, new_height, FilterType::Lanczos3)
        };

        if self.grayscale {
            DynamicImage::ImageLuma8(resized.to_luma8())
        } else {
            resized
        }
    }

    /// Target dimensions keeping the aspect ratio.
    pub fn calculate_resize_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let longer = width.max(height);
        if longer == 0 {
            return (width, height);
        }

        let target = if longer < self.min_size {
            self.min_size
        } else if longer > self.max_size {
            self.max_size
        } else {
            return (width, height);
        };

        let scale = target as f64 / longer as f64;
        let scaled = |v: u32| ((v as f64 * scale).round() as u32).max(1);
        (scaled(width), scaled(height))
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn preprocessor(min: u32, max: u32) -> ImagePreprocessor {
        ImagePreprocessor::from_config(&OcrConfig {
            min_image_size: min,
            max_image_size: max,
            ..Default::default()
        })
    }

    #[test]
    fn test_resize_dimensions() {
        let p = preprocessor(1000, 4000);

        // Within range
        assert_eq!(p.calculate_resize_dimensions(1200, 3000), (1200, 3000));

        // Small receipt thumbnail is upscaled
        assert_eq!(p.calculate_resize_dimensions(250, 500), (500, 1000));

        // Huge photo is downscaled
        assert_eq!(p.calculate_resize_dimensions(6000, 8000), (3000, 4000));

        // Degenerate
        assert_eq!(p.calculate_resize_dimensions(0, 0), (0, 0));
    }

    #[test]
    fn test_process_grayscale_and_resize() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 100, Rgb([200, 10, 10])));
        let out = preprocessor(200, 400).process(&image);

        assert_eq!(out.dimensions(), (100, 200));
        assert!(matches!(out, DynamicImage::ImageLuma8(_)));
    }
}
