//! Image normalization for OCR.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::median_filter;
use tracing::debug;

use super::{NormalizedImage, RawImage};

/// Images taller than this are downscaled before anything else.
pub const MAX_HEIGHT: u32 = 2000;

/// Fixed gain of the linear contrast stretch.
const CONTRAST_GAIN: f32 = 1.5;

/// Median filter radius (1 = 3x3 neighborhood).
const MEDIAN_RADIUS: u32 = 1;

/// Deterministic preprocessing chain: resize, grayscale, contrast, denoise,
/// binarize. The steps and their order are fixed.
#[derive(Debug, Clone, Default)]
pub struct ImageNormalizer;

impl ImageNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize an optional image; `None` in gives `None` out.
    pub fn normalize_opt(&self, image: Option<&RawImage>) -> Option<NormalizedImage> {
        image.and_then(|image| self.normalize(image))
    }

    /// Normalize an image. Returns `None` only when the bitmap has no pixels.
    pub fn normalize(&self, image: &RawImage) -> Option<NormalizedImage> {
        self.normalize_bitmap(image.bitmap())
    }

    /// Run the chain on any bitmap.
    pub fn normalize_bitmap(&self, image: &DynamicImage) -> Option<NormalizedImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        let resized = match target_dimensions(width, height) {
            Some((new_width, new_height)) => {
                debug!(
                    "Downscaling {}x{} to {}x{}",
                    width, height, new_width, new_height
                );
                image.resize_exact(new_width, new_height, FilterType::Triangle)
            }
            None => image.clone(),
        };

        let gray = resized.to_luma8();
        let stretched = stretch_contrast(&gray);
        let denoised = median_filter(&stretched, MEDIAN_RADIUS, MEDIAN_RADIUS);
        let level = otsu_level(&denoised);
        debug!("Otsu threshold level: {}", level);

        Some(NormalizedImage::new(binarize(&denoised, level)))
    }
}

/// New (width, height) when the image exceeds [`MAX_HEIGHT`].
fn target_dimensions(width: u32, height: u32) -> Option<(u32, u32)> {
    if height <= MAX_HEIGHT {
        return None;
    }

    let scale = MAX_HEIGHT as f64 / height as f64;
    let new_width = (width as f64 * scale).round() as u32;
    Some((new_width.max(1), MAX_HEIGHT))
}

/// Multiply every intensity by [`CONTRAST_GAIN`], saturating at 255.
fn stretch_contrast(image: &GrayImage) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let value = (pixel[0] as f32 * CONTRAST_GAIN).round();
        pixel[0] = value.min(255.0) as u8;
    }
    out
}

/// Pixels above `level` become white, the rest black.
fn binarize(image: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::ImageOrigin;
    use image::{ImageBuffer, Rgb, RgbImage};
    use std::collections::BTreeSet;

    fn levels(image: &GrayImage) -> BTreeSet<u8> {
        image.pixels().map(|p| p[0]).collect()
    }

    /// Dark "text" stripes on a light background.
    fn striped_rgb(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, _| {
            if (x / 4) % 2 == 0 {
                Rgb([30u8, 30, 40])
            } else {
                Rgb([150u8, 140, 130])
            }
        })
    }

    #[test]
    fn test_resize_dimensions() {
        assert_eq!(target_dimensions(1500, 2000), None);
        assert_eq!(target_dimensions(3000, 4000), Some((1500, 2000)));
        assert_eq!(target_dimensions(1001, 3000), Some((667, 2000)));
        assert_eq!(target_dimensions(1, 50_000), Some((1, 2000)));
    }

    #[test]
    fn test_contrast_saturates() {
        let image = GrayImage::from_fn(3, 1, |x, _| Luma([[10u8, 100, 200][x as usize]]));
        let out = stretch_contrast(&image);
        assert_eq!(out.get_pixel(0, 0)[0], 15);
        assert_eq!(out.get_pixel(1, 0)[0], 150);
        assert_eq!(out.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_output_is_binary_single_channel() {
        let raw = RawImage::new(
            "stripes.png",
            ImageOrigin::Upload,
            DynamicImage::ImageRgb8(striped_rgb(64, 32)),
        );

        let normalized = ImageNormalizer::new().normalize(&raw).unwrap();
        let found = levels(normalized.bitmap());

        assert_eq!(found, BTreeSet::from([0u8, 255u8]));
        assert_eq!((normalized.width(), normalized.height()), (64, 32));
    }

    #[test]
    fn test_tall_image_is_downscaled() {
        let raw = RawImage::new(
            "tall.jpg",
            ImageOrigin::Upload,
            DynamicImage::ImageRgb8(striped_rgb(300, 2400)),
        );

        let normalized = ImageNormalizer::new().normalize(&raw).unwrap();

        assert_eq!(normalized.height(), 2000);
        assert_eq!(normalized.width(), 250);
        assert!(levels(normalized.bitmap()).is_subset(&BTreeSet::from([0u8, 255u8])));
    }

    #[test]
    fn test_uniform_image_stays_within_two_levels() {
        let gray = GrayImage::from_pixel(10, 10, Luma([128u8]));
        let normalized = ImageNormalizer::new()
            .normalize_bitmap(&DynamicImage::ImageLuma8(gray))
            .unwrap();
        assert!(levels(normalized.bitmap()).is_subset(&BTreeSet::from([0u8, 255u8])));
    }

    #[test]
    fn test_empty_input_yields_none() {
        let normalizer = ImageNormalizer::new();
        assert!(normalizer.normalize_opt(None).is_none());

        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(normalizer.normalize_bitmap(&empty).is_none());
    }
}
