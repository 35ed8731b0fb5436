//! Image normalization and text recognition.

mod engine;
mod preprocessing;
mod recognizer;

pub use engine::{TesseractEngine, TESSERACT_CANDIDATES};
pub use preprocessing::{ImageNormalizer, MAX_HEIGHT};
pub use recognizer::{StubRecognizer, TextRecognizer};

use std::fs;
use std::path::Path;

use image::{DynamicImage, GenericImageView, GrayImage};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::models::record::ImageOrigin;

/// Language model used for recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Portuguese.
    #[default]
    Portuguese,
}

impl Language {
    /// ISO 639-1 code.
    pub fn iso_code(&self) -> &'static str {
        match self {
            Language::Portuguese => "pt",
        }
    }

    /// Tesseract traineddata name.
    pub fn tesseract_code(&self) -> &'static str {
        match self {
            Language::Portuguese => "por",
        }
    }

    /// Resolve a Tesseract or ISO code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pt" | "por" => Some(Language::Portuguese),
            _ => None,
        }
    }
}

/// A decoded voucher image as captured, before any normalization.
///
/// Color images are held as 3-channel RGB, everything else as 8-bit grayscale.
#[derive(Debug, Clone)]
pub struct RawImage {
    name: String,
    origin: ImageOrigin,
    bitmap: DynamicImage,
}

impl RawImage {
    /// Wrap an already decoded bitmap.
    pub fn new(name: impl Into<String>, origin: ImageOrigin, bitmap: DynamicImage) -> Self {
        let bitmap = if bitmap.color().has_color() {
            DynamicImage::ImageRgb8(bitmap.to_rgb8())
        } else {
            DynamicImage::ImageLuma8(bitmap.to_luma8())
        };
        Self {
            name: name.into(),
            origin,
            bitmap,
        }
    }

    /// Read and decode an image file, named after its file name.
    pub fn open(path: &Path, origin: ImageOrigin) -> crate::Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = fs::read(path)?;
        Ok(Self::decode(name, origin, &bytes)?)
    }

    /// Decode PNG/JPEG/BMP (or any format the `image` crate recognizes) bytes.
    pub fn decode(
        name: impl Into<String>,
        origin: ImageOrigin,
        bytes: &[u8],
    ) -> Result<Self, DecodeError> {
        let name = name.into();
        let bitmap = image::load_from_memory(bytes).map_err(|source| DecodeError::Image {
            name: name.clone(),
            source,
        })?;

        let (width, height) = bitmap.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::Empty(name));
        }

        Ok(Self::new(name, origin, bitmap))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    pub fn bitmap(&self) -> &DynamicImage {
        &self.bitmap
    }

    /// Number of channels (1 or 3).
    pub fn channels(&self) -> u8 {
        self.bitmap.color().channel_count()
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }
}

/// A single-channel, binarized bitmap ready for recognition.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    bitmap: GrayImage,
}

impl NormalizedImage {
    pub(crate) fn new(bitmap: GrayImage) -> Self {
        Self { bitmap }
    }

    pub fn bitmap(&self) -> &GrayImage {
        &self.bitmap
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }
}

/// Which preprocessing path an [`OcrInput`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Normalized,
    Raw,
}

/// What the recognizer is asked to read.
///
/// `Raw` is the degraded path taken when normalization produced nothing.
#[derive(Debug, Clone, Copy)]
pub enum OcrInput<'a> {
    Normalized(&'a NormalizedImage),
    Raw(&'a RawImage),
}

impl OcrInput<'_> {
    pub fn kind(&self) -> InputKind {
        match self {
            OcrInput::Normalized(_) => InputKind::Normalized,
            OcrInput::Raw(_) => InputKind::Raw,
        }
    }

    /// Owned copy of the bitmap in a form every recognizer accepts.
    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            OcrInput::Normalized(image) => DynamicImage::ImageLuma8(image.bitmap().clone()),
            OcrInput::Raw(image) => image.bitmap().clone(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            OcrInput::Normalized(image) => (image.width(), image.height()),
            OcrInput::Raw(image) => (image.width(), image.height()),
        }
    }
}

/// Text produced for exactly one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedText {
    /// Raw text, possibly empty.
    pub text: String,

    /// Language model used.
    pub language: Language,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
