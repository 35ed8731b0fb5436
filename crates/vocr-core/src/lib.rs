//! Core library for voucher ("vale") OCR processing.
//!
//! This crate provides:
//! - Image normalization ahead of OCR (resize, grayscale, contrast, denoise, binarize)
//! - Text recognition through a local Tesseract installation
//! - Voucher field extraction (number, supplier, due date) from noisy OCR text
//! - Result records, batch processing, and CSV/XLSX export

pub mod error;
pub mod export;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod voucher;

pub use error::{EngineUnavailable, Result, VocrError};
pub use models::{BatchStats, ImageOrigin, Record, ResultSet, VocrConfig};
pub use ocr::{ImageNormalizer, Language, RawImage, RecognizedText, TesseractEngine, TextRecognizer};
pub use pipeline::{BatchEvent, BatchOutcome, BatchWarning, InputImage, VoucherPipeline};
pub use voucher::{FieldCandidates, VoucherExtractor};
