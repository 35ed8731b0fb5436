//! Error types for the vocr-core library.

use thiserror::Error;

/// Error for library operations that touch the filesystem.
#[derive(Error, Debug)]
pub enum VocrError {
    /// Image bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed or serialized.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning raw bytes into a bitmap.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The bytes are not a supported raster format.
    #[error("unsupported or corrupt image '{name}': {source}")]
    Image {
        name: String,
        #[source]
        source: image::ImageError,
    },

    /// The decoded bitmap has a zero dimension.
    #[error("image '{0}' is empty")]
    Empty(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The engine process could not be started.
    #[error("failed to launch OCR engine: {0}")]
    Launch(#[source] std::io::Error),

    /// The engine exited with a failure status.
    #[error("OCR engine failed (exit code {code:?}): {stderr}")]
    Engine { code: Option<i32>, stderr: String },

    /// The engine did not finish within the configured time.
    #[error("OCR engine timed out after {0}s")]
    Timeout(u64),

    /// The bitmap could not be handed over to the engine.
    #[error("invalid bitmap: {0}")]
    InvalidImage(String),

    /// The requested language pack is not installed.
    #[error("language pack '{0}' is not installed")]
    MissingLanguage(String),

    /// The engine produced output that is not valid UTF-8.
    #[error("OCR output is not valid UTF-8")]
    Encoding,
}

/// Errors related to exporting a result set.
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook generation failed.
    #[error("XLSX export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// I/O error while writing the export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The OCR engine could not be found or is missing the required language.
///
/// Carries the remediation text shown to the user instead of running any
/// extraction.
#[derive(Error, Debug, Clone)]
#[error("OCR engine unavailable: {reason}")]
pub struct EngineUnavailable {
    /// What the probe found wrong.
    pub reason: String,
    /// Candidate locations that were tried, in order.
    pub searched: Vec<String>,
}

impl EngineUnavailable {
    /// Human-readable installation instructions.
    pub fn remediation(&self) -> String {
        let mut text = format!("Tesseract OCR is not configured correctly: {}.\n\n", self.reason);
        if !self.searched.is_empty() {
            text.push_str("Searched locations:\n");
            for path in &self.searched {
                text.push_str(&format!("  - {}\n", path));
            }
            text.push('\n');
        }
        text.push_str(
            "To run locally:\n\
             1. Install Tesseract OCR: https://github.com/tesseract-ocr/tesseract\n\
             2. On Windows: https://github.com/UB-Mannheim/tesseract/wiki\n\
             3. Install the Portuguese language pack (Debian/Ubuntu: tesseract-ocr-por)\n\n\
             Or point `ocr.tesseract_path` in the configuration at the tesseract executable.",
        );
        text
    }
}

/// Result type for the vocr library.
pub type Result<T> = std::result::Result<T, VocrError>;
