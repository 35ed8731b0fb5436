//! Configuration structures for the voucher pipeline.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, VocrError};

/// Smallest accepted minimum voucher digit count.
pub const MIN_VOUCHER_DIGITS_FLOOR: usize = 5;

/// Largest accepted minimum voucher digit count.
pub const MIN_VOUCHER_DIGITS_CEILING: usize = 15;

/// Main configuration for the vocr pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VocrConfig {
    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Remote image source configuration.
    pub remote: RemoteConfig,

    /// Export configuration.
    pub export: ExportConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Explicit path to the tesseract executable, tried before the built-in
    /// candidate locations.
    pub tesseract_path: Option<PathBuf>,

    /// Tesseract language pack.
    pub language: String,

    /// Page segmentation mode (6 = assume a uniform block of text).
    pub page_segmentation_mode: u8,

    /// OCR engine mode (3 = default, legacy + LSTM).
    pub engine_mode: u8,

    /// Maximum seconds a single recognition may take.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: None,
            language: "por".to_string(),
            page_segmentation_mode: 6,
            engine_mode: 3,
            timeout_secs: 120,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Voucher numbers shorter than this are reported as not found.
    pub min_voucher_digits: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_voucher_digits: 8,
        }
    }
}

impl ExtractionConfig {
    /// Minimum digit count clamped to the supported range.
    pub fn effective_min_digits(&self) -> usize {
        self.min_voucher_digits
            .clamp(MIN_VOUCHER_DIGITS_FLOOR, MIN_VOUCHER_DIGITS_CEILING)
    }
}

/// Remote image source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Timeout for each download request, in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Export file naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default workbook file name.
    pub xlsx_file_name: String,

    /// Default CSV file name.
    pub csv_file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            xlsx_file_name: "resultados_vales.xlsx".to_string(),
            csv_file_name: "resultados_vales.csv".to_string(),
        }
    }
}

impl VocrConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| VocrError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| VocrError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = VocrConfig::default();
        assert_eq!(config.ocr.language, "por");
        assert_eq!(config.ocr.page_segmentation_mode, 6);
        assert_eq!(config.ocr.engine_mode, 3);
        assert_eq!(config.extraction.min_voucher_digits, 8);
        assert_eq!(config.remote.timeout_secs, 30);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: VocrConfig =
            serde_json::from_str(r#"{"extraction": {"min_voucher_digits": 10}}"#).unwrap();
        assert_eq!(config.extraction.min_voucher_digits, 10);
        assert_eq!(config.ocr.language, "por");
        assert_eq!(config.export.xlsx_file_name, "resultados_vales.xlsx");
    }

    #[test]
    fn test_min_digits_clamped() {
        let low = ExtractionConfig { min_voucher_digits: 2 };
        let high = ExtractionConfig { min_voucher_digits: 40 };
        assert_eq!(low.effective_min_digits(), 5);
        assert_eq!(high.effective_min_digits(), 15);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = VocrConfig::default();
        config.ocr.timeout_secs = 42;
        config.save(&path).unwrap();

        let loaded = VocrConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.timeout_secs, 42);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = VocrConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, VocrError::Config(ref message) if message.contains("config.json")));
    }
}
