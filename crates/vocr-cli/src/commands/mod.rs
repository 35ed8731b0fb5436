//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod engine;
pub mod process;

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use vocr_core::models::config::VocrConfig;
use vocr_core::TesseractEngine;

/// Load the configuration named by `--config`, else the default file if it
/// exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<VocrConfig> {
    if let Some(path) = config_path {
        return VocrConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {}", path));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Loading configuration from {}", default_path.display());
        return VocrConfig::from_file(&default_path)
            .with_context(|| format!("Failed to read config file {}", default_path.display()));
    }

    Ok(VocrConfig::default())
}

/// Probe for Tesseract; a missing engine aborts with installation instructions.
pub fn require_engine(config: &VocrConfig) -> anyhow::Result<TesseractEngine> {
    TesseractEngine::probe(&config.ocr).map_err(|e| anyhow::anyhow!("{}", e.remediation()))
}
