//! Engine command - check the local Tesseract installation.

use clap::{Args, Subcommand};
use console::style;

use vocr_core::{Language, TesseractEngine};
use vocr_core::ocr::TESSERACT_CANDIDATES;

use super::load_config;

/// Arguments for the engine command.
#[derive(Args)]
pub struct EngineArgs {
    #[command(subcommand)]
    command: EngineCommand,
}

#[derive(Subcommand)]
enum EngineCommand {
    /// Probe for Tesseract and the required language pack
    Status,

    /// List the locations searched for the tesseract executable
    Candidates,
}

pub async fn run(args: EngineArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        EngineCommand::Status => check_status(config_path),
        EngineCommand::Candidates => list_candidates(config_path),
    }
}

fn check_status(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("{}", style("OCR Engine Status").bold());

    match TesseractEngine::probe(&config.ocr) {
        Ok(engine) => {
            println!("  {} {}", style("✓").green(), engine.version());
            println!("    Executable: {}", engine.executable().display());
            println!("    Languages:  {}", engine.languages().join(", "));
            let language = Language::from_code(&config.ocr.language).unwrap_or_default();
            println!(
                "    Language in use: {} ({})",
                style(language.tesseract_code()).cyan().bold(),
                language.iso_code()
            );
            Ok(())
        }
        Err(e) => {
            println!("  {} {}", style("✗").red(), e.reason);
            anyhow::bail!("{}", e.remediation())
        }
    }
}

fn list_candidates(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if let Some(path) = &config.ocr.tesseract_path {
        let marker = status_marker(path.exists());
        println!("  {} {} (configured)", marker, path.display());
    }

    for candidate in TESSERACT_CANDIDATES {
        let marker = status_marker(std::path::Path::new(candidate).exists());
        println!("  {} {}", marker, candidate);
    }
    println!("  {} tesseract (PATH)", style("?").dim());

    Ok(())
}

fn status_marker(exists: bool) -> console::StyledObject<&'static str> {
    if exists {
        style("✓").green()
    } else {
        style("✗").red()
    }
}
