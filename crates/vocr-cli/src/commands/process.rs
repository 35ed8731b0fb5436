//! Process command - extract voucher fields from a single image.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use vocr_core::export;
use vocr_core::models::record::{ImageOrigin, Record, ResultSet};
use vocr_core::{RawImage, VoucherPipeline};

use super::{load_config, require_engine};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input image (PNG, JPEG or BMP)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Minimum digits for a voucher number to be accepted (5-15)
    #[arg(long, value_parser = clap::value_parser!(u8).range(5..=15))]
    min_digits: Option<u8>,

    /// Print the raw OCR text after the record
    #[arg(long)]
    show_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Semicolon-separated CSV with header
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(min_digits) = args.min_digits {
        config.extraction.min_voucher_digits = min_digits as usize;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let engine = require_engine(&config)?;

    info!("Processing file: {}", args.input.display());

    let image = RawImage::open(&args.input, ImageOrigin::Upload)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    let pipeline = VoucherPipeline::from_config(engine, &config);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Running OCR on {}...", image.name()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let record = tokio::task::spawn_blocking(move || pipeline.process(&image)).await?;

    pb.finish_and_clear();

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_text {
        print_ocr_text(&record);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_record(record: &Record, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => {
            let results: ResultSet = std::iter::once(record.clone()).collect();
            let bytes = export::to_csv_bytes(&results)?;
            let text = String::from_utf8(bytes)?;
            Ok(text.trim_start_matches('\u{feff}').trim_end().to_string())
        }
        OutputFormat::Text => Ok(format_text(record)),
    }
}

fn format_text(record: &Record) -> String {
    let mut output = String::new();

    output.push_str(&format!("Arquivo: {} ({})\n", record.source_name, record.origin));
    output.push_str(&format!("Número do Vale: {}\n", record.voucher_number));
    output.push_str(&format!("Fornecedor: {}\n", record.supplier));
    output.push_str(&format!("Vencimento: {}", record.due_date));

    output
}

/// Print the recognized text of a record, if there is any.
pub fn print_ocr_text(record: &Record) {
    match record.ocr_text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => {
            println!();
            println!("{}", style(format!("OCR text ({})", record.source_name)).bold());
            println!("{}", text);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vocr_core::models::record::NOT_FOUND;

    fn record() -> Record {
        Record {
            source_name: "vale.jpg".to_string(),
            origin: ImageOrigin::Upload,
            voucher_number: "00045123".to_string(),
            supplier: "Comercial ABC Ltda".to_string(),
            due_date: NOT_FOUND.to_string(),
            ocr_text: Some("Vale 00045123".to_string()),
        }
    }

    #[test]
    fn test_csv_format_has_header_and_row() {
        let output = format_record(&record(), OutputFormat::Csv).unwrap();
        assert_eq!(
            output,
            "Arquivo;Origem;Número do Vale;Fornecedor;Vencimento\n\
             vale.jpg;upload;00045123;Comercial ABC Ltda;Não encontrado"
        );
    }

    #[test]
    fn test_json_uses_column_names() {
        let output = format_record(&record(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["Número do Vale"], "00045123");
        assert_eq!(value["Origem"], "upload");
        assert!(value.get("ocr_text").is_none());
    }

    #[test]
    fn test_text_format() {
        let output = format_record(&record(), OutputFormat::Text).unwrap();
        assert!(output.starts_with("Arquivo: vale.jpg (upload)\n"));
        assert!(output.ends_with("Vencimento: Não encontrado"));
    }
}
