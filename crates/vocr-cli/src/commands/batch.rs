//! Batch processing command for several voucher images.

use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use clap::Args;
use console::{Alignment, pad_str, style};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use vocr_core::export;
use vocr_core::models::record::{COLUMNS, ImageOrigin, Record, ResultSet};
use vocr_core::{BatchEvent, BatchOutcome, InputImage, TextRecognizer, VoucherPipeline};

use super::process::print_ocr_text;
use super::{load_config, require_engine};
use crate::drive::{self, DRIVE_FILE_NAME};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Display width cap per column of the consolidated table.
const MAX_COLUMN_WIDTH: usize = 40;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob patterns
    inputs: Vec<String>,

    /// Also process the image behind a shared Google Drive link
    #[arg(long)]
    drive_link: Option<String>,

    /// Minimum digits for a voucher number to be accepted (5-15)
    #[arg(long, value_parser = clap::value_parser!(u8).range(5..=15))]
    min_digits: Option<u8>,

    /// Output directory for the XLSX and CSV exports
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write the XLSX export to this path
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Write the CSV export to this path
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the raw OCR text of every image
    #[arg(long)]
    show_text: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(min_digits) = args.min_digits {
        config.extraction.min_voucher_digits = min_digits as usize;
    }

    let files = expand_inputs(&args.inputs)?;
    if files.is_empty() && args.drive_link.is_none() {
        anyhow::bail!("No matching image files found for: {}", args.inputs.join(" "));
    }

    let engine = require_engine(&config)?;

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let mut inputs = Vec::with_capacity(files.len() + 1);
    for path in &files {
        match fs::read(path) {
            Ok(bytes) => inputs.push(InputImage::new(display_name(path), ImageOrigin::Upload, bytes)),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                println!(
                    "{} Skipping {}: {}",
                    style("⚠").yellow(),
                    path.display(),
                    e
                );
            }
        }
    }

    if let Some(link) = &args.drive_link {
        let timeout = Duration::from_secs(config.remote.timeout_secs.max(1));
        match drive::fetch(link, timeout).await {
            Ok(bytes) => inputs.push(InputImage::new(DRIVE_FILE_NAME, ImageOrigin::Drive, bytes)),
            Err(e) => {
                warn!("Drive download failed: {}", e);
                println!(
                    "{} Could not download from Google Drive: {}",
                    style("⚠").yellow(),
                    e
                );
            }
        }
    }

    if inputs.is_empty() {
        println!("{} No valid images to process.", style("⚠").yellow());
        return Ok(());
    }

    let interrupt = Arc::new(Interrupt::default());
    {
        let interrupt = Arc::clone(&interrupt);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                match interrupt.press() {
                    Escalation::Finish => eprintln!(
                        "{} Stopping after the current image (Ctrl-C again to quit now)",
                        style("⚠").yellow()
                    ),
                    Escalation::Abort => {
                        eprintln!("{} Aborted", style("✗").red());
                        std::process::exit(130);
                    }
                }
            }
        });
    }

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let pipeline = VoucherPipeline::from_config(engine, &config);
    let outcome = run_pipeline(pipeline, inputs, pb.clone(), Arc::clone(&interrupt)).await?;

    if outcome.cancelled {
        pb.abandon_with_message("Cancelled");
    } else {
        pb.finish_with_message("Complete");
    }

    let results = &outcome.results;

    if args.show_text {
        for record in results {
            print_ocr_text(record);
        }
    }

    if results.is_empty() {
        println!("{} No images could be processed.", style("⚠").yellow());
        return Ok(());
    }

    println!();
    println!("{}", style("Consolidated results").bold());
    print!("{}", format_table(results));

    write_exports(results, &args, &config.export)?;

    let stats = results.stats();
    println!();
    println!(
        "{} Processed {} images in {:?}",
        style("✓").green(),
        stats.total,
        start.elapsed()
    );
    println!("   Total processed: {}", style(stats.total).bold());
    println!("   Vouchers found:  {}", style(stats.vouchers_found).green());
    if let Some(rate) = stats.success_rate() {
        println!("   Success rate:    {:.1}%", rate);
    }
    if stats.errors > 0 {
        println!("   Errors:          {}", style(stats.errors).red());
    }

    if !outcome.warnings.is_empty() {
        println!();
        println!("{}", style("Skipped files:").yellow());
        for warning in &outcome.warnings {
            println!("  - {}: {}", warning.source_name, warning.message);
        }
    }

    Ok(())
}

/// How a Ctrl-C press should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escalation {
    /// Let the image in flight finish, then stop the batch.
    Finish,
    /// Exit immediately.
    Abort,
}

/// Counts Ctrl-C presses during a batch.
#[derive(Debug, Default)]
struct Interrupt {
    presses: AtomicUsize,
}

impl Interrupt {
    fn press(&self) -> Escalation {
        if self.presses.fetch_add(1, Ordering::SeqCst) == 0 {
            Escalation::Finish
        } else {
            Escalation::Abort
        }
    }

    fn requested(&self) -> bool {
        self.presses.load(Ordering::SeqCst) > 0
    }
}

/// Run the batch on the blocking pool so the runtime keeps answering Ctrl-C.
async fn run_pipeline<R>(
    pipeline: VoucherPipeline<R>,
    inputs: Vec<InputImage>,
    pb: ProgressBar,
    interrupt: Arc<Interrupt>,
) -> anyhow::Result<BatchOutcome>
where
    R: TextRecognizer + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || {
        pipeline.process_batch_with(inputs, |event| {
            report_event(&pb, event);

            if interrupt.requested() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
    })
    .await?;

    Ok(outcome)
}

fn report_event(pb: &ProgressBar, event: BatchEvent<'_>) {
    match event {
        BatchEvent::Processed { record, .. } => {
            pb.println(record_status_line(record));
            pb.set_message(record.source_name.clone());
        }
        BatchEvent::Skipped { warning, .. } => {
            pb.println(format!(
                "{} {}: {}",
                style("⚠").yellow(),
                warning.source_name,
                warning.message
            ));
        }
    }
    pb.inc(1);
}

/// Expand each argument as a glob pattern, keeping supported image files in
/// argument order. Duplicates are dropped.
fn expand_inputs(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let mut matched = 0;
        for path in glob(pattern)?.filter_map(|r| r.ok()) {
            if is_image(&path) && !files.contains(&path) {
                files.push(path);
                matched += 1;
            }
        }
        if matched == 0 {
            warn!("No image files match {}", pattern);
        }
    }

    debug!("Expanded {} patterns to {} files", patterns.len(), files.len());
    Ok(files)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

fn record_status_line(record: &Record) -> String {
    if record.is_error() {
        format!(
            "{} {}: {}",
            style("✗").red(),
            record.source_name,
            record.supplier
        )
    } else if record.has_voucher() {
        format!(
            "{} {}: vale {}",
            style("✓").green(),
            record.source_name,
            record.voucher_number
        )
    } else {
        format!(
            "{} {}: {}",
            style("•").yellow(),
            record.source_name,
            record.voucher_number
        )
    }
}

/// Render the result set as an aligned text table with a header row.
fn format_table(results: &ResultSet) -> String {
    let mut widths = COLUMNS.map(console::measure_text_width);
    for record in results {
        for (width, value) in widths.iter_mut().zip(record.columns()) {
            *width = (*width).max(console::measure_text_width(value));
        }
    }
    for width in widths.iter_mut() {
        *width = (*width).min(MAX_COLUMN_WIDTH);
    }

    let render_row = |cells: [&str; 5]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| pad_str(cell, width, Alignment::Left, Some("…")).into_owned())
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut output = render_row(COLUMNS);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&format!("  {}\n", rule.join("  ")));
    for record in results {
        output.push_str(&render_row(record.columns()));
    }
    output
}

fn write_exports(
    results: &ResultSet,
    args: &BatchArgs,
    names: &vocr_core::models::config::ExportConfig,
) -> anyhow::Result<()> {
    if let Some(output_dir) = &args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let target = |explicit: &Option<PathBuf>, default_name: &str| {
        explicit.clone().or_else(|| {
            args.output_dir
                .as_ref()
                .map(|dir| dir.join(default_name))
        })
    };

    println!();
    if let Some(path) = target(&args.xlsx, &names.xlsx_file_name) {
        export::write_xlsx(results, &path)?;
        println!("{} Excel written to {}", style("✓").green(), path.display());
    }
    if let Some(path) = target(&args.csv, &names.csv_file_name) {
        export::write_csv(results, &path)?;
        println!("{} CSV written to {}", style("✓").green(), path.display());
    }

    Ok(())
}
