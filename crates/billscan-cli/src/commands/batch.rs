//! Batch processing command for multiple receipt files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use billscan_core::{create_recognizer, BillSummary, ReceiptParser, TextRecognizer};

use super::config::load_config;
use super::process::{
    figure, format_summary, read_receipt_text, OutputFormat, IMAGE_EXTENSIONS, TEXT_EXTENSIONS,
};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    summary: Option<BillSummary>,
    warnings: Vec<String>,
    error: Option<String>,
    processing_time_ms: u64,
    processed_at: DateTime<Utc>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let recognizer: Arc<dyn TextRecognizer> = Arc::from(create_recognizer(&config.ocr));
    let parser = ReceiptParser::new().with_config(config.extraction.clone());

    // OCR and extraction are blocking; run up to `jobs` files at a time
    let mut pending = stream::iter(files)
        .map(|path| {
            let recognizer = Arc::clone(&recognizer);
            let parser = parser.clone();
            tokio::task::spawn_blocking(move || process_single_file(path, recognizer.as_ref(), &parser))
        })
        .buffer_unordered(args.jobs.max(1));

    let mut results = Vec::new();
    while let Some(joined) = pending.next().await {
        let result = joined?;
        overall_pb.inc(1);

        if let Some(ref message) = result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), message);
            } else {
                overall_pb.abandon();
                error!("Failed to process {}: {}", result.path.display(), message);
                anyhow::bail!("Processing failed: {}", message);
            }
        }

        results.push(result);
    }

    overall_pb.finish_and_clear();
    results.sort_by(|a, b| a.path.cmp(&b.path));

    // Write outputs
    if let Some(ref output_dir) = args.output_dir {
        for result in &results {
            if let Some(ref summary) = result.summary {
                let output_path = output_path_for(output_dir, &result.path, args.format);
                fs::write(&output_path, format_summary(summary, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.summary.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let empty = results
        .iter()
        .filter(|r| r.summary.as_ref().is_some_and(BillSummary::is_empty))
        .count();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful ({} with no bill data), {} failed",
        style(successful).green(),
        style(empty).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn is_supported(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()) || TEXT_EXTENSIONS.contains(&ext.as_str())
}

fn process_single_file(
    path: PathBuf,
    recognizer: &dyn TextRecognizer,
    parser: &ReceiptParser,
) -> ProcessResult {
    let file_start = Instant::now();

    let (summary, warnings, error) = match read_receipt_text(&path, recognizer) {
        Ok(text) => {
            let result = parser.parse(&text);
            debug!(
                "Parsed {} in {}ms with {} warnings",
                path.display(),
                result.processing_time_ms,
                result.warnings.len()
            );
            (Some(result.summary), result.warnings, None)
        }
        // Chain the causes so the underlying recognizer message is kept
        Err(e) => (None, Vec::new(), Some(format!("{:#}", e))),
    };

    ProcessResult {
        path,
        summary,
        warnings,
        error,
        processing_time_ms: file_start.elapsed().as_millis() as u64,
        processed_at: Utc::now(),
    }
}

fn output_path_for(output_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let output_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("receipt");
    output_dir.join(format!("{}.{}", output_name, format.extension()))
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "items",
        "items_total",
        "total_amount",
        "cgst",
        "sgst",
        "vat",
        "final_amount",
        "warnings",
        "processing_time_ms",
        "processed_at",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        let processed_at = result
            .processed_at
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let record = match &result.summary {
            Some(summary) => [
                filename,
                "success".to_string(),
                summary.items.len().to_string(),
                summary.items_total().to_string(),
                figure(summary.total_amount),
                figure(summary.cgst),
                figure(summary.sgst),
                figure(summary.vat),
                figure(summary.final_amount),
                result.warnings.len().to_string(),
                result.processing_time_ms.to_string(),
                processed_at,
                String::new(),
            ],
            None => [
                filename,
                "error".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                result.processing_time_ms.to_string(),
                processed_at,
                result.error.clone().unwrap_or_default(),
            ],
        };
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
