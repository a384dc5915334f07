//! Process command - extract bill data from a single receipt.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use billscan_core::models::config::BillscanConfig;
use billscan_core::{create_recognizer, BillSummary, ReceiptParser, TextRecognizer};

use super::config::load_config;

/// Image extensions handed to the recognizer.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Extensions of files that already hold recognized text.
pub const TEXT_EXTENSIONS: &[&str] = &["txt"];

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (receipt image or OCR text file), or `-` for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also print the raw OCR text
    #[arg(long)]
    raw: bool,

    /// Print consistency notes (missing figures, totals that do not add up)
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let text = if args.input == Path::new("-") {
        read_stdin()?
    } else {
        if !args.input.exists() {
            anyhow::bail!("Input file not found: {}", args.input.display());
        }
        info!("Processing file: {}", args.input.display());
        recognize_with_progress(&args.input, &config)?
    };

    if args.raw {
        println!("{}", style("Raw OCR output").bold());
        println!("{}", text.trim_end());
        println!();
    }

    let parser = ReceiptParser::new().with_config(config.extraction.clone());
    let result = parser.parse(&text);
    info!(
        "Parsed receipt in {}ms: {} line items, {} warnings",
        result.processing_time_ms,
        result.summary.items.len(),
        result.warnings.len()
    );

    if args.validate && !result.warnings.is_empty() {
        eprintln!("{}", style("Validation notes:").yellow());
        for warning in &result.warnings {
            eprintln!("  - {}", warning);
        }
    }

    let output = format_summary(&result.summary, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn read_stdin() -> anyhow::Result<String> {
    let mut bytes = Vec::new();
    std::io::stdin().read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn recognize_with_progress(input: &Path, config: &BillscanConfig) -> anyhow::Result<String> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Reading {}...", input.display()));

    let recognizer = create_recognizer(&config.ocr);
    let text = read_receipt_text(input, recognizer.as_ref());

    pb.finish_and_clear();
    text
}

/// Load the text of one receipt: OCR for images, as-is for text files.
///
/// An OCR failure is an error; the caller does not extract anything then.
/// Blank OCR output is not an error and yields an empty string.
pub fn read_receipt_text(input: &Path, recognizer: &dyn TextRecognizer) -> anyhow::Result<String> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        let bytes = fs::read(input)?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    let result = recognizer
        .recognize(input)
        .with_context(|| format!("OCR failed for {}", input.display()))?;

    debug!(
        "OCR produced {} characters in {}ms",
        result.text.len(),
        result.processing_time_ms
    );

    if result.is_blank() {
        warn!("No text detected in {}", input.display());
    }

    Ok(result.text)
}

pub fn format_summary(summary: &BillSummary, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        OutputFormat::Csv => format_csv(summary),
        OutputFormat::Text => Ok(format_text(summary)),
    }
}

/// Render an optional figure; absent is an empty cell.
pub fn figure(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_csv(summary: &BillSummary) -> anyhow::Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(vec![]);

    wtr.write_record(["item", "quantity", "rate", "amount"])?;
    for item in &summary.items {
        wtr.write_record([
            item.item.clone(),
            item.quantity.to_string(),
            item.rate.to_string(),
            item.amount.to_string(),
        ])?;
    }

    // Figures follow the items as field/value pairs; empty means not found
    wtr.write_record([""])?;
    wtr.write_record(["field", "value"])?;
    for (field, value) in summary_fields(summary) {
        wtr.write_record([field.to_string(), figure(value)])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn summary_fields(summary: &BillSummary) -> [(&'static str, Option<Decimal>); 5] {
    [
        ("total_amount", summary.total_amount),
        ("cgst", summary.cgst),
        ("sgst", summary.sgst),
        ("vat", summary.vat),
        ("final_amount", summary.final_amount),
    ]
}

pub fn format_text(summary: &BillSummary) -> String {
    if summary.is_empty() {
        return "No bill data found.\n".to_string();
    }

    let mut output = String::new();

    if summary.items.is_empty() {
        output.push_str("Items: none found\n");
    } else {
        output.push_str("Items:\n");
        let width = summary.items.iter().map(|i| i.item.len()).max().unwrap_or(0);
        for item in &summary.items {
            output.push_str(&format!(
                "  {:<width$}  {} x {} = {}\n",
                item.item,
                item.quantity,
                item.rate,
                item.amount,
                width = width
            ));
        }
    }
    output.push('\n');

    let labels = ["Total:", "CGST:", "SGST:", "VAT:", "Final amount:"];
    for (label, (_, value)) in labels.iter().zip(summary_fields(summary)) {
        let shown = value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        output.push_str(&format!("{:<14}{}\n", label, shown));
    }

    output
}
