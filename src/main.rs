// src/main.rs
use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;
use regex::Regex;

use edinet_extractor::batch::DailyBatchProcessor;
use edinet_extractor::edinet::client::EdinetClient;
use edinet_extractor::normalize::processor::NormalizedProcessor;
use edinet_extractor::storage::StorageManager;
use edinet_extractor::utils;
use edinet_extractor::utils::AppError;

/// Command Line Interface for the EDINET CSV normalizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List documents filed on a date
    List {
        /// Target date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
    },
    /// Download the raw archive of one document
    Fetch {
        /// EDINET document ID (e.g. S100W523)
        #[arg(short, long)]
        doc_id: String,

        /// Archive variant: 1=filing, 2=PDF, 3=attachments, 4=English, 5=CSV
        #[arg(short = 't', long, default_value = "5")]
        doc_type: String,

        /// Output file path (defaults to <docID>_type<type>.zip/.pdf)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Run the daily normalization batch for a date
    Batch {
        /// Target date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Base output directory for batch results
        #[arg(short, long, default_value = "tmp/batch")]
        output_dir: String,
    },
}

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Failed to compile DATE_RE"));

fn validate_date(date: &str) -> Result<(), AppError> {
    if DATE_RE.is_match(date) {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "Invalid date '{}': expected YYYY-MM-DD",
            date
        )))
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let cli = Cli::parse();
    tracing::debug!("Starting with args: {:?}", cli);

    match cli.command {
        Command::List { date } => {
            validate_date(&date)?;

            let client = EdinetClient::new()?;
            let list = client.fetch_documents_list(&date).await?;

            println!("{} documents filed on {}", list.results.len(), date);
            for doc in &list.results {
                println!(
                    "{}\t{}\t{}",
                    doc.docID,
                    doc.docTypeCode.as_deref().unwrap_or("-"),
                    doc.filerName.as_deref().unwrap_or("-")
                );
            }
        }

        Command::Fetch {
            doc_id,
            doc_type,
            output,
        } => {
            if !["1", "2", "3", "4", "5"].contains(&doc_type.as_str()) {
                return Err(AppError::Config(format!(
                    "Invalid document type '{}': must be one of 1, 2, 3, 4, 5",
                    doc_type
                )));
            }

            let client = EdinetClient::new()?;
            tracing::info!("Fetching document {} (type {})", doc_id, doc_type);
            let bytes = client.fetch_document(&doc_id, &doc_type).await?;

            let extension = if doc_type == "2" { ".pdf" } else { ".zip" };
            let output_path = output
                .unwrap_or_else(|| format!("{}_type{}{}", doc_id, doc_type, extension));

            if let Some(parent) = std::path::Path::new(&output_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&output_path, &bytes)?;

            tracing::info!("Saved {} bytes to {}", bytes.len(), output_path);
            println!("Document saved to: {}", output_path);
        }

        Command::Batch { date, output_dir } => {
            validate_date(&date)?;

            let client = EdinetClient::new()?;
            let processor = NormalizedProcessor::new();
            let storage = StorageManager::new(&output_dir)?;
            let mut batch = DailyBatchProcessor::new(client, processor, storage);

            // The first per-document failure aborts the run; main's Err exit
            // carries the non-zero status.
            let result = batch.run(&date).await?;

            println!(
                "Batch {} finished: {}/{} documents processed ({} ms)",
                result.batch_date,
                result.processed_documents,
                result.target_documents,
                result.processing_time_ms
            );
        }
    }

    Ok(())
}
