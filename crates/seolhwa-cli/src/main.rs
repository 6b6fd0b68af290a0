//! Seolhwa CLI - Command-line interface
//!
//! Usage:
//!   seolhwa convert -i <sources> -o <ocr_output> [--limit N]
//!   seolhwa convert --sample <file.txt>
//!   seolhwa merge -i <ocr_output> -o <stories>
//!   seolhwa inspect <file.txt>

mod convert;
mod inspect;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use seolhwa_core::{AppConfig, LoggingConfig};
use seolhwa_extractor::{ExtractionRules, StoryConverter};
use seolhwa_merge::{BatchMerger, StoryMerger};
use seolhwa_ocr::{DocumentLoader, OcrManager};

use crate::convert::BatchConverter;

#[derive(Parser)]
#[command(name = "seolhwa")]
#[command(about = "Jeju folklore OCR conversion and merge pipeline")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert OCR'd story sources into per-origin JSON records
    Convert {
        /// Directory of text files or page image directories
        #[arg(short, long, required_unless_present = "sample")]
        input: Option<PathBuf>,
        /// Output directory for partial records
        #[arg(short, long, required_unless_present = "sample")]
        output: Option<PathBuf>,
        /// Convert at most N sources
        #[arg(long)]
        limit: Option<usize>,
        /// Number of sources converted concurrently
        #[arg(long)]
        concurrency: Option<usize>,
        /// Convert a single source and print the record
        #[arg(long, conflicts_with_all = ["input", "output"])]
        sample: Option<PathBuf>,
    },
    /// Pair content/text records and merge them into stories
    Merge {
        /// Directory of partial records
        #[arg(short, long)]
        input: PathBuf,
        /// Output directory for merged stories
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show sections, entities and narrator found in a text file
    Inspect {
        /// Pre-extracted text file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging, cli.log_json);

    let rules = load_rules(&config)?;

    match cli.command {
        Commands::Convert {
            input,
            output,
            limit,
            concurrency,
            sample,
        } => {
            let converter =
                StoryConverter::new(&rules)?.with_version(&config.convert.converter_version);
            let ocr = OcrManager::new(&config.ocr);
            if ocr.is_available() {
                tracing::info!("OCR engines: {}", ocr.available_engines().join(", "));
            }
            let loader = DocumentLoader::new(ocr, &config.ocr);
            let batch = BatchConverter::new(
                converter,
                loader,
                concurrency.unwrap_or(config.convert.concurrency),
            );

            if let Some(sample) = sample {
                let record = batch.convert_path(&sample)?;
                println!("{}", serde_json::to_string_pretty(&record)?);
                return Ok(());
            }

            let input = input.context("--input is required")?;
            let output = output.context("--output is required")?;

            let summary = batch
                .run(&input, &output, limit.or(config.convert.limit))
                .await?;

            println!("\nConversion complete");
            println!("  Total:   {}", summary.total);
            println!("  Success: {}", summary.success);
            println!("  Failed:  {}", summary.failed);
            println!("  Output:  {}", output.display());
        }
        Commands::Merge { input, output } => {
            let merger =
                StoryMerger::new(&rules)?.with_version(&config.merge.converter_version);
            let batch = BatchMerger::new(merger);

            let stats = tokio::task::spawn_blocking(move || batch.run(&input, &output))
                .await
                .context("Merge task failed")??;

            println!("\nMerge complete");
            println!("  Paired:       {}", stats.paired);
            println!("  Content only: {}", stats.content_only);
            println!("  Text only:    {}", stats.text_only);
            println!("  Merged:       {}", stats.merged);
            println!("  Errors:       {}", stats.errors);
        }
        Commands::Inspect { file } => {
            let converter = StoryConverter::new(&rules)?;
            print!("{}", inspect::inspect_file(&converter, &file)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    Ok(config.with_env_override()?)
}

fn load_rules(config: &AppConfig) -> anyhow::Result<ExtractionRules> {
    match &config.rules_file {
        Some(path) => ExtractionRules::from_file(path)
            .with_context(|| format!("Failed to load rules from {}", path.display())),
        None => Ok(ExtractionRules::default()),
    }
}

fn init_tracing(logging: &LoggingConfig, force_json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("seolhwa={}", logging.level).into());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if force_json || logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
