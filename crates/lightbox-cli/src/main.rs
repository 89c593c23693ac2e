//! Lightbox CLI: upload images into the configured store and inspect the gallery.
//!
//! Reads the same environment as the library (`STORAGE_BACKEND`, `S3_BUCKET`,
//! `LOCAL_STORAGE_PATH`, `FILE_MAPPINGS_PATH`, ...), loading `.env` if present.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use lightbox_cli::{init_tracing, render_gallery_table};
use lightbox_core::{Config, UploadOutcome, UploadRequest};
use lightbox_db::FileMappingLedger;
use lightbox_processing::{GalleryLister, UploadPipeline};
use lightbox_storage::{create_storage, Storage};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "lightbox", about = "Image and camera RAW upload pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload an image or camera RAW file
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Declared content type (guessed from name and bytes when omitted)
        #[arg(long)]
        content_type: Option<String>,
    },
    /// List uploads, most recent first
    List {
        /// Maximum number of entries (clamped to 1..=1000)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Show the recorded mapping for an object key
    Lookup {
        /// Object key, e.g. raw/20240102_030405_a1b2c3d4e5f6.cr2
        key: String,
    },
    /// Verify the storage backend is reachable
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn open_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    create_storage(config)
        .await
        .context("Failed to initialize storage backend")
}

async fn upload(
    config: &Config,
    file: PathBuf,
    content_type: Option<String>,
) -> anyhow::Result<ExitCode> {
    let data = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", file.display()))?;
    tracing::debug!(file = %file.display(), size_bytes = data.len(), "Read upload from disk");

    let storage = open_storage(config).await?;
    let ledger = Arc::new(FileMappingLedger::new(config.file_mappings_path().clone()));
    let pipeline =
        UploadPipeline::with_default_decoder(storage, ledger, config.upload_settings().clone());

    let mut request = UploadRequest::new(filename, data);
    if let Some(content_type) = content_type {
        request = request.with_content_type(content_type);
    }

    let outcome = UploadOutcome::from(pipeline.upload(request).await);
    print_json(&outcome)?;

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Upload { file, content_type } => return upload(&config, file, content_type).await,
        Commands::List { limit, format } => {
            let storage = open_storage(&config).await?;
            let ledger = Arc::new(FileMappingLedger::new(config.file_mappings_path().clone()));
            let entries = GalleryLister::new(storage, ledger).list(limit).await?;

            match format {
                OutputFormat::Json => print_json(&entries)?,
                OutputFormat::Table => print!("{}", render_gallery_table(&entries)),
            }
        }
        Commands::Lookup { key } => {
            let ledger = FileMappingLedger::new(config.file_mappings_path().clone());
            let entry = ledger
                .lookup(&key)
                .await
                .with_context(|| format!("Lookup failed for {}", key))?;
            print_json(&entry)?;
        }
        Commands::Check => {
            let storage = open_storage(&config).await?;
            storage
                .check_access()
                .await
                .context("Storage access check failed")?;

            print_json(&serde_json::json!({
                "status": "ok",
                "backend": storage.backend_type().to_string(),
                "bucket": config.s3_bucket(),
                "region": config.s3_region().or(config.aws_region()),
                "file_mappings_path": config.file_mappings_path(),
            }))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    run(cli).await
}
