//! blocks - Feature catalogue and mass upload command line tool
//!
//! Settings are resolved from `--config`, `BLOCKS_CONFIG` or the user config
//! folder. The catalogue lives in `features.json` inside the data folder.

use anyhow::{Context, Result};
use blocks_archive::UploadedFile;
use blocks_cli::{catalogue_path, export_command, import_command, mass_upload_command};
use blocks_common::config::resolve_config_path;
use blocks_common::BlocksSettings;
use blocks_features::{JsonFileStore, Scope};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "blocks")]
#[command(about = "Feature catalogue and archive mass upload for content blocks")]
#[command(version)]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long, global = true, env = "BLOCKS_CONFIG")]
    config: Option<PathBuf>,

    /// Data folder holding the catalogue
    #[arg(short, long, global = true, env = "BLOCKS_ROOT")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the catalogue as a JSON dump
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import features from a JSON dump
    Import {
        file: PathBuf,

        /// Never create items of this scope (repeatable)
        #[arg(long = "ignore-scope")]
        ignore_scopes: Vec<Scope>,

        /// Report without saving anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a ZIP archive and list the images it would create
    MassUpload {
        archive: PathBuf,

        /// Parent record the images would belong to
        #[arg(long, default_value = "new")]
        parent: String,

        /// Fill image labels with their archive path
        #[arg(long)]
        label: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = BlocksSettings::resolve(args.config.as_deref())?;
    init_tracing(&settings)?;

    info!("Starting blocks v{}", env!("CARGO_PKG_VERSION"));
    match resolve_config_path(args.config.as_deref()) {
        Some(path) if path.exists() => info!("Settings: {}", path.display()),
        _ => info!("Settings: built-in defaults"),
    }

    let root_folder = settings.resolve_root_folder(args.root.as_deref());
    let catalogue = catalogue_path(&root_folder);
    info!("Catalogue: {}", catalogue.display());

    match args.command {
        Command::Export { output } => {
            let store = JsonFileStore::open(&catalogue)?;
            let dump = export_command(&store)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, dump)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Catalogue exported to {}", path.display());
                }
                None => println!("{}", dump),
            }
        }
        Command::Import {
            file,
            ignore_scopes,
            dry_run,
        } => {
            let data = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut store = JsonFileStore::open(&catalogue)?;

            let report = import_command(&mut store, &data, &settings, ignore_scopes, dry_run)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::MassUpload {
            archive,
            parent,
            label,
        } => {
            let file = UploadedFile::read(&archive)?;
            let children = mass_upload_command(file, &settings, &parent, label)?;
            println!("{}", serde_json::to_string_pretty(&children)?);
        }
    }

    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr, and also to
/// the configured log file when there is one.
fn init_tracing(settings: &BlocksSettings) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| settings.logging.level.as_str().into());

    let file_layer = match &settings.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}
