use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use leadflow::{
    BatchImporter, CanonicalLead, ImportConfig, ImportOutcome, InMemoryLeadStore, LeadflowConfig,
    StaticProjectRegistry, SubmissionMode, lead_template_csv,
};
use tracing_subscriber::EnvFilter;

/// Import uploaded lead sheets: normalize, link projects, deduplicate, submit.
#[derive(Parser)]
#[command(name = "leadflow", version)]
#[command(about = "Lead sheet ingestion and reconciliation")]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a lead sheet into an in-memory store and print the report as JSON.
    Import {
        /// Comma-delimited lead sheet with a header row.
        file: PathBuf,

        /// JSON array of `{id, name, keywords?}` project entries.
        #[arg(long)]
        registry: Option<PathBuf>,

        /// YAML import configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured submission mode.
        #[arg(long, value_enum)]
        mode: Option<SubmissionMode>,

        /// Override whether phone-less leads are deduplicated.
        #[arg(long)]
        dedupe_blank_phones: Option<bool>,

        /// JSON array of leads the store already holds.
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Pretty-print the report.
        #[arg(long)]
        pretty: bool,
    },
    /// Print the CSV template of expected columns.
    Template,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Template => {
            print!("{}", lead_template_csv());
            Ok(ExitCode::SUCCESS)
        }
        Command::Import {
            file,
            registry,
            config,
            mode,
            dedupe_blank_phones,
            existing,
            pretty,
        } => {
            let mut import_config = match config {
                Some(path) => LeadflowConfig::from_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?
                    .to_import_config()?,
                None => ImportConfig::default(),
            };
            if let Some(mode) = mode {
                import_config.mode = mode;
            }
            if let Some(flag) = dedupe_blank_phones {
                import_config.dedupe.dedupe_blank_phones = flag;
            }

            let registry = match registry {
                Some(path) => StaticProjectRegistry::from_json_file(&path)
                    .with_context(|| format!("loading registry {}", path.display()))?,
                None => StaticProjectRegistry::default(),
            };

            let store = match existing {
                Some(path) => {
                    let json = fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    let leads: Vec<CanonicalLead> = serde_json::from_str(&json)
                        .with_context(|| format!("parsing existing leads {}", path.display()))?;
                    InMemoryLeadStore::with_existing(leads)
                }
                None => InMemoryLeadStore::new(),
            };

            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading lead sheet {}", file.display()))?;

            let importer = BatchImporter::new(import_config)?;
            let report = importer.import_batch(&text, &registry, &store).await?;

            let rendered = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{rendered}");

            Ok(match report.outcome() {
                ImportOutcome::Failed => ExitCode::from(2),
                _ => ExitCode::SUCCESS,
            })
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
