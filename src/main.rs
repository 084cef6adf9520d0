use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use boleto::client::{
    AuthError, ClientConfig, ClientError, ConfigError, DocumentGenerator, DocumentLookup,
    Session, format_brl,
};
use boleto::core::{MappingOptions, RawRecord};
use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "boleto",
    about = "Issue and look up boleto/PIX billing documents",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    debug: bool,

    /// Config file [default: ~/.config/boleto.toml]
    #[arg(long, short, global = true, env = "BOLETO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request an access token to check credentials and connectivity
    Token,
    /// Show one document
    Get { id: String },
    /// List documents for a CPF/CNPJ
    List {
        tax_id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },
    /// Print whether a document is paid
    Paid { id: String },
    /// Generate one document from a JSON row
    Generate {
        file: PathBuf,
        /// Print the payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate a document for every row of a JSON array
    Batch {
        file: PathBuf,
        /// Print the payloads instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to read {}: {source}", path.display())]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{0} of {1} rows failed")]
    BatchFailed(usize, usize),
}

type Result<T> = std::result::Result<T, CliError>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("boleto={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Mapping options for a dry run: an explicit config must load, the default
/// one is used only when present.
fn dry_run_options(config: Option<&Path>) -> Result<MappingOptions> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => match ClientConfig::default_path() {
            Ok(path) if path.exists() => path,
            _ => return Ok(MappingOptions::default()),
        },
    };
    Ok(ClientConfig::from_file(&path)?.mapping_options())
}

async fn run(cli: Cli) -> Result<()> {
    // Dry runs validate locally and need no credentials.
    let dry_run = matches!(
        cli.command,
        Commands::Generate { dry_run: true, .. } | Commands::Batch { dry_run: true, .. }
    );
    let options = if dry_run {
        dry_run_options(cli.config.as_deref())?
    } else {
        MappingOptions::default()
    };
    match &cli.command {
        Commands::Generate {
            file,
            dry_run: true,
        } => {
            let record: RawRecord = read_json(file)?;
            let request = record.to_request(&options).map_err(ClientError::from)?;
            return print_json(&request.to_wire_payload());
        }
        Commands::Batch {
            file,
            dry_run: true,
        } => {
            let records: Vec<RawRecord> = read_json(file)?;
            let mut failed = 0;
            for (i, record) in records.iter().enumerate() {
                match record.to_request(&options) {
                    Ok(request) => print_json(&request.to_wire_payload())?,
                    Err(e) => {
                        failed += 1;
                        error!(row = i + 1, "{e}");
                    }
                }
            }
            return if failed == 0 {
                Ok(())
            } else {
                Err(CliError::BatchFailed(failed, records.len()))
            };
        }
        _ => {}
    }

    let path = match cli.config {
        Some(path) => path,
        None => ClientConfig::default_path()?,
    };
    let session = Session::connect(ClientConfig::from_file(&path)?)?;

    match cli.command {
        Commands::Token => {
            let token = session.tokens().token().await?;
            let expires_at = session.tokens().cached().await.map(|t| t.expires_at);
            println!("token ok ({} chars)", token.len());
            if let Some(at) = expires_at {
                println!("cached until {at}");
            }
        }
        Commands::Get { id } => {
            let doc = DocumentLookup::new(session).get_by_id(&id).await?;
            print_json(&doc)?;
        }
        Commands::List {
            tax_id,
            page,
            per_page,
        } => {
            let mut result = DocumentLookup::new(session)
                .list_by_tax_id(&tax_id, page, per_page)
                .await?;
            result.sort_newest_first();
            for doc in &result.documents {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    doc.id.as_deref().unwrap_or("-"),
                    doc.status.as_deref().unwrap_or("-"),
                    doc.effective_due_date().unwrap_or("-"),
                    doc.amount_cents().map_or_else(|| "-".to_string(), format_brl),
                    doc.service_summary(),
                );
            }
        }
        Commands::Paid { id } => {
            let paid = DocumentLookup::new(session).is_paid(&id).await;
            println!("{}", if paid { "paid" } else { "not paid" });
        }
        Commands::Generate { file, .. } => {
            let record: RawRecord = read_json(&file)?;
            let doc = DocumentGenerator::new(session).generate(&record).await?;
            print_json(&doc)?;
        }
        Commands::Batch { file, .. } => {
            let records: Vec<RawRecord> = read_json(&file)?;
            let report = DocumentGenerator::new(session)
                .generate_batch(&records)
                .await;
            for (row, doc) in &report.succeeded {
                println!("row {row}: {}", doc.id.as_deref().unwrap_or("-"));
            }
            for (row, e) in &report.failed {
                println!("row {row}: FAILED: {e}");
            }
            if !report.is_complete_success() {
                return Err(CliError::BatchFailed(report.failed.len(), report.total()));
            }
        }
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(ClientError::from)?;
    println!("{json}");
    Ok(())
}
