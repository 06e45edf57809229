use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use crossref_metadata::config::{find_config_file, get_config, load_config, Config};
use crossref_metadata::models::{IdentifyRequest, MetadataRecord};
use crossref_metadata::sources::{CrossRefSource, WorksProvider};
use crossref_metadata::MetadataLookup;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CrossRef Metadata - Look up bibliographic metadata by DOI or title
#[derive(Parser, Debug)]
#[command(name = "crossref-metadata")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Look up bibliographic metadata on CrossRef by DOI or title", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up a work by DOI
    Doi {
        /// Digital Object Identifier, e.g. 10.1109/5.771073
        doi: String,
    },

    /// Search works by title and author
    #[command(alias = "s")]
    Search {
        /// Title text
        title: String,

        /// Author name (repeatable)
        #[arg(long, short)]
        author: Vec<String>,

        /// Maximum number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Look up using whatever is known; a DOI wins over the title
    Identify {
        /// Title text
        #[arg(long, short)]
        title: Option<String>,

        /// Author name (repeatable)
        #[arg(long, short)]
        author: Vec<String>,

        /// Digital Object Identifier
        #[arg(long, short)]
        doi: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("crossref_metadata={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = resolve_config(cli.config.as_ref())?;
    if let Some(timeout) = cli.timeout {
        config.crossref.timeout_secs = timeout;
    }

    let (request, limit) = match cli.command {
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            return Ok(());
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            return Ok(());
        }
        Commands::Doi { doi } => (IdentifyRequest::new().doi(doi), None),
        Commands::Search {
            title,
            author,
            limit,
        } => {
            let mut request = IdentifyRequest::new().title(title);
            request.authors = author;
            (request, limit)
        }
        Commands::Identify { title, author, doi } => {
            let mut request = IdentifyRequest::new();
            request.title = title;
            request.authors = author;
            if let Some(doi) = doi {
                request = request.doi(doi);
            }
            (request, None)
        }
    };

    let request = request.timeout(Duration::from_secs(config.crossref.timeout_secs));
    let source: Arc<dyn WorksProvider> = Arc::new(CrossRefSource::new(&config.crossref)?);
    let lookup = MetadataLookup::new(source)
        .limit(limit.unwrap_or(config.crossref.result_limit));

    let abort = Arc::new(AtomicBool::new(false));
    {
        let abort = Arc::clone(&abort);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted; stopping after the current request");
                abort.store(true, Ordering::Relaxed);
            }
        });
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    lookup.identify(&request, &abort, &tx).await;
    drop(tx);

    let mut records = Vec::new();
    while let Some(record) = rx.recv().await {
        records.push(record);
    }

    if records.is_empty() {
        if !cli.quiet {
            eprintln!("No matching works found");
        }
        return Ok(());
    }

    output_records(&records, cli.output)
}

fn resolve_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = if let Some(path) = path {
        load_config(path)?
    } else if let Some(path) = find_config_file() {
        tracing::info!("Using config file: {}", path.display());
        load_config(&path)?
    } else {
        get_config()?
    };
    Ok(config)
}

fn output_records(records: &[MetadataRecord], format: OutputFormat) -> Result<()> {
    let actual_format = if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    };

    match actual_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Plain => {
            for record in records {
                println!("{} - {}", record.title, record.authors.join("; "));
                if let Some(ref doi) = record.identifier {
                    println!("  DOI: {}", doi);
                }
                if let Some(date) = record.publication_date {
                    println!("  Published: {}", date.format("%Y-%m-%d"));
                }
                if let Some(ref publisher) = record.publisher {
                    println!("  Publisher: {}", publisher);
                }
                if let Some(ref series) = record.series {
                    println!("  Series: {} [{:.2}]", series.name, series.index);
                }
                println!();
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Title", "Authors", "Published", "Series", "DOI"]);

            for record in records {
                let published = record
                    .publication_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();

                let series = record
                    .series
                    .as_ref()
                    .map(|s| format!("{} [{:.2}]", s.name, s.index))
                    .unwrap_or_default();

                table.add_row(vec![
                    Cell::new(truncate(&record.title, 50)).add_attribute(Attribute::Bold),
                    Cell::new(truncate(&record.authors.join("; "), 30)),
                    Cell::new(published),
                    Cell::new(truncate(&series, 30)),
                    Cell::new(record.identifier.clone().unwrap_or_default()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
