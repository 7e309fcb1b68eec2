//! friendly-tagger CLI
//!
//! Command-line interface for the label tagger:
//! - Tag JSON-lines metrics with human-readable labels
//! - Look up a single code
//! - Populate the mapping database (ASN API, generator CSV)

use anyhow::Context;
use clap::{Parser, Subcommand};
use friendly_tagger::config::{generate_default_config, Config, LoggingConfig};
use friendly_tagger::ingest::{
    AsnIngestor, CsvMappingLoader, HttpPageSource, IngestError, MappingStore,
};
use friendly_tagger::record::Metric;
use friendly_tagger::tagger::TaggingEngine;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "friendly-tagger")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Add human-readable labels to coded tags in time series")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tag JSON-lines metrics from a file or stdin, writing to stdout
    Tag {
        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Metrics per batch
        #[arg(short, long, default_value = "1000")]
        batch_size: usize,
    },

    /// Resolve one code to its label
    Lookup {
        /// Source attribute (country_code, region_code, county_code, asn, continent_code)
        attribute: String,
        /// Code to resolve
        code: String,
        /// Unix timestamp to resolve at (default: now)
        #[arg(long)]
        at: Option<i64>,
    },

    /// Fetch ASN names from the AS-to-organisation API
    IngestAsn {
        /// First page to fetch
        #[arg(long, default_value = "1")]
        start_page: u32,
    },

    /// Load a label,code,apply_from,apply_to CSV into a mapping table
    LoadCsv {
        /// Target table (e.g. region_mappings)
        table: String,
        /// CSV file
        path: PathBuf,
        /// First line is a header
        #[arg(long)]
        header: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        // the real subscriber depends on this config, so warnings about it
        // go through a temporary one
        None => tracing::subscriber::with_default(
            bootstrap_subscriber(std::io::stderr),
            Config::load_default,
        ),
    };
    init_logging(&config.logging);

    match cli.command {
        Commands::Tag { input, batch_size } => {
            let mut engine = TaggingEngine::from_config(&config.tagger)?;
            tracing::info!(
                "Tagging with labels from {} (reload every {}s)",
                config.tagger.database,
                config.tagger.reload_interval_secs
            );

            match input {
                Some(path) => {
                    let file = std::fs::File::open(&path)
                        .with_context(|| format!("opening {:?}", path))?;
                    tag_stream(
                        &mut engine,
                        std::io::BufReader::new(file),
                        std::io::stdout().lock(),
                        batch_size.max(1),
                    )?;
                }
                None => {
                    let stdin = std::io::stdin();
                    tag_stream(
                        &mut engine,
                        stdin.lock(),
                        std::io::stdout().lock(),
                        batch_size.max(1),
                    )?;
                }
            }
        }

        Commands::Lookup {
            attribute,
            code,
            at,
        } => {
            let at = at.unwrap_or_else(|| chrono::Utc::now().timestamp());
            let mut engine = TaggingEngine::from_config(&config.tagger)?;
            engine.reload(at)?;

            match engine.resolve(&attribute, &code, at) {
                Some(label) => println!("{}", label),
                None => {
                    eprintln!("No label for {}={} at {}", attribute, code, at);
                    std::process::exit(1);
                }
            }
        }

        Commands::IngestAsn { start_page } => {
            let source = HttpPageSource::new(&config.ingest)?;
            let ingestor = AsnIngestor::new(source, config.tagger.tables.asn.clone());
            let mut store = MappingStore::open(Path::new(&config.tagger.database))?;

            match ingestor.run(&mut store, start_page).await {
                Ok(summary) => println!(
                    "Ingested {} pages: {} records, {} new",
                    summary.pages, summary.fetched, summary.inserted
                ),
                Err(IngestError::Page { page, source }) => {
                    eprintln!("Ingestion stopped at page {}: {}", page, source);
                    eprintln!("Resume with: friendly-tagger ingest-asn --start-page {}", page);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::LoadCsv {
            table,
            path,
            header,
        } => {
            let mut store = MappingStore::open(Path::new(&config.tagger.database))?;
            let inserted = CsvMappingLoader::new()
                .with_header(header)
                .load(&mut store, &table, &path)?;
            println!("Loaded {} rows into {}", inserted, table);
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// Warnings-only stderr logger used before the config is known
fn bootstrap_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(writer)
        .finish()
}

fn init_logging(config: &LoggingConfig) {
    // stdout carries tagged records, so logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("friendly_tagger={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Read metrics line by line, tag them in batches and write them out
///
/// Lines that are not valid JSON metrics (including non-UTF-8 lines) are
/// skipped with a warning.
fn tag_stream<R: BufRead, W: Write>(
    engine: &mut TaggingEngine,
    reader: R,
    out: W,
    batch_size: usize,
) -> anyhow::Result<()> {
    let mut out = BufWriter::new(out);
    let mut batch: Vec<Metric> = Vec::with_capacity(batch_size);
    let mut skipped = 0usize;

    for (line_num, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<Metric>(&line) {
            Ok(metric) => batch.push(metric),
            Err(e) => {
                tracing::warn!("Line {}: skipping malformed metric: {}", line_num + 1, e);
                skipped += 1;
                continue;
            }
        }

        if batch.len() >= batch_size {
            flush_batch(engine, &mut batch, &mut out)?;
        }
    }

    flush_batch(engine, &mut batch, &mut out)?;
    out.flush()?;

    if skipped > 0 {
        tracing::warn!("Skipped {} malformed lines", skipped);
    }

    Ok(())
}

fn flush_batch<W: Write>(
    engine: &mut TaggingEngine,
    batch: &mut Vec<Metric>,
    out: &mut W,
) -> anyhow::Result<()> {
    if batch.is_empty() {
        return Ok(());
    }

    let stats = engine.apply(batch);
    tracing::debug!(
        "Tagged batch of {} metrics with {} labels",
        stats.records,
        stats.labels_added
    );

    for metric in batch.drain(..) {
        serde_json::to_writer(&mut *out, &metric)?;
        out.write_all(b"\n")?;
    }

    Ok(())
}
