use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

use seogen::config::{load_config, validate_config, Config, LogFormat};
use seogen::db::{default_database_path, lease_repo, RecordFilter};
use seogen::error::ConfigError;
use seogen::logging::init_logging;
use seogen::pipeline::{
    write_json_lines, BatchDriver, BroadcastProgress, DriverError, FanoutProgress, LeasedProgress,
    LogProgress, ProgressReporter,
};
use seogen::store::{IngestionStore, SqliteStore};
use seogen::synth::{slug_index, ContentRecord, ContentStatus, ContentSynthesizer};
use seogen::{Database, DimensionSpace, RunLease, SeogenError, WorkerError};

const GENERATION_LEASE: &str = "generation";

#[derive(Parser)]
#[command(name = "seogen")]
#[command(about = "Deterministic combinatorial content generation with resumable ingestion")]
#[command(version)]
struct Cli {
    /// Configuration file (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<CliLogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliLogFormat {
    Text,
    Json,
}

impl From<CliLogFormat> for LogFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Text => LogFormat::Text,
            CliLogFormat::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate records until the store holds the target count
    Generate {
        /// Number of records the store should hold
        #[arg(short, long)]
        target: Option<u64>,

        /// Records per insert
        #[arg(short, long)]
        batch_size: Option<u64>,

        /// Synthesis threads
        #[arg(short, long)]
        workers: Option<usize>,

        /// Stream progress events to stdout as JSON lines
        #[arg(long)]
        progress_json: bool,
    },

    /// Show progress against the target
    Status {
        /// Also break records down by this catalog
        #[arg(long)]
        by: Option<String>,
    },

    /// Print the record a given index or slug synthesizes to
    Inspect {
        /// Generation index, or a slug ending in one
        key: String,
    },

    /// List stored records
    List {
        /// Dimension filter, repeatable
        #[arg(short = 'w', long = "where", value_parser = parse_dimension_filter)]
        filters: Vec<(String, String)>,

        /// Only records with this status (generated, published)
        #[arg(short, long)]
        status: Option<ContentStatus>,

        #[arg(short, long, default_value = "20")]
        limit: u64,

        #[arg(short, long, default_value = "0")]
        offset: u64,
    },

    /// Mark a record as published
    Publish {
        /// Record slug
        slug: String,
    },
}

fn parse_dimension_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((catalog, value)) if !catalog.trim().is_empty() && !value.trim().is_empty() => {
            Ok((catalog.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected catalog=value, got '{}'", raw)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(2);
            }
        },
        None => Config::default(),
    };

    if let Err(e) = init_logging(&config.logging, cli.log_format.map(LogFormat::from)) {
        eprintln!("Error: {}", e);
        return ExitCode::from(2);
    }

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(SeogenError::Driver(err)) => {
            eprintln!("Error: {}", err);
            eprintln!("Last committed count: {}", err.committed());
            if err.is_recoverable() {
                eprintln!("Re-run `seogen generate` to resume.");
            }
            match err {
                DriverError::Cancelled { .. } => ExitCode::from(130),
                _ => ExitCode::FAILURE,
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: Config) -> seogen::Result<()> {
    let db_path = match cli.database.clone() {
        Some(path) => path,
        None => match config.database.path.as_ref() {
            Some(path) => PathBuf::from(path),
            None => default_database_path().ok_or_else(|| {
                ConfigError::validation("cannot resolve home directory; pass --database")
            })?,
        },
    };

    match cli.command {
        Commands::Generate {
            target,
            batch_size,
            workers,
            progress_json,
        } => {
            let mut config = config;
            if let Some(target) = target {
                config.generation.target = i64::try_from(target)
                    .map_err(|_| ConfigError::validation("target is too large"))?;
            }
            if let Some(batch_size) = batch_size {
                config.generation.batch_size = i64::try_from(batch_size)
                    .map_err(|_| ConfigError::validation("batch_size is too large"))?;
            }
            if let Some(workers) = workers {
                config.generation.worker_count = workers;
            }
            validate_config(&config)?;
            generate(&config, Database::open(&db_path)?, progress_json)
        }
        Commands::Status { by } => status(&config, Database::open(&db_path)?, by.as_deref()),
        Commands::Inspect { key } => inspect(&config, Database::open(&db_path)?, &key),
        Commands::List {
            filters,
            status,
            limit,
            offset,
        } => {
            let space = DimensionSpace::from_config(&config.catalogs)?;
            check_dimension_filters(&space, &filters)?;
            let store = SqliteStore::new(Database::open(&db_path)?);
            let filter = RecordFilter {
                dimensions: filters,
                status,
                limit: Some(limit),
                offset: Some(offset),
            };
            let (rows, total) = store.query(&filter)?;
            for row in &rows {
                println!(
                    "{}\t{}\t{}\t{}",
                    row.record.slug,
                    row.record.status,
                    row.record.quality.overall(),
                    row.record.title
                );
            }
            eprintln!("{} of {} records", rows.len(), total);
            Ok(())
        }
        Commands::Publish { slug } => {
            let store = SqliteStore::new(Database::open(&db_path)?);
            if store.publish(&slug)? {
                println!("Published {}", slug);
            } else {
                match store.find_by_slug(&slug)? {
                    Some(_) => println!("{} is already published", slug),
                    None => println!("No record with slug {}", slug),
                }
            }
            Ok(())
        }
    }
}

fn generate(config: &Config, db: Database, progress_json: bool) -> seogen::Result<()> {
    let lease = RunLease::acquire(&db, GENERATION_LEASE, chrono::Duration::minutes(5))?;
    let store: Arc<dyn IngestionStore> = Arc::new(SqliteStore::new(db));
    let driver = BatchDriver::from_config(config, store)?;

    let cancel = driver.cancel_flag();
    let handler_flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let mut reporters: Vec<Box<dyn ProgressReporter>> = vec![Box::new(LogProgress)];
    let mut writer = None;
    if progress_json {
        let broadcast = BroadcastProgress::with_capacity(256);
        let rx = broadcast.subscribe();
        writer = Some(
            thread::Builder::new()
                .name("seogen-progress".to_string())
                .spawn(move || write_json_lines(rx, std::io::stdout().lock()))
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?,
        );
        reporters.push(Box::new(broadcast));
    }

    let progress = LeasedProgress::new(FanoutProgress::new(reporters), &lease, cancel);
    let result = driver.run(&progress);
    // Dropping the last sender lets the writer drain and exit.
    drop(progress);

    if let Some(handle) = writer {
        match handle.join() {
            Ok(Ok(lines)) => info!(lines, "Progress stream closed"),
            Ok(Err(e)) => warn!("Progress stream failed: {}", e),
            Err(_) => warn!("Progress writer panicked"),
        }
    }

    let summary = result?;
    lease.release()?;

    if !progress_json {
        println!(
            "Generated {} records ({} new, {} duplicates skipped) in {:.1}s",
            summary.final_count,
            summary.inserted,
            summary.duplicates,
            summary.elapsed.as_secs_f64()
        );
    }
    Ok(())
}

fn status(config: &Config, db: Database, by: Option<&str>) -> seogen::Result<()> {
    let space = DimensionSpace::from_config(&config.catalogs)?;
    let store = SqliteStore::new(db.clone());
    let count = store.count()?;
    let target = u64::try_from(config.generation.target).unwrap_or(0);
    let (_, published) = store.query(&RecordFilter {
        status: Some(ContentStatus::Published),
        limit: Some(0),
        ..RecordFilter::default()
    })?;

    let percentage = if target == 0 {
        100.0
    } else {
        (count as f64 / target as f64 * 100.0).min(100.0)
    };

    if let Some(path) = db.path() {
        println!("Database:   {} (schema v{})", path.display(), db.schema_version()?);
    }
    println!("Records:    {} / {} ({:.1}%)", count, target, percentage);
    println!("Published:  {}", published);
    if target > space.size() {
        println!(
            "Space size: {} (target exceeds it; dimension tuples repeat)",
            space.size()
        );
    } else {
        println!("Space size: {}", space.size());
    }

    match lease_repo::current(&db, GENERATION_LEASE)? {
        Some(lease) => println!(
            "Lease:      held by {} until {}",
            lease.holder, lease.expires_at
        ),
        None => println!("Lease:      free"),
    }

    if let Some(catalog) = by {
        if space.catalog(catalog).is_none() {
            return Err(ConfigError::InvalidCatalog {
                name: catalog.to_string(),
                reason: "not part of the dimension space".to_string(),
            }
            .into());
        }
        println!();
        for (value, n) in store.count_by_value(catalog)? {
            println!("{:<24}{}", value, n);
        }
    }

    info!(count, target_count = target, "Status reported");
    Ok(())
}

#[derive(Serialize)]
struct InspectOutput {
    record: ContentRecord,
    stored: bool,
    stored_status: Option<ContentStatus>,
    published_at: Option<String>,
}

fn inspect(config: &Config, db: Database, key: &str) -> seogen::Result<()> {
    let index = match key.parse::<u64>() {
        Ok(index) => index,
        Err(_) => slug_index(key).ok_or_else(|| {
            ConfigError::validation(format!("'{}' is neither an index nor a record slug", key))
        })?,
    };

    let space = DimensionSpace::from_config(&config.catalogs)?;
    let synthesizer = ContentSynthesizer::new(&config.templates, &space)?;
    let record = synthesizer.synthesize(&space.decompose(index), index);
    if key.parse::<u64>().is_err() && record.slug != key {
        warn!(expected = %record.slug, "Slug does not match the current catalogs");
    }

    let store = SqliteStore::new(db);
    let stored = store.find_by_slug(&record.slug)?;

    let output = InspectOutput {
        stored: stored.is_some(),
        stored_status: stored.as_ref().map(|s| s.record.status),
        published_at: stored.and_then(|s| s.published_at),
        record,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Rejects `--where` filters naming an unknown catalog or value.
fn check_dimension_filters(
    space: &DimensionSpace,
    filters: &[(String, String)],
) -> Result<(), ConfigError> {
    for (name, value) in filters {
        let catalog = space.catalog(name).ok_or_else(|| ConfigError::InvalidCatalog {
            name: name.clone(),
            reason: "not part of the dimension space".to_string(),
        })?;
        if catalog.position_of(value).is_none() {
            return Err(ConfigError::InvalidCatalog {
                name: name.clone(),
                reason: format!("has no value '{}'", value),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use seogen::config::default_catalogs;

    #[test]
    fn test_parse_dimension_filter() {
        assert_eq!(
            parse_dimension_filter(" platform = iOS ").unwrap(),
            ("platform".to_string(), "iOS".to_string())
        );
        assert!(parse_dimension_filter("platform").is_err());
        assert!(parse_dimension_filter("=iOS").is_err());
    }

    #[test]
    fn test_dimension_filters_checked_against_space() {
        let space = DimensionSpace::from_config(&default_catalogs()).unwrap();
        let known = space.catalogs()[0].name().to_string();
        let value = space.catalogs()[0].get(0).unwrap().to_string();

        assert!(check_dimension_filters(&space, &[(known.clone(), value)]).is_ok());
        assert!(check_dimension_filters(&space, &[(known, "nope".to_string())]).is_err());
        assert!(
            check_dimension_filters(&space, &[("missing".to_string(), "x".to_string())]).is_err()
        );
    }
}
