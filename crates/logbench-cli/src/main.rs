//! logbench CLI
//!
//! Loads synthetic logs into PostgreSQL, queries them through each index
//! family, and benchmarks full-text against partial matching.
//!
//! Usage:
//!   `logbench initialize --count 100000 --content medium`
//!   `logbench list --domain app.io --from 2024-06-01 --limit 20`
//!   `logbench search login`
//!   `logbench bench --size 10000 --size 100000 --content small --content large`

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

mod output;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use logbench_core::api::{InitializeRequest, LogQuery, LogService, RecordRequest};
use logbench_core::bench::{Harness, SeedPlan};
use logbench_core::store::{self, LogStore, MemoryLogStore, PgLogStore};
use logbench_core::{BulkLoader, Content, ContentSize, LogbenchConfig};

use output::Format;

#[derive(Parser)]
#[command(name = "logbench")]
#[command(version)]
#[command(about = "Load, query and benchmark PostgreSQL log indexes", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", default_value = "logbench.toml", global = true)]
    config: PathBuf,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Use an in-process store instead of PostgreSQL
    #[arg(long, global = true)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Batch size override
    #[arg(long, global = true)]
    batch_size: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and bulk-load synthetic logs
    Initialize {
        /// Number of records (1000, 10000, 100000, 1000000, 10000000)
        #[arg(short = 'n', long, default_value_t = 1000)]
        count: usize,

        /// Content size class (small, medium, large)
        #[arg(long, default_value = "small")]
        content: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },

    /// List logs with optional filters
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Full-text search term
        #[arg(long)]
        content_like: Option<String>,
    },

    /// Partial (substring) search over log content
    Search {
        /// Search term
        term: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Remove all logs
    Truncate,

    /// Insert a single log record
    Record {
        /// Originating domain
        #[arg(long)]
        domain: String,

        /// Action label
        #[arg(long)]
        action: String,

        /// User id (random when omitted)
        #[arg(long)]
        user_id: Option<Uuid>,

        /// Content as a JSON object
        #[arg(long, default_value = "{}")]
        content: String,
    },

    /// Run the full-text vs partial benchmark matrix
    Bench {
        /// Dataset sizes to seed (repeatable); benchmarks existing data when omitted
        #[arg(long = "size")]
        sizes: Vec<usize>,

        /// Content size classes to seed (repeatable)
        #[arg(long = "content", default_value = "small")]
        contents: Vec<ContentSize>,

        /// Append to existing data instead of truncating before each seed
        #[arg(long)]
        keep: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },

    /// Create the table, extension and indexes if missing
    Schema,

    /// Show or validate the effective configuration
    Config {
        /// Only validate, print nothing on success
        #[arg(long)]
        validate: bool,
    },
}

/// Filters shared by `list` and `search`.
#[derive(Args)]
struct FilterArgs {
    /// Exact user id
    #[arg(long)]
    user_id: Option<String>,

    /// Exact domain
    #[arg(long)]
    domain: Option<String>,

    /// Created on or after (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Created on or before (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Page number
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Page size (default from config)
    #[arg(long)]
    limit: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: Format,
}

impl FilterArgs {
    fn to_query(&self) -> LogQuery {
        LogQuery {
            user_id: self.user_id.clone(),
            domain: self.domain.clone(),
            created_at: self.from.clone(),
            created_at_to: self.to.clone(),
            page: Some(self.page),
            limit: self.limit,
            ..LogQuery::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = LogbenchConfig::load_from_path(&cli.config)?;
    if let Some(url) = &cli.database_url {
        config.database.url = url.clone();
    }
    if let Some(batch_size) = cli.batch_size {
        config.loader.batch_size = batch_size;
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    config.validate()?;

    init_logging(&config)?;

    match cli.command {
        Commands::Config { validate } => {
            if !validate {
                print!("{}", config.to_toml()?);
            }
        }
        Commands::Schema => {
            let store = PgLogStore::connect(&config.database).await?;
            store.ensure_schema().await?;
            println!("Schema ready");
        }
        Commands::Initialize {
            count,
            content,
            format,
        } => {
            let store = open_store(&config, cli.dry_run).await?;
            let loader = BulkLoader::new(Arc::clone(&store))
                .with_batch_size(config.loader.batch_size)
                .with_progress(format == Format::Table);
            let service = LogService::new(store, &config).with_loader(loader);

            let request = InitializeRequest {
                record_count: count,
                content_size: content,
            };
            let response = service.initialize(&request).await?;
            output::print_initialize(&response, format)?;
        }
        Commands::List {
            filters,
            content_like,
        } => {
            let service = LogService::new(open_store(&config, cli.dry_run).await?, &config);
            let query = LogQuery {
                content_like,
                ..filters.to_query()
            };
            let response = service.list_logs(&query).await?;
            output::print_logs(&response, filters.format)?;
        }
        Commands::Search { term, filters } => {
            let service = LogService::new(open_store(&config, cli.dry_run).await?, &config);
            let query = LogQuery {
                search_term: Some(term),
                ..filters.to_query()
            };
            let response = service.search_partial(&query).await?;
            output::print_logs(&response, filters.format)?;
        }
        Commands::Truncate => {
            let service = LogService::new(open_store(&config, cli.dry_run).await?, &config);
            let ack = service.truncate().await?;
            println!("{}", ack.message);
        }
        Commands::Record {
            domain,
            action,
            user_id,
            content,
        } => {
            let content: Content =
                serde_json::from_str(&content).context("--content must be a JSON object")?;
            let service = LogService::new(open_store(&config, cli.dry_run).await?, &config);
            let record = service
                .record(RecordRequest {
                    domain,
                    action,
                    user_id,
                    content,
                })
                .await?;
            output::print_json(&record)?;
        }
        Commands::Bench {
            sizes,
            contents,
            keep,
            format,
        } => {
            let store = open_store(&config, cli.dry_run).await?;
            let runs = run_bench(&config, store, &sizes, &contents, keep).await?;
            output::print_bench(&runs, format)?;
        }
    }

    Ok(())
}

async fn open_store(config: &LogbenchConfig, dry_run: bool) -> anyhow::Result<Arc<dyn LogStore>> {
    if dry_run {
        info!("Dry run mode - using in-memory store");
        return Ok(Arc::new(MemoryLogStore::new()));
    }
    let store = store::connect(&config.database)
        .await
        .with_context(|| format!("Unable to connect to database at {}", redact(&config.database.url)))?;
    Ok(store)
}

/// One run per (size, content) pair, or a single run over existing data.
async fn run_bench(
    config: &LogbenchConfig,
    store: Arc<dyn LogStore>,
    sizes: &[usize],
    contents: &[ContentSize],
    keep: bool,
) -> anyhow::Result<Vec<logbench_core::BenchmarkRun>> {
    let harness = || {
        Harness::new(Arc::clone(&store), config.bench.clone())
            .with_loader(BulkLoader::new(Arc::clone(&store)).with_batch_size(config.loader.batch_size))
    };

    if sizes.is_empty() {
        return Ok(vec![harness().run().await?]);
    }

    let mut runs = Vec::with_capacity(sizes.len() * contents.len());
    for &content_size in contents {
        for &count in sizes {
            info!(count, %content_size, "Benchmark pass");
            let seed = SeedPlan {
                count,
                content_size,
                truncate: !keep,
            };
            runs.push(harness().with_seed(seed).run().await?);
        }
    }
    Ok(runs)
}

fn init_logging(config: &LogbenchConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = if config.logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!(e))
}

/// Hides the password component of a connection URL.
fn redact(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.split_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}
