//! ragstudio - command-line console for a RAG Studio backend.

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use ragstudio_core::models::{ExportFormat, PipelineStatus, PipelineType};
use ragstudio_core::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Directory for a daily rotated log file, in addition to stderr
const LOG_DIR_ENV: &str = "RAGSTUDIO_LOG_DIR";

const LOG_FILE_PREFIX: &str = "ragstudio.log";

/// RAG Studio console.
#[derive(Parser)]
#[command(name = "ragstudio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the access token
    Login {
        /// Username (defaults to the last one used)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Log out and forget the stored token
    Logout,

    /// Show backend address, login state and cluster health
    Status,

    /// Pipeline management
    Pipelines {
        #[command(subcommand)]
        action: PipelinesAction,
    },

    /// Benchmark runs and reports
    Benchmarks {
        #[command(subcommand)]
        action: BenchmarksAction,
    },

    /// OpenSearch cluster, indices and documents
    Search {
        #[command(subcommand)]
        action: SearchAction,
    },

    /// Visual builder components, templates and graphs
    Builder {
        #[command(subcommand)]
        action: BuilderAction,
    },

    /// Follow live progress of a pipeline or benchmark
    Watch {
        #[arg(value_enum)]
        target: WatchTarget,

        /// Pipeline or benchmark ID
        id: String,

        /// Print raw JSON messages
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PipelinesAction {
    /// List pipelines
    List {
        #[arg(long)]
        skip: Option<u64>,

        #[arg(short, long)]
        limit: Option<u64>,

        #[arg(short = 't', long = "type", value_enum)]
        pipeline_type: Option<PipelineTypeArg>,

        #[arg(short, long, value_enum)]
        status: Option<PipelineStatusArg>,
    },

    /// Show one pipeline with its metrics
    Show { id: String },

    /// Run a query through a pipeline
    Execute {
        id: String,

        /// Query text
        query: String,

        /// Number of documents to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<u32>,
    },

    Activate { id: String },

    Deactivate { id: String },

    Delete { id: String },
}

#[derive(Subcommand)]
enum BenchmarksAction {
    /// List benchmark runs
    List {
        #[arg(long)]
        skip: Option<u64>,

        #[arg(short, long)]
        limit: Option<u64>,

        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show the result of a run
    Show { id: String },

    /// Download a report
    Export {
        id: String,

        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormatArg,

        /// Output file (defaults to the name the backend suggests)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two runs
    Compare { first: String, second: String },

    /// Generate synthetic test cases
    Generate {
        #[arg(short, long, default_value = "10")]
        count: u32,

        /// Query types to include (repeatable)
        #[arg(short = 't', long = "type")]
        query_types: Vec<String>,
    },

    Delete { id: String },
}

#[derive(Subcommand)]
enum SearchAction {
    /// Cluster health
    Health,

    /// List indices
    Indices {
        /// Index name pattern
        #[arg(short, long)]
        pattern: Option<String>,

        /// Include system indices
        #[arg(long)]
        all: bool,
    },

    /// Document count and size of an index
    Stats { index: String },

    /// Full-text search in an index
    Query {
        index: String,

        query: String,

        #[arg(short = 'k', long, default_value = "10")]
        top_k: u32,
    },

    /// Upload a document file for chunking and indexing
    Upload {
        index: String,

        file: PathBuf,

        /// Source label stored with the chunks
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Copy one index into another
    Reindex {
        source: String,

        target: String,

        /// Create the target index first
        #[arg(long)]
        create: bool,
    },

    /// Status of a cluster task
    Task { id: String },

    /// Deployed ML models and ingest pipelines
    Models,
}

#[derive(Subcommand)]
enum BuilderAction {
    /// Components available in the palette
    Components,

    /// Starter templates
    Templates,

    /// Validate a graph JSON file
    Validate { file: PathBuf },

    /// Compile a graph JSON file into a pipeline
    Compile {
        file: PathBuf,

        /// Name of the compiled pipeline
        #[arg(short, long)]
        name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WatchTarget {
    Pipeline,
    Benchmark,
}

#[derive(Clone, Copy, ValueEnum)]
enum PipelineTypeArg {
    NaiveRag,
    GraphRag,
}

impl From<PipelineTypeArg> for PipelineType {
    fn from(arg: PipelineTypeArg) -> Self {
        match arg {
            PipelineTypeArg::NaiveRag => PipelineType::NaiveRag,
            PipelineTypeArg::GraphRag => PipelineType::GraphRag,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PipelineStatusArg {
    Active,
    Inactive,
    Error,
}

impl From<PipelineStatusArg> for PipelineStatus {
    fn from(arg: PipelineStatusArg) -> Self {
        match arg {
            PipelineStatusArg::Active => PipelineStatus::Active,
            PipelineStatusArg::Inactive => PipelineStatus::Inactive,
            PipelineStatusArg::Error => PipelineStatus::Error,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormatArg {
    Json,
    Csv,
    Html,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Json => ExportFormat::Json,
            ExportFormatArg::Csv => ExportFormat::Csv,
            ExportFormatArg::Html => ExportFormat::Html,
        }
    }
}

fn init_tracing(verbose: u8) -> Option<WorkerGuard> {
    // RUST_LOG wins over -v
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose);

    let mut config = Config::load()?;
    let api = commands::build_client(&config)?;

    match cli.command {
        Commands::Login { username } => {
            commands::auth::login(&api, &mut config, username).await?;
        }
        Commands::Logout => {
            commands::auth::logout(&api).await?;
        }
        Commands::Status => {
            commands::auth::status(&api).await?;
        }
        Commands::Pipelines { action } => match action {
            PipelinesAction::List {
                skip,
                limit,
                pipeline_type,
                status,
            } => {
                let filter = ragstudio_core::models::PipelineFilter {
                    skip,
                    limit,
                    pipeline_type: pipeline_type.map(Into::into),
                    status: status.map(Into::into),
                };
                commands::pipelines::list(&api, &filter).await?;
            }
            PipelinesAction::Show { id } => {
                commands::pipelines::show(&api, &id).await?;
            }
            PipelinesAction::Execute { id, query, top_k } => {
                commands::pipelines::execute(&api, &id, &query, top_k).await?;
            }
            PipelinesAction::Activate { id } => {
                commands::pipelines::set_active(&api, &id, true).await?;
            }
            PipelinesAction::Deactivate { id } => {
                commands::pipelines::set_active(&api, &id, false).await?;
            }
            PipelinesAction::Delete { id } => {
                commands::pipelines::delete(&api, &id).await?;
            }
        },
        Commands::Benchmarks { action } => match action {
            BenchmarksAction::List {
                skip,
                limit,
                status,
            } => {
                commands::benchmarks::list(&api, skip, limit, status.as_deref()).await?;
            }
            BenchmarksAction::Show { id } => {
                commands::benchmarks::show(&api, &id).await?;
            }
            BenchmarksAction::Export { id, format, output } => {
                commands::benchmarks::export(&api, &id, format.into(), output).await?;
            }
            BenchmarksAction::Compare { first, second } => {
                commands::benchmarks::compare(&api, &first, &second).await?;
            }
            BenchmarksAction::Generate { count, query_types } => {
                commands::benchmarks::generate(&api, count, &query_types).await?;
            }
            BenchmarksAction::Delete { id } => {
                commands::benchmarks::delete(&api, &id).await?;
            }
        },
        Commands::Search { action } => match action {
            SearchAction::Health => {
                commands::opensearch::health(&api).await?;
            }
            SearchAction::Indices { pattern, all } => {
                commands::opensearch::indices(&api, pattern.as_deref(), all).await?;
            }
            SearchAction::Stats { index } => {
                commands::opensearch::stats(&api, &index).await?;
            }
            SearchAction::Query {
                index,
                query,
                top_k,
            } => {
                commands::opensearch::query(&api, &index, &query, top_k).await?;
            }
            SearchAction::Upload {
                index,
                file,
                source,
            } => {
                commands::opensearch::upload(&api, &index, &file, source.as_deref()).await?;
            }
            SearchAction::Reindex {
                source,
                target,
                create,
            } => {
                commands::opensearch::reindex(&api, &source, &target, create).await?;
            }
            SearchAction::Task { id } => {
                commands::opensearch::task(&api, &id).await?;
            }
            SearchAction::Models => {
                commands::opensearch::models(&api).await?;
            }
        },
        Commands::Builder { action } => match action {
            BuilderAction::Components => {
                commands::builder::components(&api).await?;
            }
            BuilderAction::Templates => {
                commands::builder::templates(&api).await?;
            }
            BuilderAction::Validate { file } => {
                commands::builder::validate(&api, &file).await?;
            }
            BuilderAction::Compile { file, name } => {
                commands::builder::compile(&api, &file, &name).await?;
            }
        },
        Commands::Watch { target, id, json } => {
            let endpoint = match target {
                WatchTarget::Pipeline => commands::watch::Target::Pipeline(id),
                WatchTarget::Benchmark => commands::watch::Target::Benchmark(id),
            };
            commands::watch::run(&api, config.channel_settings(), endpoint, json).await?;
        }
    }

    Ok(())
}
