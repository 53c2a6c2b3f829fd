//! CLI entry point for the reel_metrics toolchain.
//!
//! Provides subcommands for converting influencer spreadsheet exports into
//! dashboard JSON documents, downloading the referenced thumbnail images,
//! and filtering/merging scraped post exports.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use reel_metrics::convert::{convert_combined, convert_single};
use reel_metrics::document::{Document, backup_path};
use reel_metrics::fetch::BasicClient;
use reel_metrics::filter;
use reel_metrics::merge::{self, JoinKind};
use reel_metrics::thumbnails::{DEFAULT_CONCURRENCY, StoreLayout, collect_tasks, download_all};

#[derive(Parser)]
#[command(name = "reel_metrics")]
#[command(about = "Convert influencer spreadsheet exports into dashboard JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single spreadsheet export into a JSON document
    Convert {
        /// Spreadsheet export (.xlsx, .xls or .csv)
        #[arg(value_name = "EXPORT")]
        input: PathBuf,

        /// JSON file to write
        #[arg(short, long, default_value = "data.json")]
        output: PathBuf,
    },
    /// Combine regular and sales exports into one document with per-type summaries
    Combine {
        /// Regular influencer export
        #[arg(short, long)]
        regular: Option<PathBuf>,

        /// Sales influencer export
        #[arg(short, long)]
        sales: Option<PathBuf>,

        /// JSON file to write
        #[arg(short, long, default_value = "data_combined.json")]
        output: PathBuf,
    },
    /// Download the thumbnail images referenced by a JSON document
    FetchThumbnails {
        /// JSON document produced by convert or combine
        #[arg(value_name = "DOCUMENT", default_value = "data.json")]
        document: PathBuf,

        /// Directory (or directory base with --by-type) for downloaded images
        #[arg(short, long, default_value = "thumbnails")]
        dir: PathBuf,

        /// Partition downloads into per-type directories
        #[arg(long, default_value_t = false)]
        by_type: bool,

        /// Maximum number of concurrent downloads
        #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Keep only export rows whose URL appears in a target list
    Filter {
        /// File with one target URL per line
        #[arg(short, long)]
        urls: PathBuf,

        /// Scraped export to filter (.xlsx, .xls or .csv)
        #[arg(short, long)]
        input: PathBuf,

        /// CSV file to write
        #[arg(short, long, default_value = "filtered.csv")]
        output: PathBuf,
    },
    /// Join filtered post rows against profile rows
    Merge {
        /// Post rows (.xlsx, .xls or .csv)
        #[arg(short, long)]
        posts: PathBuf,

        /// Profile rows (.xlsx, .xls or .csv)
        #[arg(long)]
        profiles: PathBuf,

        /// Key column in the post rows
        #[arg(long, default_value = "ownerUsername")]
        left_key: String,

        /// Key column in the profile rows
        #[arg(long, default_value = "username")]
        right_key: String,

        /// Join flavor
        #[arg(long, value_enum, default_value = "left")]
        join: JoinMode,

        /// CSV file to write
        #[arg(short, long, default_value = "merged.csv")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum JoinMode {
    Left,
    Inner,
}

impl From<JoinMode> for JoinKind {
    fn from(mode: JoinMode) -> JoinKind {
        match mode {
            JoinMode::Left => JoinKind::Left,
            JoinMode::Inner => JoinKind::Inner,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/reel_metrics.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("reel_metrics.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert { input, output } => {
            convert_single(&input, &output)?;
        }
        Commands::Combine {
            regular,
            sales,
            output,
        } => {
            convert_combined(regular.as_deref(), sales.as_deref(), &output)?;
        }
        Commands::FetchThumbnails {
            document,
            dir,
            by_type,
            concurrency,
        } => {
            fetch_thumbnails(&document, dir, by_type, concurrency).await?;
        }
        Commands::Filter {
            urls,
            input,
            output,
        } => {
            filter::run(&urls, &input, &output)?;
        }
        Commands::Merge {
            posts,
            profiles,
            left_key,
            right_key,
            join,
            output,
        } => {
            merge::run(
                &posts,
                &profiles,
                &left_key,
                &right_key,
                join.into(),
                &output,
            )?;
        }
    }

    Ok(())
}

/// Downloads every referenced thumbnail, then rewrites the document with the
/// local paths and a backup copy alongside it.
async fn fetch_thumbnails(
    document_path: &Path,
    dir: PathBuf,
    by_type: bool,
    concurrency: usize,
) -> Result<()> {
    let mut document = Document::load(document_path)?;

    let tasks = collect_tasks(&document);
    info!(tasks = tasks.len(), "thumbnails to download");

    let layout = if by_type {
        StoreLayout::ByType(dir)
    } else {
        StoreLayout::Single(dir)
    };

    let client = Arc::new(BasicClient::new()?);
    let report = download_all(client, tasks, &layout, concurrency).await?;

    document.apply_thumbnails(&report.results);
    document.save(document_path)?;

    let backup = backup_path(document_path);
    document.save(&backup)?;
    info!(
        document = %document_path.display(),
        backup = %backup.display(),
        "document updated with local thumbnail paths"
    );

    Ok(())
}
