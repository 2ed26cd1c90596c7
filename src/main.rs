//! Book-Harvester main entry point
//!
//! This is the command-line interface for the Book-Harvester catalog harvester.

use anyhow::Context as _;
use book_harvester::config::{load_config, validate, Config};
use book_harvester::output::print_report;
use book_harvester::{run_crawl, Coordinator, CrawlPlan, PageRange};
use clap::{Args, Parser, Subcommand};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Book-Harvester: a catalog harvester for paginated book sites
///
/// Walks listing pages or book ids, downloads each book's text and cover
/// image, and writes all book records into one JSON file.
#[derive(Parser, Debug)]
#[command(name = "book-harvester")]
#[command(version)]
#[command(about = "A catalog harvester for paginated book sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Also append debug-level logs to this file
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest the books listed on a range of category pages
    Category {
        /// Category code (overrides the config file)
        #[arg(long)]
        category: Option<String>,

        /// First listing page to harvest
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        start_page: i64,

        /// Listing page to stop before (defaults to one past the last page)
        #[arg(long, allow_negative_numbers = true)]
        end_page: Option<i64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Harvest a range of book ids
    Ids {
        /// First book id to harvest
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        start_id: i64,

        /// Book id to stop before
        #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
        end_id: i64,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Folder for downloaded texts, images and the JSON file
    #[arg(long)]
    dest_folder: Option<PathBuf>,

    /// Path of the corpus JSON file itself, not a folder
    /// (defaults to books.json in the destination folder)
    #[arg(long, value_name = "FILE")]
    json_path: Option<PathBuf>,

    /// Do not download cover images
    #[arg(long)]
    skip_imgs: bool,

    /// Do not download book texts
    #[arg(long)]
    skip_txt: bool,
}

impl OutputArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(dest_folder) = &self.dest_folder {
            config.output.dest_folder = dest_folder.clone();
        }
        if let Some(json_path) = &self.json_path {
            config.output.json_path = Some(json_path.clone());
        }
        config.download.skip_imgs |= self.skip_imgs;
        config.download.skip_txt |= self.skip_txt;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    let plan = build_plan(cli.command, &mut config).await?;
    tracing::debug!(?plan, "Resolved crawl plan");

    let outcome = run_crawl(&config, &plan).await.context("harvest")?;
    tracing::info!(
        "Corpus written to: {}",
        config.output.corpus_path().display()
    );

    if !cli.quiet {
        print_report(&outcome.report);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// With a log file, every debug-level event of the harvester is appended to
/// it as well, whatever the console verbosity.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("book_harvester=info,warn"),
            1 => EnvFilter::new("book_harvester=debug,info"),
            2 => EnvFilter::new("book_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    let file = match log_file {
        Some(path) => {
            let file = open_log_file(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new("book_harvester=debug,info")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry().with(console).with(file).init();

    Ok(())
}

/// Opens `path` for appending, creating it and its parent folders
fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Applies command-line overrides and turns the subcommand into a plan
///
/// In category mode without `--end-page` the last page is looked up on the
/// site first, so the whole category is harvested.
async fn build_plan(command: Command, config: &mut Config) -> anyhow::Result<CrawlPlan> {
    match command {
        Command::Category {
            category,
            start_page,
            end_page,
            output,
        } => {
            output.apply(config);
            if let Some(category) = category {
                config.site.category = category;
            }
            validate(config).context("validate configuration")?;

            let end_page = match end_page {
                Some(end_page) => end_page,
                None => {
                    let coordinator = Coordinator::new(config)?;
                    let last_page = coordinator
                        .walker()
                        .discover_last_page(&config.site.category)
                        .await
                        .context("discover last page")?;
                    i64::from(last_page) + 1
                }
            };

            let pages = PageRange::clamped(start_page, end_page);
            tracing::info!(
                "Arguments after processing: start_page={}, end_page={}, dest_folder={}, json_path={}",
                pages.start,
                pages.end,
                config.output.dest_folder.display(),
                config.output.corpus_path().display()
            );

            Ok(CrawlPlan::Category {
                category: config.site.category.clone(),
                pages,
            })
        }
        Command::Ids {
            start_id,
            end_id,
            output,
        } => {
            output.apply(config);
            validate(config).context("validate configuration")?;

            let ids = PageRange::clamped(start_id, end_id);
            tracing::info!(
                "Arguments after processing: start_id={}, end_id={}, dest_folder={}",
                ids.start,
                ids.end,
                config.output.dest_folder.display()
            );

            Ok(CrawlPlan::Ids { ids })
        }
    }
}
