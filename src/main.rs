//! Hotel-Scout main entry point
//!
//! This is the command-line interface for the Hotel-Scout site harvester.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use hotel_scout::config::{load_config_with_hash, validate, Config};
use hotel_scout::output::print_summary;
use hotel_scout::pipeline::{read_url_list, Mode, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Hotel-Scout: a scoped hotel website harvester
///
/// Hotel-Scout crawls a hotel's website, saves its text as markdown, structures
/// it through a chat completions service and downloads the site's photography.
#[derive(Parser, Debug)]
#[command(name = "hotel-scout")]
#[command(version = "1.0.0")]
#[command(about = "A scoped hotel website harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// URL of the website to process
    #[arg(short, long, required_unless_present = "file", conflicts_with = "file")]
    url: Option<String>,

    /// File containing URLs to process, one per line
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Stages to run
    #[arg(short, long, value_enum, default_value_t = CliMode::Full)]
    mode: CliMode,

    /// Site id used for the image directory (single URL only)
    #[arg(long, requires = "url")]
    id: Option<String>,

    /// Delay between requests in seconds
    #[arg(short, long)]
    delay: Option<f64>,

    /// Maximum number of booking pages to crawl
    #[arg(short = 'b', long)]
    max_booking: Option<u32>,

    /// Maximum number of pages in the text crawl
    #[arg(long)]
    page_cap: Option<u32>,

    /// Minimum image width in pixels
    #[arg(short = 'w', long)]
    min_width: Option<u32>,

    /// Minimum image height in pixels
    #[arg(short = 'H', long)]
    min_height: Option<u32>,

    /// Minimum image size in KB
    #[arg(short = 's', long)]
    min_size: Option<u64>,

    /// Maximum number of pages to crawl for images
    #[arg(short = 'p', long)]
    max_pages: Option<u32>,

    /// Skip the structuring stage
    #[arg(long)]
    no_structure: bool,

    /// Validate config and show what would be processed without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Full,
    Text,
    Images,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Full => Mode::Full,
            CliMode::Text => Mode::Text,
            CliMode::Images => Mode::Images,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli)?;
    let urls = target_urls(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, cli.mode.into(), &urls);
        return Ok(());
    }

    let pipeline = Pipeline::from_config(config, cli.mode.into())
        .context("Failed to set up the processing pipeline")?;

    if let (Some(url), None) = (&cli.url, &cli.file) {
        let result = pipeline
            .process_site(url, cli.id.as_deref())
            .await
            .with_context(|| format!("Failed to process {}", url))?;
        tracing::info!(
            "Processed {}: {} pages, {} images",
            result.url,
            result.pages,
            result.images_saved()
        );
        return Ok(());
    }

    let summary = pipeline.process_site_list(&urls).await?;
    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("hotel_scout=info,warn"),
            1 => EnvFilter::new("hotel_scout=debug,info"),
            2 => EnvFilter::new("hotel_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the optional config file and applies command-line overrides
fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(delay) = cli.delay {
        if !delay.is_finite() || delay < 0.0 {
            bail!("--delay must be a non-negative number of seconds");
        }
        config.crawler.request_delay_ms = (delay * 1000.0).round() as u64;
    }
    if let Some(max_booking) = cli.max_booking {
        config.crawler.max_booking_visits = max_booking;
    }
    if let Some(page_cap) = cli.page_cap {
        config.crawler.page_cap = page_cap;
    }
    if let Some(min_width) = cli.min_width {
        config.images.min_width = min_width;
    }
    if let Some(min_height) = cli.min_height {
        config.images.min_height = min_height;
    }
    if let Some(min_size) = cli.min_size {
        config.images.min_size_kb = min_size;
    }
    if let Some(max_pages) = cli.max_pages {
        config.images.max_pages = max_pages;
    }
    if cli.no_structure {
        config.structuring.enabled = false;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

fn target_urls(cli: &Cli) -> anyhow::Result<Vec<String>> {
    if let Some(url) = &cli.url {
        return Ok(vec![url.clone()]);
    }

    let Some(path) = &cli.file else {
        bail!("Either --url or --file must be provided");
    };
    let urls = read_url_list(path).with_context(|| format!("Failed to read URL list {}", path.display()))?;
    if urls.is_empty() {
        bail!("No URLs found in {}", path.display());
    }
    tracing::info!("Found {} URLs to process", urls.len());
    Ok(urls)
}

/// Handles the --dry-run mode: shows the effective configuration and targets
fn handle_dry_run(config: &Config, mode: Mode, urls: &[String]) {
    println!("=== Hotel-Scout Dry Run ===\n");

    println!("Mode: {:?}", mode);

    println!("\nCrawler Configuration:");
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Page cap: {}", config.crawler.page_cap);
    println!("  Max booking pages: {}", config.crawler.max_booking_visits);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nImages:");
    println!(
        "  Minimum: {}x{} px, {} KB",
        config.images.min_width, config.images.min_height, config.images.min_size_kb
    );
    println!("  Max pages: {}", config.images.max_pages);
    println!("  Concurrency: {}", config.images.concurrency);
    println!("  During crawl: {}", config.images.during_crawl);

    println!("\nOutput:");
    println!("  Data root: {}", config.output.data_root.display());

    println!("\nStructuring:");
    if config.structuring.enabled {
        println!("  Model: {} via {}", config.structuring.model, config.structuring.endpoint);
    } else {
        println!("  Disabled");
    }

    println!("\nTargets ({}):", urls.len());
    for url in urls {
        println!("  - {}", url);
    }

    println!("\n✓ Configuration is valid");
}
