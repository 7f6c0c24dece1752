//! catalog-sync CLI
//!
//! Scrapes the product catalog and mirrors it into a WooCommerce store.

use std::path::PathBuf;
use std::process::ExitCode;

use catalog_sync::{
    browser::{HttpDriver, PageDriver},
    error::Result,
    models::{Config, ScraperConfig},
    pipeline,
    remote::WooCommerceClient,
    services::SyncEngine,
    storage::ResultWriter,
};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// catalog-sync - Product Catalog Scraper and WooCommerce Sync
#[derive(Parser, Debug)]
#[command(
    name = "catalog-sync",
    version,
    about = "Scrape a product catalog and sync it to WooCommerce"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run full pipeline: Discover → Scrape → Write → Sync
    Run {
        #[command(flatten)]
        driver: DriverArgs,

        /// Stop after writing the scrape artifact
        #[arg(long)]
        skip_sync: bool,
    },

    /// Discover and scrape products, then write the artifact
    Scrape {
        #[command(flatten)]
        driver: DriverArgs,
    },

    /// Sync a previously written artifact to the store
    Sync {
        /// Artifact to sync (default: output.path from config)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Only report what would be created, updated or recreated
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration
    Validate,

    /// Discover product links and print them
    Links {
        #[command(flatten)]
        driver: DriverArgs,
    },
}

#[derive(Args, Debug)]
struct DriverArgs {
    /// Page driver used to load listing and product pages
    #[arg(long, value_enum, default_value_t)]
    driver: DriverKind,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum DriverKind {
    /// Headless Chromium
    #[cfg_attr(feature = "browser", default)]
    Chromium,
    /// Plain HTTP fetch of server-rendered HTML (no "load more" clicks)
    #[cfg_attr(not(feature = "browser"), default)]
    Http,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Start the requested page driver.
async fn launch_driver(kind: DriverKind, config: &ScraperConfig) -> Result<Box<dyn PageDriver>> {
    match kind {
        #[cfg(feature = "browser")]
        DriverKind::Chromium => Ok(Box::new(
            catalog_sync::browser::ChromiumDriver::launch(config).await?,
        )),
        #[cfg(not(feature = "browser"))]
        DriverKind::Chromium => Err(catalog_sync::error::AppError::unsupported(
            "this build has no Chromium driver; rebuild with --features browser or use --driver http",
        )),
        DriverKind::Http => Ok(Box::new(HttpDriver::new(config)?)),
    }
}

fn sync_engine(config: &Config) -> Result<SyncEngine<WooCommerceClient>> {
    let client = WooCommerceClient::new(&config.store)?;
    Ok(SyncEngine::new(client, config.store.stock))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => {
            log::info!("Done!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("catalog-sync failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    log::info!("catalog-sync starting...");

    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_process_env();
    log::info!("Loaded configuration from {}", cli.config.display());

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {e}");
            return Err(e);
        }
        log::info!("✓ Config OK (scraper, selectors, output and store)");
        log::debug!("{config:#?}");
        return Ok(());
    }

    config.validate()?;
    let storage = ResultWriter::new(&config.output.path);

    match cli.command {
        Command::Run { driver, skip_sync } => {
            let engine = if skip_sync { None } else { Some(sync_engine(&config)?) };
            let driver = launch_driver(driver.driver, &config.scraper).await?;
            pipeline::run_pipeline(&config, &*driver, &storage, engine.as_ref()).await?;
        }

        Command::Scrape { driver } => {
            let driver = launch_driver(driver.driver, &config.scraper).await?;
            pipeline::run_pipeline::<WooCommerceClient>(&config, &*driver, &storage, None).await?;
        }

        Command::Sync { input, dry_run } => {
            let storage = input.map(ResultWriter::new).unwrap_or(storage);
            let engine = sync_engine(&config)?;

            if dry_run {
                let plan = pipeline::run_dry_run(&engine, &storage).await?;
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                let summary = pipeline::run_sync(&engine, &storage).await?;
                for failure in &summary.total.failures {
                    log::warn!("Failed: {} ({})", failure.sku, failure.message);
                }
            }
        }

        Command::Links { driver } => {
            let driver = launch_driver(driver.driver, &config.scraper).await?;
            let links = pipeline::run_links(&config, &*driver).await;
            pipeline::close_driver(&*driver).await;

            let links = links?;
            for link in &links {
                println!("{link}");
            }
            log::info!("Found {} product links", links.len());
        }

        Command::Validate => {}
    }

    Ok(())
}
