use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use sitelogofinder::batch::{print_batch_summary, BatchDriver};
use sitelogofinder::browser::BrowserSession;
use sitelogofinder::cli::Cli;
use sitelogofinder::config::{self, AppConfig, ResolverStrategy};
use sitelogofinder::http::HttpFetcher;
use sitelogofinder::logger::{BatchLogger, VerbosityLevel};
use sitelogofinder::resolver::{PortalResolver, PortalSelectors, SearchResolver, SiteResolver};
use sitelogofinder::table::InputTable;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Handle --init flag first (before any other processing)
    if cli.init {
        match AppConfig::create_default_config() {
            Ok(path) => {
                println!("✅ Created default configuration file at: {}", path.display());
                println!("   Edit this file to customize settings, then run sitelogofinder again.");
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("❌ Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = cli.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let app_config = load_config(cli.config.as_deref());

    let verbosity = cli.verbosity();
    init_tracing(verbosity);

    let logger = match &cli.log_file {
        Some(path) => BatchLogger::with_log_file(verbosity, path.clone()),
        None => BatchLogger::new(verbosity),
    };

    if let Err(e) = app_config.require_for(cli.strategy) {
        eprintln!("❌ Configuration error: {}", e);
        std::process::exit(1);
    }

    // Presence is checked by validate()
    let input_path = cli.input_file.clone().unwrap_or_default();
    let input = match InputTable::from_path(&input_path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = input.check_columns(cli.strategy) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }

    logger.log_batch_start(&input_path.display().to_string(), input.len());

    let output_path = cli.output_path(&app_config.output);
    let logo_dir = cli.logo_path(&app_config.output);
    let overwrite = cli.overwrite_existing(&app_config.output);

    let fetcher = match HttpFetcher::new(&app_config.http) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("❌ Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = match cli.strategy {
        ResolverStrategy::Query => {
            let resolver = SearchResolver::new(fetcher.client().clone(), &app_config.search);
            run_batch(resolver, fetcher, logger.clone(), &input, &output_path, &logo_dir, overwrite).await
        }
        ResolverStrategy::Portal => {
            let selectors = match PortalSelectors::from_config(&app_config.portal) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("❌ Configuration error: {}", e);
                    std::process::exit(1);
                }
            };
            let session = match BrowserSession::launch(&app_config.portal) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            };
            let resolver = PortalResolver::new(session, selectors);
            run_batch(resolver, fetcher, logger.clone(), &input, &output_path, &logo_dir, overwrite).await
        }
    };

    match outcome {
        Ok(summary) => {
            print_batch_summary(&summary);
        }
        Err(e) => {
            logger.error(&format!("Batch failed: {:#}", e));
            export_logs(&logger, cli.log_file.as_deref());
            std::process::exit(1);
        }
    }

    export_logs(&logger, cli.log_file.as_deref());

    Ok(())
}

fn load_config(path: Option<&Path>) -> AppConfig {
    let loaded = match path {
        Some(p) => AppConfig::load_from_path(p),
        None => AppConfig::load(),
    };

    match loaded {
        Ok(cfg) => cfg,
        Err(config::ConfigError::FileNotFound(path)) => {
            // Config not found - prompt to create if interactive
            match AppConfig::prompt_create_config() {
                Ok(Some(created_path)) => {
                    println!("✅ Created default configuration file at: {}", created_path.display());
                    println!("   Edit this file to customize settings, then run sitelogofinder again.");
                    std::process::exit(0);
                }
                Ok(None) => {
                    eprintln!("❌ Configuration file not found at: {}", path.display());
                    eprintln!("   Run with --init to create a default configuration file.");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("❌ Failed to create configuration file: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

/// RUST_LOG wins when set; otherwise the filter follows -v
fn init_tracing(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.tracing_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run_batch<R: SiteResolver>(
    resolver: R,
    fetcher: HttpFetcher,
    logger: BatchLogger,
    input: &InputTable,
    output_path: &Path,
    logo_dir: &Path,
    overwrite: bool,
) -> Result<sitelogofinder::BatchSummary> {
    let mut driver = BatchDriver::new(resolver, fetcher, logger).overwrite(overwrite);
    driver.run(input, output_path, logo_dir).await
}

fn export_logs(logger: &BatchLogger, log_file: Option<&str>) {
    if !logger.is_log_export_enabled() {
        return;
    }

    match logger.export_logs() {
        Ok(()) => {
            if let Some(log_file) = log_file {
                println!("📄 Execution logs exported to: {}", log_file);
                println!("   Total log entries: {}", logger.get_log_count());
            }
        }
        Err(e) => {
            eprintln!("⚠️ Warning: Failed to export logs: {}", e);
        }
    }
}
