//! Batch driver: runs every row of the input table through site lookup,
//! logo extraction and logo download, then writes the annotated table.
//!
//! Guarantees:
//! - one output row per input row, in input order
//! - a failure on one school never stops the others
//! - logos already on disk are not downloaded again (unless overwriting)
//! - the resolver's session is closed once the batch ends, however it ends

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

use crate::entity::{Entity, LogoStatus, ResolutionResult};
use crate::error::ResolveError;
use crate::http::Fetcher;
use crate::logger::BatchLogger;
use crate::logo::LogoExtractor;
use crate::logo_store::LogoStore;
use crate::resolver::SiteResolver;
use crate::table::{write_output_table, InputTable};

pub const SUMMARY_FILENAME: &str = "batch_summary.json";

/// Summary of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total_entities: usize,
    pub found: usize,
    pub not_found: usize,
    pub no_website: usize,
    pub already_exists: usize,
    /// Logo files written during this run
    pub downloads: usize,
    pub output_table: String,
    pub logo_dir: String,
    pub results: Vec<ResolutionResult>,
    pub total_duration_secs: f64,
    pub started_at: String,
    pub completed_at: String,
}

impl BatchSummary {
    fn new(output_table: &Path, logo_dir: &Path) -> Self {
        Self {
            total_entities: 0,
            found: 0,
            not_found: 0,
            no_website: 0,
            already_exists: 0,
            downloads: 0,
            output_table: output_table.display().to_string(),
            logo_dir: logo_dir.display().to_string(),
            results: Vec::new(),
            total_duration_secs: 0.0,
            started_at: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            completed_at: String::new(),
        }
    }

    /// Recount totals from `results` and stamp the completion time
    fn finalize(&mut self) {
        let count = |status: LogoStatus| self.results.iter().filter(|r| r.status == status).count();
        self.total_entities = self.results.len();
        self.found = count(LogoStatus::Found);
        self.not_found = count(LogoStatus::NotFound);
        self.no_website = count(LogoStatus::NoWebsite);
        self.already_exists = count(LogoStatus::AlreadyExists);
        self.completed_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    }

    pub fn count(&self, status: LogoStatus) -> usize {
        match status {
            LogoStatus::Found => self.found,
            LogoStatus::NotFound => self.not_found,
            LogoStatus::NoWebsite => self.no_website,
            LogoStatus::AlreadyExists => self.already_exists,
        }
    }
}

/// Path of the JSON summary written beside the output table
pub fn summary_path(output_path: &Path) -> PathBuf {
    output_path.with_file_name(SUMMARY_FILENAME)
}

/// Export batch summary to JSON file
pub fn export_batch_summary(summary: &BatchSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize batch summary")?;

    fs::write(path, json).with_context(|| format!("Failed to write batch summary to: {}", path.display()))?;

    Ok(())
}

pub fn print_batch_summary(summary: &BatchSummary) {
    println!("\n=== BATCH SUMMARY ===");
    println!("Schools processed: {}", summary.total_entities);
    for status in LogoStatus::ALL {
        println!("  {}: {}", status, summary.count(status));
    }
    println!("Logos downloaded: {}", summary.downloads);
    println!("Duration: {:.2}s", summary.total_duration_secs);
    println!("Output table: {}", summary.output_table);
    println!("Logo directory: {}", summary.logo_dir);
    println!("=====================\n");
}

pub struct BatchDriver<R: SiteResolver, F: Fetcher> {
    resolver: R,
    logos: LogoExtractor<F>,
    logger: BatchLogger,
    overwrite: bool,
}

impl<R: SiteResolver, F: Fetcher> BatchDriver<R, F> {
    /// Entities are read from the input columns the resolver's strategy uses
    pub fn new(resolver: R, fetcher: F, logger: BatchLogger) -> Self {
        Self {
            resolver,
            logos: LogoExtractor::new(fetcher),
            logger,
            overwrite: false,
        }
    }

    /// Re-download logos even when the target file already exists
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Process every row of `input`, write the augmented table to
    /// `output_path` and logos under `logo_dir`.
    ///
    /// The resolver is closed before returning, on success and on error.
    pub async fn run(&mut self, input: &InputTable, output_path: &Path, logo_dir: &Path) -> Result<BatchSummary> {
        let outcome = self.run_batch(input, output_path, logo_dir).await;
        self.resolver.close();
        self.logger.finish_progress();
        outcome
    }

    async fn run_batch(&mut self, input: &InputTable, output_path: &Path, logo_dir: &Path) -> Result<BatchSummary> {
        let entities = input.entities(self.resolver.strategy())?;
        if input.is_empty() {
            self.logger.warn("Input table has no rows");
        }

        let store = LogoStore::new(logo_dir, self.overwrite);
        store
            .prepare()
            .with_context(|| format!("Failed to create logo directory: {}", logo_dir.display()))?;

        let mut summary = BatchSummary::new(output_path, logo_dir);
        let started = Instant::now();

        self.logger.start_progress(entities.len() as u64);

        for entity in entities {
            let label = entity.display_name.clone();
            let (result, downloaded) = self.process_entity(entity, &store).await;
            self.logger.log_outcome(&result);
            self.logger.advance_progress(&label);
            if downloaded {
                summary.downloads += 1;
            }
            summary.results.push(result);
        }

        self.logger.finish_progress();

        write_output_table(input, &summary.results, output_path)?;
        self.logger.log_table_saved(&output_path.display().to_string());

        summary.total_duration_secs = started.elapsed().as_secs_f64();
        summary.finalize();

        let summary_file = summary_path(output_path);
        export_batch_summary(&summary, &summary_file)?;
        debug!("Batch summary written to {}", summary_file.display());

        Ok(summary)
    }

    /// Run one entity through the pipeline. Returns the result and whether a
    /// logo file was written.
    async fn process_entity(&mut self, entity: Entity, store: &LogoStore) -> (ResolutionResult, bool) {
        let Some(website) = self.resolver.resolve_site(&entity).await else {
            return (ResolutionResult::no_website(entity), false);
        };
        self.logger.log_site_found(&entity.display_name, &website);

        let Some(logo_url) = self.logos.extract_logo(&website).await else {
            let result = ResolutionResult {
                entity,
                website_url: Some(website),
                logo_url: None,
                status: LogoStatus::NotFound,
            };
            return (result, false);
        };
        self.logger.log_logo_found(&entity.display_name, &logo_url);

        if store.should_skip(&entity.display_name) {
            let result = ResolutionResult {
                entity,
                website_url: Some(website),
                logo_url: Some(logo_url),
                status: LogoStatus::AlreadyExists,
            };
            return (result, false);
        }

        let (status, downloaded) = match self.download_logo(store, &entity.display_name, &logo_url).await {
            Ok(path) => {
                debug!("Logo for {} saved to {}", entity.display_name, path.display());
                (LogoStatus::Found, true)
            }
            Err(e) => {
                self.logger
                    .log_download_failed(&entity.display_name, &logo_url, &e.to_string());
                (LogoStatus::NotFound, false)
            }
        };

        let result = ResolutionResult {
            entity,
            website_url: Some(website),
            logo_url: Some(logo_url),
            status,
        };
        (result, downloaded)
    }

    async fn download_logo(&self, store: &LogoStore, display_name: &str, logo_url: &str) -> Result<PathBuf, ResolveError> {
        let image = self.logos.fetcher().fetch(logo_url).await?.require_success(logo_url)?;
        store.persist(display_name, &image.body)
    }
}
