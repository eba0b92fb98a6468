//! CSV input and output tables
//!
//! The input is read with its header row and kept verbatim so the output can
//! reproduce every original column byte-for-byte, followed by the `Website`
//! and `Logo Status` columns.

use anyhow::{bail, Context, Result};
use csv::StringRecord;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::ResolverStrategy;
use crate::entity::{Entity, ResolutionResult};

pub const NAME_COLUMN: &str = "School Name";
pub const ADDRESS_COLUMN: &str = "Address";
pub const CODE_COLUMN: &str = "Entity Code";
pub const WEBSITE_COLUMN: &str = "Website";
pub const STATUS_COLUMN: &str = "Logo Status";

/// Input rows with their headers, as read
#[derive(Debug, Clone)]
pub struct InputTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

/// Column positions of the identifying fields for one strategy
#[derive(Debug, Clone, Copy)]
struct KeyColumns {
    name: usize,
    key: usize,
}

impl InputTable {
    /// Read a CSV table with a header row
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        Self::from_reader(content.as_slice())
            .with_context(|| format!("Failed to parse input table: {}", path.display()))
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers().context("Failed to read CSV headers")?.clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("Failed to parse CSV record")?;
            rows.push(record);
        }

        debug!("Read input table: {} columns, {} rows", headers.len(), rows.len());
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    fn key_columns(&self, strategy: ResolverStrategy) -> Result<KeyColumns> {
        let Some(name) = self.column(NAME_COLUMN) else {
            bail!("Input table must have a '{}' column", NAME_COLUMN);
        };
        let key_column = match strategy {
            ResolverStrategy::Query => ADDRESS_COLUMN,
            ResolverStrategy::Portal => CODE_COLUMN,
        };
        let Some(key) = self.column(key_column) else {
            bail!(
                "Input table must have an '{}' column for the {:?} strategy",
                key_column,
                strategy
            );
        };
        Ok(KeyColumns { name, key })
    }

    /// Check the table has the columns `strategy` needs
    pub fn check_columns(&self, strategy: ResolverStrategy) -> Result<()> {
        self.key_columns(strategy).map(|_| ())
    }

    /// Build one entity per row, in input order
    pub fn entities(&self, strategy: ResolverStrategy) -> Result<Vec<Entity>> {
        let cols = self.key_columns(strategy)?;
        Ok(self
            .rows
            .iter()
            .map(|row| {
                let name = row.get(cols.name).unwrap_or("");
                let key = row.get(cols.key).unwrap_or("");
                match strategy {
                    ResolverStrategy::Query => Entity::with_address(name, key),
                    ResolverStrategy::Portal => Entity::with_code(name, key),
                }
            })
            .collect())
    }
}

/// Write the input table back out with `Website` and `Logo Status` filled in.
///
/// `results` must be in input order, one per row. Existing `Website` or
/// `Logo Status` columns are overwritten in place instead of duplicated.
pub fn write_output_table(input: &InputTable, results: &[ResolutionResult], output_path: &Path) -> Result<()> {
    if input.len() != results.len() {
        bail!(
            "Result count {} does not match input row count {}",
            results.len(),
            input.len()
        );
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }
    }

    let mut headers = input.headers().clone();
    let website_idx = input.column(WEBSITE_COLUMN).unwrap_or_else(|| {
        headers.push_field(WEBSITE_COLUMN);
        headers.len() - 1
    });
    let status_idx = input.column(STATUS_COLUMN).unwrap_or_else(|| {
        headers.push_field(STATUS_COLUMN);
        headers.len() - 1
    });

    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;

    wtr.write_record(&headers)?;

    for (row, result) in input.rows().iter().zip(results) {
        let width = row.len().max(website_idx + 1).max(status_idx + 1);
        let mut fields: Vec<&str> = (0..width).map(|i| row.get(i).unwrap_or("")).collect();
        fields[website_idx] = result.website_url.as_deref().unwrap_or("");
        fields[status_idx] = result.status.as_str();
        wtr.write_record(&fields)?;
    }

    wtr.flush()?;
    info!("Wrote {} rows to {}", results.len(), output_path.display());
    Ok(())
}
