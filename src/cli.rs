use clap::Parser;
use std::path::PathBuf;

use crate::config::{OutputConfig, ResolverStrategy};
use crate::logger::VerbosityLevel;

#[derive(Parser, Debug)]
#[command(name = "sitelogofinder")]
#[command(about = "Find school websites and download their logos from a CSV of schools")]
#[command(version)]
pub struct Cli {
    /// Create default configuration file at ./config/sitelogofinder.toml
    #[arg(long)]
    pub init: bool,

    /// Input CSV with a "School Name" column plus "Address" (query) or "Entity Code" (portal)
    #[arg(short, long, value_name = "CSV")]
    pub input_file: Option<PathBuf>,

    /// How to find each school's website
    #[arg(short, long, value_enum, default_value_t = ResolverStrategy::Query)]
    pub strategy: ResolverStrategy,

    /// Output CSV path (defaults to output.base_dir/output.table_name from config)
    #[arg(short, long, value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Directory logos are written to (defaults to output.base_dir/output.logo_dir from config)
    #[arg(long, value_name = "DIR")]
    pub logo_dir: Option<PathBuf>,

    /// Re-download logos that already exist on disk
    #[arg(long)]
    pub overwrite: bool,

    /// Path to the configuration file
    #[arg(short, long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Verbose logging (use -v for warnings and steps, -vv for DEBUG)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors and the final summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write all log lines to this file when the run ends
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<String>,
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if self.init {
            return Ok(());
        }

        match &self.input_file {
            None => return Err("Input file is required (use --input-file, or --init to create a config)".to_string()),
            Some(p) if p.as_os_str().is_empty() => return Err("Input file cannot be empty".to_string()),
            _ => {}
        }

        if let (Some(output), Some(input)) = (&self.output, &self.input_file) {
            if output == input {
                return Err("Output file must differ from the input file".to_string());
            }
        }

        Ok(())
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        VerbosityLevel::from_flags(self.quiet, self.verbose)
    }

    pub fn output_path(&self, output: &OutputConfig) -> PathBuf {
        self.output.clone().unwrap_or_else(|| output.table_path())
    }

    pub fn logo_path(&self, output: &OutputConfig) -> PathBuf {
        self.logo_dir.clone().unwrap_or_else(|| output.logo_path())
    }

    /// The flag wins over the config file; either one turns overwriting on
    pub fn overwrite_existing(&self, output: &OutputConfig) -> bool {
        self.overwrite || output.overwrite_existing
    }
}
