use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use indicatif::{ProgressBar, ProgressStyle};

use crate::entity::{LogoStatus, ResolutionResult};

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Silent = 0,   // Only the final summary
    Summary = 1,  // One line per entity (default)
    Detailed = 2, // Warnings and intermediate steps
    Debug = 3,    // Everything
}

impl VerbosityLevel {
    /// `quiet` wins over any `-v` count
    pub fn from_flags(quiet: bool, verbose_count: u8) -> Self {
        if quiet {
            return VerbosityLevel::Silent;
        }
        match verbose_count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }

    /// Default `tracing` filter directive for this verbosity
    pub fn tracing_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Silent => "error",
            VerbosityLevel::Summary => "warn",
            VerbosityLevel::Detailed => "info,sitelogofinder=info",
            VerbosityLevel::Debug => "info,sitelogofinder=debug",
        }
    }
}

#[derive(Clone)]
pub struct BatchLogger {
    verbosity: VerbosityLevel,
    progress_bar: Arc<Mutex<Option<ProgressBar>>>,
    log_buffer: Arc<Mutex<Vec<String>>>,
    log_file_path: Option<String>,
}

impl BatchLogger {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: Arc::new(Mutex::new(None)),
            log_buffer: Arc::new(Mutex::new(Vec::new())),
            log_file_path: None,
        }
    }

    pub fn with_log_file(verbosity: VerbosityLevel, log_file_path: String) -> Self {
        Self {
            log_file_path: Some(log_file_path),
            ..Self::new(verbosity)
        }
    }

    pub fn info(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Summary {
            self.print_message("INFO", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Detailed {
            self.print_message("WARN", message);
        }
    }

    pub fn error(&self, message: &str) {
        // Errors are shown at every verbosity
        self.print_message("ERROR", message);
    }

    pub fn debug(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Debug {
            self.print_message("DEBUG", message);
        }
    }

    fn print_message(&self, level: &str, message: &str) {
        let msg = format!("[{}] {}: {}", Self::timestamp(), level, message);

        if self.log_file_path.is_some() {
            if let Ok(mut buffer) = self.log_buffer.lock() {
                buffer.push(msg.clone());
            }
        }

        // Print above the progress bar when one is drawn; a hidden bar drops println
        if let Ok(guard) = self.progress_bar.lock() {
            if let Some(pb) = guard.as_ref().filter(|pb| !pb.is_hidden()) {
                pb.println(msg);
                return;
            }
        }

        eprintln!("{}", msg);
    }

    fn timestamp() -> String {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        let secs = now.as_secs();

        format!(
            "{:02}:{:02}:{:02}.{:03}",
            (secs / 3600) % 24,
            (secs % 3600) / 60,
            secs % 60,
            now.subsec_millis()
        )
    }

    pub fn start_progress(&self, total: u64) {
        if self.verbosity == VerbosityLevel::Silent {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        pb.set_message("Starting...");

        if let Ok(mut guard) = self.progress_bar.lock() {
            *guard = Some(pb);
        }
    }

    pub fn advance_progress(&self, message: &str) {
        if let Ok(guard) = self.progress_bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_message(message.to_string());
                pb.inc(1);
            }
        }
    }

    pub fn finish_progress(&self) {
        if let Ok(mut guard) = self.progress_bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    pub fn log_batch_start(&self, input: &str, count: usize) {
        self.info(&format!("Loaded {} schools from {}", count, input));
    }

    pub fn log_site_found(&self, name: &str, website: &str) {
        self.debug(&format!("Found website for {}: {}", name, website));
    }

    pub fn log_logo_found(&self, name: &str, logo_url: &str) {
        self.debug(&format!("Found logo for {}: {}", name, logo_url));
    }

    pub fn log_download_failed(&self, name: &str, logo_url: &str, error: &str) {
        self.warn(&format!("Error downloading image for {} from {}: {}", name, logo_url, error));
    }

    /// The one diagnostic line written for every entity
    pub fn log_outcome(&self, result: &ResolutionResult) {
        let name = &result.entity.display_name;
        let line = match (result.status, result.website_url.as_deref()) {
            (LogoStatus::NoWebsite, _) | (_, None) => format!("No website found for {}", name),
            (LogoStatus::NotFound, Some(site)) => format!("{}: website {}, no logo found", name, site),
            (LogoStatus::Found, Some(site)) => format!(
                "{}: website {}, logo saved from {}",
                name,
                site,
                result.logo_url.as_deref().unwrap_or("")
            ),
            (LogoStatus::AlreadyExists, Some(site)) => {
                format!("{}: website {}, logo already exists, skipped download", name, site)
            }
        };
        self.info(&line);
    }

    pub fn log_table_saved(&self, path: &str) {
        self.info(&format!("Updated table saved as {}", path));
    }

    /// Export all collected log lines to the configured file
    pub fn export_logs(&self) -> io::Result<()> {
        let Some(ref log_file_path) = self.log_file_path else {
            return Ok(());
        };

        if let Some(parent) = Path::new(log_file_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)?;

        if let Ok(buffer) = self.log_buffer.lock() {
            for entry in buffer.iter() {
                writeln!(file, "{}", entry)?;
            }
        }

        file.flush()
    }

    pub fn is_log_export_enabled(&self) -> bool {
        self.log_file_path.is_some()
    }

    pub fn get_log_count(&self) -> usize {
        self.log_buffer.lock().map(|b| b.len()).unwrap_or(0)
    }
}
