//! On-disk logo storage: deterministic filenames and PNG re-encoding.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ResolveError;

static NON_WORD_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}_]+").unwrap());

/// Filename stem for a display name.
///
/// Whitespace runs become `_`, the result is lowercased, and any other run of
/// non-alphanumeric characters becomes a single `-`.
pub fn slugify(display_name: &str) -> String {
    let joined = display_name.split_whitespace().collect::<Vec<_>>().join("_");
    let lowered = joined.to_lowercase();
    NON_WORD_RUN.replace_all(&lowered, "-").into_owned()
}

/// Logo filename (`<slug>.png`) for a display name
pub fn logo_filename(display_name: &str) -> String {
    format!("{}.png", slugify(display_name))
}

/// Directory of downloaded logos
#[derive(Debug, Clone)]
pub struct LogoStore {
    dir: PathBuf,
    overwrite: bool,
}

impl LogoStore {
    pub fn new(dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            dir: dir.into(),
            overwrite,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Create the logo directory if it does not exist yet
    pub fn prepare(&self) -> Result<(), ResolveError> {
        fs::create_dir_all(&self.dir)?;
        debug!("Logo directory ready: {}", self.dir.display());
        Ok(())
    }

    pub fn path_for(&self, display_name: &str) -> PathBuf {
        self.dir.join(logo_filename(display_name))
    }

    /// True when an existing file should be kept instead of re-downloaded
    pub fn should_skip(&self, display_name: &str) -> bool {
        !self.overwrite && self.path_for(display_name).exists()
    }

    /// Decode `bytes` in whatever format they arrived and write them as PNG
    pub fn persist(&self, display_name: &str, bytes: &[u8]) -> Result<PathBuf, ResolveError> {
        let path = self.path_for(display_name);
        let image = image::load_from_memory(bytes)?;
        image.save_with_format(&path, image::ImageFormat::Png)?;
        debug!("Saved logo {} ({}x{})", path.display(), image.width(), image.height());
        Ok(path)
    }
}
