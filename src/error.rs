//! Error taxonomy for the per-entity resolution pipeline.
//!
//! Every variant here is caught inside the component that raised it and
//! downgraded to a [`crate::entity::LogoStatus`]. Only configuration and
//! input-table problems abort a run, and those live in [`crate::config`]
//! and [`crate::table`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("Browser session error: {0}")]
    Browser(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    pub fn transport(url: &str, message: impl std::fmt::Display) -> Self {
        ResolveError::Transport {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn parse(what: impl Into<String>, message: impl std::fmt::Display) -> Self {
        ResolveError::Parse {
            what: what.into(),
            message: message.to_string(),
        }
    }
}
