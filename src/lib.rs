//! sitelogofinder: resolve school websites and collect their logos.
//!
//! A batch reads a CSV of schools, finds each school's website with one of
//! two strategies (search API query or directory portal lookup), pulls the
//! logo image off the home page, saves it as PNG and writes the table back
//! out with `Website` and `Logo Status` columns.

pub mod batch;
pub mod browser;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod http;
pub mod logger;
pub mod logo;
pub mod logo_store;
pub mod resolver;
pub mod table;

pub use batch::{BatchDriver, BatchSummary};
pub use config::{AppConfig, ResolverStrategy};
pub use entity::{Entity, EntityKey, LogoStatus, ResolutionResult};
pub use error::ResolveError;
pub use resolver::SiteResolver;
