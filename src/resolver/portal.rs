//! Portal strategy: look a school up by entity code on a directory portal.
//!
//! The browser work (navigate, type the code, wait for results) is behind
//! [`PortalSession`]. Once the results are rendered, the website link is
//! pulled out of the HTML snapshot with a fixed cascade:
//!
//! 1. an absolute positional path to the link anchor
//! 2. the anchor nested in the second result row
//! 3. when there are no rows at all, the first anchor in the results container
//!
//! The portal's markup is not documented anywhere, so the cascade goes from
//! most to least specific. A hit on rule 2 or 3 means rule 1 missed, which is
//! logged as a sign that the portal layout has drifted.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::SiteResolver;
use crate::config::{ConfigError, PortalConfig, ResolverStrategy};
use crate::entity::Entity;
use crate::error::ResolveError;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// A browser session that can run one code lookup at a time
#[async_trait]
pub trait PortalSession: Send {
    /// Submit `entity_code` on the portal and return the rendered page HTML
    /// once the results container is visible.
    async fn search(&mut self, entity_code: &str) -> Result<String, ResolveError>;

    /// Shut the session down. Calling it again is a no-op.
    fn close(&mut self);
}

/// Which cascade rule produced a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeRule {
    PrimaryPath,
    SecondRow,
    AnyAnchor,
}

impl std::fmt::Display for CascadeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CascadeRule::PrimaryPath => write!(f, "primary path"),
            CascadeRule::SecondRow => write!(f, "second result row"),
            CascadeRule::AnyAnchor => write!(f, "first anchor in results"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLink {
    pub href: String,
    pub rule: CascadeRule,
}

/// Compiled selectors for the results page
#[derive(Debug, Clone)]
pub struct PortalSelectors {
    pub results: Selector,
    pub primary_link: Selector,
    pub row: Selector,
    pub nested: Selector,
}

impl PortalSelectors {
    pub fn new(results: &str, primary_link: &str, row: &str, nested: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            results: compile("portal.results_selector", results)?,
            primary_link: compile("portal.primary_link_path", primary_link)?,
            row: compile("portal.row_selector", row)?,
            nested: compile("portal.nested_selector", nested)?,
        })
    }

    pub fn from_config(config: &PortalConfig) -> Result<Self, ConfigError> {
        Self::new(
            &config.results_selector,
            &config.primary_link_path,
            &config.row_selector,
            &config.nested_selector,
        )
    }
}

fn compile(field: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
    })
}

fn href_of(anchor: ElementRef<'_>) -> Option<String> {
    anchor
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// Run the extraction cascade over a rendered results page
pub fn extract_site_link(html: &str, selectors: &PortalSelectors) -> Result<SiteLink, ResolveError> {
    let document = Html::parse_document(html);

    if let Some(href) = document.select(&selectors.primary_link).next().and_then(href_of) {
        return Ok(SiteLink {
            href,
            rule: CascadeRule::PrimaryPath,
        });
    }

    let container = document
        .select(&selectors.results)
        .next()
        .ok_or_else(|| ResolveError::ElementNotFound("results container".to_string()))?;

    let rows: Vec<ElementRef> = container.select(&selectors.row).collect();

    if rows.is_empty() {
        return container
            .select(&ANCHOR)
            .find_map(href_of)
            .map(|href| SiteLink {
                href,
                rule: CascadeRule::AnyAnchor,
            })
            .ok_or_else(|| ResolveError::ElementNotFound("anchor in results container".to_string()));
    }

    if rows.len() < 2 {
        return Err(ResolveError::ElementNotFound(format!(
            "second result row (found {})",
            rows.len()
        )));
    }

    let nested = rows[1]
        .select(&selectors.nested)
        .next()
        .ok_or_else(|| ResolveError::ElementNotFound("nested marker in second row".to_string()))?;

    let first_child = nested
        .children()
        .find_map(ElementRef::wrap)
        .ok_or_else(|| ResolveError::ElementNotFound("first child of nested marker".to_string()))?;

    let anchor = if first_child.value().name() == "a" {
        Some(first_child)
    } else {
        first_child.select(&ANCHOR).next()
    };

    anchor
        .and_then(href_of)
        .map(|href| SiteLink {
            href,
            rule: CascadeRule::SecondRow,
        })
        .ok_or_else(|| ResolveError::ElementNotFound("anchor in second row".to_string()))
}

pub struct PortalResolver<S: PortalSession> {
    session: S,
    selectors: PortalSelectors,
}

impl<S: PortalSession> PortalResolver<S> {
    pub fn new(session: S, selectors: PortalSelectors) -> Self {
        Self { session, selectors }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    async fn lookup(&mut self, code: &str) -> Result<SiteLink, ResolveError> {
        let html = self.session.search(code).await?;
        extract_site_link(&html, &self.selectors)
    }
}

#[async_trait]
impl<S: PortalSession> SiteResolver for PortalResolver<S> {
    fn strategy(&self) -> ResolverStrategy {
        ResolverStrategy::Portal
    }

    async fn resolve_site(&mut self, entity: &Entity) -> Option<String> {
        let Some(code) = entity.entity_code() else {
            debug!("No entity code for {:?}, skipping portal lookup", entity.display_name);
            return None;
        };

        match self.lookup(code).await {
            Ok(link) => {
                if link.rule != CascadeRule::PrimaryPath {
                    warn!(
                        "Primary link path missed for {} ({}); used {} instead. Portal markup may have changed.",
                        entity.display_name, code, link.rule
                    );
                }
                Some(link.href)
            }
            Err(e) => {
                warn!("Portal lookup failed for {} ({}): {}", entity.display_name, code, e);
                None
            }
        }
    }

    fn close(&mut self) {
        self.session.close();
    }
}
