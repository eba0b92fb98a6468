//! Logo discovery on a school's home page
//!
//! Candidates are tried in order of reliability:
//! 1. `<img alt="logo">`
//! 2. `<img class="... logo ...">`
//! 3. the first `<img>` carrying a `src` attribute
//!
//! The chosen `src` is resolved against the page URL so callers always get an
//! absolute address back.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::error::ResolveError;
use crate::http::Fetcher;

/// Which heuristic picked the logo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoRule {
    AltText,
    ClassName,
    FirstImage,
}

impl std::fmt::Display for LogoRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogoRule::AltText => write!(f, "alt_text"),
            LogoRule::ClassName => write!(f, "class_name"),
            LogoRule::FirstImage => write!(f, "first_image"),
        }
    }
}

pub struct LogoExtractor<F: Fetcher> {
    fetcher: F,
}

impl<F: Fetcher> LogoExtractor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Find the absolute logo URL on `page_url`, or `None` on any failure
    pub async fn extract_logo(&self, page_url: &str) -> Option<String> {
        match self.try_extract_logo(page_url).await {
            Ok(Some(logo)) => Some(logo),
            Ok(None) => {
                debug!("No logo candidate on {}", page_url);
                None
            }
            Err(e) => {
                warn!("Error finding logo on {}: {}", page_url, e);
                None
            }
        }
    }

    async fn try_extract_logo(&self, page_url: &str) -> Result<Option<String>, ResolveError> {
        // Error pages are parsed too; only a failed connection or read is an error
        let page = self.fetcher.fetch(page_url).await?;
        if !page.is_success() {
            debug!("{} answered with status {}, parsing body anyway", page_url, page.status);
        }
        let html = page.text();

        let Some((src, rule)) = find_logo_src(&html) else {
            return Ok(None);
        };

        let resolved = resolve_logo_url(page_url, &src)?;
        debug!("Logo for {} found via {}: {}", page_url, rule, resolved);
        Ok(Some(resolved))
    }
}

/// Pick the logo `src` from raw HTML along with the rule that matched
pub fn find_logo_src(html: &str) -> Option<(String, LogoRule)> {
    let document = Html::parse_document(html);
    let images = Selector::parse("img").ok()?;

    let candidates: Vec<ElementRef> = document.select(&images).collect();

    let by_alt = candidates
        .iter()
        .find(|img| img.value().attr("alt") == Some("logo"));
    if let Some(src) = by_alt.and_then(|img| img.value().attr("src")) {
        return Some((src.to_string(), LogoRule::AltText));
    }

    let by_class = candidates
        .iter()
        .find(|img| img.value().classes().any(|c| c == "logo"));
    if let Some(src) = by_class.and_then(|img| img.value().attr("src")) {
        return Some((src.to_string(), LogoRule::ClassName));
    }

    candidates
        .iter()
        .find_map(|img| img.value().attr("src"))
        .map(|src| (src.to_string(), LogoRule::FirstImage))
}

/// Make `src` absolute. Sources that already carry a scheme are kept verbatim.
pub fn resolve_logo_url(page_url: &str, src: &str) -> Result<String, ResolveError> {
    let src = src.trim();
    if Url::parse(src).is_ok() {
        return Ok(src.to_string());
    }

    let base = Url::parse(page_url).map_err(|e| ResolveError::parse(format!("page URL {}", page_url), e))?;
    base.join(src)
        .map(|u| u.to_string())
        .map_err(|e| ResolveError::parse(format!("logo src {}", src), e))
}
