//! Headless Chrome session used by the portal lookup.
//!
//! One session is launched per batch and reused for every entity. The Chrome
//! process is shut down by [`BrowserSession::close`] or, failing that, when
//! the session is dropped, so every exit path releases it.
//!
//! headless_chrome is blocking; each lookup runs inside `spawn_blocking`.

use async_trait::async_trait;
use headless_chrome::util::Wait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::PortalConfig;
use crate::error::ResolveError;
use crate::resolver::PortalSession;

/// The browser connection is dropped by Chrome after this long without events
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(3600);

const CLEAR_INPUT_JS: &str = "function() { this.value = ''; }";

const IS_VISIBLE_JS: &str = "function() { \
    const style = window.getComputedStyle(this); \
    return style.display !== 'none' && style.visibility !== 'hidden' \
        && !!(this.offsetWidth || this.offsetHeight || this.getClientRects().length); \
}";

/// Everything a single blocking lookup needs, owned so it can cross threads
#[derive(Debug, Clone)]
struct LookupRequest {
    portal_url: String,
    search_input: String,
    results_selector: String,
    wait_timeout: Duration,
    code: String,
}

pub struct BrowserSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    portal_url: String,
    search_input: String,
    results_selector: String,
    wait_timeout: Duration,
}

/// True inside a container, where Chrome's sandbox is unavailable
fn is_container() -> bool {
    std::env::var("SITELOGOFINDER_CONTAINER").is_ok() || std::path::Path::new("/.dockerenv").exists()
}

impl BrowserSession {
    /// Launch Chrome and open the tab the whole batch will use
    pub fn launch(config: &PortalConfig) -> Result<Self, ResolveError> {
        let sandbox = config.sandbox && !is_container();

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(sandbox)
            .path(config.chrome_path())
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .build()
            .map_err(|e| ResolveError::Browser(format!("Failed to build Chrome launch options: {}", e)))?;

        let browser = Browser::new(options)
            .map_err(|e| ResolveError::Browser(format!("Failed to launch headless Chrome: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| ResolveError::Browser(format!("Failed to create browser tab: {}", e)))?;
        tab.set_default_timeout(config.wait_timeout());

        info!("Browser session started (sandbox: {})", sandbox);

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
            portal_url: config.url.clone(),
            search_input: id_selector(config.search_input_id.trim()),
            results_selector: config.results_selector.clone(),
            wait_timeout: config.wait_timeout(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.browser.is_some()
    }
}

/// Attribute form of `#id`: valid for ids starting with a digit or holding
/// CSS metacharacters
fn id_selector(id: &str) -> String {
    let escaped = id.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[id=\"{}\"]", escaped)
}

fn run_lookup(tab: &Tab, req: &LookupRequest) -> Result<String, ResolveError> {
    tab.navigate_to(&req.portal_url)
        .map_err(|e| ResolveError::Browser(format!("Failed to navigate to {}: {}", req.portal_url, e)))?;
    tab.wait_until_navigated()
        .map_err(|e| ResolveError::Browser(format!("Page failed to load for {}: {}", req.portal_url, e)))?;

    let input = tab
        .wait_for_element_with_custom_timeout(&req.search_input, req.wait_timeout)
        .map_err(|e| ResolveError::ElementNotFound(format!("search input {}: {}", req.search_input, e)))?;

    input
        .call_js_fn(CLEAR_INPUT_JS, vec![], false)
        .map_err(|e| ResolveError::Browser(format!("Failed to clear search input: {}", e)))?;
    input
        .type_into(&req.code)
        .map_err(|e| ResolveError::Browser(format!("Failed to type entity code: {}", e)))?;
    tab.press_key("Enter")
        .map_err(|e| ResolveError::Browser(format!("Failed to submit search: {}", e)))?;

    debug!("Submitted {} on portal, waiting for {}", req.code, req.results_selector);

    Wait::with_timeout(req.wait_timeout)
        .until(|| {
            let container = tab.find_element(&req.results_selector).ok()?;
            let visible = container
                .call_js_fn(IS_VISIBLE_JS, vec![], false)
                .ok()?
                .value?
                .as_bool()?;
            visible.then_some(())
        })
        .map_err(|_| {
            ResolveError::ElementNotFound(format!(
                "{} not visible within {}s",
                req.results_selector,
                req.wait_timeout.as_secs()
            ))
        })?;

    tab.get_content()
        .map_err(|e| ResolveError::Browser(format!("Failed to get page content: {}", e)))
}

#[async_trait]
impl PortalSession for BrowserSession {
    async fn search(&mut self, entity_code: &str) -> Result<String, ResolveError> {
        let tab = self
            .tab
            .clone()
            .ok_or_else(|| ResolveError::Browser("browser session already closed".to_string()))?;

        let request = LookupRequest {
            portal_url: self.portal_url.clone(),
            search_input: self.search_input.clone(),
            results_selector: self.results_selector.clone(),
            wait_timeout: self.wait_timeout,
            code: entity_code.to_string(),
        };

        tokio::task::spawn_blocking(move || run_lookup(&tab, &request))
            .await
            .map_err(|e| ResolveError::Browser(format!("Blocking task panicked: {}", e)))?
    }

    fn close(&mut self) {
        if let Some(tab) = self.tab.take() {
            let _ = tab.close(false);
        }
        if self.browser.take().is_some() {
            info!("Browser session closed");
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.close();
    }
}
