use async_trait::async_trait;
use sitelogofinder::error::ResolveError;
use sitelogofinder::resolver::PortalSession;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::fixtures::load_fixture;

/// Serves a canned results page per entity code; unknown codes time out.
///
/// `searched` and `closes` are shared handles so they stay readable after
/// the session has been moved into a resolver or batch driver.
pub struct ScriptedSession {
    pages: HashMap<String, String>,
    pub searched: Arc<Mutex<Vec<String>>>,
    pub closes: Arc<AtomicUsize>,
}

impl ScriptedSession {
    /// Pages loaded from `tests/fixtures/`, keyed by padded code
    pub fn new(pages: &[(&str, &str)]) -> Self {
        Self::with_html(
            pages
                .iter()
                .map(|(code, fixture)| (code.to_string(), load_fixture(fixture)))
                .collect(),
        )
    }

    pub fn with_html(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            searched: Arc::new(Mutex::new(Vec::new())),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn searched(&self) -> Vec<String> {
        self.searched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PortalSession for ScriptedSession {
    async fn search(&mut self, entity_code: &str) -> Result<String, ResolveError> {
        self.searched.lock().unwrap().push(entity_code.to_string());
        self.pages
            .get(entity_code)
            .cloned()
            .ok_or_else(|| ResolveError::ElementNotFound("#results not visible within 10s".to_string()))
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
