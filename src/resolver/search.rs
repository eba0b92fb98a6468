//! Query strategy: Google Custom Search restricted to one engine id.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::SiteResolver;
use crate::config::{ResolverStrategy, SearchConfig};
use crate::entity::Entity;
use crate::error::ResolveError;

/// Custom Search response (only the fields we read)
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

pub struct SearchResolver {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
    host_markers: Vec<String>,
}

impl SearchResolver {
    pub fn new(client: reqwest::Client, config: &SearchConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            engine_id: config.engine_id.clone(),
            host_markers: config.host_markers.clone(),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, ResolveError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
            ])
            .send()
            .await
            .map_err(|e| ResolveError::transport(&self.endpoint, e))?;

        if !response.status().is_success() {
            return Err(ResolveError::transport(
                &self.endpoint,
                format!("non-success status {}", response.status()),
            ));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::parse("search response", e))?;

        Ok(body.items.into_iter().map(|item| item.link).collect())
    }
}

/// First link whose host contains one of `markers`
pub fn first_school_link<'a, I>(links: I, markers: &[String]) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    links.into_iter().find_map(|link| {
        let host = Url::parse(link).ok()?.host_str()?.to_lowercase();
        markers
            .iter()
            .any(|m| host.contains(m.as_str()))
            .then(|| link.to_string())
    })
}

#[async_trait]
impl SiteResolver for SearchResolver {
    fn strategy(&self) -> ResolverStrategy {
        ResolverStrategy::Query
    }

    async fn resolve_site(&mut self, entity: &Entity) -> Option<String> {
        let Some(query) = entity.search_query() else {
            debug!("No search query for {:?}, skipping lookup", entity.display_name);
            return None;
        };

        match self.search(&query).await {
            Ok(links) => {
                debug!("{} search results for {:?}", links.len(), query);
                first_school_link(links.iter().map(String::as_str), &self.host_markers)
            }
            Err(e) => {
                warn!("Error searching for {}: {}", entity.display_name, e);
                None
            }
        }
    }
}
