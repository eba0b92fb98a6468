use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitelogofinder::config::SearchConfig;

pub const SEARCH_PATH: &str = "/customsearch/v1";
pub const TEST_API_KEY: &str = "test-key";
pub const TEST_ENGINE_ID: &str = "test-cx";

/// Search settings pointing at `server`.
///
/// The mock server's host is 127.0.0.1, so it is added as a host marker to
/// let links back to the same server qualify.
pub fn search_config(server: &MockServer) -> SearchConfig {
    SearchConfig {
        endpoint: format!("{}{}", server.uri(), SEARCH_PATH),
        api_key: TEST_API_KEY.to_string(),
        engine_id: TEST_ENGINE_ID.to_string(),
        host_markers: vec!["edu".to_string(), "k12".to_string(), "127.0.0.1".to_string()],
    }
}

/// Mounts a search API response listing `links` for query `q`.
pub async fn mount_search_results(server: &MockServer, q: &str, links: &[&str]) {
    let items: Vec<serde_json::Value> = links
        .iter()
        .map(|link| serde_json::json!({ "title": "result", "link": link }))
        .collect();

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("key", TEST_API_KEY))
        .and(query_param("cx", TEST_ENGINE_ID))
        .and(query_param("q", q))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "customsearch#search",
            "items": items,
        })))
        .mount(server)
        .await;
}

/// Serves `html` at `url_path`.
pub async fn mount_page(server: &MockServer, url_path: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html.to_string())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Serves `html` at `url_path` with a non-default status code.
pub async fn mount_page_with_status(server: &MockServer, url_path: &str, status: u16, html: &str) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(html.to_string())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Serves image `bytes` at `url_path`, optionally asserting the hit count
/// when the server is dropped.
pub async fn mount_image(server: &MockServer, url_path: &str, bytes: Vec<u8>, content_type: &str, expected_hits: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(bytes)
                .insert_header("content-type", content_type),
        );
    let mock = match expected_hits {
        Some(n) => mock.expect(n),
        None => mock,
    };
    mock.mount(server).await;
}

/// Responds to `url_path` with `status` and an empty body.
pub async fn mount_status(server: &MockServer, url_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
