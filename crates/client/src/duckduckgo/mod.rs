//! DuckDuckGo HTML-scrape search provider.
//!
//! Scrapes the HTML results page behind the shared cache and rate-limit
//! layer:
//!
//! - fixed-window rate gate, read-through cache, validation before network
//! - randomized browser User-Agent per attempt, bounded retry with backoff
//! - layout-fallback parsing ([`parse`]) and redirect decoding ([`redirect`])
//! - detailed mode enriches each result with page content fetched
//!   concurrently through a reader service, best-effort under a global
//!   time budget

pub mod parse;
pub mod redirect;

use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use reqwest::header;

use crate::http;
use crate::result::{SearchMode, SearchResult};
use fathom_core::{CacheStore, Error, RateLimiter};

use parse::ParsedResult;

/// Maximum number of results a caller may request.
pub const MAX_RESULTS: usize = 7;

/// Rate-limit key shared by every request against this backend.
const RATE_LIMIT_KEY: &str = "rl:duckduckgo";

/// TTL for cached non-empty result lists.
const RESULT_TTL_SECS: i64 = 300;

/// TTL for cached empty result lists; short so a transient empty page
/// doesn't suppress results for long.
const EMPTY_RESULT_TTL_SECS: i64 = 30;

/// Retries after the first attempt parses zero results or fails to fetch.
const MAX_SEARCH_RETRIES: u32 = 1;

/// Backoff unit between attempts, multiplied by the attempt index.
const RETRY_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Per-item enrichment fetch timeout.
const ENRICH_TIMEOUT_PER_RESULT: Duration = Duration::from_secs(8);

/// Ceiling on the whole enrichment phase.
const MAX_ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(15);

/// Enrichment content is truncated to this many characters.
const MAX_DESCRIPTION_CHARS: usize = 4000;

/// DuckDuckGo provider configuration.
#[derive(Debug, Clone)]
pub struct DuckDuckGoConfig {
    /// Backend origin (overridable for tests).
    pub base_url: String,
    /// Reader service used for detailed-mode enrichment.
    pub reader_base_url: String,
    /// Results-page request timeout.
    pub timeout: Duration,
    /// Pinned User-Agent; None rotates through the browser pool.
    pub user_agent: Option<String>,
    /// Requests allowed per rate window.
    pub rate_limit: u32,
    /// Rate window length in seconds.
    pub rate_window_secs: i64,
}

impl Default for DuckDuckGoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://duckduckgo.com".to_string(),
            reader_base_url: "https://r.jina.ai".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: None,
            rate_limit: 20,
            rate_window_secs: 60,
        }
    }
}

/// DuckDuckGo HTML-scrape client.
#[derive(Clone, Debug)]
pub struct DuckDuckGoClient {
    http: reqwest::Client,
    config: DuckDuckGoConfig,
    cache: CacheStore,
    limiter: RateLimiter,
}

impl DuckDuckGoClient {
    /// Create a client over the given cache and rate limiter.
    pub fn new(config: DuckDuckGoConfig, cache: CacheStore, limiter: RateLimiter) -> Result<Self, Error> {
        let http = http::build_client(config.timeout)?;
        Ok(Self { http, config, cache, limiter })
    }

    /// Search the backend, returning up to `num_results` ordered results.
    ///
    /// Short mode returns title/url/snippet only; detailed mode additionally
    /// fills each result's `description` with page content, best-effort. An
    /// empty list is a valid outcome, not an error.
    pub async fn search(&self, query: &str, num_results: usize, mode: SearchMode) -> Result<Vec<SearchResult>, Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("query cannot be empty".into()));
        }
        if num_results < 1 || num_results > MAX_RESULTS {
            return Err(Error::InvalidInput(format!("num_results must be between 1 and {MAX_RESULTS}")));
        }

        if !self
            .limiter
            .allow(RATE_LIMIT_KEY, self.config.rate_limit, self.config.rate_window_secs)
            .await
        {
            return Err(Error::RateLimited("duckduckgo: too many requests, please wait a moment".into()));
        }

        let cache_key = format!("{query}:{mode}:{num_results}");
        if let Some(cached) = self.cache.get(&cache_key).await {
            match serde_json::from_str::<Vec<SearchResult>>(&cached) {
                Ok(results) => {
                    tracing::debug!(query, %mode, "search cache hit");
                    return Ok(results);
                }
                Err(e) => tracing::warn!(key = %cache_key, error = %e, "discarding undecodable cache entry"),
            }
        }

        let parsed = self.fetch_with_retry(query).await?;

        if parsed.is_empty() {
            tracing::warn!(query, "no results found after all attempts");
            self.cache.set(&cache_key, "[]", EMPTY_RESULT_TTL_SECS).await;
            return Ok(Vec::new());
        }

        let mut results: Vec<SearchResult> = parsed
            .iter()
            .map(|item| SearchResult {
                title: item.title.clone(),
                url: item.url.clone(),
                snippet: item.snippet.clone(),
                display_url: item.display_url.clone(),
                favicon: item.favicon.clone(),
                description: String::new(),
            })
            .collect();

        if mode == SearchMode::Detailed {
            self.enrich(&parsed, &mut results).await;
        }

        results.truncate(num_results);
        if let Ok(payload) = serde_json::to_string(&results) {
            self.cache.set(&cache_key, &payload, RESULT_TTL_SECS).await;
        }

        tracing::debug!(query, %mode, count = results.len(), "search completed");
        Ok(results)
    }

    /// Fetch and parse the results page, retrying on empty parses and fetch
    /// failures with an increasing backoff and a fresh User-Agent.
    ///
    /// A network error only surfaces if no attempt reached the backend at
    /// all; an empty parse after a successful fetch is returned as empty.
    async fn fetch_with_retry(&self, query: &str) -> Result<Vec<ParsedResult>, Error> {
        let mut fetched_any = false;
        let mut last_err = None;

        for attempt in 0..=MAX_SEARCH_RETRIES {
            if attempt > 0 {
                tracing::debug!(attempt, query, "retrying search");
                tokio::time::sleep(RETRY_BACKOFF_UNIT * attempt).await;
            }

            match self.fetch_results_page(query).await {
                Ok(html) => {
                    fetched_any = true;
                    let parsed = parse::parse_results(&html, &self.config.reader_base_url)?;
                    if !parsed.is_empty() {
                        return Ok(parsed);
                    }
                    tracing::warn!(attempt, query, bytes = html.len(), "results page parsed to zero results");
                }
                Err(e) => {
                    tracing::warn!(attempt, query, error = %e, "results page fetch failed");
                    last_err = Some(e);
                }
            }
        }

        match (fetched_any, last_err) {
            (false, Some(err)) => Err(err),
            _ => Ok(Vec::new()),
        }
    }

    async fn fetch_results_page(&self, query: &str) -> Result<String, Error> {
        let response = self
            .http
            .get(format!("{}/html/", self.config.base_url))
            .query(&[("q", query)])
            .header(header::USER_AGENT, self.attempt_user_agent())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.8")
            .header(header::REFERER, format!("{}/", self.config.base_url))
            .header("DNT", "1")
            .header("Upgrade-Insecure-Requests", "1")
            .header(header::CACHE_CONTROL, "max-age=0")
            .send()
            .await
            .map_err(|e| http::map_reqwest_error("duckduckgo", e))?;

        let status = response.status();
        if status == reqwest::StatusCode::ACCEPTED {
            // The backend answers 202 when results are delayed; the page is
            // still parseable.
            tracing::debug!(query, "backend returned 202, page may be partial");
        } else if !status.is_success() {
            return Err(Error::Network(format!("duckduckgo: results page returned HTTP {status}")));
        }

        response.text().await.map_err(|e| http::map_reqwest_error("duckduckgo", e))
    }

    /// Fill `description` for each result from its reader URL, racing all
    /// fetches against a global budget. Individual failures are logged and
    /// leave that result's description empty; partial enrichment is
    /// returned as-is when the budget elapses.
    async fn enrich(&self, parsed: &[ParsedResult], results: &mut [SearchResult]) {
        let budget = MAX_ENRICHMENT_TIMEOUT.min(ENRICH_TIMEOUT_PER_RESULT * results.len() as u32);
        tracing::debug!(count = results.len(), budget_ms = budget.as_millis() as u64, "enriching results");

        let mut fetches: FuturesUnordered<_> = parsed
            .iter()
            .enumerate()
            .map(|(index, item)| async move { (index, self.fetch_page_content(&item.reader_url).await) })
            .collect();

        let deadline = tokio::time::sleep(budget);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    tracing::warn!("enrichment budget elapsed, returning partial content");
                    break;
                }
                next = fetches.next() => match next {
                    Some((index, Ok(content))) => results[index].description = content,
                    Some((index, Err(e))) => {
                        tracing::warn!(url = %parsed[index].url, error = %e, "enrichment fetch failed");
                    }
                    None => break,
                }
            }
        }
    }

    async fn fetch_page_content(&self, reader_url: &str) -> Result<String, Error> {
        let response = self
            .http
            .get(reader_url)
            .timeout(ENRICH_TIMEOUT_PER_RESULT)
            .header(header::USER_AGENT, self.attempt_user_agent())
            .send()
            .await
            .map_err(|e| http::map_reqwest_error("duckduckgo", e))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!("duckduckgo: reader returned HTTP {}", response.status())));
        }

        let text = response.text().await.map_err(|e| http::map_reqwest_error("duckduckgo", e))?;
        Ok(text.chars().take(MAX_DESCRIPTION_CHARS).collect())
    }

    fn attempt_user_agent(&self) -> String {
        self.config
            .user_agent
            .clone()
            .unwrap_or_else(|| http::random_user_agent().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duckduckgo::parse::tests::RESULTS_PAGE;
    use fathom_core::StoreDb;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, cache: CacheStore) -> DuckDuckGoClient {
        let config = DuckDuckGoConfig {
            base_url: server.uri(),
            reader_base_url: server.uri(),
            ..Default::default()
        };
        DuckDuckGoClient::new(config, cache, RateLimiter::disabled()).unwrap()
    }

    #[tokio::test]
    async fn test_validation_rejects_before_network() {
        let server = MockServer::start().await;
        let client = client_for(&server, CacheStore::disabled());

        let err = client.search("", 3, SearchMode::Short).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = client.search("rust", 0, SearchMode::Short).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = client.search("rust", MAX_RESULTS + 1, SearchMode::Short).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_denial_makes_no_network_call() {
        let server = MockServer::start().await;
        let db = StoreDb::open_in_memory().await.unwrap();
        let limiter = RateLimiter::new(Some(db));
        let config = DuckDuckGoConfig { base_url: server.uri(), rate_limit: 1, ..Default::default() };
        let client = DuckDuckGoClient::new(config, CacheStore::disabled(), limiter).unwrap();

        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        client.search("rust", 3, SearchMode::Short).await.unwrap();
        let err = client.search("rust async", 3, SearchMode::Short).await.unwrap_err();
        assert!(matches!(err, Error::RateLimited(_)));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_identical_search_is_a_cache_hit() {
        let server = MockServer::start().await;
        let db = StoreDb::open_in_memory().await.unwrap();
        let client = client_for(&server, CacheStore::new(Some(db.clone())));

        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "rust async"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let first = client.search("rust async", 3, SearchMode::Short).await.unwrap();
        let second = client.search("rust async", 3, SearchMode::Short).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);

        let ttl = db.kv_ttl("rust async:short:3").await.unwrap().unwrap();
        assert!(ttl > EMPTY_RESULT_TTL_SECS && ttl <= RESULT_TTL_SECS, "ttl was {ttl}");
    }

    #[tokio::test]
    async fn test_short_mode_truncates_and_leaves_descriptions_empty() {
        let server = MockServer::start().await;
        let client = client_for(&server, CacheStore::disabled());

        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        let results = client.search("rust", 2, SearchMode::Short).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.description.is_empty()));
        assert_eq!(results[0].url, "https://www.rust-lang.org/");
    }

    #[tokio::test]
    async fn test_empty_results_cached_with_short_ttl() {
        let server = MockServer::start().await;
        let db = StoreDb::open_in_memory().await.unwrap();
        let cache = CacheStore::new(Some(db.clone()));
        let client = client_for(&server, cache.clone());

        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>bot check</body></html>"))
            .mount(&server)
            .await;

        let results = client.search("rust", 3, SearchMode::Short).await.unwrap();
        assert!(results.is_empty());
        // both attempts consumed before the empty outcome was cached
        assert_eq!(server.received_requests().await.unwrap().len(), 1 + MAX_SEARCH_RETRIES as usize);
        assert_eq!(cache.get("rust:short:3").await.as_deref(), Some("[]"));

        // short TTL, not the standard one
        let ttl = db.kv_ttl("rust:short:3").await.unwrap().unwrap();
        assert!(ttl > 0 && ttl <= EMPTY_RESULT_TTL_SECS, "ttl was {ttl}");
    }

    #[tokio::test]
    async fn test_retry_recovers_after_empty_first_attempt() {
        let server = MockServer::start().await;
        let client = client_for(&server, CacheStore::disabled());

        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        let results = client.search("rust", 3, SearchMode::Short).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_detailed_mode_swallows_individual_enrichment_failures() {
        let server = MockServer::start().await;
        let client = client_for(&server, CacheStore::disabled());

        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;
        // reader URLs are "{reader_base}/{destination}"; the second result's
        // fetch fails, the other two succeed
        Mock::given(method("GET"))
            .and(path("/https://doc.rust-lang.org/book/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/https://www.rust-lang.org/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("rust-lang content"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/https://en.wikipedia.org/wiki/Rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string("wikipedia content"))
            .mount(&server)
            .await;

        let results = client.search("rust", 3, SearchMode::Detailed).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].description, "rust-lang content");
        assert!(results[1].description.is_empty());
        assert_eq!(results[2].description, "wikipedia content");
    }

    #[tokio::test]
    async fn test_unreachable_backend_surfaces_network_error() {
        // nothing listens on this port
        let config = DuckDuckGoConfig { base_url: "http://127.0.0.1:9".to_string(), ..Default::default() };
        let client = DuckDuckGoClient::new(config, CacheStore::disabled(), RateLimiter::disabled()).unwrap();

        let err = client.search("rust", 3, SearchMode::Short).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionRefused(_) | Error::Network(_)));
        assert!(err.to_string().contains("duckduckgo"));
    }
}
