use crate::api::cache::ResponseCache;
use crate::api::client::GitHubClient;
use crate::error::FetchError;
use serde_json::Value;
use std::time::Duration;

/// Source of raw JSON for API endpoints; `None` means no data is available.
#[allow(async_fn_in_trait)]
pub trait EndpointFetcher {
    async fn fetch(&self, endpoint: &str) -> Option<Value>;
}

/// Retry budget and backoff scale
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retries: u32,
    /// Length of one backoff step (one second in production)
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    /// Total number of attempts per fetch
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Wait before the attempt following the failed `attempt` (0-based)
    pub fn delay_for(&self, error: &FetchError, attempt: u32) -> Duration {
        let steps = match error {
            FetchError::Status(_) => 2u32.saturating_pow(attempt),
            FetchError::Timeout => 3 * (attempt + 1),
            _ => 3,
        };
        self.backoff_unit * steps
    }
}

/// Fetches endpoints through the response cache, retrying transient failures
pub struct CachedFetcher {
    client: GitHubClient,
    cache: Option<ResponseCache>,
    policy: RetryPolicy,
}

impl CachedFetcher {
    pub fn new(client: GitHubClient, cache: Option<ResponseCache>, policy: RetryPolicy) -> Self {
        Self {
            client,
            cache,
            policy,
        }
    }

    /// Fetch an endpoint; every failure resolves to `None`
    pub async fn fetch(&self, endpoint: &str) -> Option<Value> {
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(endpoint)) {
            tracing::info!("Loaded from cache: {}", endpoint);
            return Some(cached);
        }

        let value = self.fetch_with_retry(endpoint).await?;
        if value.is_null() {
            tracing::warn!("Empty (null) response from {}", endpoint);
            return None;
        }
        self.store(endpoint, &value);
        Some(value)
    }

    async fn fetch_with_retry(&self, endpoint: &str) -> Option<Value> {
        let attempts = self.policy.attempts();

        for attempt in 0..attempts {
            let error = match self.client.get_json(endpoint).await {
                Ok(value) => return Some(value),
                Err(e) => e,
            };

            match &error {
                FetchError::Forbidden { rate_limited: true } => {
                    tracing::warn!("API rate limit exhausted (HTTP 403): {}", endpoint);
                }
                FetchError::Forbidden { rate_limited: false } => {
                    tracing::warn!("API limit or insufficient token permission (HTTP 403): {}", endpoint);
                }
                FetchError::NotFound => {
                    tracing::warn!("Not found (HTTP 404): {}", endpoint);
                }
                FetchError::MalformedBody(reason) => {
                    tracing::warn!("Failed to parse response from {}: {}", endpoint, reason);
                }
                other => {
                    tracing::warn!(
                        "Request failed (attempt {}/{}) {}: {}",
                        attempt + 1,
                        attempts,
                        endpoint,
                        other
                    );
                }
            }

            if !error.is_retryable() {
                return None;
            }

            if attempt + 1 < attempts {
                let delay = self.policy.delay_for(&error, attempt);
                tracing::info!("Waiting {:?} before retrying {}", delay, endpoint);
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!("Giving up on {} after {} attempts", endpoint, attempts);
        None
    }

    fn store(&self, endpoint: &str, value: &Value) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(endpoint, value) {
                tracing::warn!("Cache write failed for {} (continuing): {}", endpoint, e);
            }
        }
    }
}

impl EndpointFetcher for CachedFetcher {
    async fn fetch(&self, endpoint: &str) -> Option<Value> {
        CachedFetcher::fetch(self, endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "ghp_test_token_0123456789";

    fn fast_policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            backoff_unit: Duration::from_millis(1),
        }
    }

    fn fetcher(server: &MockServer, cache_dir: Option<&TempDir>, retries: u32) -> CachedFetcher {
        let client = GitHubClient::with_base_url(
            &server.uri(),
            TOKEN.to_string(),
            Duration::from_millis(200),
        )
        .unwrap();
        let cache = cache_dir.map(|d| ResponseCache::new(d.path()));
        CachedFetcher::new(client, cache, fast_policy(retries))
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 3);

        let status = FetchError::Status(500);
        assert_eq!(policy.delay_for(&status, 0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(&status, 1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(&status, 2), Duration::from_secs(4));

        assert_eq!(policy.delay_for(&FetchError::Timeout, 0), Duration::from_secs(3));
        assert_eq!(policy.delay_for(&FetchError::Timeout, 1), Duration::from_secs(6));

        let transport = FetchError::Transport("refused".into());
        assert_eq!(policy.delay_for(&transport, 0), Duration::from_secs(3));
        assert_eq!(policy.delay_for(&transport, 1), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_fetch_populates_cache_and_reuses_it() {
        let server = MockServer::start().await;
        let body = json!({"name": "hello", "stargazers_count": 7});
        Mock::given(method("GET"))
            .and(path("/repos/o/hello"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let cache_dir = TempDir::new().unwrap();
        let fetcher = fetcher(&server, Some(&cache_dir), 2);

        let first = fetcher.fetch("/repos/o/hello").await;
        let second = fetcher.fetch("/repos/o/hello").await;
        assert_eq!(first, Some(body));
        assert_eq!(first, second);
        assert!(cache_dir.path().join("cache__repos_o_hello.json").exists());
    }

    #[tokio::test]
    async fn test_invalid_cache_entries_trigger_fetch() {
        for contents in ["null", "{}", "not json at all"] {
            let server = MockServer::start().await;
            Mock::given(path("/repos/o/r"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
                .expect(1)
                .mount(&server)
                .await;

            let cache_dir = TempDir::new().unwrap();
            fs::write(cache_dir.path().join("cache__repos_o_r.json"), contents).unwrap();

            let fetcher = fetcher(&server, Some(&cache_dir), 0);
            assert_eq!(fetcher.fetch("/repos/o/r").await, Some(json!({"id": 1})));
        }
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_gives_up() {
        let server = MockServer::start().await;
        Mock::given(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = fetcher(&server, None, 2);
        assert_eq!(fetcher.fetch("/flaky").await, None);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_error() {
        let server = MockServer::start().await;
        Mock::given(path("/recover"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/recover"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(&server, None, 2);
        assert_eq!(fetcher.fetch("/recover").await, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_forbidden_and_not_found_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(path("/forbidden"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(&server, None, 2);
        assert_eq!(fetcher.fetch("/forbidden").await, None);
        assert_eq!(fetcher.fetch("/missing").await, None);
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{{{"))
            .expect(1)
            .mount(&server)
            .await;

        let cache_dir = TempDir::new().unwrap();
        let fetcher = fetcher(&server, Some(&cache_dir), 2);
        assert_eq!(fetcher.fetch("/garbage").await, None);
        let cache = ResponseCache::new(cache_dir.path());
        assert_eq!(cache.stats().unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_timeouts_are_retried() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true}))
                    .set_delay(Duration::from_secs(2)),
            )
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = fetcher(&server, None, 1);
        assert_eq!(fetcher.fetch("/slow").await, None);
    }

    #[tokio::test]
    async fn test_null_body_is_absent_and_not_cached() {
        let server = MockServer::start().await;
        Mock::given(path("/null"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .expect(2)
            .mount(&server)
            .await;

        let cache_dir = TempDir::new().unwrap();
        let fetcher = fetcher(&server, Some(&cache_dir), 0);
        assert_eq!(fetcher.fetch("/null").await, None);
        assert!(!cache_dir.path().join("cache__null.json").exists());
        // Nothing was cached, so the next call goes to the network again
        assert_eq!(fetcher.fetch("/null").await, None);
    }

    #[tokio::test]
    async fn test_status_backoff_waits_one_then_two_units() {
        let server = MockServer::start().await;
        Mock::given(path("/down"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let unit = Duration::from_millis(100);
        let client =
            GitHubClient::with_base_url(&server.uri(), TOKEN.to_string(), Duration::from_secs(5))
                .unwrap();
        let policy = RetryPolicy {
            retries: 2,
            backoff_unit: unit,
        };
        let fetcher = CachedFetcher::new(client, None, policy);

        let started = std::time::Instant::now();
        assert_eq!(fetcher.fetch("/down").await, None);
        let elapsed = started.elapsed();

        // 1 unit after the first failure, 2 after the second, none after the last
        assert!(elapsed >= unit * 3, "waited only {:?}", elapsed);
        assert!(elapsed < unit * 6, "waited too long: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": 1})))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        // A file where the cache directory should be makes every write fail
        let blocked = temp_dir.path().join("blocked");
        fs::write(&blocked, "").unwrap();

        let client =
            GitHubClient::with_base_url(&server.uri(), TOKEN.to_string(), Duration::from_secs(5))
                .unwrap();
        let fetcher = CachedFetcher::new(client, Some(ResponseCache::new(&blocked)), fast_policy(0));
        assert_eq!(fetcher.fetch("/ok").await, Some(json!({"ok": 1})));
    }

    #[tokio::test]
    async fn test_unreachable_host_resolves_to_none() {
        let client = GitHubClient::with_base_url(
            "http://127.0.0.1:1",
            TOKEN.to_string(),
            Duration::from_millis(200),
        )
        .unwrap();
        let fetcher = CachedFetcher::new(client, None, fast_policy(1));
        assert_eq!(fetcher.fetch("/anything").await, None);
    }
}
