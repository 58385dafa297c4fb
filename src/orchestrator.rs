use crate::analysis::normalize::Normalizer;
use crate::analysis::RepoRecord;
use crate::api::cache::ResponseCache;
use crate::api::client::GitHubClient;
use crate::api::fetcher::{CachedFetcher, EndpointFetcher, RetryPolicy};
use crate::config::Config;
use crate::error::Result;
use std::time::Duration;

/// Coordinates fetching and normalizing every configured repository
pub struct Orchestrator<F = CachedFetcher> {
    config: Config,
    fetcher: F,
}

impl Orchestrator<CachedFetcher> {
    /// Create an orchestrator talking to the configured API
    pub fn new(config: Config, token: String) -> Result<Self> {
        let client = GitHubClient::with_base_url(
            &config.api_base_url,
            token,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        let cache = if config.cache_enabled {
            Some(ResponseCache::new(&config.cache_dir))
        } else {
            None
        };

        let fetcher = CachedFetcher::new(client, cache, RetryPolicy::new(config.retries));
        Ok(Self::with_fetcher(config, fetcher))
    }
}

impl<F: EndpointFetcher> Orchestrator<F> {
    pub fn with_fetcher(config: Config, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    /// Analyze all repositories sequentially, in configured order
    pub async fn run(&self) -> RunOutcome {
        let normalizer = Normalizer::new(&self.fetcher, &self.config.github_username);
        let mut outcome = RunOutcome::default();

        for repo in self.repositories() {
            match normalizer.normalize(repo).await {
                Some(record) => outcome.records.push(record),
                None => {
                    tracing::warn!("Skipped repository: {}", repo);
                    outcome.skipped.push(repo.to_string());
                }
            }
        }

        outcome
    }

    /// Configured repositories with blanks removed
    pub fn repositories(&self) -> impl Iterator<Item = &str> {
        self.config
            .repositories
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
    }

    /// Get a reference to the config
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Result of one run over all repositories
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Successfully normalized records, in configured order
    pub records: Vec<RepoRecord>,
    /// Repositories whose metadata could not be fetched
    pub skipped: Vec<String>,
}

/// Overall disposition of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Success,
    Partial,
    TotalFailure,
}

impl RunOutcome {
    pub fn attempted(&self) -> usize {
        self.records.len() + self.skipped.len()
    }

    pub fn disposition(&self) -> Disposition {
        match (self.records.is_empty(), self.skipped.is_empty()) {
            (true, _) => Disposition::TotalFailure,
            (false, true) => Disposition::Success,
            (false, false) => Disposition::Partial,
        }
    }

    pub fn total_stars(&self) -> u64 {
        self.records.iter().map(|r| r.stars).sum()
    }

    pub fn total_forks(&self) -> u64 {
        self.records.iter().map(|r| r.forks).sum()
    }
}
