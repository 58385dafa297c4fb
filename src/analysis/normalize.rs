use crate::analysis::description::{empty_readme_fallback, extract_description};
use crate::analysis::{RepoRecord, MULTIPLE_LANGUAGES};
use crate::api::fetcher::EndpointFetcher;
use crate::api::{languages_endpoint, readme_endpoint, repo_endpoint};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{Map, Value};

const MAX_LANGUAGES: usize = 3;
const DATE_LEN: usize = 10;

/// Turns raw API responses into fully-populated `RepoRecord`s
pub struct Normalizer<'a, F> {
    fetcher: &'a F,
    owner: &'a str,
}

impl<'a, F: EndpointFetcher> Normalizer<'a, F> {
    pub fn new(fetcher: &'a F, owner: &'a str) -> Self {
        Self { fetcher, owner }
    }

    /// Build the record for one repository.
    ///
    /// Returns `None` only when the repository metadata itself cannot be
    /// fetched; README and language lookups degrade to defaults.
    pub async fn normalize(&self, repo: &str) -> Option<RepoRecord> {
        tracing::info!("Analyzing repository: {}", repo);

        let metadata = match self.fetcher.fetch(&repo_endpoint(self.owner, repo)).await {
            Some(value) => value,
            None => {
                tracing::error!("Could not fetch any information for '{}', skipping", repo);
                return None;
            }
        };

        let empty = Map::new();
        let data = match &metadata {
            Value::Object(map) => map,
            other => {
                tracing::warn!(
                    "Metadata for '{}' is not an object ({}), using empty metadata",
                    repo,
                    json_type(other)
                );
                &empty
            }
        };

        let official_description = data
            .get("description")
            .and_then(Value::as_str)
            .map(|d| d.trim().to_string())
            .unwrap_or_default();

        let final_description = if official_description.is_empty() {
            self.readme_description(repo)
                .await
                .unwrap_or_else(|| format!("{} - a development project", repo))
        } else {
            official_description.clone()
        };

        let record = RepoRecord {
            name: repo.to_string(),
            url: string_field(data, "html_url")
                .unwrap_or_else(|| format!("https://github.com/{}/{}", self.owner, repo)),
            official_description,
            final_description,
            stars: count(data, "stargazers_count"),
            forks: count(data, "forks_count"),
            watchers: count(data, "watchers_count"),
            open_issues: count(data, "open_issues_count"),
            created_at: date(data, "created_at"),
            updated_at: date(data, "updated_at"),
            pushed_at: date(data, "pushed_at"),
            language: string_field(data, "language")
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| MULTIPLE_LANGUAGES.to_string()),
            languages: self.languages(repo).await,
            topics: string_list(data, "topics"),
            license: data
                .get("license")
                .and_then(Value::as_object)
                .and_then(|l| string_field(l, "name")),
            has_wiki: flag(data, "has_wiki", false),
            has_pages: flag(data, "has_pages", false),
            has_projects: flag(data, "has_projects", false),
            has_downloads: flag(data, "has_downloads", true),
            archived: flag(data, "archived", false),
            disabled: flag(data, "disabled", false),
            private: flag(data, "private", false),
        };

        tracing::info!("Analyzed {} (stars: {})", repo, record.stars);
        Some(record)
    }

    async fn readme_description(&self, repo: &str) -> Option<String> {
        tracing::info!("Extracting description from README for {}", repo);

        let readme = self.fetcher.fetch(&readme_endpoint(self.owner, repo)).await?;
        let text = decode_readme(&readme)?;
        if text.is_empty() {
            return None;
        }

        let description = extract_description(&text, repo);
        if description == empty_readme_fallback(repo) {
            None
        } else {
            Some(description)
        }
    }

    async fn languages(&self, repo: &str) -> Vec<String> {
        match self.fetcher.fetch(&languages_endpoint(self.owner, repo)).await {
            Some(Value::Object(map)) => map.keys().take(MAX_LANGUAGES).cloned().collect(),
            _ => Vec::new(),
        }
    }
}

/// Decode the base64 payload of a README response
pub fn decode_readme(readme: &Value) -> Option<String> {
    if readme.get("encoding").and_then(Value::as_str) != Some("base64") {
        return None;
    }
    let content = readme.get("content").and_then(Value::as_str)?;

    // GitHub wraps the payload at 60 columns
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = match BASE64.decode(compact) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("README base64 decoding failed: {}", e);
            return None;
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!("README is not valid UTF-8: {}", e);
            None
        }
    }
}

fn string_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

fn count(data: &Map<String, Value>, key: &str) -> u64 {
    data.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn date(data: &Map<String, Value>, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .map(|d| d.chars().take(DATE_LEN).collect())
        .unwrap_or_default()
}

fn flag(data: &Map<String, Value>, key: &str, default: bool) -> bool {
    data.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn string_list(data: &Map<String, Value>, key: &str) -> Vec<String> {
    data.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
