use crate::analysis::RepoRecord;
use crate::error::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TOOLBOX_VERSION: &str = "1.0.0";

/// Machine-readable index of the analyzed repositories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsIndex {
    pub metadata: IndexMetadata,
    pub statistics: IndexStatistics,
    pub repositories: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub generated_at: String,
    pub total_repositories: usize,
    pub username: String,
    pub toolbox_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatistics {
    pub total_stars: u64,
    pub total_forks: u64,
    pub total_issues: u64,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub url: String,
    pub description: String,
    pub stars: u64,
    pub forks: u64,
    pub language: String,
    pub updated_at: String,
    pub topics: Vec<String>,
    pub has_wiki: bool,
    pub license: Option<String>,
}

impl From<&RepoRecord> for IndexEntry {
    fn from(record: &RepoRecord) -> Self {
        Self {
            name: record.name.clone(),
            url: record.url.clone(),
            description: record.final_description.clone(),
            stars: record.stars,
            forks: record.forks,
            language: record.language.clone(),
            updated_at: record.updated_at.clone(),
            topics: record.topics.clone(),
            has_wiki: record.has_wiki,
            license: record.license.clone(),
        }
    }
}

/// Build the index for a set of records, keeping their order
pub fn build_index(owner: &str, records: &[RepoRecord], now: DateTime<Local>) -> ToolsIndex {
    let languages: BTreeSet<&str> = records
        .iter()
        .map(|r| r.language.as_str())
        .filter(|l| !l.is_empty())
        .collect();

    ToolsIndex {
        metadata: IndexMetadata {
            generated_at: now.to_rfc3339(),
            total_repositories: records.len(),
            username: owner.to_string(),
            toolbox_version: TOOLBOX_VERSION.to_string(),
        },
        statistics: IndexStatistics {
            total_stars: records.iter().map(|r| r.stars).sum(),
            total_forks: records.iter().map(|r| r.forks).sum(),
            total_issues: records.iter().map(|r| r.open_issues).sum(),
            languages: languages.into_iter().map(str::to_string).collect(),
        },
        repositories: records.iter().map(IndexEntry::from).collect(),
    }
}

impl ToolsIndex {
    /// Pretty JSON with non-ASCII text kept as-is
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_build_index() {
        let mut a = RepoRecord::sample("a");
        a.stars = 3;
        a.forks = 1;
        a.open_issues = 2;
        a.language = "Rust".to_string();
        a.license = Some("MIT License".to_string());

        let mut b = RepoRecord::sample("b");
        b.stars = 4;
        b.language = "Go".to_string();

        let c = RepoRecord::sample("c");

        let index = build_index("octocat", &[a, b, c], fixed_now());
        assert_eq!(index.metadata.total_repositories, 3);
        assert_eq!(index.metadata.username, "octocat");
        assert_eq!(index.metadata.toolbox_version, TOOLBOX_VERSION);
        assert_eq!(index.statistics.total_stars, 7);
        assert_eq!(index.statistics.total_forks, 1);
        assert_eq!(index.statistics.total_issues, 2);
        assert_eq!(
            index.statistics.languages,
            vec!["Go", "Multiple languages", "Rust"]
        );
        assert_eq!(index.repositories[0].name, "a");
        assert_eq!(index.repositories[0].license.as_deref(), Some("MIT License"));
    }

    #[test]
    fn test_index_json_shape() {
        let mut record = RepoRecord::sample("工具");
        record.final_description = "一个用于测试的工具".to_string();

        let json = build_index("octocat", &[record], fixed_now()).to_json().unwrap();
        assert!(json.contains("一个用于测试的工具"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["repositories"][0]["description"], "一个用于测试的工具");
        assert!(value["repositories"][0]["license"].is_null());
        assert!(value["metadata"]["generated_at"]
            .as_str()
            .unwrap()
            .starts_with("2024-06-01T12:00:00"));
    }
}
