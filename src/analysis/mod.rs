pub mod description;
pub mod normalize;

use serde::{Deserialize, Serialize};

/// Stand-in for `language` when GitHub reports no primary language
pub const MULTIPLE_LANGUAGES: &str = "Multiple languages";

/// Fully-typed metadata for one repository.
///
/// Every field is always populated, so renderers can format it without
/// further checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRecord {
    /// Repository name as configured
    pub name: String,
    /// Web URL of the repository
    pub url: String,
    /// Description set on GitHub (may be empty)
    pub official_description: String,
    /// Description shown in reports
    pub final_description: String,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    /// Dates as YYYY-MM-DD, or empty when unknown
    pub created_at: String,
    pub updated_at: String,
    pub pushed_at: String,
    /// Primary language
    pub language: String,
    /// Up to three languages in GitHub's order
    pub languages: Vec<String>,
    pub topics: Vec<String>,
    /// License display name
    pub license: Option<String>,
    pub has_wiki: bool,
    pub has_pages: bool,
    pub has_projects: bool,
    pub has_downloads: bool,
    pub archived: bool,
    pub disabled: bool,
    pub private: bool,
}

impl RepoRecord {
    /// Whether `language` names a real language rather than the sentinel
    pub fn has_primary_language(&self) -> bool {
        !self.language.is_empty() && self.language != MULTIPLE_LANGUAGES
    }
}

#[cfg(test)]
impl RepoRecord {
    /// A record with every field at its default
    pub(crate) fn sample(name: &str) -> Self {
        Self {
            name: name.to_string(),
            url: format!("https://github.com/octocat/{}", name),
            official_description: String::new(),
            final_description: format!("{} - a development project", name),
            stars: 0,
            forks: 0,
            watchers: 0,
            open_issues: 0,
            created_at: String::new(),
            updated_at: String::new(),
            pushed_at: String::new(),
            language: MULTIPLE_LANGUAGES.to_string(),
            languages: Vec::new(),
            topics: Vec::new(),
            license: None,
            has_wiki: false,
            has_pages: false,
            has_projects: false,
            has_downloads: true,
            archived: false,
            disabled: false,
            private: false,
        }
    }
}
