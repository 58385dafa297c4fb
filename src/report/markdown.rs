use crate::analysis::RepoRecord;
use chrono::{DateTime, Local, NaiveDate};
use std::collections::{BTreeSet, HashMap};

const MAX_TOPICS: usize = 5;
const LISTED_LANGUAGES: usize = 5;
const RECENT_COUNT: usize = 3;

/// Shields.io badge markup
pub fn badge(label: &str, value: &str, color: &str) -> String {
    let escape = |s: &str| s.replace('-', "--").replace('_', "__");
    format!(
        "![{}](https://img.shields.io/badge/{}-{}-{})",
        label,
        escape(label),
        escape(value),
        color
    )
}

/// Activity bucket derived from the last update date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Active,
    Moderate,
    Stale,
}

impl Activity {
    /// Classify a YYYY-MM-DD date; unknown dates count as active
    pub fn from_updated_at(updated_at: &str, today: NaiveDate) -> Self {
        let Ok(date) = NaiveDate::parse_from_str(updated_at, "%Y-%m-%d") else {
            return Activity::Active;
        };
        match (today - date).num_days() {
            d if d < 30 => Activity::Active,
            d if d < 90 => Activity::Moderate,
            _ => Activity::Stale,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Activity::Active => "🟢 Active",
            Activity::Moderate => "🟡 Moderate",
            Activity::Stale => "🔴 Stale",
        }
    }
}

/// Markdown card for a single repository
pub fn render_card(record: &RepoRecord) -> String {
    let mut card = String::new();

    card.push('\n');
    card.push_str(&format!("### 🗃️ [{}]({})\n", record.name, record.url));
    card.push_str(&format!("{}\n", record.final_description));
    card.push_str("**📊 Stats:**\n");
    card.push_str(&format!(
        "- ⭐ Stars: **{}** | 🍴 Forks: **{}**\n",
        record.stars, record.forks
    ));
    card.push_str(&format!(
        "- 📅 Updated: `{}` | 🐛 Open issues: {}\n",
        record.updated_at, record.open_issues
    ));
    card.push_str(&format!(
        "- 🔧 Language: `{}` | 📚 Wiki: {}\n",
        record.language,
        if record.has_wiki { "✅" } else { "❌" }
    ));

    if !record.topics.is_empty() {
        let topics: Vec<String> = record
            .topics
            .iter()
            .take(MAX_TOPICS)
            .map(|t| format!("`{}`", t))
            .collect();
        card.push_str(&format!("**🏷️ Topics:** {}\n\n", topics.join(" ")));
    }

    if let Some(license) = &record.license {
        card.push_str(&format!("**📄 License:** {}\n\n", license));
    }

    card.push_str(&format!("**🔗 Quick links:** [Repository]({})", record.url));

    if record.languages.len() > 1 {
        let others: Vec<String> = record
            .languages
            .iter()
            .skip(1)
            .take(2)
            .map(|l| format!("`{}`", l))
            .collect();
        card.push_str(&format!(" | Other languages: {}", others.join(", ")));
    }

    card.push_str("\n\n---\n");
    card
}

/// Render the full dashboard document
pub fn render_dashboard(owner: &str, records: &[RepoRecord], now: DateTime<Local>) -> String {
    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let total = records.len();
    let total_stars: u64 = records.iter().map(|r| r.stars).sum();
    let total_forks: u64 = records.iter().map(|r| r.forks).sum();

    let mut languages = BTreeSet::new();
    for record in records {
        if record.has_primary_language() {
            languages.insert(record.language.as_str());
        }
        languages.extend(record.languages.iter().map(String::as_str));
    }
    let listed: Vec<&str> = languages.iter().take(LISTED_LANGUAGES).copied().collect();
    let ellipsis = if languages.len() > LISTED_LANGUAGES { "..." } else { "" };

    let mut by_stars: Vec<&RepoRecord> = records.iter().collect();
    by_stars.sort_by(|a, b| b.stars.cmp(&a.stars));

    let mut recent: Vec<&RepoRecord> = records.iter().collect();
    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    recent.truncate(RECENT_COUNT);

    let (latest_date, latest_name) = recent
        .first()
        .map(|r| (r.updated_at.as_str(), r.name.as_str()))
        .unwrap_or(("N/A", ""));

    let mut md = String::new();
    md.push_str(&format!("# 🧰 {}'s Toolbox\n", owner));
    md.push_str(&format!(
        "{} {}\n",
        badge("repositories", &total.to_string(), "blue"),
        badge("stars", &total_stars.to_string(), "yellow")
    ));
    md.push_str(&format!(
        "> Personal development tools and projects | Last updated: {}\n",
        timestamp
    ));
    md.push_str("## 📊 Dashboard overview\n");
    md.push_str("| Metric | Value | Notes |\n");
    md.push_str("|--------|-------|-------|\n");
    md.push_str(&format!("| 📁 Repositories | **{}** | Projects included |\n", total));
    md.push_str(&format!("| ⭐ Total stars | **{}** | Sum over all repositories |\n", total_stars));
    md.push_str(&format!("| 🍴 Total forks | **{}** | Sum over all repositories |\n", total_forks));
    md.push_str(&format!(
        "| 🔧 Languages | **{}** | {}{} |\n",
        languages.len(),
        listed.join(", "),
        ellipsis
    ));
    md.push_str(&format!("| 📅 Last update | `{}` | {} |\n", latest_date, latest_name));
    md.push_str("## 🏆 Popular projects\n");
    md.push_str("Projects sorted by star count:\n");

    for record in &by_stars {
        md.push_str(&render_card(record));
    }

    md.push('\n');
    md.push_str("## 🔄 Recently updated\n");
    md.push_str("| Repository | Updated | Stars | Status |\n");
    md.push_str("|------------|---------|-------|--------|\n");
    let today = now.date_naive();
    for record in &recent {
        let status = Activity::from_updated_at(&record.updated_at, today);
        md.push_str(&format!(
            "| [{}]({}) | {} | ⭐ {} | {} |\n",
            record.name,
            record.url,
            record.updated_at,
            record.stars,
            status.label()
        ));
    }

    md.push_str(&render_language_chart(records));
    md.push_str(&render_feature_stats(records));

    md.push('\n');
    md.push_str("---\n");
    md.push_str(&format!(
        "*✨ Generated automatically by toolbox-gen | Generated at: {}*\n",
        timestamp
    ));
    md.push_str(&format!(
        "*[Report an issue](https://github.com/{}/Toolbox/issues)*\n",
        owner
    ));

    md
}

fn render_language_chart(records: &[RepoRecord]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records.iter().filter(|r| r.has_primary_language()) {
        *counts.entry(record.language.as_str()).or_insert(0) += 1;
    }

    let mut sorted: Vec<(&str, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let mut out = String::from("\n## 🔧 Tech stack\n### Primary language distribution\n~~~\n");
    for (language, count) in sorted {
        out.push_str(&format!("{:<15} {} ({})\n", language, "█".repeat(count), count));
    }
    out.push_str("~~~\n");
    out
}

fn render_feature_stats(records: &[RepoRecord]) -> String {
    let total = records.len();
    let with_wiki = records.iter().filter(|r| r.has_wiki).count();
    let with_pages = records.iter().filter(|r| r.has_pages).count();
    let with_license = records.iter().filter(|r| r.license.is_some()).count();
    let topic_count: usize = records.iter().map(|r| r.topics.len()).sum();
    let average_topics = if total > 0 {
        topic_count as f64 / total as f64
    } else {
        0.0
    };

    let mut out = String::from("### Project features\n");
    out.push_str(&format!("- 📚 With wiki: {}/{}\n", with_wiki, total));
    out.push_str(&format!("- 🌐 With Pages: {}/{}\n", with_pages, total));
    out.push_str(&format!("- 🏷️ Average topics: {:.1} per project\n", average_topics));
    out.push_str(&format!("- 📄 Licensed: {}/{}\n", with_license, total));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn record(name: &str, stars: u64, updated_at: &str, language: &str) -> RepoRecord {
        let mut record = RepoRecord::sample(name);
        record.stars = stars;
        record.updated_at = updated_at.to_string();
        record.language = language.to_string();
        record
    }

    #[test]
    fn test_badge_escaping() {
        assert_eq!(
            badge("build-status", "passing_now", "green"),
            "![build-status](https://img.shields.io/badge/build--status-passing__now-green)"
        );
    }

    #[test]
    fn test_activity_buckets() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(Activity::from_updated_at("2024-05-20", today), Activity::Active);
        assert_eq!(Activity::from_updated_at("2024-04-01", today), Activity::Moderate);
        assert_eq!(Activity::from_updated_at("2023-01-01", today), Activity::Stale);
        assert_eq!(Activity::from_updated_at("", today), Activity::Active);
        assert_eq!(Activity::from_updated_at("yesterday", today), Activity::Active);
    }

    #[test]
    fn test_card_contents() {
        let mut r = record("tool", 4, "2024-05-01", "Rust");
        r.has_wiki = true;
        r.topics = (1..=7).map(|i| format!("t{}", i)).collect();
        r.license = Some("MIT License".to_string());
        r.languages = vec!["Rust".into(), "Shell".into(), "Nix".into()];

        let card = render_card(&r);
        assert!(card.contains("### 🗃️ [tool](https://github.com/octocat/tool)"));
        assert!(card.contains("⭐ Stars: **4**"));
        assert!(card.contains("📚 Wiki: ✅"));
        assert!(card.contains("`t5`"));
        assert!(!card.contains("`t6`"));
        assert!(card.contains("**📄 License:** MIT License"));
        assert!(card.contains("Other languages: `Shell`, `Nix`"));
        assert!(card.ends_with("---\n"));
    }

    #[test]
    fn test_card_omits_empty_sections() {
        let card = render_card(&RepoRecord::sample("plain"));
        assert!(!card.contains("Topics"));
        assert!(!card.contains("License"));
        assert!(!card.contains("Other languages"));
    }

    #[test]
    fn test_dashboard_ordering_and_totals() {
        let records = vec![
            record("low", 1, "2024-05-30", "Go"),
            record("high", 50, "2023-01-01", "Rust"),
            record("mid", 10, "2024-03-15", "Rust"),
            record("old", 0, "2022-01-01", "Multiple languages"),
        ];
        let md = render_dashboard("octocat", &records, fixed_now());

        assert!(md.starts_with("# 🧰 octocat's Toolbox"));
        assert!(md.contains("![stars](https://img.shields.io/badge/stars-61-yellow)"));
        assert!(md.contains("| 📁 Repositories | **4** |"));
        assert!(md.contains("| ⭐ Total stars | **61** |"));
        assert!(md.contains("| 🔧 Languages | **2** | Go, Rust |"));
        assert!(md.contains("| 📅 Last update | `2024-05-30` | low |"));

        let high = md.find("### 🗃️ [high]").unwrap();
        let mid = md.find("### 🗃️ [mid]").unwrap();
        let low = md.find("### 🗃️ [low]").unwrap();
        assert!(high < mid && mid < low);

        assert!(md.contains("| [low](https://github.com/octocat/low) | 2024-05-30 | ⭐ 1 | 🟢 Active |"));
        assert!(md.contains("| [mid](https://github.com/octocat/mid) | 2024-03-15 | ⭐ 10 | 🟡 Moderate |"));
        assert!(md.contains("🔴 Stale"));
        assert!(!md.contains("| [old]("));

        assert!(md.contains("Rust            ██ (2)"));
        assert!(md.contains("Go              █ (1)"));
        assert!(md.contains("- 🏷️ Average topics: 0.0 per project"));
    }

    #[test]
    fn test_dashboard_empty() {
        let md = render_dashboard("octocat", &[], fixed_now());
        assert!(md.contains("| 📅 Last update | `N/A` |  |"));
        assert!(md.contains("- 📚 With wiki: 0/0"));
    }
}
