use regex::Regex;
use std::sync::OnceLock;

const MIN_CANDIDATE_CHARS: usize = 25;
const MAX_CANDIDATES: usize = 2;
const MAX_DESCRIPTION_CHARS: usize = 180;
const TRUNCATED_CHARS: usize = 177;

/// Line prefixes that mark headings, media and list structure rather than prose
const STRUCTURAL_PREFIXES: &[&str] = &[
    "#", "!", "[", "```", "<!--", "---", "|", ">", "- ", "* ", "1.",
];

/// Looser prefix set for the fallback pass
const FALLBACK_SKIP_PREFIXES: &[&str] = &["#", "!", "[", "```", "<!--"];

/// Phrases that usually introduce a description of what the project does
const CONNECTOR_PHRASES: &[&str] = &[
    "is a",
    "is an",
    "used for",
    "provides",
    "supports",
    "based on",
    "implements",
    "can help with",
    "helps",
    "是一个",
    "用于",
    "提供",
    "支持",
    "基于",
    "实现",
    "可以帮助",
];

/// Fallback used when the README has no content at all
pub fn empty_readme_fallback(repo: &str) -> String {
    format!("{} - a practical development tool project", repo)
}

/// Fallback used when no line in the README qualifies
pub fn no_candidate_fallback(repo: &str) -> String {
    format!("{} project, providing practical features and tools", repo)
}

/// Extract a one-line description from README text, never returning empty
pub fn extract_description(readme: &str, repo: &str) -> String {
    if readme.trim().is_empty() {
        return empty_readme_fallback(repo);
    }
    find_description(readme).unwrap_or_else(|| no_candidate_fallback(repo))
}

/// Find and clean the most descriptive README line, if any
pub fn find_description(readme: &str) -> Option<String> {
    let candidate = connector_candidates(readme)
        .into_iter()
        .next()
        .or_else(|| first_plain_line(readme))?;

    Some(truncate(&strip_markup(candidate)))
}

fn connector_candidates(readme: &str) -> Vec<&str> {
    let mut candidates = Vec::new();

    for line in readme.lines().map(str::trim) {
        if line.is_empty() || starts_with_any(line, STRUCTURAL_PREFIXES) {
            continue;
        }
        if line.chars().count() < MIN_CANDIDATE_CHARS {
            continue;
        }
        if CONNECTOR_PHRASES.iter().any(|p| line.contains(p)) {
            candidates.push(line);
            if candidates.len() >= MAX_CANDIDATES {
                break;
            }
        }
    }

    candidates
}

fn first_plain_line(readme: &str) -> Option<&str> {
    readme.lines().map(str::trim).find(|line| {
        let len = line.chars().count();
        !line.is_empty() && !starts_with_any(line, FALLBACK_SKIP_PREFIXES) && len > 30 && len < 200
    })
}

fn starts_with_any(line: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| line.starts_with(p))
}

struct MarkupPatterns {
    image: Regex,
    link: Regex,
    code: Regex,
    bold: Regex,
    italic: Regex,
}

fn patterns() -> &'static MarkupPatterns {
    static PATTERNS: OnceLock<MarkupPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| MarkupPatterns {
        image: Regex::new(r"!\[.*?\]\(.*?\)").expect("valid image pattern"),
        link: Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid link pattern"),
        code: Regex::new(r"`([^`]+)`").expect("valid code pattern"),
        bold: Regex::new(r"\*\*([^*]+)\*\*").expect("valid bold pattern"),
        italic: Regex::new(r"\*([^*]+)\*").expect("valid italic pattern"),
    })
}

/// Remove images, unwrap links and drop inline code/emphasis markers
fn strip_markup(line: &str) -> String {
    let p = patterns();
    let text = p.image.replace_all(line, "");
    let text = p.link.replace_all(&text, "$1");
    let text = p.code.replace_all(&text, "$1");
    let text = p.bold.replace_all(&text, "$1");
    let text = p.italic.replace_all(&text, "$1");
    text.trim().to_string()
}

fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_DESCRIPTION_CHARS {
        let head: String = text.chars().take(TRUNCATED_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
