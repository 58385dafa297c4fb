pub mod cache;
pub mod client;
pub mod fetcher;

/// Repository metadata endpoint
pub fn repo_endpoint(owner: &str, repo: &str) -> String {
    format!("/repos/{}/{}", owner, repo)
}

/// README content endpoint (base64 payload)
pub fn readme_endpoint(owner: &str, repo: &str) -> String {
    format!("/repos/{}/{}/readme", owner, repo)
}

/// Language name to byte count mapping
pub fn languages_endpoint(owner: &str, repo: &str) -> String {
    format!("/repos/{}/{}/languages", owner, repo)
}
