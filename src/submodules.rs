use std::path::{Path, PathBuf};
use std::process::Command;

/// Result of adding one repository as a git submodule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmoduleOutcome {
    Added,
    /// Target directory already exists
    Skipped,
    Failed(String),
}

/// Arguments for `git` that add `repo` as a submodule under `target`
pub fn submodule_args(owner: &str, repo: &str, target: &Path) -> Vec<String> {
    vec![
        "submodule".to_string(),
        "add".to_string(),
        format!("https://github.com/{}/{}.git", owner, repo),
        target.to_string_lossy().into_owned(),
    ]
}

/// Add each repository as a submodule under `tools_dir`, skipping existing ones
pub fn add_submodules(
    owner: &str,
    repos: &[String],
    tools_dir: &Path,
) -> Vec<(String, SubmoduleOutcome)> {
    repos
        .iter()
        .map(|repo| {
            let target: PathBuf = tools_dir.join(repo);
            let outcome = if target.exists() {
                tracing::info!("Skipping {}, {} already exists", repo, target.display());
                SubmoduleOutcome::Skipped
            } else {
                run_git(&submodule_args(owner, repo, &target))
            };
            (repo.clone(), outcome)
        })
        .collect()
}

fn run_git(args: &[String]) -> SubmoduleOutcome {
    tracing::info!("$ git {}", args.join(" "));
    match Command::new("git").args(args).status() {
        Ok(status) if status.success() => SubmoduleOutcome::Added,
        Ok(status) => SubmoduleOutcome::Failed(format!("git exited with {}", status)),
        Err(e) => SubmoduleOutcome::Failed(e.to_string()),
    }
}
