pub mod index;
pub mod markdown;

use crate::analysis::RepoRecord;
use crate::error::Result;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Files produced by a run
#[derive(Debug)]
pub struct WrittenReports {
    pub dashboard: PathBuf,
    pub dashboard_chars: usize,
    pub index: PathBuf,
}

/// Render and write the dashboard and JSON index
pub fn write_reports(
    owner: &str,
    records: &[RepoRecord],
    dashboard_path: &Path,
    index_path: &Path,
    now: DateTime<Local>,
) -> Result<WrittenReports> {
    tracing::info!("Writing dashboard to {}", dashboard_path.display());
    let dashboard = markdown::render_dashboard(owner, records, now);
    write_file(dashboard_path, &dashboard)?;

    tracing::info!("Writing JSON index to {}", index_path.display());
    let index = index::build_index(owner, records, now).to_json()?;
    write_file(index_path, &index)?;

    Ok(WrittenReports {
        dashboard: dashboard_path.to_path_buf(),
        dashboard_chars: dashboard.chars().count(),
        index: index_path.to_path_buf(),
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    Ok(())
}
