use crate::error::Result;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "cache_";
const FILE_SUFFIX: &str = ".json";

/// On-disk cache of raw API responses, one file per endpoint.
///
/// Entries never expire. An entry counts as a hit only when it decodes to a
/// non-empty JSON object; anything else is treated as missing.
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    /// Create a cache rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Filesystem-safe key for an endpoint path
    pub fn key_for(endpoint: &str) -> String {
        endpoint.replace(['/', ':'], "_")
    }

    /// Path of the file backing an endpoint
    pub fn path_for(&self, endpoint: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", FILE_PREFIX, Self::key_for(endpoint), FILE_SUFFIX))
    }

    /// Get a cached response if a structurally valid entry exists
    pub fn get(&self, endpoint: &str) -> Option<Value> {
        let path = self.path_for(endpoint);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Corrupt cache entry, refetching: {} ({})", endpoint, e);
                return None;
            }
        };
        if contents.trim().is_empty() {
            return None;
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) if !map.is_empty() => Some(Value::Object(map)),
            Ok(_) => {
                tracing::warn!("Invalid cache entry, refetching: {}", endpoint);
                None
            }
            Err(_) => {
                tracing::warn!("Corrupt cache entry, refetching: {}", endpoint);
                None
            }
        }
    }

    /// Store a response, overwriting any previous entry
    pub fn put(&self, endpoint: &str, value: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_string_pretty(value)?;
        fs::write(self.path_for(endpoint), data)?;
        Ok(())
    }

    /// Remove all cache entries, returning how many were deleted
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_paths()? {
            fs::remove_file(path)?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        for path in self.entry_paths()? {
            stats.total_entries += 1;
            stats.size_bytes += fs::metadata(&path)?.len();
        }
        Ok(stats)
    }

    fn entry_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_entry = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_SUFFIX));
            if is_entry && path.is_file() {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

/// Cache statistics
#[derive(Debug, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub size_bytes: u64,
}

impl CacheStats {
    /// Format size in human-readable format
    pub fn format_size(&self) -> String {
        let bytes = self.size_bytes;
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.2} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
