use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(name = "toolbox-gen")]
#[command(author, version, long_about = None)]
#[command(
    about = "Generates a personal toolbox dashboard from GitHub repository metadata",
    long_about = "toolbox-gen fetches metadata, README and language data for a configured \
                  list of GitHub repositories, caches the raw API responses on disk, and \
                  renders a Markdown dashboard plus a JSON index."
)]
pub struct Cli {
    /// Path to the config file (JSON, or TOML with a .toml extension)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory to write README.md and tools_index.json into
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Bypass the on-disk response cache
    #[arg(long)]
    pub no_cache: bool,

    /// Extra attempts for transient API failures
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Verify the GitHub token and repository access
    CheckToken,

    /// Clear the response cache
    ClearCache,

    /// Show cache statistics
    CacheStats,

    /// Add the configured repositories as git submodules
    CloneTools {
        /// Directory the submodules are placed in
        #[arg(long, value_name = "DIR", default_value = "tools")]
        tools_dir: PathBuf,
    },
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref dir) = self.output_dir {
            if dir.is_file() {
                return Err(format!(
                    "--output-dir {} is a file, expected a directory",
                    dir.display()
                ));
            }
        }

        if self.command.is_some() && (self.output_dir.is_some() || self.retries.is_some()) {
            return Err("--output-dir and --retries only apply to report generation".to_string());
        }

        Ok(())
    }
}
