mod analysis;
mod api;
mod cli;
mod config;
mod error;
mod orchestrator;
mod report;
mod submodules;

use api::cache::ResponseCache;
use api::client::{GitHubClient, TokenCheck};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::{Result, ToolboxError};
use orchestrator::{Disposition, Orchestrator};
use std::path::{Path, PathBuf};
use std::time::Duration;
use submodules::SubmoduleOutcome;

const TOKEN_CHECK_TIMEOUT_SECS: u64 = 10;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Validate CLI arguments
    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let code = tokio::select! {
        result = run(&cli) => match result {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("❌ Error: {}", e);
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n⚠️ Interrupted by user.");
            0
        }
    };

    std::process::exit(code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    if let Some(command) = &cli.command {
        return handle_command(command, cli).await;
    }

    let config = apply_cli_overrides(Config::load_or_default(&cli.config)?, cli);
    config.validate()?;
    let token = config.get_token()?;

    println!("{}", "=".repeat(60));
    println!("🧰 {}'s Toolbox generator v{}", config.github_username, env!("CARGO_PKG_VERSION"));
    println!("{}", "=".repeat(60));
    println!(
        "📋 Target repositories ({}): {}",
        config.repositories.len(),
        config.repositories.join(", ")
    );
    println!("{}", "-".repeat(60));

    let orchestrator = Orchestrator::new(config, token)?;
    let outcome = orchestrator.run().await;
    let config = orchestrator.config();

    println!("{}", "-".repeat(60));

    if outcome.disposition() == Disposition::TotalFailure {
        eprintln!("No repository could be analyzed. Possible causes:");
        eprintln!("  1. The GitHub token is invalid or lacks permission");
        eprintln!("  2. The repositories do not exist or are not accessible");
        eprintln!("  3. Network problems");
        eprintln!("  4. API rate limiting");
        return Err(ToolboxError::NoRepositoriesAnalyzed {
            attempted: outcome.attempted(),
        });
    }

    let written = report::write_reports(
        &config.github_username,
        &outcome.records,
        &config.readme_output,
        &config.index_output,
        Local::now(),
    )?;

    let languages: std::collections::BTreeSet<&str> =
        outcome.records.iter().map(|r| r.language.as_str()).collect();

    println!("🎉 Generation complete!");
    println!("{}", "=".repeat(60));
    println!(
        "✅ Analyzed: {}/{} repositories",
        outcome.records.len(),
        outcome.attempted()
    );
    if !outcome.skipped.is_empty() {
        println!("⚠️  Skipped: {}", outcome.skipped.join(", "));
    }
    println!("⭐ Total stars: {}", outcome.total_stars());
    println!("🍴 Total forks: {}", outcome.total_forks());
    println!("🔧 Languages: {}", languages.len());
    println!();
    println!("📁 Generated files:");
    println!(
        "  • {} ({} characters)",
        written.dashboard.display(),
        written.dashboard_chars
    );
    println!("  • {} (JSON index)", written.index.display());
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_command(command: &Commands, cli: &Cli) -> Result<()> {
    match command {
        Commands::Init { force } => {
            if cli.config.exists() && !force {
                eprintln!("Config file already exists at: {}", cli.config.display());
                eprintln!("Use --force to overwrite");
                std::process::exit(1);
            }

            Config::create_default(&cli.config)?;
            println!("✓ Created config file at: {}", cli.config.display());
            println!("\nTo authenticate with GitHub, either:");
            println!("  1. Set GITHUB_TOKEN in the environment or a .env file");
            println!("  2. Add github_token to the config file");
            println!("A classic token with 'repo' scope works: https://github.com/settings/tokens");
        }
        Commands::CheckToken => check_token(cli).await?,
        Commands::ClearCache => {
            let config = Config::load_or_default(&cli.config)?;
            let cache = ResponseCache::new(&config.cache_dir);
            let removed = cache.clear()?;
            println!("✓ Removed {} cache entries from {}", removed, cache.dir().display());
        }
        Commands::CacheStats => {
            let config = Config::load_or_default(&cli.config)?;
            let cache = ResponseCache::new(&config.cache_dir);
            if !cache.dir().exists() {
                println!("Cache directory does not exist");
            } else {
                let stats = cache.stats()?;
                println!("Cache directory: {}", cache.dir().display());
                println!("Total entries: {}", stats.total_entries);
                println!("Cache size: {}", stats.format_size());
            }
        }
        Commands::CloneTools { tools_dir } => {
            let config = Config::load_or_default(&cli.config)?;
            config.validate()?;

            println!("🔧 Adding submodules under {}...", tools_dir.display());
            let outcomes =
                submodules::add_submodules(&config.github_username, &config.repositories, tools_dir);
            for (repo, outcome) in &outcomes {
                match outcome {
                    SubmoduleOutcome::Added => println!("   ✅ {}", repo),
                    SubmoduleOutcome::Skipped => println!("   ⏭️  {} (already present)", repo),
                    SubmoduleOutcome::Failed(reason) => println!("   ❌ {}: {}", repo, reason),
                }
            }
            println!("\nInitialize them with:");
            println!("  git submodule init");
            println!("  git submodule update");
        }
    }
    Ok(())
}

async fn check_token(cli: &Cli) -> Result<()> {
    let config = Config::load_or_default(&cli.config)?;
    let token = config.get_token()?;
    let client = GitHubClient::with_base_url(
        &config.api_base_url,
        token,
        Duration::from_secs(TOKEN_CHECK_TIMEOUT_SECS),
    )?;

    println!(
        "🧪 Testing token for user {} against {}",
        config.github_username,
        client.base_url()
    );
    println!("{}", "-".repeat(40));

    match client.check_token().await {
        Ok(TokenCheck::Valid {
            login,
            remaining,
            limit,
        }) => {
            println!("1. User API: ✅ token is valid, owned by {}", login);
            println!(
                "   ℹ️  Rate limit remaining: {}/{}",
                remaining.as_deref().unwrap_or("unknown"),
                limit.as_deref().unwrap_or("unknown")
            );
        }
        Ok(TokenCheck::Unauthorized) => {
            println!("1. User API: ❌ token is invalid or expired (401)")
        }
        Ok(TokenCheck::RateLimited) => {
            println!("1. User API: ⚠️  rate limit exhausted (403), try again later")
        }
        Ok(TokenCheck::Forbidden) => {
            println!("1. User API: ❌ permission denied (403), check the token's 'repo' scope")
        }
        Ok(TokenCheck::Unexpected(status)) => {
            println!("1. User API: ⚠️  unexpected status {}", status)
        }
        Err(e) => println!("1. User API: ❌ request failed: {}", e),
    }

    println!("{}", "-".repeat(40));

    if let Some(repo) = config.repositories.iter().find(|r| !r.trim().is_empty()) {
        let endpoint = api::repo_endpoint(&config.github_username, repo.trim());
        match client.get_json(&endpoint).await {
            Ok(data) => println!(
                "2. Repository API ({}): ✅ description: {}",
                endpoint,
                data.get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or("(none)")
            ),
            Err(e) => println!("2. Repository API ({}): ❌ {}", endpoint, e),
        }
        println!("{}", "-".repeat(40));
    }

    println!("Token check finished.");
    Ok(())
}

fn apply_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    // Override cache setting
    if cli.no_cache {
        config.cache_enabled = false;
    }

    if let Some(retries) = cli.retries {
        config.retries = retries;
    }

    // Redirect outputs, keeping their file names
    if let Some(ref dir) = cli.output_dir {
        config.readme_output = relocate(&config.readme_output, dir);
        config.index_output = relocate(&config.index_output, dir);
    }

    config
}

fn relocate(path: &Path, dir: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => dir.join(name),
        None => dir.join(path),
    }
}
