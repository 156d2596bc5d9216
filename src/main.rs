use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chainfeeds::config::{Config, DEFAULT_CONFIG_PATH};
use chainfeeds::discovery::{self, BraveSearch, DiscoveryOptions};
use chainfeeds::feed::{self, build_client, check_all, verify_all, Status, Verifier};
use chainfeeds::reconcile::diff_against_store;
use chainfeeds::registry::{find_unresolved, resolve_all, PROTOCOLS};
use chainfeeds::report;

#[derive(Parser, Debug)]
#[command(
    name = "chainfeeds",
    version,
    about = "Curated RSS/Atom registry for blockchain projects"
)]
struct Args {
    /// Config file (TOML)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the registry and diff it against the feed store
    Sync {
        /// Verify every resolved feed before diffing
        #[arg(long)]
        verify: bool,
        /// Rewrite the feed store from the registry
        #[arg(long)]
        write: bool,
        /// Also run search discovery (needs an API key)
        #[arg(long)]
        discover: bool,
    },
    /// Health-check every feed in the store
    Check,
    /// Search the web and registry homepages for new feeds
    Discover,
    /// Find the feed behind one or more websites
    Probe {
        #[arg(value_name = "HOMEPAGE", required = true)]
        homepages: Vec<String>,
    },
    /// Remove feeds listed in the dead-feed JSON from the store
    RemoveDead {
        /// Dead-feed list (defaults to the configured path)
        #[arg(value_name = "JSON")]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Reports go to stdout; logs stay on stderr
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chainfeeds=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load_with_env(&args.config)
        .with_context(|| format!("Failed to load config '{}'", args.config.display()))?;
    tracing::debug!(config = ?config, "Effective configuration");

    match args.command {
        Command::Sync {
            verify,
            write,
            discover,
        } => sync(&config, verify, write, discover).await,
        Command::Check => check(&config).await,
        Command::Discover => run_discovery(&config).await,
        Command::Probe { homepages } => probe(&config, &homepages).await,
        Command::RemoveDead { path } => {
            remove_dead(&config, path.as_deref().unwrap_or(&config.dead_feeds_path))
        }
    }
}

fn verifier(timeout: std::time::Duration) -> Result<Verifier> {
    let client = build_client().context("Failed to build HTTP client")?;
    Ok(Verifier::new(client, timeout))
}

async fn sync(config: &Config, verify: bool, write: bool, discover: bool) -> Result<()> {
    let resolved = resolve_all(PROTOCOLS);
    let unresolved = find_unresolved(PROTOCOLS);
    tracing::info!(
        protocols = PROTOCOLS.len(),
        resolved = resolved.len(),
        unresolved = unresolved.len(),
        "Resolved registry"
    );

    let mut failures = Vec::new();
    if verify {
        let verifier = verifier(config.check_timeout())?;
        for (feed, result) in verify_all(&verifier, resolved.clone(), config.concurrency).await {
            if !result.is_ok() {
                failures.push((feed, result));
            }
        }
        failures.sort_by(|a, b| a.0.label.cmp(&b.0.label));
        tracing::info!(failed = failures.len(), "Verified registry feeds");
    }

    let diff = diff_against_store(&resolved, &config.store_path).await;
    let today = Utc::now().date_naive();
    print!("{}", report::diff_report(&diff, &failures, verify, today));

    if write {
        let failed: HashSet<&str> = failures.iter().map(|(f, _)| f.xml_url.as_str()).collect();
        let keep: Vec<_> = resolved
            .iter()
            .filter(|f| !failed.contains(f.xml_url.as_str()))
            .cloned()
            .collect();
        feed::write_atomic(&config.store_path, &feed::generate_opml(&keep)).with_context(|| {
            format!(
                "Failed to write feed store '{}'",
                config.store_path.display()
            )
        })?;
        tracing::info!(
            path = %config.store_path.display(),
            feeds = keep.len(),
            excluded = failures.len(),
            "Wrote feed store"
        );
    }

    if discover {
        match config.search_api_key() {
            // Discovery is optional here; the sync itself already succeeded
            Err(e) => tracing::error!(error = %e, "Skipping discovery"),
            Ok(_) => run_discovery(config).await?,
        }
    }

    Ok(())
}

async fn check(config: &Config) -> Result<()> {
    let feeds = feed::load(&config.store_path).await.with_context(|| {
        format!(
            "Failed to read feed store '{}'",
            config.store_path.display()
        )
    })?;
    if feeds.is_empty() {
        tracing::warn!(path = %config.store_path.display(), "Feed store has no feeds");
    }

    let verifier = verifier(config.check_timeout())?;
    let mut results = check_all(&verifier, feeds, config.concurrency).await;
    results.sort_by(|a, b| a.feed.name.cmp(&b.feed.name));

    let dead: Vec<&str> = results
        .iter()
        .filter(|r| r.status == Status::Dead)
        .map(|r| r.feed.xml_url.as_str())
        .collect();
    let json = serde_json::to_string_pretty(&dead).context("Failed to encode dead feed list")?;
    std::fs::write(&config.dead_feeds_path, json).with_context(|| {
        format!(
            "Failed to write dead feed list '{}'",
            config.dead_feeds_path.display()
        )
    })?;
    tracing::info!(
        path = %config.dead_feeds_path.display(),
        dead = dead.len(),
        "Wrote dead feed list"
    );

    print!("{}", report::health_report(&results, Utc::now().date_naive()));
    Ok(())
}

async fn run_discovery(config: &Config) -> Result<()> {
    let api_key = config.search_api_key()?;

    let existing = match feed::load(&config.store_path).await {
        Ok(feeds) => feeds,
        Err(e) => {
            tracing::warn!(path = %config.store_path.display(), error = %e, "Could not read feed store, treating it as empty");
            Vec::new()
        }
    };

    let verifier = verifier(config.discovery_timeout())?;
    let search = BraveSearch::new(
        verifier.client().clone(),
        SecretString::from(api_key.expose_secret().to_owned()),
    );
    let unresolved = find_unresolved(PROTOCOLS);
    let options = DiscoveryOptions {
        queries: config.search_queries.clone(),
        concurrency: config.concurrency,
        homepage_path_timeout: config.homepage_probe_timeout(),
        ..DiscoveryOptions::default()
    };

    let found = discovery::discover(&search, &verifier, &existing, &unresolved, &options).await;
    print!(
        "{}",
        report::discovery_report(&found, Utc::now().date_naive())
    );
    Ok(())
}

async fn probe(config: &Config, homepages: &[String]) -> Result<()> {
    let verifier = verifier(config.discovery_timeout())?;
    for homepage in homepages {
        tracing::info!(url = %homepage, "Probing");
        let result =
            feed::probe_homepage(&verifier, homepage, config.homepage_probe_timeout()).await;
        match (result.feed_url, result.method) {
            (Some(url), Some(method)) => println!(
                "{homepage}\n  Found: {url} ({method}, title: {})",
                result.feed_title.as_deref().unwrap_or("unknown")
            ),
            _ => println!("{homepage}\n  No feed found"),
        }
    }
    Ok(())
}

fn remove_dead(config: &Config, list_path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(list_path)
        .with_context(|| format!("Failed to read dead feed list '{}'", list_path.display()))?;
    let urls: Vec<String> = serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a JSON array of URLs", list_path.display()))?;

    if urls.is_empty() {
        println!("No dead feeds to remove.");
        return Ok(());
    }

    let store = &config.store_path;
    let content = std::fs::read_to_string(store)
        .with_context(|| format!("Failed to read feed store '{}'", store.display()))?;
    let removal = feed::remove_urls(&content, &urls);
    for name in &removal.removed {
        println!("Removed: {name}");
    }

    if !removal.removed.is_empty() {
        feed::write_atomic(store, &removal.content)
            .with_context(|| format!("Failed to write feed store '{}'", store.display()))?;
    }
    println!(
        "\n{} feed(s) removed from {}",
        removal.removed.len(),
        store.display()
    );
    Ok(())
}
