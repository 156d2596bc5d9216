//! Configuration file parser for `chainfeeds.toml`.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde, though we log a warning when the file
//! contains potential typos. Environment variables override the file.
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::discovery::DEFAULT_QUERIES;
use crate::feed::{
    CHECK_TIMEOUT, COMMON_PATH_TIMEOUT, DEFAULT_CONCURRENCY, DISCOVERY_TIMEOUT,
};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "chainfeeds.toml";

/// Env var holding the search API key.
pub const API_KEY_ENV: &str = "BRAVE_SEARCH_API_KEY";
/// Env var overriding where the dead-feed list is written and read.
pub const DEAD_FEEDS_ENV: &str = "DEAD_FEEDS_PATH";

const KNOWN_KEYS: [&str; 8] = [
    "store_path",
    "dead_feeds_path",
    "concurrency",
    "check_timeout_secs",
    "discovery_timeout_secs",
    "homepage_probe_timeout_secs",
    "search_queries",
    "brave_api_key",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("BRAVE_SEARCH_API_KEY is required for discovery")]
    MissingApiKey,
}

/// Run configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
///
/// SEC-015: Custom Debug impl masks `brave_api_key`.
#[derive(Deserialize)]
#[serde(default)]
pub struct Config {
    /// OPML feed store.
    pub store_path: PathBuf,

    /// JSON list of dead feed URLs written by `check`.
    pub dead_feeds_path: PathBuf,

    /// Maximum simultaneous outbound fetches.
    pub concurrency: usize,

    pub check_timeout_secs: u64,
    pub discovery_timeout_secs: u64,
    pub homepage_probe_timeout_secs: u64,

    /// Queries run on every discovery pass.
    pub search_queries: Vec<String>,

    /// Brave search API key. `BRAVE_SEARCH_API_KEY` takes precedence.
    #[serde(deserialize_with = "deserialize_secret")]
    pub brave_api_key: Option<SecretString>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|k| !k.trim().is_empty()).map(SecretString::from))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("feeds.opml"),
            dead_feeds_path: PathBuf::from("/tmp/dead-feeds.json"),
            concurrency: DEFAULT_CONCURRENCY,
            check_timeout_secs: CHECK_TIMEOUT.as_secs(),
            discovery_timeout_secs: DISCOVERY_TIMEOUT.as_secs(),
            homepage_probe_timeout_secs: COMMON_PATH_TIMEOUT.as_secs(),
            search_queries: DEFAULT_QUERIES.iter().map(|q| (*q).to_owned()).collect(),
            brave_api_key: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("store_path", &self.store_path)
            .field("dead_feeds_path", &self.dead_feeds_path)
            .field("concurrency", &self.concurrency)
            .field("check_timeout_secs", &self.check_timeout_secs)
            .field("discovery_timeout_secs", &self.discovery_timeout_secs)
            .field("homepage_probe_timeout_secs", &self.homepage_probe_timeout_secs)
            .field("search_queries", &self.search_queries)
            .field(
                "brave_api_key",
                &self.brave_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), store = %config.store_path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Loads the file, then applies the process environment.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::load(path)?.apply_env(|name| std::env::var(name).ok()))
    }

    /// Applies overrides from `lookup` (normally `std::env::var`). Empty
    /// values are ignored.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = var(API_KEY_ENV) {
            self.brave_api_key = Some(SecretString::from(key));
        }
        if let Some(path) = var(DEAD_FEEDS_ENV) {
            self.dead_feeds_path = PathBuf::from(path);
        }
        self
    }

    /// The search API key, or `MissingApiKey` when discovery cannot run.
    pub fn search_api_key(&self) -> Result<&SecretString, ConfigError> {
        self.brave_api_key.as_ref().ok_or(ConfigError::MissingApiKey)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs.max(1))
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs.max(1))
    }

    pub fn homepage_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.homepage_probe_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chainfeeds_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chainfeeds.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store_path, PathBuf::from("feeds.opml"));
        assert_eq!(config.dead_feeds_path, PathBuf::from("/tmp/dead-feeds.json"));
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.check_timeout(), Duration::from_secs(15));
        assert_eq!(config.discovery_timeout(), Duration::from_secs(10));
        assert_eq!(config.homepage_probe_timeout(), Duration::from_secs(8));
        assert_eq!(config.search_queries.len(), 5);
        assert!(config.brave_api_key.is_none());
    }

    #[test]
    fn test_search_api_key_required() {
        let config = Config::default();
        let err = config.search_api_key().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
        assert!(err.to_string().contains(API_KEY_ENV));

        let config = Config::default().apply_env(|name| match name {
            API_KEY_ENV => Some("from-env".to_owned()),
            _ => None,
        });
        assert_eq!(config.search_api_key().unwrap().expose_secret(), "from-env");
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/chainfeeds_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.concurrency, 5);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.store_path, PathBuf::from("feeds.opml"));
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config("partial", "concurrency = 2\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.check_timeout_secs, 15);
        assert_eq!(config.search_queries.len(), 5);
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let path = write_config(
            "full",
            r#"
store_path = "data/feeds.opml"
dead_feeds_path = "data/dead.json"
concurrency = 8
check_timeout_secs = 20
discovery_timeout_secs = 5
homepage_probe_timeout_secs = 3
search_queries = ["zk rollup blog RSS"]
brave_api_key = "test-key-123"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store_path, PathBuf::from("data/feeds.opml"));
        assert_eq!(config.dead_feeds_path, PathBuf::from("data/dead.json"));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.check_timeout(), Duration::from_secs(20));
        assert_eq!(config.discovery_timeout(), Duration::from_secs(5));
        assert_eq!(config.homepage_probe_timeout(), Duration::from_secs(3));
        assert_eq!(config.search_queries, vec!["zk rollup blog RSS".to_owned()]);
        assert_eq!(
            config.brave_api_key.as_ref().map(|k| k.expose_secret().to_owned()),
            Some("test-key-123".to_owned())
        );
        cleanup(&path);
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let path = write_config("blank_key", "brave_api_key = \"  \"\n");
        assert!(Config::load(&path).unwrap().brave_api_key.is_none());
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "concurrency = \"many\"\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config(
            "unknown",
            "concurrency = 3\ntotally_fake_key = \"should not fail\"\n",
        );
        assert_eq!(Config::load(&path).unwrap().concurrency, 3);
        cleanup(&path);
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }

    #[test]
    fn test_env_overrides_file() {
        let path = write_config(
            "env",
            "brave_api_key = \"from-file\"\ndead_feeds_path = \"file.json\"\n",
        );
        let config = Config::load(&path).unwrap().apply_env(|name| match name {
            API_KEY_ENV => Some("from-env".to_owned()),
            DEAD_FEEDS_ENV => Some("/var/tmp/dead.json".to_owned()),
            _ => None,
        });
        assert_eq!(
            config.brave_api_key.as_ref().map(|k| k.expose_secret().to_owned()),
            Some("from-env".to_owned())
        );
        assert_eq!(config.dead_feeds_path, PathBuf::from("/var/tmp/dead.json"));
        cleanup(&path);
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let config = Config::default().apply_env(|_| Some(String::new()));
        assert!(config.brave_api_key.is_none());
        assert_eq!(config.dead_feeds_path, PathBuf::from("/tmp/dead-feeds.json"));
    }

    #[test]
    fn test_zero_timeouts_are_clamped() {
        let config = Config {
            check_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.check_timeout(), Duration::from_secs(1));
    }

    // SEC-015: Debug output masks API key
    #[test]
    fn test_debug_masks_api_key() {
        let config = Config {
            brave_api_key: Some(SecretString::from("super-secret-key-12345".to_owned())),
            ..Config::default()
        };
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("super-secret-key-12345"));
        assert!(debug_output.contains("[REDACTED]"));

        let debug_output = format!("{:?}", Config::default());
        assert!(!debug_output.contains("[REDACTED]"));
    }
}
