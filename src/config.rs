use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    /// Object storage; the CLI commands that touch video files require it
    pub objects: Option<ObjectStoreConfig>,
    #[serde(default)]
    pub admin: AdminConfig,
    pub session: Option<SessionConfig>,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file backing the document store
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Base of the durable download URLs handed out for stored objects
    pub public_base_url: String,
    #[serde(default = "default_part_size_mib")]
    pub part_size_mib: usize,
    #[serde(default = "default_cache_entries")]
    pub cache_entries: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Comma-separated admin emails
    #[serde(default)]
    pub emails: String,
    #[serde(default)]
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub uid: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_active_threshold")]
    pub active_threshold: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            active_threshold: default_active_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackgroundConfig {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default = "default_poster")]
    pub poster: String,
    #[serde(default)]
    pub reduced_motion: bool,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            poster: default_poster(),
            reduced_motion: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    #[serde(default = "default_preferences_path")]
    pub path: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub path: String,
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Size in MiB before the log file rolls
    #[serde(default = "default_log_size")]
    pub size: u64,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_store_path() -> String {
    "motivate.db".to_string()
}

fn default_part_size_mib() -> usize {
    5
}

fn default_cache_entries() -> usize {
    32
}

fn default_active_threshold() -> f64 {
    0.6
}

fn default_poster() -> String {
    "/bg/fallback.jpg".to_string()
}

fn default_preferences_path() -> String {
    "preferences.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_size() -> u64 {
    10
}

fn default_max_files() -> usize {
    5
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_text = fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read config file {}", path))?;
    parse_config(&config_text)
}

pub fn parse_config(text: &str) -> Result<Config> {
    let config: Config = toml::from_str(text).context("Failed to parse config")?;
    if !(0.0..=1.0).contains(&config.feed.active_threshold) {
        anyhow::bail!(
            "feed.active_threshold must be between 0 and 1, got {}",
            config.feed.active_threshold
        );
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.store.path, "motivate.db");
        assert!(config.objects.is_none());
        assert!(config.session.is_none());
        assert_eq!(config.feed.active_threshold, 0.6);
        assert_eq!(config.background.poster, "/bg/fallback.jpg");
        assert!(config.background.sources.is_empty());
        assert_eq!(config.preferences.path, "preferences.json");
        assert!(config.admin.emails.is_empty());
        assert!(config.logging.is_none());
    }

    #[test]
    fn full_config_parses() {
        let config = parse_config(
            r#"
            [store]
            path = "/var/lib/motivate/feed.db"

            [objects]
            endpoint = "http://localhost:9000"
            region = "us-east-1"
            bucket = "videos"
            access_key_id = "minio"
            secret_access_key = "minio123"
            public_base_url = "https://media.example.com/v0/b/videos"

            [admin]
            emails = "boss@example.com, ops@example.com"
            tokens = ["admin-uid"]

            [session]
            uid = "operator"
            email = "boss@example.com"
            password = "secret"

            [feed]
            active_threshold = 0.75

            [background]
            sources = ["/bg/a.mp4", "/bg/b.mp4"]
            reduced_motion = true

            [logging]
            path = "logs/motivate.log"
            level = "debug"
            "#,
        )
        .unwrap();

        let objects = config.objects.unwrap();
        assert_eq!(objects.bucket, "videos");
        assert_eq!(objects.part_size_mib, 5);
        assert_eq!(config.admin.tokens, vec!["admin-uid"]);
        assert_eq!(config.session.unwrap().uid, "operator");
        assert_eq!(config.feed.active_threshold, 0.75);
        assert_eq!(config.background.sources.len(), 2);
        assert!(config.background.reduced_motion);
        let logging = config.logging.unwrap();
        assert_eq!(logging.size, 10);
        assert_eq!(logging.max_files, 5);
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        assert!(parse_config("[feed]\nactive_threshold = 1.5").is_err());
    }
}
