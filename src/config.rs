use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Recommendation server configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Item table artifact (JSON, columnar)
    #[serde(default = "default_items_path")]
    pub items_path: PathBuf,

    /// Similarity matrix artifact (bincode)
    #[serde(default = "default_similarity_path")]
    pub similarity_path: PathBuf,

    /// TMDB API key. Posters are disabled when unset.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix prepended to TMDB poster paths
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// How long a resolved poster (or a miss) is kept, in seconds
    #[serde(default = "default_poster_cache_ttl_secs")]
    pub poster_cache_ttl_secs: u64,

    /// Per-request timeout for TMDB lookups, in seconds
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,

    /// Number of recommendations returned when the caller does not ask
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Upper bound on `k` accepted over HTTP
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_items_path() -> PathBuf {
    PathBuf::from("models/movies.json")
}

fn default_similarity_path() -> PathBuf {
    PathBuf::from("models/similarity.bin")
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_poster_cache_ttl_secs() -> u64 {
    86_400 // 24 hours
}

fn default_lookup_timeout_secs() -> u64 {
    10
}

fn default_k() -> usize {
    5
}

fn default_max_k() -> usize {
    50
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        Ok(config.normalized())
    }

    /// Blank credentials count as absent.
    fn normalized(mut self) -> Self {
        self.tmdb_api_key = self
            .tmdb_api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }

    pub fn poster_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.poster_cache_ttl_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Offline model builder configuration, read from `BUILDER_`-prefixed variables
#[derive(Debug, Deserialize, Clone)]
pub struct BuilderConfig {
    #[serde(default = "default_items_path")]
    pub items_path: PathBuf,

    #[serde(default = "default_similarity_path")]
    pub output_path: PathBuf,

    /// Vocabulary cap
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// Terms in fewer documents than this are dropped
    #[serde(default = "default_min_df")]
    pub min_df: usize,

    /// Terms in more than this fraction of documents are dropped
    #[serde(default = "default_max_df")]
    pub max_df: f64,

    #[serde(default = "default_ngram_min")]
    pub ngram_min: usize,

    #[serde(default = "default_ngram_max")]
    pub ngram_max: usize,

    /// Titles used to compare the previous model against the new one
    #[serde(default = "default_probe_titles")]
    pub probe_titles: Vec<String>,

    /// Keep a one-time copy of the matrix being replaced
    #[serde(default = "default_backup")]
    pub backup: bool,
}

fn default_max_features() -> usize {
    5000
}

fn default_min_df() -> usize {
    2
}

fn default_max_df() -> f64 {
    0.8
}

fn default_ngram_min() -> usize {
    1
}

fn default_ngram_max() -> usize {
    2
}

fn default_probe_titles() -> Vec<String> {
    ["Avatar", "The Dark Knight", "Titanic", "The Matrix", "Toy Story"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

fn default_backup() -> bool {
    true
}

impl BuilderConfig {
    /// Load builder configuration from `BUILDER_*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed("BUILDER_")
            .from_env::<BuilderConfig>()
            .map_err(|e| anyhow::anyhow!("Failed to load builder config: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_config_defaults() {
        let config: Config = envy::from_iter(vars(&[])).unwrap();
        assert_eq!(config.items_path, PathBuf::from("models/movies.json"));
        assert_eq!(config.similarity_path, PathBuf::from("models/similarity.bin"));
        assert_eq!(config.poster_cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.lookup_timeout(), Duration::from_secs(10));
        assert_eq!(config.default_k, 5);
        assert!(config.tmdb_api_key.is_none());
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let config: Config = envy::from_iter(vars(&[("TMDB_API_KEY", "   ")])).unwrap();
        assert!(config.normalized().tmdb_api_key.is_none());
    }

    #[test]
    fn test_api_key_is_trimmed() {
        let config: Config = envy::from_iter(vars(&[("TMDB_API_KEY", " abc123 ")])).unwrap();
        assert_eq!(config.normalized().tmdb_api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_builder_defaults() {
        let config: BuilderConfig = envy::from_iter(vars(&[])).unwrap();
        assert_eq!(config.max_features, 5000);
        assert_eq!(config.min_df, 2);
        assert_eq!(config.max_df, 0.8);
        assert_eq!((config.ngram_min, config.ngram_max), (1, 2));
        assert_eq!(config.probe_titles.len(), 5);
        assert!(config.backup);
    }

    #[test]
    fn test_builder_probe_titles_from_comma_list() {
        let config: BuilderConfig =
            envy::from_iter(vars(&[("PROBE_TITLES", "Alien,Heat")])).unwrap();
        assert_eq!(config.probe_titles, vec!["Alien", "Heat"]);
    }
}
