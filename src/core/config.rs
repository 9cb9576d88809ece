//! Typed application configuration.
//!
//! Loaded once at startup from a YAML file (path from `SIBYL_CONFIG_PATH`,
//! default `config.yml`), with environment overrides for deploy-sensitive
//! values, then validated before any service is constructed. A config that
//! fails validation aborts the process; nothing downstream re-checks it.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::llm::retry::RetryConfig;
use crate::rag::chunker::ChunkingConfig;
use crate::rag::relevance::RelevanceConfig;
use crate::web::extractor::ExtractionConfig;

const DEFAULT_CONFIG_PATH: &str = "config.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub index: IndexConfig,
    pub llm: LlmConfig,
    pub chunking: ChunkingConfig,
    pub relevance: RelevanceConfig,
    pub crawl: CrawlConfig,
    pub extraction: ExtractionConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index name on the remote service. Required; no usable default.
    pub name: String,
    pub namespace: String,
    pub base_url: String,
    pub top_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            namespace: "default".to_string(),
            base_url: "http://127.0.0.1:6333".to_string(),
            top_k: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Rewrite follow-up questions into standalone ones before answering.
    pub condense_questions: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1234".to_string(),
            model: "default".to_string(),
            api_key: None,
            condense_questions: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Seed URLs for the fallback crawl. Each must parse as an absolute URL.
    pub seeds: Vec<String>,
    pub page_budget: usize,
    pub nav_timeout_secs: u64,
    /// TTL for cached crawl results, in seconds. 0 disables the cache.
    pub cache_ttl_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            page_budget: 20,
            nav_timeout_secs: 20,
            cache_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the rolling log file. None logs to stdout only.
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    /// Loads the config file, applies environment overrides, validates.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("SIBYL_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(name) = env::var("SIBYL_INDEX_NAME") {
            self.index.name = name;
        }
        if let Ok(key) = env::var("SIBYL_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index.name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "index.name must be set (or SIBYL_INDEX_NAME exported)".to_string(),
            ));
        }
        Url::parse(&self.index.base_url).map_err(|e| {
            ConfigError::Invalid(format!("index.base_url is not a valid URL: {e}"))
        })?;
        Url::parse(&self.llm.base_url)
            .map_err(|e| ConfigError::Invalid(format!("llm.base_url is not a valid URL: {e}")))?;

        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunking.overlap ({}) must be strictly less than chunking.chunk_size ({})",
                self.chunking.overlap, self.chunking.chunk_size
            )));
        }

        if self.crawl.page_budget == 0 {
            return Err(ConfigError::Invalid(
                "crawl.page_budget must be at least 1".to_string(),
            ));
        }
        for seed in &self.crawl.seeds {
            Url::parse(seed).map_err(|e| {
                ConfigError::Invalid(format!("crawl.seeds entry {seed:?} is not a valid URL: {e}"))
            })?;
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.index.name = "docs".to_string();
        config
    }

    #[test]
    fn default_config_rejected_without_index_name() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("index.name"));
    }

    #[test]
    fn valid_config_passes() {
        valid_config().validate().unwrap();
    }

    #[test]
    fn overlap_at_chunk_size_rejected() {
        let mut config = valid_config();
        config.chunking.chunk_size = 200;
        config.chunking.overlap = 200;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunking.overlap"));
    }

    #[test]
    fn zero_page_budget_rejected() {
        let mut config = valid_config();
        config.crawl.page_budget = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn relative_seed_rejected() {
        let mut config = valid_config();
        config.crawl.seeds = vec!["/docs".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("crawl.seeds"));
    }

    #[test]
    fn zero_retry_attempts_rejected() {
        let mut config = valid_config();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "index:\n  name: handbook\ncrawl:\n  seeds: [\"https://example.com/\"]\n  page_budget: 5"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.index.name, "handbook");
        assert_eq!(config.crawl.page_budget, 5);
        assert_eq!(config.crawl.seeds, vec!["https://example.com/"]);
        // untouched sections keep their defaults
        assert_eq!(config.chunking.chunk_size, 1000);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::from_file(Path::new("/nonexistent/config.yml")).unwrap();
        assert!(config.index.name.is_empty());
    }
}
