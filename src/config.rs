use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::lexicon::Lexicon;
use crate::nlp::IntensifierMode;
use crate::pipeline::FailurePolicy;
use crate::validation::InputValidator;

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub sentiment: SentimentConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// Trailing feedback window in calendar months
    pub window_months: u32,
    /// "add" or "replace"
    pub intensifier_mode: String,
    /// "fail_fast" or "continue"
    pub failure_policy: String,
    /// YAML/JSON word lists; built-in lists when unset
    pub lexicon_path: Option<String>,
    /// Items averaging below this rating are discard candidates
    pub discard_rating_threshold: f64,
    /// Default number of recommendations returned
    pub recommendation_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub path: String,
    /// Seconds a completed run stays fresh; 0 recomputes before every read
    pub ttl_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/cafeteria.db".to_string(),
            max_connections: 10,
            connection_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            format: "text".to_string(),
        }
    }
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            window_months: 3,
            intensifier_mode: "add".to_string(),
            failure_policy: "fail_fast".to_string(),
            lexicon_path: None,
            discard_rating_threshold: 2.0,
            recommendation_limit: 10,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: ".sentiment_cache".to_string(),
            ttl_secs: 0,
        }
    }
}

impl SentimentConfig {
    /// Parsed intensifier mode
    pub fn intensifier_mode(&self) -> Result<IntensifierMode> {
        Ok(self.intensifier_mode.parse()?)
    }

    /// Parsed failure policy
    pub fn failure_policy(&self) -> Result<FailurePolicy> {
        Ok(self.failure_policy.parse()?)
    }

    /// Load the configured lexicon, or the built-in one
    pub fn load_lexicon(&self) -> Result<Lexicon> {
        match &self.lexicon_path {
            Some(path) => Lexicon::from_file(Path::new(path))
                .with_context(|| format!("Failed to load lexicon from {path}")),
            None => Ok(Lexicon::default()),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from multiple sources with precedence:
    /// defaults, `config/default.*`, `config/local.*`, an explicit file,
    /// then `CAFETERIA_*` environment variables (`__` separates sections).
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default()).context("Failed to serialize defaults")?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("CAFETERIA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate database config
        InputValidator::validate_database_url(&self.database.url)?;
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(anyhow::anyhow!("connection_timeout_secs must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate sentiment config
        if self.sentiment.window_months == 0 {
            return Err(anyhow::anyhow!("window_months must be greater than 0"));
        }
        self.sentiment.intensifier_mode()?;
        self.sentiment.failure_policy()?;
        let threshold = self.sentiment.discard_rating_threshold;
        if threshold.is_nan() || threshold <= 0.0 {
            return Err(anyhow::anyhow!("discard_rating_threshold must be greater than 0"));
        }
        if self.sentiment.recommendation_limit == 0 {
            return Err(anyhow::anyhow!("recommendation_limit must be greater than 0"));
        }

        // Validate cache config
        if self.cache.enabled && self.cache.path.trim().is_empty() {
            return Err(anyhow::anyhow!("cache.path must be set when the cache is enabled"));
        }

        Ok(())
    }

    /// Get database URL from environment or config
    pub fn get_database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.url.clone())
    }
}
