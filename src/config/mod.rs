//! Configuration management for docqa
//!
//! Handles loading and validating configuration from a TOML file, with
//! environment overrides for credentials and backend selection.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::models::{EmbeddingModelKey, LlmModelKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Environment variable holding the hosted API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Placeholder bearer token sent to local OpenAI-compatible servers
pub const LOCAL_API_KEY: &str = "ollama";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the vector and session databases live (defaults to the config directory)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Active embedding backend
    #[serde(default = "default_embedding_model")]
    pub embedding_model: EmbeddingModelKey,

    /// Active generation backend
    #[serde(default = "default_llm_model")]
    pub llm_model: LlmModelKey,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Embedding request configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Outbound HTTP configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Hosted API key, read from the environment only
    #[serde(skip)]
    pub openai_api_key: Option<String>,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Characters per chunk window
    #[serde(default = "default_chunk_size")]
    pub size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

/// Query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Passages retrieved per question
    #[serde(default = "default_query_top_n")]
    pub top_n: usize,
}

/// Embedding request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Texts per embedding request
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

/// Which vector store implementation backs the collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendKind {
    /// Embedded on-disk SQLite database
    Sqlite,
    /// External Qdrant server
    Qdrant,
}

impl FromStr for StoreBackendKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "qdrant" => Ok(Self::Qdrant),
            _ => Err(Error::Config(format!(
                "Unsupported store backend '{}'; expected sqlite or qdrant",
                value
            ))),
        }
    }
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackendKind,

    /// Qdrant connection URL (only used by the qdrant backend)
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
}

fn default_store_backend() -> StoreBackendKind {
    StoreBackendKind::Sqlite
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Base URL of the hosted OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Base URL of the local OpenAI-compatible API
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for docqa data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to the embedded vector database
    pub vectors_db: PathBuf,

    /// Path to the session ledger database
    pub session_db: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            data_dir: None,
            embedding_model: default_embedding_model(),
            llm_model: default_llm_model(),
            chunk: ChunkConfig::default(),
            query: QueryConfig::default(),
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            http: HttpConfig::default(),
            openai_api_key: None,
            paths: PathsConfig::default(),
        };
        config.init_paths(&Self::default_base_dir());
        config
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_n: default_query_top_n(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_embedding_batch_size(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            qdrant_url: default_qdrant_url(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            openai_base_url: default_openai_base_url(),
            ollama_base_url: default_ollama_base_url(),
            timeout_secs: default_http_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Get the default base directory for docqa (~/.docqa)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".docqa")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Configuration rooted at a data directory, with no file and no environment
    pub fn for_data_dir(data_dir: &Path) -> Self {
        let mut config = Config {
            data_dir: Some(data_dir.to_path_buf()),
            ..Config::default()
        };
        config.init_paths(data_dir);
        config.paths.config_file = data_dir.join("config.toml");
        config
    }

    fn init_paths(&mut self, config_dir: &Path) {
        let base = self
            .data_dir
            .clone()
            .unwrap_or_else(|| config_dir.to_path_buf());
        self.paths = PathsConfig {
            config_file: config_dir.join("config.toml"),
            vectors_db: base.join("vectors.db"),
            session_db: base.join("session.db"),
            base_dir: base,
        };
    }

    /// Load configuration from a file path, falling back to defaults when the
    /// file does not exist, then apply environment overrides and validate.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let content = std::fs::read_to_string(config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            debug!("No config file at {:?}, using defaults", config_path);
            Config::default()
        };

        config.apply_env_overrides()?;

        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        config.init_paths(config_dir);
        config.paths.config_file = config_path.to_path_buf();

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_config_path())
    }

    /// Pull credentials and overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        self.openai_api_key = lookup(OPENAI_API_KEY_ENV).filter(|key| !key.trim().is_empty());

        if let Some(dir) = lookup("DOCQA_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(model) = lookup("DOCQA_EMBEDDING_MODEL") {
            self.embedding_model = model.parse()?;
        }
        if let Some(model) = lookup("DOCQA_LLM_MODEL") {
            self.llm_model = model.parse()?;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.http.openai_base_url = url;
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.http.ollama_base_url = url;
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.store.qdrant_url = url;
        }
        Ok(())
    }

    /// The hosted API key, or a setup error naming the variable to set
    pub fn require_openai_api_key(&self) -> Result<&str> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            Error::Setup(format!(
                "{} is not set; it is required by the hosted OpenAI backend",
                OPENAI_API_KEY_ENV
            ))
        })
    }

    /// Check that the selected backends have the credentials they need.
    /// Runs before any pipeline call so a missing key never shows up as a
    /// downstream request failure.
    pub fn check_credentials(&self) -> Result<()> {
        if self.embedding_model.requires_api_key() || self.llm_model.requires_api_key() {
            self.require_openai_api_key()?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk.size == 0 {
            return Err(Error::Config("chunk.size must be positive".to_string()));
        }

        if self.chunk.overlap >= self.chunk.size {
            return Err(Error::Config(
                "chunk.overlap must be < chunk.size".to_string(),
            ));
        }

        if self.query.top_n == 0 {
            return Err(Error::Config("query.top_n must be positive".to_string()));
        }

        if self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "embedding.batch_size must be positive".to_string(),
            ));
        }

        if self.http.timeout_secs == 0 {
            warn!("http.timeout_secs is 0; requests will time out immediately");
        }

        for (field, value) in [
            ("http.openai_base_url", &self.http.openai_base_url),
            ("http.ollama_base_url", &self.http.ollama_base_url),
            ("store.qdrant_url", &self.store.qdrant_url),
        ] {
            Url::parse(value)
                .map_err(|e| Error::Config(format!("{} is not a valid URL: {}", field, e)))?;
        }

        Ok(())
    }
}
