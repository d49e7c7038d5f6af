//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `CROSSRANK_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_INFERENCE_CONCURRENCY, DEFAULT_MAX_PAIRS, DEFAULT_MAX_SEQ_LEN, DEFAULT_PORT,
};
use crate::reranker::RerankerConfig;

/// Origin of the cross-encoder weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Built-in stub tokenizer and model.
    Stub,
    /// A local model directory.
    Local(PathBuf),
    /// A Hugging Face Hub repository, resolved through the local hub cache.
    Hub {
        model_id: String,
        revision: Option<String>,
    },
}

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `CROSSRANK_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Cross-encoder model directory (`config.json`, safetensors, `tokenizer.json`).
    pub model_path: Option<PathBuf>,

    /// Hugging Face model id (e.g. `BAAI/bge-reranker-v2-m3`), downloaded into
    /// the local hub cache at startup. Mutually exclusive with `model_path`.
    /// With neither set the service runs with the stub model.
    pub model_id: Option<String>,

    /// Hub revision for `model_id`. Default: `main`.
    pub model_revision: Option<String>,

    /// Token limit per sequence; longer texts are truncated. Default: `512`.
    pub max_seq_len: usize,

    /// Largest accepted pair batch. Default: `256`.
    pub max_pairs: usize,

    /// Concurrent inference calls allowed on the device. Default: `1`.
    pub inference_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            model_path: None,
            model_id: None,
            model_revision: None,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            max_pairs: DEFAULT_MAX_PAIRS,
            inference_concurrency: DEFAULT_INFERENCE_CONCURRENCY,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "CROSSRANK_PORT";
    const ENV_BIND_ADDR: &'static str = "CROSSRANK_BIND_ADDR";
    const ENV_MODEL_PATH: &'static str = "CROSSRANK_MODEL_PATH";
    const ENV_MODEL_ID: &'static str = "CROSSRANK_MODEL_ID";
    const ENV_MODEL_REVISION: &'static str = "CROSSRANK_MODEL_REVISION";
    const ENV_MAX_SEQ_LEN: &'static str = "CROSSRANK_MAX_SEQ_LEN";
    const ENV_MAX_PAIRS: &'static str = "CROSSRANK_MAX_PAIRS";
    const ENV_INFERENCE_CONCURRENCY: &'static str = "CROSSRANK_INFERENCE_CONCURRENCY";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let model_path = Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH);
        let model_id = Self::parse_optional_string_from_env(Self::ENV_MODEL_ID);
        let model_revision = Self::parse_optional_string_from_env(Self::ENV_MODEL_REVISION);
        let max_seq_len = Self::parse_usize_from_env(Self::ENV_MAX_SEQ_LEN, defaults.max_seq_len)?;
        let max_pairs = Self::parse_usize_from_env(Self::ENV_MAX_PAIRS, defaults.max_pairs)?;
        let inference_concurrency = Self::parse_usize_from_env(
            Self::ENV_INFERENCE_CONCURRENCY,
            defaults.inference_concurrency,
        )?;

        Ok(Self {
            port,
            bind_addr,
            model_path,
            model_id,
            model_revision,
            max_seq_len,
            max_pairs,
            inference_concurrency,
        })
    }

    /// Validates paths and limits (does not touch the model files themselves).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_path.is_some() && self.model_id.is_some() {
            return Err(ConfigError::ConflictingModelSource);
        }
        if self.model_revision.is_some() && self.model_id.is_none() {
            return Err(ConfigError::RevisionWithoutModelId);
        }

        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if self.max_seq_len == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_MAX_SEQ_LEN,
            });
        }
        if self.max_pairs == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_MAX_PAIRS,
            });
        }
        if self.inference_concurrency == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_INFERENCE_CONCURRENCY,
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        match self.bind_addr {
            IpAddr::V4(addr) => format!("{}:{}", addr, self.port),
            IpAddr::V6(addr) => format!("[{}]:{}", addr, self.port),
        }
    }

    /// Where the model comes from. Call after [`Config::validate`].
    pub fn model_source(&self) -> ModelSource {
        match (&self.model_path, &self.model_id) {
            (Some(path), _) => ModelSource::Local(path.clone()),
            (None, Some(id)) => ModelSource::Hub {
                model_id: id.clone(),
                revision: self.model_revision.clone(),
            },
            (None, None) => ModelSource::Stub,
        }
    }

    /// Model settings for [`crate::reranker::Reranker::load`], given the
    /// local directory the model source resolved to (`None` for stub mode).
    pub fn reranker_config(&self, model_dir: Option<PathBuf>) -> RerankerConfig {
        let config = match model_dir {
            Some(path) => RerankerConfig::new(path),
            None => RerankerConfig::stub(),
        };
        config.with_max_seq_len(self.max_seq_len)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_usize_from_env(name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(name) {
            Ok(value) => {
                value
                    .trim()
                    .parse()
                    .map_err(|e| ConfigError::InvalidNumber {
                        name,
                        value: value.clone(),
                        source: e,
                    })
            }
            Err(_) => Ok(default),
        }
    }
}
