//! Application configuration management
//!
//! This module handles loading and validating configuration from environment
//! variables. All configuration is loaded at startup and validated before the
//! application runs.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    container_images, DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_JUDGE_MODE,
    DEFAULT_JUDGE_QUEUE_SIZE, DEFAULT_JUDGE_TIMEOUT_SECS, DEFAULT_LOCAL_EXECUTOR,
    DEFAULT_MAX_MEMORY_MB, DEFAULT_MAX_OUTPUT_KB, DEFAULT_MAX_TIME_SECS, DEFAULT_SANDBOX_DIR,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub judge: JudgeConfig,
    pub oss: OssConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Judge mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeMode {
    Local,
    Remote,
}

/// Local executor backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalExecutorKind {
    Host,
    Container,
}

/// Judge pipeline configuration
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub mode: JudgeMode,
    /// Timeout for external judge calls, in seconds
    pub timeout_secs: u64,
    /// Capacity of the bounded in-memory submission queue
    pub queue_size: usize,
    pub local: LocalJudgeConfig,
    pub remote: RemoteJudgeConfig,
}

/// Local executor configuration
#[derive(Debug, Clone)]
pub struct LocalJudgeConfig {
    pub enabled: bool,
    pub sandbox_dir: PathBuf,
    pub executor: LocalExecutorKind,
    /// Per-case memory cap in megabytes
    pub max_memory_mb: u64,
    /// Per-case wall-clock limit in seconds
    pub max_time_secs: u64,
    /// Output cap in kilobytes
    pub max_output_kb: usize,
    pub supported_languages: Vec<String>,
    pub docker_image_go: String,
    pub docker_image_cpp: String,
    pub docker_image_python: String,
    pub docker_image_java: String,
}

/// Remote judge service configuration
#[derive(Debug, Clone)]
pub struct RemoteJudgeConfig {
    pub api_url: String,
}

/// Object storage configuration
#[derive(Debug, Clone)]
pub struct OssConfig {
    pub address: String,
    /// Externally reachable address used for presigned URLs; falls back to
    /// `address` when unset.
    pub public_address: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket_name: String,
    pub public_read_prefixes: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            judge: JudgeConfig::from_env()?,
            oss: OssConfig::from_env()?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or("SERVER_HOST", DEFAULT_SERVER_HOST),
            port: env_parse("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?,
            max_connections: env_parse(
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
        })
    }
}

impl JudgeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mode = match env_or("JUDGE_MODE", DEFAULT_JUDGE_MODE).to_lowercase().as_str() {
            "local" => JudgeMode::Local,
            "remote" => JudgeMode::Remote,
            _ => return Err(ConfigError::InvalidValue("JUDGE_MODE".to_string())),
        };

        let remote = RemoteJudgeConfig {
            api_url: env_or("JUDGE_REMOTE_API_URL", ""),
        };
        if mode == JudgeMode::Remote && remote.api_url.is_empty() {
            return Err(ConfigError::Missing("JUDGE_REMOTE_API_URL".to_string()));
        }

        Ok(Self {
            mode,
            timeout_secs: env_parse("JUDGE_TIMEOUT_SECS", DEFAULT_JUDGE_TIMEOUT_SECS)?,
            queue_size: env_parse("JUDGE_QUEUE_SIZE", DEFAULT_JUDGE_QUEUE_SIZE)?,
            local: LocalJudgeConfig::from_env()?,
            remote,
        })
    }
}

impl LocalJudgeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let executor = match env_or("JUDGE_LOCAL_EXECUTOR", DEFAULT_LOCAL_EXECUTOR)
            .to_lowercase()
            .as_str()
        {
            "host" => LocalExecutorKind::Host,
            "container" | "docker" => LocalExecutorKind::Container,
            _ => return Err(ConfigError::InvalidValue("JUDGE_LOCAL_EXECUTOR".to_string())),
        };

        let supported_languages = env_or("JUDGE_SUPPORTED_LANGUAGES", "go,python,cpp,java")
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            enabled: env_parse("JUDGE_LOCAL_ENABLED", true)?,
            sandbox_dir: PathBuf::from(env_or("JUDGE_SANDBOX_DIR", DEFAULT_SANDBOX_DIR)),
            executor,
            max_memory_mb: env_parse("JUDGE_MAX_MEMORY_MB", DEFAULT_MAX_MEMORY_MB)?,
            max_time_secs: env_parse("JUDGE_MAX_TIME_SECS", DEFAULT_MAX_TIME_SECS)?,
            max_output_kb: env_parse("JUDGE_MAX_OUTPUT_KB", DEFAULT_MAX_OUTPUT_KB)?,
            supported_languages,
            docker_image_go: env_or("JUDGE_DOCKER_IMAGE_GO", container_images::GO),
            docker_image_cpp: env_or("JUDGE_DOCKER_IMAGE_CPP", container_images::CPP),
            docker_image_python: env_or("JUDGE_DOCKER_IMAGE_PYTHON", container_images::PYTHON),
            docker_image_java: env_or("JUDGE_DOCKER_IMAGE_JAVA", container_images::JAVA),
        })
    }

    /// Check whether a detected language label is enabled.
    pub fn supports_language(&self, language: &str) -> bool {
        self.supported_languages.iter().any(|l| l == language)
    }
}

impl OssConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let address = env_or("OSS_ADDRESS", "http://localhost:9000");
        let public_address = {
            let v = env_or("OSS_PUBLIC_ADDRESS", "");
            if v.is_empty() {
                address.clone()
            } else {
                v
            }
        };

        let public_read_prefixes = env_or("OSS_PUBLIC_READ_PREFIXES", "")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            address,
            public_address,
            access_key: env_or("OSS_ACCESS_KEY", "minioadmin"),
            secret_key: env_or("OSS_SECRET_KEY", "minioadmin"),
            bucket_name: env_or("OSS_BUCKET_NAME", "pathjudge-cases"),
            public_read_prefixes,
        })
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_config_defaults() {
        let local = LocalJudgeConfig {
            enabled: true,
            sandbox_dir: PathBuf::from(DEFAULT_SANDBOX_DIR),
            executor: LocalExecutorKind::Host,
            max_memory_mb: DEFAULT_MAX_MEMORY_MB,
            max_time_secs: DEFAULT_MAX_TIME_SECS,
            max_output_kb: DEFAULT_MAX_OUTPUT_KB,
            supported_languages: vec![
                "go".into(),
                "python".into(),
                "cpp".into(),
                "java".into(),
            ],
            docker_image_go: container_images::GO.into(),
            docker_image_cpp: container_images::CPP.into(),
            docker_image_python: container_images::PYTHON.into(),
            docker_image_java: container_images::JAVA.into(),
        };
        assert!(local.supports_language("go"));
        assert!(local.supports_language("java"));
        assert!(!local.supports_language("brainfuck"));
    }
}
