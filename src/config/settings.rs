use crate::config::cli::Cli;
use crate::config::env::{self, EnvKey};
use crate::modules::movie::page::TEMPLATE_NAME;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use url::Url;

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";
pub const DEFAULT_REDIS_IDLE_TIMEOUT_SECS: u64 = 240;
pub const DEFAULT_REDIS_MAX_IDLE: usize = 3;
pub const DEFAULT_TEMPLATE_DIR: &str = "/opt/reel-indexer/template";
pub const DEFAULT_RESULT_DIR: &str = "/var/www/reel-indexer";
pub const DEFAULT_JOBS_CHANNEL: &str = "jobs";
pub const DEFAULT_LOG_CHANNEL: &str = "jobs:log";
pub const DEFAULT_METADATA_BASE_URL: &str = "https://plus.kinopoisk.ru";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("must specify Redis server URL using --redis-addr")]
    MissingRedisUrl,

    #[error("must specify Redis idle timeout using --redis-idle-timeout")]
    MissingIdleTimeout,

    #[error("must specify Redis max idle using --redis-max-idle")]
    MissingMaxIdle,

    #[error("must specify {flag} directory using --{flag}dir")]
    MissingDir { flag: &'static str },

    #[error("{kind} directory '{}' does not exist", path.display())]
    DirNotFound { kind: &'static str, path: PathBuf },

    #[error("invalid metadata base URL '{url}': {source}")]
    InvalidMetadataUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid log level '{level}': {reason}")]
    InvalidLogLevel { level: String, reason: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub redis_url: String,
    pub redis_idle_timeout: Duration,
    pub redis_max_idle: usize,
    pub template_dir: PathBuf,
    pub result_dir: PathBuf,
    pub log_level: Option<String>,
    pub jobs_channel: String,
    pub log_channel: String,
    pub metadata_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            redis_idle_timeout: Duration::from_secs(DEFAULT_REDIS_IDLE_TIMEOUT_SECS),
            redis_max_idle: DEFAULT_REDIS_MAX_IDLE,
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            result_dir: PathBuf::from(DEFAULT_RESULT_DIR),
            log_level: None,
            jobs_channel: DEFAULT_JOBS_CHANNEL.to_string(),
            log_channel: DEFAULT_LOG_CHANNEL.to_string(),
            metadata_base_url: DEFAULT_METADATA_BASE_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then environment, then flags. Call `validate` before use.
    pub fn load(cli: &Cli) -> Self {
        let mut config = Self::from_env();
        config.apply_cli(cli);
        config
    }

    pub fn from_env() -> Self {
        Self {
            redis_url: env::get_or(EnvKey::RedisUrl, DEFAULT_REDIS_URL),
            redis_idle_timeout: Duration::from_secs(env::get_parsed(
                EnvKey::RedisIdleTimeout,
                DEFAULT_REDIS_IDLE_TIMEOUT_SECS,
            )),
            redis_max_idle: env::get_parsed(EnvKey::RedisMaxIdle, DEFAULT_REDIS_MAX_IDLE),
            template_dir: PathBuf::from(env::get_or(EnvKey::TemplateDir, DEFAULT_TEMPLATE_DIR)),
            result_dir: PathBuf::from(env::get_or(EnvKey::ResultDir, DEFAULT_RESULT_DIR)),
            log_level: env::get(EnvKey::LogLevel),
            jobs_channel: env::get_or(EnvKey::JobsChannel, DEFAULT_JOBS_CHANNEL),
            log_channel: env::get_or(EnvKey::JobLogChannel, DEFAULT_LOG_CHANNEL),
            metadata_base_url: env::get_or(EnvKey::MetadataBaseUrl, DEFAULT_METADATA_BASE_URL),
        }
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.template_dir {
            self.template_dir = dir.clone();
        }
        if let Some(dir) = &cli.result_dir {
            self.result_dir = dir.clone();
        }
        if let Some(addr) = &cli.redis_addr {
            self.redis_url = addr.clone();
        }
        if let Some(secs) = cli.redis_idle_timeout {
            self.redis_idle_timeout = Duration::from_secs(secs);
        }
        if let Some(max_idle) = cli.redis_max_idle {
            self.redis_max_idle = max_idle;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = Some(level.clone());
        }
        if let Some(channel) = &cli.jobs_channel {
            self.jobs_channel = channel.clone();
        }
        if let Some(channel) = &cli.log_channel {
            self.log_channel = channel.clone();
        }
        if let Some(base) = &cli.metadata_base_url {
            self.metadata_base_url = base.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.log_level {
            EnvFilter::try_new(level).map_err(|e| ConfigError::InvalidLogLevel {
                level: level.clone(),
                reason: e.to_string(),
            })?;
        }

        if self.redis_url.is_empty() {
            return Err(ConfigError::MissingRedisUrl);
        }
        if self.redis_idle_timeout.is_zero() {
            return Err(ConfigError::MissingIdleTimeout);
        }
        if self.redis_max_idle == 0 {
            return Err(ConfigError::MissingMaxIdle);
        }

        check_dir(&self.template_dir, "template")?;
        check_dir(&self.result_dir, "result")?;

        self.metadata_base()?;
        Ok(())
    }

    pub fn metadata_base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.metadata_base_url).map_err(|source| ConfigError::InvalidMetadataUrl {
            url: self.metadata_base_url.clone(),
            source,
        })
    }

    pub fn template_file(&self) -> PathBuf {
        self.template_dir.join(TEMPLATE_NAME)
    }
}

fn check_dir(path: &Path, kind: &'static str) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::MissingDir { flag: kind });
    }
    if !path.is_dir() {
        return Err(ConfigError::DirNotFound {
            kind,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> AppConfig {
        AppConfig {
            template_dir: dir.path().to_path_buf(),
            result_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn flags_override_loaded_values() {
        let cli = Cli::parse_from([
            "reel-indexer",
            "--redis-addr",
            "redis://cache:6380/1",
            "--redis-max-idle",
            "7",
            "--resultdir",
            "/srv/out",
        ]);
        let mut config = AppConfig::default();
        config.apply_cli(&cli);

        assert_eq!(config.redis_url, "redis://cache:6380/1");
        assert_eq!(config.redis_max_idle, 7);
        assert_eq!(config.result_dir, PathBuf::from("/srv/out"));
        assert_eq!(config.template_dir, PathBuf::from(DEFAULT_TEMPLATE_DIR));
        assert_eq!(config.jobs_channel, DEFAULT_JOBS_CHANNEL);
    }

    #[test]
    fn template_file_lives_in_template_dir() {
        let config = AppConfig {
            template_dir: PathBuf::from("/srv/templates"),
            ..AppConfig::default()
        };
        assert_eq!(config.template_file(), Path::new("/srv/templates").join(TEMPLATE_NAME));
    }

    #[test]
    fn accepts_existing_directories() {
        let dir = TempDir::new().unwrap();
        assert!(config_in(&dir).validate().is_ok());
    }

    #[test]
    fn rejects_missing_result_dir() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.result_dir = dir.path().join("absent");

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DirNotFound { kind: "result", .. }));
    }

    #[test]
    fn rejects_zero_pool_settings() {
        let dir = TempDir::new().unwrap();

        let mut config = config_in(&dir);
        config.redis_max_idle = 0;
        assert!(matches!(config.validate(), Err(ConfigError::MissingMaxIdle)));

        let mut config = config_in(&dir);
        config.redis_idle_timeout = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::MissingIdleTimeout)));
    }

    #[test]
    fn rejects_empty_redis_url() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.redis_url.clear();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRedisUrl)));
    }

    #[test]
    fn rejects_bad_metadata_url() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.metadata_base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMetadataUrl { .. })
        ));
    }
}
