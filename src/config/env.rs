use std::env;
use std::str::FromStr;

pub enum EnvKey {
    RedisUrl,
    RedisIdleTimeout,
    RedisMaxIdle,
    TemplateDir,
    ResultDir,
    LogLevel,
    JobsChannel,
    JobLogChannel,
    MetadataBaseUrl,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::RedisUrl => "REDIS_URL",
            EnvKey::RedisIdleTimeout => "REDIS_IDLE_TIMEOUT",
            EnvKey::RedisMaxIdle => "REDIS_MAX_IDLE",
            EnvKey::TemplateDir => "TEMPLATE_DIR",
            EnvKey::ResultDir => "RESULT_DIR",
            EnvKey::LogLevel => "LOG_LEVEL",
            EnvKey::JobsChannel => "JOBS_CHANNEL",
            EnvKey::JobLogChannel => "JOB_LOG_CHANNEL",
            EnvKey::MetadataBaseUrl => "METADATA_BASE_URL",
        }
    }
}

/// Returns the variable only when it is set to a non-empty value.
pub fn get(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    get(key).unwrap_or_else(|| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Some(val) => val.parse::<T>().unwrap_or(default),
        None => default,
    }
}
