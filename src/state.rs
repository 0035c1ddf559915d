use crate::config::settings::AppConfig;
use crate::infrastructure::redis::client::RedisService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub redis: RedisService,
}

impl AppState {
    pub fn new(config: AppConfig, redis: RedisService) -> Self {
        Self {
            config: Arc::new(config),
            redis,
        }
    }
}
