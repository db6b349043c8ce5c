use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapingConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.echecs.asso.fr/".to_string(),
            user_agent: "Mozilla/5.0 (compatible; FfeRoundMonitor/1.0)".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://ffe_monitor.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitoringConfig {
    pub poll_interval_secs: u64,
    pub status_port: u16,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 120,
            status_port: 3000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorConfig {
    pub scraping: ScrapingConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
}

impl MonitorConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = env::var("FFE_BASE_URL") {
            config.scraping.base_url = base_url;
        }
        if let Ok(user_agent) = env::var("MONITOR_USER_AGENT") {
            config.scraping.user_agent = user_agent;
        }
        if let Ok(timeout) = env::var("MONITOR_TIMEOUT_SECS").map_or(Ok(None), |t| t.parse::<u64>().map(Some)) {
            if let Some(timeout) = timeout {
                config.scraping.request_timeout_secs = timeout;
            }
        }
        if let Ok(database_url) = env::var("DATABASE_URL") {
            config.storage.database_url = database_url;
        }
        if let Ok(interval) = env::var("POLL_INTERVAL_SECS").map_or(Ok(None), |i| i.parse::<u64>().map(Some)) {
            if let Some(interval) = interval {
                config.monitoring.poll_interval_secs = interval;
            }
        }
        if let Ok(port) = env::var("STATUS_PORT").map_or(Ok(None), |p| p.parse::<u16>().map(Some)) {
            if let Some(port) = port {
                config.monitoring.status_port = port;
            }
        }

        config
    }
}
