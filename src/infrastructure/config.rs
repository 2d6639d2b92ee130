use crate::application::interval_resolver::DEFAULT_INTERVAL;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_SETTINGS_LIST_PATH: &str = "/settings";

/// Process-wide configuration, loaded once at startup and injected
#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    pub api: ApiSettings,
    pub polling: PollingSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Endpoint listing every backend setting
    pub settings_list_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    /// Backend setting holding the refresh period in seconds
    pub interval_key: String,
    pub default_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen: String,
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PollingSettings {
    pub fn default_interval(&self) -> Duration {
        Duration::from_millis(self.default_interval_ms)
    }
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("api.base_url", DEFAULT_BASE_URL)?
        .set_default("api.request_timeout_secs", 10)?
        .set_default("api.settings_list_path", DEFAULT_SETTINGS_LIST_PATH)?
        .set_default("polling.interval_key", "api_update_time")?
        .set_default("polling.default_interval_ms", DEFAULT_INTERVAL.as_millis() as i64)?
        .set_default("server.listen", "0.0.0.0:8080")?)
}

/// Defaults, then `config/monitor.*` if present, then `LABREI_*` variables
/// (e.g. `LABREI_API__BASE_URL`)
pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/monitor").required(false))
        .add_source(
            config::Environment::with_prefix("LABREI")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    validate(settings.try_deserialize()?)
}

fn validate(config: MonitorConfig) -> anyhow::Result<MonitorConfig> {
    if config.api.base_url.trim().is_empty() {
        anyhow::bail!("api.base_url must not be empty");
    }
    if config.api.request_timeout_secs == 0 {
        anyhow::bail!("api.request_timeout_secs must be positive");
    }
    if !config.api.settings_list_path.starts_with('/') {
        anyhow::bail!("api.settings_list_path must start with '/'");
    }
    if config.polling.default_interval_ms == 0 {
        anyhow::bail!("polling.default_interval_ms must be positive");
    }
    Ok(config)
}
