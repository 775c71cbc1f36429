use std::path::PathBuf;
use std::time::Duration;

use registry_models::ReferenceStrictness;
use serde::Deserialize;

/// Deployment environment, read once from `APP_ENV` (§4.J "parse CLI args...
/// into a typed `Config`"). Determines which overlay file under `config/` is
/// merged on top of `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

impl AppEnv {
    pub fn as_str(self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Production => "production",
            AppEnv::Test => "test",
        }
    }

    pub fn from_env() -> Self {
        match std::env::var("APP_ENV").unwrap_or_default().to_lowercase().as_str() {
            "production" => AppEnv::Production,
            "test" => AppEnv::Test,
            _ => AppEnv::Development,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub journal: JournalSettings,
    #[serde(default)]
    pub core: CoreSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Window within which the Consumer Loop's last observed record must
    /// fall for `/health/live` to report alive (§4.J, §5 "Liveness vs.
    /// readiness").
    pub heartbeat_staleness_secs: u64,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn heartbeat_staleness(&self) -> Duration {
        Duration::from_secs(self.heartbeat_staleness_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

/// Which journal backend to construct (§6 "Journal topic"). `in_memory` only
/// makes sense for a single-process development node; a real deployment
/// always uses `kafka`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalBackend {
    Kafka,
    InMemory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JournalSettings {
    pub backend: JournalBackend,
    #[serde(default)]
    pub bootstrap_servers: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub consumer_group: Option<String>,
    #[serde(default = "default_producer_timeout_ms")]
    pub producer_timeout_ms: u64,
}

fn default_producer_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReferenceStrictnessSetting {
    Strict,
    AllowDangling,
}

impl From<ReferenceStrictnessSetting> for ReferenceStrictness {
    fn from(value: ReferenceStrictnessSetting) -> Self {
        match value {
            ReferenceStrictnessSetting::Strict => ReferenceStrictness::Strict,
            ReferenceStrictnessSetting::AllowDangling => ReferenceStrictness::AllowDangling,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreSettings {
    #[serde(default)]
    reference_strictness: Option<ReferenceStrictnessSetting>,
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            reference_strictness: None,
            write_timeout_secs: default_write_timeout_secs(),
        }
    }
}

impl CoreSettings {
    pub fn reference_strictness(&self) -> ReferenceStrictness {
        self.reference_strictness
            .clone()
            .map(ReferenceStrictness::from)
            .unwrap_or_default()
    }
}

fn default_write_timeout_secs() -> u64 {
    registry_core::DEFAULT_WRITE_TIMEOUT.as_secs()
}

/// Loads `config/base.{yaml,json,...}` overlaid with `config/{app_env}.*`,
/// then environment variables prefixed `REGISTRY_NODE` (double underscore as
/// the nesting separator, e.g. `REGISTRY_NODE__DATABASE__URL`), matching the
/// base-then-environment-then-env-vars layering this corpus uses elsewhere
/// (§4.J).
pub fn load_settings(config_dir: PathBuf) -> Result<Settings, config::ConfigError> {
    let app_env = AppEnv::from_env();

    let settings = config::Config::builder()
        .add_source(config::File::from(config_dir.join("base")).required(true))
        .add_source(config::File::from(config_dir.join(app_env.as_str())).required(false))
        .add_source(
            config::Environment::with_prefix("REGISTRY_NODE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
