use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub listen_addr: String,
    pub telegram_bot_token: Option<String>,
    pub telegram_api_base: String,
    pub evaluation_interval_secs: u64,
    pub notifier_timeout_secs: u64,
    pub default_timeout_secs: i32,
    pub default_re_alert_interval_secs: i32,
    pub notification_log_limit: u64,
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    listen_addr: Option<String>,
    port: Option<u16>,
    telegram_bot_token: Option<String>,
    telegram_api_base: Option<String>,
    evaluation_interval_secs: Option<u64>,
    notifier_timeout_secs: Option<u64>,
    default_timeout_secs: Option<i32>,
    default_re_alert_interval_secs: Option<i32>,
    notification_log_limit: Option<u64>,
    log_dir: Option<String>,
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            listen_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            telegram_bot_token: None,
            telegram_api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            evaluation_interval_secs: 10,
            notifier_timeout_secs: 10,
            default_timeout_secs: 60,
            default_re_alert_interval_secs: 300,
            notification_log_limit: 100,
            log_dir: "logs".to_string(),
        }
    }
}

impl ServerConfig {
    /// Layers `.env`, an optional TOML file and the process environment; the environment wins.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let contents = fs::read_to_string(path_str).map_err(|source| ConfigError::Read {
                    path: path_str.to_string(),
                    source,
                })?;
                parse_toml(&contents).map_err(|source| ConfigError::Parse {
                    path: path_str.to_string(),
                    source,
                })?
            }
            _ => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env()?;

        // 3. Merge: environment overrides file
        Self::merge(env_config, file_config)
    }

    fn merge(env: PartialServerConfig, file: PartialServerConfig) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let port = env.port.or(file.port).unwrap_or(DEFAULT_PORT);
        let config = ServerConfig {
            database_url: env
                .database_url
                .or(file.database_url)
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            listen_addr: env
                .listen_addr
                .or(file.listen_addr)
                .unwrap_or_else(|| format!("0.0.0.0:{port}")),
            telegram_bot_token: env
                .telegram_bot_token
                .or(file.telegram_bot_token)
                .filter(|token| !token.trim().is_empty()),
            telegram_api_base: env
                .telegram_api_base
                .or(file.telegram_api_base)
                .unwrap_or(defaults.telegram_api_base),
            evaluation_interval_secs: env
                .evaluation_interval_secs
                .or(file.evaluation_interval_secs)
                .unwrap_or(defaults.evaluation_interval_secs),
            notifier_timeout_secs: env
                .notifier_timeout_secs
                .or(file.notifier_timeout_secs)
                .unwrap_or(defaults.notifier_timeout_secs),
            default_timeout_secs: env
                .default_timeout_secs
                .or(file.default_timeout_secs)
                .unwrap_or(defaults.default_timeout_secs),
            default_re_alert_interval_secs: env
                .default_re_alert_interval_secs
                .or(file.default_re_alert_interval_secs)
                .unwrap_or(defaults.default_re_alert_interval_secs),
            notification_log_limit: env
                .notification_log_limit
                .or(file.notification_log_limit)
                .unwrap_or(defaults.notification_log_limit),
            log_dir: env.log_dir.or(file.log_dir).unwrap_or(defaults.log_dir),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluation_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "evaluation_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.notifier_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "notifier_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.default_timeout_secs <= 0 || self.default_re_alert_interval_secs <= 0 {
            return Err(ConfigError::Invalid(
                "default heartbeat timeout and re-alert interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_toml(contents: &str) -> Result<PartialServerConfig, toml::de::Error> {
    toml::from_str(contents)
}
