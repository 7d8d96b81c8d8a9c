use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default gap between automatic scans
const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Default total timeout for a single feed fetch. Kept low so one slow
/// origin cannot stall a whole scan.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            _ => Self::Dev,
        }
    }

    /// Returns the default data path for this environment
    pub fn default_data_path(&self) -> PathBuf {
        match self {
            Self::Dev => PathBuf::from("./data"),
            Self::Prod => PathBuf::from("/data"),
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub env: Environment,
    pub data_path: PathBuf,
    pub database_url: String,
    pub max_connections: u32,
    /// Gap between automatic scans
    pub scan_interval: Duration,
    /// Total timeout applied to each feed fetch
    pub fetch_timeout: Duration,
    /// Proxy for outbound feed fetches, if configured in the environment
    pub proxy_url: Option<String>,
}

impl Config {
    pub fn new(env: Environment, data_path: impl AsRef<Path>) -> Self {
        let data_path = data_path.as_ref().to_path_buf();
        let database_url = format!(
            "sqlite:{}?mode=rwc",
            data_path.join("feedwatch.db").display()
        );
        Self {
            env,
            data_path,
            database_url,
            max_connections: 5,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            proxy_url: None,
        }
    }

    /// Build a config from process environment variables.
    pub fn from_env() -> Self {
        let env = Environment::from_str(&std::env::var("APP_ENV").unwrap_or_default());
        let data_path = std::env::var("DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env.default_data_path());

        let mut config = Self::new(env, data_path);

        if let Some(minutes) = env_number("SCAN_INTERVAL_MINUTES") {
            config.scan_interval = Duration::from_secs(minutes * 60);
        }
        if let Some(seconds) = env_number("FEED_FETCH_TIMEOUT_SECS") {
            config.fetch_timeout = Duration::from_secs(seconds);
        }

        config.proxy_url = std::env::var("HTTPS_PROXY")
            .or_else(|_| std::env::var("HTTP_PROXY"))
            .ok()
            .filter(|url| !url.is_empty());

        config
    }
}

fn env_number(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.parse().ok().filter(|n| *n > 0)
}
