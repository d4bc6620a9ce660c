//! Application configuration: API endpoints and where the cache lives.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str =
    "https://wuhan-coronavirus-api.laeyoung.endpoint.ainize.ai/jhu-edu";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub brief_url: String,
    pub latest_url: String,
    pub timeseries_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            brief_url: format!("{}/brief", DEFAULT_API_BASE),
            latest_url: format!("{}/latest", DEFAULT_API_BASE),
            timeseries_url: format!("{}/timeseries", DEFAULT_API_BASE),
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub cache_dir: PathBuf,
    /// Read-only directory with bundled cache entries used on first start.
    pub seed_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("covid-tracker");
        Self {
            api: ApiConfig::default(),
            cache_dir,
            seed_dir: None,
        }
    }
}

impl AppConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Overlay `COVID_TRACKER_*` environment variables.
    pub fn with_env(mut self) -> Self {
        if let Ok(v) = env::var("COVID_TRACKER_BRIEF_URL") {
            self.api.brief_url = v;
        }
        if let Ok(v) = env::var("COVID_TRACKER_LATEST_URL") {
            self.api.latest_url = v;
        }
        if let Ok(v) = env::var("COVID_TRACKER_TIMESERIES_URL") {
            self.api.timeseries_url = v;
        }
        if let Ok(v) = env::var("COVID_TRACKER_CACHE_DIR") {
            self.cache_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("COVID_TRACKER_SEED_DIR") {
            self.seed_dir = Some(PathBuf::from(v));
        }
        self.api.timeout_secs = env_u64("COVID_TRACKER_TIMEOUT_SECS", self.api.timeout_secs);
        self
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
