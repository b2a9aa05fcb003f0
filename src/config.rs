use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);
const APP_DIR_NAME: &str = "securecheck";

/// 客户端运行配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_version: String,
    pub data_dir: PathBuf,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, data_dir: PathBuf) -> Self {
        Self {
            api_url: api_url.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            data_dir,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// 形如 `http://localhost:8000/api/v1`
    pub fn api_base(&self) -> String {
        format!(
            "{}/api/{}",
            self.api_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    /// 获取默认的应用数据目录
    pub fn default_data_dir() -> Result<PathBuf> {
        let base = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .context("Failed to resolve a data directory for this platform")?;
        Ok(base.join(APP_DIR_NAME))
    }
}
