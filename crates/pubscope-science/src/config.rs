use std::path::Path;
use std::time::Duration;

use pubscope_core::AppConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScienceError};

/// Provider endpoints and credentials, read from the `[science]` table of the
/// shared config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScienceConfig {
    pub ads_api_key: Option<String>,
    /// Crossref OpenURL account id (usually an e-mail address).
    pub crossref_pid: Option<String>,
    pub ads_base_url: String,
    pub crossref_base_url: String,
    pub arxiv_base_url: String,
    pub user_agent: String,
    pub min_interval_ms: u64,
    pub max_retries: u32,
}

impl Default for ScienceConfig {
    fn default() -> Self {
        Self {
            ads_api_key: None,
            crossref_pid: None,
            ads_base_url: "https://api.adsabs.harvard.edu/v1".to_string(),
            crossref_base_url: "https://doi.crossref.org/openurl".to_string(),
            arxiv_base_url: "http://export.arxiv.org/api/query".to_string(),
            user_agent: format!("pubscope/{}", env!("CARGO_PKG_VERSION")),
            min_interval_ms: 500,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    science: ScienceConfig,
}

impl ScienceConfig {
    /// Load from the standard config file, then apply the
    /// `PUBSCOPE_ADS_API_KEY` / `PUBSCOPE_CROSSREF_PID` overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&AppConfig::config_path())?;
        if let Ok(key) = std::env::var("PUBSCOPE_ADS_API_KEY") {
            config.ads_api_key = Some(key);
        }
        if let Ok(pid) = std::env::var("PUBSCOPE_CROSSREF_PID") {
            config.crossref_pid = Some(pid);
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ScienceError::Config(format!("{}: {e}", path.display())))?;
        let file: ConfigFile = toml::from_str(&contents)
            .map_err(|e| ScienceError::Config(format!("{}: {e}", path.display())))?;
        Ok(file.science)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}
