// core/src/config.rs
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const DEFAULT_BASE_URL: &str = "https://www.fitbit.com";

// Serveren svarer annerledes uten en "ekte" nettleser-agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/41.0.2228.0 Safari/537.36";

/// Innstillinger for HTTP-sesjonen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Base-URL uten avsluttende skråstrek, slik at `base + path` alltid er gyldig.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Konfig for arkiv-kjøringen (`fitdump --config fitdump.json`).
/// Flagg på kommandolinjen overstyrer verdiene fra fila.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub out_dir: Option<PathBuf>,
    /// Pause etter hver skrevne fil (høflighet mot serveren).
    pub pause_ms: Option<u64>,
    pub client: ClientConfig,
}

impl DumpConfig {
    /// Leser konfig fra disk (JSON).
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: DumpConfig = serde_json::from_str(&contents)?;
        log::info!(
            "loaded config from {} (email set={}, out_dir set={})",
            path.display(),
            config.email.is_some(),
            config.out_dir.is_some()
        );
        Ok(config)
    }
}
