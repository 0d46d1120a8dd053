use core::fmt::{Debug, Display};
use core::time::Duration;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "exam-timetable.toml";
pub const ENV_PREFIX: &str = "ETG_";

/// Used until `timetable_api_url` is configured. Requests sent here will fail
/// and surface as the generic generation error.
pub const PLACEHOLDER_TIMETABLE_API_URL: &str = "https://your-backend-api.com/generate-timetable";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub listen_address: SocketAddr,
    /// Root of the backend serving `/api/invigilators/` and `/api/venues/`.
    pub reference_data_url: String,
    /// Endpoint the upload proxy forwards generation requests to.
    pub timetable_api_url: String,
    /// Whether the active flow collects venues. Drives both the wizard steps and
    /// the proxy validation.
    pub require_venues: bool,
    pub max_upload_bytes: usize,
    /// Timetable forms untouched for this many seconds are dropped.
    pub wizard_idle_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 3000)),
            reference_data_url: "http://localhost:9000".to_owned(),
            timetable_api_url: PLACEHOLDER_TIMETABLE_API_URL.to_owned(),
            require_venues: true,
            max_upload_bytes: 20 * 1024 * 1024,
            wizard_idle_secs: 60 * 60,
        }
    }
}

impl Config {
    #[must_use]
    pub const fn wizard_idle(&self) -> Duration {
        Duration::from_secs(self.wizard_idle_secs)
    }

    #[must_use]
    pub fn uses_placeholder_api_url(&self) -> bool {
        self.timetable_api_url == PLACEHOLDER_TIMETABLE_API_URL
    }
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[must_use]
pub fn figment() -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX))
}

pub fn get_config() -> Result<Config, ConfigError> {
    Ok(figment().extract()?)
}
