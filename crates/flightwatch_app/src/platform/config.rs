use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::engine_info;
use flightwatch_core::TrackerConfig;
use flightwatch_engine::{SubmitSettings, TrackerSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const CONFIG_FILENAME: &str = "flightwatch.ron";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid {field} in {path:?}: {reason}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        reason: &'static str,
    },
}

/// Endpoints and timings, read from `flightwatch.ron`. Every field is
/// optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub api_base: String,
    pub cable_url: String,
    /// Value for the websocket `Origin` header, if the server checks it.
    pub origin: Option<String>,
    pub channel: String,
    pub progress_step: u8,
    pub progress_cap: u8,
    pub tick_interval_ms: u64,
    pub reconnect_delay_ms: u64,
    pub delivery_delay_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let tracker = TrackerConfig::default();
        let submit = SubmitSettings::default();
        Self {
            api_base: submit.api_base,
            cable_url: "ws://localhost:3000/cable".to_string(),
            origin: None,
            channel: tracker.channel,
            progress_step: tracker.progress_step,
            progress_cap: tracker.progress_cap,
            tick_interval_ms: millis(tracker.tick_interval),
            reconnect_delay_ms: millis(tracker.reconnect_delay),
            delivery_delay_ms: millis(tracker.delivery_delay),
            connect_timeout_ms: millis(submit.connect_timeout),
            request_timeout_ms: millis(submit.request_timeout),
        }
    }
}

impl AppConfig {
    /// Reads the config at `path`. A missing file yields the defaults.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                engine_info!("No config at {:?}; using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                field: "tick_interval_ms",
                reason: "must be greater than zero",
            });
        }
        engine_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub(crate) fn submit_settings(&self) -> SubmitSettings {
        SubmitSettings {
            api_base: self.api_base.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub(crate) fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            cable_url: self.cable_url.clone(),
            config: TrackerConfig {
                channel: self.channel.clone(),
                progress_step: self.progress_step,
                progress_cap: self.progress_cap,
                tick_interval: Duration::from_millis(self.tick_interval_ms),
                reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
                delivery_delay: Duration::from_millis(self.delivery_delay_ms),
            },
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
