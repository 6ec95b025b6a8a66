//! Simulator configuration, deserializable from JSON, with defaults tuned
//! to the reference vector-add program.

use serde::Deserialize;
use thiserror::Error;

/// Baseline configuration constants used when no override is supplied.
mod defaults {
    /// Main RAM size (64 KiB); large enough for the reference program's
    /// instruction image plus its input/output arrays.
    pub const RAM_SIZE: usize = 64 * 1024;

    /// Cycle cap beyond which the driver declares non-completion.
    pub const CYCLE_CAP: u64 = 1_000_000;
}

/// Errors that can occur while loading a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Simulation parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Size in bytes of the simulated RAM.
    pub ram_size: usize,
    /// Cycle count beyond which the driver gives up waiting for completion.
    pub cycle_cap: u64,
    /// Whether to print a per-cycle five-stage trace.
    pub trace: bool,
    /// Overrides the termination-sentinel address (the program's `J done`
    /// slot) otherwise computed from the loaded program's length.
    pub done_pc: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ram_size: defaults::RAM_SIZE,
            cycle_cap: defaults::CYCLE_CAP,
            trace: false,
            done_pc: None,
        }
    }
}

impl Config {
    /// Loads a configuration from a JSON file, falling back to `Default`
    /// for any field the file omits.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
