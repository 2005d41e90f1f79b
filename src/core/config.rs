//! Application-level configuration and the shared TOML loading helper.
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use bevy::prelude::*;
use serde::{de::DeserializeOwned, Deserialize};

const CONFIG_PATH: &str = "config/app.toml";
const GATE_BYPASS_ENV: &str = "INTERACTION_GATE_BYPASS";

/// Reads a TOML file into `T`, falling back to `T::default()` with a warning
/// when the file is missing or malformed.
pub fn load_toml_or_default<T>(path: impl AsRef<Path>) -> T
where
    T: DeserializeOwned + Default,
{
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(data) => match toml::from_str::<T>(&data) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(
                    "Failed to parse {} ({}). Falling back to defaults.",
                    path.display(),
                    err
                );
                T::default()
            }
        },
        Err(err) => {
            warn!(
                "Failed to read {} ({}). Falling back to defaults.",
                path.display(),
                err
            );
            T::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawAppConfig {
    #[serde(default)]
    logging: RawLoggingSection,
    #[serde(default)]
    window: RawWindowSection,
    #[serde(default)]
    gate: RawGateSection,
    #[serde(default)]
    bus: RawBusSection,
    #[serde(default)]
    mode: RawModeSection,
    #[serde(default)]
    persistence: RawPersistenceSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawLoggingSection {
    filter: String,
}

impl Default for RawLoggingSection {
    fn default() -> Self {
        Self {
            filter: "info,wgpu=error,naga=warn,interaction_core=debug".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawWindowSection {
    title: String,
}

impl Default for RawWindowSection {
    fn default() -> Self {
        Self {
            title: "Interaction Core".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGateSection {
    bypass: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawBusSection {
    history_capacity: usize,
}

impl Default for RawBusSection {
    fn default() -> Self {
        Self {
            history_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawModeSection {
    scene_transition_seconds: f32,
}

impl Default for RawModeSection {
    fn default() -> Self {
        Self {
            scene_transition_seconds: 0.6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawPersistenceSection {
    snapshot_path: String,
}

impl Default for RawPersistenceSection {
    fn default() -> Self {
        Self {
            snapshot_path: "saves/snapshot.json".to_string(),
        }
    }
}

/// Runtime application settings derived from `config/app.toml`.
#[derive(Resource, Debug, Clone)]
pub struct AppConfig {
    pub log_filter: String,
    pub window_title: String,
    pub gate_bypass: bool,
    pub bus_history_capacity: usize,
    pub scene_transition_seconds: f32,
    pub snapshot_path: PathBuf,
}

impl AppConfig {
    /// Loads the config before the logger exists, so failures go to stderr.
    pub fn load_or_default() -> Self {
        let raw = match fs::read_to_string(CONFIG_PATH) {
            Ok(data) => toml::from_str::<RawAppConfig>(&data).unwrap_or_else(|err| {
                eprintln!("Failed to parse {CONFIG_PATH} ({err}). Falling back to defaults.");
                RawAppConfig::default()
            }),
            Err(err) => {
                eprintln!("Failed to read {CONFIG_PATH} ({err}). Falling back to defaults.");
                RawAppConfig::default()
            }
        };

        let mut config = Self::from(raw);
        if env_flag(GATE_BYPASS_ENV) {
            config.gate_bypass = true;
        }
        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawAppConfig::default().into()
    }
}

impl From<RawAppConfig> for AppConfig {
    fn from(value: RawAppConfig) -> Self {
        let log_filter = if value.logging.filter.trim().is_empty() {
            RawLoggingSection::default().filter
        } else {
            value.logging.filter
        };

        Self {
            log_filter,
            window_title: value.window.title,
            gate_bypass: value.gate.bypass,
            bus_history_capacity: value.bus.history_capacity.max(1),
            scene_transition_seconds: value.mode.scene_transition_seconds.max(0.0),
            snapshot_path: PathBuf::from(value.persistence.snapshot_path),
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|value| matches!(value.trim(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert!(!config.gate_bypass);
        assert_eq!(config.bus_history_capacity, 64);
        assert!(config.log_filter.contains("interaction_core"));
        assert!(config.scene_transition_seconds > 0.0);
    }

    #[test]
    fn parses_partial_files() {
        let raw: RawAppConfig = toml::from_str(
            r#"
            [gate]
            bypass = true

            [bus]
            history_capacity = 0
            "#,
        )
        .expect("partial config should parse");
        let config = AppConfig::from(raw);

        assert!(config.gate_bypass);
        assert_eq!(config.bus_history_capacity, 1);
        assert_eq!(config.snapshot_path, PathBuf::from("saves/snapshot.json"));
    }

    #[test]
    fn missing_file_yields_default() {
        #[derive(Debug, Default, Deserialize, PartialEq)]
        struct Probe {
            value: u32,
        }

        let probe: Probe = load_toml_or_default("config/does-not-exist.toml");
        assert_eq!(probe, Probe::default());
    }
}
