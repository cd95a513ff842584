// SPDX-License-Identifier: MPL-2.0
//! This module handles the player's configuration, including loading and saving
//! engine tuning values to a `settings.toml` file.
//!
//! Every field is optional; absent values resolve to the defaults in
//! [`defaults`], and out-of-range values are clamped by the domain newtypes.
//!
//! # Examples
//!
//! ```no_run
//! use tickplay::config::{self, Config};
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.tick_rate_hz = Some(30);
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//!
//! // To load/save from a specific path (e.g., for testing)
//! let temp_dir = tempfile::tempdir().unwrap();
//! let temp_file = temp_dir.path().join("test_settings.toml");
//! config::save_to_path(&config, &temp_file).expect("Failed to save to path");
//! let loaded_config = config::load_from_path(&temp_file).expect("Failed to load from path");
//! assert_eq!(loaded_config.tick_rate(), config.tick_rate());
//! ```

pub mod defaults;

pub use defaults::*;

use crate::domain::diagnostics::BufferCapacity;
use crate::domain::video::{AudioQueueDepth, FrameQueueDepth, TickRate};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "tickplay";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub frame_queue_capacity: Option<usize>,
    #[serde(default)]
    pub audio_queue_capacity: Option<usize>,
    #[serde(default)]
    pub diagnostics_buffer_capacity: Option<usize>,
    #[serde(default)]
    pub tick_rate_hz: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_queue_capacity: Some(DEFAULT_FRAME_QUEUE_CAPACITY),
            audio_queue_capacity: Some(DEFAULT_AUDIO_QUEUE_CAPACITY),
            diagnostics_buffer_capacity: Some(DEFAULT_DIAGNOSTICS_BUFFER_CAPACITY),
            tick_rate_hz: Some(DEFAULT_TICK_RATE_HZ),
        }
    }
}

impl Config {
    #[must_use]
    pub fn frame_queue_depth(&self) -> FrameQueueDepth {
        self.frame_queue_capacity
            .map_or_else(FrameQueueDepth::default, FrameQueueDepth::new)
    }

    #[must_use]
    pub fn audio_queue_depth(&self) -> AudioQueueDepth {
        self.audio_queue_capacity
            .map_or_else(AudioQueueDepth::default, AudioQueueDepth::new)
    }

    #[must_use]
    pub fn diagnostics_capacity(&self) -> BufferCapacity {
        self.diagnostics_buffer_capacity
            .map_or_else(BufferCapacity::default, BufferCapacity::new)
    }

    #[must_use]
    pub fn tick_rate(&self) -> TickRate {
        self.tick_rate_hz.map_or_else(TickRate::default, TickRate::new)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads the configuration from the platform config directory.
///
/// # Errors
///
/// Returns an error if the settings file exists but cannot be read.
pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

/// Saves the configuration to the platform config directory.
///
/// # Errors
///
/// Returns an error if the file cannot be serialized or written.
pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Reads a settings file; unparsable content falls back to defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content).unwrap_or_else(|e| {
        log::warn!("ignoring invalid settings in {}: {}", path.display(), e);
        Config::default()
    }))
}

/// # Errors
///
/// Returns an error if the file cannot be serialized or written.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_tuning() {
        let config = Config {
            frame_queue_capacity: Some(8),
            audio_queue_capacity: Some(32),
            diagnostics_buffer_capacity: Some(512),
            tick_rate_hz: Some(30),
        };
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn load_from_path_returns_default_on_invalid_toml() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "not = valid = toml").expect("failed to write invalid toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn missing_fields_resolve_to_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "tick_rate_hz = 24\n").expect("failed to write toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded.tick_rate().hz(), 24);
        assert_eq!(loaded.frame_queue_capacity, None);
        assert_eq!(loaded.frame_queue_depth().value(), DEFAULT_FRAME_QUEUE_CAPACITY);
        assert_eq!(
            loaded.diagnostics_capacity().value(),
            DEFAULT_DIAGNOSTICS_BUFFER_CAPACITY
        );
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = Config {
            frame_queue_capacity: Some(0),
            audio_queue_capacity: Some(1_000_000),
            diagnostics_buffer_capacity: Some(1),
            tick_rate_hz: Some(10_000),
        };

        assert_eq!(config.frame_queue_depth().value(), MIN_FRAME_QUEUE_CAPACITY);
        assert_eq!(config.audio_queue_depth().value(), MAX_AUDIO_QUEUE_CAPACITY);
        assert_eq!(
            config.diagnostics_capacity().value(),
            MIN_DIAGNOSTICS_BUFFER_CAPACITY
        );
        assert_eq!(config.tick_rate().hz(), MAX_TICK_RATE_HZ);
    }

    #[test]
    fn save_to_path_creates_parent_directories() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("deep").join("path").join("settings.toml");

        save_to_path(&Config::default(), &config_path).expect("save should create directories");
        assert!(config_path.exists());
    }
}
