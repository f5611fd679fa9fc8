//! Application configuration management.
//!
//! This module handles the persistent settings for takedeck: waveform analysis
//! density, the overlap applied between segments, the transport clock rate,
//! the pause policy and an optional shuffle seed. Configuration is stored in
//! the user's config directory (typically ~/.config/takedeck/config.toml).

use crate::constants::{
    DEFAULT_PIXELS_PER_RMS, DEFAULT_RMS_FRAMES_PER_SECOND, DEFAULT_TICK_INTERVAL_MS,
    OVERLAP_SECONDS,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Keys accepted by [`Config::set_value`]
pub const SETTABLE_KEYS: &[&str] = &[
    "rms_frames_per_second",
    "pixels_per_rms",
    "overlap_seconds",
    "tick_interval_ms",
    "retain_position_on_pause",
    "shuffle_seed",
    "log_level",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_rms_frames_per_second")]
    pub rms_frames_per_second: f64,
    #[serde(default = "default_pixels_per_rms")]
    pub pixels_per_rms: f64,
    #[serde(default = "default_overlap_seconds")]
    pub overlap_seconds: f64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Keep the playhead where it was on pause instead of rewinding to zero
    #[serde(default)]
    pub retain_position_on_pause: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_seed: Option<u64>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_rms_frames_per_second() -> f64 {
    DEFAULT_RMS_FRAMES_PER_SECOND
}

fn default_pixels_per_rms() -> f64 {
    DEFAULT_PIXELS_PER_RMS
}

fn default_overlap_seconds() -> f64 {
    OVERLAP_SECONDS
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_log_level() -> String {
    "debug".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            rms_frames_per_second: default_rms_frames_per_second(),
            pixels_per_rms: default_pixels_per_rms(),
            overlap_seconds: default_overlap_seconds(),
            tick_interval_ms: default_tick_interval_ms(),
            retain_position_on_pause: false,
            shuffle_seed: None,
            log_level: default_log_level(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("takedeck")
        } else {
            dirs::config_dir()
                .ok_or(ConfigError::NoConfigDir)?
                .join("takedeck")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            // Return default config instead of error
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, ConfigError> {
        Ok(Self::config_path()?.exists())
    }

    /// Parsed form of `log_level`, falling back to `Debug` for unknown names
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level
            .parse()
            .unwrap_or(log::LevelFilter::Debug)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match key {
            "rms_frames_per_second" => {
                let rate: f64 = value.parse().map_err(|_| invalid("expected a number"))?;
                if !(rate > 0.0 && rate.is_finite()) {
                    return Err(invalid("must be greater than zero"));
                }
                self.rms_frames_per_second = rate;
            }
            "pixels_per_rms" => {
                let pixels: f64 = value.parse().map_err(|_| invalid("expected a number"))?;
                if !(pixels > 0.0 && pixels.is_finite()) {
                    return Err(invalid("must be greater than zero"));
                }
                self.pixels_per_rms = pixels;
            }
            "overlap_seconds" => {
                let overlap: f64 = value.parse().map_err(|_| invalid("expected a number"))?;
                if !(0.0..1.0).contains(&overlap) {
                    return Err(invalid("must be in [0, 1)"));
                }
                self.overlap_seconds = overlap;
            }
            "tick_interval_ms" => {
                let interval: u64 = value
                    .parse()
                    .map_err(|_| invalid("expected a whole number of milliseconds"))?;
                if interval == 0 {
                    return Err(invalid("must be at least 1"));
                }
                self.tick_interval_ms = interval;
            }
            "retain_position_on_pause" => {
                self.retain_position_on_pause = value
                    .parse::<bool>()
                    .map_err(|_| invalid("value must be 'true' or 'false'"))?;
            }
            "shuffle_seed" => {
                self.shuffle_seed = match value {
                    "" | "none" => None,
                    seed => Some(seed.parse().map_err(|_| invalid("expected an integer or 'none'"))?),
                };
            }
            "log_level" => {
                value
                    .parse::<log::LevelFilter>()
                    .map_err(|_| invalid("expected off, error, warn, info, debug or trace"))?;
                self.log_level = value.to_lowercase();
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Use a mutex to ensure tests that modify environment variables don't run concurrently
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert_eq!(config.rms_frames_per_second, 15.0);
        assert_eq!(config.overlap_seconds, 0.07);
        assert_eq!(config.tick_interval_ms, 50);
        assert!(!config.retain_position_on_pause);
        assert_eq!(config.shuffle_seed, None);
    }

    #[test]
    fn test_config_default() {
        let config: Config = Default::default();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("tick_interval_ms = 20\n").unwrap();
        assert_eq!(config.tick_interval_ms, 20);
        assert_eq!(config.rms_frames_per_second, 15.0);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::new();

        config.set_value("rms_frames_per_second", "30").unwrap();
        assert_eq!(config.rms_frames_per_second, 30.0);

        config.set_value("retain_position_on_pause", "true").unwrap();
        assert!(config.retain_position_on_pause);

        config.set_value("shuffle_seed", "42").unwrap();
        assert_eq!(config.shuffle_seed, Some(42));
        config.set_value("shuffle_seed", "none").unwrap();
        assert_eq!(config.shuffle_seed, None);

        config.set_value("log_level", "WARN").unwrap();
        assert_eq!(config.log_level_filter(), log::LevelFilter::Warn);

        // Invalid values
        assert!(config.set_value("rms_frames_per_second", "0").is_err());
        assert!(config.set_value("overlap_seconds", "-0.1").is_err());
        assert!(config.set_value("tick_interval_ms", "0").is_err());
        assert!(config.set_value("retain_position_on_pause", "maybe").is_err());
        assert!(config.set_value("log_level", "loud").is_err());

        // Unknown key
        let result = config.set_value("unknown_key", "value");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn test_every_settable_key_is_accepted() {
        let mut config = Config::new();
        for key in SETTABLE_KEYS {
            let value = match *key {
                "retain_position_on_pause" => "false",
                "log_level" => "info",
                "overlap_seconds" => "0.05",
                _ => "10",
            };
            config.set_value(key, value).unwrap();
        }
    }

    #[test]
    fn test_config_save_and_load() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let mut config = Config::new();
        config.shuffle_seed = Some(7);
        config.save().unwrap();

        let config_path = Config::config_path().unwrap();
        assert!(config_path.exists());
        assert!(config_path.starts_with(temp_dir.path().join("takedeck")));

        let loaded = Config::load().unwrap();
        assert_eq!(loaded.shuffle_seed, Some(7));
        assert_eq!(loaded.tick_interval_ms, 50);

        // Clean up - restore original value if it existed
        unsafe {
            if let Some(original) = original_xdg {
                std::env::set_var("XDG_CONFIG_HOME", original);
            } else {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }
}
