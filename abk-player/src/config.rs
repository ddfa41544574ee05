//! abk-player specific configuration

use crate::error::Result;
use crate::playback::types::PlaybackSpeed;
use abk_common::config::{TomlConfig, DEFAULT_TICK_INTERVAL_MS};
use std::time::Duration;

/// Player settings derived from the bootstrap config
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    /// Speed the player starts at
    pub initial_rate: PlaybackSpeed,
    /// Transport progress cadence
    pub tick_interval: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            initial_rate: PlaybackSpeed::default(),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
        }
    }
}

impl PlayerSettings {
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        let initial_rate = PlaybackSpeed::from_factor(config.initial_rate).ok_or_else(|| {
            abk_common::Error::Config(format!(
                "initial_rate {} is not one of 1.0, 1.5, 2.0, 2.5",
                config.initial_rate
            ))
        })?;

        Ok(Self {
            initial_rate,
            tick_interval: Duration::from_millis(config.tick_interval_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_defaults_match_config_defaults() {
        let settings = PlayerSettings::from_config(&TomlConfig::default()).unwrap();
        assert_eq!(settings, PlayerSettings::default());
        assert_eq!(settings.tick_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_supported_rate() {
        let config = TomlConfig {
            initial_rate: 2.5,
            tick_interval_ms: 40,
            ..TomlConfig::default()
        };
        let settings = PlayerSettings::from_config(&config).unwrap();
        assert_eq!(settings.initial_rate, PlaybackSpeed::X2_5);
        assert_eq!(settings.tick_interval, Duration::from_millis(40));
    }

    #[test]
    fn test_unsupported_rate_rejected() {
        let config = TomlConfig {
            initial_rate: 1.25,
            ..TomlConfig::default()
        };
        assert!(matches!(
            PlayerSettings::from_config(&config),
            Err(Error::Common(abk_common::Error::Config(_)))
        ));
    }
}
