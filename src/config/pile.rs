use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::app::controller::OverlapPolicy;
use crate::domain::window::{DataWindow, IndexPolicy};

/// Prefix for environment overrides, e.g. `PILE__CAPACITY=4`
pub const ENV_PREFIX: &str = "PILE__";

/// Default config file looked up by [`PileConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "pile.toml";

/// User-facing configuration for one pile
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PileConfig {
    pub capacity: usize,
    pub initial_page: usize,
    pub index_policy: IndexPolicy,
    pub overlap_policy: OverlapPolicy,
    pub queue_limit: usize,
    pub tilt_timeout_ms: u64,
    pub card_width: u32,
    pub card_height: u32,
    /// Width of each activation zone as a fraction of the container
    pub zone_fraction: f32,
}

impl PileConfig {
    pub const DEFAULT_CAPACITY: usize = 3;
    pub const MIN_CAPACITY: usize = 1;
    pub const MAX_CAPACITY: usize = 16;
    pub const DEFAULT_QUEUE_LIMIT: usize = 4;
    pub const DEFAULT_TILT_TIMEOUT_MS: u64 = 2_000;
    pub const MIN_CARD_SIZE: u32 = 16;
    pub const MAX_CARD_SIZE: u32 = 4_096;

    pub fn tilt_timeout(&self) -> Duration {
        Duration::from_millis(self.tilt_timeout_ms)
    }

    /// Rejects values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(Self::MIN_CAPACITY..=Self::MAX_CAPACITY).contains(&self.capacity) {
            return Err(ConfigError::CapacityOutOfBounds {
                capacity: self.capacity,
                min: Self::MIN_CAPACITY,
                max: Self::MAX_CAPACITY,
            });
        }
        if !(DataWindow::FIRST_PAGE..=DataWindow::MAX_PAGE).contains(&self.initial_page) {
            return Err(ConfigError::InvalidInitialPage {
                page: self.initial_page,
                min: DataWindow::FIRST_PAGE,
                max: DataWindow::MAX_PAGE,
            });
        }
        if self.tilt_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Clamps presentational values into usable ranges
    pub fn sanitize(&mut self) {
        self.card_width = self.card_width.clamp(Self::MIN_CARD_SIZE, Self::MAX_CARD_SIZE);
        self.card_height = self.card_height.clamp(Self::MIN_CARD_SIZE, Self::MAX_CARD_SIZE);
        self.zone_fraction = if self.zone_fraction.is_finite() {
            self.zone_fraction.clamp(0.05, 0.5)
        } else {
            0.3
        };
        self.queue_limit = self.queue_limit.max(1);
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Defaults, then `path` if it exists. Does not touch the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no pile config file, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(config)
    }

    /// Applies `PILE__*` overrides from `vars`
    pub fn apply_env_overrides<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides: HashMap<String, String> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|name| (name.to_ascii_lowercase(), value))
            })
            .collect();

        for (name, value) in overrides {
            match name.as_str() {
                "capacity" => self.capacity = parse_env(&name, &value)?,
                "initial_page" => self.initial_page = parse_env(&name, &value)?,
                "index_policy" => self.index_policy = parse_env(&name, &value)?,
                "overlap_policy" => self.overlap_policy = parse_env(&name, &value)?,
                "queue_limit" => self.queue_limit = parse_env(&name, &value)?,
                "tilt_timeout_ms" => self.tilt_timeout_ms = parse_env(&name, &value)?,
                "card_width" => self.card_width = parse_env(&name, &value)?,
                "card_height" => self.card_height = parse_env(&name, &value)?,
                "zone_fraction" => self.zone_fraction = parse_env(&name, &value)?,
                _ => debug!(key = %name, "ignoring unknown pile override"),
            }
        }
        Ok(())
    }

    /// Defaults, then `pile.toml`, then the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(Path::new(DEFAULT_CONFIG_FILE))?;
        config.apply_env_overrides(std::env::vars())?;
        config.sanitize();
        config.validate()?;
        info!(
            capacity = config.capacity,
            initial_page = config.initial_page,
            index_policy = ?config.index_policy,
            overlap_policy = ?config.overlap_policy,
            "pile configuration loaded"
        );
        Ok(config)
    }
}

impl Default for PileConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            initial_page: DataWindow::FIRST_PAGE,
            index_policy: IndexPolicy::Strict,
            overlap_policy: OverlapPolicy::Queue,
            queue_limit: Self::DEFAULT_QUEUE_LIMIT,
            tilt_timeout_ms: Self::DEFAULT_TILT_TIMEOUT_MS,
            card_width: 220,
            card_height: 240,
            zone_fraction: 0.3,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pile capacity {capacity} is outside {min}..={max}")]
    CapacityOutOfBounds {
        capacity: usize,
        min: usize,
        max: usize,
    },
    #[error("initial page {page} is outside {min}..={max}")]
    InvalidInitialPage { page: usize, min: usize, max: usize },
    #[error("tilt timeout must be greater than zero")]
    ZeroTimeout,
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value {value:?} for override {key}")]
    InvalidOverride { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_are_valid() {
        let config = PileConfig::default();
        assert_eq!(config.capacity, 3);
        assert_eq!(config.initial_page, 1);
        assert_eq!(config.tilt_timeout(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let config = PileConfig::from_toml_str(
            r#"
            capacity = 5
            index_policy = "clamp"
            overlap_policy = "ignore"
            "#,
        )
        .unwrap();
        assert_eq!(config.capacity, 5);
        assert_eq!(config.index_policy, IndexPolicy::Clamp);
        assert_eq!(config.overlap_policy, OverlapPolicy::Ignore);
        assert_eq!(config.initial_page, 1);
    }

    #[test]
    fn env_overrides_win() {
        let mut config = PileConfig::default();
        config
            .apply_env_overrides(vars(&[
                ("PILE__CAPACITY", "4"),
                ("PILE__TILT_TIMEOUT_MS", "750"),
                ("PILE__OVERLAP_POLICY", "ignore"),
                ("HOME", "/root"),
            ]))
            .unwrap();
        assert_eq!(config.capacity, 4);
        assert_eq!(config.tilt_timeout_ms, 750);
        assert_eq!(config.overlap_policy, OverlapPolicy::Ignore);
    }

    #[test]
    fn malformed_env_override_is_reported() {
        let mut config = PileConfig::default();
        let err = config
            .apply_env_overrides(vars(&[("PILE__CAPACITY", "three")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = PileConfig {
            capacity: 0,
            ..PileConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CapacityOutOfBounds { .. })
        ));

        config.capacity = 3;
        config.tilt_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));

        config.tilt_timeout_ms = 10;
        config.initial_page = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInitialPage { page: 0, .. })
        ));

        config.initial_page = DataWindow::MAX_PAGE;
        assert!(config.validate().is_ok());
        config.initial_page = usize::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInitialPage { .. })
        ));
    }

    #[test]
    fn oversized_initial_page_from_env_is_rejected() {
        let mut config = PileConfig::default();
        config
            .apply_env_overrides(vars(&[("PILE__INITIAL_PAGE", "4611686018427387904")]))
            .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInitialPage { max, .. }) if max == DataWindow::MAX_PAGE
        ));
    }

    #[test]
    fn sanitize_clamps_presentation() {
        let mut config = PileConfig {
            card_width: 1,
            zone_fraction: 0.9,
            queue_limit: 0,
            ..PileConfig::default()
        };
        config.sanitize();
        assert_eq!(config.card_width, PileConfig::MIN_CARD_SIZE);
        assert_eq!(config.zone_fraction, 0.5);
        assert_eq!(config.queue_limit, 1);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("card_pile_config_that_does_not_exist.toml");
        let config = PileConfig::load_from(&path).unwrap();
        assert_eq!(config, PileConfig::default());
    }

    #[test]
    fn malformed_file_is_reported() {
        let path = std::env::temp_dir().join(format!(
            "card_pile_bad_config_{}.toml",
            std::process::id()
        ));
        fs::write(&path, "capacity = \"lots\"").unwrap();
        let result = PileConfig::load_from(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
