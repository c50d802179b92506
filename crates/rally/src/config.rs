//! Configuration file loading for rally.
//!
//! This module provides types and functions for loading league settings
//! from TOML files.

use rally_core::DEFAULT_SEED_RATING;
use rally_engine::elo::{K_FACTOR, RATING_SCALE};
use rally_engine::{
    LeagueSettings, RatingParams, RatingUpdater, ReversalPolicy, TeamBalancer, TiePolicy,
    ValueEstimator,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// A numeric setting is outside its usable range.
    #[error("Invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

/// How tied scores are settled.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieRule {
    /// A tie counts as a team B win.
    #[default]
    FavorTeamB,
    /// A tie is a draw for both teams.
    Draw,
}

impl From<TieRule> for TiePolicy {
    fn from(rule: TieRule) -> Self {
        match rule {
            TieRule::FavorTeamB => TiePolicy::FavorTeamB,
            TieRule::Draw => TiePolicy::Draw,
        }
    }
}

/// How deleting a match rewrites rating histories.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReversalRule {
    /// Append the corrected rating.
    #[default]
    AppendCorrection,
    /// Drop the newest history entry.
    Truncate,
}

impl From<ReversalRule> for ReversalPolicy {
    fn from(rule: ReversalRule) -> Self {
        match rule {
            ReversalRule::AppendCorrection => ReversalPolicy::AppendCorrection,
            ReversalRule::Truncate => ReversalPolicy::Truncate,
        }
    }
}

/// Main rally configuration structure.
///
/// Uses `rally.toml` in the current directory by default. Every field has a
/// default, so an empty file is a valid configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RallyConfig {
    /// Path of the SQLite database.
    pub database: PathBuf,
    /// League the store is scoped to.
    pub league: String,
    /// Sport the store is scoped to.
    pub sport: String,
    /// Rating given to a participant on first appearance.
    pub seed_rating: f64,
    pub k_factor: f64,
    /// Logistic scale of the expected score.
    pub scale: f64,
    /// Ratings that make up recent form in the value estimate.
    pub value_window: usize,
    /// Gap below which squad balancing stops swapping.
    pub max_diff: f64,
    /// Upper bound on balancing swaps.
    pub max_swaps: u32,
    pub tie_policy: TieRule,
    pub reversal_policy: ReversalRule,
}

impl Default for RallyConfig {
    fn default() -> Self {
        RallyConfig {
            database: PathBuf::from("data/rally.db"),
            league: "default".to_string(),
            sport: "beachvolley".to_string(),
            seed_rating: DEFAULT_SEED_RATING,
            k_factor: K_FACTOR,
            scale: RATING_SCALE,
            value_window: 3,
            max_diff: 1.0,
            max_swaps: 10,
            tie_policy: TieRule::default(),
            reversal_policy: ReversalRule::default(),
        }
    }
}

impl RallyConfig {
    /// Loads the configuration from [`Self::config_path()`].
    ///
    /// Returns the default configuration if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// [`ConfigError::ParseError`] if it is not valid TOML, and
    /// [`ConfigError::InvalidSetting`] if a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    /// Loads the configuration from `path`, with the same fallback as [`Self::load`].
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::parse(&content)?
        } else {
            tracing::debug!("no config at {}, using defaults", path.display());
            Self::default()
        };
        Ok(config)
    }

    /// Parses and validates TOML content.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: RallyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the path to the configuration file.
    ///
    /// Currently returns `rally.toml` in the current working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("rally.toml")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("seed_rating", self.seed_rating),
            ("k_factor", self.k_factor),
            ("scale", self.scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidSetting {
                    name,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        if self.value_window == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "value_window",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.max_diff.is_finite() && self.max_diff >= 0.0) {
            return Err(ConfigError::InvalidSetting {
                name: "max_diff",
                reason: format!("must not be negative, got {}", self.max_diff),
            });
        }
        Ok(())
    }

    /// Builds the engine settings described by this configuration.
    pub fn settings(&self) -> LeagueSettings {
        let updater = RatingUpdater::new(RatingParams {
            k_factor: self.k_factor,
            scale: self.scale,
        })
        .with_tie_policy(self.tie_policy.into())
        .with_reversal_policy(self.reversal_policy.into());

        LeagueSettings {
            seed_rating: self.seed_rating,
            updater,
            estimator: ValueEstimator::new(self.value_window),
            balancer: TeamBalancer::new(self.max_diff, self.max_swaps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
database = "/var/lib/rally/league.db"
league = "friday-night"
sport = "footvolley"
seed_rating = 1500.0
k_factor = 24.0
scale = 400.0
value_window = 5
max_diff = 0.5
max_swaps = 20
tie_policy = "draw"
reversal_policy = "truncate"
"#;

        let config = RallyConfig::parse(toml_content).unwrap();

        assert_eq!(config.database, PathBuf::from("/var/lib/rally/league.db"));
        assert_eq!(config.league, "friday-night");
        assert_eq!(config.sport, "footvolley");
        assert_eq!(config.seed_rating, 1500.0);
        assert_eq!(config.k_factor, 24.0);
        assert_eq!(config.value_window, 5);
        assert_eq!(config.max_diff, 0.5);
        assert_eq!(config.max_swaps, 20);
        assert_eq!(config.tie_policy, TieRule::Draw);
        assert_eq!(config.reversal_policy, ReversalRule::Truncate);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = RallyConfig::parse("").unwrap();
        assert_eq!(config, RallyConfig::default());
        assert_eq!(config.database, PathBuf::from("data/rally.db"));
        assert_eq!(config.seed_rating, 100.0);
        assert_eq!(config.k_factor, 32.0);
        assert_eq!(config.value_window, 3);
        assert_eq!(config.max_swaps, 10);
        assert_eq!(config.tie_policy, TieRule::FavorTeamB);
        assert_eq!(config.reversal_policy, ReversalRule::AppendCorrection);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = RallyConfig::parse("league = \"tuesday\"\nmax_swaps = 3\n").unwrap();
        assert_eq!(config.league, "tuesday");
        assert_eq!(config.max_swaps, 3);
        assert_eq!(config.sport, "beachvolley");
        assert_eq!(config.scale, 400.0);
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        let result = RallyConfig::parse("tie_policy = \"coin_flip\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_non_positive_k_factor_rejected() {
        match RallyConfig::parse("k_factor = 0.0\n") {
            Err(ConfigError::InvalidSetting { name, .. }) => assert_eq!(name, "k_factor"),
            other => panic!("Expected InvalidSetting error, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_max_diff_rejected() {
        assert!(matches!(
            RallyConfig::parse("max_diff = -1.0\n"),
            Err(ConfigError::InvalidSetting {
                name: "max_diff",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_value_window_rejected() {
        assert!(matches!(
            RallyConfig::parse("value_window = 0\n"),
            Err(ConfigError::InvalidSetting {
                name: "value_window",
                ..
            })
        ));
    }

    #[test]
    fn test_settings_carry_policies() {
        let config = RallyConfig::parse(
            "tie_policy = \"draw\"\nreversal_policy = \"truncate\"\nvalue_window = 4\nmax_swaps = 2\n",
        )
        .unwrap();
        let settings = config.settings();

        assert_eq!(settings.updater.tie_policy(), TiePolicy::Draw);
        assert_eq!(settings.updater.reversal_policy(), ReversalPolicy::Truncate);
        assert_eq!(settings.updater.params().k_factor, 32.0);
        assert_eq!(settings.estimator.window(), 4);
        assert_eq!(settings.balancer.max_swaps(), 2);
        assert_eq!(settings.seed_rating, 100.0);
    }

    #[test]
    fn test_config_path_returns_expected_path() {
        assert_eq!(RallyConfig::config_path(), PathBuf::from("rally.toml"));
    }

    #[test]
    fn test_load_from_missing_file_returns_default() {
        let config = RallyConfig::load_from("/nonexistent/rally.toml").unwrap();
        assert_eq!(config, RallyConfig::default());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = RallyConfig {
            league: "sunday".to_string(),
            tie_policy: TieRule::Draw,
            ..RallyConfig::default()
        };
        let serialized = toml::to_string(&config).unwrap();
        let deserialized = RallyConfig::parse(&serialized).unwrap();
        assert_eq!(deserialized, config);
    }
}
