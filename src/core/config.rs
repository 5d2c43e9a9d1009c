//! Configuration management
//!
//! Settings are merged in order: defaults, the user's global config file,
//! a project-local `.tolstack.yaml`, then `TOLSTACK_*` environment variables.
//! CLI flags override the merged result at the call site.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::{Result, StatsError};

/// Project-local config file name
pub const LOCAL_CONFIG_FILE: &str = ".tolstack.yaml";

/// Analysis defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Monte Carlo draw count for stackups
    pub monte_carlo_draws: usize,

    /// PRNG seed; `None` seeds from the OS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Sigma multiple used by one-sided capability (3 for Ppk)
    pub sigma_multiple: f64,

    /// Significance threshold for normality and equal-variance checks
    pub normality_alpha: f64,

    /// Decimal places in text reports
    pub precision: usize,

    /// Histogram bins for terminal output
    pub histogram_bins: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monte_carlo_draws: 10_000,
            seed: None,
            sigma_multiple: 3.0,
            normality_alpha: 0.05,
            precision: 3,
            histogram_bins: 40,
        }
    }
}

/// Partial config as read from a file - absent keys leave the current value alone
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    monte_carlo_draws: Option<usize>,
    seed: Option<u64>,
    sigma_multiple: Option<f64>,
    normality_alpha: Option<f64>,
    precision: Option<usize>,
    histogram_bins: Option<usize>,
}

impl Config {
    /// Load the merged configuration
    ///
    /// Unreadable or malformed files are skipped with a warning so that a bad
    /// global file never blocks an analysis.
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Some(path) = Self::global_config_path() {
            config.merge_file(&path);
        }
        config.merge_file(Path::new(LOCAL_CONFIG_FILE));
        config.merge_env(|key| std::env::var(key).ok());

        config
    }

    /// Location of the user's global config file
    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tolstack").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Parse a complete config from YAML, validating the result
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut config = Config::default();
        let layer: ConfigLayer = serde_yml::from_str(content)?;
        config.apply(layer);
        config.validate()?;
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        let layer = std::fs::read_to_string(path)
            .map_err(StatsError::from)
            .and_then(|content| serde_yml::from_str::<ConfigLayer>(&content).map_err(StatsError::from));
        match layer {
            Ok(layer) => {
                tracing::debug!("merging config from {}", path.display());
                self.apply(layer);
            }
            Err(e) => tracing::warn!("ignoring config file {}: {}", path.display(), e),
        }
    }

    /// Apply `TOLSTACK_SEED`, `TOLSTACK_DRAWS` and `TOLSTACK_ALPHA`
    pub fn merge_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = lookup("TOLSTACK_SEED").and_then(|v| v.trim().parse().ok()) {
            self.seed = Some(seed);
        }
        if let Some(draws) = lookup("TOLSTACK_DRAWS").and_then(|v| v.trim().parse().ok()) {
            self.monte_carlo_draws = draws;
        }
        if let Some(alpha) = lookup("TOLSTACK_ALPHA").and_then(|v| v.trim().parse().ok()) {
            self.normality_alpha = alpha;
        }
    }

    fn apply(&mut self, layer: ConfigLayer) {
        if let Some(v) = layer.monte_carlo_draws {
            self.monte_carlo_draws = v;
        }
        if layer.seed.is_some() {
            self.seed = layer.seed;
        }
        if let Some(v) = layer.sigma_multiple {
            self.sigma_multiple = v;
        }
        if let Some(v) = layer.normality_alpha {
            self.normality_alpha = v;
        }
        if let Some(v) = layer.precision {
            self.precision = v;
        }
        if let Some(v) = layer.histogram_bins {
            self.histogram_bins = v;
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.monte_carlo_draws == 0 {
            return Err(StatsError::config("monte_carlo_draws must be at least 1"));
        }
        if !(self.sigma_multiple > 0.0) {
            return Err(StatsError::config("sigma_multiple must be strictly positive"));
        }
        if !(self.normality_alpha > 0.0 && self.normality_alpha < 1.0) {
            return Err(StatsError::config("normality_alpha must be in (0, 1)"));
        }
        if self.histogram_bins == 0 {
            return Err(StatsError::config("histogram_bins must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.monte_carlo_draws, 10_000);
        assert_eq!(config.seed, None);
        assert_eq!(config.sigma_multiple, 3.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml_str("seed: 42\nprecision: 4\n").unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.precision, 4);
        assert_eq!(config.monte_carlo_draws, 10_000);
    }

    #[test]
    fn test_invalid_yaml_values_rejected() {
        let err = Config::from_yaml_str("monte_carlo_draws: 0\n").unwrap_err();
        assert!(err.is_configuration());

        let err = Config::from_yaml_str("normality_alpha: 1.5\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.merge_env(|key| match key {
            "TOLSTACK_SEED" => Some("7".to_string()),
            "TOLSTACK_DRAWS" => Some(" 500 ".to_string()),
            "TOLSTACK_ALPHA" => Some("not-a-number".to_string()),
            _ => None,
        });
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.monte_carlo_draws, 500);
        assert_eq!(config.normality_alpha, 0.05);
    }
}
