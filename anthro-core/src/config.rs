//! Configuration file support for Anthro
//!
//! Loads deployment-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.anthrorc.json` in the working directory
//! 3. `anthro.config.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::classification::ClassificationThresholds;
use crate::growth_curve::STANDARD_PERCENTILES;
use crate::requirements::{ActivityFactors, EnergySettings, FeedingFactors};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Anthro configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnthroConfig {
    /// Directory holding `{indicator}_{sex}.json` reference tables
    #[serde(default)]
    pub tables_dir: Option<PathBuf>,

    /// Z-score cut points
    #[serde(default)]
    pub thresholds: Option<ThresholdConfig>,

    /// Energy requirement multipliers
    #[serde(default)]
    pub energy: Option<EnergyConfig>,

    /// Percentiles drawn by `curve` (default: 3, 15, 50, 85, 97)
    #[serde(default)]
    pub percentiles: Option<Vec<f64>>,

    /// Keep every n-th table row when sampling curves (default: 1)
    #[serde(default)]
    pub stride: Option<usize>,
}

/// Z-score cut points, applied symmetrically around zero
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Outer edge of the normal band (default: 1.0)
    pub risk: Option<f64>,
    /// Outer edge of the risk band (default: 2.0)
    pub moderate: Option<f64>,
    /// Outer edge of the moderate band (default: 3.0)
    pub severe: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnergyConfig {
    /// Ages below this use the infant per-kg baseline (default: 365)
    pub infant_threshold_days: Option<i64>,
    pub activity: Option<ActivityConfig>,
    pub feeding: Option<FeedingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityConfig {
    /// (default: 1.4)
    pub light: Option<f64>,
    /// (default: 1.6)
    pub moderate: Option<f64>,
    /// (default: 1.8)
    pub vigorous: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedingConfig {
    /// (default: 0.96)
    pub breast: Option<f64>,
    /// (default: 1.04)
    pub formula: Option<f64>,
    /// (default: 1.0)
    pub mixed: Option<f64>,
}

/// Resolved configuration with defaults filled in
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub tables_dir: Option<PathBuf>,
    pub thresholds: ClassificationThresholds,
    pub energy: EnergySettings,
    pub percentiles: Vec<f64>,
    pub stride: usize,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ResolvedConfig {
            tables_dir: None,
            thresholds: ClassificationThresholds::default(),
            energy: EnergySettings::default(),
            percentiles: STANDARD_PERCENTILES.to_vec(),
            stride: 1,
            config_path: None,
        }
    }
}

fn positive_multiplier(name: &str, value: Option<f64>) -> Result<()> {
    if let Some(v) = value {
        if !v.is_finite() || v <= 0.0 {
            anyhow::bail!("{} must be positive (got {})", name, v);
        }
        if v > 3.0 {
            anyhow::bail!("{} must be at most 3.0 (got {})", name, v);
        }
    }
    Ok(())
}

impl AnthroConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        // Cut points must be positive and strictly ordered
        if let Some(ref t) = self.thresholds {
            let defaults = ClassificationThresholds::default();
            let risk = t.risk.unwrap_or(defaults.risk);
            let moderate = t.moderate.unwrap_or(defaults.moderate);
            let severe = t.severe.unwrap_or(defaults.severe);

            for (name, v) in [("risk", risk), ("moderate", moderate), ("severe", severe)] {
                if !v.is_finite() || v <= 0.0 {
                    anyhow::bail!("thresholds.{} must be positive (got {})", name, v);
                }
            }
            if risk >= moderate {
                anyhow::bail!(
                    "thresholds.risk ({}) must be less than thresholds.moderate ({})",
                    risk,
                    moderate
                );
            }
            if moderate >= severe {
                anyhow::bail!(
                    "thresholds.moderate ({}) must be less than thresholds.severe ({})",
                    moderate,
                    severe
                );
            }
        }

        if let Some(ref e) = self.energy {
            if let Some(days) = e.infant_threshold_days {
                if days < 0 {
                    anyhow::bail!(
                        "energy.infant_threshold_days must be non-negative (got {})",
                        days
                    );
                }
            }
            if let Some(ref a) = e.activity {
                positive_multiplier("energy.activity.light", a.light)?;
                positive_multiplier("energy.activity.moderate", a.moderate)?;
                positive_multiplier("energy.activity.vigorous", a.vigorous)?;
            }
            if let Some(ref f) = e.feeding {
                positive_multiplier("energy.feeding.breast", f.breast)?;
                positive_multiplier("energy.feeding.formula", f.formula)?;
                positive_multiplier("energy.feeding.mixed", f.mixed)?;
            }
        }

        if let Some(ref percentiles) = self.percentiles {
            if percentiles.is_empty() {
                anyhow::bail!("percentiles must not be empty");
            }
            for p in percentiles {
                if !(*p > 0.0 && *p < 100.0) {
                    anyhow::bail!("percentiles must lie strictly between 0 and 100 (got {})", p);
                }
            }
        }

        if self.stride == Some(0) {
            anyhow::bail!("stride must be at least 1");
        }

        Ok(())
    }

    /// Resolve config into its final form with defaults applied
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;
        let defaults = ResolvedConfig::default();

        let thresholds = match &self.thresholds {
            Some(t) => ClassificationThresholds {
                risk: t.risk.unwrap_or(defaults.thresholds.risk),
                moderate: t.moderate.unwrap_or(defaults.thresholds.moderate),
                severe: t.severe.unwrap_or(defaults.thresholds.severe),
            },
            None => defaults.thresholds,
        };

        let energy = match &self.energy {
            Some(e) => {
                let base = defaults.energy;
                let activity = match &e.activity {
                    Some(a) => ActivityFactors {
                        light: a.light.unwrap_or(base.activity.light),
                        moderate: a.moderate.unwrap_or(base.activity.moderate),
                        vigorous: a.vigorous.unwrap_or(base.activity.vigorous),
                    },
                    None => base.activity,
                };
                let feeding = match &e.feeding {
                    Some(f) => FeedingFactors {
                        breast: f.breast.unwrap_or(base.feeding.breast),
                        formula: f.formula.unwrap_or(base.feeding.formula),
                        mixed: f.mixed.unwrap_or(base.feeding.mixed),
                    },
                    None => base.feeding,
                };
                EnergySettings {
                    infant_threshold_days: e
                        .infant_threshold_days
                        .unwrap_or(base.infant_threshold_days),
                    activity,
                    feeding,
                }
            }
            None => defaults.energy,
        };

        Ok(ResolvedConfig {
            tables_dir: self.tables_dir.clone(),
            thresholds,
            energy,
            percentiles: self.percentiles.clone().unwrap_or(defaults.percentiles),
            stride: self.stride.unwrap_or(defaults.stride),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Self {
        ResolvedConfig::default()
    }
}

/// Discover and load a config file from a directory
///
/// Search order:
/// 1. `.anthrorc.json`
/// 2. `anthro.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(root: &Path) -> Result<Option<(AnthroConfig, PathBuf)>> {
    for name in [".anthrorc.json", "anthro.config.json"] {
        let path = root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<AnthroConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: AnthroConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config in `root`.
/// Returns default config if nothing is found.
/// A relative `tables_dir` is taken relative to the config file.
pub fn load_and_resolve(root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(root)? {
            Some((config, path)) => (config, Some(path)),
            None => (AnthroConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    if let (Some(dir), Some(source)) = (&resolved.tables_dir, &source_path) {
        if dir.is_relative() {
            if let Some(parent) = source.parent() {
                resolved.tables_dir = Some(parent.join(dir));
            }
        }
    }
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnthroConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert!(resolved.tables_dir.is_none());
        assert_eq!(resolved.thresholds, ClassificationThresholds::default());
        assert_eq!(resolved.energy, EnergySettings::default());
        assert_eq!(resolved.percentiles, vec![3.0, 15.0, 50.0, 85.0, 97.0]);
        assert_eq!(resolved.stride, 1);
    }

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{}"#;
        let config: AnthroConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "tables_dir": "/srv/who",
            "thresholds": {"risk": 1.5, "moderate": 2.5, "severe": 3.5},
            "energy": {
                "infant_threshold_days": 180,
                "activity": {"light": 1.3},
                "feeding": {"breast": 0.9, "formula": 1.1}
            },
            "percentiles": [5, 50, 95],
            "stride": 2
        }"#;
        let config: AnthroConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.tables_dir, Some(PathBuf::from("/srv/who")));
        assert_eq!(resolved.thresholds.risk, 1.5);
        assert_eq!(resolved.thresholds.severe, 3.5);
        assert_eq!(resolved.energy.infant_threshold_days, 180);
        assert_eq!(resolved.energy.activity.light, 1.3);
        assert_eq!(resolved.energy.activity.moderate, 1.6);
        assert_eq!(resolved.energy.feeding.breast, 0.9);
        assert_eq!(resolved.energy.feeding.mixed, 1.0);
        assert_eq!(resolved.percentiles, vec![5.0, 50.0, 95.0]);
        assert_eq!(resolved.stride, 2);
    }

    #[test]
    fn test_reject_unknown_fields() {
        let json = r#"{"unknown_field": true}"#;
        let result: Result<AnthroConfig, _> = serde_json::from_str(json);
        assert!(result.is_err(), "unknown fields should be rejected");
    }

    #[test]
    fn test_reject_negative_threshold() {
        let json = r#"{"thresholds": {"risk": -1.0}}"#;
        let config: AnthroConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_unordered_thresholds() {
        let json = r#"{"thresholds": {"risk": 2.0, "moderate": 1.5, "severe": 3.0}}"#;
        let config: AnthroConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_bad_multiplier() {
        let json = r#"{"energy": {"activity": {"vigorous": 0.0}}}"#;
        let config: AnthroConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());

        let json = r#"{"energy": {"feeding": {"breast": 4.0}}}"#;
        let config: AnthroConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_bad_percentiles_and_stride() {
        for json in [
            r#"{"percentiles": []}"#,
            r#"{"percentiles": [0, 50]}"#,
            r#"{"percentiles": [50, 100]}"#,
            r#"{"stride": 0}"#,
        ] {
            let config: AnthroConfig = serde_json::from_str(json).unwrap();
            assert!(config.validate().is_err(), "{} should be rejected", json);
        }
    }

    #[test]
    fn test_discover_anthrorc() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".anthrorc.json");
        fs::write(&config_path, r#"{"stride": 5}"#).unwrap();

        let result = discover_config(dir.path()).unwrap();
        assert!(result.is_some());
        let (config, path) = result.unwrap();
        assert_eq!(config.stride, Some(5));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_anthro_config_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("anthro.config.json"),
            r#"{"percentiles": [10, 90]}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.percentiles, Some(vec![10.0, 90.0]));
    }

    #[test]
    fn test_anthrorc_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".anthrorc.json"), r#"{"stride": 3}"#).unwrap();
        fs::write(dir.path().join("anthro.config.json"), r#"{"stride": 7}"#).unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.stride, Some(3));
    }

    #[test]
    fn test_discover_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_and_resolve_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.stride, 1);
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{"tables_dir": "tables"}"#).unwrap();

        let resolved = load_and_resolve(Path::new("/nonexistent"), Some(&path)).unwrap();
        assert_eq!(resolved.config_path, Some(path));
        assert_eq!(resolved.tables_dir, Some(dir.path().join("tables")));
    }

    #[test]
    fn test_load_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".anthrorc.json");
        fs::write(&path, r#"{"thresholds": {"severe": 0.5}}"#).unwrap();

        let err = load_and_resolve(dir.path(), None).unwrap_err();
        assert!(format!("{:#}", err).contains(".anthrorc.json"));
    }
}
