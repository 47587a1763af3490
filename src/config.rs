use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StatusError};

/// Floors for a performance index (SPI, CPI). Below the amber floor is red.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexBands {
    pub green_min: f64,
    pub amber_min: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectLimits {
    pub sev1_max: u32,
    pub sev2_max: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectBands {
    pub green: DefectLimits,
    pub amber: DefectLimits,
}

/// Ceilings for a 0..1 score. Above the amber ceiling is red.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBands {
    pub green_max: f64,
    pub amber_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagThresholds {
    pub schedule: IndexBands,
    pub cost: IndexBands,
    pub quality: DefectBands,
    pub risk: ScoreBands,
}

pub const RAG_THRESHOLDS: RagThresholds = RagThresholds {
    schedule: IndexBands {
        green_min: 0.98,
        amber_min: 0.90,
    },
    cost: IndexBands {
        green_min: 0.98,
        amber_min: 0.90,
    },
    quality: DefectBands {
        green: DefectLimits {
            sev1_max: 0,
            sev2_max: 0,
        },
        amber: DefectLimits {
            sev1_max: 0,
            sev2_max: 3,
        },
    },
    risk: ScoreBands {
        green_max: 0.3,
        amber_max: 0.6,
    },
};

impl Default for RagThresholds {
    fn default() -> Self {
        RAG_THRESHOLDS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightTriggers {
    /// Fires when SPI is at or above this value.
    pub spi_min: f64,
    /// Fires when CPI is at or above this value.
    pub cpi_min: f64,
    /// Fires when the milestone completion rate is strictly above this value.
    pub milestone_completion_above: f64,
}

pub const HIGHLIGHT_TRIGGERS: HighlightTriggers = HighlightTriggers {
    spi_min: 1.05,
    cpi_min: 1.05,
    milestone_completion_above: 0.95,
};

impl Default for HighlightTriggers {
    fn default() -> Self {
        HIGHLIGHT_TRIGGERS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowlightTriggers {
    /// Fires when SPI is at or below this value.
    pub spi_max: f64,
    /// Fires when CPI is at or below this value.
    pub cpi_max: f64,
    /// Fires when open severity-1 defects reach this count.
    pub sev1_min: u32,
    /// Fires when the risk score is strictly above this value.
    pub risk_score_above: f64,
}

pub const LOWLIGHT_TRIGGERS: LowlightTriggers = LowlightTriggers {
    spi_max: 0.95,
    cpi_max: 0.95,
    sev1_min: 1,
    risk_score_above: 0.6,
};

impl Default for LowlightTriggers {
    fn default() -> Self {
        LOWLIGHT_TRIGGERS
    }
}

/// Multipliers applied to the previous period's aggregate when deriving a trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendTolerances {
    pub index_rise: f64,
    pub index_fall: f64,
    pub issues_improve: f64,
    pub issues_worsen: f64,
}

pub const TREND_TOLERANCES: TrendTolerances = TrendTolerances {
    index_rise: 1.02,
    index_fall: 0.98,
    issues_improve: 0.9,
    issues_worsen: 1.1,
};

impl Default for TrendTolerances {
    fn default() -> Self {
        TREND_TOLERANCES
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rag: RagThresholds,
    pub highlights: HighlightTriggers,
    pub lowlights: LowlightTriggers,
    pub trends: TrendTolerances,
}

impl EngineConfig {
    /// Built-in defaults, then the optional TOML file, then `STATUS_ENGINE_*`
    /// environment variables (`__` separates nested keys, e.g.
    /// `STATUS_ENGINE_RAG__RISK__AMBER_MAX=0.5`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(EngineConfig::default()));

        if let Some(path) = path {
            if !path.exists() {
                return Err(StatusError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            debug!("Loading thresholds from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("STATUS_ENGINE_").split("__"));

        let config: EngineConfig = figment
            .extract()
            .map_err(|e| StatusError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects ladders whose bands are out of order.
    pub fn validate(&self) -> Result<()> {
        let rag = &self.rag;
        for (name, bands) in [("schedule", rag.schedule), ("cost", rag.cost)] {
            if bands.amber_min > bands.green_min {
                return Err(StatusError::Config(format!(
                    "{name}: amber_min {} is above green_min {}",
                    bands.amber_min, bands.green_min
                )));
            }
        }
        if rag.quality.amber.sev1_max < rag.quality.green.sev1_max
            || rag.quality.amber.sev2_max < rag.quality.green.sev2_max
        {
            return Err(StatusError::Config(
                "quality: amber limits are tighter than green limits".to_string(),
            ));
        }
        if rag.risk.amber_max < rag.risk.green_max {
            return Err(StatusError::Config(format!(
                "risk: amber_max {} is below green_max {}",
                rag.risk.amber_max, rag.risk.green_max
            )));
        }
        if self.trends.index_fall > self.trends.index_rise
            || self.trends.issues_improve > self.trends.issues_worsen
        {
            return Err(StatusError::Config(
                "trends: falling tolerance exceeds rising tolerance".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_pmo_tables() {
        let config = EngineConfig::default();
        assert_eq!(config.rag.schedule.green_min, 0.98);
        assert_eq!(config.rag.cost.amber_min, 0.90);
        assert_eq!(config.rag.quality.amber.sev2_max, 3);
        assert_eq!(config.rag.risk.amber_max, 0.6);
        assert_eq!(config.highlights.spi_min, 1.05);
        assert_eq!(config.lowlights.sev1_min, 1);
        assert_eq!(config.trends.issues_worsen, 1.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_schedule_ladder() {
        let mut config = EngineConfig::default();
        config.rag.schedule.amber_min = 0.99;
        assert!(matches!(config.validate(), Err(StatusError::Config(_))));
    }

    #[test]
    fn rejects_inverted_risk_ladder() {
        let mut config = EngineConfig::default();
        config.rag.risk.green_max = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_overrides_only_named_keys() {
        Jail::expect_with(|jail| {
            jail.create_file("thresholds.toml", "[rag.risk]\ngreen_max = 0.2\namber_max = 0.5")?;

            let config = EngineConfig::load(Some(Path::new("thresholds.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.rag.risk.green_max, 0.2);
            assert_eq!(config.rag.risk.amber_max, 0.5);
            assert_eq!(config.rag.schedule, RAG_THRESHOLDS.schedule);
            assert_eq!(config.highlights, HIGHLIGHT_TRIGGERS);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_builtin_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("STATUS_ENGINE_RAG__RISK__AMBER_MAX", "0.55");
            jail.set_env("STATUS_ENGINE_TRENDS__ISSUES_WORSEN", "1.25");

            let config = EngineConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.rag.risk.amber_max, 0.55);
            assert_eq!(config.rag.risk.green_max, RAG_THRESHOLDS.risk.green_max);
            assert_eq!(config.trends.issues_worsen, 1.25);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file_values() {
        Jail::expect_with(|jail| {
            jail.create_file("thresholds.toml", "[rag.risk]\ngreen_max = 0.2\namber_max = 0.5")?;
            jail.set_env("STATUS_ENGINE_RAG__RISK__AMBER_MAX", "0.55");

            let config = EngineConfig::load(Some(Path::new("thresholds.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.rag.risk.green_max, 0.2);
            assert_eq!(config.rag.risk.amber_max, 0.55);
            Ok(())
        });
    }

    #[test]
    fn env_override_still_validated() {
        Jail::expect_with(|jail| {
            jail.set_env("STATUS_ENGINE_RAG__RISK__AMBER_MAX", "0.1");
            let result = EngineConfig::load(None);
            assert!(matches!(result, Err(StatusError::Config(_))));
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = EngineConfig::load(Some(Path::new("/nonexistent/thresholds.toml")));
        assert!(matches!(result, Err(StatusError::Config(_))));
    }
}
