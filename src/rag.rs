use serde::{Deserialize, Serialize};

use crate::config::{IndexBands, RagThresholds};
use crate::models::{HealthMetrics, StatusColor};

/// Per-dimension result of the threshold ladders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionStatuses {
    pub schedule: StatusColor,
    pub cost: StatusColor,
    pub quality: StatusColor,
    pub risk: StatusColor,
}

impl DimensionStatuses {
    pub fn all(&self) -> [StatusColor; 4] {
        [self.schedule, self.cost, self.quality, self.risk]
    }

    /// Worst-of rule: the most severe dimension sets the overall colour.
    pub fn worst(&self) -> StatusColor {
        let worst = self
            .all()
            .iter()
            .map(|status| status.severity().unwrap_or(0))
            .max()
            .unwrap_or(0);
        StatusColor::from_severity(worst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub overall: StatusColor,
    pub confidence: f64,
    pub dimensions: DimensionStatuses,
}

#[derive(Debug, Clone, Default)]
pub struct RagEvaluator {
    thresholds: RagThresholds,
}

impl RagEvaluator {
    pub fn new(thresholds: RagThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RagThresholds {
        &self.thresholds
    }

    pub fn schedule_health(&self, metrics: &HealthMetrics) -> StatusColor {
        index_ladder(metrics.spi, &self.thresholds.schedule)
    }

    pub fn cost_health(&self, metrics: &HealthMetrics) -> StatusColor {
        index_ladder(metrics.cpi, &self.thresholds.cost)
    }

    pub fn quality_health(&self, metrics: &HealthMetrics) -> StatusColor {
        let bands = &self.thresholds.quality;
        let within = |sev1_max: u32, sev2_max: u32| {
            metrics.sev1_defects <= sev1_max && metrics.sev2_defects <= sev2_max
        };

        if within(bands.green.sev1_max, bands.green.sev2_max) {
            StatusColor::Green
        } else if within(bands.amber.sev1_max, bands.amber.sev2_max) {
            StatusColor::Amber
        } else {
            StatusColor::Red
        }
    }

    /// Risk is classified on the score alone; the count of high risks only
    /// reaches this dimension through the extracted score.
    pub fn risk_health(&self, metrics: &HealthMetrics) -> StatusColor {
        let bands = &self.thresholds.risk;
        if metrics.risk_score <= bands.green_max {
            StatusColor::Green
        } else if metrics.risk_score <= bands.amber_max {
            StatusColor::Amber
        } else {
            StatusColor::Red
        }
    }

    pub fn evaluate_dimensions(&self, metrics: &HealthMetrics) -> DimensionStatuses {
        DimensionStatuses {
            schedule: self.schedule_health(metrics),
            cost: self.cost_health(metrics),
            quality: self.quality_health(metrics),
            risk: self.risk_health(metrics),
        }
    }

    pub fn evaluate(&self, metrics: &HealthMetrics) -> Evaluation {
        let dimensions = self.evaluate_dimensions(metrics);
        Evaluation {
            overall: dimensions.worst(),
            confidence: confidence_score(metrics),
            dimensions,
        }
    }
}

fn index_ladder(value: f64, bands: &IndexBands) -> StatusColor {
    if value >= bands.green_min {
        StatusColor::Green
    } else if value >= bands.amber_min {
        StatusColor::Amber
    } else {
        StatusColor::Red
    }
}

/// Share of the five tracked metrics that differ from their healthy default.
///
/// Approximates data completeness: a metric that legitimately sits at its
/// default counts as missing.
pub fn confidence_score(metrics: &HealthMetrics) -> f64 {
    let baseline = HealthMetrics::default();
    let signals = [
        metrics.spi != baseline.spi,
        metrics.cpi != baseline.cpi,
        metrics.quality_score != baseline.quality_score,
        metrics.risk_score != baseline.risk_score,
        metrics.milestone_completion_rate != baseline.milestone_completion_rate,
    ];
    let present = signals.iter().filter(|present| **present).count();
    present as f64 / signals.len() as f64
}
