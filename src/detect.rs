use crate::config::{HighlightTriggers, LowlightTriggers};
use crate::models::{Category, Finding, HealthMetrics, Impact, Lowlight};

#[derive(Debug, Clone, Default)]
pub struct HighlightDetector {
    highlights: HighlightTriggers,
    lowlights: LowlightTriggers,
}

impl HighlightDetector {
    pub fn new(highlights: HighlightTriggers, lowlights: LowlightTriggers) -> Self {
        Self {
            highlights,
            lowlights,
        }
    }

    pub fn detect_highlights(&self, metrics: &HealthMetrics) -> Vec<Finding> {
        let triggers = &self.highlights;
        let mut highlights = Vec::new();

        if metrics.spi >= triggers.spi_min {
            highlights.push(positive(
                Category::Schedule,
                "Schedule Performance Exceeds Target",
                format!("SPI at {:.2}, indicating ahead of schedule", metrics.spi),
                format!("SPI: {:.2}", metrics.spi),
            ));
        }

        if metrics.cpi >= triggers.cpi_min {
            highlights.push(positive(
                Category::Cost,
                "Cost Performance Under Budget",
                format!("CPI at {:.2}, indicating cost savings", metrics.cpi),
                format!("CPI: {:.2}", metrics.cpi),
            ));
        }

        if metrics.sev1_defects == 0 && metrics.sev2_defects == 0 {
            highlights.push(positive(
                Category::Quality,
                "Zero Critical Defects",
                "No Severity 1 or 2 defects in current period".to_string(),
                "Sev-1: 0, Sev-2: 0".to_string(),
            ));
        }

        if metrics.milestone_completion_rate > triggers.milestone_completion_above {
            let rate = percent(metrics.milestone_completion_rate);
            highlights.push(positive(
                Category::Delivery,
                "Strong Milestone Achievement",
                format!("{rate} milestone completion rate"),
                format!("Completion: {rate}"),
            ));
        }

        highlights
    }

    pub fn detect_lowlights(&self, metrics: &HealthMetrics) -> Vec<Lowlight> {
        let triggers = &self.lowlights;
        let mut lowlights = Vec::new();

        if metrics.spi <= triggers.spi_max {
            lowlights.push(negative(
                Category::Schedule,
                "Schedule Slippage Detected",
                format!("SPI at {:.2}, indicating behind schedule", metrics.spi),
                format!("SPI: {:.2}", metrics.spi),
                "Schedule recovery plan needed",
            ));
        }

        if metrics.cpi <= triggers.cpi_max {
            lowlights.push(negative(
                Category::Cost,
                "Cost Overrun Risk",
                format!("CPI at {:.2}, indicating cost overrun", metrics.cpi),
                format!("CPI: {:.2}", metrics.cpi),
                "Cost mitigation strategy required",
            ));
        }

        if metrics.sev1_defects >= triggers.sev1_min {
            lowlights.push(negative(
                Category::Quality,
                "Critical Defects Present",
                format!("{} Severity 1 defects open", metrics.sev1_defects),
                format!("Sev-1: {}", metrics.sev1_defects),
                "Immediate defect resolution required",
            ));
        }

        if metrics.risk_score > triggers.risk_score_above {
            lowlights.push(negative(
                Category::Risk,
                "High Risk Exposure",
                format!("Risk score at {:.2}", metrics.risk_score),
                format!("Risk Score: {:.2}", metrics.risk_score),
                "Risk mitigation plan needed",
            ));
        }

        lowlights
    }
}

fn positive(category: Category, title: &str, description: String, metric: String) -> Finding {
    Finding {
        category,
        title: title.to_string(),
        description,
        impact: Impact::Positive,
        metric,
    }
}

fn negative(
    category: Category,
    title: &str,
    description: String,
    metric: String,
    action: &str,
) -> Lowlight {
    Lowlight {
        finding: Finding {
            category,
            title: title.to_string(),
            description,
            impact: Impact::Negative,
            metric,
        },
        action_required: action.to_string(),
    }
}

/// Whole-percent rendering of a 0..1 rate.
pub fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}
