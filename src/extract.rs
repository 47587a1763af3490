use serde_json::Value;
use tracing::warn;

use crate::models::{HealthMetrics, Kpi, ProjectData};

pub trait MetricsSource {
    fn extract(&self, project: &ProjectData) -> HealthMetrics;
}

const ON_TRACK_SPI: f64 = 1.02;
const AT_RISK_SPI: f64 = 0.95;
const ASSUMED_CPI: f64 = 0.98;
const HIGH_RISK_WEIGHT: f64 = 0.3;
const ASSUMED_SATISFACTION: f64 = 0.85;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl MetricsSource for HeuristicExtractor {
    fn extract(&self, project: &ProjectData) -> HealthMetrics {
        let milestone_rate = milestone_completion_rate(project);

        let high_risks = project
            .risks
            .iter()
            .filter(|risk| risk.severity.as_deref() == Some("high"))
            .count();
        let risk_score = (high_risks as f64 * HIGH_RISK_WEIGHT).min(1.0);

        let at_risk = project
            .milestones
            .iter()
            .any(|milestone| milestone.status.as_deref() == Some("at-risk"));
        let spi = if at_risk { AT_RISK_SPI } else { ON_TRACK_SPI };

        let issues = issue_count(&project.kpis);
        let sev1 = (issues / 10.0).floor();
        let sev2 = ((issues / 5.0).floor() - sev1).max(0.0);
        let quality_score = if issues < 100.0 {
            1.0 - issues / 100.0
        } else {
            0.0
        };

        HealthMetrics {
            spi,
            cpi: ASSUMED_CPI,
            quality_score,
            risk_score,
            defect_count: issues as u32,
            sev1_defects: sev1 as u32,
            sev2_defects: sev2 as u32,
            milestone_completion_rate: milestone_rate,
            scope_change_percentage: 0.0,
            resource_utilization: 1.0,
            stakeholder_satisfaction: ASSUMED_SATISFACTION,
        }
    }
}

/// Completed over total milestones. No milestones means a rate of zero.
fn milestone_completion_rate(project: &ProjectData) -> f64 {
    if project.milestones.is_empty() {
        return 0.0;
    }
    let completed = project
        .milestones
        .iter()
        .filter(|milestone| milestone.status.as_deref() == Some("completed"))
        .count();
    completed as f64 / project.milestones.len() as f64
}

/// Value of the first KPI whose metric name mentions issues.
fn issue_count(kpis: &[Kpi]) -> f64 {
    let Some(kpi) = kpis.iter().find(|kpi| {
        kpi.metric
            .as_deref()
            .is_some_and(|metric| metric.to_lowercase().contains("issue"))
    }) else {
        return 0.0;
    };

    let metric = kpi.metric.as_deref().unwrap_or_default();
    let count = match &kpi.value {
        None => 0.0,
        Some(value) => numeric_value(value).unwrap_or_else(|| {
            warn!(metric, value = %value, "Non-numeric issue KPI, treating as zero");
            0.0
        }),
    };

    if count < 0.0 {
        warn!(metric, count, "Negative issue KPI, clamping to zero");
        return 0.0;
    }
    let ceiling = f64::from(u32::MAX);
    if count > ceiling {
        warn!(metric, count, "Issue KPI exceeds defect counter range, clamping");
        return ceiling;
    }
    count
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_number(text),
        _ => None,
    }
}

pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
