use chrono::{DateTime, Utc};
use tracing::debug;

use crate::compare::ProjectComparator;
use crate::config::EngineConfig;
use crate::detect::{percent, HighlightDetector};
use crate::error::Result;
use crate::extract::{HeuristicExtractor, MetricsSource};
use crate::models::{
    DimensionTrends, HealthDistribution, HealthPercentage, HistoricalRecord, MetricSummary,
    PortfolioReport, PortfolioSummary, ProjectData, ProjectStatus, ProjectSummary, StatusColor,
    TrendDirection,
};
use crate::rag::RagEvaluator;

const UNKNOWN_ID: &str = "unknown";
const UNKNOWN_NAME: &str = "Unknown Project";

/// Runs extraction, RAG evaluation, highlight detection and period comparison
/// for one project at a time. Holds no state beyond its configuration.
#[derive(Debug, Clone)]
pub struct StatusEngine<S = HeuristicExtractor> {
    source: S,
    evaluator: RagEvaluator,
    detector: HighlightDetector,
    comparator: ProjectComparator,
}

impl Default for StatusEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl StatusEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_source(config, HeuristicExtractor)
    }
}

impl<S: MetricsSource> StatusEngine<S> {
    pub fn with_source(config: EngineConfig, source: S) -> Self {
        Self {
            source,
            evaluator: RagEvaluator::new(config.rag),
            detector: HighlightDetector::new(config.highlights, config.lowlights),
            comparator: ProjectComparator::new(config.trends),
        }
    }

    pub fn evaluate_project(
        &self,
        project: &ProjectData,
        history: Option<&[HistoricalRecord]>,
    ) -> Result<ProjectStatus> {
        self.evaluate_project_at(project, history, Utc::now())
    }

    /// Evaluates `project` as of `now`. Trend is computed only when non-empty
    /// history is supplied; a malformed history date is returned as an error.
    pub fn evaluate_project_at(
        &self,
        project: &ProjectData,
        history: Option<&[HistoricalRecord]>,
        now: DateTime<Utc>,
    ) -> Result<ProjectStatus> {
        let metrics = self.source.extract(project);
        let evaluation = self.evaluator.evaluate(&metrics);
        let highlights = self.detector.detect_highlights(&metrics);
        let lowlights = self.detector.detect_lowlights(&metrics);

        let comparison = match history {
            Some(records) if !records.is_empty() => {
                Some(self.comparator.calculate_7day_comparison(records, now)?)
            }
            _ => None,
        };
        let trend = comparison
            .as_ref()
            .map(|comparison| majority_trend(&comparison.trends))
            .unwrap_or(TrendDirection::Flat);

        let status = ProjectStatus {
            project_id: project.id.clone().unwrap_or_else(|| UNKNOWN_ID.to_string()),
            project_name: project
                .name
                .clone()
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            overall_status: evaluation.overall,
            trend,
            health_metrics: metrics,
            highlights,
            lowlights,
            confidence_score: evaluation.confidence,
            evaluation_date: now,
            comparison_period: comparison,
        };

        debug!(
            project = %status.project_id,
            status = status.overall_status.as_str(),
            confidence = status.confidence_score,
            highlights = status.highlights.len(),
            lowlights = status.lowlights.len(),
            "Evaluated project"
        );

        Ok(status)
    }

    pub fn generate_status_report(&self, projects: &[ProjectData]) -> Result<PortfolioReport> {
        self.generate_status_report_at(projects, Utc::now())
    }

    /// Portfolio mode never passes history, so every trend is flat.
    pub fn generate_status_report_at(
        &self,
        projects: &[ProjectData],
        now: DateTime<Utc>,
    ) -> Result<PortfolioReport> {
        let summaries = projects
            .iter()
            .map(|project| self.evaluate_project_at(project, None, now).map(summarize))
            .collect::<Result<Vec<_>>>()?;

        Ok(PortfolioReport {
            report_date: now,
            summary: portfolio_summary(&summaries),
            projects: summaries,
        })
    }
}

/// Most frequent of the schedule, cost and quality trends. Ties go to the
/// trend seen first in that order, so a three-way split follows schedule.
pub fn majority_trend(trends: &DimensionTrends) -> TrendDirection {
    let ordered = trends.ordered();
    let count = |trend: TrendDirection| ordered.iter().filter(|t| **t == trend).count();

    let mut best = ordered[0];
    for trend in ordered.iter().skip(1) {
        if count(*trend) > count(best) {
            best = *trend;
        }
    }
    best
}

fn summarize(status: ProjectStatus) -> ProjectSummary {
    let metrics = MetricSummary {
        spi: status.health_metrics.spi,
        cpi: status.health_metrics.cpi,
        quality: status.health_metrics.quality_score,
        risk: status.health_metrics.risk_score,
    };
    ProjectSummary {
        project_id: status.project_id,
        project: status.project_name,
        status: status.overall_status,
        trend: status.trend,
        confidence: percent(status.confidence_score),
        highlights: status.highlights,
        lowlights: status.lowlights,
        metrics,
    }
}

pub fn portfolio_summary(projects: &[ProjectSummary]) -> PortfolioSummary {
    let total = projects.len();
    let count = |color: StatusColor| projects.iter().filter(|p| p.status == color).count();
    let distribution = HealthDistribution {
        green: count(StatusColor::Green),
        amber: count(StatusColor::Amber),
        red: count(StatusColor::Red),
    };

    let share = |n: usize| {
        if total == 0 {
            "0%".to_string()
        } else {
            format!("{:.0}%", n as f64 / total as f64 * 100.0)
        }
    };

    PortfolioSummary {
        total_projects: total,
        health_percentage: HealthPercentage {
            green: share(distribution.green),
            amber: share(distribution.amber),
            red: share(distribution.red),
        },
        health_distribution: distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HealthMetrics, Kpi, Milestone, Risk};
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 17, 9, 30, 0).unwrap()
    }

    fn sample_project() -> ProjectData {
        ProjectData {
            id: Some("B2B-FE".to_string()),
            name: Some("FarEye Integration".to_string()),
            milestones: vec![
                Milestone {
                    status: Some("completed".to_string()),
                },
                Milestone {
                    status: Some("in-progress".to_string()),
                },
            ],
            risks: vec![Risk {
                severity: Some("medium".to_string()),
            }],
            kpis: vec![Kpi {
                metric: Some("open_issues".to_string()),
                value: Some(json!(4)),
            }],
        }
    }

    fn history_record(days_ago: i64, spi: f64, cpi: f64, issues: f64) -> HistoricalRecord {
        HistoricalRecord {
            date: Some((fixed_now() - Duration::days(days_ago)).to_rfc3339()),
            spi: Some(spi),
            cpi: Some(cpi),
            issues: Some(issues),
            completion: Some(0.5),
        }
    }

    fn trends(
        schedule: TrendDirection,
        cost: TrendDirection,
        quality: TrendDirection,
    ) -> DimensionTrends {
        DimensionTrends {
            schedule,
            cost,
            quality,
        }
    }

    #[test]
    fn evaluates_sample_project() {
        let status = StatusEngine::default()
            .evaluate_project_at(&sample_project(), None, fixed_now())
            .expect("evaluate");
        assert_eq!(status.project_id, "B2B-FE");
        assert_eq!(status.project_name, "FarEye Integration");
        assert_eq!(status.overall_status, StatusColor::Green);
        assert_eq!(status.trend, TrendDirection::Flat);
        assert!(status.comparison_period.is_none());
        assert_eq!(status.health_metrics.sev1_defects, 0);
        assert_eq!(status.health_metrics.sev2_defects, 0);
        // spi, cpi, quality and milestone rate all carry signal; risk does not.
        assert!((status.confidence_score - 0.8).abs() < 1e-9);
        let titles: Vec<&str> = status.highlights.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Zero Critical Defects"]);
        assert!(status.lowlights.is_empty());
        assert_eq!(status.evaluation_date, fixed_now());
    }

    #[test]
    fn missing_identity_uses_placeholders() {
        let status = StatusEngine::default()
            .evaluate_project_at(&ProjectData::default(), None, fixed_now())
            .expect("evaluate");
        assert_eq!(status.project_id, "unknown");
        assert_eq!(status.project_name, "Unknown Project");
        assert!((status.confidence_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn troubled_project_goes_red_with_lowlights() {
        let project = ProjectData {
            milestones: vec![Milestone {
                status: Some("at-risk".to_string()),
            }],
            risks: vec![
                Risk {
                    severity: Some("high".to_string()),
                };
                3
            ],
            kpis: vec![Kpi {
                metric: Some("Issues".to_string()),
                value: Some(json!(25)),
            }],
            ..ProjectData::default()
        };
        let status = StatusEngine::default()
            .evaluate_project_at(&project, None, fixed_now())
            .expect("evaluate");
        assert_eq!(status.overall_status, StatusColor::Red);
        let titles: Vec<&str> = status
            .lowlights
            .iter()
            .map(|l| l.finding.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec![
                "Schedule Slippage Detected",
                "Critical Defects Present",
                "High Risk Exposure"
            ]
        );
    }

    #[test]
    fn repeated_evaluation_is_identical() {
        let engine = StatusEngine::default();
        let first = engine
            .evaluate_project_at(&sample_project(), None, fixed_now())
            .expect("evaluate");
        let second = engine
            .evaluate_project_at(&sample_project(), None, fixed_now())
            .expect("evaluate");
        assert_eq!(first, second);
    }

    #[test]
    fn history_drives_trend_and_comparison() {
        let history = vec![
            history_record(1, 1.1, 1.1, 1.0),
            history_record(3, 1.1, 1.0, 1.0),
            history_record(10, 0.9, 1.0, 8.0),
        ];
        let status = StatusEngine::default()
            .evaluate_project_at(&sample_project(), Some(history.as_slice()), fixed_now())
            .expect("evaluate");
        let comparison = status.comparison_period.expect("comparison present");
        assert_eq!(comparison.trends.schedule, TrendDirection::Up);
        assert_eq!(comparison.trends.cost, TrendDirection::Up);
        assert_eq!(comparison.trends.quality, TrendDirection::Up);
        assert_eq!(status.trend, TrendDirection::Up);
    }

    #[test]
    fn empty_history_skips_comparison() {
        let status = StatusEngine::default()
            .evaluate_project_at(&sample_project(), Some(&[][..]), fixed_now())
            .expect("evaluate");
        assert!(status.comparison_period.is_none());
        assert_eq!(status.trend, TrendDirection::Flat);
    }

    #[test]
    fn malformed_history_date_is_an_error() {
        let history = vec![HistoricalRecord {
            date: Some("last tuesday".to_string()),
            ..HistoricalRecord::default()
        }];
        let result =
            StatusEngine::default().evaluate_project_at(&sample_project(), Some(history.as_slice()), fixed_now());
        assert!(result.is_err());
    }

    #[test]
    fn majority_trend_prefers_most_frequent() {
        use TrendDirection::*;
        assert_eq!(majority_trend(&trends(Up, Down, Down)), Down);
        assert_eq!(majority_trend(&trends(Flat, Up, Flat)), Flat);
        assert_eq!(majority_trend(&trends(Up, Up, Up)), Up);
    }

    #[test]
    fn majority_trend_three_way_split_follows_schedule() {
        use TrendDirection::*;
        assert_eq!(majority_trend(&trends(Down, Up, Flat)), Down);
        assert_eq!(majority_trend(&trends(Flat, Down, Up)), Flat);
    }

    #[test]
    fn empty_portfolio_has_zero_percentages() {
        let report = StatusEngine::default()
            .generate_status_report_at(&[], fixed_now())
            .expect("report");
        assert!(report.projects.is_empty());
        assert_eq!(report.summary.total_projects, 0);
        assert_eq!(report.summary.health_distribution, HealthDistribution::default());
        assert_eq!(report.summary.health_percentage.green, "0%");
        assert_eq!(report.summary.health_percentage.amber, "0%");
        assert_eq!(report.summary.health_percentage.red, "0%");
    }

    #[test]
    fn portfolio_rolls_up_colors() {
        let troubled = ProjectData {
            name: Some("Legacy Migration".to_string()),
            risks: vec![
                Risk {
                    severity: Some("high".to_string()),
                };
                3
            ],
            ..ProjectData::default()
        };
        let amber = ProjectData {
            name: Some("Data Platform".to_string()),
            kpis: vec![Kpi {
                metric: Some("Issue backlog".to_string()),
                value: Some(json!(5)),
            }],
            ..ProjectData::default()
        };
        let projects = vec![sample_project(), troubled, amber, sample_project()];
        let report = StatusEngine::default()
            .generate_status_report_at(&projects, fixed_now())
            .expect("report");

        let colors: Vec<StatusColor> = report.projects.iter().map(|p| p.status).collect();
        assert_eq!(
            colors,
            vec![
                StatusColor::Green,
                StatusColor::Red,
                StatusColor::Amber,
                StatusColor::Green
            ]
        );
        assert_eq!(report.summary.total_projects, 4);
        assert_eq!(report.summary.health_distribution.green, 2);
        assert_eq!(report.summary.health_percentage.green, "50%");
        assert_eq!(report.summary.health_percentage.amber, "25%");
        assert_eq!(report.summary.health_percentage.red, "25%");
        assert_eq!(report.projects[0].confidence, "80%");
        assert!(report.projects.iter().all(|p| p.trend == TrendDirection::Flat));
        assert_eq!(report.report_date, fixed_now());
    }

    #[test]
    fn report_serializes_expected_shape() {
        let report = StatusEngine::default()
            .generate_status_report_at(&[sample_project()], fixed_now())
            .expect("report");
        let value = serde_json::to_value(&report).expect("serialize report");
        assert_eq!(value["projects"][0]["project"], "FarEye Integration");
        assert_eq!(value["projects"][0]["status"], "green");
        assert_eq!(value["projects"][0]["trend"], "flat");
        assert_eq!(value["summary"]["health_distribution"]["green"], 1);
        assert_eq!(value["summary"]["health_percentage"]["green"], "100%");
    }

    struct FixedSource(HealthMetrics);

    impl MetricsSource for FixedSource {
        fn extract(&self, _project: &ProjectData) -> HealthMetrics {
            self.0.clone()
        }
    }

    #[test]
    fn alternate_metrics_source_is_used() {
        let metrics = HealthMetrics {
            spi: 1.10,
            cpi: 1.10,
            milestone_completion_rate: 0.98,
            ..HealthMetrics::default()
        };
        let engine = StatusEngine::with_source(EngineConfig::default(), FixedSource(metrics));
        let status = engine
            .evaluate_project_at(&ProjectData::default(), None, fixed_now())
            .expect("evaluate");
        assert_eq!(status.highlights.len(), 4);
        assert!(status.lowlights.is_empty());
        assert_eq!(status.overall_status, StatusColor::Green);
    }
}
