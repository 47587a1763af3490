use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::extract::parse_number;

/// Project health colour as reported to the PMO.
///
/// Only green, amber and red come out of the scoring path. Blue (complete) and
/// grey (on hold or insufficient data) are set by lifecycle logic outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Green,
    Amber,
    Red,
    Blue,
    Grey,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Green => "green",
            StatusColor::Amber => "amber",
            StatusColor::Red => "red",
            StatusColor::Blue => "blue",
            StatusColor::Grey => "grey",
        }
    }

    /// Severity ordinal used by the worst-of rule. Lifecycle colours have none.
    pub fn severity(&self) -> Option<u8> {
        match self {
            StatusColor::Green => Some(0),
            StatusColor::Amber => Some(1),
            StatusColor::Red => Some(2),
            StatusColor::Blue | StatusColor::Grey => None,
        }
    }

    pub fn from_severity(severity: u8) -> StatusColor {
        match severity {
            0 => StatusColor::Green,
            1 => StatusColor::Amber,
            _ => StatusColor::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl TrendDirection {
    pub fn symbol(&self) -> &'static str {
        match self {
            TrendDirection::Up => "↑",
            TrendDirection::Down => "↓",
            TrendDirection::Flat => "→",
        }
    }
}

/// Quantitative health of one project at one point in time.
///
/// The defaults are the healthy baseline. Confidence scoring treats a value equal
/// to its default as "no signal".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub spi: f64,
    pub cpi: f64,
    pub quality_score: f64,
    pub risk_score: f64,
    pub defect_count: u32,
    pub sev1_defects: u32,
    pub sev2_defects: u32,
    pub milestone_completion_rate: f64,
    pub scope_change_percentage: f64,
    pub resource_utilization: f64,
    pub stakeholder_satisfaction: f64,
}

impl Default for HealthMetrics {
    fn default() -> Self {
        Self {
            spi: 1.0,
            cpi: 1.0,
            quality_score: 1.0,
            risk_score: 0.0,
            defect_count: 0,
            sev1_defects: 0,
            sev2_defects: 0,
            milestone_completion_rate: 1.0,
            scope_change_percentage: 0.0,
            resource_utilization: 1.0,
            stakeholder_satisfaction: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Schedule,
    Cost,
    Quality,
    Risk,
    Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Positive,
    Negative,
}

/// A notable event worth calling out in a status report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub metric: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lowlight {
    #[serde(flatten)]
    pub finding: Finding,
    pub action_required: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    pub avg_spi: f64,
    pub avg_cpi: f64,
    pub total_issues: u64,
    pub completion_rate: f64,
}

impl Default for PeriodMetrics {
    fn default() -> Self {
        Self {
            avg_spi: 1.0,
            avg_cpi: 1.0,
            total_issues: 0,
            completion_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub metrics: PeriodMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionTrends {
    pub schedule: TrendDirection,
    pub cost: TrendDirection,
    pub quality: TrendDirection,
}

impl DimensionTrends {
    /// Trends in a fixed order: schedule, cost, quality.
    pub fn ordered(&self) -> [TrendDirection; 3] {
        [self.schedule, self.cost, self.quality]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPeriod {
    pub current_period: PeriodWindow,
    pub previous_period: PeriodWindow,
    pub trends: DimensionTrends,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub project_id: String,
    pub project_name: String,
    pub overall_status: StatusColor,
    pub trend: TrendDirection,
    pub health_metrics: HealthMetrics,
    pub highlights: Vec<Finding>,
    pub lowlights: Vec<Lowlight>,
    pub confidence_score: f64,
    pub evaluation_date: DateTime<Utc>,
    pub comparison_period: Option<ComparisonPeriod>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Raw project data as produced by a status-report data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub kpis: Vec<Kpi>,
}

/// One dated snapshot of history. Numeric fields accept numbers or numeric
/// strings; anything else is dropped with a warning and falls back to the
/// aggregation default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub spi: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub cpi: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub issues: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub completion: Option<f64>,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientNumber)
}

struct LenientNumber;

impl LenientNumber {
    fn discard<E>(found: impl fmt::Display) -> Result<Option<f64>, E> {
        warn!(value = %found, "Non-numeric history value, using default");
        Ok(None)
    }
}

impl<'de> Visitor<'de> for LenientNumber {
    type Value = Option<f64>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number or numeric string")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        if value.is_finite() {
            Ok(Some(value))
        } else {
            Self::discard(value)
        }
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Some(value as f64))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Some(value as f64))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        if value.trim().is_empty() {
            return Ok(None);
        }
        match parse_number(value) {
            Some(number) => Ok(Some(number)),
            None => Self::discard(value),
        }
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Self::discard(value)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Self::discard("[list]")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Self::discard("{object}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub spi: f64,
    pub cpi: f64,
    pub quality: f64,
    pub risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub project: String,
    pub status: StatusColor,
    pub trend: TrendDirection,
    pub confidence: String,
    pub highlights: Vec<Finding>,
    pub lowlights: Vec<Lowlight>,
    pub metrics: MetricSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDistribution {
    pub green: usize,
    pub amber: usize,
    pub red: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPercentage {
    pub green: String,
    pub amber: String,
    pub red: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_projects: usize,
    pub health_distribution: HealthDistribution,
    pub health_percentage: HealthPercentage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub report_date: DateTime<Utc>,
    pub projects: Vec<ProjectSummary>,
    pub summary: PortfolioSummary,
}
