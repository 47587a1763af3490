use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::{debug, warn};

use crate::config::TrendTolerances;
use crate::error::{Result, StatusError};
use crate::models::{
    ComparisonPeriod, DimensionTrends, HistoricalRecord, PeriodMetrics, PeriodWindow,
    TrendDirection,
};

/// Length of each comparison window. The previous window spans the same length
/// immediately before the recent one.
pub const WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default)]
pub struct ProjectComparator {
    tolerances: TrendTolerances,
}

impl ProjectComparator {
    pub fn new(tolerances: TrendTolerances) -> Self {
        Self { tolerances }
    }

    /// Compares the last seven days of history against the seven days before.
    ///
    /// Both windows include their endpoints, so a record dated exactly
    /// `now - 7d` is counted in both. Records without a date are skipped; a
    /// malformed date fails the whole comparison.
    pub fn calculate_7day_comparison(
        &self,
        history: &[HistoricalRecord],
        now: DateTime<Utc>,
    ) -> Result<ComparisonPeriod> {
        let window_start = now - Duration::days(WINDOW_DAYS);
        let previous_start = now - Duration::days(WINDOW_DAYS * 2);

        let dated = history
            .iter()
            .filter_map(|record| record.date.as_deref().map(|date| (date, record)))
            .map(|(date, record)| parse_record_date(date).map(|at| (at, record)))
            .collect::<Result<Vec<_>>>()?;

        let recent = in_window(&dated, window_start, now);
        let previous = in_window(&dated, previous_start, window_start);
        debug!(
            recent = recent.len(),
            previous = previous.len(),
            "Partitioned history into comparison windows"
        );

        let recent_metrics = aggregate(&recent);
        let previous_metrics = aggregate(&previous);

        Ok(ComparisonPeriod {
            current_period: PeriodWindow {
                start: window_start,
                end: now,
                metrics: recent_metrics,
            },
            previous_period: PeriodWindow {
                start: previous_start,
                end: window_start,
                metrics: previous_metrics,
            },
            trends: self.trends(&recent_metrics, &previous_metrics),
        })
    }

    pub fn trends(&self, recent: &PeriodMetrics, previous: &PeriodMetrics) -> DimensionTrends {
        let tol = &self.tolerances;
        DimensionTrends {
            schedule: index_trend(recent.avg_spi, previous.avg_spi, tol),
            cost: index_trend(recent.avg_cpi, previous.avg_cpi, tol),
            quality: issue_trend(recent.total_issues, previous.total_issues, tol),
        }
    }
}

fn in_window<'a>(
    dated: &[(DateTime<Utc>, &'a HistoricalRecord)],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<&'a HistoricalRecord> {
    dated
        .iter()
        .filter(|(at, _)| start <= *at && *at <= end)
        .map(|(_, record)| *record)
        .collect()
}

/// Averages indices and completion, sums issues. An empty window yields the
/// neutral defaults.
///
/// Negative issue counts clamp to zero. The summed count is floored, so
/// fractional entries only contribute once they add up to a whole issue.
pub fn aggregate(records: &[&HistoricalRecord]) -> PeriodMetrics {
    if records.is_empty() {
        return PeriodMetrics::default();
    }

    let count = records.len() as f64;
    let mean = |value: fn(&HistoricalRecord) -> f64| {
        records.iter().map(|record| value(*record)).sum::<f64>() / count
    };

    PeriodMetrics {
        avg_spi: mean(|r| r.spi.unwrap_or(1.0)),
        avg_cpi: mean(|r| r.cpi.unwrap_or(1.0)),
        total_issues: total_issues(records),
        completion_rate: mean(|r| r.completion.unwrap_or(0.0)),
    }
}

fn total_issues(records: &[&HistoricalRecord]) -> u64 {
    let sum: f64 = records
        .iter()
        .filter_map(|record| record.issues)
        .map(|issues| {
            if issues < 0.0 {
                warn!(issues, "Negative issue count in history, clamping to zero");
                0.0
            } else {
                issues
            }
        })
        .sum();
    sum.floor() as u64
}

fn index_trend(recent: f64, previous: f64, tol: &TrendTolerances) -> TrendDirection {
    if recent > previous * tol.index_rise {
        TrendDirection::Up
    } else if recent < previous * tol.index_fall {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    }
}

/// Fewer issues is an improvement.
fn issue_trend(recent: u64, previous: u64, tol: &TrendTolerances) -> TrendDirection {
    let (recent, previous) = (recent as f64, previous as f64);
    if recent < previous * tol.issues_improve {
        TrendDirection::Up
    } else if recent > previous * tol.issues_worsen {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    }
}

/// Accepts `YYYY-MM-DD`, a naive ISO-8601 date-time, or RFC 3339 with an
/// offset. Naive values are taken as UTC.
pub fn parse_record_date(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(at.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::default()).and_utc())
        .map_err(|source| StatusError::InvalidDate {
            value: value.to_string(),
            source,
        })
}
