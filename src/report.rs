use std::fmt::Write;

use crate::detect::percent;
use crate::models::{Finding, Lowlight, PeriodWindow, PortfolioReport, ProjectStatus};

pub fn render_project(status: &ProjectStatus) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Project Status: {}", status.project_name);
    let _ = writeln!(
        output,
        "Evaluated {} (id {})",
        status.evaluation_date.format("%Y-%m-%d %H:%M UTC"),
        status.project_id
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "- Overall Status: {}",
        status.overall_status.as_str().to_uppercase()
    );
    let _ = writeln!(output, "- Trend: {}", status.trend.symbol());
    let _ = writeln!(output, "- Confidence: {}", percent(status.confidence_score));

    let metrics = &status.health_metrics;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Health Metrics");
    let _ = writeln!(output, "- SPI {:.2}, CPI {:.2}", metrics.spi, metrics.cpi);
    let _ = writeln!(
        output,
        "- Quality {:.2}, Risk {:.2}",
        metrics.quality_score, metrics.risk_score
    );
    let _ = writeln!(
        output,
        "- Defects {} (Sev-1 {}, Sev-2 {})",
        metrics.defect_count, metrics.sev1_defects, metrics.sev2_defects
    );
    let _ = writeln!(
        output,
        "- Milestone completion {}",
        percent(metrics.milestone_completion_rate)
    );

    write_highlights(&mut output, &status.highlights);
    write_lowlights(&mut output, &status.lowlights);

    if let Some(comparison) = &status.comparison_period {
        let _ = writeln!(output);
        let _ = writeln!(output, "## 7-Day Comparison");
        let _ = writeln!(output, "| Period | Window | Avg SPI | Avg CPI | Issues | Completion |");
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        write_period_row(&mut output, "Current", &comparison.current_period);
        write_period_row(&mut output, "Previous", &comparison.previous_period);
        let trends = &comparison.trends;
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Trends: schedule {}, cost {}, quality {}",
            trends.schedule.symbol(),
            trends.cost.symbol(),
            trends.quality.symbol()
        );
    }

    output
}

pub fn render_portfolio(report: &PortfolioReport) -> String {
    let mut output = String::new();
    let summary = &report.summary;

    let _ = writeln!(output, "# Portfolio Status Report");
    let _ = writeln!(
        output,
        "Generated {} across {} projects",
        report.report_date.format("%Y-%m-%d %H:%M UTC"),
        summary.total_projects
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Health Distribution");
    let _ = writeln!(
        output,
        "- Green: {} ({})",
        summary.health_distribution.green, summary.health_percentage.green
    );
    let _ = writeln!(
        output,
        "- Amber: {} ({})",
        summary.health_distribution.amber, summary.health_percentage.amber
    );
    let _ = writeln!(
        output,
        "- Red: {} ({})",
        summary.health_distribution.red, summary.health_percentage.red
    );

    if report.projects.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No projects in this portfolio.");
        return output;
    }

    for project in report.projects.iter() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "## {} [{}] {} (confidence {})",
            project.project,
            project.status.as_str().to_uppercase(),
            project.trend.symbol(),
            project.confidence
        );
        let _ = writeln!(
            output,
            "SPI {:.2} | CPI {:.2} | Quality {:.2} | Risk {:.2}",
            project.metrics.spi, project.metrics.cpi, project.metrics.quality, project.metrics.risk
        );
        write_highlights(&mut output, &project.highlights);
        write_lowlights(&mut output, &project.lowlights);
    }

    output
}

fn write_highlights(output: &mut String, highlights: &[Finding]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "### Highlights ({})", highlights.len());
    if highlights.is_empty() {
        let _ = writeln!(output, "None this period.");
    }
    for highlight in highlights {
        let _ = writeln!(output, "- {}: {}", highlight.title, highlight.description);
    }
}

fn write_lowlights(output: &mut String, lowlights: &[Lowlight]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "### Lowlights ({})", lowlights.len());
    if lowlights.is_empty() {
        let _ = writeln!(output, "None this period.");
    }
    for lowlight in lowlights {
        let _ = writeln!(
            output,
            "- {}: {} (action: {})",
            lowlight.finding.title, lowlight.finding.description, lowlight.action_required
        );
    }
}

fn write_period_row(output: &mut String, label: &str, period: &PeriodWindow) {
    let metrics = &period.metrics;
    let _ = writeln!(
        output,
        "| {} | {} to {} | {:.2} | {:.2} | {} | {} |",
        label,
        period.start.format("%Y-%m-%d"),
        period.end.format("%Y-%m-%d"),
        metrics.avg_spi,
        metrics.avg_cpi,
        metrics.total_issues,
        percent(metrics.completion_rate)
    );
}
