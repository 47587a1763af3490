use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use project_status_engine::{load, report, EngineConfig, StatusEngine};

#[derive(Parser)]
#[command(name = "project-status")]
#[command(about = "RAG health evaluation for project status reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file overriding the built-in thresholds
    #[arg(long, global = true, env = "STATUS_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single project, optionally against history
    Evaluate {
        #[arg(long)]
        project: PathBuf,
        /// Historical records as JSON or CSV
        #[arg(long)]
        history: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a portfolio report across projects
    Report {
        #[arg(long)]
        projects: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = EngineConfig::load(cli.config.as_deref()).context("failed to load thresholds")?;
    let engine = StatusEngine::new(config);

    match cli.command {
        Commands::Evaluate {
            project,
            history,
            format,
            out,
        } => {
            let data = load::load_project(&project)
                .with_context(|| format!("failed to load project {}", project.display()))?;
            let records = match &history {
                Some(path) => Some(
                    load::load_history(path)
                        .with_context(|| format!("failed to load history {}", path.display()))?,
                ),
                None => None,
            };

            let status = engine
                .evaluate_project(&data, records.as_deref())
                .context("failed to evaluate project")?;
            info!(
                project = %status.project_id,
                status = status.overall_status.as_str(),
                "Evaluation complete"
            );

            let rendered = match format {
                Format::Markdown => report::render_project(&status),
                Format::Json => serde_json::to_string_pretty(&status)?,
            };
            emit(&rendered, out.as_ref())?;
        }
        Commands::Report {
            projects,
            format,
            out,
        } => {
            let data = load::load_projects(&projects)
                .with_context(|| format!("failed to load projects {}", projects.display()))?;
            let portfolio = engine
                .generate_status_report(&data)
                .context("failed to generate portfolio report")?;

            if portfolio.projects.is_empty() {
                warn!("No projects found in {}", projects.display());
            }

            let rendered = match format {
                Format::Markdown => report::render_portfolio(&portfolio),
                Format::Json => serde_json::to_string_pretty(&portfolio)?,
            };
            emit(&rendered, out.as_ref())?;
        }
    }

    Ok(())
}

fn emit(rendered: &str, out: Option<&PathBuf>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}.", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
