//! Project health evaluation for portfolio status reporting.
//!
//! Raw status-report data is turned into [`HealthMetrics`], scored per
//! dimension into a red/amber/green colour with the worst-of rule, scanned for
//! highlights and lowlights, and optionally compared across two 7-day windows
//! of history to derive a trend.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use project_status_engine::{load, report, StatusEngine};
//!
//! fn main() -> project_status_engine::Result<()> {
//!     let engine = StatusEngine::default();
//!     let project = load::load_project(Path::new("project.json"))?;
//!     let status = engine.evaluate_project(&project, None)?;
//!     println!("{}", report::render_project(&status));
//!     Ok(())
//! }
//! ```

pub mod compare;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod extract;
pub mod load;
pub mod models;
pub mod rag;
pub mod report;

pub use compare::ProjectComparator;
pub use config::EngineConfig;
pub use detect::HighlightDetector;
pub use engine::StatusEngine;
pub use error::{Result, StatusError};
pub use extract::{HeuristicExtractor, MetricsSource};
pub use models::{
    HealthMetrics, HistoricalRecord, PortfolioReport, ProjectData, ProjectStatus, StatusColor,
    TrendDirection,
};
pub use rag::RagEvaluator;
