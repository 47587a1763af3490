use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, StatusError};
use crate::models::{HistoricalRecord, ProjectData};

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectsFile {
    List(Vec<ProjectData>),
    Wrapped { projects: Vec<ProjectData> },
}

pub fn load_project(path: &Path) -> Result<ProjectData> {
    read_json(path)
}

/// Reads a JSON array of projects, or an object holding one under `projects`.
pub fn load_projects(path: &Path) -> Result<Vec<ProjectData>> {
    let projects = match read_json::<ProjectsFile>(path)? {
        ProjectsFile::List(projects) => projects,
        ProjectsFile::Wrapped { projects } => projects,
    };
    debug!(count = projects.len(), path = %path.display(), "Loaded projects");
    Ok(projects)
}

/// Reads history from CSV (`date,spi,cpi,issues,completion` header) when the
/// extension is `.csv`, JSON otherwise. Dates are validated later, during
/// comparison.
pub fn load_history(path: &Path) -> Result<Vec<HistoricalRecord>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let records = if is_csv {
        read_history_csv(path)?
    } else {
        read_json(path)?
    };
    debug!(count = records.len(), path = %path.display(), "Loaded history");
    Ok(records)
}

fn read_history_csv(path: &Path) -> Result<Vec<HistoricalRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();

    for result in reader.deserialize::<HistoricalRecord>() {
        records.push(result?);
    }

    Ok(records)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|source| StatusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| StatusError::Json {
        path: path.to_path_buf(),
        source,
    })
}
