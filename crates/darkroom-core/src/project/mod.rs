//! Project state as persisted: paper choice plus the ordered exposure list.
//!
//! Two on-disk encodings are supported, picked by file extension:
//! the compact binary `.ddr` layout ([`binary`]) and JSON ([`json`]).

pub mod binary;
pub mod json;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProjectError;
use crate::exposure::Exposure;
use crate::paper::PaperKind;

/// File extension of the binary project format.
pub const BINARY_EXTENSION: &str = "ddr";

/// An immutable copy of everything the compositor needs from a project.
///
/// Also the unit stored by undo history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub paper: PaperKind,
    pub exposures: Vec<Exposure>,
}

impl ProjectSnapshot {
    /// Exposure ids address masks and selection, so each must occur once.
    pub fn check_unique_ids(&self) -> Result<(), ProjectError> {
        let mut seen = HashSet::with_capacity(self.exposures.len());
        for exposure in &self.exposures {
            if !seen.insert(&exposure.id) {
                return Err(ProjectError::InvalidValue {
                    field: "exposure id",
                    detail: format!("{} appears more than once", exposure.id),
                });
            }
        }
        Ok(())
    }
}

/// On-disk encoding of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    Binary,
    Json,
}

impl ProjectFormat {
    /// `.ddr` is binary; anything else is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(BINARY_EXTENSION) => Self::Binary,
            _ => Self::Json,
        }
    }

    pub fn encode(self, project: &ProjectSnapshot) -> Result<Vec<u8>, ProjectError> {
        match self {
            Self::Binary => Ok(binary::encode(project)),
            Self::Json => json::encode(project),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<ProjectSnapshot, ProjectError> {
        match self {
            Self::Binary => binary::decode(bytes),
            Self::Json => json::decode(bytes),
        }
    }
}

/// Read a project, choosing the format from the extension.
pub fn load(path: &Path) -> Result<ProjectSnapshot, ProjectError> {
    let bytes = std::fs::read(path)?;
    let project = ProjectFormat::from_path(path).decode(&bytes)?;
    tracing::info!(
        path = %path.display(),
        paper = %project.paper,
        exposures = project.exposures.len(),
        "loaded project"
    );
    Ok(project)
}

/// Write a project, choosing the format from the extension.
pub fn save(path: &Path, project: &ProjectSnapshot) -> Result<(), ProjectError> {
    let bytes = ProjectFormat::from_path(path).encode(project)?;
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), "saved project");
    Ok(())
}
