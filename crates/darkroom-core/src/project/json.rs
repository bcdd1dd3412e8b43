//! JSON project encoding. Masks are stored as dimensioned byte arrays.

use crate::error::ProjectError;
use crate::exposure::MAX_GRADE;
use crate::project::ProjectSnapshot;

pub fn encode(project: &ProjectSnapshot) -> Result<Vec<u8>, ProjectError> {
    Ok(serde_json::to_vec_pretty(project)?)
}

pub fn decode(bytes: &[u8]) -> Result<ProjectSnapshot, ProjectError> {
    let project: ProjectSnapshot = serde_json::from_slice(bytes)?;
    for exposure in &project.exposures {
        if !exposure.time.is_finite() || exposure.time <= 0.0 {
            return Err(ProjectError::InvalidValue {
                field: "exposure time",
                detail: format!("{} is not a positive number of seconds", exposure.time),
            });
        }
        if exposure.grade > MAX_GRADE {
            return Err(ProjectError::InvalidValue {
                field: "exposure grade",
                detail: format!("{} is outside 0..={MAX_GRADE}", exposure.grade),
            });
        }
    }
    project.check_unique_ids()?;
    Ok(project)
}
