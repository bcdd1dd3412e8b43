//! Timed exposures: the unit of work the compositor sums over.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::mask::Mask;
use crate::paper::Paper;

/// Number of filter grades on every paper (00 through 5 in half steps).
pub const GRADE_COUNT: usize = 12;
/// Highest valid grade index.
pub const MAX_GRADE: u8 = (GRADE_COUNT - 1) as u8;
/// Grade index of the paper's normal contrast (grade 2).
pub const DEFAULT_GRADE: u8 = 5;

/// Maximum number of exposures that take part in a render.
///
/// The GPU uniform block holds a fixed array of this many exposures. Extra
/// exposures stay in the project but are ignored by both render paths.
pub const MAX_EXPOSURES: usize = 12;

/// Guard used in place of zero before taking a logarithm.
pub const LOG_EPSILON: f32 = 1e-6;

/// Stable identifier of an exposure within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExposureId(String);

impl ExposureId {
    /// Generate an identifier unique within this process.
    pub fn generate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self(format!("exp-{nanos:x}-{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExposureId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ExposureId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ExposureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One timed exposure through a contrast filter, optionally dodged by a mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    pub id: ExposureId,
    /// Exposure time in seconds. Kept at the precision project files store.
    pub time: f64,
    /// Grade index into the paper's grade table, `0..=11`.
    pub grade: u8,
    /// Dodge mask. `None` means the whole sheet receives the full exposure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Mask>,
}

impl Exposure {
    /// A new exposure at the paper's base time and normal grade.
    pub fn new(paper: &Paper) -> Self {
        Self {
            id: ExposureId::generate(),
            time: f64::from(paper.base_exposure),
            grade: DEFAULT_GRADE,
            mask: None,
        }
    }

    /// An exposure with explicit time and grade and no mask.
    pub fn with_time_and_grade(time: f64, grade: u8) -> Self {
        Self {
            id: ExposureId::generate(),
            time: clamp_time(time),
            grade: grade.min(MAX_GRADE),
            mask: None,
        }
    }

    pub fn set_time(&mut self, seconds: f64) {
        self.time = clamp_time(seconds);
    }

    pub fn set_grade(&mut self, grade: u8) {
        self.grade = grade.min(MAX_GRADE);
    }

    /// `log10` of the exposure time, guarded against zero.
    pub fn log_time(&self) -> f32 {
        self.time.max(f64::from(LOG_EPSILON)).log10() as f32
    }
}

/// Times must stay positive; anything else (including NaN) collapses to the epsilon.
fn clamp_time(seconds: f64) -> f64 {
    let floor = f64::from(LOG_EPSILON);
    if seconds > floor { seconds } else { floor }
}

/// The exposures a render will actually use.
pub fn renderable(exposures: &[Exposure]) -> &[Exposure] {
    if exposures.len() > MAX_EXPOSURES {
        tracing::debug!(
            total = exposures.len(),
            cap = MAX_EXPOSURES,
            "ignoring exposures beyond the render cap"
        );
    }
    &exposures[..exposures.len().min(MAX_EXPOSURES)]
}
