//! Darkroom Core: domain layer for the analog print simulator.
//!
//! This crate holds the paper registry, the density model, the mask/brush
//! engine, histograms and the editing session. It has no GPU dependencies;
//! `darkroom-gpu` mirrors [`transform::render_cpu`] in a compute shader.

pub mod config;
pub mod error;
pub mod exposure;
pub mod image;
pub mod mask;
pub mod paper;
pub mod project;
pub mod scopes;
pub mod session;
pub mod transform;

// Re-exports for convenience.
pub use config::{BackendPreference, DarkroomConfig};
pub use error::{DarkroomError, ProjectError};
pub use exposure::{Exposure, ExposureId, MAX_EXPOSURES};
pub use crate::image::{PrintImage, Transmittance};
pub use mask::{BrushSettings, Mask, Tool};
pub use paper::{Paper, PaperKind};
pub use project::ProjectSnapshot;
pub use scopes::Histogram;
pub use session::{DarkroomSession, RenderRequest};
pub use transform::{LutSampling, RenderSettings, SigmoidLut, ToneBlend, render_cpu};
