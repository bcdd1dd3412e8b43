//! CLI command implementations

pub mod convert;
pub mod inspect;
pub mod paint;
pub mod papers;
pub mod render;

use anyhow::{Context, Result};
use darkroom_core::image::{PrintImage, Transmittance};
use darkroom_core::project::{self, ProjectSnapshot};
use darkroom_core::DarkroomConfig;
use std::path::Path;

/// Environment defaults, or the given JSON file.
pub fn load_config(path: Option<&Path>) -> Result<DarkroomConfig> {
    let Some(path) = path else {
        return Ok(DarkroomConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    DarkroomConfig::from_json(&json)
        .with_context(|| format!("Invalid config: {}", path.display()))
}

/// Decode an image and convert it to a transmittance field.
pub fn load_negative(path: &Path) -> Result<Transmittance> {
    let image = image::open(path)
        .with_context(|| format!("Failed to load: {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "loaded negative image"
    );
    Ok(Transmittance::from_image(&image))
}

pub fn load_project(path: &Path) -> Result<ProjectSnapshot> {
    project::load(path).with_context(|| format!("Failed to read project: {}", path.display()))
}

pub fn save_project(path: &Path, snapshot: &ProjectSnapshot) -> Result<()> {
    project::save(path, snapshot)
        .with_context(|| format!("Failed to write project: {}", path.display()))
}

/// Encode a print; the format follows the extension (PNG recommended).
pub fn save_print(path: &Path, print: &PrintImage) -> Result<()> {
    let image = print
        .to_rgba_image()
        .context("Print buffer does not match its dimensions")?;
    image
        .save(path)
        .with_context(|| format!("Failed to save: {}", path.display()))
}

/// Format an exposure time for display
pub fn format_seconds(seconds: f64) -> String {
    if seconds >= 10.0 {
        format!("{seconds:.1}s")
    } else {
        format!("{seconds:.2}s")
    }
}
