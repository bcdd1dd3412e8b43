//! Paint command: replay brush strokes from a JSON script into masks.
//!
//! A script is an array of strokes:
//! ```json
//! [
//!   { "exposure": 0, "tool": "dodge", "size": 30, "feather": 60, "flow": 0.2,
//!     "points": [[120, 80], [180, 95], [240, 140]] },
//!   { "tool": "erase", "points": [[200, 120]] }
//! ]
//! ```
//! Points are negative pixel coordinates. Omitted brush fields keep the
//! values of the previous stroke.

use crate::PaintArgs;
use anyhow::{Context, Result, bail};
use darkroom_core::mask::Tool;
use darkroom_core::{DarkroomConfig, DarkroomSession};
use glam::Vec2;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Stroke {
    /// Index of the exposure to paint.
    #[serde(default)]
    exposure: usize,
    #[serde(default)]
    tool: Tool,
    size: Option<f32>,
    feather: Option<f32>,
    flow: Option<f32>,
    points: Vec<[f32; 2]>,
}

/// Runs the paint command.
pub fn run(args: PaintArgs, config: &DarkroomConfig, verbose: bool) -> Result<()> {
    let script = std::fs::read_to_string(&args.strokes)
        .with_context(|| format!("Failed to read strokes: {}", args.strokes.display()))?;
    let strokes: Vec<Stroke> = serde_json::from_str(&script)
        .with_context(|| format!("Invalid stroke script: {}", args.strokes.display()))?;

    let mut session = DarkroomSession::new(config.clone());
    if let Some(path) = &args.project {
        session.load_project(super::load_project(path)?)?;
    }
    session.load_negative(super::load_negative(&args.input)?);
    if session.exposures().is_empty() {
        session.add_exposure();
    }

    let mut stamps = 0;
    for (index, stroke) in strokes.iter().enumerate() {
        stamps += apply_stroke(&mut session, stroke)
            .with_context(|| format!("Stroke {index} could not be applied"))?;
    }

    super::save_project(&args.output, &session.snapshot())?;

    if verbose {
        println!(
            "{} stroke(s), {} stamp(s) -> {}",
            strokes.len(),
            stamps,
            args.output.display()
        );
    }
    Ok(())
}

/// Paint one stroke. Returns the number of stamps applied.
fn apply_stroke(session: &mut DarkroomSession, stroke: &Stroke) -> Result<usize> {
    let Some((first, rest)) = stroke.points.split_first() else {
        bail!("stroke has no points");
    };
    let id = session
        .exposures()
        .get(stroke.exposure)
        .map(|e| e.id.clone())
        .with_context(|| {
            format!(
                "exposure {} does not exist ({} in project)",
                stroke.exposure,
                session.exposures().len()
            )
        })?;
    session.select_exposure(&id)?;
    session.set_tool(stroke.tool);
    if let Some(size) = stroke.size {
        session.set_brush_size(size);
    }
    if let Some(feather) = stroke.feather {
        session.set_brush_feather(feather);
    }
    if let Some(flow) = stroke.flow {
        session.set_brush_flow(flow);
    }

    if !session.pointer_down(Vec2::from(*first)) {
        bail!("stroke could not start at {first:?}");
    }
    let mut stamps = 1;
    for point in rest {
        stamps += session.pointer_move(Vec2::from(*point));
    }
    session.pointer_up();
    Ok(stamps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use darkroom_core::project;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_negative(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("neg.png");
        image::RgbaImage::from_pixel(20, 20, image::Rgba([40, 40, 40, 255]))
            .save(&path)
            .unwrap();
        path
    }

    fn paint(dir: &Path, script: &str) -> Result<project::ProjectSnapshot> {
        let strokes = dir.join("strokes.json");
        std::fs::write(&strokes, script).unwrap();
        let output = dir.join("painted.ddr");
        let args = PaintArgs {
            input: write_negative(dir),
            project: None,
            strokes,
            output: output.clone(),
        };
        run(args, &DarkroomConfig::from_lookup(|_| None), false)?;
        Ok(project::load(&output).unwrap())
    }

    #[test]
    fn test_dodge_stroke_paints_mask() {
        let dir = tempdir().unwrap();
        let painted = paint(
            dir.path(),
            r#"[{ "tool": "dodge", "size": 100, "feather": 0, "flow": 1.0,
                  "points": [[10, 10], [12, 10]] }]"#,
        )
        .unwrap();
        assert_eq!(painted.exposures.len(), 1);
        let mask = painted.exposures[0].mask.as_ref().unwrap();
        assert_eq!(mask.dimensions(), (20, 20));
        assert!((mask.get(10, 10) - 1.0).abs() < 1e-6);
        assert!(mask.get(0, 19).abs() < 1e-6);
    }

    #[test]
    fn test_erase_after_dodge_clears_disc() {
        let dir = tempdir().unwrap();
        let painted = paint(
            dir.path(),
            r#"[{ "size": 100, "feather": 0, "flow": 1.0, "points": [[10, 10]] },
                { "tool": "erase", "points": [[10, 10]] }]"#,
        )
        .unwrap();
        let mask = painted.exposures[0].mask.as_ref().unwrap();
        assert!(mask.get(10, 10).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_exposure_is_reported() {
        let dir = tempdir().unwrap();
        let err = paint(dir.path(), r#"[{ "exposure": 3, "points": [[1, 1]] }]"#).unwrap_err();
        assert!(format!("{err:#}").contains("exposure 3 does not exist"));
    }

    #[test]
    fn test_empty_stroke_is_rejected() {
        let dir = tempdir().unwrap();
        let err = paint(dir.path(), r#"[{ "points": [] }]"#).unwrap_err();
        assert!(format!("{err:#}").contains("no points"));
    }
}
