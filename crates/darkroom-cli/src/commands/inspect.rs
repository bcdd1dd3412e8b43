//! Inspect command: describe the exposures in a project.

use crate::InspectArgs;
use anyhow::Result;
use darkroom_core::exposure::{Exposure, MAX_EXPOSURES};
use darkroom_core::paper::grade_label;
use darkroom_core::project::{ProjectFormat, ProjectSnapshot};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ExposureSummary {
    id: String,
    time: f64,
    grade: &'static str,
    /// Mask size and mean dodge, when painted.
    mask: Option<MaskSummary>,
    rendered: bool,
}

#[derive(Debug, Serialize)]
struct MaskSummary {
    width: u32,
    height: u32,
    coverage: f32,
}

/// Runs the inspect command.
pub fn run(args: InspectArgs, verbose: bool) -> Result<()> {
    for path in &args.input {
        let project = super::load_project(path)?;
        if args.json {
            let summary = serde_json::json!({
                "path": path.display().to_string(),
                "paper": project.paper.key(),
                "exposures": summarize(&project),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_text(path, &project, verbose);
        }

        if args.input.len() > 1 {
            println!();
        }
    }
    Ok(())
}

fn print_text(path: &Path, project: &ProjectSnapshot, verbose: bool) {
    println!("{}", path.display());
    println!("  Paper:      {} ({})", project.paper.label(), project.paper.key());
    println!("  Exposures:  {}", project.exposures.len());
    if verbose {
        println!("  Format:     {:?}", ProjectFormat::from_path(path));
    }
    for (index, exposure) in summarize(project).iter().enumerate() {
        let mask = match &exposure.mask {
            Some(m) => format!("mask {}x{} {:.1}%", m.width, m.height, m.coverage * 100.0),
            None => String::from("no mask"),
        };
        let note = if exposure.rendered { "" } else { "  (not rendered)" };
        println!(
            "  [{index}] {}  grade {:<3} {}{note}",
            super::format_seconds(exposure.time),
            exposure.grade,
            mask
        );
        if verbose {
            println!("      id {}", exposure.id);
        }
    }
}

fn summarize(project: &ProjectSnapshot) -> Vec<ExposureSummary> {
    project
        .exposures
        .iter()
        .enumerate()
        .map(|(index, exposure)| summarize_exposure(exposure, index < MAX_EXPOSURES))
        .collect()
}

fn summarize_exposure(exposure: &Exposure, rendered: bool) -> ExposureSummary {
    ExposureSummary {
        id: exposure.id.to_string(),
        time: exposure.time,
        grade: grade_label(exposure.grade),
        mask: exposure.mask.as_ref().map(|m| {
            let values = m.values();
            let coverage = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f32>() / values.len() as f32
            };
            MaskSummary {
                width: m.width(),
                height: m.height(),
                coverage,
            }
        }),
        rendered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use darkroom_core::mask::Mask;

    #[test]
    fn test_summary_marks_exposures_beyond_cap() {
        let project = ProjectSnapshot {
            exposures: (0..MAX_EXPOSURES + 2)
                .map(|_| Exposure::with_time_and_grade(2.0, 5))
                .collect(),
            ..Default::default()
        };
        let summary = summarize(&project);
        assert!(summary[..MAX_EXPOSURES].iter().all(|e| e.rendered));
        assert!(summary[MAX_EXPOSURES..].iter().all(|e| !e.rendered));
    }

    #[test]
    fn test_mask_coverage_is_mean_dodge() {
        let mut exposure = Exposure::with_time_and_grade(4.0, 0);
        exposure.mask = Mask::from_values(2, 2, vec![1.0, 0.0, 0.5, 0.5]);
        let summary = summarize_exposure(&exposure, true);
        let mask = summary.mask.unwrap();
        assert_eq!((mask.width, mask.height), (2, 2));
        assert!((mask.coverage - 0.5).abs() < 1e-6);
        assert_eq!(summary.grade, "00");
    }
}
