//! Papers command: list the paper registry.

use crate::PapersArgs;
use anyhow::Result;
use darkroom_core::paper::{Paper, PaperKind, grade_label};
use serde::Serialize;

#[derive(Serialize)]
struct PaperSummary {
    key: &'static str,
    label: &'static str,
    base_exposure: f32,
    d_min: f32,
    d_max: f32,
    grades: Vec<GradeSummary>,
}

#[derive(Serialize)]
struct GradeSummary {
    grade: &'static str,
    k: f32,
    speed_shift_stops: f32,
}

/// Runs the papers command.
pub fn run(args: PapersArgs, verbose: bool) -> Result<()> {
    if args.json {
        let summaries: Vec<_> = PaperKind::all().iter().map(|&kind| summarize(kind)).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for &kind in PaperKind::all() {
        let paper = kind.paper();
        println!("{:<20} {}", kind.key(), kind.label());
        println!(
            "  Base exposure: {}   Dmin {:.2}   Dmax {:.2}",
            super::format_seconds(f64::from(paper.base_exposure)),
            paper.d_min,
            paper.d_max
        );
        if verbose {
            print_grades(paper);
        }
    }
    Ok(())
}

fn print_grades(paper: &Paper) {
    for (index, grade) in (0u8..).zip(paper.grades.iter()) {
        println!(
            "    grade {:<3} k={:.2}  shift={:+.2} stops",
            grade_label(index),
            grade.k,
            grade.speed_shift_stops
        );
    }
}

fn summarize(kind: PaperKind) -> PaperSummary {
    let paper = kind.paper();
    PaperSummary {
        key: kind.key(),
        label: kind.label(),
        base_exposure: paper.base_exposure,
        d_min: paper.d_min,
        d_max: paper.d_max,
        grades: (0u8..)
            .zip(paper.grades.iter())
            .map(|(index, grade)| GradeSummary {
                grade: grade_label(index),
                k: grade.k,
                speed_shift_stops: grade.speed_shift_stops,
            })
            .collect(),
    }
}
