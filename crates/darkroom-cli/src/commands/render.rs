//! Render command: negative + project -> print PNG.

use crate::RenderArgs;
use anyhow::{Context, Result, bail};
use darkroom_core::transform::tone::ToneBlend;
use darkroom_core::{BackendPreference, DarkroomConfig, DarkroomSession};
use darkroom_gpu::PrintRenderer;
use std::time::Instant;

/// Runs the render command.
///
/// `--backend` and `--tone` override the configuration. Masks that do not
/// match the negative are rejected up front.
pub fn run(args: RenderArgs, config: &DarkroomConfig, verbose: bool) -> Result<()> {
    let config = apply_overrides(config.clone(), args.backend.as_deref(), args.tone.as_deref())?;

    let negative = super::load_negative(&args.input)?;
    let project = super::load_project(&args.project)?;

    let mut session = DarkroomSession::new(config.clone());
    session.load_negative(negative);
    session
        .load_project(project)
        .with_context(|| format!("Project does not fit {}", args.input.display()))?;

    let renderer = PrintRenderer::from_preference(config.backend)
        .context("Failed to initialise the GPU backend")?;

    // Drive the session's debounced loop once: wait out the window, render
    // the request it yields and store the frame back.
    session.request_render();
    let now = Instant::now();
    let due = now + session.render_due_in(now).unwrap_or_default();
    let request = session
        .poll_render(due)
        .context("Nothing to render: the project has no exposures")?;

    let start = Instant::now();
    let (print, histogram) = renderer
        .render_request(&request, config.histogram_stride)
        .context("Nothing to render: the project has no exposures")?;
    let elapsed = start.elapsed();
    session.commit_frame(print, Some(histogram));
    let (Some(print), Some(histogram)) = (session.last_frame(), session.histogram()) else {
        bail!("Rendered frame was not stored");
    };

    super::save_print(&args.output, print)?;

    if let Some(path) = &args.histogram {
        let json = serde_json::to_string_pretty(histogram)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write histogram: {}", path.display()))?;
    }

    if verbose {
        println!(
            "{} -> {} ({}x{}, {} exposure(s), {} backend, {} tones, {:.1} ms)",
            args.input.display(),
            args.output.display(),
            print.width,
            print.height,
            session.exposures().len(),
            renderer.backend_name(),
            config.tone_blend,
            elapsed.as_secs_f64() * 1000.0,
        );
    }

    Ok(())
}

/// Apply command-line backend and tone choices on top of `config`.
fn apply_overrides(
    mut config: DarkroomConfig,
    backend: Option<&str>,
    tone: Option<&str>,
) -> Result<DarkroomConfig> {
    if let Some(backend) = backend {
        config.backend = backend.parse::<BackendPreference>()?;
    }
    if let Some(tone) = tone {
        config.tone_blend = tone.parse::<ToneBlend>()?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use darkroom_core::exposure::Exposure;
    use darkroom_core::paper::PaperKind;
    use darkroom_core::project::ProjectSnapshot;
    use tempfile::tempdir;

    fn cpu_args(dir: &std::path::Path) -> RenderArgs {
        RenderArgs {
            input: dir.join("neg.png"),
            project: dir.join("print.ddr"),
            output: dir.join("print.png"),
            histogram: Some(dir.join("hist.json")),
            backend: Some("cpu".into()),
            tone: None,
        }
    }

    #[test]
    fn test_overrides_parse_case_insensitive_backend() {
        let defaults = DarkroomConfig::from_lookup(|_| None);
        let config = apply_overrides(defaults, Some("CPU"), Some("threshold")).unwrap();
        assert_eq!(config.backend, BackendPreference::Cpu);
        assert_eq!(config.tone_blend, ToneBlend::Threshold);
    }

    #[test]
    fn test_overrides_reject_unknown_tone() {
        let defaults = DarkroomConfig::from_lookup(|_| None);
        assert!(apply_overrides(defaults, None, Some("sepia")).is_err());
    }

    #[test]
    fn test_render_writes_print_and_histogram() {
        let dir = tempdir().unwrap();
        let args = cpu_args(dir.path());
        // Black source pixels invert to a clear negative.
        image::RgbaImage::from_pixel(6, 4, image::Rgba([0, 0, 0, 255]))
            .save(&args.input)
            .unwrap();
        let project = ProjectSnapshot {
            paper: PaperKind::IlfordMultigrade,
            exposures: vec![Exposure::with_time_and_grade(16.0, 5)],
        };
        super::super::save_project(&args.project, &project).unwrap();

        run(args, &DarkroomConfig::from_lookup(|_| None), false).unwrap();

        let print = image::open(dir.path().join("print.png")).unwrap().to_rgba8();
        assert_eq!(print.dimensions(), (6, 4));
        let first = *print.get_pixel(0, 0);
        assert!(print.pixels().all(|p| *p == first));
        assert_eq!(first[3], 255);

        let json = std::fs::read_to_string(dir.path().join("hist.json")).unwrap();
        let histogram: darkroom_core::Histogram = serde_json::from_str(&json).unwrap();
        assert!(histogram.samples() > 0);
    }

    #[test]
    fn test_render_without_exposures_fails() {
        let dir = tempdir().unwrap();
        let args = cpu_args(dir.path());
        image::RgbaImage::from_pixel(2, 2, image::Rgba([90, 90, 90, 255]))
            .save(&args.input)
            .unwrap();
        super::super::save_project(&args.project, &ProjectSnapshot::default()).unwrap();

        let err = run(args, &DarkroomConfig::from_lookup(|_| None), false).unwrap_err();
        assert!(err.to_string().contains("Nothing to render"));
        assert!(!dir.path().join("print.png").exists());
    }
}
