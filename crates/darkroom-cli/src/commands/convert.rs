//! Convert command: re-encode a project between `.ddr` and JSON.

use crate::ConvertArgs;
use anyhow::Result;
use darkroom_core::project::ProjectFormat;

/// Runs the convert command. Formats are chosen from the file extensions.
pub fn run(args: ConvertArgs, verbose: bool) -> Result<()> {
    let project = super::load_project(&args.input)?;
    super::save_project(&args.output, &project)?;

    if verbose {
        println!(
            "{} ({:?}) -> {} ({:?}), {} exposure(s)",
            args.input.display(),
            ProjectFormat::from_path(&args.input),
            args.output.display(),
            ProjectFormat::from_path(&args.output),
            project.exposures.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use darkroom_core::exposure::Exposure;
    use darkroom_core::mask::Mask;
    use darkroom_core::paper::PaperKind;
    use darkroom_core::project::{self, ProjectSnapshot};
    use tempfile::tempdir;

    #[test]
    fn test_convert_binary_to_json_and_back() {
        let dir = tempdir().unwrap();
        let mut dodged = Exposure::with_time_and_grade(8.0, 2);
        dodged.mask = Some(Mask::filled(3, 3, 1.0));
        let original = ProjectSnapshot {
            paper: PaperKind::FomaFomatone,
            exposures: vec![dodged, Exposure::with_time_and_grade(3.5, 10)],
        };
        let ddr = dir.path().join("print.ddr");
        let json = dir.path().join("print.json");
        let back = dir.path().join("back.ddr");
        project::save(&ddr, &original).unwrap();

        run(ConvertArgs { input: ddr.clone(), output: json.clone() }, false).unwrap();
        let text = std::fs::read_to_string(&json).unwrap();
        assert!(text.contains("foma-fomatone"));

        run(ConvertArgs { input: json, output: back.clone() }, false).unwrap();
        assert_eq!(std::fs::read(&back).unwrap(), std::fs::read(&ddr).unwrap());
    }

    #[test]
    fn test_convert_reports_corrupt_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("broken.ddr");
        std::fs::write(&input, b"NOPE").unwrap();
        let err = run(
            ConvertArgs { input: input.clone(), output: dir.path().join("out.json") },
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("broken.ddr"));
    }
}
