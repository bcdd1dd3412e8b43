//! CPU compositor: the scalar fallback for the GPU print pipeline.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::exposure::{self, Exposure};
use crate::image::{PrintImage, Transmittance};
use crate::paper::Paper;
use crate::transform::evaluate::{DensityModel, ExposureTerm};
use crate::transform::lut::{LutSampling, SigmoidLut};
use crate::transform::tone::{ToneBlend, tone_map};

/// Knobs shared by every render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderSettings {
    pub tone_blend: ToneBlend,
    /// LUT sampling for the CPU path. The GPU always interpolates.
    pub sampling: LutSampling,
}

/// Render a print on the CPU.
///
/// Returns `None` when there is nothing to expose (no exposures or an
/// empty negative). Only the first [`MAX_EXPOSURES`](exposure::MAX_EXPOSURES)
/// exposures are used; masks whose size does not match the negative are
/// treated as absent.
pub fn render_cpu(
    paper: &Paper,
    exposures: &[Exposure],
    negative: &Transmittance,
    lut: &SigmoidLut,
    settings: &RenderSettings,
) -> Option<PrintImage> {
    let exposures = exposure::renderable(exposures);
    if exposures.is_empty() || negative.pixel_count() == 0 {
        return None;
    }
    let start = Instant::now();

    let model = DensityModel::new(paper, lut, settings.sampling);
    let terms: Vec<ExposureTerm> = exposures
        .iter()
        .map(|e| ExposureTerm::new(paper, e))
        .collect();
    let masks: Vec<Option<&[f32]>> = exposures
        .iter()
        .map(|e| usable_mask(e, negative))
        .collect();

    let pixels = negative
        .log10()
        .iter()
        .enumerate()
        .map(|(i, &log_trans)| {
            let samples = terms
                .iter()
                .zip(&masks)
                .map(|(term, mask)| (*term, mask.map(|m| m[i])));
            let density = model.final_density(log_trans, samples);
            let [r, g, b] = tone_map(model.print_value(density), &paper.tone, settings.tone_blend);
            [r, g, b, 255]
        })
        .collect();

    tracing::debug!(
        width = negative.width(),
        height = negative.height(),
        exposures = exposures.len(),
        "cpu composite in {:.2}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    Some(PrintImage {
        width: negative.width(),
        height: negative.height(),
        pixels,
    })
}

/// The exposure's mask values, if it has a mask matching the negative.
pub fn usable_mask<'a>(exposure: &'a Exposure, negative: &Transmittance) -> Option<&'a [f32]> {
    let mask = exposure.mask.as_ref()?;
    if mask.dimensions() != negative.dimensions() {
        tracing::warn!(
            exposure = %exposure.id,
            "mask is {}x{} but negative is {}x{}; ignoring mask",
            mask.width(),
            mask.height(),
            negative.width(),
            negative.height()
        );
        return None;
    }
    Some(mask.values())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::MAX_EXPOSURES;
    use crate::mask::Mask;
    use crate::paper::PaperKind;

    fn multigrade() -> &'static Paper {
        PaperKind::IlfordMultigrade.paper()
    }

    fn luminance(px: [u8; 4]) -> f32 {
        (f32::from(px[0]) + f32::from(px[1]) + f32::from(px[2])) / 3.0
    }

    #[test]
    fn test_zero_exposures_render_nothing() {
        let negative = Transmittance::uniform(4, 4, 1.0);
        let lut = SigmoidLut::default();
        let settings = RenderSettings::default();
        assert!(render_cpu(multigrade(), &[], &negative, &lut, &settings).is_none());
    }

    #[test]
    fn test_empty_negative_renders_nothing() {
        let negative = Transmittance::uniform(0, 0, 1.0);
        let lut = SigmoidLut::default();
        let exposures = [Exposure::with_time_and_grade(16.0, 5)];
        let settings = RenderSettings::default();
        assert!(render_cpu(multigrade(), &exposures, &negative, &lut, &settings).is_none());
    }

    #[test]
    fn test_midtone_scenario_is_uniform_mid_grey() {
        let negative = Transmittance::uniform(5, 3, 1.0);
        let lut = SigmoidLut::default();
        let exposures = [Exposure::with_time_and_grade(16.0, 5)];
        let settings = RenderSettings {
            tone_blend: ToneBlend::Threshold,
            sampling: LutSampling::Truncate,
        };
        let print = render_cpu(multigrade(), &exposures, &negative, &lut, &settings).unwrap();
        let first = print.pixels[0];
        assert!(print.pixels.iter().all(|&p| p == first), "output must not depend on position");
        // value ≈ 0.5 → tone 127..128 → midtone multiplier 0.98
        assert!(first[..3].iter().all(|&c| (124..=125).contains(&c)), "{first:?}");
        assert_eq!(first[3], 255);
    }

    #[test]
    fn test_full_dodge_is_paper_white() {
        let negative = Transmittance::uniform(4, 4, 1.0);
        let lut = SigmoidLut::default();
        let mut exposure = Exposure::with_time_and_grade(16.0, 5);
        exposure.mask = Some(Mask::filled(4, 4, 1.0));
        let settings = RenderSettings::default();
        let print = render_cpu(multigrade(), &[exposure], &negative, &lut, &settings).unwrap();
        let tone = multigrade().tone.highlights;
        let expected: [u8; 3] = std::array::from_fn(|c| (tone[c] * 255.0).round() as u8);
        for px in &print.pixels {
            assert_eq!(&px[..3], &expected);
        }
    }

    #[test]
    fn test_longer_time_never_lightens() {
        let negative = Transmittance::uniform(1, 1, 0.6);
        let lut = SigmoidLut::default();
        let mut previous = f32::INFINITY;
        for i in 1..80 {
            let time = f64::from(i) * 0.75;
            let exposures = [Exposure::with_time_and_grade(time, 7)];
            let settings = RenderSettings::default();
            let print = render_cpu(multigrade(), &exposures, &negative, &lut, &settings).unwrap();
            let lum = luminance(print.pixels[0]);
            assert!(lum <= previous, "time {time} lightened the print");
            previous = lum;
        }
    }

    #[test]
    fn test_render_is_idempotent() {
        let img = image::RgbaImage::from_fn(16, 9, |x, y| {
            image::Rgba([(x * 15) as u8, (y * 25) as u8, 77, 255])
        });
        let negative = Transmittance::from_image(&image::DynamicImage::ImageRgba8(img));
        let lut = SigmoidLut::default();
        let mut dodged = Exposure::with_time_and_grade(9.0, 2);
        let ramp = (0..144).map(|i| i as f32 / 143.0).collect();
        dodged.mask = Some(Mask::from_values(16, 9, ramp).unwrap());
        let exposures = [dodged, Exposure::with_time_and_grade(5.0, 11)];
        let a = render_cpu(multigrade(), &exposures, &negative, &lut, &RenderSettings::default());
        let b = render_cpu(multigrade(), &exposures, &negative, &lut, &RenderSettings::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_exposure_order_does_not_matter() {
        let negative = Transmittance::uniform(2, 2, 0.4);
        let lut = SigmoidLut::default();
        let soft = Exposure::with_time_and_grade(6.0, 0);
        let hard = Exposure::with_time_and_grade(3.0, 11);
        let settings = RenderSettings::default();
        let a = render_cpu(multigrade(), &[soft.clone(), hard.clone()], &negative, &lut, &settings);
        let b = render_cpu(multigrade(), &[hard, soft], &negative, &lut, &settings);
        assert_eq!(a, b);
    }

    #[test]
    fn test_exposures_beyond_cap_are_ignored() {
        let negative = Transmittance::uniform(2, 2, 0.05);
        let lut = SigmoidLut::default();
        let settings = RenderSettings::default();
        let mut exposures: Vec<_> = (0..MAX_EXPOSURES)
            .map(|_| Exposure::with_time_and_grade(0.5, 5))
            .collect();
        let capped = render_cpu(multigrade(), &exposures, &negative, &lut, &settings);
        exposures.push(Exposure::with_time_and_grade(10_000.0, 11));
        let with_extra = render_cpu(multigrade(), &exposures, &negative, &lut, &settings);
        assert_eq!(capped, with_extra);
    }

    #[test]
    fn test_mismatched_mask_is_ignored() {
        let negative = Transmittance::uniform(4, 4, 1.0);
        let lut = SigmoidLut::default();
        let settings = RenderSettings::default();
        let plain = Exposure::with_time_and_grade(16.0, 5);
        let mut masked = plain.clone();
        masked.mask = Some(Mask::filled(2, 2, 1.0));
        assert_eq!(
            render_cpu(multigrade(), &[plain], &negative, &lut, &settings),
            render_cpu(multigrade(), &[masked], &negative, &lut, &settings)
        );
    }
}
