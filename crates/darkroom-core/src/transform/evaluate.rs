//! Per-pixel density evaluation. GPU `composite.wgsl` mirrors this exactly.
//!
//! For one pixel and each exposure `e`:
//! ```text
//! logE_e   = log10(time_e) + log10(trans) + log10(max(ε, 1 − mask_e))
//! E0_e     = log10(base_exposure) + speed_shift_e × log10(2)
//! D_e      = Dmin + (Dmax − Dmin) × sigmoid(k_e × (logE_e − E0_e))
//! Dsum     = Σ max(0, D_e − Dmin)        (stops once Dsum ≥ Dmax − Dmin)
//! Dfinal   = min(Dmin + Dsum, Dmax)
//! value    = 1 − (Dfinal − Dmin) / (Dmax − Dmin)
//! ```
//! Exposures combine as additive excess density rather than as one summed
//! exposure; this is what lets split-grade printing be simulated.

use crate::exposure::{Exposure, LOG_EPSILON};
use crate::paper::Paper;
use crate::transform::lut::{LutSampling, SigmoidLut};

/// Density of a single exposure at log10 exposure `log_e`.
///
/// The result always lies in `[d_min, d_max]` and is non-decreasing in `log_e`.
pub fn density_from_log_e(
    log_e: f32,
    d_min: f32,
    d_max: f32,
    k: f32,
    e0: f32,
    lut: &SigmoidLut,
    sampling: LutSampling,
) -> f32 {
    let s = lut.lookup(k * (log_e - e0), sampling);
    (d_min + (d_max - d_min) * s).clamp(d_min, d_max)
}

/// `log10(max(ε, 1 − mask))`: how much a dodge mask attenuates exposure.
pub fn mask_log_attenuation(mask: f32) -> f32 {
    (1.0 - mask).max(LOG_EPSILON).log10()
}

/// Per-exposure constants hoisted out of the pixel loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureTerm {
    /// `log10(time)`.
    pub log_time: f32,
    /// Contrast slope of the exposure's grade.
    pub k: f32,
    /// Midtone reference `E0` of the exposure's grade.
    pub midtone_log_e: f32,
}

impl ExposureTerm {
    pub fn new(paper: &Paper, exposure: &Exposure) -> Self {
        Self {
            log_time: exposure.log_time(),
            k: paper.grade(exposure.grade).k,
            midtone_log_e: paper.midtone_log_e(exposure.grade),
        }
    }
}

/// The paper-level half of the model: density bounds plus the sigmoid table.
#[derive(Debug, Clone, Copy)]
pub struct DensityModel<'a> {
    pub d_min: f32,
    pub d_max: f32,
    pub lut: &'a SigmoidLut,
    pub sampling: LutSampling,
}

impl<'a> DensityModel<'a> {
    pub fn new(paper: &Paper, lut: &'a SigmoidLut, sampling: LutSampling) -> Self {
        Self {
            d_min: paper.d_min,
            d_max: paper.d_max,
            lut,
            sampling,
        }
    }

    /// Density range above base + fog.
    pub fn range(&self) -> f32 {
        self.d_max - self.d_min
    }

    /// Excess density (above Dmin) contributed by one exposure at one pixel.
    pub fn excess_density(&self, term: &ExposureTerm, log_trans: f32, mask: Option<f32>) -> f32 {
        let mut log_e = term.log_time + log_trans;
        if let Some(m) = mask {
            log_e += mask_log_attenuation(m);
        }
        let d = density_from_log_e(
            log_e,
            self.d_min,
            self.d_max,
            term.k,
            term.midtone_log_e,
            self.lut,
            self.sampling,
        );
        (d - self.d_min).max(0.0)
    }

    /// Final density of a pixel given `(term, mask value)` pairs.
    pub fn final_density<I>(&self, log_trans: f32, exposures: I) -> f32
    where
        I: IntoIterator<Item = (ExposureTerm, Option<f32>)>,
    {
        let range = self.range();
        let mut sum = 0.0_f32;
        for (term, mask) in exposures {
            sum += self.excess_density(&term, log_trans, mask);
            if sum >= range {
                break;
            }
        }
        (self.d_min + sum).min(self.d_max)
    }

    /// Normalized print value: 1 is paper white, 0 is maximum black.
    pub fn print_value(&self, density: f32) -> f32 {
        let range = self.range();
        if range <= 0.0 {
            return 1.0;
        }
        (1.0 - (density - self.d_min) / range).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::PaperKind;

    const EPSILON: f32 = 1e-3;

    fn model(lut: &SigmoidLut) -> DensityModel<'_> {
        DensityModel::new(PaperKind::IlfordMultigrade.paper(), lut, LutSampling::Truncate)
    }

    #[test]
    fn test_density_bounds_and_monotonicity() {
        let lut = SigmoidLut::default();
        for &(k, e0) in &[(1.6, 0.5), (4.2, 1.204), (9.4, 2.0), (0.0, 0.0)] {
            let mut previous = f32::NEG_INFINITY;
            for i in -400..=400 {
                let log_e = i as f32 * 0.02;
                for sampling in [LutSampling::Truncate, LutSampling::Linear] {
                    let d = density_from_log_e(log_e, 0.06, 2.05, k, e0, &lut, sampling);
                    assert!((0.06..=2.05).contains(&d), "k={k} logE={log_e} D={d}");
                }
                let d = density_from_log_e(log_e, 0.06, 2.05, k, e0, &lut, LutSampling::Truncate);
                assert!(d >= previous);
                previous = d;
            }
        }
    }

    #[test]
    fn test_midtone_scenario() {
        let lut = SigmoidLut::default();
        let paper = PaperKind::IlfordMultigrade.paper();
        let exposure = Exposure::with_time_and_grade(16.0, 5);
        let m = model(&lut);
        let term = ExposureTerm::new(paper, &exposure);
        let d = m.final_density(0.0, [(term, None)]);
        assert!((d - 1.055).abs() < EPSILON, "D={d}");
        assert!((m.print_value(d) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_full_dodge_leaves_paper_white() {
        let lut = SigmoidLut::default();
        let paper = PaperKind::IlfordMultigrade.paper();
        let term = ExposureTerm::new(paper, &Exposure::with_time_and_grade(16.0, 5));
        let m = model(&lut);
        let d = m.final_density(0.0, [(term, Some(1.0))]);
        assert!((d - paper.d_min).abs() < EPSILON);
        assert!(m.print_value(d) > 0.999);
    }

    #[test]
    fn test_excess_density_clamps_at_range() {
        let lut = SigmoidLut::default();
        let paper = PaperKind::IlfordMultigrade.paper();
        let m = model(&lut);
        // Pick a time whose single-exposure excess is ~1.5.
        let s_target = 1.5 / m.range();
        let x = (s_target / (1.0 - s_target)).ln();
        let time = 10f32.powf(paper.midtone_log_e(5) + x / 4.2);
        let term = ExposureTerm::new(paper, &Exposure::with_time_and_grade(f64::from(time), 5));

        let single = m.excess_density(&term, 0.0, None);
        assert!((single - 1.5).abs() < 0.01, "single excess {single}");

        let d = m.final_density(0.0, [(term, None), (term, None)]);
        assert!((d - paper.d_max).abs() < 1e-6);
        assert!(((d - paper.d_min) - 1.99).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_inputs_stay_finite() {
        let lut = SigmoidLut::default();
        let paper = PaperKind::IlfordMultigrade.paper();
        let m = model(&lut);
        let zero = ExposureTerm::new(paper, &Exposure::with_time_and_grade(0.0, 0));
        let d = m.final_density(LOG_EPSILON.log10(), [(zero, Some(f32::NAN))]);
        assert!(d.is_finite());
        assert!((paper.d_min..=paper.d_max).contains(&d));
    }

    #[test]
    fn test_no_exposures_is_paper_base() {
        let lut = SigmoidLut::default();
        let m = model(&lut);
        let d = m.final_density(0.0, std::iter::empty());
        assert_eq!(d, m.d_min);
        assert_eq!(m.print_value(d), 1.0);
    }
}
