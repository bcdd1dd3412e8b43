//! Precomputed logistic function for fast density evaluation.
//!
//! The same table is uploaded verbatim to the GPU, so both render paths see
//! identical samples. They differ only in how they read between samples:
//! the shader interpolates linearly, the CPU loop truncates by default.

use serde::{Deserialize, Serialize};

/// Default lower bound of the LUT domain.
pub const DEFAULT_LUT_LO: f32 = -10.0;
/// Default upper bound of the LUT domain.
pub const DEFAULT_LUT_HI: f32 = 10.0;
/// Default sample count. Odd, so that `x = 0` falls exactly on a sample.
pub const DEFAULT_LUT_SIZE: usize = 2049;

/// How a lookup resolves a fractional index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LutSampling {
    /// Round down to the previous sample. Fastest; the CPU default.
    #[default]
    Truncate,
    /// Interpolate between neighbouring samples, matching GPU filtering.
    Linear,
}

/// Discretized `1 / (1 + e^-x)` over `[lo, hi]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SigmoidLut {
    values: Vec<f32>,
    lo: f32,
    hi: f32,
    step: f32,
}

impl Default for SigmoidLut {
    fn default() -> Self {
        Self::new(DEFAULT_LUT_LO, DEFAULT_LUT_HI, DEFAULT_LUT_SIZE)
    }
}

impl SigmoidLut {
    /// Sample the logistic function `n` times at `x = lo + i·step`.
    ///
    /// `n` below 2 is raised to 2 and an empty or inverted domain is widened
    /// to one unit so the table is always usable.
    pub fn new(lo: f32, hi: f32, n: usize) -> Self {
        let n = n.max(2);
        let hi = if hi > lo { hi } else { lo + 1.0 };
        let step = (hi - lo) / (n - 1) as f32;
        let values = (0..n)
            .map(|i| {
                let x = f64::from(lo) + i as f64 * f64::from(step);
                (1.0 / (1.0 + (-x).exp())) as f32
            })
            .collect();
        Self {
            values,
            lo,
            hi,
            step,
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn lo(&self) -> f32 {
        self.lo
    }

    pub fn hi(&self) -> f32 {
        self.hi
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fractional index of `x` after clamping to the domain.
    fn position(&self, x: f32) -> f32 {
        let x = if x.is_nan() { 0.0 } else { x.clamp(self.lo, self.hi) };
        ((x - self.lo) / self.step).clamp(0.0, (self.values.len() - 1) as f32)
    }

    /// Look up `sigmoid(x)` with the given sampling mode.
    pub fn lookup(&self, x: f32, sampling: LutSampling) -> f32 {
        let pos = self.position(x);
        let last = self.values.len() - 1;
        match sampling {
            LutSampling::Truncate => self.values[(pos as usize).min(last)],
            LutSampling::Linear => {
                let i0 = (pos.floor() as usize).min(last);
                let i1 = (i0 + 1).min(last);
                let frac = pos - i0 as f32;
                self.values[i0] + (self.values[i1] - self.values[i0]) * frac
            }
        }
    }
}
