//! Dodge masks and the brush engine that paints them.
//!
//! A [`Mask`] is a dense per-pixel field in `[0, 1]` at negative resolution:
//! 0 leaves the exposure untouched, 1 blocks it completely. Masks are only
//! ever modified through the brush operations in [`brush`], which keep every
//! value inside that range.

pub mod brush;
pub mod stroke;

use serde::{Deserialize, Serialize};

use crate::error::ProjectError;

pub use brush::{BrushSettings, Tool};
pub use stroke::StrokeRecorder;

/// Per-pixel dodge amount for one exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "MaskBytes", try_from = "MaskBytes")]
pub struct Mask {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl Mask {
    /// An empty (fully exposed) mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width as usize * height as usize],
        }
    }

    /// A mask with every pixel set to `value` (clamped to `[0, 1]`).
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            values: vec![clamp_unit(value); width as usize * height as usize],
        }
    }

    /// Build a mask from 8-bit alpha, as stored in project files.
    pub fn from_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, ProjectError> {
        let expected = width as usize * height as usize;
        if bytes.len() != expected {
            return Err(ProjectError::InvalidValue {
                field: "mask",
                detail: format!(
                    "{width}x{height} mask needs {expected} bytes, got {}",
                    bytes.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            values: bytes.iter().map(|&b| f32::from(b) / 255.0).collect(),
        })
    }

    /// Build a mask from float values. Values are clamped into `[0, 1]`.
    pub fn from_values(width: u32, height: u32, values: Vec<f32>) -> Option<Self> {
        if values.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            values: values.into_iter().map(clamp_unit).collect(),
        })
    }

    /// Quantize to 8-bit alpha.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.values
            .iter()
            .map(|&v| (v * 255.0).round() as u8)
            .collect()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Row-major mask values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value at a pixel, or 0 outside the mask.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.values[(y * self.width + x) as usize]
    }

    /// True when no pixel is dodged.
    pub fn is_clear(&self) -> bool {
        self.values.iter().all(|&v| v <= 0.0)
    }

    /// Reset every pixel to fully exposed.
    pub fn clear(&mut self) {
        self.values.fill(0.0);
    }

    /// Bounded additive accumulation: `m ← m + a·(1 − m)`.
    pub(crate) fn accumulate(&mut self, index: usize, amount: f32) {
        let m = &mut self.values[index];
        *m = clamp_unit(*m + clamp_unit(amount) * (1.0 - *m));
    }

    /// Destination-out: `m ← m·(1 − coverage)`.
    pub(crate) fn remove(&mut self, index: usize, coverage: f32) {
        let m = &mut self.values[index];
        *m = clamp_unit(*m * (1.0 - clamp_unit(coverage)));
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Serialized form: dimensions plus 8-bit alpha.
#[derive(Serialize, Deserialize)]
struct MaskBytes {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl From<Mask> for MaskBytes {
    fn from(mask: Mask) -> Self {
        Self {
            width: mask.width,
            height: mask.height,
            data: mask.to_bytes(),
        }
    }
}

impl TryFrom<MaskBytes> for Mask {
    type Error = ProjectError;

    fn try_from(repr: MaskBytes) -> Result<Self, Self::Error> {
        Mask::from_bytes(repr.width, repr.height, &repr.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mask_is_clear() {
        let mask = Mask::new(4, 3);
        assert_eq!(mask.values().len(), 12);
        assert!(mask.is_clear());
        assert_eq!(mask.get(10, 10), 0.0);
    }

    #[test]
    fn test_from_bytes_checks_length() {
        assert!(Mask::from_bytes(2, 2, &[0, 1, 2]).is_err());
        let mask = Mask::from_bytes(2, 1, &[0, 255]).unwrap();
        assert_eq!(mask.get(1, 0), 1.0);
    }

    #[test]
    fn test_values_are_clamped() {
        let mask = Mask::from_values(3, 1, vec![-1.0, 0.5, 7.0]).unwrap();
        assert_eq!(mask.values(), &[0.0, 0.5, 1.0]);
        assert_eq!(Mask::filled(1, 1, 3.0).get(0, 0), 1.0);
    }

    #[test]
    fn test_accumulate_never_exceeds_one() {
        let mut mask = Mask::new(1, 1);
        for _ in 0..500 {
            mask.accumulate(0, 0.3);
        }
        assert!(mask.get(0, 0) <= 1.0);
        assert!(mask.get(0, 0) > 0.99);
    }

    #[test]
    fn test_json_uses_byte_representation() {
        let mask = Mask::from_bytes(2, 1, &[0, 128]).unwrap();
        let json = serde_json::to_string(&mask).unwrap();
        assert_eq!(json, r#"{"width":2,"height":1,"data":[0,128]}"#);
        let back: Mask = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mask);
    }
}
