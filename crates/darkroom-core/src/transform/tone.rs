//! Three-zone paper tone: maps a print value onto the paper's colour response.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DarkroomError;
use crate::paper::PaperTone;

/// Byte tone above which the threshold blend uses the highlight multiplier.
pub const HIGHLIGHT_THRESHOLD: u8 = 192;
/// Byte tone above which the threshold blend uses the midtone multiplier.
pub const MIDTONE_THRESHOLD: u8 = 64;

/// How the shadow/midtone/highlight multipliers are combined.
///
/// Both modes are implemented by the CPU loop and by `composite.wgsl`; the
/// active mode is chosen by configuration and applied to whichever backend
/// renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToneBlend {
    /// Smooth zone weights driven by print reflectance.
    #[default]
    Reflectance,
    /// Hard zones at byte tones 64 and 192.
    Threshold,
}

impl ToneBlend {
    /// GPU-compatible integer for the shader uniform.
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::Reflectance => 0,
            Self::Threshold => 1,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Reflectance => "reflectance",
            Self::Threshold => "threshold",
        }
    }
}

impl fmt::Display for ToneBlend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ToneBlend {
    type Err = DarkroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reflectance" => Ok(Self::Reflectance),
            "threshold" => Ok(Self::Threshold),
            other => Err(DarkroomError::Config(format!("unknown tone blend {other:?}"))),
        }
    }
}

/// Zone weights `[shadows, midtones, highlights]` for a print value in `[0, 1]`.
///
/// ```text
/// shadows    = 1 − smoothstep(0, 0.5, v)
/// highlights = smoothstep(0.5, 1, v)
/// midtones   = 1 − shadows − highlights
/// ```
pub fn zone_weights(value: f32) -> [f32; 3] {
    let v = value.clamp(0.0, 1.0);
    let shadows = 1.0 - smoothstep(0.0, 0.5, v);
    let highlights = smoothstep(0.5, 1.0, v);
    [shadows, 1.0 - shadows - highlights, highlights]
}

/// Map a print value (0 = black, 1 = paper white) to display RGB.
pub fn tone_map(value: f32, tone: &PaperTone, blend: ToneBlend) -> [u8; 3] {
    let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    match blend {
        ToneBlend::Reflectance => {
            let [s, m, h] = zone_weights(v);
            std::array::from_fn(|c| {
                let mult = s * tone.shadows[c] + m * tone.midtones[c] + h * tone.highlights[c];
                to_byte(v * mult)
            })
        }
        ToneBlend::Threshold => {
            let byte_tone = to_byte(v);
            let mult = if byte_tone > HIGHLIGHT_THRESHOLD {
                tone.highlights
            } else if byte_tone > MIDTONE_THRESHOLD {
                tone.midtones
            } else {
                tone.shadows
            };
            std::array::from_fn(|c| {
                (f32::from(byte_tone) * mult[c]).round().clamp(0.0, 255.0) as u8
            })
        }
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEUTRAL: PaperTone = PaperTone {
        highlights: [1.0, 1.0, 1.0],
        midtones: [1.0, 1.0, 1.0],
        shadows: [1.0, 1.0, 1.0],
    };

    const SPLIT: PaperTone = PaperTone {
        highlights: [1.0, 0.0, 0.0],
        midtones: [0.0, 1.0, 0.0],
        shadows: [0.0, 0.0, 1.0],
    };

    #[test]
    fn test_zone_weights_sum_to_one() {
        for i in 0..=100 {
            let w = zone_weights(i as f32 / 100.0);
            assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-6);
            assert!(w.iter().all(|&x| (0.0..=1.0).contains(&x)));
        }
        assert_eq!(zone_weights(0.0), [1.0, 0.0, 0.0]);
        assert_eq!(zone_weights(0.5), [0.0, 1.0, 0.0]);
        assert_eq!(zone_weights(1.0), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_neutral_paper_is_grey_in_both_modes() {
        for blend in [ToneBlend::Reflectance, ToneBlend::Threshold] {
            assert_eq!(tone_map(1.0, &NEUTRAL, blend), [255, 255, 255]);
            assert_eq!(tone_map(0.0, &NEUTRAL, blend), [0, 0, 0]);
            assert_eq!(tone_map(0.5, &NEUTRAL, blend), [128, 128, 128]);
        }
    }

    #[test]
    fn test_threshold_zones() {
        // 0.8 → byte 204 > 192 → highlights (red only)
        assert_eq!(tone_map(0.8, &SPLIT, ToneBlend::Threshold), [204, 0, 0]);
        // 0.5 → byte 128 → midtones (green)
        assert_eq!(tone_map(0.5, &SPLIT, ToneBlend::Threshold), [0, 128, 0]);
        // 0.2 → byte 51 → shadows (blue)
        assert_eq!(tone_map(0.2, &SPLIT, ToneBlend::Threshold), [0, 0, 51]);
    }

    #[test]
    fn test_reflectance_blends_zones() {
        let rgb = tone_map(0.75, &SPLIT, ToneBlend::Reflectance);
        // Halfway between midtone and highlight zones.
        assert_eq!(rgb[2], 0);
        assert!(rgb[0] > 0 && rgb[1] > 0);
        assert_eq!(rgb[0], rgb[1]);
    }

    #[test]
    fn test_parse_blend() {
        assert_eq!("threshold".parse::<ToneBlend>().unwrap(), ToneBlend::Threshold);
        assert!("sepia".parse::<ToneBlend>().is_err());
    }
}
