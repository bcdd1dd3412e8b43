//! Brush stamps: radial falloff kernel, dodge accumulation and erase.
//!
//! # Kernel
//! A stamp covers a disc of radius `r` pixels. Inside the inner radius
//! `r × (1 − feather)` it has full strength; between the inner and outer
//! radius strength eases out quadratically to zero:
//! ```text
//! t       = (d − inner) / (r − inner)
//! falloff = (1 − t)²
//! ```
//! Dodge stamps multiply the falloff by the brush flow and accumulate with
//! `m ← m + a·(1 − m)`, so repeated passes converge on 1 without overshoot.
//! Erase stamps ignore flow and feather and clear the whole disc at once.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::mask::Mask;

/// Default per-stamp flow. Low flow models gradual analog buildup.
pub const DEFAULT_FLOW: f32 = 0.08;

/// The active mask tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    /// Hold back light from the exposure.
    #[default]
    Dodge,
    /// Remove previously painted dodge.
    Erase,
}

/// Brush controls as exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    /// Brush size as a percentage, `0..=100`.
    pub size: f32,
    /// Feather as a percentage of the radius, `0..=100`.
    pub feather: f32,
    /// Strength of a single dodge stamp, `0..=1`.
    pub flow: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            size: 20.0,
            feather: 50.0,
            flow: DEFAULT_FLOW,
        }
    }
}

impl BrushSettings {
    pub fn set_size(&mut self, percent: f32) {
        self.size = clamp_percent(percent);
    }

    pub fn set_feather(&mut self, percent: f32) {
        self.feather = clamp_percent(percent);
    }

    pub fn set_flow(&mut self, flow: f32) {
        self.flow = if flow.is_nan() { 0.0 } else { flow.clamp(0.0, 1.0) };
    }

    /// Outer radius in pixels for a mask of the given size.
    ///
    /// 100% spans a quarter of the shorter image side; the radius never
    /// drops below one pixel.
    pub fn radius_px(&self, width: u32, height: u32) -> f32 {
        let short_side = width.min(height) as f32;
        (clamp_percent(self.size) / 100.0 * short_side / 4.0).max(1.0)
    }

    /// Distance between stamps along a segment: half the brush diameter.
    pub fn spacing_px(&self, width: u32, height: u32) -> f32 {
        self.radius_px(width, height)
    }

    /// Kernel strength at distance `d` from the stamp centre.
    pub fn falloff(&self, distance: f32, radius: f32) -> f32 {
        if distance >= radius {
            return 0.0;
        }
        let inner = radius * (1.0 - clamp_percent(self.feather) / 100.0);
        if distance <= inner {
            return 1.0;
        }
        let t = (distance - inner) / (radius - inner);
        let eased = 1.0 - t;
        eased * eased
    }
}

fn clamp_percent(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) }
}

/// Apply one stamp centred at `center` (pixel coordinates).
pub fn stamp(mask: &mut Mask, center: Vec2, brush: &BrushSettings, tool: Tool) {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let radius = brush.radius_px(width, height);

    let x0 = (center.x - radius).floor().max(0.0) as u32;
    let y0 = (center.y - radius).floor().max(0.0) as u32;
    let x1 = ((center.x + radius).ceil().max(0.0) as u32).min(width);
    let y1 = ((center.y + radius).ceil().max(0.0) as u32).min(height);

    for y in y0..y1 {
        for x in x0..x1 {
            let pixel_center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let distance = pixel_center.distance(center);
            if distance >= radius {
                continue;
            }
            let index = (y * width + x) as usize;
            match tool {
                Tool::Dodge => {
                    let amount = brush.flow * brush.falloff(distance, radius);
                    if amount > 0.0 {
                        mask.accumulate(index, amount);
                    }
                }
                Tool::Erase => mask.remove(index, 1.0),
            }
        }
    }
}

/// Stamp along the segment `from → to`, excluding `from` itself.
///
/// Stamps are spaced at half the brush diameter so fast pointer motion
/// leaves no gaps. Returns the number of stamps applied.
pub fn stamp_segment(
    mask: &mut Mask,
    from: Vec2,
    to: Vec2,
    brush: &BrushSettings,
    tool: Tool,
) -> usize {
    let (width, height) = mask.dimensions();
    let spacing = brush.spacing_px(width, height);
    let length = from.distance(to);
    if length <= f32::EPSILON {
        return 0;
    }

    let steps = (length / spacing).ceil().max(1.0) as usize;
    for i in 1..=steps {
        let t = i as f32 / steps as f32;
        stamp(mask, from.lerp(to, t), brush, tool);
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brush(size: f32, feather: f32, flow: f32) -> BrushSettings {
        BrushSettings {
            size,
            feather,
            flow,
        }
    }

    #[test]
    fn test_falloff_profile() {
        let b = brush(50.0, 50.0, 1.0);
        assert_eq!(b.falloff(0.0, 10.0), 1.0);
        assert_eq!(b.falloff(5.0, 10.0), 1.0);
        assert_eq!(b.falloff(10.0, 10.0), 0.0);
        let mid = b.falloff(7.5, 10.0);
        assert!((mid - 0.25).abs() < 1e-6, "quadratic ease at t=0.5, got {mid}");
    }

    #[test]
    fn test_hard_brush_has_no_falloff() {
        let b = brush(50.0, 0.0, 1.0);
        assert_eq!(b.falloff(9.9, 10.0), 1.0);
    }

    #[test]
    fn test_radius_tracks_image_size() {
        let b = brush(100.0, 0.0, 1.0);
        assert_eq!(b.radius_px(400, 200), 50.0);
        let tiny = brush(0.0, 0.0, 1.0);
        assert_eq!(tiny.radius_px(400, 200), 1.0);
    }

    #[test]
    fn test_settings_clamp_to_percent() {
        let mut b = BrushSettings::default();
        b.set_size(250.0);
        b.set_feather(-3.0);
        b.set_flow(2.0);
        assert_eq!((b.size, b.feather, b.flow), (100.0, 0.0, 1.0));
    }

    #[test]
    fn test_repeated_dodge_converges_below_one() {
        let mut mask = Mask::new(32, 32);
        let b = brush(40.0, 0.0, 0.2);
        let center = Vec2::new(16.0, 16.0);
        let mut previous = 0.0;
        for _ in 0..200 {
            stamp(&mut mask, center, &b, Tool::Dodge);
            let v = mask.get(16, 16);
            assert!(v >= previous);
            assert!(v <= 1.0);
            previous = v;
        }
        assert!(previous > 0.999);
        assert!(mask.values().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_erase_clears_painted_area() {
        let mut mask = Mask::filled(32, 32, 0.8);
        let b = brush(20.0, 90.0, 0.05);
        stamp(&mut mask, Vec2::new(16.0, 16.0), &b, Tool::Erase);
        assert_eq!(mask.get(16, 16), 0.0);
        assert_eq!(mask.get(0, 0), 0.8);
        assert!(mask.values().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_stamp_outside_mask_is_harmless() {
        let mut mask = Mask::new(8, 8);
        let b = brush(100.0, 0.0, 1.0);
        stamp(&mut mask, Vec2::new(-50.0, -50.0), &b, Tool::Dodge);
        stamp(&mut mask, Vec2::new(500.0, 3.0), &b, Tool::Dodge);
        assert!(mask.is_clear());
    }

    #[test]
    fn test_segment_has_no_gaps() {
        let mut mask = Mask::new(200, 20);
        let b = brush(40.0, 0.0, 1.0);
        // radius = 0.4 * 20 / 4 = 2px, spacing 2px
        let (from, to) = (Vec2::new(2.0, 10.0), Vec2::new(198.0, 10.0));
        let steps = stamp_segment(&mut mask, from, to, &b, Tool::Dodge);
        assert_eq!(steps, 98);
        for x in 2..198 {
            assert!(mask.get(x, 9) > 0.0, "gap at x={x}");
        }
    }

    #[test]
    fn test_zero_length_segment_stamps_nothing() {
        let mut mask = Mask::new(8, 8);
        let p = Vec2::new(4.0, 4.0);
        assert_eq!(stamp_segment(&mut mask, p, p, &BrushSettings::default(), Tool::Dodge), 0);
        assert!(mask.is_clear());
    }
}
