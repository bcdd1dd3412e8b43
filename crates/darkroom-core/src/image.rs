//! Image representations: the negative's transmittance field and the rendered print.

use crate::error::DarkroomError;
use crate::exposure::LOG_EPSILON;

/// Rec. 601 luma weights used to grey the source photograph.
const LUMA_REC601: [f32; 3] = [0.299, 0.587, 0.114];

/// How much light the digital negative passes at each pixel.
///
/// Derived once per loaded image: the source is converted to luma,
/// inverted, and normalized so that `trans ∈ [0, 1]`. The `log10` of every
/// value is kept alongside for the CPU fast path; zeros are guarded with
/// [`LOG_EPSILON`] before the logarithm.
#[derive(Debug, Clone, PartialEq)]
pub struct Transmittance {
    width: u32,
    height: u32,
    values: Vec<f32>,
    log10: Vec<f32>,
}

impl Transmittance {
    /// Build from tightly packed RGBA8 pixels. Alpha is ignored.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> Result<Self, DarkroomError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(DarkroomError::BufferSize {
                expected,
                actual: rgba.len(),
            });
        }
        let values = rgba
            .chunks_exact(4)
            .map(|px| transmittance(px[0], px[1], px[2]))
            .collect();
        Ok(Self::from_values(width, height, values))
    }

    /// Build from a decoded image of any pixel format.
    pub fn from_image(image: &image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let values = rgba
            .pixels()
            .map(|p| transmittance(p.0[0], p.0[1], p.0[2]))
            .collect();
        Self::from_values(width, height, values)
    }

    /// A field with the same transmittance everywhere.
    pub fn uniform(width: u32, height: u32, trans: f32) -> Self {
        Self::from_values(
            width,
            height,
            vec![trans.clamp(0.0, 1.0); width as usize * height as usize],
        )
    }

    fn from_values(width: u32, height: u32, values: Vec<f32>) -> Self {
        let log10 = values.iter().map(|&t| t.max(LOG_EPSILON).log10()).collect();
        Self {
            width,
            height,
            values,
            log10,
        }
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

    pub fn pixel_count(&self) -> usize {
        self.values.len()
    }

    /// Row-major transmittance values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Row-major `log10(max(ε, trans))`.
    pub fn log10(&self) -> &[f32] {
        &self.log10
    }
}

/// Inverted Rec. 601 luma: black source pixels pass all light.
fn transmittance(r: u8, g: u8, b: u8) -> f32 {
    let luma = LUMA_REC601[0] * f32::from(r)
        + LUMA_REC601[1] * f32::from(g)
        + LUMA_REC601[2] * f32::from(b);
    ((255.0 - luma) / 255.0).clamp(0.0, 1.0)
}

/// A rendered print in RGBA8, alpha always opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
}

impl PrintImage {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Flat RGBA bytes.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }

    /// Convert into an `image` buffer for encoding.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.as_bytes())
    }
}
