//! RGB histogram of a rendered print.

use serde::{Deserialize, Serialize};

use crate::image::PrintImage;

/// Bins per channel.
pub const HISTOGRAM_BINS: usize = 256;

/// Histogram data for R, G and B channels (256 bins each).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin counts for `[R, G, B]`. Each `Vec` has 256 entries.
    pub bins: [Vec<u32>; 3],
    /// Peak bin value across all channels (for normalization).
    pub peak: u32,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            bins: std::array::from_fn(|_| vec![0; HISTOGRAM_BINS]),
            peak: 0,
        }
    }
}

impl Histogram {
    /// Count every `stride`-th pixel in each axis. A stride of 0 counts every pixel.
    pub fn from_print(image: &PrintImage, stride: u32) -> Self {
        let stride = stride.max(1) as usize;
        let mut histogram = Self::default();
        if image.width == 0 || image.height == 0 {
            return histogram;
        }
        for row in image.pixels.chunks_exact(image.width as usize).step_by(stride) {
            for px in row.iter().step_by(stride) {
                for (channel, bins) in histogram.bins.iter_mut().enumerate() {
                    bins[usize::from(px[channel])] += 1;
                }
            }
        }
        histogram.update_peak();
        histogram
    }

    /// Build from a flat `[R×256, G×256, B×256]` count buffer, as read back from the GPU.
    ///
    /// Returns `None` if the buffer is not exactly `3 × 256` entries.
    pub fn from_flat(counts: &[u32]) -> Option<Self> {
        if counts.len() != 3 * HISTOGRAM_BINS {
            return None;
        }
        let mut histogram = Self {
            bins: std::array::from_fn(|c| {
                counts[c * HISTOGRAM_BINS..(c + 1) * HISTOGRAM_BINS].to_vec()
            }),
            peak: 0,
        };
        histogram.update_peak();
        Some(histogram)
    }

    /// Number of samples counted per channel.
    pub fn samples(&self) -> u64 {
        self.bins[0].iter().map(|&c| u64::from(c)).sum()
    }

    /// Bins divided by the peak, for drawing.
    pub fn normalized(&self) -> [Vec<f32>; 3] {
        let peak = self.peak.max(1) as f32;
        std::array::from_fn(|c| self.bins[c].iter().map(|&v| v as f32 / peak).collect())
    }

    fn update_peak(&mut self) {
        self.peak = self
            .bins
            .iter()
            .flat_map(|b| b.iter().copied())
            .max()
            .unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> PrintImage {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        PrintImage {
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn test_empty_image_is_all_zero() {
        let h = Histogram::from_print(&print(0, 0, |_, _| [0; 4]), 4);
        assert_eq!(h.peak, 0);
        assert!(h.bins.iter().all(|b| b.len() == HISTOGRAM_BINS && b.iter().all(|&v| v == 0)));
    }

    #[test]
    fn test_counts_every_channel() {
        let img = print(4, 2, |x, _| [x as u8, 10, 255, 255]);
        let h = Histogram::from_print(&img, 1);
        assert_eq!(h.samples(), 8);
        assert_eq!(h.bins[0][0], 2);
        assert_eq!(h.bins[0][3], 2);
        assert_eq!(h.bins[1][10], 8);
        assert_eq!(h.bins[2][255], 8);
        assert_eq!(h.peak, 8);
    }

    #[test]
    fn test_stride_subsamples_both_axes() {
        let img = print(9, 9, |_, _| [128, 128, 128, 255]);
        // rows 0,4,8 × cols 0,4,8
        assert_eq!(Histogram::from_print(&img, 4).samples(), 9);
        assert_eq!(Histogram::from_print(&img, 0).samples(), 81);
    }

    #[test]
    fn test_normalized_peak_is_one() {
        let img = print(3, 1, |x, _| [if x == 0 { 0 } else { 200 }, 0, 0, 255]);
        let h = Histogram::from_print(&img, 1);
        let n = h.normalized();
        assert_eq!(n[1][0], 1.0);
        assert!((n[0][200] - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_flat_checks_length() {
        assert!(Histogram::from_flat(&[0; 10]).is_none());
        let mut flat = vec![0u32; 3 * HISTOGRAM_BINS];
        flat[HISTOGRAM_BINS + 7] = 5;
        let h = Histogram::from_flat(&flat).unwrap();
        assert_eq!(h.bins[1][7], 5);
        assert_eq!(h.peak, 5);
    }
}
