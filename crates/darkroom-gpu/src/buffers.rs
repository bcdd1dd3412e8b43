//! GPU buffer management for the print pipeline.

use darkroom_core::MAX_EXPOSURES;
use darkroom_core::exposure::Exposure;
use darkroom_core::image::Transmittance;
use darkroom_core::paper::Paper;
use darkroom_core::transform::evaluate::ExposureTerm;
use darkroom_core::transform::lut::SigmoidLut;
use darkroom_core::transform::render::{RenderSettings, usable_mask};

/// Smallest buffer we allocate, so empty inputs stay bindable.
pub const MIN_BINDING_BYTES: u64 = 16;

/// One exposure as seen by `composite.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ExposureGpu {
    pub log_time: f32,
    pub k: f32,
    pub midtone_log_e: f32,
    /// Index into the packed mask buffer, or -1 for no mask.
    pub mask_slot: i32,
}

/// Uniform block for the composite pass. 16-byte aligned rows.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeUniforms {
    /// `d_min, d_max, lut_lo, lut_hi`.
    pub paper: [f32; 4],
    /// `exposure_count, pixel_count, lut_len, tone_mode`.
    pub counts: [u32; 4],
    pub highlights: [f32; 4],
    pub midtones: [f32; 4],
    pub shadows: [f32; 4],
    pub exposures: [ExposureGpu; MAX_EXPOSURES],
}

impl CompositeUniforms {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

/// Per-frame inputs for the composite pass, flattened for upload.
pub struct CompositeInputs {
    pub uniforms: CompositeUniforms,
    /// Masks of the masked exposures, concatenated in slot order.
    pub masks: Vec<f32>,
}

impl CompositeInputs {
    /// Flatten `exposures` (already capped) against the negative.
    ///
    /// Masks whose size does not match the negative get no slot, exactly as
    /// the CPU path treats them as absent.
    pub fn new(
        paper: &Paper,
        exposures: &[Exposure],
        negative: &Transmittance,
        lut: &SigmoidLut,
        settings: &RenderSettings,
    ) -> Self {
        let mut gpu_exposures = [ExposureGpu::default(); MAX_EXPOSURES];
        let mut masks = Vec::new();
        let mut slots = 0;
        for (slot, exposure) in gpu_exposures.iter_mut().zip(exposures) {
            let term = ExposureTerm::new(paper, exposure);
            let mask_slot = match usable_mask(exposure, negative) {
                Some(values) => {
                    masks.extend_from_slice(values);
                    slots += 1;
                    slots - 1
                }
                None => -1,
            };
            *slot = ExposureGpu {
                log_time: term.log_time,
                k: term.k,
                midtone_log_e: term.midtone_log_e,
                mask_slot,
            };
        }

        let tone = &paper.tone;
        let rgb = |c: [f32; 3]| [c[0], c[1], c[2], 0.0];
        let uniforms = CompositeUniforms {
            paper: [paper.d_min, paper.d_max, lut.lo(), lut.hi()],
            counts: [
                exposures.len().min(MAX_EXPOSURES) as u32,
                negative.pixel_count() as u32,
                lut.len() as u32,
                settings.tone_blend.to_u32(),
            ],
            highlights: rgb(tone.highlights),
            midtones: rgb(tone.midtones),
            shadows: rgb(tone.shadows),
            exposures: gpu_exposures,
        };
        Self { uniforms, masks }
    }
}

/// A storage buffer that is reallocated only when it must grow.
pub struct GrowableBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: Option<wgpu::Buffer>,
}

impl GrowableBuffer {
    pub fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self {
            label,
            usage,
            buffer: None,
        }
    }

    /// A buffer of at least `size` bytes (and never below [`MIN_BINDING_BYTES`]).
    pub fn ensure(&mut self, device: &wgpu::Device, size: u64) -> &wgpu::Buffer {
        let size = padded_size(size);
        let buffer = match self.buffer.take() {
            Some(buf) if buf.size() >= size => buf,
            _ => {
                tracing::debug!(label = self.label, size, "allocating gpu buffer");
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(self.label),
                    size,
                    usage: self.usage,
                    mapped_at_creation: false,
                })
            }
        };
        self.buffer.insert(buffer)
    }

    /// Grow if needed, then write `data` at offset 0.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
    ) -> &wgpu::Buffer {
        let buffer = self.ensure(device, data.len() as u64);
        if !data.is_empty() {
            queue.write_buffer(buffer, 0, data);
        }
        buffer
    }
}

/// Round up to a copy-aligned size no smaller than [`MIN_BINDING_BYTES`].
pub fn padded_size(size: u64) -> u64 {
    size.max(MIN_BINDING_BYTES)
        .next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use darkroom_core::mask::Mask;
    use darkroom_core::paper::PaperKind;

    #[test]
    fn test_uniform_block_layout() {
        // 5 rows of vec4 + 12 exposures of 16 bytes
        assert_eq!(CompositeUniforms::SIZE, 5 * 16 + 12 * 16);
        assert_eq!(std::mem::size_of::<ExposureGpu>(), 16);
    }

    #[test]
    fn test_mask_slots_skip_unmasked_and_mismatched() {
        let paper = PaperKind::IlfordMultigrade.paper();
        let negative = Transmittance::uniform(2, 2, 1.0);
        let lut = SigmoidLut::default();
        let mut a = Exposure::with_time_and_grade(4.0, 3);
        a.mask = Some(Mask::filled(2, 2, 0.5));
        let b = Exposure::with_time_and_grade(4.0, 3);
        let mut c = Exposure::with_time_and_grade(4.0, 3);
        c.mask = Some(Mask::filled(3, 3, 0.5));
        let mut d = Exposure::with_time_and_grade(4.0, 3);
        d.mask = Some(Mask::filled(2, 2, 1.0));

        let inputs =
            CompositeInputs::new(paper, &[a, b, c, d], &negative, &lut, &RenderSettings::default());
        let slots: Vec<i32> = inputs.uniforms.exposures[..4].iter().map(|e| e.mask_slot).collect();
        assert_eq!(slots, vec![0, -1, -1, 1]);
        assert_eq!(inputs.masks, vec![0.5, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(inputs.uniforms.counts[0], 4);
        assert_eq!(inputs.uniforms.counts[1], 4);
    }

    #[test]
    fn test_padded_size() {
        assert_eq!(padded_size(0), 16);
        assert_eq!(padded_size(17), 20);
        assert_eq!(padded_size(64), 64);
    }
}
