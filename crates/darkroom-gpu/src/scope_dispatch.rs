//! GPU compute dispatch for the print histogram.

use darkroom_core::scopes::{HISTOGRAM_BINS, Histogram};

use crate::context::GpuError;
use crate::pipeline::{
    create_compute_pipeline, storage_ro_entry, storage_rw_entry, uniform_entry, workgroup_grid,
};
use crate::readback::StagingCache;

const BIN_BYTES: u64 = (3 * HISTOGRAM_BINS * std::mem::size_of::<u32>()) as u64;

/// Dispatches `histogram.wgsl` and reads the bins back.
pub struct ScopeDispatch {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    params: wgpu::Buffer,
    bins: wgpu::Buffer,
    staging: StagingCache,
}

impl ScopeDispatch {
    pub fn new(device: &wgpu::Device) -> Self {
        let (pipeline, layout) = create_compute_pipeline(
            device,
            "histogram",
            include_str!("../shaders/histogram.wgsl"),
            &[storage_ro_entry(0), storage_rw_entry(1), uniform_entry(2, 16)],
        );
        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("darkroom_histogram_params"),
            size: 16,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bins = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("darkroom_histogram_bins"),
            size: BIN_BYTES,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            pipeline,
            layout,
            params,
            bins,
            staging: StagingCache::new("darkroom_histogram_staging"),
        }
    }

    /// Record a histogram pass over packed RGBA8 `pixels`.
    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        pixels: &wgpu::Buffer,
        width: u32,
        height: u32,
        stride: u32,
    ) {
        let pixel_count = width * height;
        queue.write_buffer(
            &self.params,
            0,
            bytemuck::cast_slice(&[pixel_count, width.max(1), stride.max(1), 0]),
        );
        encoder.clear_buffer(&self.bins, 0, None);
        if pixel_count == 0 {
            return;
        }

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("darkroom_histogram_bg"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: pixels.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.bins.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.params.as_entire_binding(),
                },
            ],
        });
        let (x, y) = workgroup_grid(pixel_count);
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("darkroom_histogram_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(x, y, 1);
    }

    /// Read the bins written by the last submitted [`encode`](Self::encode).
    pub fn read(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Histogram, GpuError> {
        let flat: Vec<u32> = self.staging.download(device, queue, &self.bins, BIN_BYTES)?;
        Histogram::from_flat(&flat).ok_or_else(|| {
            GpuError::Readback(format!(
                "expected {} bins, got {}",
                3 * HISTOGRAM_BINS,
                flat.len()
            ))
        })
    }
}
