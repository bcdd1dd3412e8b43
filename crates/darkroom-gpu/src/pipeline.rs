//! Top-level GPU print pipeline: composite pass, optional histogram, readback.

use std::num::NonZeroU64;

use parking_lot::Mutex;

use darkroom_core::exposure::{self, Exposure};
use darkroom_core::image::{PrintImage, Transmittance};
use darkroom_core::paper::Paper;
use darkroom_core::scopes::Histogram;
use darkroom_core::transform::lut::SigmoidLut;
use darkroom_core::transform::render::RenderSettings;

use crate::buffers::{CompositeInputs, CompositeUniforms, GrowableBuffer};
use crate::context::{GpuContext, GpuError};
use crate::readback::StagingCache;
use crate::scope_dispatch::ScopeDispatch;

/// Invocations per workgroup in every darkroom shader.
pub const WORKGROUP_SIZE: u32 = 256;
/// WebGPU's guaranteed per-dimension dispatch limit.
const MAX_WORKGROUPS_PER_DIM: u32 = 65_535;

/// Storage buffers reused between frames.
struct FrameBuffers {
    log_trans: GrowableBuffer,
    masks: GrowableBuffer,
    lut: GrowableBuffer,
    output: GrowableBuffer,
    print_upload: GrowableBuffer,
}

impl FrameBuffers {
    fn new() -> Self {
        let input = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;
        Self {
            log_trans: GrowableBuffer::new("darkroom_log_trans", input),
            masks: GrowableBuffer::new("darkroom_masks", input),
            lut: GrowableBuffer::new("darkroom_sigmoid_lut", input),
            output: GrowableBuffer::new(
                "darkroom_print_output",
                wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            ),
            print_upload: GrowableBuffer::new("darkroom_print_upload", input),
        }
    }
}

/// Renders prints with the `composite.wgsl` compute shader.
pub struct GpuPrinter {
    ctx: GpuContext,
    composite_pipeline: wgpu::ComputePipeline,
    composite_layout: wgpu::BindGroupLayout,
    uniforms: wgpu::Buffer,
    scopes: ScopeDispatch,
    frame: Mutex<FrameBuffers>,
    pixel_staging: StagingCache,
}

impl GpuPrinter {
    /// Build the pipelines on an existing context.
    pub fn new(ctx: GpuContext) -> Self {
        let device = &ctx.device;
        let (composite_pipeline, composite_layout) = create_compute_pipeline(
            device,
            "composite",
            include_str!("../shaders/composite.wgsl"),
            &[
                uniform_entry(0, CompositeUniforms::SIZE),
                storage_ro_entry(1), // log10 transmittance
                storage_ro_entry(2), // packed masks
                storage_ro_entry(3), // sigmoid lut
                storage_rw_entry(4), // packed rgba8 output
            ],
        );
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("darkroom_composite_uniforms"),
            size: CompositeUniforms::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let scopes = ScopeDispatch::new(device);
        Self {
            composite_pipeline,
            composite_layout,
            uniforms,
            scopes,
            frame: Mutex::new(FrameBuffers::new()),
            pixel_staging: StagingCache::new("darkroom_print_staging"),
            ctx,
        }
    }

    /// Create a device and pipelines. Fails with [`GpuError::NoAdapter`] on
    /// machines without a usable GPU.
    pub fn create_blocking() -> Result<Self, GpuError> {
        Ok(Self::new(GpuContext::create_blocking()?))
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Render a print. `Ok(None)` when there is nothing to expose.
    pub fn render(
        &self,
        paper: &Paper,
        exposures: &[Exposure],
        negative: &Transmittance,
        lut: &SigmoidLut,
        settings: &RenderSettings,
    ) -> Result<Option<PrintImage>, GpuError> {
        Ok(self
            .run(paper, exposures, negative, lut, settings, None)?
            .map(|(print, _)| print))
    }

    /// Render a print and histogram it on the GPU in the same submission.
    pub fn render_with_histogram(
        &self,
        paper: &Paper,
        exposures: &[Exposure],
        negative: &Transmittance,
        lut: &SigmoidLut,
        settings: &RenderSettings,
        stride: u32,
    ) -> Result<Option<(PrintImage, Histogram)>, GpuError> {
        let Some((print, histogram)) =
            self.run(paper, exposures, negative, lut, settings, Some(stride))?
        else {
            return Ok(None);
        };
        let histogram =
            histogram.ok_or_else(|| GpuError::Readback("histogram pass missing".into()))?;
        Ok(Some((print, histogram)))
    }

    /// Histogram an already rendered print on the GPU.
    pub fn histogram(&self, print: &PrintImage, stride: u32) -> Result<Histogram, GpuError> {
        let device = &self.ctx.device;
        let queue = &self.ctx.queue;
        let packed: Vec<u32> = print.pixels.iter().map(|p| u32::from_le_bytes(*p)).collect();
        self.ctx.check_storage_size((packed.len() * 4) as u64)?;

        let mut frame = self.frame.lock();
        let pixels = frame
            .print_upload
            .upload(device, queue, bytemuck::cast_slice(&packed));
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("darkroom_histogram_encoder"),
        });
        self.scopes
            .encode(device, queue, &mut encoder, pixels, print.width, print.height, stride);
        queue.submit(std::iter::once(encoder.finish()));
        let histogram = self.scopes.read(device, queue);
        drop(frame);
        histogram
    }

    fn run(
        &self,
        paper: &Paper,
        exposures: &[Exposure],
        negative: &Transmittance,
        lut: &SigmoidLut,
        settings: &RenderSettings,
        histogram_stride: Option<u32>,
    ) -> Result<Option<(PrintImage, Option<Histogram>)>, GpuError> {
        let exposures = exposure::renderable(exposures);
        let pixel_count = negative.pixel_count();
        if exposures.is_empty() || pixel_count == 0 {
            return Ok(None);
        }
        let start = std::time::Instant::now();
        let device = &self.ctx.device;
        let queue = &self.ctx.queue;

        let inputs = CompositeInputs::new(paper, exposures, negative, lut, settings);
        let pixel_bytes = (pixel_count * std::mem::size_of::<u32>()) as u64;
        self.ctx.check_storage_size(pixel_bytes)?;
        self.ctx
            .check_storage_size((inputs.masks.len() * std::mem::size_of::<f32>()) as u64)?;

        // Uniforms and scope bins are shared too; hold the frame lock until
        // the last readback.
        let mut frame = self.frame.lock();
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&inputs.uniforms));
        let FrameBuffers {
            log_trans,
            masks,
            lut: lut_buffer,
            output,
            ..
        } = &mut *frame;
        let log_trans = log_trans.upload(device, queue, bytemuck::cast_slice(negative.log10()));
        let masks = masks.upload(device, queue, bytemuck::cast_slice(&inputs.masks));
        let lut_buffer = lut_buffer.upload(device, queue, bytemuck::cast_slice(lut.values()));
        let output = output.ensure(device, pixel_bytes);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("darkroom_composite_bg"),
            layout: &self.composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: log_trans.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: masks.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: lut_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: output.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("darkroom_composite_encoder"),
        });
        {
            let (x, y) = workgroup_grid(pixel_count as u32);
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("darkroom_composite_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.composite_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(x, y, 1);
        }
        if let Some(stride) = histogram_stride {
            self.scopes.encode(
                device,
                queue,
                &mut encoder,
                output,
                negative.width(),
                negative.height(),
                stride,
            );
        }
        queue.submit(std::iter::once(encoder.finish()));

        let packed: Vec<u32> = self
            .pixel_staging
            .download(device, queue, output, pixel_bytes)?;
        let histogram = match histogram_stride {
            Some(_) => Some(self.scopes.read(device, queue)?),
            None => None,
        };

        tracing::debug!(
            width = negative.width(),
            height = negative.height(),
            exposures = exposures.len(),
            "gpu composite in {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        let print = PrintImage {
            width: negative.width(),
            height: negative.height(),
            pixels: packed.into_iter().map(u32::to_le_bytes).collect(),
        };
        Ok(Some((print, histogram)))
    }
}

/// Workgroup counts covering `pixel_count` invocations, split into 2D when
/// a single dimension would exceed the dispatch limit.
pub fn workgroup_grid(pixel_count: u32) -> (u32, u32) {
    let groups = pixel_count.div_ceil(WORKGROUP_SIZE).max(1);
    let x = groups.min(MAX_WORKGROUPS_PER_DIM);
    (x, groups.div_ceil(x))
}

// ── Helpers ─────────────────────────────────────────────────────────

pub(crate) fn storage_ro_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(4),
        },
        count: None,
    }
}

pub(crate) fn storage_rw_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(4),
        },
        count: None,
    }
}

pub(crate) fn uniform_entry(binding: u32, min_size: u64) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(min_size),
        },
        count: None,
    }
}

pub(crate) fn create_compute_pipeline(
    device: &wgpu::Device,
    name: &str,
    wgsl_source: &str,
    layout_entries: &[wgpu::BindGroupLayoutEntry],
) -> (wgpu::ComputePipeline, wgpu::BindGroupLayout) {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("darkroom_{name}_shader")),
        source: wgpu::ShaderSource::Wgsl(wgsl_source.into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("darkroom_{name}_layout")),
        entries: layout_entries,
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("darkroom_{name}_pipeline_layout")),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    // Entry point names match the pipeline names.
    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(&format!("darkroom_{name}_pipeline")),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some(name),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    });

    (pipeline, bind_group_layout)
}
