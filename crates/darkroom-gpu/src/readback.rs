//! GPU-to-CPU readback of print pixels and histogram bins.

use parking_lot::Mutex;

use crate::context::GpuError;

/// Reusable `MAP_READ` staging buffer.
pub struct StagingCache {
    label: &'static str,
    buffer: Mutex<Option<wgpu::Buffer>>,
}

impl StagingCache {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            buffer: Mutex::new(None),
        }
    }

    /// Copy `size` bytes of `source` back to the CPU. Blocks until complete.
    pub fn download<T: bytemuck::Pod>(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &wgpu::Buffer,
        size: u64,
    ) -> Result<Vec<T>, GpuError> {
        let mut cache = self.buffer.lock();
        let needs_new_staging = match cache.as_ref() {
            Some(buf) => buf.size() < size,
            None => true,
        };
        if needs_new_staging {
            *cache = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            }));
        }
        let Some(staging) = cache.as_ref() else {
            return Err(GpuError::Readback("staging buffer missing".into()));
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("darkroom_download_encoder"),
        });
        encoder.copy_buffer_to_buffer(source, 0, staging, 0, size);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..size);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| GpuError::Readback(e.to_string()))?;
        rx.recv()
            .map_err(|e| GpuError::Readback(e.to_string()))?
            .map_err(|e| GpuError::Readback(e.to_string()))?;

        let data = slice.get_mapped_range();
        let values = bytemuck::cast_slice::<u8, T>(&data).to_vec();
        drop(data);
        staging.unmap();
        Ok(values)
    }
}
