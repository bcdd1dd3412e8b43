//! Device creation and GPU error types.

use std::sync::Arc;

/// Errors from the GPU print path. Any of these sends rendering to the CPU.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    /// No adapter could be found; the machine has no usable GPU.
    #[error("no suitable GPU adapter found: {0}")]
    NoAdapter(String),
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(String),
    #[error("GPU readback failed: {0}")]
    Readback(String),
    #[error("buffer of {needed} bytes exceeds the device limit of {limit}")]
    BufferLimit { needed: u64, limit: u64 },
}

/// Features the print pipeline needs. Plain compute and storage buffers only.
pub fn required_features() -> wgpu::Features {
    wgpu::Features::empty()
}

/// A wgpu device and queue shared by all print passes.
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
}

impl GpuContext {
    /// Create a standalone device. Blocks on adapter and device requests.
    pub fn create_blocking() -> Result<Self, GpuError> {
        pollster::block_on(Self::create())
    }

    pub async fn create() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                ..Default::default()
            })
            .await
            .map_err(|e| GpuError::NoAdapter(e.to_string()))?;

        let info = adapter.get_info();
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("darkroom_device"),
                required_features: required_features(),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await
            .map_err(|e| GpuError::DeviceRequest(e.to_string()))?;

        tracing::info!(
            adapter = %info.name,
            backend = ?info.backend,
            "GPU print pipeline device ready"
        );
        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name: info.name,
        })
    }

    /// Fail early when a storage buffer would exceed the device limit.
    pub fn check_storage_size(&self, bytes: u64) -> Result<(), GpuError> {
        let limit = u64::from(self.device.limits().max_storage_buffer_binding_size);
        if bytes > limit {
            return Err(GpuError::BufferLimit {
                needed: bytes,
                limit,
            });
        }
        Ok(())
    }
}
