//! Darkroom GPU: wgpu compute pipeline for print compositing and histograms.
//!
//! This crate owns all GPU resources. [`GpuPrinter`] runs `composite.wgsl`,
//! the data-parallel twin of `darkroom_core::render_cpu`, and
//! [`PrintRenderer`] picks a backend and falls back to the CPU on any
//! GPU failure.

pub mod buffers;
pub mod context;
pub mod pipeline;
pub mod readback;
pub mod renderer;
pub mod scope_dispatch;

pub use context::{GpuContext, GpuError, required_features};
pub use pipeline::GpuPrinter;
pub use renderer::PrintRenderer;
