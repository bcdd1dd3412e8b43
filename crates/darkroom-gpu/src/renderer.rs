//! Backend selection with CPU fallback.

use darkroom_core::config::BackendPreference;
use darkroom_core::exposure::Exposure;
use darkroom_core::image::{PrintImage, Transmittance};
use darkroom_core::paper::Paper;
use darkroom_core::scopes::Histogram;
use darkroom_core::session::RenderRequest;
use darkroom_core::transform::lut::SigmoidLut;
use darkroom_core::transform::render::{RenderSettings, render_cpu};

use crate::context::GpuError;
use crate::pipeline::GpuPrinter;

/// The render backend in use.
///
/// The GPU variant falls back to the CPU compositor whenever a GPU render
/// fails, so a frame is produced as long as the inputs are renderable.
pub enum PrintRenderer {
    Gpu(GpuPrinter),
    Cpu,
}

impl PrintRenderer {
    /// Pick a backend for `preference`.
    ///
    /// `Auto` falls back to the CPU when no GPU is available; `Gpu` reports
    /// the failure instead.
    pub fn from_preference(preference: BackendPreference) -> Result<Self, GpuError> {
        match preference {
            BackendPreference::Cpu => {
                tracing::info!("using CPU print renderer");
                Ok(Self::Cpu)
            }
            BackendPreference::Gpu => Ok(Self::Gpu(GpuPrinter::create_blocking()?)),
            BackendPreference::Auto => Ok(Self::auto()),
        }
    }

    /// GPU if available, otherwise CPU.
    pub fn auto() -> Self {
        match GpuPrinter::create_blocking() {
            Ok(printer) => Self::Gpu(printer),
            Err(e) => {
                tracing::warn!("GPU unavailable, using CPU print renderer: {e}");
                Self::Cpu
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Gpu(_) => "gpu",
            Self::Cpu => "cpu",
        }
    }

    pub fn render(
        &self,
        paper: &Paper,
        exposures: &[Exposure],
        negative: &Transmittance,
        lut: &SigmoidLut,
        settings: &RenderSettings,
    ) -> Option<PrintImage> {
        if let Self::Gpu(printer) = self {
            match printer.render(paper, exposures, negative, lut, settings) {
                Ok(print) => return print,
                Err(e) => tracing::warn!("GPU render failed, falling back to CPU: {e}"),
            }
        }
        render_cpu(paper, exposures, negative, lut, settings)
    }

    /// Render and histogram in one go, on the GPU when possible.
    pub fn render_with_histogram(
        &self,
        paper: &Paper,
        exposures: &[Exposure],
        negative: &Transmittance,
        lut: &SigmoidLut,
        settings: &RenderSettings,
        stride: u32,
    ) -> Option<(PrintImage, Histogram)> {
        if let Self::Gpu(printer) = self {
            match printer.render_with_histogram(paper, exposures, negative, lut, settings, stride) {
                Ok(result) => return result,
                Err(e) => tracing::warn!("GPU render failed, falling back to CPU: {e}"),
            }
        }
        let print = render_cpu(paper, exposures, negative, lut, settings)?;
        let histogram = Histogram::from_print(&print, stride);
        Some((print, histogram))
    }

    /// Render a session's pending request along with its histogram.
    pub fn render_request(
        &self,
        request: &RenderRequest,
        stride: u32,
    ) -> Option<(PrintImage, Histogram)> {
        self.render_with_histogram(
            request.paper(),
            &request.exposures,
            &request.negative,
            &request.lut,
            &request.settings,
            stride,
        )
    }
}
