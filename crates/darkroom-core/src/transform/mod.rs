//! Print pipeline: sigmoid LUT, density model, paper tone and the CPU compositor.

pub mod evaluate;
pub mod lut;
pub mod render;
pub mod tone;

pub use evaluate::{DensityModel, ExposureTerm, density_from_log_e};
pub use lut::{LutSampling, SigmoidLut};
pub use render::{RenderSettings, render_cpu};
pub use tone::{ToneBlend, tone_map};
