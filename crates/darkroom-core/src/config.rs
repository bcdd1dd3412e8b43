//! Runtime configuration for the print pipeline.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DarkroomError;
use crate::transform::lut::LutSampling;
use crate::transform::render::RenderSettings;
use crate::transform::tone::ToneBlend;

/// Default quiescence window before a debounced render fires.
const DEFAULT_DEBOUNCE_MS: u64 = 120;
/// Default number of undo snapshots kept.
const DEFAULT_HISTORY_DEPTH: usize = 50;
/// Default histogram subsample step in each axis.
const DEFAULT_HISTOGRAM_STRIDE: u32 = 4;

/// Which render backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendPreference {
    /// GPU if an adapter is available, CPU otherwise.
    #[default]
    Auto,
    /// GPU only; rendering fails without an adapter.
    Gpu,
    /// CPU scalar loop only.
    Cpu,
}

impl BackendPreference {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
        }
    }
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BackendPreference {
    type Err = DarkroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "gpu" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            other => Err(DarkroomError::Config(format!("unknown backend {other:?}"))),
        }
    }
}

/// Runtime configuration for a darkroom session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DarkroomConfig {
    /// Render backend preference.
    pub backend: BackendPreference,
    /// Debounce window for render requests, in milliseconds.
    pub debounce_ms: u64,
    /// Maximum undo depth.
    pub history_depth: usize,
    /// Histogram subsample stride.
    pub histogram_stride: u32,
    /// Paper tone blending mode, applied to every backend.
    pub tone_blend: ToneBlend,
    /// LUT sampling on the CPU path.
    pub lut_sampling: LutSampling,
}

impl Default for DarkroomConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl DarkroomConfig {
    /// Built-in defaults overridden by `DARKROOM_*` variables from `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend = parse_var(&lookup, "DARKROOM_BACKEND").unwrap_or_default();
        let tone_blend = parse_var(&lookup, "DARKROOM_TONE").unwrap_or_default();
        let debounce_ms = lookup("DARKROOM_DEBOUNCE_MS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_DEBOUNCE_MS);
        Self {
            backend,
            debounce_ms,
            history_depth: DEFAULT_HISTORY_DEPTH,
            histogram_stride: DEFAULT_HISTOGRAM_STRIDE,
            tone_blend,
            lut_sampling: LutSampling::default(),
        }
    }

    /// Parse a JSON config. Missing fields take the built-in defaults.
    pub fn from_json(json: &str) -> Result<Self, DarkroomError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DarkroomError::Config(e.to_string()))?;
        config.validate()
    }

    /// Reject values the session cannot run with.
    pub fn validate(self) -> Result<Self, DarkroomError> {
        if self.history_depth == 0 {
            return Err(DarkroomError::Config("history_depth must be at least 1".into()));
        }
        Ok(self)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            tone_blend: self.tone_blend,
            sampling: self.lut_sampling,
        }
    }
}

fn parse_var<T: FromStr<Err = DarkroomError>>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("ignoring {key}: {e}");
            None
        }
    }
}
