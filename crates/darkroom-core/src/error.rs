//! Error types for the darkroom domain layer.
//!
//! The compositor itself never fails: degenerate numbers are clamped and a
//! missing mask is simply "no dodge". Errors here come from loading external
//! state (paper keys, project files, configuration).

/// Errors raised while validating or loading darkroom state.
#[derive(Debug, thiserror::Error)]
pub enum DarkroomError {
    #[error("unknown paper type: {0:?}")]
    UnknownPaper(String),
    #[error("mask is {mask_width}x{mask_height} but the negative is {width}x{height}")]
    MaskSize {
        mask_width: u32,
        mask_height: u32,
        width: u32,
        height: u32,
    },
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("no exposure with id {0}")]
    UnknownExposure(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// Errors from decoding or encoding a saved project.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("not a darkroom project (bad magic bytes)")]
    BadMagic,
    #[error("unsupported project version {0}")]
    UnsupportedVersion(u32),
    #[error("project data ends early while reading {0}")]
    Truncated(&'static str),
    #[error("string field {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
    #[error("invalid value for {field}: {detail}")]
    InvalidValue { field: &'static str, detail: String },
    #[error("unknown paper type: {0:?}")]
    UnknownPaper(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
