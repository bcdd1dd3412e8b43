//! Scope computation over rendered prints.

pub mod histogram;

pub use histogram::{HISTOGRAM_BINS, Histogram};
