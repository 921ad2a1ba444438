//! Configuration models.

pub mod config;

pub use config::{BlockWindow, MatchingConfig, ModelConfig, OcrConfig, RasterConfig, SearchWindow, ValrepConfig};
