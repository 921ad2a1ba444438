//! Core library for valuation report OCR processing.
//!
//! This crate provides:
//! - A positioned text-fragment corpus built from OCR output
//! - Spatial field matching: anchor lookup, directional proximity search
//!   and typed extractors for text, blocks, integers, checkboxes and amounts
//! - The valuation report schema and record assembly
//! - A document pipeline over pluggable rasterizer and OCR collaborators

pub mod corpus;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod schema;

pub use corpus::{BoundingBox, Corpus, TextFragment};
pub use error::{ConfigError, OcrError, RasterError, Result, SchemaError, ValrepError};
pub use extract::{FieldExtractor, FieldValue};
pub use models::config::ValrepConfig;
pub use pipeline::{
    parse_corpus_with, Detection, PageRasterizer, ParsedReport, PdftoppmRasterizer, ReportParser,
    TextDetector,
};
#[cfg(feature = "native")]
pub use pipeline::PureOcrDetector;
pub use schema::{
    ExtractorKind, FieldBinding, Record, ReportAssembler, ReportSchema, SchemaTemplate,
    ValuationReportTemplate,
};
