//! Document pipeline: rasterize, detect text, build the corpus, assemble the
//! record.

#[cfg(feature = "native")]
mod pure_engine;
mod raster;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrDetector;
pub use raster::PdftoppmRasterizer;

use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::corpus::{Corpus, TextFragment};
use crate::error::{OcrError, RasterError, Result, ValrepError};
use crate::extract::FieldExtractor;
use crate::models::config::ValrepConfig;
use crate::schema::{Record, ReportAssembler, ReportSchema};

/// One piece of text found on a page image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub text: String,
    /// Corner points in page pixels, in detector order.
    pub quad: [[f32; 2]; 4],
    pub confidence: f32,
}

/// Turns an input document into page images.
pub trait PageRasterizer {
    fn rasterize(&self, path: &Path) -> std::result::Result<Vec<DynamicImage>, RasterError>;
}

/// Finds and recognizes text on one page image.
pub trait TextDetector {
    fn detect(&self, image: &DynamicImage) -> std::result::Result<Vec<Detection>, OcrError>;
}

/// Result of parsing one document.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedReport {
    /// The populated record.
    pub record: Record,
    /// Every fragment the record was built from.
    pub corpus: Corpus,
    /// Degraded steps (failed rasterization, skipped pages).
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
}

/// Parses documents into records with a rasterizer, a detector and a schema.
pub struct ReportParser<R, D> {
    rasterizer: R,
    detector: D,
    assembler: ReportAssembler,
}

impl<R: PageRasterizer, D: TextDetector> ReportParser<R, D> {
    /// Build a parser. Fails on invalid matching configuration or a schema
    /// whose bindings point outside its template.
    pub fn new(
        config: &ValrepConfig,
        rasterizer: R,
        detector: D,
        schema: ReportSchema,
    ) -> Result<Self> {
        schema.validate()?;
        let extractor = FieldExtractor::new(config.matching.clone())?;
        Ok(Self {
            rasterizer,
            detector,
            assembler: ReportAssembler::new(extractor, schema),
        })
    }

    /// Parse one document.
    pub fn parse(&self, path: &Path) -> Result<ParsedReport> {
        let start = Instant::now();
        info!("Processing {}", path.display());

        let mut warnings = Vec::new();
        let corpus = self.build_corpus(path, &mut warnings)?;
        let record = self.assembler.assemble(&corpus)?;

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Parsed {} ({} fragments, {} pages) in {}ms",
            path.display(),
            corpus.len(),
            corpus.page_count(),
            processing_time_ms
        );

        Ok(ParsedReport {
            record,
            corpus,
            warnings,
            processing_time_ms,
        })
    }

    /// Rasterize and run detection on every page of `path`.
    ///
    /// Rasterizer failures and per-page detection failures are degraded to
    /// warnings; a missing input or a corrupt page image is an error.
    pub fn build_corpus(&self, path: &Path, warnings: &mut Vec<String>) -> Result<Corpus> {
        if !path.is_file() {
            return Err(ValrepError::Input {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        let pages = match self.rasterizer.rasterize(path) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Rasterization of {} failed: {}", path.display(), e);
                warnings.push(format!("rasterization failed: {}", e));
                return Ok(Corpus::empty());
            }
        };
        debug!("{} pages to detect", pages.len());

        let mut fragments = Vec::new();
        for (page, image) in pages.iter().enumerate() {
            match self.detector.detect(image) {
                Ok(detections) => fragments.extend(fragments_from(page, detections)),
                Err(e @ OcrError::InvalidImage(_)) => return Err(e.into()),
                Err(e) => {
                    warn!("Text detection failed on page {}: {}", page, e);
                    warnings.push(format!("page {} skipped: {}", page, e));
                }
            }
        }

        Ok(Corpus::new(fragments))
    }
}

/// Assemble a record from a corpus without rasterization or detection.
pub fn parse_corpus_with(assembler: &ReportAssembler, corpus: Corpus) -> Result<ParsedReport> {
    let start = Instant::now();
    let record = assembler.assemble(&corpus)?;
    Ok(ParsedReport {
        record,
        corpus,
        warnings: Vec::new(),
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}

/// Convert detections into fragments, dropping blank text.
fn fragments_from(page: usize, detections: Vec<Detection>) -> impl Iterator<Item = TextFragment> {
    detections
        .into_iter()
        .filter(|d| !d.text.trim().is_empty())
        .map(move |d| TextFragment::from_quad(page, d.text, &d.quad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FixedPages(usize);

    impl PageRasterizer for FixedPages {
        fn rasterize(&self, _path: &Path) -> std::result::Result<Vec<DynamicImage>, RasterError> {
            Ok((0..self.0).map(|_| DynamicImage::new_rgb8(4, 4)).collect())
        }
    }

    struct BrokenRasterizer;

    impl PageRasterizer for BrokenRasterizer {
        fn rasterize(&self, _path: &Path) -> std::result::Result<Vec<DynamicImage>, RasterError> {
            Err(RasterError::ToolNotFound("pdftoppm".into()))
        }
    }

    /// Returns the same detections for every page.
    struct Scripted(Vec<Detection>);

    impl TextDetector for Scripted {
        fn detect(&self, _image: &DynamicImage) -> std::result::Result<Vec<Detection>, OcrError> {
            Ok(self.0.clone())
        }
    }

    struct Failing(fn() -> OcrError);

    impl TextDetector for Failing {
        fn detect(&self, _image: &DynamicImage) -> std::result::Result<Vec<Detection>, OcrError> {
            Err((self.0)())
        }
    }

    fn detection(text: &str, x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection {
            text: text.to_string(),
            quad: [[x1, y1], [x2, y1], [x2, y2], [x1, y2]],
            confidence: 0.9,
        }
    }

    fn input_file() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        (dir, path)
    }

    fn parser<R: PageRasterizer, D: TextDetector>(r: R, d: D) -> ReportParser<R, D> {
        ReportParser::new(&ValrepConfig::default(), r, d, ReportSchema::valuation_report()).unwrap()
    }

    #[test]
    fn test_parse_builds_record_from_detections() {
        let (_dir, path) = input_file();
        let parser = parser(
            FixedPages(1),
            Scripted(vec![
                detection("Tenure", 100.0, 500.0, 250.0, 540.0),
                detection("Leasehold", 400.0, 502.0, 600.0, 542.0),
                detection("   ", 700.0, 500.0, 720.0, 540.0),
            ]),
        );
        let report = parser.parse(&path).unwrap();
        assert_eq!(report.corpus.len(), 2);
        assert_eq!(
            report.record.get("propertyType.tenure"),
            Some(&serde_json::json!("Leasehold"))
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_input_is_error() {
        let parser = parser(FixedPages(1), Scripted(vec![]));
        let err = parser.parse(Path::new("/nonexistent/report.pdf")).unwrap_err();
        assert!(matches!(err, ValrepError::Input { .. }));
    }

    #[test]
    fn test_rasterizer_failure_degrades_to_defaults() {
        let (_dir, path) = input_file();
        let parser = parser(BrokenRasterizer, Scripted(vec![]));
        let report = parser.parse(&path).unwrap();
        assert!(report.corpus.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(
            report.record.get("propertyType.isFlat"),
            Some(&serde_json::json!(false))
        );
    }

    #[test]
    fn test_detection_failure_skips_page() {
        let (_dir, path) = input_file();
        let parser = parser(FixedPages(2), Failing(|| OcrError::Detection("timeout".into())));
        let report = parser.parse(&path).unwrap();
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_invalid_image_propagates() {
        let (_dir, path) = input_file();
        let parser = parser(FixedPages(1), Failing(|| OcrError::InvalidImage("0x0".into())));
        assert!(matches!(
            parser.parse(&path),
            Err(ValrepError::Ocr(OcrError::InvalidImage(_)))
        ));
    }

    #[test]
    fn test_pages_are_numbered_in_order() {
        let (_dir, path) = input_file();
        let parser = parser(
            FixedPages(3),
            Scripted(vec![detection("Hall 1", 100.0, 100.0, 200.0, 140.0)]),
        );
        let report = parser.parse(&path).unwrap();
        let pages: Vec<usize> = report.corpus.iter().map(|f| f.page()).collect();
        assert_eq!(pages, vec![0, 1, 2]);
        assert_eq!(report.corpus.page_count(), 3);
    }
}
