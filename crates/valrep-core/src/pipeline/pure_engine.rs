//! Text detector backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use super::{Detection, TextDetector};
use crate::error::OcrError;
use crate::models::config::{ModelConfig, OcrConfig};

/// Detection + recognition models loaded from disk.
pub struct PureOcrDetector {
    engine: pure_onnx_ocr::engine::OcrEngine,
    config: OcrConfig,
}

impl PureOcrDetector {
    /// Load the models named in `models` from `model_dir`.
    pub fn from_dir(model_dir: &Path, models: &ModelConfig, config: OcrConfig) -> Result<Self, OcrError> {
        let det_path = model_dir.join(&models.detection_model);
        let rec_path = model_dir.join(&models.recognition_model);
        let dict_path = model_dir.join(&models.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self { engine, config })
    }
}

impl TextDetector for PureOcrDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("{}x{} page", width, height)));
        }

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Detection(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let detections: Vec<Detection> = results
            .iter()
            .filter(|r| r.confidence >= self.config.min_confidence)
            .filter_map(|r| {
                let quad = polygon_to_quad(&r.bounding_box)?;
                let text = if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                Some(Detection {
                    text,
                    quad,
                    confidence: r.confidence,
                })
            })
            .collect();

        info!(
            "OCR complete: {} detections on {}x{} page in {}ms",
            detections.len(),
            width,
            height,
            start.elapsed().as_millis()
        );

        Ok(detections)
    }
}

/// Axis-aligned rectangle around every exterior point of the polygon.
fn polygon_to_quad(polygon: &pure_onnx_ocr::Polygon<f64>) -> Option<[[f32; 2]; 4]> {
    bounding_quad(polygon.exterior().coords().map(|c| (c.x as f32, c.y as f32)))
}

/// Corners of the extremes of `points`, clockwise from top-left. `None` for
/// an empty point set.
fn bounding_quad(points: impl IntoIterator<Item = (f32, f32)>) -> Option<[[f32; 2]; 4]> {
    let mut points = points.into_iter();
    let (x, y) = points.next()?;
    let (min_x, min_y, max_x, max_y) = points.fold((x, y, x, y), |(x1, y1, x2, y2), (x, y)| {
        (x1.min(x), y1.min(y), x2.max(x), y2.max(y))
    });
    Some([[min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_quad_uses_all_points() {
        let quad = bounding_quad([(110.0, 20.0), (10.0, 22.0), (112.0, 52.0), (8.0, 50.0), (60.0, 55.0)]);
        assert_eq!(
            quad,
            Some([[8.0, 20.0], [112.0, 20.0], [112.0, 55.0], [8.0, 55.0]])
        );
    }

    #[test]
    fn test_bounding_quad_few_points_stays_off_origin() {
        let quad = bounding_quad([(300.0, 400.0), (500.0, 440.0)]).unwrap();
        assert_eq!(quad[0], [300.0, 400.0]);
        assert_eq!(quad[2], [500.0, 440.0]);
        assert_eq!(bounding_quad(std::iter::empty::<(f32, f32)>()), None);
    }
}
