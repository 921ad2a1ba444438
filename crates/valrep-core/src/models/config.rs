//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Main configuration for the valrep pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValrepConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Page rasterization configuration.
    pub raster: RasterConfig,

    /// Field matching tolerances and heuristics.
    pub matching: MatchingConfig,

    /// Model configuration.
    pub models: ModelConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Keep `[UNK]` tokens emitted by the recognizer instead of blanking them.
    pub keep_unk: bool,

    /// Detections below this confidence are dropped (0.0 keeps everything).
    pub min_confidence: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            keep_unk: false,
            min_confidence: 0.0,
        }
    }
}

/// Page rasterization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Directory holding the poppler binaries. `None` searches `PATH`.
    pub poppler_dir: Option<PathBuf>,

    /// DPI for rendering PDF pages. Matching tolerances assume 300.
    pub dpi: u32,

    /// Maximum pages to render (0 = unlimited).
    pub max_pages: usize,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            poppler_dir: None,
            dpi: 300,
            max_pages: 0,
        }
    }
}

/// Alignment window for one family of proximity searches.
///
/// Units are pixels of the rasterized page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchWindow {
    /// Maximum centroid-y difference for a fragment to count as the same row.
    pub row_tolerance: f32,
    /// Maximum horizontal gap between anchor and candidate for `right` search.
    pub right_max_gap: f32,
    /// Maximum vertical gap between anchor and candidate for `bottom` search.
    pub bottom_max_gap: f32,
    /// Maximum centroid-x difference for `bottom` and neighbourhood search.
    pub column_tolerance: f32,
}

impl SearchWindow {
    pub const fn new(
        row_tolerance: f32,
        right_max_gap: f32,
        bottom_max_gap: f32,
        column_tolerance: f32,
    ) -> Self {
        Self {
            row_tolerance,
            right_max_gap,
            bottom_max_gap,
            column_tolerance,
        }
    }

    fn validate(&self, key: &str) -> Result<(), ConfigError> {
        let fields = [
            ("row_tolerance", self.row_tolerance),
            ("right_max_gap", self.right_max_gap),
            ("bottom_max_gap", self.bottom_max_gap),
            ("column_tolerance", self.column_tolerance),
        ];
        for (name, value) in fields {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::Invalid {
                    key: format!("matching.{}.{}", key, name),
                    reason: format!("must be a positive number, got {}", value),
                });
            }
        }
        Ok(())
    }
}

/// Window used when collecting a multiline block below an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockWindow {
    /// How far above the anchor's top edge a block line may start.
    pub lead: f32,
    /// Maximum distance from the anchor's bottom edge to a line's top edge.
    pub max_gap: f32,
    /// Maximum centroid-x difference between anchor and line.
    pub column_tolerance: f32,
    /// Line bound used when a binding does not set one.
    pub default_max_lines: usize,
    /// Blocks shorter than this many characters are discarded.
    pub min_len: usize,
}

/// Tolerances, thresholds and word lists for the matching engine.
///
/// Defaults are calibrated for pages rendered at 300 DPI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Window for text fields.
    pub text: SearchWindow,

    /// Window for integer fields.
    pub numeric: SearchWindow,

    /// Window for currency fields (same row, then a tight band below).
    pub currency: SearchWindow,

    /// Neighbourhood for checkbox marks around a boolean anchor.
    pub checkbox: SearchWindow,

    /// Window for multiline blocks.
    pub block: BlockWindow,

    /// Minimum length of a value taken from the anchor itself.
    pub min_inline_len: usize,

    /// Minimum length of a value taken from a neighbouring fragment.
    pub min_candidate_len: usize,

    /// Characters after a keyword inspected for checkbox marks.
    pub checkbox_window: usize,

    /// Earliest plausible year for year fields.
    pub year_min: i64,

    /// Latest plausible year for year fields.
    pub year_max: i64,

    /// Percent values above this are treated as misreads and truncated.
    pub percent_cap: i64,

    /// Number of leading digits kept when truncating a percent misread.
    pub percent_digits: usize,

    /// Glyphs the OCR emits for a ticked checkbox.
    pub mark_glyphs: String,

    /// Section headings that end a search.
    pub stop_markers: Vec<String>,

    /// Contractual phrases that are never field values.
    pub boilerplate: Vec<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            text: SearchWindow::new(75.0, 1200.0, 180.0, 650.0),
            numeric: SearchWindow::new(80.0, 950.0, 180.0, 450.0),
            currency: SearchWindow::new(80.0, 1000.0, 120.0, 450.0),
            checkbox: SearchWindow::new(100.0, 450.0, 100.0, 450.0),
            block: BlockWindow {
                lead: 20.0,
                max_gap: 600.0,
                column_tolerance: 950.0,
                default_max_lines: 6,
                min_len: 4,
            },
            min_inline_len: 3,
            min_candidate_len: 2,
            checkbox_window: 25,
            year_min: 1800,
            year_max: 2100,
            percent_cap: 100,
            percent_digits: 2,
            mark_glyphs: "xX☑v".to_string(),
            stop_markers: [
                "PROPERTY TYPE",
                "ACCOMMODATION",
                "BUILDING SURVEY",
                "VALUATION",
                "Report Date",
                "CURRENT OCCUPANCY",
                "CONSTRUCTION",
                "LOCALITY & DEMAND",
                "SERVICES",
                "ENERGY EFFICIENCY",
                "ESSENTIAL REPAIRS",
                "RENTAL INFORMATION",
                "VALUATION FOR FINANCE",
                "GENERAL REMARKS",
                "VALUERS DECLARATION",
                "IMPORTANT NOTICE",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            boilerplate: [
                "behalf of any group",
                "generality of the foregoing",
                "mortgage administrator",
                "trustee on behalf",
                "interested in the mortgage",
                "opinion likely",
                "Gatehouse Bank",
                "please provide details",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl MatchingConfig {
    /// Check that every tolerance and bound is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.text.validate("text")?;
        self.numeric.validate("numeric")?;
        self.currency.validate("currency")?;
        self.checkbox.validate("checkbox")?;

        if !(self.block.max_gap > 0.0) || !(self.block.column_tolerance > 0.0) {
            return Err(ConfigError::Invalid {
                key: "matching.block".to_string(),
                reason: "max_gap and column_tolerance must be positive".to_string(),
            });
        }
        if self.block.default_max_lines == 0 {
            return Err(ConfigError::Invalid {
                key: "matching.block.default_max_lines".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.year_min >= self.year_max {
            return Err(ConfigError::Invalid {
                key: "matching.year_min".to_string(),
                reason: format!("{} is not below year_max {}", self.year_min, self.year_max),
            });
        }
        if self.percent_digits == 0 {
            return Err(ConfigError::Invalid {
                key: "matching.percent_digits".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.mark_glyphs.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "matching.mark_glyphs".to_string(),
                reason: "at least one glyph is required".to_string(),
            });
        }
        Ok(())
    }

    /// Whether `text` is exactly one of the stop-marker headings.
    pub fn is_stop_marker(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.stop_markers.iter().any(|s| s.to_lowercase() == lower)
    }

    /// Whether `text` contains any boilerplate phrase.
    pub fn is_boilerplate(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.boilerplate
            .iter()
            .any(|b| lower.contains(&b.to_lowercase()))
    }
}

/// Model file locations for the OCR collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl ValrepConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.matching.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(MatchingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_tolerance() {
        let mut config = MatchingConfig::default();
        config.text.row_tolerance = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("matching.text.row_tolerance"));
    }

    #[test]
    fn test_rejects_inverted_year_range() {
        let mut config = MatchingConfig::default();
        config.year_min = 2100;
        config.year_max = 1800;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stop_marker_is_exact_and_case_insensitive() {
        let config = MatchingConfig::default();
        assert!(config.is_stop_marker("general remarks"));
        assert!(!config.is_stop_marker("GENERAL REMARKS continued"));
    }

    #[test]
    fn test_boilerplate_is_substring() {
        let config = MatchingConfig::default();
        assert!(config.is_boilerplate("acting as trustee on behalf of the lender"));
        assert!(!config.is_boilerplate("Leasehold"));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ValrepConfig =
            serde_json::from_str(r#"{"raster": {"dpi": 200}}"#).unwrap();
        assert_eq!(config.raster.dpi, 200);
        assert_eq!(config.matching.year_min, 1800);
        assert_eq!(config.models.detection_model, "det.onnx");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = ValrepConfig::default();
        config.matching.percent_cap = 99;
        config.save(&path).unwrap();

        let loaded = ValrepConfig::from_file(&path).unwrap();
        assert_eq!(loaded.matching.percent_cap, 99);
    }
}
