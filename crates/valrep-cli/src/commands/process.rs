//! Process command - extract the record from a single report.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use valrep_core::{
    parse_corpus_with, Corpus, FieldExtractor, ParsedReport, PdftoppmRasterizer, PureOcrDetector,
    ReportAssembler, ReportParser, ReportSchema, ValrepConfig,
};

use super::config::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, page image, or a corpus JSON dump)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model directory (overrides models.model_dir)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Also write the OCR corpus to this file
    #[arg(long)]
    dump_corpus: Option<PathBuf>,

    /// Print the processing time and any warnings
    #[arg(long)]
    show_stats: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message(if is_corpus_dump(&args.input) {
        "Assembling record from corpus..."
    } else {
        "Running OCR..."
    });

    let report = DocumentProcessor::new(Arc::new(config), args.model_dir.clone())?
        .process(&args.input)?;

    pb.finish_with_message("Done");

    if let Some(dump_path) = &args.dump_corpus {
        fs::write(dump_path, serde_json::to_string_pretty(&report.corpus)?)?;
        eprintln!(
            "{} Corpus ({} fragments) written to {}",
            style("✓").green(),
            report.corpus.len(),
            dump_path.display()
        );
    }

    let output = serde_json::to_string_pretty(&report.record)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    for warning in &report.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    if args.show_stats {
        eprintln!(
            "{} {} fragments on {} pages, processed in {}ms",
            style("ℹ").blue(),
            report.corpus.len(),
            report.corpus.page_count(),
            report.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Whether `path` is a saved corpus rather than a document.
pub(crate) fn is_corpus_dump(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Turns input files into reports.
///
/// The OCR models are loaded on the first document that needs them and kept
/// for every later one. Corpus dumps skip rasterization and OCR entirely, so a
/// processor that only sees dumps never touches the model directory.
pub(crate) struct DocumentProcessor {
    config: Arc<ValrepConfig>,
    model_dir: Option<PathBuf>,
    assembler: ReportAssembler,
    parser: Option<ReportParser<PdftoppmRasterizer, PureOcrDetector>>,
}

impl DocumentProcessor {
    pub(crate) fn new(config: Arc<ValrepConfig>, model_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let extractor = FieldExtractor::new(config.matching.clone())?;
        let assembler = ReportAssembler::new(extractor, ReportSchema::valuation_report());
        Ok(Self {
            config,
            model_dir,
            assembler,
            parser: None,
        })
    }

    /// Parse one input file into a report.
    pub(crate) fn process(&mut self, path: &Path) -> anyhow::Result<ParsedReport> {
        if is_corpus_dump(path) {
            let content = fs::read_to_string(path)?;
            let corpus: Corpus = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid corpus dump {}: {}", path.display(), e))?;
            debug!("Loaded {} fragments from {}", corpus.len(), path.display());
            return Ok(parse_corpus_with(&self.assembler, corpus)?);
        }

        let parser = match self.parser.take() {
            Some(parser) => parser,
            None => self.load_parser()?,
        };
        Ok(self.parser.insert(parser).parse(path)?)
    }

    fn load_parser(&self) -> anyhow::Result<ReportParser<PdftoppmRasterizer, PureOcrDetector>> {
        let config = self.config.as_ref();
        let model_dir = self
            .model_dir
            .as_deref()
            .unwrap_or(config.models.model_dir.as_path());
        debug!("Loading OCR models from {}", model_dir.display());

        let detector = PureOcrDetector::from_dir(model_dir, &config.models, config.ocr.clone())
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to load OCR models: {}\n\n\
                     Pass --model-dir or run 'valrep config set models.model_dir <dir>'.",
                    e
                )
            })?;

        Ok(ReportParser::new(
            config,
            PdftoppmRasterizer::new(config.raster.clone()),
            detector,
            ReportSchema::valuation_report(),
        )?)
    }

    #[cfg(test)]
    fn models_loaded(&self) -> bool {
        self.parser.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &str = r#"[
      {"page": 0, "text": "Tenure", "x1": 100.0, "x2": 250.0, "y1": 500.0, "y2": 540.0},
      {"page": 0, "text": "Freehold", "x1": 400.0, "x2": 600.0, "y1": 502.0, "y2": 542.0}
    ]"#;

    fn processor(dir: &Path) -> DocumentProcessor {
        DocumentProcessor::new(
            Arc::new(ValrepConfig::default()),
            Some(dir.join("no-models")),
        )
        .unwrap()
    }

    #[test]
    fn test_corpus_dumps_never_load_models() {
        let dir = tempfile::tempdir().unwrap();
        let mut processor = processor(dir.path());

        for name in ["a.json", "b.JSON"] {
            let path = dir.path().join(name);
            fs::write(&path, CORPUS).unwrap();
            let report = processor.process(&path).unwrap();
            assert_eq!(
                report.record.get("propertyType.tenure"),
                Some(&serde_json::json!("Freehold"))
            );
        }
        assert!(!processor.models_loaded());
    }

    #[test]
    fn test_missing_models_reported_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let scan = dir.path().join("scan.png");
        fs::write(&scan, b"not an image").unwrap();
        let mut processor = processor(dir.path());

        let err = processor.process(&scan).unwrap_err();
        assert!(err.to_string().contains("Failed to load OCR models"));
        assert!(!processor.models_loaded());

        let dump = dir.path().join("dump.json");
        fs::write(&dump, CORPUS).unwrap();
        assert!(processor.process(&dump).is_ok());
    }
}
