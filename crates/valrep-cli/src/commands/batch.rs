//! Batch processing command for many report files.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use valrep_core::{ParsedReport, ValrepConfig};

use super::config::load_config;
use super::process::DocumentProcessor;

/// How often running files are checked against the time limit.
const TIMEOUT_POLL: Duration = Duration::from_millis(200);

/// Extensions picked up from the glob. `json` is a saved corpus.
const INPUT_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tif", "tiff", "bmp", "json"];

/// Record fields copied into the summary CSV.
const SUMMARY_FIELDS: &[(&str, &str)] = &[
    ("application_number", "applicationNumber"),
    ("property_address", "propertyAddress"),
    ("tenure", "propertyType.tenure"),
    (
        "market_value",
        "valuationForFinancePurpose.marketValuePresentCondition",
    ),
];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for one record JSON per input
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Per-file time limit in seconds (0 disables the limit)
    #[arg(long, default_value = "600")]
    timeout_secs: u64,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory (overrides models.model_dir)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    report: Option<ParsedReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

impl ProcessResult {
    fn new(path: PathBuf, outcome: Result<ParsedReport, String>, processing_time_ms: u64) -> Self {
        let (report, error) = match outcome {
            Ok(report) => (Some(report), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            path,
            report,
            error,
            processing_time_ms,
        }
    }
}

/// Progress reported by a worker thread.
enum WorkerEvent {
    Started {
        index: usize,
    },
    Finished {
        index: usize,
        outcome: Result<ParsedReport, String>,
        processing_time_ms: u64,
    },
}

/// Files not yet taken by a worker, with their position in the sorted list.
type WorkQueue = Arc<Mutex<VecDeque<(usize, PathBuf)>>>;

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = Arc::new(load_config(config_path)?);

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            INPUT_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let jobs = args.jobs.max(1).min(files.len());
    let timeout = (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs));
    debug!("Processing with {} workers, {:?} per file", jobs, timeout);

    let names = output_names(&files);
    let queue: WorkQueue = Arc::new(Mutex::new(files.iter().cloned().enumerate().collect()));
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    spawn_workers(jobs, &queue, &config, args.model_dir.as_deref(), events_tx)?;

    let mut slots: Vec<Option<ProcessResult>> = files.iter().map(|_| None).collect();
    let mut running: HashMap<usize, Instant> = HashMap::new();
    let mut poll = tokio::time::interval(TIMEOUT_POLL);

    while slots.iter().any(Option::is_none) {
        // `None` is a poll tick, `Some(None)` means every worker has exited.
        let event = tokio::select! {
            event = events_rx.recv() => Some(event),
            _ = poll.tick() => None,
        };

        let mut done = Vec::new();
        match event {
            Some(None) => break,
            Some(Some(WorkerEvent::Started { index })) => {
                running.insert(index, Instant::now());
            }
            Some(Some(WorkerEvent::Finished {
                index,
                outcome,
                processing_time_ms,
            })) => {
                // A file that already timed out keeps its timeout result.
                if running.remove(&index).is_some() {
                    done.push((index, outcome, processing_time_ms));
                }
            }
            None => {
                for index in expired(&mut running, timeout) {
                    let secs = args.timeout_secs;
                    done.push((index, Err(format!("timed out after {}s", secs)), secs * 1000));
                }
            }
        }

        for (index, outcome, processing_time_ms) in done {
            let result = ProcessResult::new(files[index].clone(), outcome, processing_time_ms);
            settle(&args, &overall_pb, &names[index], &result)?;
            slots[index] = Some(result);
        }
    }

    // Only reached when every worker exited with files still outstanding.
    let mut results = Vec::with_capacity(files.len());
    for (index, slot) in slots.into_iter().enumerate() {
        let result = match slot {
            Some(result) => result,
            None => {
                let result = ProcessResult::new(
                    files[index].clone(),
                    Err("worker stopped before finishing".to_string()),
                    0,
                );
                settle(&args, &overall_pb, &names[index], &result)?;
                result
            }
        };
        results.push(result);
    }

    overall_pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.report.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Start `jobs` worker threads draining `queue`.
///
/// Each worker owns one processor, so OCR models are loaded at most once per
/// worker. The threads are detached: a file that outlives its time limit keeps
/// its worker busy but never holds up the rest of the batch or process exit.
fn spawn_workers(
    jobs: usize,
    queue: &WorkQueue,
    config: &Arc<ValrepConfig>,
    model_dir: Option<&Path>,
    events: mpsc::UnboundedSender<WorkerEvent>,
) -> anyhow::Result<()> {
    for id in 0..jobs {
        let queue = Arc::clone(queue);
        let config = Arc::clone(config);
        let model_dir = model_dir.map(Path::to_path_buf);
        let events = events.clone();
        thread::Builder::new()
            .name(format!("valrep-worker-{}", id))
            .spawn(move || worker_loop(queue, config, model_dir, events))?;
    }
    Ok(())
}

fn worker_loop(
    queue: WorkQueue,
    config: Arc<ValrepConfig>,
    model_dir: Option<PathBuf>,
    events: mpsc::UnboundedSender<WorkerEvent>,
) {
    let mut processor = DocumentProcessor::new(config, model_dir).map_err(|e| e.to_string());

    loop {
        let next = match queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(_) => None,
        };
        let Some((index, path)) = next else {
            break;
        };
        if events.send(WorkerEvent::Started { index }).is_err() {
            break;
        }

        let start = Instant::now();
        let outcome = match &mut processor {
            Ok(processor) => processor.process(&path).map_err(|e| e.to_string()),
            Err(e) => Err(e.clone()),
        };
        let finished = WorkerEvent::Finished {
            index,
            outcome,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };
        if events.send(finished).is_err() {
            break;
        }
    }
    debug!("{} finished", thread::current().name().unwrap_or("worker"));
}

/// Remove and return the running files that have exceeded `limit`.
fn expired(running: &mut HashMap<usize, Instant>, limit: Option<Duration>) -> Vec<usize> {
    let Some(limit) = limit else {
        return Vec::new();
    };
    let mut indices: Vec<usize> = running
        .iter()
        .filter(|(_, started)| started.elapsed() >= limit)
        .map(|(index, _)| *index)
        .collect();
    indices.sort_unstable();
    for index in &indices {
        running.remove(index);
    }
    indices
}

/// Record one finished file: report or fail on error, then write its record.
fn settle(
    args: &BatchArgs,
    pb: &ProgressBar,
    output_name: &str,
    result: &ProcessResult,
) -> anyhow::Result<()> {
    pb.inc(1);

    if let Some(error_msg) = &result.error {
        if args.continue_on_error {
            warn!("Failed to process {}: {}", result.path.display(), error_msg);
        } else {
            pb.abandon();
            error!("Failed to process {}: {}", result.path.display(), error_msg);
            anyhow::bail!("Processing failed: {}", error_msg);
        }
    }

    if let (Some(report), Some(output_dir)) = (&result.report, &args.output_dir) {
        let output_path = output_dir.join(output_name);
        fs::write(&output_path, serde_json::to_string_pretty(&report.record)?)?;
        debug!("Wrote output to {}", output_path.display());
    }
    Ok(())
}

/// Record file name for each input.
///
/// Inputs are named `{stem}.json`. Inputs sharing a stem keep their extension
/// (`report.pdf.json`), and any name still taken gets a numeric suffix. Names
/// are compared case-insensitively.
fn output_names(files: &[PathBuf]) -> Vec<String> {
    let stem = |path: &PathBuf| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("report")
            .to_string()
    };

    let mut stems: HashMap<String, usize> = HashMap::new();
    for path in files {
        *stems.entry(stem(path).to_lowercase()).or_default() += 1;
    }

    let mut taken = HashSet::new();
    files
        .iter()
        .map(|path| {
            let stem = stem(path);
            let base = if stems[&stem.to_lowercase()] > 1 {
                path.file_name()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .unwrap_or(stem)
            } else {
                stem
            };

            let mut name = format!("{}.json", base);
            let mut suffix = 2;
            while !taken.insert(name.to_lowercase()) {
                name = format!("{}-{}.json", base, suffix);
                suffix += 1;
            }
            name
        })
        .collect()
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "status"];
    header.extend(SUMMARY_FIELDS.iter().map(|(column, _)| *column));
    header.extend(["fragments", "pages", "warnings", "processing_time_ms", "error"]);
    wtr.write_record(&header)?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        let mut row = vec![filename];
        match &result.report {
            Some(report) => {
                row.push("success".to_string());
                for (_, field) in SUMMARY_FIELDS {
                    row.push(summary_cell(report.record.get(field)));
                }
                row.push(report.corpus.len().to_string());
                row.push(report.corpus.page_count().to_string());
                row.push(report.warnings.join("; "));
                row.push(result.processing_time_ms.to_string());
                row.push(String::new());
            }
            None => {
                row.push("error".to_string());
                row.extend(SUMMARY_FIELDS.iter().map(|_| String::new()));
                row.extend([String::new(), String::new(), String::new()]);
                row.push(result.processing_time_ms.to_string());
                row.push(result.error.clone().unwrap_or_default());
            }
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

fn summary_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
