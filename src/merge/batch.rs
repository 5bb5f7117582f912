/// Batch orchestration: validation, per-record generation, archiving.
///
/// Every record is independent: it decodes its own copy of the template,
/// merges, and writes its own output file in a scratch directory. A record
/// failure is data, not control flow; workers return typed results the
/// orchestrator folds into the aggregate. Only a classified batch-level
/// failure aborts the run.
use crate::merge::image::{ImageGenerator, ShapeIdAllocator};
use crate::merge::record::Record;
use crate::merge::substitute::merge_document;
use crate::merge::MergePolicies;
use crate::pptx::package::OpenLimits;
use crate::pptx::{Presentation, PptxError, TemplateInvalid};
use chrono::Local;
use log::{debug, warn};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Batch-level failures; any of these aborts the whole run.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("no records provided")]
    NoRecordsProvided,

    #[error("batch of {count} records exceeds the {max}-record limit")]
    BatchSizeExceeded { count: usize, max: usize },

    /// Template failed validation; raised before any per-record work
    #[error("invalid template: {0}")]
    Template(#[from] TemplateInvalid),

    #[error("all {failed} records failed to generate")]
    AllGenerationFailed { failed: usize },

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("I/O failure: {0}")]
    Io(String),
}

/// One record's failure, collected without aborting the batch.
#[derive(Debug, Clone, Serialize)]
pub struct RecordError {
    pub record_name: String,
    pub reason: String,
}

/// How a worker's failure propagates.
///
/// Ordinary failures stay with their record; resource exhaustion is a
/// batch-level condition and aborts the run with its classified error.
enum RecordFailure {
    Record(String),
    Batch(BatchError),
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    /// Number of documents generated
    pub generated: usize,

    /// Number of records that failed
    pub failed: usize,

    /// Per-record failures, in record order
    pub errors: Vec<RecordError>,

    /// Location of the packaged archive
    pub archive_path: PathBuf,
}

/// Tuning knobs for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum accepted record count
    pub max_records: usize,

    /// Template size/signature limits
    pub limits: OpenLimits,

    /// Overall wall-clock budget; records not started when it expires are
    /// abandoned, completed ones are still packaged
    pub deadline: Option<Duration>,

    /// Merge policy bundle
    pub policies: MergePolicies,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_records: 500,
            limits: OpenLimits::default(),
            deadline: None,
            policies: MergePolicies::default(),
        }
    }
}

/// Receiver for 0–100 progress signals.
pub trait ProgressSink: Sync {
    fn progress(&self, percent: u8);
}

impl<F: Fn(u8) + Sync> ProgressSink for F {
    fn progress(&self, percent: u8) {
        self(percent)
    }
}

/// Generate one document per record and package them into a zip archive.
///
/// Validation failures (`NoRecordsProvided`, `BatchSizeExceeded`, template
/// checks) abort before any record is processed. Per-record failures are
/// collected; the batch only fails outright when nothing was generated.
/// Scratch storage is removed on every outcome; the archive is preserved.
pub fn generate_batch(
    records: &[Record],
    template: &[u8],
    output_dir: &Path,
    options: &BatchOptions,
    generator: Option<&dyn ImageGenerator>,
    progress: Option<&dyn ProgressSink>,
) -> Result<BatchResult, BatchError> {
    if records.is_empty() {
        return Err(BatchError::NoRecordsProvided);
    }
    if records.len() > options.max_records {
        return Err(BatchError::BatchSizeExceeded {
            count: records.len(),
            max: options.max_records,
        });
    }
    // One up-front template validation before any per-record work
    match Presentation::open_with_limits(template, &options.limits) {
        Ok(_) => {},
        Err(PptxError::Template(invalid)) => return Err(BatchError::Template(invalid)),
        Err(other) => {
            return Err(BatchError::Template(TemplateInvalid::Corrupted(other.to_string())));
        },
    }

    let scratch =
        tempfile::tempdir().map_err(|e| classify_io("creating scratch directory", e))?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let ids = ShapeIdAllocator::new();
    let started = Instant::now();
    let completed = AtomicUsize::new(0);
    // emissions from concurrent workers are serialized so the signal never
    // runs backwards
    let emitted = Mutex::new(0u8);
    let total = records.len();

    let outcomes: Vec<Result<String, RecordFailure>> = records
        .par_iter()
        .map(|record| {
            let expired = options.deadline.is_some_and(|d| started.elapsed() >= d);
            let outcome = if expired {
                Err(RecordFailure::Record(
                    "batch deadline exceeded before processing".to_string(),
                ))
            } else {
                generate_record(record, template, scratch.path(), options, generator, &ids, &timestamp)
            };
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(sink) = progress {
                // reserve headroom for the packaging step
                let percent = (done * 90 / total) as u8;
                let mut last = emitted.lock();
                if percent > *last {
                    *last = percent;
                    sink.progress(percent);
                }
            }
            outcome
        })
        .collect();

    let mut entries = Vec::new();
    let mut errors = Vec::new();
    for (record, outcome) in records.iter().zip(outcomes) {
        match outcome {
            Ok(entry) => entries.push(entry),
            Err(RecordFailure::Record(reason)) => {
                warn!("record '{}' failed: {}", record.name, reason);
                errors.push(RecordError {
                    record_name: record.name.clone(),
                    reason,
                });
            },
            Err(RecordFailure::Batch(fatal)) => return Err(fatal),
        }
    }

    if entries.is_empty() {
        return Err(BatchError::AllGenerationFailed { failed: errors.len() });
    }

    fs::create_dir_all(output_dir).map_err(|e| classify_io("creating output directory", e))?;
    let archive_path = output_dir.join(format!("cards_{}.zip", timestamp));
    write_archive(&archive_path, scratch.path(), &entries)?;
    if let Some(sink) = progress {
        sink.progress(100);
    }

    Ok(BatchResult {
        generated: entries.len(),
        failed: errors.len(),
        errors,
        archive_path,
    })
}

/// Process one record end to end.
fn generate_record(
    record: &Record,
    template: &[u8],
    scratch: &Path,
    options: &BatchOptions,
    generator: Option<&dyn ImageGenerator>,
    ids: &ShapeIdAllocator,
    timestamp: &str,
) -> Result<String, RecordFailure> {
    if !record.is_processable() {
        return Err(RecordFailure::Record("record has no name".to_string()));
    }

    let mut presentation = Presentation::open_with_limits(template, &options.limits)
        .map_err(|e| RecordFailure::Record(e.to_string()))?;
    let replacements = merge_document(&mut presentation, record, &options.policies, generator, ids);
    debug!("'{}': {} replacements", record.name, replacements);

    let bytes = presentation
        .save()
        .map_err(|e| RecordFailure::Record(e.to_string()))?;
    match write_unique(scratch, &output_filename(record, timestamp), &bytes) {
        Ok(entry) => Ok(entry),
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::OutOfMemory
            ) =>
        {
            Err(RecordFailure::Batch(classify_io("writing generated document", e)))
        },
        Err(e) => Err(RecordFailure::Record(format!("writing generated document: {}", e))),
    }
}

/// Compose the output filename from name, organization and timestamp,
/// normalizing path-unsafe characters to underscores.
fn output_filename(record: &Record, timestamp: &str) -> String {
    let stem = format!("{}_{}_{}", record.name.trim(), record.organization.trim(), timestamp);
    let sanitized: String = stem
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect();
    format!("{}.pptx", sanitized)
}

/// Write under `filename`, appending a numeric suffix on collision.
///
/// `create_new` keeps this safe when records with identical names are
/// processed concurrently.
fn write_unique(dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<String> {
    let (stem, ext) = filename.rsplit_once('.').unwrap_or((filename, "pptx"));
    let mut candidate = filename.to_string();
    let mut n = 1u32;
    loop {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&candidate))
        {
            Ok(mut file) => {
                file.write_all(bytes)?;
                return Ok(candidate);
            },
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && n < 1000 => {
                n += 1;
                candidate = format!("{}_{}.{}", stem, n, ext);
            },
            Err(e) => return Err(e),
        }
    }
}

/// Package the generated documents with maximum deflate compression.
fn write_archive(archive_path: &Path, scratch: &Path, entries: &[String]) -> Result<(), BatchError> {
    let file = File::create(archive_path).map_err(|e| classify_io("creating archive", e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for entry in entries {
        let bytes = fs::read(scratch.join(entry))
            .map_err(|e| classify_io("reading generated document", e))?;
        writer
            .start_file(entry.as_str(), options)
            .map_err(|e| BatchError::Io(e.to_string()))?;
        writer
            .write_all(&bytes)
            .map_err(|e| classify_io("writing archive entry", e))?;
    }
    writer.finish().map_err(|e| BatchError::Io(e.to_string()))?;
    Ok(())
}

/// Classify resource exhaustion distinctly from ordinary I/O failure.
fn classify_io(context: &str, err: std::io::Error) -> BatchError {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => {
            BatchError::PermissionDenied(format!("{}: {}", context, err))
        },
        std::io::ErrorKind::OutOfMemory => BatchError::OutOfMemory(format!("{}: {}", context, err)),
        _ => BatchError::Io(format!("{}: {}", context, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_normalize_unsafe_characters() {
        let mut record = Record::named("김 철수");
        record.organization = "한빛/전자:연구소".to_string();
        assert_eq!(
            output_filename(&record, "20260806_120000"),
            "김_철수_한빛_전자_연구소_20260806_120000.pptx"
        );
    }

    #[test]
    fn duplicate_filenames_get_numeric_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_unique(dir.path(), "kim.pptx", b"a").unwrap();
        let second = write_unique(dir.path(), "kim.pptx", b"b").unwrap();
        assert_eq!(first, "kim.pptx");
        assert_eq!(second, "kim_2.pptx");
        assert_eq!(fs::read(dir.path().join("kim_2.pptx")).unwrap(), b"b");
    }

    #[test]
    fn io_classification_is_kind_based() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(classify_io("x", denied), BatchError::PermissionDenied(_)));
        let oom = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "nope");
        assert!(matches!(classify_io("x", oom), BatchError::OutOfMemory(_)));
        let other = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "nope");
        assert!(matches!(classify_io("x", other), BatchError::Io(_)));
    }
}
