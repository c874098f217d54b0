pub mod cancel;
pub mod date;
pub mod media;
pub mod metadata;
pub mod scan;
pub mod writer;

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::metadata::{FileMetadataDecoder, MetadataDecoder};
use crate::scan::{DirectoryScanner, MediaScanner};
use crate::writer::PlaceOptions;

pub use cancel::{CancellationToken, CancelledError};
pub use media::{MediaPath, RawDateMetadata, ResolvedDate, SortOutcome};
pub use writer::PlaceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Directory to scan for media
    pub source: PathBuf,
    /// Root of the sorted copy
    pub output: PathBuf,
    /// Set each copy's modification time to its resolved date
    #[serde(default)]
    pub set_mtime: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessResult {
    pub total_media: u64,
    pub files_sorted: u64,
    pub files_failed: u64,
    /// Files whose date could not be resolved (copied to `unknown/`)
    pub unknown_dates: u64,
    pub outcomes: Vec<SortOutcome>,
}

/// Control options for process execution.
#[derive(Debug, Clone, Default)]
pub struct ProcessControl {
    /// Checked before each file is placed.
    pub cancel_token: Option<CancellationToken>,
}

impl ProcessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    fn check(&self) -> Result<(), CancelledError> {
        match &self.cancel_token {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }
}

/// Type alias for progress callback: (stage, current, total, message)
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + Send + Sync + 'a;

/// Throttled progress reporter: emits at most every 200ms or on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    last_emit: Mutex<Option<Instant>>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        Self {
            inner,
            last_emit: Mutex::new(None),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            let Ok(mut last) = self.last_emit.lock() else {
                return;
            };
            if last.is_some_and(|t| t.elapsed() < Duration::from_millis(200)) {
                return;
            }
            *last = Some(Instant::now());
        }
        (self.inner)(stage, current, total, message);
    }
}

/// Run the full pipeline with the built-in scanner and decoder.
pub fn process(options: &ProcessOptions, progress_callback: &ProgressCallback<'_>) -> anyhow::Result<ProcessResult> {
    process_with_control(options, &ProcessControl::default(), progress_callback)
}

/// Run the full pipeline with the built-in scanner and decoder, and control options.
pub fn process_with_control(
    options: &ProcessOptions,
    control: &ProcessControl,
    progress_callback: &ProgressCallback<'_>,
) -> anyhow::Result<ProcessResult> {
    process_with(
        &DirectoryScanner,
        &FileMetadataDecoder,
        options,
        control,
        progress_callback,
    )
}

/// Scan, read metadata, resolve dates and place every file.
///
/// Per-file placement failures are recorded in the result. An environment
/// error (permissions, full disk, ...) aborts the run; the files placed
/// before it stay where they are.
pub fn process_with(
    scanner: &dyn MediaScanner,
    decoder: &dyn MetadataDecoder,
    options: &ProcessOptions,
    control: &ProcessControl,
    progress_callback: &ProgressCallback<'_>,
) -> anyhow::Result<ProcessResult> {
    let tp = ThrottledProgress::new(progress_callback);
    control.check()?;

    // Stage 1: Scan
    let media = scanner
        .scan(&options.source)
        .with_context(|| format!("Failed to scan {}", options.source.display()))?;
    tp.report("scan", 0, 1, &format!("Found {} media files", media.len()));
    tracing::info!("Found {} media files in {}", media.len(), options.source.display());

    if media.is_empty() {
        return Ok(ProcessResult::default());
    }

    writer::ensure_dir(&options.output)
        .with_context(|| format!("Failed to create output directory {}", options.output.display()))?;
    let same_dir = match (options.source.canonicalize(), options.output.canonicalize()) {
        (Ok(source), Ok(output)) => source == output,
        _ => options.source == options.output,
    };
    if same_dir {
        anyhow::bail!("The output directory cannot be the same as the source directory");
    }

    control.check()?;

    // Stage 2: Collect date metadata
    let with_metadata = metadata::collect_all(decoder, media, &tp);

    control.check()?;

    // Stage 3: Resolve
    let resolved = date::resolve_all(with_metadata, &tp);
    let total = resolved.len() as u64;
    let unknown_dates = resolved.iter().filter(|(_, r)| !r.is_resolved()).count() as u64;

    // Stage 4: Place
    let mut outcomes = Vec::with_capacity(resolved.len());
    let mut placer = writer::place_all(
        &options.output,
        resolved,
        PlaceOptions {
            set_mtime: options.set_mtime,
        },
    );
    loop {
        control.check()?;
        let Some(result) = placer.next() else {
            break;
        };
        let outcome = result.context("Sorting aborted")?;
        tp.report(
            "sort",
            outcomes.len() as u64,
            total,
            &outcome.source_path.display().to_string(),
        );
        outcomes.push(outcome);
    }

    let files_sorted = outcomes.iter().filter(|o| o.success).count() as u64;
    Ok(ProcessResult {
        total_media: total,
        files_sorted,
        files_failed: total - files_sorted,
        unknown_dates,
        outcomes,
    })
}
