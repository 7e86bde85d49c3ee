pub mod cancel;
pub mod date;
pub mod error;
pub mod index;
pub mod media;
pub mod scan;
pub mod writer;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, TryLockError};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use index::{MetadataIndex, SkipSummary};
pub use media::{DateSource, Media};
pub use writer::TransferMode;

use scan::SourceTree;

fn default_workers() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Extracted Takeout tree
    pub source: PathBuf,
    /// Root of the YEAR/MONTH library, created if missing
    pub destination: PathBuf,
    #[serde(default)]
    pub mode: TransferMode,
    /// Transfer threads; 1 keeps the run sequential
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl ProcessOptions {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>, mode: TransferMode) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            mode,
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessResult {
    /// Media dated from a sidecar
    pub json_match: u64,
    /// Media dated from file modification time
    pub fallback: u64,
    /// Media that could not be dated or placed
    pub errors: u64,
    pub total_media: u64,
    pub sidecars_indexed: u64,
    pub sidecars_skipped: SkipSummary,
    /// Run stopped early on request
    pub cancelled: bool,
}

/// Control options for process execution.
#[derive(Debug, Clone, Default)]
pub struct ProcessControl {
    /// Cancellation token, checked between files.
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

    fn is_cancelled(&self) -> bool {
        self.cancel_token.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

/// Progress callback: `(stage, processed, total, message)`.
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + Send + Sync + 'a;

#[derive(Default)]
struct ReportState {
    stage: String,
    high_water: u64,
    last_emit: Option<Instant>,
}

/// Throttled progress reporter: emits at most every 200ms per stage, and always on completion.
///
/// Counts within a stage never go backwards, even when workers finish out of order.
/// Intermediate reports are dropped rather than waiting on a busy caller.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    state: Mutex<ReportState>,
}

impl<'a> ThrottledProgress<'a> {
    const INTERVAL: Duration = Duration::from_millis(200);

    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        Self {
            inner,
            state: Mutex::new(ReportState::default()),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current >= total;
        let mut state = match self.state.try_lock() {
            Ok(state) => state,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) if is_done => {
                self.state.lock().unwrap_or_else(|e| e.into_inner())
            }
            Err(TryLockError::WouldBlock) => return,
        };

        let new_stage = state.stage != stage;
        if !new_stage && current <= state.high_water {
            return;
        }
        if new_stage {
            state.stage = stage.to_string();
        }
        state.high_water = current;

        if !is_done && !new_stage && state.last_emit.is_some_and(|t| t.elapsed() < Self::INTERVAL) {
            return;
        }
        state.last_emit = Some(Instant::now());
        (self.inner)(stage, current, total, message);
    }
}

/// Counters shared by the transfer workers.
#[derive(Default)]
struct RunStats {
    json_match: AtomicU64,
    fallback: AtomicU64,
    errors: AtomicU64,
    processed: AtomicU64,
}

/// Run the two-phase organize pipeline with progress reporting.
pub fn process(options: &ProcessOptions, progress_callback: &ProgressCallback<'_>) -> Result<ProcessResult> {
    process_with_control(options, &ProcessControl::default(), progress_callback)
}

/// Run the pipeline with progress reporting and cancellation.
///
/// Phase 1 indexes every sidecar; phase 2 only starts once the index is
/// complete and reads it without modifying it.
pub fn process_with_control(
    options: &ProcessOptions,
    control: &ProcessControl,
    progress_callback: &ProgressCallback<'_>,
) -> Result<ProcessResult> {
    let tp = ThrottledProgress::new(progress_callback);

    let source = check_source(&options.source)?;
    fs::create_dir_all(&options.destination).map_err(|e| Error::Destination {
        path: options.destination.clone(),
        source: e,
    })?;
    let destination_real = options.destination.canonicalize().ok();
    let nested_destination = destination_real
        .as_deref()
        .filter(|d| d.starts_with(&source));
    let tree = SourceTree::new(&source).excluding(nested_destination);

    // Stage 1: index sidecars
    info!("Indexing JSON sidecars under {}", source.display());
    let index = index::build_index(&tree, &tp);
    info!(
        "Indexed {} metadata entries ({} sidecars skipped)",
        index.len(),
        index.skipped().total()
    );

    // Stage 2: organize media
    let media_list = tree.media();
    let total = media_list.len() as u64;
    info!("Organizing {} media files into {}", total, options.destination.display());

    let stats = RunStats::default();
    let handle = |media: Media| {
        if control.is_cancelled() {
            return;
        }
        organize_one(media, &index, &options.destination, options.mode, &stats);
        let done = stats.processed.fetch_add(1, Ordering::Relaxed) + 1;
        tp.report("organize", done, total, "Moving/Copying");
    };

    if options.workers > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;
        pool.install(|| media_list.into_par_iter().for_each(handle));
    } else {
        media_list.into_iter().for_each(handle);
    }

    let processed = stats.processed.load(Ordering::Relaxed);
    if total == 0 {
        tp.report("organize", 0, 0, "No media files found");
    }
    let result = ProcessResult {
        json_match: stats.json_match.load(Ordering::Relaxed),
        fallback: stats.fallback.load(Ordering::Relaxed),
        errors: stats.errors.load(Ordering::Relaxed),
        total_media: total,
        sidecars_indexed: index.parsed(),
        sidecars_skipped: index.skipped().clone(),
        cancelled: processed < total,
    };

    if result.cancelled {
        warn!("Cancelled after {}/{} media files", processed, total);
    }
    info!(
        "Finished: {} JSON matches, {} fallbacks, {} errors",
        result.json_match, result.fallback, result.errors
    );
    Ok(result)
}

fn check_source(source: &Path) -> Result<PathBuf> {
    let unreadable = |e: io::Error| Error::SourceUnreadable {
        path: source.to_path_buf(),
        source: e,
    };
    let meta = fs::metadata(source).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::SourceNotFound(source.to_path_buf()),
        _ => unreadable(e),
    })?;
    if !meta.is_dir() {
        return Err(Error::SourceNotDirectory(source.to_path_buf()));
    }
    fs::read_dir(source).map_err(unreadable)?;
    Ok(source.canonicalize().unwrap_or_else(|_| source.to_path_buf()))
}

/// Sidecar date if the filename is indexed, otherwise the file's mtime.
fn resolve_date(media: &mut Media, index: &MetadataIndex) -> io::Result<DateSource> {
    let (date, source) = match index.get(&media.filename) {
        Some(date) => (date, DateSource::Matched),
        None => {
            let modified = fs::metadata(&media.path)?.modified()?;
            (date::local_from_system_time(modified), DateSource::Fallback)
        }
    };
    media.date = Some(date);
    media.date_source = Some(source);
    Ok(source)
}

fn organize_one(mut media: Media, index: &MetadataIndex, output_dir: &Path, mode: TransferMode, stats: &RunStats) {
    match resolve_date(&mut media, index) {
        Ok(DateSource::Matched) => stats.json_match.fetch_add(1, Ordering::Relaxed),
        Ok(DateSource::Fallback) => stats.fallback.fetch_add(1, Ordering::Relaxed),
        Err(e) => {
            warn!("Could not read modification time of {}: {}", media.path.display(), e);
            stats.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    match writer::place(&media, output_dir, mode) {
        Ok(dest) => debug!(
            "{} -> {} (date from {})",
            media.path.display(),
            dest.display(),
            match media.date_source {
                Some(DateSource::Matched) => "sidecar",
                _ => "mtime",
            }
        ),
        Err(e) => {
            warn!("Could not {} {}: {}", mode.as_str(), media.path.display(), e);
            stats.errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}
