//! Session state and batch coordination.
//!
//! A session spans one scan → convert → download cycle. State lives in an
//! explicit [`SessionStore`] rather than ambient globals; multi-tenant
//! embedders create one store per session key. All mutation of a session is
//! serialized through the store's batch lock, and outcomes are appended as
//! they are produced so an interrupted batch leaves a valid ordered prefix.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::archive;
use crate::convert::{ConversionEngine, ConversionOutcome, ConvertOptions, OutputTarget};
use crate::error::{Error, Result};
use crate::render::PdfRenderer;
use crate::scan::{
    descriptors_from_memory, upload_root_name, DirectoryScanner, DocumentDescriptor, ScanOptions,
};

/// Aggregate statistics for one conversion batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    /// Documents attempted.
    pub total: usize,
    /// Documents converted successfully.
    pub successful: usize,
    /// Documents that failed.
    pub failed: usize,
    /// Percentage of successes, rounded to one decimal place; `0.0` for an
    /// empty batch.
    pub success_rate: f64,
}

impl Statistics {
    /// Compute statistics over a sequence of outcomes.
    pub fn from_outcomes(outcomes: &[ConversionOutcome]) -> Self {
        let total = outcomes.len();
        let successful = outcomes.iter().filter(|o| o.success).count();
        let failed = total - successful;
        let success_rate = if total == 0 {
            0.0
        } else {
            (successful as f64 * 1000.0 / total as f64).round() / 10.0
        };
        Self {
            total,
            successful,
            failed,
            success_rate,
        }
    }
}

/// Snapshot of one session.
///
/// `outcomes` always corresponds to the most recent `documents`: a new scan
/// replaces both together, never leaving them mismatched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    /// Root that was scanned, or the display name of an uploaded tree.
    pub scan_root: Option<PathBuf>,

    /// Where converted documents are written; absent for uploaded trees,
    /// whose PDFs stay in memory.
    pub output_root: Option<PathBuf>,

    /// Documents from the most recent scan, in scan order.
    pub documents: Vec<DocumentDescriptor>,

    /// Outcomes of converting `documents`, in the same order.
    pub outcomes: Vec<ConversionOutcome>,

    /// When the most recent scan happened.
    pub scanned_at: Option<DateTime<Utc>>,

    /// When the most recent conversion pass finished.
    pub converted_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Whether the session holds no scan at all.
    pub fn is_empty(&self) -> bool {
        self.scan_root.is_none() && self.documents.is_empty()
    }

    /// Statistics over the session's current outcomes.
    pub fn statistics(&self) -> Statistics {
        Statistics::from_outcomes(&self.outcomes)
    }
}

/// Owner of one session's state.
///
/// Two locks: `state` guards reads and per-outcome appends, `batch`
/// serializes whole operations (scan, convert, clear) so concurrent callers
/// cannot interleave them on the same session.
#[derive(Default)]
pub struct SessionStore {
    state: Mutex<SessionState>,
    batch: Mutex<()>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        // A poisoned lock means a batch panicked mid-append; the outcome
        // prefix is still consistent, so the state stays usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_batch(&self) -> MutexGuard<'_, ()> {
        self.batch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace_scan(
        &self,
        scan_root: PathBuf,
        output_root: Option<PathBuf>,
        documents: Vec<DocumentDescriptor>,
    ) {
        let mut state = self.lock_state();
        *state = SessionState {
            scan_root: Some(scan_root),
            output_root,
            documents,
            outcomes: Vec::new(),
            scanned_at: Some(Utc::now()),
            converted_at: None,
        };
    }

    fn begin_conversion_pass(&self) {
        let mut state = self.lock_state();
        state.outcomes.clear();
        state.converted_at = None;
    }

    fn append_outcome(&self, outcome: ConversionOutcome) {
        self.lock_state().outcomes.push(outcome);
    }

    fn mark_converted(&self) {
        self.lock_state().converted_at = Some(Utc::now());
    }

    fn clear(&self) {
        *self.lock_state() = SessionState::default();
    }
}

/// Result of scanning a directory.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// The validated scan root.
    pub scan_root: PathBuf,

    /// Where converted documents will be written.
    pub output_root: PathBuf,

    /// Discovered documents, in scan order.
    pub documents: Vec<DocumentDescriptor>,

    /// Number of discovered documents.
    pub total_files: usize,
}

/// Result of one conversion pass.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Per-document outcomes, in scan order.
    pub outcomes: Vec<ConversionOutcome>,

    /// Aggregate statistics over `outcomes`.
    pub statistics: Statistics,
}

/// Directory name created under the scan root for converted documents.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Orchestrates discovery and conversion over a session.
///
/// Documents are converted strictly sequentially in scan order. That bounds
/// peak memory to roughly one source document plus one rendered PDF,
/// trading throughput for predictability on large batches.
pub struct BatchCoordinator {
    store: Arc<SessionStore>,
    renderer: Arc<dyn PdfRenderer>,
    engine: ConversionEngine,
    scan_options: ScanOptions,
    output_dir_name: String,
}

impl BatchCoordinator {
    /// Create a coordinator with default options and a fresh store.
    pub fn new(renderer: Arc<dyn PdfRenderer>) -> Self {
        let engine = ConversionEngine::new(renderer.clone(), ConvertOptions::default());
        Self {
            store: Arc::new(SessionStore::new()),
            renderer,
            engine,
            scan_options: ScanOptions::default(),
            output_dir_name: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }

    /// Use an existing session store.
    pub fn with_store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = store;
        self
    }

    /// Set discovery options.
    pub fn with_scan_options(mut self, options: ScanOptions) -> Self {
        self.scan_options = options;
        self
    }

    /// Set conversion options.
    pub fn with_convert_options(mut self, options: ConvertOptions) -> Self {
        self.engine = ConversionEngine::new(self.renderer.clone(), options);
        self
    }

    /// Set the output directory name created under the scan root.
    pub fn with_output_dir_name(mut self, name: impl Into<String>) -> Self {
        self.output_dir_name = name.into();
        self
    }

    /// The coordinator's session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Begin a new session by scanning `root`.
    ///
    /// Replaces all prior session state; earlier outcomes are dropped.
    pub fn scan<P: AsRef<Path>>(&self, root: P) -> Result<ScanReport> {
        let _batch = self.store.begin_batch();

        let scanner = DirectoryScanner::new(root, self.scan_options.clone())?;
        let documents = scanner.to_vec();
        let scan_root = scanner.root().to_path_buf();
        let output_root = scan_root.join(&self.output_dir_name);

        log::info!(
            "Scanned {}: {} documents",
            scan_root.display(),
            documents.len()
        );

        self.store
            .replace_scan(scan_root.clone(), Some(output_root.clone()), documents.clone());

        Ok(ScanReport {
            scan_root,
            output_root,
            total_files: documents.len(),
            documents,
        })
    }

    /// Convert the currently scanned documents.
    ///
    /// Errors with [`Error::EmptySession`] when nothing has been scanned. A
    /// second pass over the same session supersedes the first one's outcomes.
    pub fn convert(&self) -> Result<BatchReport> {
        let _batch = self.store.begin_batch();

        let (documents, output_root) = {
            let state = self.store.lock_state();
            if state.documents.is_empty() {
                return Err(Error::EmptySession);
            }
            (state.documents.clone(), state.output_root.clone())
        };

        let target = match output_root {
            Some(root) => OutputTarget::Directory(root),
            None => OutputTarget::Memory,
        };

        Ok(self.run_pass(&documents, &target))
    }

    /// Convert content supplied directly as `(relative_path, bytes)` pairs.
    ///
    /// Replaces the session with the uploaded tree; rendered PDFs stay in
    /// memory on their outcomes instead of being written to disk.
    pub fn convert_uploaded<I, S>(&self, files: I) -> Result<BatchReport>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let _batch = self.store.begin_batch();

        let documents = descriptors_from_memory(files, &self.scan_options)?;
        if documents.is_empty() {
            return Err(Error::EmptySession);
        }

        let root_name = upload_root_name(&documents);
        self.store
            .replace_scan(PathBuf::from(root_name), None, documents.clone());

        Ok(self.run_pass(&documents, &OutputTarget::Memory))
    }

    // One document at a time, in scan order; every outcome lands in the
    // store before the next document starts.
    fn run_pass(&self, documents: &[DocumentDescriptor], target: &OutputTarget) -> BatchReport {
        self.store.begin_conversion_pass();

        let mut outcomes = Vec::with_capacity(documents.len());
        for document in documents {
            let outcome = self.engine.convert_one(document, target);
            self.store.append_outcome(outcome.clone());
            outcomes.push(outcome);
        }
        self.store.mark_converted();

        let statistics = Statistics::from_outcomes(&outcomes);
        log::info!(
            "Batch complete: {} of {} documents converted",
            statistics.successful,
            statistics.total
        );

        BatchReport {
            outcomes,
            statistics,
        }
    }

    /// Package the session's successful outcomes into a zip archive.
    pub fn build_archive(&self) -> Result<Vec<u8>> {
        let _batch = self.store.begin_batch();
        let outcomes = self.store.lock_state().outcomes.clone();
        archive::build_archive(&outcomes)
    }

    /// Suggested download name for the session's archive.
    pub fn archive_file_name(&self) -> String {
        let state = self.store.snapshot();
        archive::archive_file_name(state.scan_root.as_deref())
    }

    /// Reset the session to empty.
    pub fn clear(&self) {
        let _batch = self.store.begin_batch();
        self.store.clear();
        log::info!("Session cleared");
    }

    /// Read-only snapshot of the session, for resuming a client after
    /// reload.
    pub fn snapshot(&self) -> SessionState {
        self.store.snapshot()
    }
}
