//! # topdf
//!
//! Batch HTML to PDF conversion for Rust.
//!
//! This library converts a tree of HTML documents into PDF documents while
//! exactly preserving the source directory hierarchy in the output, with
//! per-document failure isolation, aggregate statistics and zip packaging of
//! results. The rendering engine itself is pluggable: anything implementing
//! [`PdfRenderer`] (including a plain closure) can drive a batch.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use topdf::{BatchCoordinator, PdfRenderer, RenderError};
//!
//! fn main() -> topdf::Result<()> {
//!     // Plug in a real rendering engine here.
//!     let renderer: Arc<dyn PdfRenderer> =
//!         Arc::new(|html: &[u8], _base_url: &str| -> Result<Vec<u8>, RenderError> {
//!             Ok(html.to_vec())
//!         });
//!
//!     let coordinator = BatchCoordinator::new(renderer);
//!     coordinator.scan("site/")?;
//!     let report = coordinator.convert()?;
//!     println!(
//!         "{} of {} documents converted",
//!         report.statistics.successful, report.statistics.total
//!     );
//!
//!     let archive = coordinator.build_archive()?;
//!     std::fs::write(coordinator.archive_file_name(), archive)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Mirrored output trees**: `docs/guide/setup.html` becomes
//!   `output/docs/guide/setup.pdf`, never flattened
//! - **Failure isolation**: one bad document never aborts the batch
//! - **Deterministic discovery**: stable scan order across runs
//! - **Dual-mode input**: filesystem trees or in-memory uploads
//! - **Archive packaging**: one zip reproducing the output layout
//! - **Strictly sequential**: peak memory stays near one document plus one
//!   rendered PDF, regardless of batch size

pub mod archive;
pub mod convert;
pub mod error;
pub mod pathmap;
pub mod prepare;
pub mod render;
pub mod scan;
pub mod session;

// Re-export commonly used types
pub use archive::{archive_file_name, build_archive};
pub use convert::{
    ConversionEngine, ConversionOutcome, ConvertOptions, OutputTarget, PdfOutput,
};
pub use error::{Error, Result};
pub use pathmap::map_extension;
pub use prepare::{PrepareOptions, PreparePipeline, PreparePreset};
pub use render::{PdfRenderer, RenderError};
pub use scan::{
    descriptors_from_memory, ContentSource, DirectoryScanner, DocumentDescriptor, ScanOptions,
};
pub use session::{
    BatchCoordinator, BatchReport, ScanReport, SessionState, SessionStore, Statistics,
    DEFAULT_OUTPUT_DIR,
};

use std::path::Path;
use std::sync::Arc;

/// Discover every source document under `root` with default options.
///
/// # Example
///
/// ```no_run
/// let documents = topdf::scan_dir("site/").unwrap();
/// for doc in &documents {
///     println!("{} ({} bytes)", doc.relative_path_string(), doc.size_bytes);
/// }
/// ```
pub fn scan_dir<P: AsRef<Path>>(root: P) -> Result<Vec<DocumentDescriptor>> {
    let scanner = DirectoryScanner::new(root, ScanOptions::default())?;
    Ok(scanner.to_vec())
}

/// Scan `root` and convert everything found, writing PDFs under
/// `root/output`.
pub fn convert_dir<P: AsRef<Path>>(
    root: P,
    renderer: Arc<dyn PdfRenderer>,
) -> Result<BatchReport> {
    let coordinator = BatchCoordinator::new(renderer);
    coordinator.scan(root)?;
    coordinator.convert()
}

/// Builder for configuring a batch conversion pipeline.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use topdf::{PdfRenderer, PreparePreset, RenderError, Topdf};
///
/// let renderer: Arc<dyn PdfRenderer> =
///     Arc::new(|html: &[u8], _base_url: &str| -> Result<Vec<u8>, RenderError> {
///         Ok(html.to_vec())
///     });
///
/// let coordinator = Topdf::new()
///     .with_extensions(["html", "htm", "xhtml"])
///     .with_prepare(PreparePreset::Minimal)
///     .with_output_dir_name("pdfs")
///     .coordinator(renderer);
/// # let _ = coordinator;
/// ```
pub struct Topdf {
    scan_options: ScanOptions,
    convert_options: ConvertOptions,
    output_dir_name: String,
}

impl Topdf {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            scan_options: ScanOptions::default(),
            convert_options: ConvertOptions::default(),
            output_dir_name: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }

    /// Set the source extensions, for both discovery and path mapping.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extensions: Vec<String> = extensions.into_iter().map(Into::into).collect();
        self.scan_options = self.scan_options.with_extensions(extensions.clone());
        self.convert_options = self.convert_options.with_source_extensions(extensions);
        self
    }

    /// Follow symbolic links during discovery.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.scan_options = self.scan_options.with_follow_links(follow);
        self
    }

    /// Set the HTML preparation preset.
    pub fn with_prepare(mut self, preset: PreparePreset) -> Self {
        self.convert_options = self.convert_options.with_prepare(preset);
        self
    }

    /// Set the output extension (default `pdf`).
    pub fn with_target_extension(mut self, extension: impl Into<String>) -> Self {
        self.convert_options = self.convert_options.with_target_extension(extension);
        self
    }

    /// Set the output directory name created under the scan root.
    pub fn with_output_dir_name(mut self, name: impl Into<String>) -> Self {
        self.output_dir_name = name.into();
        self
    }

    /// Build a coordinator around the given renderer.
    pub fn coordinator(self, renderer: Arc<dyn PdfRenderer>) -> BatchCoordinator {
        BatchCoordinator::new(renderer)
            .with_scan_options(self.scan_options)
            .with_convert_options(self.convert_options)
            .with_output_dir_name(self.output_dir_name)
    }
}

impl Default for Topdf {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_extensions_apply_to_both_sides() {
        let builder = Topdf::new().with_extensions(["xhtml"]);
        assert_eq!(builder.scan_options.extensions, vec!["xhtml"]);
        assert_eq!(builder.convert_options.source_extensions, vec!["xhtml"]);
    }

    #[test]
    fn test_builder_defaults() {
        let builder = Topdf::default();
        assert_eq!(builder.scan_options.extensions, vec!["html", "htm"]);
        assert_eq!(builder.convert_options.target_extension, "pdf");
        assert_eq!(builder.output_dir_name, DEFAULT_OUTPUT_DIR);
    }

    #[test]
    fn test_builder_prepare_preset() {
        let builder = Topdf::new().with_prepare(PreparePreset::Off);
        assert_eq!(builder.convert_options.prepare, PreparePreset::Off);
    }
}
