//! Per-document conversion engine.
//!
//! Reads one document, runs it through the preparation pipeline, hands it to
//! the renderer and persists (or buffers) the resulting PDF. Every failure is
//! captured into the returned outcome; `convert_one` never propagates an
//! error, so one bad document cannot take down a batch.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::pathmap::{map_extension, slash_path};
use crate::prepare::{PreparePipeline, PreparePreset};
use crate::render::PdfRenderer;
use crate::scan::{ContentSource, DocumentDescriptor};

/// Options for document conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Extensions accepted as source documents, without the leading dot.
    pub source_extensions: Vec<String>,

    /// Extension given to converted documents.
    pub target_extension: String,

    /// HTML preparation level applied before rendering.
    pub prepare: PreparePreset,
}

impl ConvertOptions {
    /// Create new conversion options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the source extension set.
    pub fn with_source_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the output extension.
    pub fn with_target_extension(mut self, extension: impl Into<String>) -> Self {
        self.target_extension = extension.into();
        self
    }

    /// Set the preparation preset.
    pub fn with_prepare(mut self, preset: PreparePreset) -> Self {
        self.prepare = preset;
        self
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            source_extensions: vec!["html".to_string(), "htm".to_string()],
            target_extension: "pdf".to_string(),
            prepare: PreparePreset::default(),
        }
    }
}

/// Where converted documents go.
#[derive(Debug, Clone)]
pub enum OutputTarget {
    /// Write each PDF under this root, mirroring the source tree.
    Directory(PathBuf),
    /// Keep each PDF in memory on its outcome.
    Memory,
}

/// Where one rendered PDF ended up.
#[derive(Debug, Clone)]
pub enum PdfOutput {
    /// Written to this path on disk.
    File(PathBuf),
    /// Buffered in memory.
    Memory(Vec<u8>),
}

impl PdfOutput {
    /// Read the PDF bytes, from disk or the buffer.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        match self {
            PdfOutput::File(path) => Ok(fs::read(path)?),
            PdfOutput::Memory(bytes) => Ok(bytes.clone()),
        }
    }
}

impl Serialize for PdfOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PdfOutput::File(path) => {
                serializer.serialize_newtype_variant("PdfOutput", 0, "file", &path.display().to_string())
            }
            // Bytes are served separately; the snapshot only reports size.
            PdfOutput::Memory(bytes) => {
                serializer.serialize_newtype_variant("PdfOutput", 1, "memory_len", &bytes.len())
            }
        }
    }
}

fn serialize_opt_slash<S: Serializer>(
    path: &Option<PathBuf>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match path {
        Some(p) => serializer.serialize_some(&slash_path(p)),
        None => serializer.serialize_none(),
    }
}

/// Result of converting one document.
///
/// Exactly one of `output_relative_path`/`output` (on success) and `error`
/// (on failure) is populated.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutcome {
    /// The document this outcome belongs to.
    pub source: DocumentDescriptor,

    /// Whether conversion succeeded.
    pub success: bool,

    /// Mirrored output path relative to the output root, present on success.
    #[serde(serialize_with = "serialize_opt_slash")]
    pub output_relative_path: Option<PathBuf>,

    /// Where the rendered PDF lives, present on success.
    pub output: Option<PdfOutput>,

    /// Failure reason, present on failure.
    pub error: Option<String>,
}

impl ConversionOutcome {
    fn succeeded(source: DocumentDescriptor, relative: PathBuf, output: PdfOutput) -> Self {
        Self {
            source,
            success: true,
            output_relative_path: Some(relative),
            output: Some(output),
            error: None,
        }
    }

    fn failed(source: DocumentDescriptor, error: String) -> Self {
        Self {
            source,
            success: false,
            output_relative_path: None,
            output: None,
            error: Some(error),
        }
    }
}

/// Conversion engine driving the renderer for one document at a time.
pub struct ConversionEngine {
    renderer: Arc<dyn PdfRenderer>,
    pipeline: PreparePipeline,
    options: ConvertOptions,
}

impl ConversionEngine {
    /// Create an engine around a renderer.
    pub fn new(renderer: Arc<dyn PdfRenderer>, options: ConvertOptions) -> Self {
        let pipeline = PreparePipeline::from_preset(options.prepare);
        Self {
            renderer,
            pipeline,
            options,
        }
    }

    /// The engine's conversion options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert one document, capturing any failure into the outcome.
    pub fn convert_one(
        &self,
        document: &DocumentDescriptor,
        target: &OutputTarget,
    ) -> ConversionOutcome {
        match self.try_convert(document, target) {
            Ok((relative, output)) => {
                log::info!("Converted {}", document.relative_path.display());
                ConversionOutcome::succeeded(document.clone(), relative, output)
            }
            Err(e) => {
                log::error!("Failed to convert {}: {}", document.relative_path.display(), e);
                ConversionOutcome::failed(document.clone(), e.to_string())
            }
        }
    }

    fn try_convert(
        &self,
        document: &DocumentDescriptor,
        target: &OutputTarget,
    ) -> Result<(PathBuf, PdfOutput)> {
        let content = self.read_content(document)?;
        let html = String::from_utf8_lossy(&content);
        let prepared = self.pipeline.process(&html);

        let base_url = base_url_for(&document.source);
        let pdf = self
            .renderer
            .render(prepared.as_bytes(), &base_url)
            .map_err(|e| Error::Render(e.to_string()))?;

        let relative = map_extension(
            &document.relative_path,
            &self.options.source_extensions,
            &self.options.target_extension,
        )?;

        match target {
            OutputTarget::Directory(root) => {
                let full = root.join(&relative);
                if let Some(parent) = full.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&full, &pdf)?;
                Ok((relative, PdfOutput::File(full)))
            }
            OutputTarget::Memory => Ok((relative, PdfOutput::Memory(pdf))),
        }
    }

    fn read_content(&self, document: &DocumentDescriptor) -> Result<Vec<u8>> {
        match &document.source {
            ContentSource::Path(path) => Ok(fs::read(path)?),
            ContentSource::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// Base URL for resolving sibling-relative references: the document's own
/// directory, or empty for in-memory content.
fn base_url_for(source: &ContentSource) -> String {
    match source {
        ContentSource::Path(path) => path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        ContentSource::Memory(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderError;
    use crate::scan::{DirectoryScanner, ScanOptions};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn ok_renderer() -> Arc<dyn PdfRenderer> {
        Arc::new(
            |_html: &[u8], _base: &str| -> std::result::Result<Vec<u8>, RenderError> {
                Ok(b"%PDF-1.4 stub".to_vec())
            },
        )
    }

    fn engine(renderer: Arc<dyn PdfRenderer>) -> ConversionEngine {
        ConversionEngine::new(renderer, ConvertOptions::default())
    }

    fn scan_one(dir: &TempDir) -> DocumentDescriptor {
        let scanner = DirectoryScanner::new(dir.path(), ScanOptions::default()).unwrap();
        scanner.to_vec().into_iter().next().unwrap()
    }

    #[test]
    fn test_convert_writes_mirrored_file() {
        let src = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("guides")).unwrap();
        fs::write(src.path().join("guides/setup.html"), "<html></html>").unwrap();

        let out = TempDir::new().unwrap();
        let doc = scan_one(&src);
        let outcome = engine(ok_renderer())
            .convert_one(&doc, &OutputTarget::Directory(out.path().to_path_buf()));

        assert!(outcome.success);
        assert_eq!(
            outcome.output_relative_path.as_deref(),
            Some(Path::new("guides/setup.pdf"))
        );
        assert!(outcome.error.is_none());
        let written = out.path().join("guides/setup.pdf");
        assert_eq!(fs::read(written).unwrap(), b"%PDF-1.4 stub");
    }

    #[test]
    fn test_convert_memory_target_buffers_pdf() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("page.html"), "<html></html>").unwrap();

        let doc = scan_one(&src);
        let outcome = engine(ok_renderer()).convert_one(&doc, &OutputTarget::Memory);

        assert!(outcome.success);
        match outcome.output {
            Some(PdfOutput::Memory(bytes)) => assert_eq!(bytes, b"%PDF-1.4 stub"),
            other => panic!("expected buffered PDF, got {:?}", other),
        }
    }

    #[test]
    fn test_render_failure_becomes_outcome() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("bad.html"), "<html></html>").unwrap();

        let failing: Arc<dyn PdfRenderer> = Arc::new(
            |_html: &[u8], _base: &str| -> std::result::Result<Vec<u8>, RenderError> {
                Err(RenderError::new("bad markup"))
            },
        );
        let doc = scan_one(&src);
        let outcome = engine(failing).convert_one(&doc, &OutputTarget::Memory);

        assert!(!outcome.success);
        assert!(outcome.output.is_none());
        assert!(outcome.output_relative_path.is_none());
        assert!(outcome.error.as_deref().unwrap().contains("bad markup"));
    }

    #[test]
    fn test_missing_source_becomes_outcome() {
        let doc = DocumentDescriptor {
            relative_path: PathBuf::from("gone.html"),
            filename: "gone.html".to_string(),
            source: ContentSource::Path(PathBuf::from("/no/such/gone.html")),
            size_bytes: 0,
        };

        let outcome = engine(ok_renderer()).convert_one(&doc, &OutputTarget::Memory);
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_renderer_sees_prepared_html_and_base_url() {
        let src = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("docs")).unwrap();
        fs::write(
            src.path().join("docs/page.html"),
            "<html><head><style>body{}</style></head><body>hi</body></html>",
        )
        .unwrap();

        let expected_base = src.path().join("docs").display().to_string();
        let renderer: Arc<dyn PdfRenderer> = Arc::new(
            move |html: &[u8], base: &str| -> std::result::Result<Vec<u8>, RenderError> {
                let html = String::from_utf8_lossy(html);
                assert!(html.contains("@page { size: A4;"));
                assert!(!html.contains("<style>body{}</style>"));
                assert_eq!(base, expected_base);
                Ok(b"ok".to_vec())
            },
        );

        let doc = scan_one(&src);
        let outcome = engine(renderer).convert_one(&doc, &OutputTarget::Memory);
        assert!(outcome.success, "{:?}", outcome.error);
    }
}
