//! Rendering engine boundary.
//!
//! The HTML to PDF renderer is an external capability. The engine consumes
//! it through [`PdfRenderer`], a single-call trait: prepared HTML bytes in,
//! finished PDF bytes out. Renderer failures are deterministic content
//! errors and are never retried.

use thiserror::Error;

/// Failure reported by the rendering engine for one document.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct RenderError {
    /// Human-readable failure reason.
    pub message: String,
}

impl RenderError {
    /// Create a render error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Trait for HTML to PDF rendering engines.
///
/// `base_url` is the document's own directory so that sibling-relative
/// references (stylesheets, images) inside the HTML resolve correctly; it is
/// empty for in-memory documents.
pub trait PdfRenderer: Send + Sync {
    /// Render one HTML document into PDF bytes.
    fn render(&self, html: &[u8], base_url: &str) -> Result<Vec<u8>, RenderError>;
}

/// Plain functions and closures are renderers, which keeps tests and simple
/// embeddings free of wrapper types.
impl<F> PdfRenderer for F
where
    F: Fn(&[u8], &str) -> Result<Vec<u8>, RenderError> + Send + Sync,
{
    fn render(&self, html: &[u8], base_url: &str) -> Result<Vec<u8>, RenderError> {
        self(html, base_url)
    }
}
