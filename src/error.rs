//! Error types for the topdf library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for topdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during batch conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The scan root does not exist.
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// The scan root exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A path has no extension recognized as a source document.
    ///
    /// Discovered documents are filtered by extension before mapping, so
    /// hitting this for a scanned document indicates an internal bug.
    #[error("Path has no recognized source extension: {0}")]
    UnrecognizedExtension(String),

    /// A relative path escapes its root or is not relative at all.
    #[error("Invalid relative path: {0}")]
    InvalidRelativePath(String),

    /// The renderer rejected a document.
    #[error("Render error: {0}")]
    Render(String),

    /// An archive was requested but the session has no successful outcomes.
    #[error("No successfully converted documents to package")]
    NoDocuments,

    /// A conversion was requested before any documents were scanned.
    #[error("Session is empty: scan a directory or supply documents first")]
    EmptySession,

    /// Error assembling the zip archive.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
