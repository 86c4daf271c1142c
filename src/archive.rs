//! Archive packaging of converted documents.
//!
//! Serializes a session's successful outcomes into a single zip whose entry
//! paths reproduce the mirrored output tree, so extracting the archive gives
//! the same layout as the output directory itself.

use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::convert::ConversionOutcome;
use crate::error::{Error, Result};
use crate::pathmap::slash_path;

/// Build a zip archive over the successful outcomes.
///
/// Entries are added in outcome order, named by the mirrored relative output
/// path with forward slashes on every platform. File-backed PDFs are read
/// one at a time. Outcomes whose PDF has gone missing on disk are logged and
/// skipped.
///
/// # Errors
///
/// Returns [`Error::NoDocuments`] when no outcome succeeded; callers should
/// surface that as a client error rather than serving an empty archive.
pub fn build_archive(outcomes: &[ConversionOutcome]) -> Result<Vec<u8>> {
    let successes: Vec<&ConversionOutcome> = outcomes.iter().filter(|o| o.success).collect();
    if successes.is_empty() {
        return Err(Error::NoDocuments);
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for outcome in successes {
        // Success outcomes always carry both fields.
        let (Some(relative), Some(output)) = (&outcome.output_relative_path, &outcome.output)
        else {
            continue;
        };

        let bytes = match output.read_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!(
                    "Skipping archive entry {}: {}",
                    relative.display(),
                    e
                );
                continue;
            }
        };

        zip.start_file(slash_path(relative), options)?;
        zip.write_all(&bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Suggested download name for an archive: `<root basename>_pdfs.zip`.
pub fn archive_file_name(scan_root: Option<&Path>) -> String {
    scan_root
        .and_then(|root| root.file_name())
        .map(|name| format!("{}_pdfs.zip", name.to_string_lossy()))
        .unwrap_or_else(|| "converted_pdfs.zip".to_string())
}
