//! Output path derivation.
//!
//! Maps a discovered document's relative path to the mirrored output path by
//! swapping the file extension. Every directory segment is preserved
//! verbatim, which is what keeps the output tree an exact mirror of the
//! source tree.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Map a relative source path to its output path.
///
/// Replaces the final extension (matched case-insensitively against
/// `source_extensions`, listed without the leading dot) with
/// `target_extension`. All other path segments are preserved.
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use topdf::pathmap::map_extension;
///
/// let exts = ["html".to_string(), "htm".to_string()];
/// let out = map_extension(Path::new("docs/guide/Index.HTML"), &exts, "pdf").unwrap();
/// assert_eq!(out, PathBuf::from("docs/guide/Index.pdf"));
/// ```
pub fn map_extension(
    relative: &Path,
    source_extensions: &[String],
    target_extension: &str,
) -> Result<PathBuf> {
    let ext = relative
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::UnrecognizedExtension(relative.display().to_string()))?;

    if !matches_extension(ext, source_extensions) {
        return Err(Error::UnrecognizedExtension(relative.display().to_string()));
    }

    let mut mapped = relative.to_path_buf();
    mapped.set_extension(target_extension);
    Ok(mapped)
}

/// Check whether `ext` is in the extension set, ignoring case.
pub fn matches_extension(ext: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

/// Render a relative path with forward slashes regardless of platform.
///
/// Used for transport (JSON) and for archive entry names, where the slash
/// convention must not depend on the host OS.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html_exts() -> Vec<String> {
        vec!["html".to_string(), "htm".to_string()]
    }

    #[test]
    fn test_map_flat_file() {
        let out = map_extension(Path::new("index.html"), &html_exts(), "pdf").unwrap();
        assert_eq!(out, PathBuf::from("index.pdf"));
    }

    #[test]
    fn test_map_preserves_nested_segments() {
        let out = map_extension(Path::new("a/b/c/page.htm"), &html_exts(), "pdf").unwrap();
        assert_eq!(out, PathBuf::from("a/b/c/page.pdf"));
    }

    #[test]
    fn test_map_is_case_insensitive() {
        let out = map_extension(Path::new("sub/INDEX.HTML"), &html_exts(), "pdf").unwrap();
        assert_eq!(out, PathBuf::from("sub/INDEX.pdf"));
    }

    #[test]
    fn test_map_rejects_unknown_extension() {
        let err = map_extension(Path::new("notes.txt"), &html_exts(), "pdf");
        assert!(matches!(err, Err(Error::UnrecognizedExtension(_))));
    }

    #[test]
    fn test_map_rejects_missing_extension() {
        let err = map_extension(Path::new("README"), &html_exts(), "pdf");
        assert!(matches!(err, Err(Error::UnrecognizedExtension(_))));
    }

    #[test]
    fn test_map_round_trips() {
        let pdf_exts = vec!["pdf".to_string()];
        let forward = map_extension(Path::new("sub/page.html"), &html_exts(), "pdf").unwrap();
        let back = map_extension(&forward, &pdf_exts, "html").unwrap();
        assert_eq!(back, PathBuf::from("sub/page.html"));
    }

    #[test]
    fn test_slash_path_is_platform_independent() {
        let p: PathBuf = ["sub", "inner", "page.pdf"].iter().collect();
        assert_eq!(slash_path(&p), "sub/inner/page.pdf");
    }
}
