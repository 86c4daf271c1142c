//! Document discovery.
//!
//! Walks a root directory recursively and yields a descriptor for every file
//! whose extension is in the configured allow-list. Ordering is
//! deterministic: within each directory, matching files come first in
//! ascending lexical name order, then subdirectories are visited depth-first
//! in lexical order. Re-running a scan re-walks the tree from scratch.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::{Serialize, Serializer};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::pathmap::{matches_extension, slash_path};

/// Where a document's content lives.
///
/// Filesystem documents are read lazily at conversion time; uploaded
/// documents carry their bytes in a shared buffer so descriptor clones stay
/// cheap.
#[derive(Debug, Clone)]
pub enum ContentSource {
    /// Absolute path of a file on disk.
    Path(PathBuf),
    /// Content supplied directly, e.g. a browser upload.
    Memory(Arc<[u8]>),
}

impl Serialize for ContentSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ContentSource::Path(p) => {
                serializer.serialize_newtype_variant("ContentSource", 0, "path", &p.display().to_string())
            }
            // Only the length goes over the wire; the bytes stay server-side.
            ContentSource::Memory(bytes) => {
                serializer.serialize_newtype_variant("ContentSource", 1, "memory_len", &bytes.len())
            }
        }
    }
}

fn serialize_slash<S: Serializer>(path: &Path, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&slash_path(path))
}

/// One discovered source document.
///
/// Immutable after creation; a new scan produces fresh descriptors.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDescriptor {
    /// Path relative to the scan root, slash-joined in transport.
    #[serde(serialize_with = "serialize_slash")]
    pub relative_path: PathBuf,

    /// Last segment of `relative_path`.
    pub filename: String,

    /// Where the content lives.
    pub source: ContentSource,

    /// Byte length of the source content.
    pub size_bytes: u64,
}

impl DocumentDescriptor {
    /// The document's path relative to the scan root, slash-joined.
    pub fn relative_path_string(&self) -> String {
        slash_path(&self.relative_path)
    }
}

/// Options for document discovery.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Extensions included in the scan, without the leading dot.
    pub extensions: Vec<String>,

    /// Follow symbolic links while walking.
    pub follow_links: bool,
}

impl ScanOptions {
    /// Create new scan options with defaults (`html` and `htm`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the extension allow-list.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Follow symbolic links while walking.
    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["html".to_string(), "htm".to_string()],
            follow_links: false,
        }
    }
}

/// Recursive scanner for source documents under a root directory.
pub struct DirectoryScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl DirectoryScanner {
    /// Create a scanner, validating the root eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryNotFound`] if `root` does not exist and
    /// [`Error::NotADirectory`] if it exists but is not a directory.
    pub fn new<P: AsRef<Path>>(root: P, options: ScanOptions) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            return Err(Error::DirectoryNotFound(root));
        }
        if !root.is_dir() {
            return Err(Error::NotADirectory(root));
        }
        Ok(Self { root, options })
    }

    /// The validated scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yield every matching document under the root.
    ///
    /// Unreadable entries are logged at warn level and skipped; they never
    /// abort the walk. The iterator is finite and the scan is restartable.
    pub fn scan(&self) -> impl Iterator<Item = DocumentDescriptor> + '_ {
        log::info!("Scanning for documents in {}", self.root.display());

        WalkDir::new(&self.root)
            .follow_links(self.options.follow_links)
            // Files sort before directories, names lexically within each
            // group, so root-level documents precede nested ones.
            .sort_by(|a, b| {
                let a_dir = a.file_type().is_dir();
                let b_dir = b.file_type().is_dir();
                a_dir.cmp(&b_dir).then_with(|| a.file_name().cmp(b.file_name()))
            })
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(move |entry| self.describe(entry))
    }

    /// Collect the scan into a vector.
    pub fn to_vec(&self) -> Vec<DocumentDescriptor> {
        self.scan().collect()
    }

    fn describe(&self, entry: walkdir::DirEntry) -> Option<DocumentDescriptor> {
        let ext = entry.path().extension().and_then(|e| e.to_str())?;
        if !matches_extension(ext, &self.options.extensions) {
            return None;
        }

        let relative_path = match entry.path().strip_prefix(&self.root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => {
                log::warn!("Entry outside scan root: {}", entry.path().display());
                return None;
            }
        };

        let size_bytes = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                log::warn!("Failed to stat {}: {}", entry.path().display(), e);
                0
            }
        };

        let filename = entry.file_name().to_string_lossy().into_owned();
        log::debug!("Found document: {}", relative_path.display());

        Some(DocumentDescriptor {
            relative_path,
            filename,
            source: ContentSource::Path(entry.path().to_path_buf()),
            size_bytes,
        })
    }
}

/// Build upload-mode descriptors from `(relative_path, bytes)` pairs.
///
/// Applies the same extension filter as a directory scan; entries with other
/// extensions are skipped. Paths must be relative and must not traverse
/// upward.
pub fn descriptors_from_memory<I, S>(files: I, options: &ScanOptions) -> Result<Vec<DocumentDescriptor>>
where
    I: IntoIterator<Item = (S, Vec<u8>)>,
    S: AsRef<str>,
{
    let mut documents = Vec::new();

    for (raw_path, bytes) in files {
        let raw_path = raw_path.as_ref();
        let relative_path = sanitize_relative(raw_path)?;

        let ext = relative_path.extension().and_then(|e| e.to_str());
        match ext {
            Some(ext) if matches_extension(ext, &options.extensions) => {}
            _ => {
                log::debug!("Skipping non-document upload: {}", raw_path);
                continue;
            }
        }

        let filename = relative_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        documents.push(DocumentDescriptor {
            filename,
            size_bytes: bytes.len() as u64,
            source: ContentSource::Memory(Arc::from(bytes)),
            relative_path,
        });
    }

    Ok(documents)
}

/// Display name for an uploaded tree: the shared top-level folder of the
/// first nested upload, else a generic label.
pub fn upload_root_name(documents: &[DocumentDescriptor]) -> String {
    documents
        .iter()
        .find_map(|doc| {
            let mut components = doc.relative_path.components();
            let first = components.next()?;
            components.next()?;
            Some(first.as_os_str().to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "uploaded_files".to_string())
}

fn sanitize_relative(raw: &str) -> Result<PathBuf> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return Err(Error::InvalidRelativePath(raw.to_string()));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            Component::CurDir => {}
            _ => return Err(Error::InvalidRelativePath(raw.to_string())),
        }
    }
    Ok(path)
}
