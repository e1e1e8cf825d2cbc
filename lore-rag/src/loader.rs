//! Loading documents from a directory tree.
//!
//! The supported formats are a closed set, dispatched by file extension
//! through [`LoaderKind`]. A file that fails to load is logged and skipped;
//! it never aborts the scan.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::{Document, PAGE_KEY, SOURCE_KEY};
use crate::error::{RagError, Result};

/// The document formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    /// UTF-8 plain text (`.txt`, `.text`, `.md`). One document per file.
    Text,
    /// PDF. One document per page with non-empty text.
    Pdf,
}

impl LoaderKind {
    /// Pick a loader from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "text" | "md" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Load the documents contained in `path`, tagging them with `source`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::LoadError`] if the file cannot be read or decoded.
    pub fn load(self, path: &Path, source: &str) -> Result<Vec<Document>> {
        match self {
            Self::Text => load_text(path, source),
            Self::Pdf => load_pdf(path, source),
        }
    }
}

/// Documents found under a directory, plus the files that could not be read.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Loaded documents in sorted path order.
    pub documents: Vec<Document>,
    /// Supported files that failed to load.
    pub skipped: Vec<PathBuf>,
}

/// Recursively load every supported file under `dir`.
///
/// Unsupported extensions are ignored. A missing directory yields an empty
/// report.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if `dir` exists but is not a directory.
pub fn load_documents(dir: &Path) -> Result<LoadReport> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "source directory does not exist");
        return Ok(LoadReport::default());
    }
    if !dir.is_dir() {
        return Err(RagError::ConfigError(format!(
            "source path '{}' is not a directory",
            dir.display()
        )));
    }

    let mut files: Vec<(PathBuf, LoaderKind)> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let kind = LoaderKind::from_path(entry.path());
            if kind.is_none() {
                debug!(path = %entry.path().display(), "ignoring unsupported file");
            }
            kind.map(|kind| (entry.into_path(), kind))
        })
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut report = LoadReport::default();
    for (path, kind) in files {
        let source = source_name(dir, &path);
        match kind.load(&path, &source) {
            Ok(documents) => {
                debug!(source, documents = documents.len(), "loaded file");
                report.documents.extend(documents);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file that failed to load");
                report.skipped.push(path);
            }
        }
    }

    info!(
        dir = %dir.display(),
        documents = report.documents.len(),
        skipped = report.skipped.len(),
        "loaded documents"
    );
    Ok(report)
}

/// Path relative to the scanned directory, with `/` separators.
fn source_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn load_text(path: &Path, source: &str) -> Result<Vec<Document>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| RagError::LoadError { path: path.to_path_buf(), message: e.to_string() })?;
    Ok(vec![Document::new(source, text)])
}

fn load_pdf(path: &Path, source: &str) -> Result<Vec<Document>> {
    // pdf-extract panics on some malformed files instead of returning an error.
    let extracted =
        std::panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path)));
    let pages = extracted
        .map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "PDF parser panicked".to_string());
            RagError::LoadError { path: path.to_path_buf(), message }
        })?
        .map_err(|e| RagError::LoadError { path: path.to_path_buf(), message: e.to_string() })?;

    let documents = pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| {
            let page = (i + 1).to_string();
            Document {
                id: format!("{source}:p{page}"),
                text,
                metadata: HashMap::from([
                    (SOURCE_KEY.to_string(), source.to_string()),
                    (PAGE_KEY.to_string(), page),
                ]),
            }
        })
        .collect();
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn dispatches_by_extension() {
        assert_eq!(LoaderKind::from_path(Path::new("a/b.txt")), Some(LoaderKind::Text));
        assert_eq!(LoaderKind::from_path(Path::new("README.MD")), Some(LoaderKind::Text));
        assert_eq!(LoaderKind::from_path(Path::new("paper.PDF")), Some(LoaderKind::Pdf));
        assert_eq!(LoaderKind::from_path(Path::new("image.png")), None);
        assert_eq!(LoaderKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn loads_text_files_recursively_in_sorted_order() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("b.txt"), "second").unwrap();
        fs::write(root.join("a.txt"), "first").unwrap();
        fs::write(root.join("nested/deeper/c.md"), "third").unwrap();
        fs::write(root.join("ignored.csv"), "x,y").unwrap();

        let report = load_documents(root).unwrap();
        let sources: Vec<&str> = report.documents.iter().map(|d| d.source()).collect();
        assert_eq!(sources, vec!["a.txt", "b.txt", "nested/deeper/c.md"]);
        assert_eq!(report.documents[0].text, "first");
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("good.txt"), "fine").unwrap();
        fs::write(root.join("bad.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        fs::write(root.join("broken.pdf"), "this is not a pdf").unwrap();

        let report = load_documents(root).unwrap();
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0].source(), "good.txt");
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let report = load_documents(&temp.path().join("absent")).unwrap();
        assert!(report.documents.is_empty());
    }

    #[test]
    fn file_instead_of_directory_is_a_config_error() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("doc.txt");
        fs::write(&file, "text").unwrap();
        assert!(matches!(load_documents(&file), Err(RagError::ConfigError(_))));
    }
}
