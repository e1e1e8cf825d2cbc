//! On-disk index format.
//!
//! An index directory holds `manifest.json` and `records.jsonl` (one
//! [`IndexedRecord`] per line). Writes go to a staging directory first and
//! are swapped into place by rename under an exclusive lock on `.lock`, so
//! a failed write never leaves a half-written index behind. The manifest is
//! moved last: an index without a manifest does not exist.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::document::IndexedRecord;
use crate::error::{RagError, Result};
use crate::inmemory::InMemoryVectorStore;

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;
/// Manifest file name inside an index directory.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Records file name inside an index directory.
pub const RECORDS_FILE: &str = "records.jsonl";
const LOCK_FILE: &str = ".lock";

/// Describes how an index was built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexManifest {
    /// On-disk format version.
    pub version: u32,
    /// Embedding model used for every stored vector.
    pub embedding_model: String,
    /// Length of every stored vector.
    pub dimensions: usize,
    /// Chunk size used at ingestion.
    pub chunk_size: usize,
    /// Chunk overlap used at ingestion.
    pub chunk_overlap: usize,
    /// Number of records in `records.jsonl`.
    pub record_count: usize,
    /// When the index was written.
    pub created_at: DateTime<Utc>,
}

/// An index read back from disk.
#[derive(Debug)]
pub struct LoadedIndex {
    /// The manifest the index was written with.
    pub manifest: IndexManifest,
    /// The records, ready to search.
    pub store: InMemoryVectorStore,
}

/// Run filesystem work off the async executor.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| RagError::Io(std::io::Error::other(e)))?
}

fn store_error(message: String) -> RagError {
    RagError::VectorStoreError { backend: "disk".to_string(), message }
}

fn acquire_lock(dir: &Path) -> Result<File> {
    let lock = File::options().create(true).truncate(false).write(true).open(dir.join(LOCK_FILE))?;
    lock.lock_exclusive()?;
    Ok(lock)
}

/// Take a shared lock for reading.
///
/// An existing lock file is opened read-only, so a read-only index can be
/// loaded. Returns `None` when there is no lock file and one cannot be
/// created: no writer has ever locked that directory.
fn acquire_shared_lock(dir: &Path) -> Result<Option<File>> {
    let path = dir.join(LOCK_FILE);
    let lock = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            match File::options().create(true).truncate(false).write(true).open(&path) {
                Ok(file) => file,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "cannot create lock file, reading unlocked");
                    return Ok(None);
                }
            }
        }
        Err(e) => return Err(e.into()),
    };
    FileExt::lock_shared(&lock)?;
    Ok(Some(lock))
}

/// Write `records` and `manifest` to `dir`, replacing any existing index.
///
/// Creates `dir` if it does not exist.
///
/// # Errors
///
/// Returns [`RagError::VectorStoreError`] if the manifest does not describe
/// the records, or an I/O / serialization error if writing fails. On error
/// the previous index (if any) is left in place.
pub fn persist_index(dir: &Path, manifest: &IndexManifest, records: &[IndexedRecord]) -> Result<()> {
    if manifest.record_count != records.len() {
        return Err(store_error(format!(
            "manifest declares {} records but {} were given",
            manifest.record_count,
            records.len()
        )));
    }

    fs::create_dir_all(dir)?;
    let lock = acquire_lock(dir)?;

    let staging = dir.join(format!(".tmp-{}", uuid::Uuid::new_v4()));
    let result = write_staged(&staging, manifest, records).and_then(|()| swap_in(dir, &staging));
    if result.is_err() {
        let _ = fs::remove_dir_all(&staging);
    }

    FileExt::unlock(&lock)?;
    result?;

    info!(dir = %dir.display(), records = records.len(), "persisted index");
    Ok(())
}

fn write_staged(staging: &Path, manifest: &IndexManifest, records: &[IndexedRecord]) -> Result<()> {
    fs::create_dir_all(staging)?;

    let mut writer = BufWriter::new(File::create(staging.join(RECORDS_FILE))?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    fs::write(staging.join(MANIFEST_FILE), serde_json::to_vec_pretty(manifest)?)?;
    Ok(())
}

/// Move the staged files into `dir`, keeping the old ones in a backup
/// directory until the new ones are in place.
///
/// If any rename fails, files already moved in are removed and the backup is
/// moved back, so `dir` holds the previous index again.
fn swap_in(dir: &Path, staging: &Path) -> Result<()> {
    let backup: PathBuf = dir.join(format!(".old-{}", uuid::Uuid::new_v4()));
    let mut moved_out = Vec::new();
    let mut moved_in = Vec::new();

    let result = move_files(dir, staging, &backup, &mut moved_out, &mut moved_in);
    if let Err(e) = result {
        warn!(dir = %dir.display(), error = %e, "index swap failed, restoring previous index");
        restore(dir, &backup, &moved_in, &moved_out);
        return Err(e.into());
    }

    let _ = fs::remove_dir_all(staging);
    if !moved_out.is_empty() {
        if let Err(e) = fs::remove_dir_all(&backup) {
            warn!(path = %backup.display(), error = %e, "failed to remove old index backup");
        }
    }
    Ok(())
}

fn move_files(
    dir: &Path,
    staging: &Path,
    backup: &Path,
    moved_out: &mut Vec<&'static str>,
    moved_in: &mut Vec<&'static str>,
) -> io::Result<()> {
    // Manifest first, so a crash mid-swap leaves no manifest rather than a stale one.
    for name in [MANIFEST_FILE, RECORDS_FILE] {
        let src = dir.join(name);
        if src.exists() {
            fs::create_dir_all(backup)?;
            fs::rename(&src, backup.join(name))?;
            moved_out.push(name);
        }
    }
    for name in [RECORDS_FILE, MANIFEST_FILE] {
        fs::rename(staging.join(name), dir.join(name))?;
        moved_in.push(name);
    }
    Ok(())
}

/// Undo a partial [`swap_in`]. Records go back before the manifest.
fn restore(dir: &Path, backup: &Path, moved_in: &[&str], moved_out: &[&str]) {
    for name in moved_in.iter().rev() {
        if let Err(e) = fs::remove_file(dir.join(name)) {
            warn!(file = name, error = %e, "failed to remove partially swapped file");
        }
    }
    let mut restored = true;
    for name in moved_out.iter().rev() {
        if let Err(e) = fs::rename(backup.join(name), dir.join(name)) {
            warn!(file = name, backup = %backup.display(), error = %e, "failed to restore index file");
            restored = false;
        }
    }
    if restored && !moved_out.is_empty() {
        let _ = fs::remove_dir_all(backup);
    }
}

/// Read the index stored in `dir`.
///
/// Returns `Ok(None)` if `dir` or its manifest does not exist, meaning
/// nothing has been ingested yet.
///
/// # Errors
///
/// Returns [`RagError::VectorStoreError`] for an unsupported format version
/// or a record count that disagrees with the manifest, and I/O /
/// serialization errors for unreadable files.
pub fn load_index(dir: &Path) -> Result<Option<LoadedIndex>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "index directory does not exist");
        return Ok(None);
    }

    // The manifest is checked under the lock: a writer may have it moved aside.
    let lock = acquire_shared_lock(dir)?;
    let manifest_path = dir.join(MANIFEST_FILE);
    let loaded = if manifest_path.exists() { read_index(dir, &manifest_path).map(Some) } else { Ok(None) };
    if let Some(lock) = &lock {
        FileExt::unlock(lock)?;
    }

    let Some(loaded) = loaded? else {
        debug!(dir = %dir.display(), "no index manifest found");
        return Ok(None);
    };

    info!(
        dir = %dir.display(),
        records = loaded.manifest.record_count,
        model = %loaded.manifest.embedding_model,
        "loaded index"
    );
    Ok(Some(loaded))
}

fn read_index(dir: &Path, manifest_path: &Path) -> Result<LoadedIndex> {
    let manifest: IndexManifest = serde_json::from_slice(&fs::read(manifest_path)?)?;
    if manifest.version != FORMAT_VERSION {
        return Err(store_error(format!(
            "unsupported index format version {} (expected {FORMAT_VERSION})",
            manifest.version
        )));
    }

    let reader = BufReader::new(File::open(dir.join(RECORDS_FILE))?);
    let mut records = Vec::with_capacity(manifest.record_count);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str::<IndexedRecord>(&line)?);
    }

    if records.len() != manifest.record_count {
        return Err(store_error(format!(
            "manifest declares {} records but {} were found",
            manifest.record_count,
            records.len()
        )));
    }

    let store = InMemoryVectorStore::from_records(records)?;
    Ok(LoadedIndex { manifest, store })
}
