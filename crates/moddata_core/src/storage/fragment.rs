//! Fragment file operations.
//!
//! # Responsibility
//! - Open, write, enumerate and clear fragment files.
//! - Classify "nothing on disk" separately from real I/O failures.
//!
//! # Invariants
//! - Writes go to `<file>.tmp` first and are renamed into place, so a failed
//!   write leaves the previous fragment untouched.
//! - Missing files and directories are reported as absence, not errors.

use super::codec::CodecError;
use super::{FragmentError, FragmentResult};
use crate::model::scope::SYNCED_FRAGMENT_SUFFIX;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const TEMP_SUFFIX: &str = ".tmp";

/// Result of removing a directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Removed,
    /// Nothing existed at the path.
    Missing,
}

/// Opens a fragment for reading.
///
/// Returns `Ok(None)` when the file or any parent directory does not exist.
pub fn open_fragment(path: &Path) -> FragmentResult<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(FragmentError::io(path, err)),
    }
}

/// Replaces the fragment at `path` with whatever `write` produces.
///
/// Parent directories are created as needed.
pub fn write_fragment<F>(path: &Path, write: F) -> FragmentResult<()>
where
    F: FnOnce(&mut dyn Write) -> Result<(), CodecError>,
{
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let temp_path = temp_path_for(path);
    let result = write_then_rename(path, &temp_path, write);
    if result.is_err() {
        // Best effort; the temp file never shadows a real fragment.
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_then_rename<F>(path: &Path, temp_path: &Path, write: F) -> FragmentResult<()>
where
    F: FnOnce(&mut dyn Write) -> Result<(), CodecError>,
{
    let mut file = File::create(temp_path).map_err(|err| FragmentError::io(temp_path, err))?;
    write(&mut file).map_err(|err| FragmentError::codec(path, err))?;
    file.sync_all()
        .map_err(|err| FragmentError::io(temp_path, err))?;
    drop(file);

    fs::rename(temp_path, path).map_err(|err| FragmentError::io(path, err))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(TEMP_SUFFIX);
    PathBuf::from(raw)
}

/// Creates `dir` and its parents.
pub fn ensure_dir(dir: &Path) -> FragmentResult<()> {
    fs::create_dir_all(dir).map_err(|err| FragmentError::io(dir, err))
}

/// Recursively removes `dir`.
pub fn clear_dir(dir: &Path) -> FragmentResult<ClearOutcome> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(ClearOutcome::Removed),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(ClearOutcome::Missing),
        Err(err) => Err(FragmentError::io(dir, err)),
    }
}

/// Lists mod ids owning a synced fragment anywhere below `dir`.
///
/// Ids are sorted and de-duplicated. A missing `dir` yields an empty list.
pub fn list_fragment_ids(dir: &Path) -> FragmentResult<Vec<String>> {
    let mut ids = BTreeSet::new();

    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if err.io_error().map(|io| io.kind()) == Some(ErrorKind::NotFound) {
                    continue;
                }
                let path = err.path().unwrap_or(dir).to_path_buf();
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(ErrorKind::Other, "directory loop"));
                return Err(FragmentError::io(&path, source));
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if let Some(id) = fragment_id_from_file_name(name) {
            ids.insert(id.to_string());
        }
    }

    Ok(ids.into_iter().collect())
}

/// Extracts `<id>` from `<id>.json.dat`.
pub fn fragment_id_from_file_name(name: &str) -> Option<&str> {
    name.strip_suffix(SYNCED_FRAGMENT_SUFFIX)
        .filter(|id| !id.is_empty())
}
