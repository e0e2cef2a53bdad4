//! ``src/fs/dir_scanner.rs``
//!
//! # `Directory Scanner`: Synchronous Filesystem Listing
//!
//! Lists one directory into `FilesystemEntry` snapshots. Listing runs on the
//! owning thread and is expected to be cheap; recursive work lives in
//! [`crate::fs::statistics`] and runs on the worker pool.

use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fs::{self, DirEntry, Metadata, ReadDir};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::{FilesystemEntry, normalize_path};

/// Options shared by both scan flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanOptions {
    /// Include dot-files.
    pub show_hidden: bool,

    /// Prepend a ".." row when the directory has a parent.
    pub include_cd_up: bool,
}

/// Lists `path` sorted directories first, then by name.
///
/// Fails only when the directory itself cannot be opened; unreadable children
/// are logged and skipped.
pub fn scan_dir(path: &Path, options: ScanOptions) -> CoreResult<Vec<FilesystemEntry>> {
    let start_time: Instant = Instant::now();
    let dir: PathBuf = normalize_path(path);

    let read_dir: ReadDir = fs::read_dir(&dir).map_err(|e| CoreError::from_io(&dir, e))?;
    let mut entries: Vec<FilesystemEntry> = Vec::new();

    for entry_result in read_dir {
        let entry: DirEntry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };

        let entry_path: PathBuf = entry.path();
        if !options.show_hidden && is_hidden(&entry_path) {
            continue;
        }

        // Follow symlinks so linked directories stay navigable
        let meta: Metadata = match fs::metadata(&entry_path).or_else(|_| entry.metadata()) {
            Ok(meta) => meta,
            Err(e) => {
                debug!("Failed to stat {:?}: {}", entry_path, e);
                continue;
            }
        };

        entries.push(FilesystemEntry::from_metadata(entry_path, &meta));
    }

    sort_entries(&mut entries);

    if options.include_cd_up
        && let Some(parent) = dir.parent()
    {
        entries.insert(0, FilesystemEntry::cd_up(&dir, parent));
    }

    let duration: Duration = start_time.elapsed();
    info!(
        marker = "PERF_DIRECTORY_SCAN",
        operation_type = "scan_dir",
        path = %dir.display(),
        entries = entries.len(),
        duration_us = duration.as_micros(),
        "Directory scan completed"
    );

    Ok(entries)
}

/// Every file below `path`, for the flat "all files" view.
pub fn scan_recursive(path: &Path, options: ScanOptions) -> CoreResult<Vec<FilesystemEntry>> {
    let dir: PathBuf = normalize_path(path);

    // Surface a missing root as an error rather than an empty listing
    fs::read_dir(&dir).map_err(|e| CoreError::from_io(&dir, e))?;

    let mut entries: Vec<FilesystemEntry> = WalkDir::new(&dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e: &walkdir::DirEntry| options.show_hidden || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .filter(|e: &walkdir::DirEntry| e.file_type().is_file())
        .filter_map(|e: walkdir::DirEntry| -> Option<FilesystemEntry> {
            let meta: Metadata = e.metadata().ok()?;
            Some(FilesystemEntry::from_metadata(e.into_path(), &meta))
        })
        .collect();

    entries.sort_by(|a: &FilesystemEntry, b: &FilesystemEntry| a.path().cmp(b.path()));

    info!(
        marker = "PERF_DIRECTORY_SCAN",
        operation_type = "scan_recursive",
        path = %dir.display(),
        entries = entries.len(),
        "Recursive scan completed"
    );

    Ok(entries)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name: &str| name.starts_with('.'))
}

fn sort_entries(entries: &mut [FilesystemEntry]) {
    entries.sort_by(|a: &FilesystemEntry, b: &FilesystemEntry| -> Ordering {
        if a.is_dir() && !b.is_dir() {
            Ordering::Less
        } else if !a.is_dir() && b.is_dir() {
            Ordering::Greater
        } else {
            a.name().cmp(b.name())
        }
    });
}
