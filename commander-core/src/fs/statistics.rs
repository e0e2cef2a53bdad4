//! ``src/fs/statistics.rs``
//!
//! Recursive size and object-count aggregation. Everything here may block for
//! a long time on deep trees and must only run on worker threads.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// Totals for a selection of filesystem objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemObjectsStatistics {
    pub files: u64,
    pub folders: u64,
    pub occupied_space: u64,
}

/// Recursive byte total of every file below `path`.
///
/// Returns `None` when the root itself cannot be read; unreadable subtrees
/// are skipped and the rest is still summed.
#[must_use]
pub fn directory_size(path: &Path) -> Option<u64> {
    std::fs::read_dir(path).ok()?;

    let total: u64 = WalkDir::new(path)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry: &walkdir::DirEntry| entry.file_type().is_file())
        .filter_map(|entry: walkdir::DirEntry| entry.metadata().ok())
        .map(|meta: std::fs::Metadata| meta.len())
        .sum();

    Some(total)
}

/// Counts files and folders in `paths`, descending into directories.
#[must_use]
pub fn calculate_statistics(paths: &[PathBuf]) -> FilesystemObjectsStatistics {
    let mut stats: FilesystemObjectsStatistics = FilesystemObjectsStatistics::default();

    for path in paths {
        for entry in WalkDir::new(path).into_iter().filter_map(Result::ok) {
            let file_type = entry.file_type();

            if file_type.is_dir() {
                stats.folders += 1;
            } else if file_type.is_file() {
                stats.files += 1;
                stats.occupied_space += entry.metadata().map_or(0, |meta| meta.len());
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.bin"), vec![0u8; 100]).unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("sub/b.bin"), vec![0u8; 20]).unwrap();
        fs::write(dir.path().join("sub/deeper/c.bin"), vec![0u8; 3]).unwrap();
        dir
    }

    #[test]
    fn directory_size_sums_nested_files() {
        let dir = tree();
        assert_eq!(directory_size(dir.path()), Some(123));
        assert_eq!(directory_size(&dir.path().join("sub")), Some(23));
    }

    #[test]
    fn directory_size_of_missing_root_is_unknown() {
        let dir = TempDir::new().unwrap();
        assert_eq!(directory_size(&dir.path().join("nope")), None);
    }

    #[test]
    fn statistics_count_selected_objects() {
        let dir = tree();
        let stats = calculate_statistics(&[dir.path().join("a.bin"), dir.path().join("sub")]);

        assert_eq!(
            stats,
            FilesystemObjectsStatistics {
                files: 3,
                folders: 2,
                occupied_space: 123,
            }
        );
    }
}
