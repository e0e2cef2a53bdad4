//! `src/fs/entry.rs`
//! ============================================================
//! Snapshot of one filesystem object as listed in a pane.
//!
//! Identity
//! --------
//! • `EntryHash` is derived from the normalized absolute path only, never from
//!   content, so it survives refreshes while the path persists.
//! • Two distinct paths colliding is accepted as a 64-bit birthday-bound risk.
//! • Normalization: absolute, `.`/`..` folded lexically, no trailing
//!   separator, `/` as separator in the hashed form, case preserved. Symlinks
//!   are not resolved.

use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ahash::RandomState;
use bytesize::ByteSize;
use chrono::{DateTime, Local, TimeZone};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// Fixed seeds keep hashes identical across runs, not just within one process.
const HASH_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

const CD_UP_NAME: &str = "..";

/// Stable identity of a listed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryHash(pub u64);

impl std::fmt::Display for EntryHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl EntryHash {
    /// Hash of the normalized form of `path`.
    #[must_use]
    pub fn of_path(path: &Path) -> Self {
        Self::of_normalized(&normalize_path(path))
    }

    /// Hash of a path already passed through [`normalize_path`].
    #[must_use]
    pub fn of_normalized(path: &Path) -> Self {
        let state: RandomState =
            RandomState::with_seeds(HASH_SEEDS[0], HASH_SEEDS[1], HASH_SEEDS[2], HASH_SEEDS[3]);

        Self(state.hash_one(hash_key(path)))
    }

    /// Identity of the synthetic ".." row shown inside `listed_dir`.
    #[must_use]
    pub fn of_cd_up(listed_dir: &Path) -> Self {
        let state: RandomState =
            RandomState::with_seeds(HASH_SEEDS[0], HASH_SEEDS[1], HASH_SEEDS[2], HASH_SEEDS[3]);

        Self(state.hash_one((CD_UP_NAME, hash_key(&normalize_path(listed_dir)))))
    }
}

fn hash_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Absolute, lexically cleaned form of `path`.
///
/// Relative paths are resolved against the current directory. `..` never
/// climbs above the root.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute: PathBuf = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out: PathBuf = PathBuf::new();

    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if out.parent().is_some() {
                    out.pop();
                }
            }
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
    /// Synthetic parent-directory row.
    SymlinkCdUp,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "File"),
            Self::Directory => write!(f, "Dir"),
            Self::SymlinkCdUp => write!(f, "CdUp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeState {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemEntry {
    hash: EntryHash,
    path: Arc<PathBuf>,
    name: CompactString,
    kind: EntryKind,
    is_executable: bool,
    size: Option<u64>,
    size_state: SizeState,
    modified: SystemTime,
}

impl FilesystemEntry {
    /// Stat `path` and build its entry. Symlinks are followed, dangling ones
    /// are listed as files.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let path: PathBuf = normalize_path(path);

        let meta: Metadata = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(_) => fs::symlink_metadata(&path).map_err(|e| CoreError::from_io(&path, e))?,
        };

        Ok(Self::from_metadata(path, &meta))
    }

    /// Build from metadata already fetched by a directory scan.
    #[must_use]
    pub fn from_metadata(path: PathBuf, meta: &Metadata) -> Self {
        let is_dir: bool = meta.is_dir();
        let name: CompactString = display_name(&path);

        Self {
            hash: EntryHash::of_normalized(&path),
            name,
            kind: if is_dir {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            is_executable: !is_dir && is_executable(&path, meta),
            size: if is_dir { None } else { Some(meta.len()) },
            size_state: if is_dir {
                SizeState::NotStarted
            } else {
                SizeState::Done
            },
            modified: meta.modified().unwrap_or(UNIX_EPOCH),
            path: Arc::new(path),
        }
    }

    /// Directory entry that could not be stat'ed (e.g. an empty card reader).
    #[must_use]
    pub fn directory_placeholder(path: &Path) -> Self {
        let path: PathBuf = normalize_path(path);

        Self {
            hash: EntryHash::of_normalized(&path),
            name: display_name(&path),
            kind: EntryKind::Directory,
            is_executable: false,
            size: None,
            size_state: SizeState::NotStarted,
            modified: UNIX_EPOCH,
            path: Arc::new(path),
        }
    }

    /// The ".." row listed inside `listed_dir`, pointing at `parent`.
    #[must_use]
    pub fn cd_up(listed_dir: &Path, parent: &Path) -> Self {
        Self {
            hash: EntryHash::of_cd_up(listed_dir),
            name: CompactString::const_new(CD_UP_NAME),
            kind: EntryKind::SymlinkCdUp,
            is_executable: false,
            size: None,
            size_state: SizeState::NotStarted,
            modified: UNIX_EPOCH,
            path: Arc::new(normalize_path(parent)),
        }
    }

    #[inline]
    #[must_use]
    pub const fn hash(&self) -> EntryHash {
        self.hash
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn shared_path(&self) -> Arc<PathBuf> {
        Arc::clone(&self.path)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory | EntryKind::SymlinkCdUp)
    }

    #[inline]
    #[must_use]
    pub const fn is_cd_up(&self) -> bool {
        matches!(self.kind, EntryKind::SymlinkCdUp)
    }

    #[inline]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }

    #[inline]
    #[must_use]
    pub const fn is_executable(&self) -> bool {
        self.is_executable
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn size_state(&self) -> SizeState {
        self.size_state
    }

    #[inline]
    #[must_use]
    pub const fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Directory holding this entry.
    #[must_use]
    pub fn parent_dir(&self) -> Option<&Path> {
        self.path.parent()
    }

    // Human-readable size string, empty while unknown.
    #[must_use]
    pub fn size_human(&self) -> String {
        self.size
            .map(|size: u64| ByteSize::b(size).to_string())
            .unwrap_or_default()
    }

    // Format the modification date.
    #[expect(clippy::cast_possible_wrap, reason = "Expected")]
    #[must_use]
    pub fn format_date(&self, fmt: &str) -> String {
        let dur: Duration = self
            .modified
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| -> Duration { Duration::from_secs(0) });

        let dt: DateTime<Local> = Local
            .timestamp_opt(dur.as_secs() as i64, dur.subsec_nanos())
            .single()
            .unwrap_or_else(|| -> DateTime<Local> { Local::now() });

        dt.format(fmt).to_string()
    }

    pub(crate) const fn mark_size_in_progress(&mut self) {
        self.size_state = SizeState::InProgress;
    }

    /// `None` means the subtree could not be measured.
    pub(crate) const fn set_directory_size(&mut self, size: Option<u64>) {
        self.size = size;
        self.size_state = SizeState::Done;
    }
}

fn display_name(path: &Path) -> CompactString {
    match path.file_name().and_then(OsStr::to_str) {
        Some(name) => CompactString::new(name),
        // Roots have no file name
        None => CompactString::new(path.to_string_lossy()),
    }
}

#[cfg(unix)]
fn is_executable(_path: &Path, meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(path: &Path, _meta: &Metadata) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
        .is_some_and(|ext: String| ["exe", "com", "bat", "cmd"].contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn normalization_folds_dots_and_trailing_separators() {
        let base: PathBuf = normalize_path(Path::new("/a/b"));
        assert_eq!(normalize_path(Path::new("/a/./b/")), base);
        assert_eq!(normalize_path(Path::new("/a/b/c/..")), base);
        assert_eq!(normalize_path(Path::new("/../..")), PathBuf::from("/"));
    }

    #[test]
    fn hash_depends_on_normalized_path_only() {
        assert_eq!(
            EntryHash::of_path(Path::new("/tmp/x/../y")),
            EntryHash::of_path(Path::new("/tmp/y"))
        );
        assert_ne!(
            EntryHash::of_path(Path::new("/tmp/Y")),
            EntryHash::of_path(Path::new("/tmp/y"))
        );
        assert_ne!(
            EntryHash::of_cd_up(Path::new("/tmp/y")),
            EntryHash::of_path(Path::new("/tmp"))
        );
    }

    #[test]
    fn file_entries_carry_size_eagerly() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.bin");
        fs::write(&file, vec![0u8; 1500]).unwrap();

        let entry = FilesystemEntry::from_path(&file).unwrap();
        assert_eq!(entry.kind(), EntryKind::File);
        assert_eq!(entry.size(), Some(1500));
        assert_eq!(entry.size_state(), SizeState::Done);
        assert_eq!(entry.name(), "data.bin");
        assert!(!entry.size_human().is_empty());

        let sub = FilesystemEntry::from_path(dir.path()).unwrap();
        assert!(sub.is_dir());
        assert_eq!(sub.size(), None);
        assert_eq!(sub.size_state(), SizeState::NotStarted);
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_is_detected() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let script = dir.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        let mut perms = fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script, perms).unwrap();

        assert!(FilesystemEntry::from_path(&script).unwrap().is_executable());
    }

    #[test]
    fn missing_path_is_not_accessible() {
        let dir = TempDir::new().unwrap();
        let err = FilesystemEntry::from_path(&dir.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::PathNotAccessible);
    }
}
