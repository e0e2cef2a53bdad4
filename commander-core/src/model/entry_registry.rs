//!
//! ``commander-core/src/model/entry_registry.rs``
//!
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ahash::RandomState;

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::{EntryHash, FilesystemEntry};

/// `EntryHash` -> `FilesystemEntry` for exactly one listing of one pane.
///
/// Rebuilt wholesale on every refresh. Each rebuild bumps `generation`, and
/// a hash that is not part of the current listing fails with
/// [`CoreError::UnknownItem`] instead of resolving to something else.
#[derive(Debug, Clone)]
pub struct EntryRegistry {
    directory: PathBuf,
    generation: u64,
    entries: HashMap<EntryHash, FilesystemEntry, RandomState>,

    /// Listing order as produced by the scanner.
    order: Vec<EntryHash>,
}

impl EntryRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            directory: PathBuf::new(),
            generation: 0,
            entries: HashMap::with_hasher(RandomState::new()),
            order: Vec::new(),
        }
    }

    /// Build the registry that replaces `self`, one generation later.
    #[must_use]
    pub fn rebuilt(&self, directory: PathBuf, listing: Vec<FilesystemEntry>) -> Self {
        let mut entries: HashMap<EntryHash, FilesystemEntry, RandomState> =
            HashMap::with_capacity_and_hasher(listing.len(), RandomState::new());
        let mut order: Vec<EntryHash> = Vec::with_capacity(listing.len());

        for entry in listing {
            let hash: EntryHash = entry.hash();
            // First occurrence wins if two paths ever collide
            if entries.contains_key(&hash) {
                tracing::warn!(hash = %hash, path = %entry.path().display(), "Duplicate entry hash in listing");
                continue;
            }
            order.push(hash);
            entries.insert(hash, entry);
        }

        Self {
            directory,
            generation: self.generation + 1,
            entries,
            order,
        }
    }

    /// Directory this listing was produced from.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn contains(&self, hash: EntryHash) -> bool {
        self.entries.contains_key(&hash)
    }

    pub fn get(&self, hash: EntryHash) -> CoreResult<&FilesystemEntry> {
        self.entries.get(&hash).ok_or(CoreError::UnknownItem {
            hash,
            generation: self.generation,
        })
    }

    pub(crate) fn get_mut(&mut self, hash: EntryHash) -> CoreResult<&mut FilesystemEntry> {
        let generation: u64 = self.generation;
        self.entries
            .get_mut(&hash)
            .ok_or(CoreError::UnknownItem { hash, generation })
    }

    pub fn by_index(&self, index: usize) -> CoreResult<&FilesystemEntry> {
        let hash: EntryHash = *self.order.get(index).ok_or(CoreError::IndexOutOfRange {
            index,
            len: self.order.len(),
        })?;

        self.get(hash)
    }

    /// Position of `hash` in listing order.
    #[must_use]
    pub fn index_of(&self, hash: EntryHash) -> Option<usize> {
        self.order.iter().position(|h: &EntryHash| *h == hash)
    }

    #[must_use]
    pub fn hashes(&self) -> &[EntryHash] {
        &self.order
    }

    /// Entries in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &FilesystemEntry> + '_ {
        self.order.iter().filter_map(|hash: &EntryHash| self.entries.get(hash))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for EntryRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn listing(dir: &Path) -> Vec<FilesystemEntry> {
        crate::fs::dir_scanner::scan_dir(dir, Default::default()).unwrap()
    }

    #[test]
    fn hashes_survive_rebuild_and_point_at_latest_data() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("log.txt");
        fs::write(&file, "a").unwrap();

        let first = EntryRegistry::empty().rebuilt(dir.path().into(), listing(dir.path()));
        let hash = EntryHash::of_path(&file);
        assert_eq!(first.get(hash).unwrap().size(), Some(1));

        fs::write(&file, "abcdef").unwrap();
        let second = first.rebuilt(dir.path().into(), listing(dir.path()));

        assert_eq!(second.generation(), first.generation() + 1);
        assert_eq!(second.get(hash).unwrap().size(), Some(6));
    }

    #[test]
    fn stale_hash_fails_explicitly() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doomed.txt");
        fs::write(&file, "x").unwrap();

        let first = EntryRegistry::empty().rebuilt(dir.path().into(), listing(dir.path()));
        let hash = first.hashes()[0];

        fs::remove_file(&file).unwrap();
        let second = first.rebuilt(dir.path().into(), listing(dir.path()));

        let err = second.get(hash).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownItem);
        assert!(second.is_empty());
    }

    #[test]
    fn index_lookups_follow_listing_order() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("b_dir")).unwrap();
        fs::write(dir.path().join("a_file"), "").unwrap();

        let registry = EntryRegistry::empty().rebuilt(dir.path().into(), listing(dir.path()));

        assert_eq!(registry.by_index(0).unwrap().name(), "b_dir");
        assert_eq!(registry.by_index(1).unwrap().name(), "a_file");
        assert!(registry.by_index(2).is_err());
        assert_eq!(registry.index_of(registry.hashes()[1]), Some(1));
    }
}
