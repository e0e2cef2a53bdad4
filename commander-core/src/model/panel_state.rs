//! ``src/model/panel_state.rs``
//! ============================================================================
//! # `PanelState`: Navigation State Machine for One Pane
//!
//! Owns the current directory, back/forward history, per-folder cursor memory
//! and the `EntryRegistry` of the current listing. A path change is committed
//! only after the new directory has been listed, so every failure leaves the
//! pane exactly as it was.

use std::collections::{HashMap, VecDeque};
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::RandomState;
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::fs::dir_scanner::{self, ScanOptions};
use crate::fs::entry::{EntryHash, EntryKind, FilesystemEntry, normalize_path};
use crate::model::entry_registry::EntryRegistry;
use crate::model::observers::{ObserverRegistry, SubscriptionId};
use crate::model::pane::Pane;
use crate::volumes::Volume;

/// Why a navigation happened; decides how history is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationCause {
    /// Entering a directory or jumping to a typed path.
    Explicit,

    /// Leaving to the parent; the exited child becomes the cursor hint.
    CdUp,

    /// Replay of the top of the back stack.
    HistoryBack,

    /// Replay of the top of the forward stack.
    HistoryForward,

    /// Re-list the current directory.
    Refresh,

    /// Programmatic moves (disk switch, restore, volume removal).
    Other,
}

impl std::fmt::Display for NavigationCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &str = match self {
            Self::Explicit => "explicit",
            Self::CdUp => "cd_up",
            Self::HistoryBack => "history_back",
            Self::HistoryForward => "history_forward",
            Self::Refresh => "refresh",
            Self::Other => "other",
        };

        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Changed,
    Unchanged,
}

/// What activating an entry should do. Classification only; the controller
/// performs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Navigate {
        path: Arc<PathBuf>,
        cause: NavigationCause,
    },

    Launch {
        path: Arc<PathBuf>,
        working_dir: PathBuf,
    },

    OpenWithDefault {
        path: Arc<PathBuf>,
    },
}

/// Informed after each successful registry rebuild of a pane.
pub trait PanelContentsListener {
    fn contents_changed(&mut self, pane: Pane, registry: &EntryRegistry);

    /// A single entry was updated in place (e.g. its size arrived).
    fn item_changed(&mut self, _pane: Pane, _entry: &FilesystemEntry) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelOptions {
    pub show_hidden: bool,

    /// Maximum depth of the back stack.
    pub history_limit: usize,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            show_hidden: false,
            history_limit: 256,
        }
    }
}

#[derive(Debug)]
pub struct PanelState {
    pane: Pane,

    /// Directory listed at the last successful navigation.
    current_path: PathBuf,

    back: VecDeque<PathBuf>,
    forward: Vec<PathBuf>,

    /// Best-effort hints, never required to resolve.
    cursor_memory: HashMap<PathBuf, EntryHash, RandomState>,

    registry: EntryRegistry,

    /// Copy of the volume list, replaced wholesale.
    volumes: Vec<Volume>,

    options: PanelOptions,

    /// Registry currently holds the recursive "all files" listing.
    flat_view: bool,

    listeners: ObserverRegistry<dyn PanelContentsListener>,
}

impl PanelState {
    /// Open a pane listing `path`.
    pub fn open(pane: Pane, path: &Path, options: PanelOptions) -> CoreResult<Self> {
        let current_path: PathBuf = normalize_path(path);
        let listing: Vec<FilesystemEntry> = list_directory(&current_path, options)?;
        let registry: EntryRegistry = EntryRegistry::empty().rebuilt(current_path.clone(), listing);

        info!(
            marker = "PANEL",
            operation_type = "panel_open",
            pane = %pane,
            path = %current_path.display(),
            "Panel opened"
        );

        Ok(Self {
            pane,
            current_path,
            back: VecDeque::new(),
            forward: Vec::new(),
            cursor_memory: HashMap::with_hasher(RandomState::new()),
            registry,
            volumes: Vec::new(),
            options,
            flat_view: false,
            listeners: ObserverRegistry::new(),
        })
    }

    #[must_use]
    pub const fn pane(&self) -> Pane {
        self.pane
    }

    #[must_use]
    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    #[must_use]
    pub const fn registry(&self) -> &EntryRegistry {
        &self.registry
    }

    /// Oldest first.
    #[must_use]
    pub fn back_history(&self) -> Vec<&Path> {
        self.back.iter().map(PathBuf::as_path).collect()
    }

    /// Next replay last.
    #[must_use]
    pub fn forward_history(&self) -> Vec<&Path> {
        self.forward.iter().map(PathBuf::as_path).collect()
    }

    #[must_use]
    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    #[must_use]
    pub const fn options(&self) -> PanelOptions {
        self.options
    }

    #[must_use]
    pub const fn is_flat_view(&self) -> bool {
        self.flat_view
    }

    pub fn add_contents_listener(&mut self, listener: Box<dyn PanelContentsListener>) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn remove_contents_listener(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id).is_some()
    }

    /// Navigate to `path`. Nothing is committed unless listing succeeds.
    pub fn set_path(&mut self, path: &Path, cause: NavigationCause) -> CoreResult<NavigationOutcome> {
        let target: PathBuf = normalize_path(path);

        if target == self.current_path && !self.flat_view {
            if cause == NavigationCause::Refresh {
                self.refresh_file_list(cause)?;
            }
            return Ok(NavigationOutcome::Unchanged);
        }

        let listing: Vec<FilesystemEntry> = match list_directory(&target, self.options) {
            Ok(listing) => listing,
            Err(e) => {
                warn!(
                    marker = "PANEL",
                    operation_type = "set_path_failed",
                    pane = %self.pane,
                    path = %target.display(),
                    cause = %cause,
                    error = %e,
                    "Navigation failed, state unchanged"
                );
                return Err(e);
            }
        };

        let previous: PathBuf = std::mem::replace(&mut self.current_path, target);

        match cause {
            NavigationCause::HistoryBack => {
                self.back.pop_back();
                self.forward.push(previous.clone());
            }
            NavigationCause::HistoryForward => {
                self.forward.pop();
                self.push_back(previous.clone());
            }
            _ if previous != self.current_path => {
                self.push_back(previous.clone());
                self.forward.clear();
            }
            _ => {}
        }

        if cause == NavigationCause::CdUp {
            self.cursor_memory
                .insert(self.current_path.clone(), EntryHash::of_normalized(&previous));
        }

        self.install_listing(listing, false);

        info!(
            marker = "PANEL",
            operation_type = "set_path",
            pane = %self.pane,
            from = %previous.display(),
            to = %self.current_path.display(),
            cause = %cause,
            "Panel path changed"
        );

        Ok(NavigationOutcome::Changed)
    }

    pub fn navigate_up(&mut self) -> CoreResult<NavigationOutcome> {
        match self.current_path.parent().map(Path::to_path_buf) {
            Some(parent) => self.set_path(&parent, NavigationCause::CdUp),
            None => Ok(NavigationOutcome::Unchanged),
        }
    }

    /// No-op on an empty back stack. An entry that can no longer be listed
    /// is dropped and its error returned, so the next call reaches the one
    /// below it.
    pub fn navigate_back(&mut self) -> CoreResult<NavigationOutcome> {
        while self.back.back() == Some(&self.current_path) {
            self.back.pop_back();
        }

        let Some(target) = self.back.back().cloned() else {
            return Ok(NavigationOutcome::Unchanged);
        };

        let result: CoreResult<NavigationOutcome> =
            self.set_path(&target, NavigationCause::HistoryBack);
        if result.is_err() {
            self.back.pop_back();
            self.history_entry_dropped(&target);
        }
        result
    }

    /// No-op on an empty forward stack. Unreachable entries are dropped like
    /// in [`Self::navigate_back`].
    pub fn navigate_forward(&mut self) -> CoreResult<NavigationOutcome> {
        while self.forward.last() == Some(&self.current_path) {
            self.forward.pop();
        }

        let Some(target) = self.forward.last().cloned() else {
            return Ok(NavigationOutcome::Unchanged);
        };

        let result: CoreResult<NavigationOutcome> =
            self.set_path(&target, NavigationCause::HistoryForward);
        if result.is_err() {
            self.forward.pop();
            self.history_entry_dropped(&target);
        }
        result
    }

    fn history_entry_dropped(&self, path: &Path) {
        debug!(
            marker = "PANEL",
            operation_type = "history_entry_dropped",
            pane = %self.pane,
            path = %path.display(),
            "Unreachable history entry removed"
        );
    }

    /// Re-list the current directory without touching history.
    pub fn refresh_file_list(&mut self, cause: NavigationCause) -> CoreResult<()> {
        let listing: Vec<FilesystemEntry> = list_directory(&self.current_path, self.options)?;

        debug!(
            marker = "PANEL",
            operation_type = "refresh",
            pane = %self.pane,
            cause = %cause,
            "Refreshing file list"
        );

        self.install_listing(listing, false);
        Ok(())
    }

    /// Replace the listing with every file below the current directory.
    pub fn show_all_files_recursively(&mut self) -> CoreResult<()> {
        let options: ScanOptions = ScanOptions {
            show_hidden: self.options.show_hidden,
            include_cd_up: false,
        };
        let listing: Vec<FilesystemEntry> = dir_scanner::scan_recursive(&self.current_path, options)?;

        self.install_listing(listing, true);
        Ok(())
    }

    /// Classify what activating `hash` means.
    pub fn item_activated(&self, hash: EntryHash) -> CoreResult<Activation> {
        let entry: &FilesystemEntry = self.registry.get(hash)?;

        let activation: Activation = match entry.kind() {
            EntryKind::SymlinkCdUp => Activation::Navigate {
                path: entry.shared_path(),
                cause: NavigationCause::CdUp,
            },
            EntryKind::Directory => Activation::Navigate {
                path: entry.shared_path(),
                cause: NavigationCause::Explicit,
            },
            EntryKind::File if entry.is_executable() => Activation::Launch {
                path: entry.shared_path(),
                working_dir: entry
                    .parent_dir()
                    .map_or_else(|| self.current_path.clone(), Path::to_path_buf),
            },
            EntryKind::File => Activation::OpenWithDefault {
                path: entry.shared_path(),
            },
        };

        Ok(activation)
    }

    pub fn set_current_item_for_folder(&mut self, dir: &Path, hash: EntryHash) {
        self.cursor_memory.insert(normalize_path(dir), hash);
    }

    #[must_use]
    pub fn current_item_for_folder(&self, dir: &Path) -> Option<EntryHash> {
        self.cursor_memory.get(&normalize_path(dir)).copied()
    }

    pub fn set_show_hidden(&mut self, show_hidden: bool) {
        self.options.show_hidden = show_hidden;
    }

    /// Mark a listed directory as being measured and hand back its path for
    /// the worker.
    pub fn begin_directory_size(&mut self, hash: EntryHash) -> CoreResult<Arc<PathBuf>> {
        let entry: &mut FilesystemEntry = self.registry.get_mut(hash)?;

        if entry.kind() != EntryKind::Directory {
            return Err(CoreError::NotADirectory(entry.path().to_path_buf()));
        }

        entry.mark_size_in_progress();
        Ok(entry.shared_path())
    }

    /// Store a computed size if `hash` is still part of the current listing.
    /// Returns `false` when the result is stale and was dropped.
    pub fn apply_directory_size(&mut self, hash: EntryHash, size: Option<u64>) -> bool {
        let Ok(entry) = self.registry.get_mut(hash) else {
            return false;
        };

        if entry.kind() != EntryKind::Directory {
            return false;
        }

        entry.set_directory_size(size);

        let pane: Pane = self.pane;
        if let Ok(entry) = self.registry.get(hash) {
            self.listeners.notify(|listener| listener.item_changed(pane, entry));
        }

        true
    }

    /// Replace the copy of the volume list. A pane whose directory vanished
    /// moves to the nearest existing ancestor.
    pub fn volumes_changed(&mut self, volumes: &[Volume]) {
        self.volumes = volumes.to_vec();

        if self.current_path.is_dir() {
            return;
        }

        let fallback: Option<PathBuf> = self
            .current_path
            .ancestors()
            .skip(1)
            .find(|p: &&Path| p.is_dir())
            .map(Path::to_path_buf)
            .or_else(|| volumes.first().map(|v: &Volume| v.root_path().to_path_buf()));

        if let Some(target) = fallback
            && let Err(e) = self.set_path(&target, NavigationCause::Other)
        {
            warn!(
                marker = "PANEL",
                operation_type = "volume_fallback_failed",
                pane = %self.pane,
                path = %target.display(),
                error = %e,
                "Could not leave vanished directory"
            );
        }
    }

    fn push_back(&mut self, path: PathBuf) {
        if self.options.history_limit == 0 {
            return;
        }
        while self.back.len() >= self.options.history_limit {
            self.back.pop_front();
        }
        self.back.push_back(path);
    }

    fn install_listing(&mut self, listing: Vec<FilesystemEntry>, flat_view: bool) {
        self.registry = self.registry.rebuilt(self.current_path.clone(), listing);
        self.flat_view = flat_view;

        let pane: Pane = self.pane;
        let registry: &EntryRegistry = &self.registry;
        self.listeners
            .notify(|listener| listener.contents_changed(pane, registry));
    }
}

/// Validate `path` as an accessible directory and list it.
fn list_directory(path: &Path, options: PanelOptions) -> CoreResult<Vec<FilesystemEntry>> {
    let meta: Metadata = fs::metadata(path).map_err(|e| CoreError::from_io(path, e))?;

    if !meta.is_dir() {
        return Err(CoreError::NotADirectory(path.to_path_buf()));
    }

    dir_scanner::scan_dir(
        path,
        ScanOptions {
            show_hidden: options.show_hidden,
            include_cd_up: true,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/inner")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/notes.txt"), "hello").unwrap();
        dir
    }

    fn open(dir: &Path) -> PanelState {
        PanelState::open(Pane::Left, dir, PanelOptions::default()).unwrap()
    }

    #[test]
    fn test_history_round_trip() {
        let root = tree();
        let a = root.path().join("a");
        let b = root.path().join("b");
        let mut panel = open(root.path());

        panel.set_path(&a, NavigationCause::Explicit).unwrap();
        panel.set_path(&b, NavigationCause::Explicit).unwrap();

        assert_eq!(panel.navigate_back().unwrap(), NavigationOutcome::Changed);
        assert_eq!(panel.current_path(), a);

        assert_eq!(panel.navigate_forward().unwrap(), NavigationOutcome::Changed);
        assert_eq!(panel.current_path(), b);
        assert!(panel.forward_history().is_empty());
    }

    #[test]
    fn test_back_on_empty_stack_is_noop() {
        let root = tree();
        let mut panel = open(root.path());
        let generation = panel.registry().generation();

        assert_eq!(panel.navigate_back().unwrap(), NavigationOutcome::Unchanged);
        assert_eq!(panel.navigate_forward().unwrap(), NavigationOutcome::Unchanged);
        assert_eq!(panel.current_path(), root.path());
        assert_eq!(panel.registry().generation(), generation);
    }

    #[test]
    fn test_unreachable_history_entry_is_dropped() {
        let root = tree();
        let a = root.path().join("a");
        let b = root.path().join("b");
        let mut panel = open(root.path());

        panel.set_path(&a, NavigationCause::Explicit).unwrap();
        panel.set_path(&b, NavigationCause::Explicit).unwrap();
        fs::remove_dir_all(&a).unwrap();

        let err = panel.navigate_back().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathNotAccessible);
        assert_eq!(panel.current_path(), b);
        assert_eq!(panel.back_history(), vec![root.path()]);

        assert_eq!(panel.navigate_back().unwrap(), NavigationOutcome::Changed);
        assert_eq!(panel.current_path(), root.path());
        assert_eq!(panel.forward_history(), vec![b.as_path()]);

        fs::remove_dir_all(&b).unwrap();
        assert!(panel.navigate_forward().is_err());
        assert!(panel.forward_history().is_empty());
        assert_eq!(panel.navigate_forward().unwrap(), NavigationOutcome::Unchanged);
    }

    #[test]
    fn test_new_navigation_clears_forward_stack() {
        let root = tree();
        let mut panel = open(root.path());

        panel.set_path(&root.path().join("a"), NavigationCause::Explicit).unwrap();
        panel.navigate_back().unwrap();
        assert_eq!(panel.forward_history().len(), 1);

        panel.set_path(&root.path().join("b"), NavigationCause::Explicit).unwrap();
        assert!(panel.forward_history().is_empty());
    }

    #[test]
    fn test_failed_navigation_leaves_state_untouched() {
        let root = tree();
        let mut panel = open(root.path());
        panel.set_path(&root.path().join("a"), NavigationCause::Explicit).unwrap();

        let path_before = panel.current_path().to_path_buf();
        let back_before: Vec<PathBuf> = panel.back_history().iter().map(|p| p.to_path_buf()).collect();
        let generation = panel.registry().generation();

        let missing = panel.set_path(&root.path().join("missing"), NavigationCause::Explicit);
        assert_eq!(missing.unwrap_err().kind(), ErrorKind::PathNotAccessible);

        let file = panel.set_path(&root.path().join("a/notes.txt"), NavigationCause::Explicit);
        assert_eq!(file.unwrap_err().kind(), ErrorKind::NotADirectory);

        let back_after: Vec<PathBuf> = panel.back_history().iter().map(|p| p.to_path_buf()).collect();
        assert_eq!(panel.current_path(), path_before);
        assert_eq!(back_after, back_before);
        assert!(panel.forward_history().is_empty());
        assert_eq!(panel.registry().generation(), generation);
    }

    #[test]
    fn test_same_path_is_cheap_noop() {
        let root = tree();
        let mut panel = open(root.path());
        let generation = panel.registry().generation();

        let outcome = panel.set_path(root.path(), NavigationCause::Explicit).unwrap();
        assert_eq!(outcome, NavigationOutcome::Unchanged);
        assert_eq!(panel.registry().generation(), generation);
        assert!(panel.back_history().is_empty());

        panel.set_path(root.path(), NavigationCause::Refresh).unwrap();
        assert_eq!(panel.registry().generation(), generation + 1);
        assert!(panel.back_history().is_empty());
    }

    #[test]
    fn test_navigate_up_primes_cursor_memory() {
        let root = tree();
        let a = root.path().join("a");
        let mut panel = open(&a);

        panel.navigate_up().unwrap();

        assert_eq!(panel.current_path(), root.path());
        assert_eq!(
            panel.current_item_for_folder(root.path()),
            Some(EntryHash::of_path(&a))
        );
        assert!(panel.registry().contains(EntryHash::of_path(&a)));
    }

    #[test]
    fn test_item_activation_classification() {
        let root = tree();
        let a = root.path().join("a");
        let panel = open(&a);

        let cd_up = panel.registry().by_index(0).unwrap();
        assert!(cd_up.is_cd_up());
        assert_eq!(
            panel.item_activated(cd_up.hash()).unwrap(),
            Activation::Navigate {
                path: Arc::new(root.path().to_path_buf()),
                cause: NavigationCause::CdUp,
            }
        );

        let inner = EntryHash::of_path(&a.join("inner"));
        assert!(matches!(
            panel.item_activated(inner).unwrap(),
            Activation::Navigate { cause: NavigationCause::Explicit, .. }
        ));

        let notes = EntryHash::of_path(&a.join("notes.txt"));
        assert!(matches!(
            panel.item_activated(notes).unwrap(),
            Activation::OpenWithDefault { .. }
        ));

        let stale = EntryHash::of_path(&root.path().join("b"));
        assert_eq!(panel.item_activated(stale).unwrap_err().kind(), ErrorKind::UnknownItem);
    }

    #[test]
    fn test_refresh_keeps_hashes_and_updates_data() {
        let root = tree();
        let a = root.path().join("a");
        let mut panel = open(&a);
        let notes = EntryHash::of_path(&a.join("notes.txt"));
        assert_eq!(panel.registry().get(notes).unwrap().size(), Some(5));

        fs::write(a.join("notes.txt"), "hello world").unwrap();
        panel.refresh_file_list(NavigationCause::Refresh).unwrap();

        assert_eq!(panel.registry().get(notes).unwrap().size(), Some(11));
        assert!(panel.back_history().is_empty());
    }

    #[test]
    fn test_history_limit_drops_oldest() {
        let root = tree();
        let options = PanelOptions {
            history_limit: 2,
            ..PanelOptions::default()
        };
        let mut panel = PanelState::open(Pane::Right, root.path(), options).unwrap();

        panel.set_path(&root.path().join("a"), NavigationCause::Explicit).unwrap();
        panel.set_path(&root.path().join("a/inner"), NavigationCause::Explicit).unwrap();
        panel.set_path(&root.path().join("b"), NavigationCause::Explicit).unwrap();

        let back: Vec<PathBuf> = panel.back_history().iter().map(|p| p.to_path_buf()).collect();
        assert_eq!(back, vec![root.path().join("a"), root.path().join("a/inner")]);
    }

    #[test]
    fn test_flat_view_and_return() {
        let root = tree();
        let mut panel = open(root.path());

        panel.show_all_files_recursively().unwrap();
        assert!(panel.is_flat_view());
        assert_eq!(panel.registry().len(), 1);
        assert_eq!(panel.registry().by_index(0).unwrap().name(), "notes.txt");

        panel.refresh_file_list(NavigationCause::Refresh).unwrap();
        assert!(!panel.is_flat_view());
        assert!(panel.registry().contains(EntryHash::of_path(&root.path().join("b"))));
    }

    #[test]
    fn test_directory_size_applies_only_to_live_entries() {
        let root = tree();
        let a = root.path().join("a");
        let mut panel = open(root.path());
        let hash = EntryHash::of_path(&a);

        let path = panel.begin_directory_size(hash).unwrap();
        assert_eq!(*path, a);
        assert_eq!(
            panel.registry().get(hash).unwrap().size_state(),
            crate::fs::entry::SizeState::InProgress
        );

        assert!(panel.apply_directory_size(hash, Some(5)));
        assert_eq!(panel.registry().get(hash).unwrap().size(), Some(5));

        panel.set_path(&root.path().join("b"), NavigationCause::Explicit).unwrap();
        assert!(!panel.apply_directory_size(hash, Some(7)));
    }

    struct RecordingListener(Rc<RefCell<Vec<(Pane, usize)>>>);

    impl PanelContentsListener for RecordingListener {
        fn contents_changed(&mut self, pane: Pane, registry: &EntryRegistry) {
            self.0.borrow_mut().push((pane, registry.len()));
        }
    }

    #[test]
    fn test_listeners_receive_rebuilds() {
        let root = tree();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut panel = open(root.path());
        let id = panel.add_contents_listener(Box::new(RecordingListener(seen.clone())));

        panel.set_path(&root.path().join("a"), NavigationCause::Explicit).unwrap();
        // "..", "inner", "notes.txt"
        assert_eq!(*seen.borrow(), vec![(Pane::Left, 3)]);

        let _ = panel.set_path(&root.path().join("missing"), NavigationCause::Explicit);
        assert_eq!(seen.borrow().len(), 1);

        assert!(panel.remove_contents_listener(id));
        panel.refresh_file_list(NavigationCause::Refresh).unwrap();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_vanished_directory_moves_to_ancestor() {
        let root = tree();
        let gone = root.path().join("b");
        let mut panel = open(&gone);

        fs::remove_dir(&gone).unwrap();
        panel.volumes_changed(&[]);

        assert_eq!(panel.current_path(), root.path());
    }
}
