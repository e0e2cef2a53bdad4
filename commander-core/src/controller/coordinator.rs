//! ``src/controller/coordinator.rs``
//! ============================================================================
//! # `Controller`: Two-Pane Façade
//!
//! Owns both panes, the volume enumerator, the task queue and the worker
//! pool. Every command names its pane explicitly. All state is mutated on
//! the thread that owns the controller; background results reach it only
//! through [`Controller::pump_tasks`] / [`Controller::tick`].

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::RandomState;
use enum_map::EnumMap;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::controller::builder::ControllerBuilder;
use crate::error::{CoreError, CoreResult};
use crate::fs::entry::{EntryHash, FilesystemEntry, normalize_path};
use crate::fs::launcher::{FileLauncher, SystemTerminal, TerminalLauncher};
use crate::fs::statistics::{self, FilesystemObjectsStatistics};
use crate::model::favorites::FavoriteLocations;
use crate::model::observers::{ObserverRegistry, SubscriptionId};
use crate::model::pane::Pane;
use crate::model::panel_state::{
    Activation, NavigationCause, NavigationOutcome, PanelContentsListener, PanelState,
};
use crate::settings::{SettingsStore, last_path_for_drive_key, panel_path_key};
use crate::tasks::task_queue::{DrainMode, TaskQueue};
use crate::tasks::worker_pool::WorkerPool;
use crate::volumes::enumerator::{ScanOutcome, Volume, VolumeEnumerator, volume_index_for_path};

/// Informed after both panes have taken the new volume list.
pub trait DiskListObserver {
    /// `current_volume` is the index of the volume holding `pane`'s
    /// directory, if any.
    fn disks_changed(&mut self, volumes: &[Volume], pane: Pane, current_volume: Option<usize>);
}

impl<F> DiskListObserver for F
where
    F: FnMut(&[Volume], Pane, Option<usize>),
{
    fn disks_changed(&mut self, volumes: &[Volume], pane: Pane, current_volume: Option<usize>) {
        self(volumes, pane, current_volume);
    }
}

pub struct Controller {
    pub(crate) panels: EnumMap<Pane, PanelState>,
    pub(crate) active: Pane,
    pub(crate) volumes: VolumeEnumerator,
    pub(crate) queue: Arc<TaskQueue<Controller>>,
    pub(crate) workers: WorkerPool<Controller>,
    pub(crate) settings: Box<dyn SettingsStore>,
    pub(crate) launcher: Box<dyn FileLauncher>,
    pub(crate) terminal: Box<dyn TerminalLauncher>,
    pub(crate) favorites: FavoriteLocations,
    pub(crate) disk_observers: ObserverRegistry<dyn DiskListObserver>,

    /// One-shot selection hints for freshly created items, keyed by folder.
    pub(crate) cursor_to_restore: HashMap<PathBuf, EntryHash, RandomState>,

    pub(crate) config: Config,
}

impl Controller {
    #[must_use]
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::new()
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Deliver finished background work and rescan volumes when due.
    pub fn tick(&mut self) -> usize {
        let executed: usize = self.pump_tasks();

        let interval: Duration = self.config.volume_poll_interval;
        if self.volumes.rescan_if_due(interval) == ScanOutcome::Changed {
            self.disks_changed();
        }

        executed
    }

    /// Run queued deliveries on this thread.
    pub fn pump_tasks(&mut self) -> usize {
        let queue: Arc<TaskQueue<Self>> = Arc::clone(&self.queue);
        let mode: DrainMode = self.config.drain_mode;
        queue.pump(self, mode)
    }

    /// Background jobs still running or waiting for delivery.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.workers.stats().in_flight() > 0 || !self.queue.is_empty()
    }

    /// Tick until no background work remains or `timeout` passes.
    /// Returns `true` when everything was delivered.
    pub fn wait_for_background_work(&mut self, timeout: Duration) -> bool {
        let deadline: Instant = Instant::now() + timeout;

        loop {
            self.tick();
            if !self.has_pending_work() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    // ------------------------------------------------------------------
    // Volumes
    // ------------------------------------------------------------------

    /// Rescan now, broadcasting if the list changed.
    pub fn rescan_volumes(&mut self) -> ScanOutcome {
        let outcome: ScanOutcome = self.volumes.rescan();
        if outcome == ScanOutcome::Changed {
            self.disks_changed();
        }
        outcome
    }

    /// Panes first, then external observers.
    fn disks_changed(&mut self) {
        let volumes: Vec<Volume> = self.volumes.volumes().to_vec();

        for pane in [Pane::Right, Pane::Left] {
            self.panels[pane].volumes_changed(&volumes);
            self.remember_location(pane);
        }

        for pane in [Pane::Right, Pane::Left] {
            self.notify_disk_observers(pane);
        }
    }

    /// Tell every observer which volume `pane` sits on.
    fn notify_disk_observers(&mut self, pane: Pane) {
        let current: Option<usize> = self.current_disk_index(pane);
        let volumes: &[Volume] = self.volumes.volumes();
        self.disk_observers
            .notify(|observer| observer.disks_changed(volumes, pane, current));
    }

    /// The new observer is told the current list and each pane's volume
    /// right away.
    pub fn subscribe_disk_list(&mut self, observer: Box<dyn DiskListObserver>) -> SubscriptionId {
        let id: SubscriptionId = self.disk_observers.subscribe(observer);

        for pane in [Pane::Right, Pane::Left] {
            let current: Option<usize> = self.current_disk_index(pane);
            let volumes: &[Volume] = self.volumes.volumes();
            self.disk_observers
                .notify_one(id, |observer| observer.disks_changed(volumes, pane, current));
        }

        id
    }

    pub fn unsubscribe_disk_list(&mut self, id: SubscriptionId) -> bool {
        self.disk_observers.unsubscribe(id).is_some()
    }

    #[must_use]
    pub fn volumes(&self) -> &[Volume] {
        self.volumes.volumes()
    }

    #[must_use]
    pub fn disk_path(&self, index: usize) -> Option<&Path> {
        self.volumes.volumes().get(index).map(Volume::root_path)
    }

    /// Index of the volume holding `pane`'s directory.
    #[must_use]
    pub fn current_disk_index(&self, pane: Pane) -> Option<usize> {
        volume_index_for_path(self.volumes.volumes(), self.panels[pane].current_path())
    }

    /// Point `pane` at volume `index`.
    ///
    /// Mirrors the other pane when it already sits on that volume; otherwise
    /// returns to the path last visited there, or the volume root.
    pub fn switch_to_disk(&mut self, pane: Pane, index: usize) -> CoreResult<NavigationOutcome> {
        let volumes: &[Volume] = self.volumes.volumes();
        let root: PathBuf = volumes
            .get(index)
            .ok_or(CoreError::IndexOutOfRange {
                index,
                len: volumes.len(),
            })?
            .root_path()
            .to_path_buf();

        let other: Pane = pane.other();
        if self.current_disk_index(other) == Some(index) {
            let mirrored: PathBuf = self.panels[other].current_path().to_path_buf();
            info!(
                marker = "CONTROLLER",
                operation_type = "switch_to_disk",
                pane = %pane,
                path = %mirrored.display(),
                "Mirroring other pane"
            );
            return self.set_path(pane, &mirrored, NavigationCause::Other);
        }

        let remembered: Option<PathBuf> = self
            .settings
            .value(&last_path_for_drive_key(pane, &root))
            .map(PathBuf::from)
            .filter(|p: &PathBuf| p.starts_with(&root));

        if let Some(path) = remembered {
            match self.set_path(pane, &path, NavigationCause::Other) {
                Ok(outcome) => return Ok(outcome),
                Err(e) => warn!(
                    marker = "CONTROLLER",
                    operation_type = "switch_to_disk",
                    pane = %pane,
                    path = %path.display(),
                    error = %e,
                    "Remembered path unusable, using volume root"
                ),
            }
        }

        self.set_path(pane, &root, NavigationCause::Other)
    }

    /// Persist `pane`'s path as the last one visited on its volume.
    pub fn save_directory_for_current_disk(&mut self, pane: Pane) {
        let Some(index) = self.current_disk_index(pane) else {
            return;
        };

        let root: PathBuf = self.volumes.volumes()[index].root_path().to_path_buf();
        let path: PathBuf = self.panels[pane].current_path().to_path_buf();
        self.store_setting(&last_path_for_drive_key(pane, &root), &path);
    }

    pub(crate) fn remember_location(&mut self, pane: Pane) {
        self.save_directory_for_current_disk(pane);

        let path: PathBuf = self.panels[pane].current_path().to_path_buf();
        self.store_setting(&panel_path_key(pane), &path);
    }

    fn store_setting(&mut self, key: &str, path: &Path) {
        if let Err(e) = self.settings.set_value(key, &path.to_string_lossy()) {
            warn!(key, error = %e, "Failed to persist setting");
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn set_path(
        &mut self,
        pane: Pane,
        path: &Path,
        cause: NavigationCause,
    ) -> CoreResult<NavigationOutcome> {
        self.navigate(pane, |panel: &mut PanelState| panel.set_path(path, cause))
    }

    pub fn navigate_up(&mut self, pane: Pane) -> CoreResult<NavigationOutcome> {
        self.navigate(pane, PanelState::navigate_up)
    }

    pub fn navigate_back(&mut self, pane: Pane) -> CoreResult<NavigationOutcome> {
        self.navigate(pane, PanelState::navigate_back)
    }

    pub fn navigate_forward(&mut self, pane: Pane) -> CoreResult<NavigationOutcome> {
        self.navigate(pane, PanelState::navigate_forward)
    }

    pub fn refresh_panel_contents(&mut self, pane: Pane) -> CoreResult<()> {
        self.panels[pane].refresh_file_list(NavigationCause::Refresh)
    }

    /// Run one navigation step on `pane`. A successful move is remembered,
    /// and disk observers hear about it when it crossed volumes.
    fn navigate(
        &mut self,
        pane: Pane,
        step: impl FnOnce(&mut PanelState) -> CoreResult<NavigationOutcome>,
    ) -> CoreResult<NavigationOutcome> {
        let volume_before: Option<usize> = self.current_disk_index(pane);
        let result: CoreResult<NavigationOutcome> = step(&mut self.panels[pane]);

        if let Ok(NavigationOutcome::Changed) = result {
            self.remember_location(pane);
            if self.current_disk_index(pane) != volume_before {
                self.notify_disk_observers(pane);
            }
        }

        result
    }

    /// Navigate into a directory, or launch / open a file.
    pub fn item_activated(&mut self, pane: Pane, hash: EntryHash) -> CoreResult<()> {
        let activation: Activation = self.panels[pane].item_activated(hash)?;

        match activation {
            Activation::Navigate { path, cause } => self.set_path(pane, &path, cause).map(|_| ()),
            Activation::Launch { path, working_dir } => self.launcher.launch(&path, &working_dir),
            Activation::OpenWithDefault { path } => self.launcher.open_with_default(&path),
        }
    }

    /// Replace `pane`'s listing with every file below its directory.
    pub fn show_all_files_from_current_folder_and_below(&mut self, pane: Pane) -> CoreResult<()> {
        self.panels[pane].show_all_files_recursively()
    }

    // ------------------------------------------------------------------
    // Focus and cursor memory
    // ------------------------------------------------------------------

    pub fn active_panel_changed(&mut self, pane: Pane) {
        if self.active != pane {
            debug!(marker = "CONTROLLER", operation_type = "active_panel", pane = %pane, "Active pane changed");
        }
        self.active = pane;
    }

    #[must_use]
    pub const fn active_panel(&self) -> Pane {
        self.active
    }

    #[must_use]
    pub const fn other_panel(&self) -> Pane {
        self.active.other()
    }

    /// Remember `hash` as the selection in the active pane's folder.
    pub fn set_cursor_position_for_current_folder(&mut self, hash: EntryHash) {
        let pane: Pane = self.active;
        let folder: PathBuf = self.panels[pane].current_path().to_path_buf();

        self.panels[pane].set_current_item_for_folder(&folder, hash);
        self.cursor_to_restore.insert(folder, hash);
    }

    /// Item last selected in `dir` on `pane`.
    #[must_use]
    pub fn current_item_in_folder(&self, pane: Pane, dir: &Path) -> Option<EntryHash> {
        self.panels[pane].current_item_for_folder(dir)
    }

    /// Consume the selection hint left for `dir` by a create operation.
    pub fn take_cursor_to_restore(&mut self, dir: &Path) -> Option<EntryHash> {
        self.cursor_to_restore.remove(&normalize_path(dir))
    }

    // ------------------------------------------------------------------
    // Creation and OS collaborators
    // ------------------------------------------------------------------

    /// Create `name` (may contain several components) under `parent`.
    pub fn create_folder(&mut self, parent: &Path, name: &str) -> bool {
        let parent: PathBuf = normalize_path(parent);
        let Some(target) = creation_target(&parent, name) else {
            return false;
        };

        if target.exists() {
            debug!(path = %target.display(), "Folder already exists");
            return false;
        }

        if let Err(e) = fs::create_dir_all(&target) {
            warn!(
                marker = "CONTROLLER",
                operation_type = "create_folder",
                path = %target.display(),
                error = %e,
                "Failed to create folder"
            );
            return false;
        }

        self.after_creation(&parent, name);
        true
    }

    /// Create an empty file; fails if it exists or `parent` is missing.
    pub fn create_file(&mut self, parent: &Path, name: &str) -> bool {
        let parent: PathBuf = normalize_path(parent);
        let Some(target) = creation_target(&parent, name) else {
            return false;
        };

        if let Err(e) = OpenOptions::new().write(true).create_new(true).open(&target) {
            warn!(
                marker = "CONTROLLER",
                operation_type = "create_file",
                path = %target.display(),
                error = %e,
                "Failed to create file"
            );
            return false;
        }

        self.after_creation(&parent, name);
        true
    }

    /// Refresh panes showing `parent`; leave a cursor hint on the first new
    /// component when `parent` is the active pane's folder.
    fn after_creation(&mut self, parent: &Path, name: &str) {
        for pane in [Pane::Left, Pane::Right] {
            if self.panels[pane].current_path() == parent
                && let Err(e) = self.refresh_panel_contents(pane)
            {
                warn!(pane = %pane, error = %e, "Refresh after creation failed");
            }
        }

        let first_component: Option<&std::ffi::OsStr> =
            Path::new(name).components().find_map(|c: Component<'_>| match c {
                Component::Normal(part) => Some(part),
                _ => None,
            });

        if self.panels[self.active].current_path() == parent
            && let Some(first) = first_component
        {
            self.set_cursor_position_for_current_folder(EntryHash::of_path(&parent.join(first)));
        }

        info!(
            marker = "CONTROLLER",
            operation_type = "create",
            parent = %parent.display(),
            name,
            "Created filesystem object"
        );
    }

    pub fn open_terminal(&mut self, folder: &Path) -> CoreResult<()> {
        self.terminal.open_terminal(folder)
    }

    // ------------------------------------------------------------------
    // Background work
    // ------------------------------------------------------------------

    /// Count files, folders and bytes under the selected entries on the
    /// worker pool; `deliver` runs on this thread at a later pump.
    pub fn calculate_statistics<F>(
        &mut self,
        pane: Pane,
        hashes: &[EntryHash],
        deliver: F,
    ) -> CoreResult<()>
    where
        F: FnOnce(&mut Self, FilesystemObjectsStatistics) + Send + 'static,
    {
        let registry = self.panels[pane].registry();
        let mut paths: Vec<PathBuf> = Vec::with_capacity(hashes.len());
        for hash in hashes {
            let entry: &FilesystemEntry = registry.get(*hash)?;
            if !entry.is_cd_up() {
                paths.push(entry.path().to_path_buf());
            }
        }

        debug!(
            marker = "CONTROLLER",
            operation_type = "statistics_submit",
            pane = %pane,
            items = paths.len(),
            "Submitting statistics"
        );

        self.workers.submit(
            "statistics",
            move || statistics::calculate_statistics(&paths),
            deliver,
        )
    }

    /// Compute a listed directory's total size in the background.
    ///
    /// The result is applied only if the directory is still part of the
    /// pane's listing at delivery time.
    pub fn display_dir_size(&mut self, pane: Pane, hash: EntryHash) -> CoreResult<()> {
        let path: Arc<PathBuf> = self.panels[pane].begin_directory_size(hash)?;

        let submitted: CoreResult<()> = self.workers.submit(
            "directory_size",
            move || statistics::directory_size(&path),
            move |controller: &mut Self, size: Option<u64>| {
                if !controller.panels[pane].apply_directory_size(hash, size) {
                    debug!(
                        marker = "CONTROLLER",
                        operation_type = "size_discarded",
                        pane = %pane,
                        hash = %hash,
                        "Directory left the listing, size discarded"
                    );
                }
            },
        );

        if submitted.is_err() {
            self.panels[pane].apply_directory_size(hash, None);
        }
        submitted
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Apply a new configuration; panes re-list if visibility changed.
    pub fn settings_changed(&mut self, config: Config) {
        let relist: bool = config.show_hidden != self.config.show_hidden;

        if config.terminal_cmd != self.config.terminal_cmd {
            self.terminal = Box::new(SystemTerminal::new(config.terminal_cmd.clone()));
        }
        if config.worker_threads != self.config.worker_threads {
            debug!(
                requested = config.worker_threads,
                running = self.workers.thread_count(),
                "Worker count applies on next start"
            );
        }

        for pane in [Pane::Left, Pane::Right] {
            self.panels[pane].set_show_hidden(config.show_hidden);
            if relist && let Err(e) = self.refresh_panel_contents(pane) {
                warn!(pane = %pane, error = %e, "Refresh after settings change failed");
            }
        }

        self.config = config;
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn panel(&self, pane: Pane) -> &PanelState {
        &self.panels[pane]
    }

    pub fn add_panel_contents_listener(
        &mut self,
        pane: Pane,
        listener: Box<dyn PanelContentsListener>,
    ) -> SubscriptionId {
        self.panels[pane].add_contents_listener(listener)
    }

    pub fn remove_panel_contents_listener(&mut self, pane: Pane, id: SubscriptionId) -> bool {
        self.panels[pane].remove_contents_listener(id)
    }

    #[must_use]
    pub fn item_hash_exists(&self, pane: Pane, hash: EntryHash) -> bool {
        self.panels[pane].registry().contains(hash)
    }

    pub fn item_by_hash(&self, pane: Pane, hash: EntryHash) -> CoreResult<&FilesystemEntry> {
        self.panels[pane].registry().get(hash)
    }

    pub fn item_by_index(&self, pane: Pane, index: usize) -> CoreResult<&FilesystemEntry> {
        self.panels[pane].registry().by_index(index)
    }

    /// Entries for `hashes` that are still listed, in the given order.
    #[must_use]
    pub fn items(&self, pane: Pane, hashes: &[EntryHash]) -> Vec<&FilesystemEntry> {
        let registry = self.panels[pane].registry();
        hashes.iter().filter_map(|h: &EntryHash| registry.get(*h).ok()).collect()
    }

    #[must_use]
    pub fn num_items(&self, pane: Pane) -> usize {
        self.panels[pane].registry().len()
    }

    pub fn item_path(&self, pane: Pane, hash: EntryHash) -> CoreResult<&Path> {
        self.item_by_hash(pane, hash).map(FilesystemEntry::path)
    }

    #[must_use]
    pub const fn favorites(&self) -> &FavoriteLocations {
        &self.favorites
    }

    pub const fn favorites_mut(&mut self) -> &mut FavoriteLocations {
        &mut self.favorites
    }

    #[must_use]
    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("left", &self.panels[Pane::Left].current_path())
            .field("right", &self.panels[Pane::Right].current_path())
            .field("active", &self.active)
            .field("volumes", &self.volumes.volumes().len())
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

/// `parent/name`, or `None` for names that would escape `parent`.
fn creation_target(parent: &Path, name: &str) -> Option<PathBuf> {
    let name: String = name.replace('\\', "/");
    let relative: &Path = Path::new(&name);

    let valid: bool = !name.is_empty()
        && relative
            .components()
            .all(|c: Component<'_>| matches!(c, Component::Normal(_) | Component::CurDir));

    if !valid || !parent.is_dir() {
        return None;
    }

    Some(parent.join(relative))
}
