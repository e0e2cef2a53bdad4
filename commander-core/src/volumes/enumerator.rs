//! ``src/volumes/enumerator.rs``
//! ============================================================================
//! # `VolumeEnumerator`: Mounted Volume Snapshot With Change Notification
//!
//! Each scan replaces the snapshot wholesale; observers always receive the
//! full list and are expected to replace their copy.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use serde::{Deserialize, Serialize};
use sysinfo::{Disk, Disks};
use tracing::{debug, info, warn};

use crate::error::CoreResult;
use crate::fs::entry::{FilesystemEntry, normalize_path};
use crate::model::observers::{ObserverRegistry, SubscriptionId};

/// Display information reported for one mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub root_path: PathBuf,
    pub name: String,
    pub file_system: String,
    pub total_space: u64,
    pub available_space: u64,
    pub is_removable: bool,
}

impl VolumeInfo {
    #[must_use]
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            name: String::new(),
            file_system: String::new(),
            total_space: 0,
            available_space: 0,
            is_removable: false,
        }
    }

    /// E.g. "12.3 GiB free of 100.0 GiB".
    #[must_use]
    pub fn space_summary(&self) -> String {
        format!(
            "{} free of {}",
            ByteSize(self.available_space),
            ByteSize(self.total_space)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Volume {
    info: VolumeInfo,
    root_entry: FilesystemEntry,
}

impl Volume {
    #[must_use]
    pub fn new(mut info: VolumeInfo) -> Self {
        info.root_path = normalize_path(&info.root_path);
        let root_entry: FilesystemEntry = FilesystemEntry::from_path(&info.root_path)
            .unwrap_or_else(|_| FilesystemEntry::directory_placeholder(&info.root_path));

        Self { info, root_entry }
    }

    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.info.root_path
    }

    #[must_use]
    pub const fn info(&self) -> &VolumeInfo {
        &self.info
    }

    #[must_use]
    pub const fn root_entry(&self) -> &FilesystemEntry {
        &self.root_entry
    }

    /// Whether `path` lies on this volume by component-wise prefix.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.info.root_path)
    }

    /// Identity used when diffing snapshots.
    fn same_identity(&self, other: &Self) -> bool {
        self.info.root_path == other.info.root_path && self.info.name == other.info.name
    }
}

/// Index of the volume containing `path`; the longest matching root wins.
#[must_use]
pub fn volume_index_for_path(volumes: &[Volume], path: &Path) -> Option<usize> {
    let path: PathBuf = normalize_path(path);

    volumes
        .iter()
        .enumerate()
        .filter(|(_, v): &(usize, &Volume)| v.contains(&path))
        .max_by_key(|(_, v): &(usize, &Volume)| v.root_path().components().count())
        .map(|(idx, _)| idx)
}

/// Where volume lists come from.
pub trait VolumeSource {
    fn scan(&mut self) -> CoreResult<Vec<VolumeInfo>>;
}

/// Mounts reported by the OS through `sysinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoVolumes;

impl VolumeSource for SysinfoVolumes {
    fn scan(&mut self) -> CoreResult<Vec<VolumeInfo>> {
        let disks: Disks = Disks::new_with_refreshed_list();

        Ok(disks
            .list()
            .iter()
            .map(|disk: &Disk| VolumeInfo {
                root_path: disk.mount_point().to_path_buf(),
                name: disk.name().to_string_lossy().into_owned(),
                file_system: disk.file_system().to_string_lossy().into_owned(),
                total_space: disk.total_space(),
                available_space: disk.available_space(),
                is_removable: disk.is_removable(),
            })
            .collect())
    }
}

/// Informed once per detected change with the complete new list.
pub trait VolumeObserver {
    fn volumes_changed(&mut self, volumes: &[Volume]);
}

impl<F> VolumeObserver for F
where
    F: FnMut(&[Volume]),
{
    fn volumes_changed(&mut self, volumes: &[Volume]) {
        self(volumes);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Changed,
    Unchanged,
}

pub struct VolumeEnumerator {
    source: Box<dyn VolumeSource>,
    volumes: Vec<Volume>,
    observers: ObserverRegistry<dyn VolumeObserver>,
    last_scan: Option<Instant>,
}

impl VolumeEnumerator {
    #[must_use]
    pub fn new(source: Box<dyn VolumeSource>) -> Self {
        Self {
            source,
            volumes: Vec::new(),
            observers: ObserverRegistry::new(),
            last_scan: None,
        }
    }

    #[must_use]
    pub fn with_system_source() -> Self {
        Self::new(Box::new(SysinfoVolumes))
    }

    #[must_use]
    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn subscribe(&mut self, observer: Box<dyn VolumeObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id).is_some()
    }

    /// Immediate scan and notification pass, used at startup.
    pub fn update_synchronously(&mut self) -> ScanOutcome {
        self.rescan()
    }

    /// Rescan only if `interval` has elapsed since the previous scan.
    pub fn rescan_if_due(&mut self, interval: Duration) -> ScanOutcome {
        match self.last_scan {
            Some(at) if at.elapsed() < interval => ScanOutcome::Unchanged,
            _ => self.rescan(),
        }
    }

    /// Scan, diff against the previous snapshot and notify on change.
    ///
    /// A failing or empty scan keeps the previous snapshot.
    pub fn rescan(&mut self) -> ScanOutcome {
        self.last_scan = Some(Instant::now());

        let scanned: Vec<VolumeInfo> = match self.source.scan() {
            Ok(scanned) => scanned,
            Err(e) => {
                warn!(
                    marker = "VOLUMES",
                    operation_type = "scan_failed",
                    error = %e,
                    "Volume scan failed, keeping previous snapshot"
                );
                return ScanOutcome::Unchanged;
            }
        };

        let fresh: Vec<Volume> = build_snapshot(scanned);
        if fresh.is_empty() && !self.volumes.is_empty() {
            warn!(
                marker = "VOLUMES",
                operation_type = "scan_empty",
                "Volume scan returned nothing, keeping previous snapshot"
            );
            return ScanOutcome::Unchanged;
        }

        let changed: bool = fresh.len() != self.volumes.len()
            || fresh
                .iter()
                .zip(&self.volumes)
                .any(|(a, b): (&Volume, &Volume)| !a.same_identity(b));

        if !changed {
            // Free-space figures drift constantly and are not a change
            self.volumes = fresh;
            debug!(marker = "VOLUMES", operation_type = "scan_unchanged", "Volume list unchanged");
            return ScanOutcome::Unchanged;
        }

        info!(
            marker = "VOLUMES",
            operation_type = "volumes_changed",
            previous = self.volumes.len(),
            current = fresh.len(),
            "Volume list changed"
        );

        self.volumes = fresh;
        let volumes: &[Volume] = &self.volumes;
        self.observers.notify(|observer| observer.volumes_changed(volumes));

        ScanOutcome::Changed
    }
}

impl std::fmt::Debug for VolumeEnumerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeEnumerator")
            .field("volumes", &self.volumes)
            .field("observers", &self.observers)
            .finish()
    }
}

/// Normalize, dedupe by root and sort.
fn build_snapshot(scanned: Vec<VolumeInfo>) -> Vec<Volume> {
    let mut volumes: Vec<Volume> = scanned.into_iter().map(Volume::new).collect();

    volumes.sort_by(|a: &Volume, b: &Volume| -> Ordering { a.root_path().cmp(b.root_path()) });
    volumes.dedup_by(|a: &mut Volume, b: &mut Volume| a.root_path() == b.root_path());

    volumes
}
