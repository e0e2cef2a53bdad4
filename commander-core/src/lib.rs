pub mod error;
pub use error::{CoreError, CoreResult, ErrorKind};

pub mod config;
pub use config::Config;

pub mod logging;

pub mod settings;
pub use settings::{MemorySettings, SettingsStore, TomlSettings};

pub mod fs {
    pub mod entry;
    pub use entry::{EntryHash, EntryKind, FilesystemEntry, SizeState};

    pub mod dir_scanner;

    pub mod statistics;
    pub use statistics::FilesystemObjectsStatistics;

    pub mod launcher;
    pub use launcher::{FileLauncher, SystemLauncher, SystemTerminal, TerminalLauncher};
}

pub mod model {
    pub mod entry_registry;
    pub use entry_registry::EntryRegistry;

    pub mod favorites;
    pub use favorites::{FavoriteLocation, FavoriteLocations};

    pub mod observers;
    pub use observers::{ObserverRegistry, SubscriptionId};

    pub mod pane;
    pub use pane::Pane;

    pub mod panel_state;
    pub use panel_state::{
        Activation, NavigationCause, NavigationOutcome, PanelContentsListener, PanelOptions,
        PanelState,
    };
}

pub mod tasks {
    pub mod task_queue;
    pub use task_queue::{DrainMode, TaskQueue};

    pub mod worker_pool;
    pub use worker_pool::{PoolStats, WorkerPool};
}

pub mod volumes {
    pub mod enumerator;
    pub use enumerator::{
        ScanOutcome, SysinfoVolumes, Volume, VolumeEnumerator, VolumeInfo, VolumeObserver,
        VolumeSource,
    };
}

pub mod controller {
    pub mod builder;
    pub use builder::ControllerBuilder;

    pub mod coordinator;
    pub use coordinator::{Controller, DiskListObserver};
}

pub use controller::{Controller, ControllerBuilder};
pub use model::Pane;
pub use volumes::Volume;
