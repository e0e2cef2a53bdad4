//! ``src/controller/builder.rs``
//!
//! Explicit construction of a [`Controller`] and its collaborators. Every
//! collaborator has a production default, so tests swap in only what they
//! need.

use std::collections::HashMap;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};
use std::sync::Arc;

use ahash::RandomState;
use directories::BaseDirs;
use enum_map::EnumMap;
use tracing::{info, warn};

use crate::config::Config;
use crate::controller::coordinator::Controller;
use crate::error::{CoreError, CoreResult};
use crate::fs::entry::normalize_path;
use crate::fs::launcher::{FileLauncher, SystemLauncher, SystemTerminal, TerminalLauncher};
use crate::model::favorites::FavoriteLocations;
use crate::model::observers::ObserverRegistry;
use crate::model::pane::Pane;
use crate::model::panel_state::{PanelOptions, PanelState};
use crate::settings::{MemorySettings, SettingsStore, panel_path_key};
use crate::tasks::task_queue::TaskQueue;
use crate::tasks::worker_pool::WorkerPool;
use crate::volumes::enumerator::{SysinfoVolumes, Volume, VolumeEnumerator, VolumeSource};

#[derive(Default)]
pub struct ControllerBuilder {
    config: Config,
    volume_source: Option<Box<dyn VolumeSource>>,
    settings: Option<Box<dyn SettingsStore>>,
    launcher: Option<Box<dyn FileLauncher>>,
    terminal: Option<Box<dyn TerminalLauncher>>,
    favorites: FavoriteLocations,
    start_paths: EnumMap<Pane, Option<PathBuf>>,
}

impl ControllerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn volume_source(mut self, source: Box<dyn VolumeSource>) -> Self {
        self.volume_source = Some(source);
        self
    }

    /// Defaults to an in-memory store.
    #[must_use]
    pub fn settings(mut self, settings: Box<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    #[must_use]
    pub fn launcher(mut self, launcher: Box<dyn FileLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    #[must_use]
    pub fn terminal(mut self, terminal: Box<dyn TerminalLauncher>) -> Self {
        self.terminal = Some(terminal);
        self
    }

    #[must_use]
    pub fn favorites(mut self, favorites: FavoriteLocations) -> Self {
        self.favorites = favorites;
        self
    }

    /// Directory `pane` opens in, taking precedence over the remembered one.
    #[must_use]
    pub fn start_path(mut self, pane: Pane, path: impl Into<PathBuf>) -> Self {
        self.start_paths[pane] = Some(path.into());
        self
    }

    pub fn build(self) -> CoreResult<Controller> {
        let Self {
            config,
            volume_source,
            settings,
            launcher,
            terminal,
            favorites,
            start_paths,
        } = self;

        let mut volumes: VolumeEnumerator =
            VolumeEnumerator::new(volume_source.unwrap_or_else(|| Box::new(SysinfoVolumes)));
        volumes.update_synchronously();

        let settings: Box<dyn SettingsStore> =
            settings.unwrap_or_else(|| Box::new(MemorySettings::new()));

        let queue: Arc<TaskQueue<Controller>> = Arc::new(TaskQueue::new());
        let workers: WorkerPool<Controller> =
            WorkerPool::new(config.worker_threads, Arc::clone(&queue))?;

        let options: PanelOptions = config.panel_options();
        let left: PanelState = open_first_accessible(
            Pane::Left,
            &restore_candidates(Pane::Left, start_paths[Pane::Left].as_deref(), settings.as_ref(), volumes.volumes()),
            options,
        )?;
        let right: PanelState = open_first_accessible(
            Pane::Right,
            &restore_candidates(Pane::Right, start_paths[Pane::Right].as_deref(), settings.as_ref(), volumes.volumes()),
            options,
        )?;

        let mut panels: EnumMap<Pane, PanelState> = EnumMap::from_array([left, right]);
        for (_, panel) in &mut panels {
            panel.volumes_changed(volumes.volumes());
        }

        info!(
            marker = "CONTROLLER",
            operation_type = "controller_build",
            left = %panels[Pane::Left].current_path().display(),
            right = %panels[Pane::Right].current_path().display(),
            volumes = volumes.volumes().len(),
            workers = workers.thread_count(),
            "Controller ready"
        );

        let terminal: Box<dyn TerminalLauncher> = terminal
            .unwrap_or_else(|| Box::new(SystemTerminal::new(config.terminal_cmd.clone())));

        let mut controller: Controller = Controller {
            panels,
            active: Pane::Left,
            volumes,
            queue,
            workers,
            settings,
            launcher: launcher.unwrap_or_else(|| Box::new(SystemLauncher)),
            terminal,
            favorites,
            disk_observers: ObserverRegistry::new(),
            cursor_to_restore: HashMap::with_hasher(RandomState::new()),
            config,
        };

        for pane in [Pane::Left, Pane::Right] {
            controller.remember_location(pane);
        }

        Ok(controller)
    }
}

/// Start directories to try for `pane`, most specific first.
fn restore_candidates(
    pane: Pane,
    start_path: Option<&Path>,
    settings: &dyn SettingsStore,
    volumes: &[Volume],
) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    candidates.extend(start_path.map(Path::to_path_buf));
    candidates.extend(settings.value(&panel_path_key(pane)).map(PathBuf::from));
    candidates.extend(BaseDirs::new().map(|dirs: BaseDirs| dirs.home_dir().to_path_buf()));
    candidates.extend(volumes.first().map(|v: &Volume| v.root_path().to_path_buf()));
    candidates.push(normalize_path(Path::new(MAIN_SEPARATOR_STR)));

    candidates
}

fn open_first_accessible(
    pane: Pane,
    candidates: &[PathBuf],
    options: PanelOptions,
) -> CoreResult<PanelState> {
    let mut last_error: Option<CoreError> = None;

    for candidate in candidates {
        match PanelState::open(pane, candidate, options) {
            Ok(panel) => return Ok(panel),
            Err(e) => {
                warn!(
                    marker = "CONTROLLER",
                    operation_type = "restore_skipped",
                    pane = %pane,
                    path = %candidate.display(),
                    error = %e,
                    "Start directory not usable, trying next"
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| CoreError::Other(format!("no start directory for {pane} pane"))))
}
