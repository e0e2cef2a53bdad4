//! src/main.rs
//! `commander`: list both panes and the mounted volumes from the command line.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use commander_core::{
    Config, Controller, Pane, TomlSettings,
    fs::{EntryHash, EntryKind, FilesystemEntry, SizeState},
    logging::{LogTarget, LoggerBuilder},
};

#[derive(Parser, Debug)]
#[command(name = "commander")]
#[command(about = "Two-pane file browsing engine")]
struct Args {
    /// Directory for the left pane; the remembered one when omitted.
    #[arg(long)]
    left: Option<PathBuf>,

    /// Directory for the right pane; the remembered one when omitted.
    #[arg(long)]
    right: Option<PathBuf>,

    /// Compute directory sizes on the worker pool before printing.
    #[arg(long, default_value_t = false)]
    sizes: bool,

    /// Seconds to wait for background sizes.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Write human-readable logs to stderr instead of the JSONL file.
    #[arg(long, default_value_t = false)]
    stderr_log: bool,

    #[arg(long, default_value_t = false)]
    show_hidden: bool,

    /// Overrides the configured log level (`RUST_LOG` syntax).
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args: Args = Args::parse();

    let mut config: Config = Config::load().context("Failed to load configuration")?;
    config.show_hidden |= args.show_hidden;

    let _guard: WorkerGuard = init_logging(&config, &args)?;

    let mut builder = Controller::builder()
        .config(config)
        .settings(Box::new(TomlSettings::open_default()?));
    if let Some(left) = &args.left {
        builder = builder.start_path(Pane::Left, left);
    }
    if let Some(right) = &args.right {
        builder = builder.start_path(Pane::Right, right);
    }

    let mut controller: Controller = builder.build().context("Failed to open panes")?;

    if args.sizes {
        request_directory_sizes(&mut controller);
        if !controller.wait_for_background_work(Duration::from_secs(args.timeout)) {
            warn!(timeout_secs = args.timeout, "Not every directory size arrived in time");
        }
    }

    for pane in [Pane::Left, Pane::Right] {
        print_pane(&controller, pane);
    }
    print_volumes(&controller);

    info!("commander exited cleanly");
    Ok(())
}

fn init_logging(config: &Config, args: &Args) -> Result<WorkerGuard> {
    let target: LogTarget = if args.stderr_log {
        LogTarget::Stderr
    } else {
        LogTarget::JsonFile
    };

    let mut builder: LoggerBuilder = LoggerBuilder::new()
        .with_config(config.logging.clone())
        .with_target(target);
    if let Some(level) = &args.log_level {
        builder = builder.with_level(level);
    }

    builder.build().context("Failed to initialize logging")
}

fn request_directory_sizes(controller: &mut Controller) {
    for pane in [Pane::Left, Pane::Right] {
        let dirs: Vec<EntryHash> = controller
            .panel(pane)
            .registry()
            .iter()
            .filter(|e: &&FilesystemEntry| e.kind() == EntryKind::Directory)
            .map(FilesystemEntry::hash)
            .collect();

        for hash in dirs {
            if let Err(e) = controller.display_dir_size(pane, hash) {
                warn!(pane = %pane, hash = %hash, error = %e, "Size request rejected");
            }
        }
    }
}

fn print_pane(controller: &Controller, pane: Pane) {
    let panel = controller.panel(pane);
    let volume: String = controller
        .current_disk_index(pane)
        .and_then(|idx: usize| controller.disk_path(idx))
        .map_or_else(|| "unknown volume".to_owned(), |p| p.display().to_string());

    println!("[{pane}] {} ({volume})", panel.current_path().display());

    for entry in panel.registry().iter() {
        let size: String = match (entry.kind(), entry.size_state()) {
            (EntryKind::SymlinkCdUp, _) => String::new(),
            (EntryKind::Directory, SizeState::NotStarted) => "<DIR>".to_owned(),
            (EntryKind::Directory, SizeState::InProgress) => "...".to_owned(),
            (EntryKind::Directory, SizeState::Done) if entry.size().is_none() => "?".to_owned(),
            _ => entry.size_human(),
        };

        println!(
            "  {:<40} {:>12}  {}",
            entry.name(),
            size,
            entry.format_date("%Y-%m-%d %H:%M")
        );
    }

    println!();
}

fn print_volumes(controller: &Controller) {
    println!("Volumes:");
    for (idx, volume) in controller.volumes().iter().enumerate() {
        let info = volume.info();
        println!(
            "  {idx}: {:<30} {:<12} {:<8} {}{}",
            volume.root_path().display(),
            info.name,
            info.file_system,
            info.space_summary(),
            if info.is_removable { " (removable)" } else { "" }
        );
    }
}
