//! ``src/fs/launcher.rs``
//!
//! OS collaborators for opening files and terminals. Both are traits so the
//! controller can be driven headless in tests; the `System*` types are the
//! real implementations. Success means the OS accepted the request, not that
//! the launched program succeeded.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};

/// Launches executables and hands everything else to the default handler.
pub trait FileLauncher {
    /// Start `path` as a process with `working_dir` as its current directory.
    fn launch(&mut self, path: &Path, working_dir: &Path) -> CoreResult<()>;

    /// Ask the OS to open `path` with the user's default application.
    fn open_with_default(&mut self, path: &Path) -> CoreResult<()>;
}

/// Opens a terminal window rooted at a directory.
pub trait TerminalLauncher {
    fn open_terminal(&mut self, folder: &Path) -> CoreResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl FileLauncher for SystemLauncher {
    fn launch(&mut self, path: &Path, working_dir: &Path) -> CoreResult<()> {
        info!(
            marker = "LAUNCH",
            operation_type = "launch_executable",
            path = %path.display(),
            "Launching executable"
        );

        spawn_detached(Command::new(path).current_dir(working_dir))
            .map(|_pid| ())
            .map_err(|e| CoreError::from_io(path, e))
    }

    fn open_with_default(&mut self, path: &Path) -> CoreResult<()> {
        info!(
            marker = "LAUNCH",
            operation_type = "open_with_default",
            path = %path.display(),
            "Opening with default handler"
        );

        spawn_detached(&mut default_handler_command(path))
            .map(|_pid| ())
            .map_err(|e| CoreError::not_supported("open_with_default", path, e.to_string()))
    }
}

#[cfg(target_os = "windows")]
fn default_handler_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(target_os = "macos")]
fn default_handler_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(all(unix, not(target_os = "macos")))]
fn default_handler_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

/// Start `cmd` without tying it to the caller. A reaper thread waits on the
/// child so it never lingers as a zombie. Returns the child's pid.
fn spawn_detached(cmd: &mut Command) -> std::io::Result<u32> {
    let mut child: Child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let pid: u32 = child.id();

    std::thread::Builder::new()
        .name(format!("commander-reaper-{pid}"))
        .spawn(move || match child.wait() {
            Ok(status) => debug!(marker = "LAUNCH", pid, %status, "Launched process exited"),
            Err(e) => warn!(marker = "LAUNCH", pid, error = %e, "Failed to reap launched process"),
        })?;

    Ok(pid)
}

/// Terminal launcher using one shell convention per platform.
///
/// `command` overrides the terminal program on Linux and Windows.
#[derive(Debug, Default, Clone)]
pub struct SystemTerminal {
    command: Option<String>,
}

impl SystemTerminal {
    #[must_use]
    pub const fn new(command: Option<String>) -> Self {
        Self { command }
    }

    fn program(&self) -> OsString {
        if let Some(cmd) = &self.command {
            return OsString::from(cmd);
        }

        if cfg!(target_os = "windows") {
            std::env::var_os("COMSPEC").unwrap_or_else(|| OsString::from("cmd.exe"))
        } else {
            std::env::var_os("TERMINAL").unwrap_or_else(|| OsString::from("x-terminal-emulator"))
        }
    }
}

impl TerminalLauncher for SystemTerminal {
    fn open_terminal(&mut self, folder: &Path) -> CoreResult<()> {
        let result: std::io::Result<u32> = if cfg!(target_os = "macos") && self.command.is_none() {
            let script: String = format!(
                "tell application \"Terminal\" to do script \"cd {}\"",
                folder.display()
            );
            spawn_detached(Command::new("osascript").args(["-e", &script]))
        } else {
            spawn_detached(Command::new(self.program()).current_dir(folder))
        };

        result.map(|_pid| ()).map_err(|e| {
            warn!(
                marker = "LAUNCH",
                operation_type = "open_terminal",
                folder = %folder.display(),
                error = %e,
                "Failed to open terminal"
            );
            CoreError::not_supported("open_terminal", folder, e.to_string())
        })
    }
}
