//! ``src/settings.rs``
//!
//! Flat key/value persistence for remembered paths.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::model::pane::Pane;

pub trait SettingsStore {
    fn value(&self, key: &str) -> Option<String>;

    fn set_value(&mut self, key: &str, value: &str) -> CoreResult<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    values: BTreeMap<String, String>,
}

impl MemorySettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsStore for MemorySettings {
    fn value(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: &str) -> CoreResult<()> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// A flat TOML table on disk, rewritten on every change.
#[derive(Debug)]
pub struct TomlSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl TomlSettings {
    /// Open `path`; a missing or unreadable file starts empty.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();

        let values: BTreeMap<String, String> = match fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring malformed settings file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };

        Self { path, values }
    }

    /// `settings.toml` next to the config file.
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::open(Config::config_dir()?.join("settings.toml")))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CoreError::from_io(parent, e))?;
        }

        let text: String =
            toml::to_string(&self.values).map_err(|e| CoreError::Other(e.to_string()))?;
        fs::write(&self.path, text).map_err(|e| CoreError::from_io(&self.path, e))
    }
}

impl SettingsStore for TomlSettings {
    fn value(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: &str) -> CoreResult<()> {
        if self.values.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }

        self.values.insert(key.to_owned(), value.to_owned());
        self.save()
    }
}

/// Percent-escape every byte outside `[A-Za-z0-9._-]`.
#[must_use]
pub fn escape_key_component(raw: &str) -> String {
    let mut out: String = String::with_capacity(raw.len());

    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }

    out
}

/// Inverse of [`escape_key_component`]. `None` on malformed input.
#[must_use]
pub fn unescape_key_component(escaped: &str) -> Option<String> {
    let bytes: &[u8] = escaped.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i: usize = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex: &str = escaped.get(i + 1..i + 3)?;
            if !hex.bytes().all(|b: u8| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}

/// Key remembering the last path a pane visited on a volume.
#[must_use]
pub fn last_path_for_drive_key(pane: Pane, volume_root: &Path) -> String {
    format!(
        "last_path_for_drive/{}/{}",
        pane.tag(),
        escape_key_component(&volume_root.to_string_lossy())
    )
}

/// Key remembering a pane's directory across sessions.
#[must_use]
pub fn panel_path_key(pane: Pane) -> String {
    format!("panel/{}/path", pane.tag())
}
