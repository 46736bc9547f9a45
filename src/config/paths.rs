//! Config, state and data directory resolution
//!
//! Older releases kept everything under `~/.config/kittycad`. When the
//! resolved directory does not exist yet, the old location is moved into
//! place on a best-effort basis; failures are logged and otherwise ignored.

use super::defaults::{
    APP_DATA, CONFIG_DIR_ENV, CONFIG_FILE_NAME, HOSTS_FILE_NAME, LOCAL_APP_DATA, SHORTHAND_DIR,
    STATE_FILE_NAME, WINDOWS_DIR, XDG_CONFIG_HOME, XDG_DATA_HOME, XDG_STATE_HOME,
};
use super::env::Environment;
use crate::error::CliError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locations of the two config documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Main document (`config.yml`)
    pub config_file: PathBuf,
    /// Hosts document (`hosts.yml`)
    pub hosts_file: PathBuf,
}

impl ConfigPaths {
    /// Both documents inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            config_file: dir.join(CONFIG_FILE_NAME),
            hosts_file: dir.join(HOSTS_FILE_NAME),
        }
    }

    /// Documents in the resolved config directory
    pub fn from_env(env: &Environment) -> Self {
        Self::in_dir(config_dir(env))
    }
}

fn home(env: &Environment) -> PathBuf {
    env.home_dir().unwrap_or_default()
}

fn legacy_config_dir(env: &Environment) -> PathBuf {
    home(env).join(".config").join(SHORTHAND_DIR)
}

/// Directory holding `config.yml` and `hosts.yml`
///
/// `KITTYCAD_CONFIG_DIR`, then `$XDG_CONFIG_HOME/kittycad`, then
/// `%AppData%/KittyCAD CLI` on Windows, then `~/.config/kittycad`.
pub fn config_dir(env: &Environment) -> PathBuf {
    if let Some(dir) = env.get(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }

    let path = if let Some(xdg) = env.get(XDG_CONFIG_HOME) {
        Path::new(xdg).join(SHORTHAND_DIR)
    } else if let Some(app_data) = env.get(APP_DATA).filter(|_| cfg!(windows)) {
        Path::new(app_data).join(WINDOWS_DIR)
    } else {
        legacy_config_dir(env)
    };

    if !path.exists() {
        match migrate_dir(&legacy_config_dir(env), &path) {
            Ok(true) => debug!(to = %path.display(), "migrated config directory"),
            Ok(false) => {}
            Err(e) => debug!(error = %e, "config directory migration failed"),
        }
    }

    path
}

/// Directory holding `state.yml`
///
/// `$XDG_STATE_HOME/kittycad`, then `%LocalAppData%/KittyCAD CLI` on
/// Windows, then `~/.local/state/kittycad`.
pub fn state_dir(env: &Environment) -> PathBuf {
    let path = if let Some(xdg) = env.get(XDG_STATE_HOME) {
        Path::new(xdg).join(SHORTHAND_DIR)
    } else if let Some(local) = env.get(LOCAL_APP_DATA).filter(|_| cfg!(windows)) {
        Path::new(local).join(WINDOWS_DIR)
    } else {
        home(env).join(".local").join("state").join(SHORTHAND_DIR)
    };

    if !path.exists() {
        let legacy = legacy_config_dir(env).join(STATE_FILE_NAME);
        match migrate_file(&legacy, &path.join(STATE_FILE_NAME)) {
            Ok(true) => debug!(to = %path.display(), "migrated state file"),
            Ok(false) => {}
            Err(e) => debug!(error = %e, "state file migration failed"),
        }
    }

    path
}

/// Directory for larger data files
///
/// `$XDG_DATA_HOME/kittycad`, then `%LocalAppData%/KittyCAD CLI` on Windows,
/// then `~/.local/share/kittycad`.
pub fn data_dir(env: &Environment) -> PathBuf {
    if let Some(xdg) = env.get(XDG_DATA_HOME) {
        Path::new(xdg).join(SHORTHAND_DIR)
    } else if let Some(local) = env.get(LOCAL_APP_DATA).filter(|_| cfg!(windows)) {
        Path::new(local).join(WINDOWS_DIR)
    } else {
        home(env).join(".local").join("share").join(SHORTHAND_DIR)
    }
}

/// Path of `config.yml`
pub fn config_file(env: &Environment) -> PathBuf {
    config_dir(env).join(CONFIG_FILE_NAME)
}

/// Path of `hosts.yml`
pub fn hosts_config_file(env: &Environment) -> PathBuf {
    config_dir(env).join(HOSTS_FILE_NAME)
}

/// Path of `state.yml`
pub fn state_file(env: &Environment) -> PathBuf {
    state_dir(env).join(STATE_FILE_NAME)
}

/// Move the directory `old` to `new`; `Ok(false)` when there was nothing to do
fn migrate_dir(old: &Path, new: &Path) -> io::Result<bool> {
    if old == new || !old.is_dir() {
        return Ok(false);
    }
    if let Some(parent) = new.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(old, new)?;
    Ok(true)
}

/// Move the file `old` to `new`; `Ok(false)` when there was nothing to do
fn migrate_file(old: &Path, new: &Path) -> io::Result<bool> {
    if old == new || !old.is_file() {
        return Ok(false);
    }
    if let Some(parent) = new.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(old, new)?;
    Ok(true)
}

fn blocked_by_file(path: &Path, err: &io::Error) -> Option<CliError> {
    if err.kind() != io::ErrorKind::NotADirectory {
        return None;
    }
    let blocker = path.ancestors().find(|p| p.is_file())?;
    Some(CliError::DirError {
        path: blocker.to_path_buf(),
        reason: format!(
            "remove or rename regular file `{}` (must be a directory)",
            blocker.display()
        ),
    })
}

/// Error for a failed read of `path`
pub fn read_error(path: &Path, err: &io::Error) -> CliError {
    blocked_by_file(path, err).unwrap_or_else(|| CliError::ConfigRead {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Error for a failed creation of the directory `path`
pub fn dir_error(path: &Path, err: &io::Error) -> CliError {
    blocked_by_file(path, err).unwrap_or_else(|| CliError::DirError {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}
