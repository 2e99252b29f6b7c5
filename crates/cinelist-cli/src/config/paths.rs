//! Config file location.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Application directory name under the user config root.
const APP_DIR: &str = "cinelist";

/// Resolves the config file path.
///
/// Lookup order:
/// 1. `{dir}/config.toml` when `--dir` is given.
/// 2. `$XDG_CONFIG_HOME/cinelist/config.toml` when set and non-empty.
/// 3. `$HOME/.config/cinelist/config.toml`.
///
/// # Errors
///
/// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is usable
/// (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    resolve_with(
        dir.map(PathBuf::as_path),
        std::env::var("XDG_CONFIG_HOME").ok().as_deref(),
        std::env::var("HOME").ok().as_deref(),
    )
}

fn resolve_with(dir: Option<&Path>, xdg: Option<&str>, home: Option<&str>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE));
    }
    if let Some(xdg) = xdg.filter(|v| !v.is_empty()) {
        return Ok(Path::new(xdg).join(APP_DIR).join(CONFIG_FILE));
    }
    match home.filter(|v| !v.is_empty()) {
        Some(home) => Ok(Path::new(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILE)),
        None => bail!("neither XDG_CONFIG_HOME nor HOME is set; pass --dir"),
    }
}
