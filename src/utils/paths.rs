//! Platform paths for persistent tool state.

use std::path::{Path, PathBuf};

/// Application directory name under the per-user configuration root.
const APP_DIR: &str = "mixkit";

/// Per-user configuration directory for the tools.
///
/// Resolution order: `$XDG_CONFIG_HOME`, then `$HOME/.config`, then
/// `%APPDATA%`. The directory is not created here; callers do that when
/// they first write into it.
pub fn user_config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .or_else(|| std::env::var_os("APPDATA").map(PathBuf::from))?;
    Some(base.join(APP_DIR))
}

/// Directory the running executable lives in.
pub fn program_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()?
        .parent()
        .map(Path::to_path_buf)
}
