// DevPulse platform abstraction
// Resolves where the coordinator keeps its settings on Windows, macOS, and Linux.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returns the platform-specific configuration directory for DevPulse.
///
/// - **Linux**: `~/.config/devpulse` (or `$XDG_CONFIG_HOME/devpulse`)
/// - **macOS**: `~/Library/Application Support/DevPulse`
/// - **Windows**: `%APPDATA%/DevPulse`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}
