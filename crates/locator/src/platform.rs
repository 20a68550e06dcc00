//! Platform-specific names and locations for the provider executable.

use std::path::PathBuf;

/// Base name of the provider executable.
pub const EXECUTABLE_STEM: &str = "dsc";

/// Get the file extension for executables on this platform.
///
/// Returns ".exe" on Windows, empty string on other platforms.
#[must_use]
pub fn executable_extension() -> &'static str {
    if cfg!(windows) { ".exe" } else { "" }
}

/// File name of the provider executable on this platform.
#[must_use]
pub fn executable_name() -> String {
    format!("{EXECUTABLE_STEM}{}", executable_extension())
}

/// Well-known per-user root under which provider packages are installed.
///
/// | OS      | Root                                          |
/// |---------|-----------------------------------------------|
/// | Windows | `%LOCALAPPDATA%\Microsoft\WindowsApps`        |
/// | Others  | `$XDG_DATA_HOME/dsc/packages` (`~/.local/share/dsc/packages`) |
///
/// Returns `None` if the home directory cannot be determined.
#[must_use]
pub fn default_install_root() -> Option<PathBuf> {
    let base = dirs::data_local_dir()?;
    if cfg!(windows) {
        Some(base.join("Microsoft").join("WindowsApps"))
    } else {
        Some(base.join("dsc").join("packages"))
    }
}
