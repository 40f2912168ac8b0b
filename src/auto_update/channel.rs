// Distribution Channel Detection
// Decides once at startup whether this installation may replace itself

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment marker set by portable packaging
pub const PORTABLE_ENV_VAR: &str = "PORTABLE_EXECUTABLE_DIR";

/// Read-only system prefixes on Linux; installs there belong to the package manager
const RESTRICTED_LINUX_DIRS: [&str; 4] = ["/bin", "/usr", "/lib", "/lib64"];

/// How this copy of the app was distributed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionChannel {
    /// App store package or protected install path; only mandatory fixes apply
    pub store: bool,
    /// Self-contained portable directory; never self-updates
    pub portable: bool,
}

impl DistributionChannel {
    /// A regular, self-updating installation
    pub fn standard() -> Self {
        Self::default()
    }

    /// Detect the channel of the running process
    pub fn detect() -> Self {
        let exe = std::env::current_exe().ok();
        let channel = Self::from_parts(std::env::consts::OS, exe.as_deref(), |key| {
            std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
        });
        log::info!(
            "[Channel] store={} portable={} (exe: {:?})",
            channel.store,
            channel.portable,
            exe
        );
        channel
    }

    /// Detection rules over explicit inputs
    ///
    /// `os` uses `std::env::consts::OS` names.
    pub fn from_parts<F>(os: &str, exe_path: Option<&Path>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let portable = env(PORTABLE_ENV_VAR).is_some_and(|dir| !dir.is_empty());
        let store = exe_path.is_some_and(|exe| is_store_install(os, exe));
        Self { store, portable }
    }

    /// Whether the app may download and run arbitrary newer installers
    pub fn is_updateable(&self) -> bool {
        !self.store && !self.portable
    }
}

fn is_store_install(os: &str, exe: &Path) -> bool {
    match os {
        "windows" => exe
            .to_string_lossy()
            .to_ascii_lowercase()
            .contains("\\windowsapps\\"),
        "macos" => mac_app_store_receipt(exe).is_some_and(|receipt| receipt.exists()),
        "linux" => RESTRICTED_LINUX_DIRS
            .iter()
            .any(|dir| exe.starts_with(dir)),
        _ => false,
    }
}

/// `<bundle>/Contents/_MASReceipt/receipt` for an exe at `<bundle>/Contents/MacOS/<exe>`
fn mac_app_store_receipt(exe: &Path) -> Option<std::path::PathBuf> {
    let contents = exe.parent()?.parent()?;
    Some(contents.join("_MASReceipt").join("receipt"))
}

/// Platform key used by the history document's `files` map
pub fn current_platform() -> &'static str {
    platform_key(std::env::consts::OS)
}

fn platform_key(os: &'static str) -> &'static str {
    match os {
        "windows" => "win32",
        "macos" => "darwin",
        other => other,
    }
}
