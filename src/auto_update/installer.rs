// Installer Launcher
// Starts the staged installer in silent mode, detached from the shell so it
// survives the shell exiting

use std::path::Path;
use std::process::{Command, Stdio};

use crate::auto_update::UpdateError;

/// Capability to start an installer without waiting for it
pub trait InstallerLauncher: Send + Sync {
    fn launch_detached(&self, installer_path: &Path, args: &[String]) -> Result<(), UpdateError>;
}

/// Launches installers as detached child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedProcessLauncher;

impl InstallerLauncher for DetachedProcessLauncher {
    fn launch_detached(&self, installer_path: &Path, args: &[String]) -> Result<(), UpdateError> {
        if !installer_path.exists() {
            return Err(UpdateError::InstallFailed(format!(
                "Installer not found: {}",
                installer_path.display()
            )));
        }

        log::info!(
            "[Installer] Launching {} with {:?}",
            installer_path.display(),
            args
        );

        let mut command = Command::new(installer_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group so the shell's exit signals don't reach the installer
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
            const DETACHED_PROCESS: u32 = 0x00000008;
            command.creation_flags(CREATE_NEW_PROCESS_GROUP | DETACHED_PROCESS);
        }

        let child = command.spawn().map_err(|e| {
            UpdateError::InstallFailed(format!("Failed to spawn installer: {}", e))
        })?;

        log::info!("[Installer] Installer running as pid {}", child.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_installer_rejected() {
        let result = DetachedProcessLauncher
            .launch_detached(Path::new("/nonexistent/setup.exe"), &["/S".to_string()]);

        match result {
            Err(UpdateError::InstallFailed(msg)) => assert!(msg.contains("not found")),
            other => panic!("Expected InstallFailed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_launches_detached_script() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let script = dir.path().join("install.sh");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$1\" > '{}'\n", marker.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        DetachedProcessLauncher
            .launch_detached(&script, &["/S".to_string()])
            .unwrap();

        // The launcher does not wait; poll for the script's side effect
        let mut contents = String::new();
        for _ in 0..50 {
            if let Ok(c) = std::fs::read_to_string(&marker) {
                if !c.is_empty() {
                    contents = c;
                    break;
                }
            }
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        assert_eq!(contents.trim(), "/S");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("setup.bin");
        std::fs::write(&file, b"not a program").unwrap();

        let result = DetachedProcessLauncher.launch_detached(&file, &[]);
        assert!(matches!(result, Err(UpdateError::InstallFailed(_))));
    }
}
