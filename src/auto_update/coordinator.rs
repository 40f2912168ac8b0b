// Update Coordinator - one-shot install trigger and engine entry point
// idle -> artifact-ready -> prompted -> {installing, declined}

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::auto_update::channel::DistributionChannel;
use crate::auto_update::downloader::Downloader;
use crate::auto_update::installer::{DetachedProcessLauncher, InstallerLauncher};
use crate::auto_update::{load_config, DownloadedArtifact, TriggerState, UpdateConfig, UpdateError};

/// Set once the engine has been started in this process
static UPDATER_STARTED: AtomicBool = AtomicBool::new(false);

/// Content of the "update ready" dialog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallNotice {
    pub title: String,
    pub detail: String,
    /// Index 0 accepts the install
    pub buttons: Vec<String>,
}

impl InstallNotice {
    pub fn for_update(version: &str, store: bool) -> Self {
        let detail = if store {
            format!(
                "It seems there are problems updating this program from the store. \
                 The update to v{} will be installed automatically in the background. \
                 You may want to uninstall the old version manually.",
                version
            )
        } else {
            format!(
                "A new version has been downloaded. The update to v{} will be installed \
                 automatically in the background. You don't have to do anything.",
                version
            )
        };

        Self {
            title: format!("v{}", version),
            detail,
            buttons: vec!["Ok".to_string(), "Cancel".to_string()],
        }
    }
}

/// Synchronous dialog shown while the window is closing
pub trait UpdatePrompt {
    /// Returns true if the user accepted the install
    fn confirm_install(&self, notice: &InstallNotice) -> bool;
}

/// Callback run once when the host window closes
pub type CloseHandler = Box<dyn FnOnce(&dyn UpdatePrompt) + Send + 'static>;

/// The shell's main window, as far as the updater is concerned
pub trait HostWindow {
    /// Register a one-shot handler for the window's close event
    fn on_close(&self, handler: CloseHandler);
}

/// What happened when the window closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    NothingStaged,
    Installing,
    Declined,
}

/// Drives one update check and its install prompt
pub struct UpdateCoordinator {
    state: Mutex<TriggerState>,
    config: UpdateConfig,
    channel: DistributionChannel,
    downloader: Downloader,
    launcher: Arc<dyn InstallerLauncher>,
}

impl UpdateCoordinator {
    pub fn new(
        config: UpdateConfig,
        channel: DistributionChannel,
        launcher: Arc<dyn InstallerLauncher>,
    ) -> Self {
        Self {
            state: Mutex::new(TriggerState::Idle),
            downloader: Downloader::new(&config),
            config,
            channel,
            launcher,
        }
    }

    /// Coordinator for this process: config file, detected channel, real launcher
    pub fn with_defaults() -> Self {
        Self::new(
            load_config(),
            DistributionChannel::detect(),
            Arc::new(DetachedProcessLauncher),
        )
    }

    /// Resolve against another platform's installers
    pub fn with_platform(mut self, platform: &str) -> Self {
        self.downloader = self.downloader.with_platform(platform);
        self
    }

    pub fn get_state(&self) -> TriggerState {
        self.lock_state().clone()
    }

    /// Check, download, and arm the close handler on `window`
    ///
    /// Returns once the download finished or was abandoned; nothing is
    /// registered on the window when no installer was staged.
    pub async fn run<W: HostWindow + ?Sized>(
        self: Arc<Self>,
        window: &W,
        current_version: &str,
        history_url: &str,
    ) {
        let Some(artifact) = self
            .downloader
            .download_update(current_version, history_url, self.channel)
            .await
        else {
            log::info!("[UpdateCoordinator] No update staged this run");
            return;
        };

        if let Err(e) = self.stage(artifact) {
            log::error!("[UpdateCoordinator] {}", e);
            return;
        }

        let coordinator = Arc::clone(&self);
        window.on_close(Box::new(move |prompt: &dyn UpdatePrompt| {
            coordinator.handle_window_close(prompt);
        }));
    }

    /// Record a downloaded installer; only valid from Idle
    pub fn stage(&self, artifact: DownloadedArtifact) -> Result<(), UpdateError> {
        let mut state = self.lock_state();
        match &*state {
            TriggerState::Idle => {
                log::info!(
                    "[UpdateCoordinator] v{} ready at {}",
                    artifact.version,
                    artifact.path.display()
                );
                *state = TriggerState::ArtifactReady(artifact);
                Ok(())
            }
            other => Err(UpdateError::InvalidState {
                current: other.name().to_string(),
                attempted: "ArtifactReady".to_string(),
            }),
        }
    }

    /// Prompt and, if accepted, hand the installer to the launcher
    pub fn handle_window_close(&self, prompt: &dyn UpdatePrompt) -> InstallOutcome {
        let artifact = {
            let mut state = self.lock_state();
            match &*state {
                TriggerState::ArtifactReady(artifact) => {
                    let artifact = artifact.clone();
                    *state = TriggerState::Prompted(artifact.clone());
                    artifact
                }
                other => {
                    log::debug!(
                        "[UpdateCoordinator] Window closed in state {}, nothing to do",
                        other.name()
                    );
                    return InstallOutcome::NothingStaged;
                }
            }
        };

        let notice = InstallNotice::for_update(&artifact.version, self.channel.store);
        let accepted = prompt.confirm_install(&notice);

        if !accepted {
            log::info!("[UpdateCoordinator] User declined v{}", artifact.version);
            *self.lock_state() = TriggerState::Declined {
                version: artifact.version,
            };
            return InstallOutcome::Declined;
        }

        *self.lock_state() = TriggerState::Installing {
            version: artifact.version.clone(),
        };

        if let Err(e) = self
            .launcher
            .launch_detached(&artifact.path, &self.config.silent_install_args)
        {
            log::error!("[UpdateCoordinator] {}", e);
        }

        InstallOutcome::Installing
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, TriggerState> {
        // A panic while holding the lock leaves a valid state behind
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Engine entry point for the shell
///
/// Runs the full check, download, prompt and install sequence for this
/// process. Later calls are ignored.
pub async fn run_updater<W: HostWindow + ?Sized>(
    window: &W,
    current_version: &str,
    history_url: &str,
) {
    if UPDATER_STARTED.swap(true, Ordering::SeqCst) {
        log::warn!("[UpdateCoordinator] Updater already ran in this process");
        return;
    }

    let coordinator = Arc::new(UpdateCoordinator::with_defaults());
    coordinator.run(window, current_version, history_url).await;
}
