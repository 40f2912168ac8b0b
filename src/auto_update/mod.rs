// Auto-Update System Module
// Staged self-update from a remotely hosted release history:
// - resolve the applicable release (version order, rollout, channel rules)
// - download its installer to a private temp directory
// - on window close, prompt and launch the installer detached

mod types;
mod config;
mod version;
mod release;
mod channel;
mod resolver;
mod api_client;
mod downloader;
mod installer;
mod coordinator;

// Re-export core types for external use
pub use types::{
    CanonicalRelease,
    DownloadedArtifact,
    RawRelease,
    ReleaseHistoryDocument,
    SelectedUpdatePacket,
    TriggerState,
    UpdateConfig,
    UpdateError,
};

// Re-export config functions
pub use config::{ensure_config_exists, get_config_path, load_config, save_config};

// Re-export version comparison
pub use version::{compare as compare_versions, is_newer, validate as validate_version};

// Re-export release validation
pub use release::validate_release;

// Re-export distribution channel
pub use channel::{current_platform, DistributionChannel, PORTABLE_ENV_VAR};

// Re-export resolver
pub use resolver::{resolve_update, ResolveContext};

// Re-export history client
pub use api_client::HistoryClient;

// Re-export downloader
pub use downloader::Downloader;

// Re-export installer launcher
pub use installer::{DetachedProcessLauncher, InstallerLauncher};

// Re-export coordinator
pub use coordinator::{
    run_updater, CloseHandler, HostWindow, InstallNotice, InstallOutcome, UpdateCoordinator,
    UpdatePrompt,
};
