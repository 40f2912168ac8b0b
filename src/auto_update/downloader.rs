// Downloader Module
// Resolves the update for this run and stages its installer in a private
// temp directory

use futures_util::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::auto_update::api_client::HistoryClient;
use crate::auto_update::channel::{current_platform, DistributionChannel};
use crate::auto_update::resolver::{resolve_update, ResolveContext};
use crate::auto_update::version;
use crate::auto_update::{DownloadedArtifact, SelectedUpdatePacket, UpdateConfig, UpdateError};

/// File name used when the artifact URL has no usable last segment
const FALLBACK_FILE_NAME: &str = "update-installer";

/// Prefix used when the history document has no app name
const FALLBACK_APP_NAME: &str = "app";

/// Fetches the history, resolves the update and downloads its installer
pub struct Downloader {
    http_client: Client,
    history: HistoryClient,
    idle_timeout: Duration,
    temp_root: PathBuf,
    platform: String,
}

impl Downloader {
    /// Create a Downloader from UpdateConfig
    pub fn new(config: &UpdateConfig) -> Self {
        let http_client = Client::builder()
            .connect_timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|e| {
                log::warn!("[Downloader] Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            history: HistoryClient::with_client(http_client.clone(), config.request_timeout()),
            http_client,
            idle_timeout: config.download_idle_timeout(),
            temp_root: config.temp_root(),
            platform: current_platform().to_string(),
        }
    }

    /// Resolve against another platform's installers
    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = platform.to_string();
        self
    }

    /// Check for an update and stage its installer
    ///
    /// Every failure is logged and reported as "no update this run"; the next
    /// launch starts over.
    pub async fn download_update(
        &self,
        current_version: &str,
        history_url: &str,
        channel: DistributionChannel,
    ) -> Option<DownloadedArtifact> {
        let packet = self
            .get_update_packet(current_version, history_url, channel)
            .await?;

        log::info!(
            "[Downloader] Update found, downloading file {}",
            packet.target_file
        );

        match self.fetch_artifact(&packet).await {
            Ok(artifact) => {
                log::info!(
                    "[Downloader] Staged v{} at {}",
                    artifact.version,
                    artifact.path.display()
                );
                Some(artifact)
            }
            Err(e) => {
                log::error!("[Downloader] Failed to download update: {}", e);
                None
            }
        }
    }

    /// Fetch the history and pick this run's update, without downloading it
    pub async fn get_update_packet(
        &self,
        current_version: &str,
        history_url: &str,
        channel: DistributionChannel,
    ) -> Option<SelectedUpdatePacket> {
        if history_url.is_empty() || !version::validate(current_version) {
            log::warn!(
                "[Downloader] Skipping update check (url: {:?}, version: {:?})",
                history_url,
                current_version
            );
            return None;
        }

        let document = match self.history.fetch_history(history_url).await {
            Ok(document) => document,
            Err(e) => {
                log::warn!("[Downloader] No release history this run: {}", e);
                return None;
            }
        };

        let ctx = ResolveContext {
            current_version,
            history_url,
            platform: &self.platform,
            channel,
        };
        resolve_update(&document, &ctx, &mut rand::thread_rng())
    }

    /// Download the packet's installer into a fresh private directory
    pub async fn fetch_artifact(
        &self,
        packet: &SelectedUpdatePacket,
    ) -> Result<DownloadedArtifact, UpdateError> {
        let response = self
            .http_client
            .get(&packet.target_file)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    UpdateError::Network(format!("Connection failed: {}", e))
                } else if e.is_timeout() {
                    UpdateError::Network(format!("Request timed out: {}", e))
                } else {
                    UpdateError::Network(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                status_code: status.as_u16(),
                url: packet.target_file.clone(),
            });
        }

        let dir = create_private_dir(&self.temp_root, &packet.app_name)?;
        let dest_path = dir.join(artifact_file_name(&packet.target_file));

        log::info!(
            "[Downloader] Writing file to filesystem: {}",
            dest_path.display()
        );

        let mut file = File::create(&dest_path)
            .await
            .map_err(|e| UpdateError::FileSystem(format!("Failed to create file: {}", e)))?;

        let mut bytes_written: u64 = 0;
        let mut stream = response.bytes_stream();

        loop {
            let next = tokio::time::timeout(self.idle_timeout, stream.next())
                .await
                .map_err(|_| {
                    UpdateError::Network(format!(
                        "No data for {}s after {} bytes",
                        self.idle_timeout.as_secs(),
                        bytes_written
                    ))
                })?;

            let Some(chunk) = next else { break };
            let chunk = chunk
                .map_err(|e| UpdateError::Network(format!("Failed to read chunk: {}", e)))?;

            file.write_all(&chunk)
                .await
                .map_err(|e| UpdateError::FileSystem(format!("Failed to write chunk: {}", e)))?;

            bytes_written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| UpdateError::FileSystem(format!("Failed to flush file: {}", e)))?;
        drop(file);

        // Installers are executed directly
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&dest_path, std::fs::Permissions::from_mode(0o755))
                .await
                .map_err(|e| {
                    UpdateError::FileSystem(format!("Failed to mark installer executable: {}", e))
                })?;
        }

        log::info!("[Downloader] Wrote {} bytes", bytes_written);

        Ok(DownloadedArtifact {
            path: dest_path,
            version: packet.release.version.clone(),
        })
    }
}

/// Create `{root}/{app}-{random}`, kept after this call returns
fn create_private_dir(root: &Path, app_name: &str) -> Result<PathBuf, UpdateError> {
    let prefix = format!("{}-", sanitize_app_name(app_name));
    tempfile::Builder::new()
        .prefix(&prefix)
        .tempdir_in(root)
        .map(|dir| dir.keep())
        .map_err(|e| UpdateError::FileSystem(format!("Failed to create temp directory: {}", e)))
}

fn sanitize_app_name(app_name: &str) -> String {
    let cleaned: String = app_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => FALLBACK_APP_NAME.to_string(),
        _ => cleaned,
    }
}

/// Last path segment of the artifact URL
fn artifact_file_name(target_file: &str) -> String {
    reqwest::Url::parse(target_file)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}
