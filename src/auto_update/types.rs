// Core types for the Auto-Update System
// Release history model, trigger states, configuration and errors

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Remote release history as published next to the app
///
/// `history` entries stay untyped until the validator has looked at them:
/// flags may be booleans or strings and a single bad entry must not poison
/// the rest of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseHistoryDocument {
    pub name: String,
    pub description: String,
    pub repository: String,
    pub history: Vec<Value>,
}

impl ReleaseHistoryDocument {
    /// Check the document shape and split out the raw release entries
    pub fn from_json(value: Value) -> Result<Self, UpdateError> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(UpdateError::MalformedHistory(format!(
                    "expected an object at the top level, got {}",
                    json_kind(&other)
                )))
            }
        };

        // A single release posted in place of the history document
        if object.contains_key("version") && object.contains_key("files") {
            return Err(UpdateError::MalformedHistory(
                "document looks like a single release, not a history".to_string(),
            ));
        }

        let history = match object.remove("history") {
            Some(Value::Array(entries)) if !entries.is_empty() => entries,
            Some(Value::Array(_)) => {
                return Err(UpdateError::MalformedHistory("history is empty".to_string()))
            }
            Some(other) => {
                return Err(UpdateError::MalformedHistory(format!(
                    "history must be a list, got {}",
                    json_kind(&other)
                )))
            }
            None => {
                return Err(UpdateError::MalformedHistory(
                    "missing history field".to_string(),
                ))
            }
        };

        Ok(Self {
            name: take_string(&mut object, "name"),
            description: take_string(&mut object, "description"),
            repository: take_string(&mut object, "repository"),
            history,
        })
    }
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> String {
    match object.remove(key) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// A release entry as it appears in the history document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRelease {
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub files: Option<Map<String, Value>>,

    /// Percentage string such as "20%"
    #[serde(default)]
    pub staggering: Option<Value>,

    #[serde(default, rename = "isPrerelease")]
    pub is_prerelease: Option<Value>,

    #[serde(default, rename = "isMandatory")]
    pub is_mandatory: Option<Value>,
}

/// A release entry after validation, defaults and the rollout draw
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRelease {
    pub version: String,
    /// Platform identifier (win32, darwin, linux) to installer URL
    pub files: BTreeMap<String, String>,
    /// Rollout percentage, NaN when the raw value did not parse
    pub staggering: f64,
    pub is_prerelease: bool,
    pub is_mandatory: bool,
    pub skip_update: bool,
}

/// The release chosen for this run, ready for download
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedUpdatePacket {
    #[serde(flatten)]
    pub release: CanonicalRelease,
    pub app_name: String,
    pub target_file: String,
}

/// Installer written to the private temp directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadedArtifact {
    pub path: PathBuf,
    pub version: String,
}

/// States of the one-shot install trigger
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TriggerState {
    /// Nothing was downloaded this run
    #[default]
    Idle,

    /// Installer staged, waiting for the window to close
    ArtifactReady(DownloadedArtifact),

    /// Dialog is on screen
    Prompted(DownloadedArtifact),

    /// Installer handed off to a detached process
    Installing { version: String },

    /// User dismissed the dialog
    Declined { version: String },
}

impl TriggerState {
    pub fn name(&self) -> &'static str {
        match self {
            TriggerState::Idle => "Idle",
            TriggerState::ArtifactReady(_) => "ArtifactReady",
            TriggerState::Prompted(_) => "Prompted",
            TriggerState::Installing { .. } => "Installing",
            TriggerState::Declined { .. } => "Declined",
        }
    }
}

/// Configuration for the update engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Release history URL used when the host does not pass one
    pub history_url: Option<String>,

    /// Total timeout for the history request, and connect timeout for downloads
    pub request_timeout_secs: u64,

    /// Longest wait between two body chunks of an installer download
    pub download_idle_timeout_secs: u64,

    /// Arguments that make the installer run unattended
    pub silent_install_args: Vec<String>,

    /// Root for the private download directory (system temp dir if unset)
    pub temp_dir: Option<PathBuf>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            history_url: None,
            request_timeout_secs: 30,
            download_idle_timeout_secs: 60,
            silent_install_args: vec!["/S".to_string()],
            temp_dir: None,
        }
    }
}

impl UpdateConfig {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn download_idle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.download_idle_timeout_secs)
    }

    pub fn temp_root(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Error types for update operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "message")]
pub enum UpdateError {
    /// Connection, timeout or body read failure
    Network(String),

    /// Server answered with a non-success status
    HttpStatus {
        status_code: u16,
        url: String,
    },

    /// History document has the wrong shape
    MalformedHistory(String),

    /// Version string is not a semantic version
    InvalidVersion(String),

    /// Temp directory or file write failed
    FileSystem(String),

    /// Installer could not be started
    InstallFailed(String),

    /// Invalid state transition
    InvalidState {
        current: String,
        attempted: String,
    },

    /// Configuration error
    ConfigError(String),
}

impl std::fmt::Display for UpdateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateError::Network(msg) => write!(f, "Network error: {}", msg),
            UpdateError::HttpStatus { status_code, url } => {
                write!(f, "HTTP {} from {}", status_code, url)
            }
            UpdateError::MalformedHistory(msg) => write!(f, "Malformed release history: {}", msg),
            UpdateError::InvalidVersion(v) => write!(f, "Invalid version: {:?}", v),
            UpdateError::FileSystem(msg) => write!(f, "File system error: {}", msg),
            UpdateError::InstallFailed(msg) => write!(f, "Installation failed: {}", msg),
            UpdateError::InvalidState { current, attempted } => {
                write!(f, "Invalid state transition from {} to {}", current, attempted)
            }
            UpdateError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for UpdateError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_document_parses() {
        let doc = ReleaseHistoryDocument::from_json(json!({
            "name": "MyApp",
            "description": "An app",
            "repository": "https://example.com/repo",
            "history": [{ "version": "1.0.0", "files": { "linux": "http://x/a.sh" } }]
        }))
        .unwrap();

        assert_eq!(doc.name, "MyApp");
        assert_eq!(doc.repository, "https://example.com/repo");
        assert_eq!(doc.history.len(), 1);
    }

    #[test]
    fn test_history_document_missing_metadata_defaults_to_empty() {
        let doc = ReleaseHistoryDocument::from_json(json!({
            "history": [{ "version": "1.0.0" }]
        }))
        .unwrap();

        assert!(doc.name.is_empty());
        assert!(doc.description.is_empty());
    }

    #[test]
    fn test_history_document_rejects_empty_history() {
        let result = ReleaseHistoryDocument::from_json(json!({ "name": "x", "history": [] }));
        assert!(matches!(result, Err(UpdateError::MalformedHistory(_))));
    }

    #[test]
    fn test_history_document_rejects_missing_history() {
        let result = ReleaseHistoryDocument::from_json(json!({ "name": "x" }));
        assert!(matches!(result, Err(UpdateError::MalformedHistory(_))));
    }

    #[test]
    fn test_history_document_rejects_object_history() {
        let result = ReleaseHistoryDocument::from_json(json!({
            "name": "x",
            "history": { "name": "x", "version": "1.0.0" }
        }));
        assert!(matches!(result, Err(UpdateError::MalformedHistory(_))));
    }

    #[test]
    fn test_history_document_rejects_single_release_shape() {
        let result = ReleaseHistoryDocument::from_json(json!({
            "name": "x",
            "version": "1.0.0",
            "files": { "linux": "http://x/a.sh" },
            "history": [{ "version": "1.0.0" }]
        }));
        assert!(matches!(result, Err(UpdateError::MalformedHistory(_))));
    }

    #[test]
    fn test_history_document_rejects_non_object() {
        let result = ReleaseHistoryDocument::from_json(json!([1, 2, 3]));
        assert!(matches!(result, Err(UpdateError::MalformedHistory(_))));
    }

    #[test]
    fn test_raw_release_accepts_string_flags() {
        let raw: RawRelease = serde_json::from_value(json!({
            "version": "1.0.0",
            "files": {},
            "isMandatory": "TRUE",
            "isPrerelease": false
        }))
        .unwrap();

        assert_eq!(raw.is_mandatory, Some(json!("TRUE")));
        assert_eq!(raw.is_prerelease, Some(json!(false)));
        assert!(raw.staggering.is_none());
    }

    #[test]
    fn test_trigger_state_default() {
        assert_eq!(TriggerState::default(), TriggerState::Idle);
        assert_eq!(TriggerState::default().name(), "Idle");
    }

    #[test]
    fn test_update_config_default() {
        let config = UpdateConfig::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.download_idle_timeout_secs, 60);
        assert_eq!(config.silent_install_args, vec!["/S".to_string()]);
        assert!(config.history_url.is_none());
        assert_eq!(config.temp_root(), std::env::temp_dir());
    }

    #[test]
    fn test_update_config_partial_json_uses_defaults() {
        let config: UpdateConfig =
            serde_json::from_str(r#"{ "request_timeout_secs": 5 }"#).unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.download_idle_timeout_secs, 60);
    }

    #[test]
    fn test_update_error_display() {
        let error = UpdateError::HttpStatus {
            status_code: 404,
            url: "http://x/history.json".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("404"));
        assert!(display.contains("history.json"));
    }

    #[test]
    fn test_update_error_serialization() {
        let error = UpdateError::InvalidState {
            current: "Idle".to_string(),
            attempted: "Installing".to_string(),
        };

        let json = serde_json::to_string(&error).unwrap();
        let deserialized: UpdateError = serde_json::from_str(&json).unwrap();

        assert_eq!(error, deserialized);
    }
}
