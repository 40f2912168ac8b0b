// Update Configuration File Handler
// Loads and saves update configuration from/to a JSON file

use std::fs;
use std::path::{Path, PathBuf};

use crate::auto_update::UpdateConfig;

/// Configuration file name
const CONFIG_FILE_NAME: &str = "update_config.json";

/// Directory under the home directory holding wrapper settings
const CONFIG_DIR_NAME: &str = ".pwa-wrapper";

/// Get the configuration file path
/// Stores in the home directory: ~/.pwa-wrapper/update_config.json
pub fn get_config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
}

/// Load update configuration from the default location
/// Returns default config if the file is missing or unusable
pub fn load_config() -> UpdateConfig {
    load_config_from(&get_config_path())
}

/// Load update configuration from a specific file
pub fn load_config_from(config_path: &Path) -> UpdateConfig {
    if !config_path.exists() {
        log::info!("[UpdateConfig] Config file not found, using defaults");
        return UpdateConfig::default();
    }

    match fs::read_to_string(config_path) {
        Ok(content) => match serde_json::from_str::<UpdateConfig>(&content) {
            Ok(config) => {
                log::info!("[UpdateConfig] Loaded config from {:?}", config_path);
                if let Some(url) = &config.history_url {
                    log::info!("[UpdateConfig] History URL: {}", url);
                }
                config
            }
            Err(e) => {
                log::warn!("[UpdateConfig] Failed to parse config: {}, using defaults", e);
                UpdateConfig::default()
            }
        },
        Err(e) => {
            log::warn!("[UpdateConfig] Failed to read config: {}, using defaults", e);
            UpdateConfig::default()
        }
    }
}

/// Save update configuration to the default location
pub fn save_config(config: &UpdateConfig) -> Result<(), String> {
    save_config_to(config, &get_config_path())
}

/// Save update configuration to a specific file
pub fn save_config_to(config: &UpdateConfig, config_path: &Path) -> Result<(), String> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    fs::write(config_path, json).map_err(|e| format!("Failed to write config: {}", e))?;

    log::info!("[UpdateConfig] Saved config to {:?}", config_path);
    Ok(())
}

/// Create default config file if it doesn't exist
pub fn ensure_config_exists() -> Result<PathBuf, String> {
    let config_path = get_config_path();

    if !config_path.exists() {
        save_config_to(&UpdateConfig::default(), &config_path)?;
        log::info!("[UpdateConfig] Created default config at {:?}", config_path);
    }

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_path() {
        let path = get_config_path();
        assert!(path.to_string_lossy().contains(".pwa-wrapper"));
        assert!(path.to_string_lossy().ends_with("update_config.json"));
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("missing.json"));
        assert_eq!(config, UpdateConfig::default());
    }

    #[test]
    fn test_load_invalid_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_config_from(&path), UpdateConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = UpdateConfig {
            history_url: Some("https://example.com/history.json".to_string()),
            request_timeout_secs: 10,
            ..Default::default()
        };
        save_config_to(&config, &path).unwrap();

        assert_eq!(load_config_from(&path), config);
    }
}
