//! YAML configuration I/O
//!
//! Generic loading/saving shared by the looper config and the MIDI mapping
//! file. A missing or unreadable file never aborts startup: the caller gets
//! the type's defaults and a warning in the log.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load configuration from a YAML file
///
/// Returns `T::default()` when the file does not exist or fails to parse.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: {:?} not found, using defaults", path);
        return T::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("load_config: Failed to read {:?}: {}, using defaults", path, e);
            return T::default();
        }
    };

    match serde_yaml::from_str::<T>(&contents) {
        Ok(config) => {
            log::info!("load_config: Loaded {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("load_config: Failed to parse {:?}: {}, using defaults", path, e);
            T::default()
        }
    }
}

/// Save configuration to a YAML file, creating parent directories
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LooperConfig;

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config: LooperConfig = load_config(Path::new("/nonexistent/path/looper.yaml"));
        assert_eq!(config, LooperConfig::default());
    }

    #[test]
    fn test_invalid_yaml_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("looper.yaml");
        std::fs::write(&path, "buffer_len: [not, a, number]").unwrap();

        let config: LooperConfig = load_config(&path);
        assert_eq!(config, LooperConfig::default());
    }

    #[test]
    fn test_roundtrip_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("looper.yaml");

        let mut config = LooperConfig::default();
        config.poll_frames = 512;
        config.record_channels = [true, false];
        config.bank.files = vec!["only.wav".to_string()];

        save_config(&config, &path).unwrap();
        let loaded: LooperConfig = load_config(&path);

        assert_eq!(loaded, config);
    }
}
