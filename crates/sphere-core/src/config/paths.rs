//! Standard locations for looper files

use std::path::PathBuf;

/// Root directory for looper config and samples
///
/// Returns: `~/Music/sphere-looper`
pub fn default_looper_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Music")
        .join("sphere-looper")
}

/// Returns: `~/Music/sphere-looper/{filename}`
pub fn default_config_path(filename: &str) -> PathBuf {
    default_looper_dir().join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_lives_in_looper_dir() {
        let path = default_config_path("looper.yaml");
        assert!(path.ends_with("sphere-looper/looper.yaml"));
    }
}
