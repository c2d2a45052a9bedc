//! Default paths for quickid components
//!
//! The configuration file is user-writable by default (no root required):
//! `$XDG_CONFIG_HOME/quickid/config.toml` or `~/.config/quickid/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const QUICKID_CONFIG_ENV: &str = "QUICKID_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "quickid";

/// Get the default configuration file path.
///
/// Order of precedence:
/// 1. `$QUICKID_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/quickid/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/quickid/config.toml`
/// 4. `./quickid.toml` (no home directory)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(QUICKID_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking the QUICKID_CONFIG env var.
pub fn config_path_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    // Last resort
    PathBuf::from(format!("{}.toml", APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_names_quickid() {
        let path = config_path_without_env();
        assert!(path.to_string_lossy().contains("quickid"));
        assert_eq!(path.extension().unwrap(), "toml");
    }
}
