use std::path::PathBuf;

const APP_NAME: &str = "jarvis-connector";
const CONFIG_FILE: &str = ".jarvis-connector.toml";

/// Load config file content from CWD first, then the user config directory
///
/// Searches for:
/// 1. `.jarvis-connector.toml` in the current working directory
/// 2. `jarvis-connector/config.toml` in the platform config directory
///    (`~/.config/jarvis-connector/config.toml` on Linux)
///
/// Returns the file content if found, None otherwise.
pub fn load_config_file() -> Option<String> {
    if let Ok(content) = std::fs::read_to_string(CONFIG_FILE) {
        log::debug!("Loaded config from {}", CONFIG_FILE);
        return Some(content);
    }

    if let Some(path) = config_file_path() {
        if let Ok(content) = std::fs::read_to_string(&path) {
            log::debug!("Loaded config from {}", path.display());
            return Some(content);
        }
    }

    None
}

/// Path of the config file in the platform config directory
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
}
