use std::env;
use std::path::PathBuf;

/// Explicit profile directory override
pub const PROFILE_PATH_ENV_VAR: &str = "CHROMIUM_PROFILE_PATH";

/// Override for the preference file location
pub const CONFIG_PATH_ENV_VAR: &str = "CHROMIUM_SYNC_CONFIG";

/// Get the profile override from `CHROMIUM_PROFILE_PATH`, ignoring empty values
pub fn profile_path_override() -> Option<PathBuf> {
    non_empty_var(PROFILE_PATH_ENV_VAR)
}

/// Get the preference file path: `CHROMIUM_SYNC_CONFIG`, else
/// `<platform config dir>/chromium-sync/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    non_empty_var(CONFIG_PATH_ENV_VAR)
        .or_else(|| dirs::config_dir().map(|dir| dir.join("chromium-sync").join("config.json")))
}

fn non_empty_var(name: &str) -> Option<PathBuf> {
    env::var_os(name).filter(|value| !value.is_empty()).map(PathBuf::from)
}
