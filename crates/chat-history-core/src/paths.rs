use std::env;
use std::path::PathBuf;

/// Directory name used under the user's config directory.
const APP_DIR: &str = "chat-history";

/// Return the user's home directory path.
///
/// Uses HOME on Unix-like systems and USERPROFILE on Windows.
pub fn get_home_dir() -> Result<String, String> {
    if let Ok(home) = env::var("HOME") {
        if !home.is_empty() {
            return Ok(home);
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.is_empty() {
            return Ok(profile);
        }
    }

    Err("Home directory not set".to_string())
}

/// `~/.config/chat-history/config.json`, or `None` without a home directory.
pub fn default_config_path() -> Option<PathBuf> {
    let home = get_home_dir().ok()?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.json"),
    )
}
