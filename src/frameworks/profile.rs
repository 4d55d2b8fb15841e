// Local key-value persistence for the last-used display name, so the join
// form can be pre-filled across sessions.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs, io};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalProfile {
    name: String,
}

/// Profile file location, overridable for tests and packaging.
pub fn profile_path() -> PathBuf {
    env::var("PLAYER_PROFILE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("player_profile.json"))
}

/// Reads the cached display name. Missing or unreadable profiles simply mean
/// there is nothing to pre-fill.
pub fn load_last_name(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let profile: LocalProfile = serde_json::from_str(&text).ok()?;
    if profile.name.trim().is_empty() {
        return None;
    }
    Some(profile.name)
}

/// Caches the display name after a successful join.
pub fn store_last_name(path: &Path, name: &str) -> io::Result<()> {
    let profile = LocalProfile {
        name: name.to_string(),
    };
    let text = serde_json::to_string(&profile).map_err(io::Error::other)?;
    fs::write(path, text)
}
