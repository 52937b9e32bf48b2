use std::{fs, path::Path};

use anyhow::{Context, Result};

use crate::models::UserProfile;

pub fn load(path: &Path) -> Result<Option<UserProfile>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    let profile = toml::from_str(&raw)
        .with_context(|| format!("Invalid profile file {}", path.display()))?;
    Ok(Some(profile))
}

pub fn save(path: &Path, profile: &UserProfile) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    fs::write(path, toml::to_string_pretty(profile)?)
        .with_context(|| format!("Failed to write profile {}", path.display()))
}
