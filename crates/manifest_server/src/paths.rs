//! Server directory layout and bootstrap files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Value};

/// Resolved filesystem layout for one server instance.
#[derive(Debug, Clone)]
pub struct ServerPaths {
    /// Static assets and the SPA entry point.
    pub public_dir: PathBuf,
    /// Community app directories, each optionally carrying
    /// `app.properties.json`.
    pub apps_dir: PathBuf,
    /// Uploaded software payloads served with digests.
    pub uploads_dir: PathBuf,
    /// Installed-apps user config file.
    pub user_config_file: PathBuf,
    /// Persisted desktop snapshot file.
    pub state_file: PathBuf,
}

impl ServerPaths {
    /// Builds the layout under a server root directory.
    pub fn under(root: &Path) -> Self {
        let public_dir = root.join("public");
        Self {
            apps_dir: public_dir.join("apps"),
            public_dir,
            uploads_dir: root.join("uploads"),
            user_config_file: root.join("userConfig.json"),
            state_file: root.join("desktopState.json"),
        }
    }

    /// Creates the bootstrap files when missing so first boot starts from a
    /// consistent empty desktop.
    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        ensure_file(&self.user_config_file, default_user_config())?;
        ensure_file(&self.state_file, default_desktop_state())?;
        Ok(())
    }
}

/// Default installed-apps config payload.
pub fn default_user_config() -> Value {
    json!({ "installedApps": {} })
}

/// Default empty desktop snapshot payload.
pub fn default_desktop_state() -> Value {
    json!({ "windows": [], "zIndexCounter": 1 })
}

fn ensure_file(file: &Path, default_value: Value) -> Result<()> {
    if file.exists() {
        return Ok(());
    }
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(file, serde_json::to_string_pretty(&default_value)?)
        .with_context(|| format!("writing {}", file.display()))
}

/// Reads a JSON file, falling back to `fallback` when missing or malformed.
pub fn read_json_or(file: &Path, fallback: Value) -> Value {
    fs::read_to_string(file)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn layout_nests_apps_under_public() {
        let paths = ServerPaths::under(Path::new("/srv/aerodesk"));
        assert_eq!(paths.public_dir, Path::new("/srv/aerodesk/public"));
        assert_eq!(paths.apps_dir, Path::new("/srv/aerodesk/public/apps"));
        assert_eq!(paths.uploads_dir, Path::new("/srv/aerodesk/uploads"));
    }

    #[test]
    fn default_state_matches_the_wire_bootstrap_shape() {
        assert_eq!(
            default_desktop_state(),
            serde_json::json!({ "windows": [], "zIndexCounter": 1 })
        );
    }
}
