use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Declarative registry of the apps this machine can deploy.
///
/// Lives in `apps.toml` next to the daemon (or under /etc/homeport) and
/// is re-read on every trigger, so edits apply without a restart. A
/// missing file is an empty registry, not an error.
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct AppsFile {
    #[serde(rename = "app", default)]
    pub apps: Vec<AppEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AppEntry {
    pub name: String,
    pub path: String,
    pub commands: Vec<String>,
}

impl AppsFile {
    pub fn autoload() -> Result<Self> {
        let apps_in_cwd = Path::new("./apps.toml");
        let apps_in_etc = Path::new("/etc/homeport/apps.toml");

        if apps_in_cwd.exists() {
            info!("Loading apps.toml: LOCAL");
            Self::load_from_path(apps_in_cwd)
        } else if apps_in_etc.exists() {
            info!("Loading apps.toml: ETC");
            Self::load_from_path(apps_in_etc)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load(location: Option<&str>) -> Result<Self> {
        match location {
            Some(location) => Self::load_from_path(Path::new(location)),
            None => Self::autoload(),
        }
    }

    fn load_from_path(location: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(location)
            .with_context(|| format!("Failed to read apps file: {}", location.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse apps file: {}", location.display()))
    }

    pub fn lookup(&self, name: &str) -> Option<&AppEntry> {
        self.apps.iter().find(|app| app.name == name)
    }
}
