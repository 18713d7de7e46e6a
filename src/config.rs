use crate::clipboard::ClipboardKind;
use crate::error::{Error, Result};
use crate::utils::paths::get_config_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Interpreter used to run `-m pip`.
    #[serde(default = "default_python")]
    pub python: String,

    #[serde(default)]
    pub clipboard: ClipboardKind,

    /// Restore directory for `install` and `paste`.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_force_reinstall")]
    pub force_reinstall: bool,
}

fn default_python() -> String {
    let python = if cfg!(windows) { "python" } else { "python3" };
    python.to_string()
}

fn default_dir() -> PathBuf {
    PathBuf::from("temp")
}

fn default_force_reinstall() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            python: default_python(),
            clipboard: ClipboardKind::default(),
            dir: default_dir(),
            force_reinstall: default_force_reinstall(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        match get_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}
