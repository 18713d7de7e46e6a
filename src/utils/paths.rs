use std::path::PathBuf;

/// `~/.clipinstall`, or `None` when no home directory can be determined.
pub fn get_clipinstall_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".clipinstall"))
}

pub fn get_config_path() -> Option<PathBuf> {
    get_clipinstall_dir().map(|dir| dir.join("config.toml"))
}
