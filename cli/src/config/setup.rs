use std::path::{Path, PathBuf};

const APP_DIR: &str = "busforge";
const CONFIG_FILE: &str = "config.toml";

/// Get the standard configuration directory for the current platform
pub fn get_config_dir() -> Option<PathBuf> {
    // Prefer ~/.config/busforge on Unix-like systems, fall back to platform defaults
    if cfg!(unix) {
        if let Some(mut home_path) = dirs::home_dir() {
            home_path.push(".config");
            home_path.push(APP_DIR);
            return Some(home_path);
        }
    }

    dirs::config_dir().map(|mut path| {
        path.push(APP_DIR);
        path
    })
}

/// Get the standard configuration file path
pub fn get_config_file_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Configuration file to read: `config.toml` in `current_dir` wins over the
/// one in the user's config directory. `None` when neither exists.
pub fn find_config_file(current_dir: &Path) -> Option<PathBuf> {
    let local = current_dir.join(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    get_config_file_path().filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(CONFIG_FILE);
        std::fs::write(&local, "[provisioning]\n").unwrap();

        assert_eq!(find_config_file(dir.path()), Some(local));
    }

    #[test]
    fn config_dir_is_app_specific() {
        if let Some(dir) = get_config_dir() {
            assert!(dir.ends_with(APP_DIR));
        }
    }
}
