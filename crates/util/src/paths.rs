use std::env;
use std::path::PathBuf;

use dirs_next::{config_dir, home_dir};

/// Directory name used under the platform configuration directory.
pub const CONFIG_DIR_NAME: &str = "datacube";

/// Expands a leading `~` to the current user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if trimmed == "~" {
        return home();
    }
    match trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        Some(rest) => home().join(rest),
        None => PathBuf::from(trimmed),
    }
}

/// Resolves a configuration file path.
///
/// A non-blank value in `override_env` wins; otherwise the file lives at
/// `<config_dir>/datacube/<file_name>`.
pub fn config_file_path(override_env: &str, file_name: &str) -> PathBuf {
    if let Ok(path) = env::var(override_env)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ENV: &str = "DATACUBE_TEST_CONFIG_PATH";

    #[test]
    fn plain_paths_are_untouched() {
        assert_eq!(expand_tilde(" /etc/datacube.json "), PathBuf::from("/etc/datacube.json"));
    }

    #[test]
    fn override_env_takes_precedence() {
        temp_env::with_var(TEST_ENV, Some("/tmp/custom.json"), || {
            assert_eq!(config_file_path(TEST_ENV, "config.json"), PathBuf::from("/tmp/custom.json"));
        });
    }

    #[test]
    fn blank_override_falls_back_to_config_dir() {
        temp_env::with_var(TEST_ENV, Some("  "), || {
            let path = config_file_path(TEST_ENV, "config.json");
            assert!(path.ends_with("datacube/config.json"), "unexpected path {:?}", path);
        });
    }
}
