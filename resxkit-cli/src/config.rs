//! `resxkit.toml` loading.

use std::path::{Path, PathBuf};

use resxkit::Configuration;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "resxkit.toml";

/// Reads the configuration from `explicit`, or from `resxkit.toml` in `root` if present.
///
/// Missing fields keep their defaults; no file at all yields the default configuration.
pub fn load_configuration(root: &Path, explicit: Option<&Path>) -> Result<Configuration, String> {
    let path: PathBuf = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(format!("Configuration file does not exist: {}", path.display()));
            }
            path.to_path_buf()
        }
        None => {
            let candidate = root.join(CONFIG_FILE_NAME);
            if !candidate.is_file() {
                debug!("no {} in {}, using defaults", CONFIG_FILE_NAME, root.display());
                return Ok(Configuration::default());
            }
            candidate
        }
    };

    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    parse_configuration(&text).map_err(|e| format!("Invalid {}: {}", path.display(), e))
}

pub fn parse_configuration(text: &str) -> Result<Configuration, String> {
    toml::from_str(text).map_err(|e| e.to_string())
}
