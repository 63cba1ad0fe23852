//! All error types for the resxkit crate.
//!
//! Load errors are scoped to the entity whose file failed, edit rejections are kept
//! apart from I/O failures, and save errors always carry the file path.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("CSV parse error: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load `{}`: {message}", path.display())]
    Load { path: PathBuf, message: String },

    #[error("duplicate or empty keys in `{}`: {}", path.display(), keys.join(", "))]
    DuplicateKeys { path: PathBuf, keys: Vec<String> },

    #[error("`{entity}` ({culture}) is not editable")]
    EditRejected { entity: String, culture: String },

    #[error("failed to save `{}`: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid culture `{0}`")]
    InvalidCulture(String),

    #[error("key `{0}` already exists")]
    KeyExists(String),

    #[error("key `{0}` not found")]
    KeyNotFound(String),

    #[error("invalid data: {0}")]
    DataMismatch(String),
}

impl Error {
    /// Creates a load error for the given file.
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wraps an I/O failure that happened while writing `path`.
    pub fn save(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Save {
            path: path.into(),
            source,
        }
    }

    pub fn is_edit_rejected(&self) -> bool {
        matches!(self, Error::EditRejected { .. })
    }

    /// True for every error raised while reading a resource document.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::Load { .. } | Error::DuplicateKeys { .. } | Error::XmlParse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_load_error_mentions_path() {
        let error = Error::load("a/Resources.resx", "missing root element");
        let display = error.to_string();
        assert!(display.contains("a/Resources.resx"));
        assert!(display.contains("missing root element"));
        assert!(error.is_load_error());
    }

    #[test]
    fn test_duplicate_keys_lists_keys() {
        let error = Error::DuplicateKeys {
            path: PathBuf::from("Strings.resx"),
            keys: vec!["Hello".to_string(), "".to_string()],
        };
        assert!(error.to_string().contains("Hello, "));
        assert!(error.is_load_error());
    }

    #[test]
    fn test_edit_rejected_is_distinguishable() {
        let error = Error::EditRejected {
            entity: "App/Resources".to_string(),
            culture: "de".to_string(),
        };
        assert!(error.is_edit_rejected());
        assert!(!Error::Io(io::Error::other("disk")).is_edit_rejected());
    }

    #[test]
    fn test_save_error_keeps_source() {
        let error = Error::save(
            "Strings.de.resx",
            io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        );
        assert!(error.to_string().contains("Strings.de.resx"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_error_debug() {
        let error = Error::KeyNotFound("test".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("KeyNotFound"));
        assert!(debug.contains("test"));
    }
}
