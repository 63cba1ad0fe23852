use resxkit::CultureKey;
use std::path::Path;
use unic_langid::LanguageIdentifier;

/// Validate the directory that is scanned for resources
pub fn validate_root_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", path.display()));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Validate file path exists and is readable
pub fn validate_file_path(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("File does not exist: {}", path.display()));
    }
    if !path.is_file() {
        return Err(format!("Path is not a file: {}", path.display()));
    }
    Ok(())
}

/// Validate output directory exists or can be created
pub fn validate_output_path(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        return Err(format!("Cannot create output directory: {}", e));
    }
    Ok(())
}

/// Validate a culture tag for a new language file.
///
/// The tag must be one that is recognised again as a culture suffix in resource file
/// names, so a registered lower-case ISO 639 language subtag is required.
pub fn validate_culture(tag: &str) -> Result<(), String> {
    if tag.is_empty() {
        return Err("Culture cannot be empty".to_string());
    }
    let invalid = || {
        format!(
            "Invalid culture: {}. Expected a BCP 47 language identifier such as de or fr-FR",
            tag
        )
    };
    let id = tag.parse::<LanguageIdentifier>().map_err(|_| invalid())?;
    if CultureKey::from_file_segment(&id.to_string()).is_none() {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_culture() {
        assert!(validate_culture("de").is_ok());
        assert!(validate_culture("zh-Hans-CN").is_ok());
        assert!(validate_culture("").is_err());
        assert!(validate_culture("designer").is_err());
        assert!(validate_culture("xx").is_err());
        assert!(validate_culture("fr-FR").is_ok());
        assert!(validate_culture("not a tag").is_err());
    }

    #[test]
    fn test_validate_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_root_dir(dir.path()).is_ok());
        assert!(validate_root_dir(&dir.path().join("missing")).is_err());
        assert!(validate_file_path(dir.path()).is_err());

        let nested = dir.path().join("out/table.tsv");
        assert!(validate_output_path(&nested).is_ok());
        assert!(dir.path().join("out").is_dir());
    }
}
