//! Explicit, typed configuration passed to every component that needs it.
//!
//! The struct is serde-enabled; storing it is left to the host (the CLI reads a TOML file).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::culture::CultureKey;

/// How duplicate or empty keys found while loading a document are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyHandling {
    /// Rename offenders to `Key_Duplicate[n]` / `_Empty[n]`.
    #[default]
    Rename,
    /// Refuse to load the document.
    Fail,
}

/// Key ordering used when sorting the nodes of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortingComparison {
    /// Never reorder.
    None,
    Ordinal,
    #[default]
    OrdinalIgnoreCase,
}

impl SortingComparison {
    pub fn compare(&self, a: &str, b: &str) -> std::cmp::Ordering {
        match self {
            SortingComparison::None => std::cmp::Ordering::Equal,
            SortingComparison::Ordinal => a.cmp(b),
            SortingComparison::OrdinalIgnoreCase => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
        }
    }
}

/// One code-reference pattern: which files it applies to and what to look for.
///
/// `expression` is a regular expression in which `$Key` and `$File` are replaced by the
/// resource key and the resource file's base name; an empty expression means a plain
/// substring search for the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeReferenceConfigItem {
    pub extensions: String,
    pub expression: String,
    pub is_case_sensitive: bool,
    pub single_line_comment: String,
}

impl Default for CodeReferenceConfigItem {
    fn default() -> Self {
        Self {
            extensions: String::new(),
            expression: String::new(),
            is_case_sensitive: true,
            single_line_comment: String::new(),
        }
    }
}

impl CodeReferenceConfigItem {
    pub fn new(extensions: &str, expression: &str, is_case_sensitive: bool, comment: &str) -> Self {
        Self {
            extensions: extensions.to_string(),
            expression: expression.to_string(),
            is_case_sensitive,
            single_line_comment: comment.to_string(),
        }
    }

    /// Extensions as lower-case `.ext` strings; separators are `,`, `;` and whitespace.
    pub fn parse_extensions(&self) -> Vec<String> {
        self.extensions
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| format!(".{}", e.trim_start_matches('.').to_ascii_lowercase()))
            .collect()
    }

    pub fn applies_to(&self, extension: &str) -> bool {
        self.parse_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

/// Default patterns for the languages a .NET solution usually contains.
pub fn default_code_references() -> Vec<CodeReferenceConfigItem> {
    vec![
        CodeReferenceConfigItem::new(".cs", r"\W(?:$File\.)?($Key)\W", true, "//"),
        CodeReferenceConfigItem::new(".xaml", r"StringResourceKey\.($Key)\W", true, ""),
        CodeReferenceConfigItem::new(".xaml", r"\W(?:$File\.)?($Key)\W", true, ""),
        CodeReferenceConfigItem::new(".cshtml,.razor", r"\W(?:$File\.)?($Key)\W", true, "//"),
        CodeReferenceConfigItem::new(".vb", r"\W(?:$File\.)?($Key)\W", false, "'"),
        CodeReferenceConfigItem::new(".cpp,.c,.hxx,.h", r"\W(?:$File::)?($Key)\W", true, "//"),
        CodeReferenceConfigItem::new(
            ".aspx,.ascx",
            r"<%\$\s+Resources:\s*$File\s*,\s*($Key)\s*%>",
            true,
            "",
        ),
        CodeReferenceConfigItem::new(".ts,.js", r"\W(?:$File\.)?($Key)\W", true, "//"),
    ]
}

/// Settings consumed by the merge engine, the rules and the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub duplicate_key_handling: DuplicateKeyHandling,
    /// Culture of the neutral files (also used as XLIFF source language).
    pub neutral_resources_language: Option<String>,
    /// Drop non-neutral nodes that end up with neither text nor comment.
    pub remove_empty_entries: bool,
    pub resx_sorting_comparison: SortingComparison,
    pub sort_file_content_on_save: bool,
    /// Rule id → enabled. Rules missing here are enabled.
    pub rules: BTreeMap<String, bool>,
    pub code_references: Vec<CodeReferenceConfigItem>,
    /// Regular expression on the project-relative path of files to ignore.
    pub file_exclusion_filter: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            duplicate_key_handling: DuplicateKeyHandling::default(),
            neutral_resources_language: None,
            remove_empty_entries: true,
            resx_sorting_comparison: SortingComparison::default(),
            sort_file_content_on_save: false,
            rules: BTreeMap::new(),
            code_references: default_code_references(),
            file_exclusion_filter: None,
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_key_handling(mut self, handling: DuplicateKeyHandling) -> Self {
        self.duplicate_key_handling = handling;
        self
    }

    pub fn with_neutral_resources_language(mut self, language: Option<String>) -> Self {
        self.neutral_resources_language = language;
        self
    }

    pub fn with_remove_empty_entries(mut self, remove: bool) -> Self {
        self.remove_empty_entries = remove;
        self
    }

    pub fn with_code_references(mut self, items: Vec<CodeReferenceConfigItem>) -> Self {
        self.code_references = items;
        self
    }

    pub fn with_rule_enabled(mut self, rule_id: &str, enabled: bool) -> Self {
        self.rules.insert(rule_id.to_string(), enabled);
        self
    }

    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.rules.get(rule_id).copied().unwrap_or(true)
    }

    /// The configured neutral language as a specific culture, if it parses.
    pub fn neutral_culture(&self) -> Option<CultureKey> {
        let tag = self.neutral_resources_language.as_deref()?;
        match CultureKey::parse(tag) {
            Ok(culture) if !culture.is_neutral() => Some(culture),
            Ok(_) => None,
            Err(e) => {
                warn!("ignoring neutral resources language: {}", e);
                None
            }
        }
    }

    /// Source language written into new XLIFF documents.
    pub fn source_language(&self) -> String {
        self.neutral_culture()
            .map(|c| c.tag())
            .unwrap_or_else(|| "en".to_string())
    }
}
