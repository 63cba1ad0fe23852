//! All supported resource document formats.
//!
//! This module provides the [`ResourceFormat`] enum, which knows how a physical file
//! name maps to an entity (base name, grouping directory, culture) and how the string
//! nodes of each document are laid out ([`NodeSchema`]).

pub mod resx;
pub mod xliff;

use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    culture::CultureKey,
    error::Error,
    xml::{XmlDocument, XmlElement, XmlNode},
};

/// Represents all supported resource formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceFormat {
    /// .NET `.resx` files, culture encoded as `Name.de-DE.resx`.
    Resx,
    /// UWP `.resw` files, culture encoded in the parent directory (`de-DE/Resources.resw`).
    Resw,
    /// XLIFF 1.2 files, culture encoded as `Name.de-DE.xlf`.
    Xliff,
}

/// What a file name says about the entity it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameInfo {
    pub base_name: String,
    pub culture: CultureKey,
    /// Directory used to group the file with its siblings.
    pub directory: PathBuf,
}

impl Display for ResourceFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceFormat::Resx => write!(f, "resx"),
            ResourceFormat::Resw => write!(f, "resw"),
            ResourceFormat::Xliff => write!(f, "xliff"),
        }
    }
}

impl FromStr for ResourceFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match s.as_str() {
            "resx" => Ok(ResourceFormat::Resx),
            "resw" => Ok(ResourceFormat::Resw),
            "xlf" | "xliff" => Ok(ResourceFormat::Xliff),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl ResourceFormat {
    /// Detects the format from a file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }

    /// Returns the file extension written for new files of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ResourceFormat::Resx => "resx",
            ResourceFormat::Resw => "resw",
            ResourceFormat::Xliff => "xlf",
        }
    }

    /// Layout of the string nodes in a document holding `culture`.
    pub fn schema(&self, culture: &CultureKey) -> NodeSchema {
        match self {
            ResourceFormat::Resx | ResourceFormat::Resw => resx::SCHEMA,
            ResourceFormat::Xliff if culture.is_neutral() => xliff::SOURCE_SCHEMA,
            ResourceFormat::Xliff => xliff::TARGET_SCHEMA,
        }
    }

    /// Splits a path into base name, culture and grouping directory.
    ///
    /// `neutral_language` lets a `.resw` directory named after the project's neutral
    /// language count as the neutral culture.
    pub fn parse_file_name(
        &self,
        path: &Path,
        neutral_language: Option<&CultureKey>,
    ) -> Option<FileNameInfo> {
        let stem = path.file_stem()?.to_str()?;
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();

        match self {
            ResourceFormat::Resx | ResourceFormat::Xliff => {
                let (base_name, culture) = match stem.rsplit_once('.') {
                    Some((base, suffix)) if !base.is_empty() => {
                        match CultureKey::from_file_segment(suffix) {
                            Some(culture) => (base.to_string(), culture),
                            None => (stem.to_string(), CultureKey::Neutral),
                        }
                    }
                    _ => (stem.to_string(), CultureKey::Neutral),
                };
                Some(FileNameInfo {
                    base_name,
                    culture,
                    directory: parent,
                })
            }
            ResourceFormat::Resw => {
                let culture = parent
                    .file_name()
                    .and_then(|d| d.to_str())
                    .and_then(CultureKey::from_file_segment);
                match culture {
                    Some(culture) => {
                        let directory = parent.parent().map(Path::to_path_buf).unwrap_or_default();
                        let culture = if Some(&culture) == neutral_language {
                            CultureKey::Neutral
                        } else {
                            culture
                        };
                        Some(FileNameInfo {
                            base_name: stem.to_string(),
                            culture,
                            directory,
                        })
                    }
                    None => Some(FileNameInfo {
                        base_name: stem.to_string(),
                        culture: CultureKey::Neutral,
                        directory: parent,
                    }),
                }
            }
        }
    }

    /// Path of the file holding `culture` for an entity in `directory`.
    pub fn file_path(&self, directory: &Path, base_name: &str, culture: &CultureKey) -> PathBuf {
        match self {
            ResourceFormat::Resx | ResourceFormat::Xliff => directory.join(format!(
                "{}{}.{}",
                base_name,
                culture.to_suffix(),
                self.extension()
            )),
            ResourceFormat::Resw => match culture {
                CultureKey::Neutral => directory.join(format!("{}.resw", base_name)),
                CultureKey::Specific(id) => directory
                    .join(id.to_string())
                    .join(format!("{}.resw", base_name)),
            },
        }
    }

    /// Content of a new, empty document for `culture`.
    pub fn empty_document(&self, culture: &CultureKey, source_language: &str) -> String {
        match self {
            ResourceFormat::Resx | ResourceFormat::Resw => resx::EMPTY_DOCUMENT.to_string(),
            ResourceFormat::Xliff => xliff::empty_document(culture, source_language),
        }
    }
}

/// Describes where the string nodes live in a document and how they are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSchema {
    /// Element path below the root that holds the items.
    pub container: &'static [&'static str],
    pub item: &'static str,
    pub key_attribute: &'static str,
    pub value: &'static str,
    pub comment: &'static str,
    /// Whether a missing value element makes the document invalid.
    pub value_required: bool,
    /// Attributes that mark an item as a non-string resource.
    pub typed_attributes: &'static [&'static str],
}

impl NodeSchema {
    pub fn container<'a>(&self, document: &'a XmlDocument) -> Option<&'a XmlElement> {
        let mut element = document.root()?;
        for name in self.container {
            element = element.element(name)?;
        }
        Some(element)
    }

    pub fn container_mut<'a>(&self, document: &'a mut XmlDocument) -> Option<&'a mut XmlElement> {
        let mut element = document.root_mut()?;
        for name in self.container {
            element = element.element_mut(name)?;
        }
        Some(element)
    }

    /// True for item elements that hold a plain string resource.
    pub fn is_string_item(&self, element: &XmlElement) -> bool {
        if !element.is(self.item) {
            return false;
        }
        self.typed_attributes.iter().all(|attr| match element.attribute(attr) {
            None => true,
            Some(value) => value.starts_with("System.String"),
        })
    }

    pub fn key_of(&self, element: &XmlElement) -> Option<String> {
        element.attribute(self.key_attribute)
    }

    /// Positions (in the container's children) of all string items, in document order.
    pub fn item_positions(&self, container: &XmlElement) -> Vec<usize> {
        container
            .children()
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                XmlNode::Element(e) if self.is_string_item(e) => Some(i),
                _ => None,
            })
            .collect()
    }

    /// Position of the string item carrying `key`.
    pub fn find_item(&self, container: &XmlElement, key: &str) -> Option<usize> {
        self.item_positions(container).into_iter().find(|&i| {
            container.children()[i]
                .as_element()
                .and_then(|e| self.key_of(e))
                .is_some_and(|k| k == key)
        })
    }

    /// Builds a fresh item element, indented for a container whose items use `indent`.
    pub fn new_item(&self, key: &str, indent: &str) -> XmlElement {
        let mut item = XmlElement::new(self.item).with_attribute(self.key_attribute, key);
        if self.value_required {
            item = item.with_attribute("xml:space", "preserve");
        }
        let children = item.children_mut();
        children.push(XmlNode::whitespace(&format!("{}  ", indent)));
        children.push(XmlNode::Element(XmlElement::new(self.value).with_text("")));
        children.push(XmlNode::whitespace(indent));
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn culture(tag: &str) -> CultureKey {
        CultureKey::parse(tag).unwrap()
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(ResourceFormat::from_str("resx").unwrap(), ResourceFormat::Resx);
        assert_eq!(ResourceFormat::from_str(".RESW").unwrap(), ResourceFormat::Resw);
        assert_eq!(ResourceFormat::from_str("xlf").unwrap(), ResourceFormat::Xliff);
        assert!(ResourceFormat::from_str("strings").is_err());
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            ResourceFormat::from_path(Path::new("a/Resources.de.RESX")),
            Some(ResourceFormat::Resx)
        );
        assert_eq!(ResourceFormat::from_path(Path::new("a/Program.cs")), None);
    }

    #[test]
    fn test_resx_file_names() {
        let info = ResourceFormat::Resx
            .parse_file_name(Path::new("src/Properties/Resources.de-DE.resx"), None)
            .unwrap();
        assert_eq!(info.base_name, "Resources");
        assert_eq!(info.culture, culture("de-DE"));
        assert_eq!(info.directory, PathBuf::from("src/Properties"));

        let info = ResourceFormat::Resx
            .parse_file_name(Path::new("src/Form1.Designer.resx"), None)
            .unwrap();
        assert_eq!(info.base_name, "Form1.Designer");
        assert!(info.culture.is_neutral());

        let info = ResourceFormat::Resx
            .parse_file_name(Path::new("My.App.Strings.resx"), None)
            .unwrap();
        assert_eq!(info.base_name, "My.App.Strings");
        assert!(info.culture.is_neutral());
    }

    #[test]
    fn test_resw_file_names() {
        let neutral = culture("en-US");
        let info = ResourceFormat::Resw
            .parse_file_name(Path::new("App/Strings/de-DE/Resources.resw"), Some(&neutral))
            .unwrap();
        assert_eq!(info.culture, culture("de-DE"));
        assert_eq!(info.directory, PathBuf::from("App/Strings"));

        let info = ResourceFormat::Resw
            .parse_file_name(Path::new("App/Strings/en-US/Resources.resw"), Some(&neutral))
            .unwrap();
        assert!(info.culture.is_neutral());
        assert_eq!(info.directory, PathBuf::from("App/Strings"));
    }

    #[test]
    fn test_file_path_for_culture() {
        assert_eq!(
            ResourceFormat::Resx.file_path(Path::new("dir"), "Strings", &culture("fr")),
            PathBuf::from("dir/Strings.fr.resx")
        );
        assert_eq!(
            ResourceFormat::Resw.file_path(Path::new("dir"), "Resources", &culture("fr")),
            PathBuf::from("dir/fr/Resources.resw")
        );
        assert_eq!(
            ResourceFormat::Xliff.file_path(Path::new("dir"), "Messages", &CultureKey::Neutral),
            PathBuf::from("dir/Messages.xlf")
        );
    }

    #[test]
    fn test_typed_data_is_not_a_string_item() {
        let schema = ResourceFormat::Resx.schema(&CultureKey::Neutral);
        let typed = XmlElement::new("data")
            .with_attribute("name", "Icon")
            .with_attribute("type", "System.Drawing.Icon, System.Drawing");
        let plain = XmlElement::new("data").with_attribute("name", "Hello");
        let explicit = XmlElement::new("data")
            .with_attribute("name", "Hello")
            .with_attribute("type", "System.String, mscorlib");
        assert!(!schema.is_string_item(&typed));
        assert!(schema.is_string_item(&plain));
        assert!(schema.is_string_item(&explicit));
    }
}
