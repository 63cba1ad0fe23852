//! Culture identity used as the map key for languages everywhere in the crate.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
    str::FromStr,
};

use isolang::Language;
use unic_langid::LanguageIdentifier;

use crate::error::Error;

/// Either the neutral (fallback) culture or one specific locale.
///
/// Ordering puts `Neutral` first, then specific cultures by their canonical tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CultureKey {
    Neutral,
    Specific(LanguageIdentifier),
}

impl CultureKey {
    /// Parses a culture tag; the empty string is the neutral culture.
    pub fn parse(tag: &str) -> Result<Self, Error> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(CultureKey::Neutral);
        }
        tag.replace('_', "-")
            .parse::<LanguageIdentifier>()
            .map(CultureKey::Specific)
            .map_err(|_| Error::InvalidCulture(tag.to_string()))
    }

    /// Interprets a file-name segment (`Strings.de-DE.resx` → `de-DE`) as a culture.
    ///
    /// The language subtag must be written in lower case and be registered in ISO 639
    /// (two letters in part 1, three letters in part 3), so words like `Designer`, `Ui` or
    /// `Web` in `Form1.Designer.resx` or `Strings.Ui.resx` are not mistaken for cultures.
    pub fn from_file_segment(segment: &str) -> Option<Self> {
        let language = segment.split(['-', '_']).next()?;
        if !language.bytes().all(|b| b.is_ascii_lowercase()) {
            return None;
        }
        let registered = language != "und"
            && match language.len() {
                2 => Language::from_639_1(language).is_some(),
                3 => Language::from_639_3(language).is_some(),
                _ => false,
            };
        if !registered {
            return None;
        }
        match CultureKey::parse(segment) {
            Ok(CultureKey::Specific(id)) => Some(CultureKey::Specific(id)),
            _ => None,
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, CultureKey::Neutral)
    }

    pub fn language_identifier(&self) -> Option<&LanguageIdentifier> {
        match self {
            CultureKey::Neutral => None,
            CultureKey::Specific(id) => Some(id),
        }
    }

    /// Canonical tag, empty for the neutral culture.
    pub fn tag(&self) -> String {
        match self {
            CultureKey::Neutral => String::new(),
            CultureKey::Specific(id) => id.to_string(),
        }
    }

    /// File-name suffix for this culture: `""` for neutral, `".de-DE"` otherwise.
    pub fn to_suffix(&self) -> String {
        match self {
            CultureKey::Neutral => String::new(),
            CultureKey::Specific(id) => format!(".{}", id),
        }
    }

    /// Human readable name used in messages and table headers.
    pub fn display_name(&self) -> String {
        match self {
            CultureKey::Neutral => "Neutral".to_string(),
            CultureKey::Specific(id) => id.to_string(),
        }
    }

    /// True if both keys share the same language subtag (`de` and `de-AT`).
    pub fn same_language(&self, other: &CultureKey) -> bool {
        match (self, other) {
            (CultureKey::Neutral, CultureKey::Neutral) => true,
            (CultureKey::Specific(a), CultureKey::Specific(b)) => a.language == b.language,
            _ => false,
        }
    }
}

impl Display for CultureKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for CultureKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CultureKey::parse(s)
    }
}

impl From<LanguageIdentifier> for CultureKey {
    fn from(value: LanguageIdentifier) -> Self {
        CultureKey::Specific(value)
    }
}

impl Ord for CultureKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CultureKey::Neutral, CultureKey::Neutral) => Ordering::Equal,
            (CultureKey::Neutral, CultureKey::Specific(_)) => Ordering::Less,
            (CultureKey::Specific(_), CultureKey::Neutral) => Ordering::Greater,
            (CultureKey::Specific(a), CultureKey::Specific(b)) => {
                a.to_string().cmp(&b.to_string())
            }
        }
    }
}

impl PartialOrd for CultureKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn culture(tag: &str) -> CultureKey {
        CultureKey::parse(tag).unwrap()
    }

    #[test]
    fn test_empty_tag_is_neutral() {
        assert_eq!(CultureKey::parse("").unwrap(), CultureKey::Neutral);
        assert!(CultureKey::parse("  ").unwrap().is_neutral());
    }

    #[test]
    fn test_underscore_tags_are_accepted() {
        assert_eq!(culture("de_DE"), culture("de-DE"));
        assert_eq!(culture("de-DE").tag(), "de-DE");
    }

    #[test]
    fn test_neutral_sorts_first() {
        let mut keys = vec![culture("fr"), CultureKey::Neutral, culture("de"), culture("de-AT")];
        keys.sort();
        assert_eq!(
            keys,
            vec![CultureKey::Neutral, culture("de"), culture("de-AT"), culture("fr")]
        );
    }

    #[test]
    fn test_file_segment_rules() {
        assert_eq!(CultureKey::from_file_segment("de"), Some(culture("de")));
        assert_eq!(CultureKey::from_file_segment("zh-Hans"), Some(culture("zh-Hans")));
        assert_eq!(CultureKey::from_file_segment("Designer"), None);
        assert_eq!(CultureKey::from_file_segment("Strings"), None);
        assert_eq!(CultureKey::from_file_segment("Form1"), None);
        assert_eq!(CultureKey::from_file_segment(""), None);
    }

    #[test]
    fn test_file_segment_requires_registered_language() {
        assert_eq!(CultureKey::from_file_segment("haw-US"), Some(culture("haw-US")));
        assert_eq!(CultureKey::from_file_segment("Ui"), None);
        assert_eq!(CultureKey::from_file_segment("Web"), None);
        assert_eq!(CultureKey::from_file_segment("ui"), None);
        assert_eq!(CultureKey::from_file_segment("xx-XX"), None);
        assert_eq!(CultureKey::from_file_segment("und"), None);
    }

    #[test]
    fn test_suffix_and_display() {
        assert_eq!(CultureKey::Neutral.to_suffix(), "");
        assert_eq!(culture("fr-CA").to_suffix(), ".fr-CA");
        assert_eq!(CultureKey::Neutral.display_name(), "Neutral");
        assert_eq!(culture("fr").to_string(), "fr");
    }

    #[test]
    fn test_invalid_tag() {
        assert!(matches!(
            CultureKey::parse("not a culture"),
            Err(Error::InvalidCulture(_))
        ));
    }

    #[test]
    fn test_same_language() {
        assert!(culture("de").same_language(&culture("de-CH")));
        assert!(!culture("de").same_language(&culture("fr")));
        assert!(!culture("de").same_language(&CultureKey::Neutral));
    }
}
