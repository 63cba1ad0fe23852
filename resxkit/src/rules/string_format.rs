use lazy_static::lazy_static;
use regex::Regex;

use super::{ResourceTableEntryRule, STRING_FORMAT, neutral_text, non_empty};

lazy_static! {
    static ref INDEXED_PLACEHOLDER: Regex = Regex::new(r"\{(\d+)(,-?\d+)?(:[^}]*)?\}").unwrap();
    static ref NAMED_PLACEHOLDER: Regex = Regex::new(r"\$\{([^{}]+)\}").unwrap();
}

/// Bit flags of the indexed placeholders used by `value`, plus the sorted list of its
/// named `${name}` placeholders.
///
/// Escaped braces (`{{`, `}}`) are ignored. Indices above 63 do not fit the flags and
/// are not tracked.
pub fn format_signature(value: &str) -> (u64, String) {
    let unescaped = value.replace("{{", "").replace("}}", "");

    let flags = INDEXED_PLACEHOLDER
        .captures_iter(&unescaped)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .filter_map(|index| 1u64.checked_shl(index))
        .fold(0, |acc, bit| acc | bit);

    let mut names: Vec<&str> = NAMED_PLACEHOLDER
        .captures_iter(value)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    names.sort_unstable();
    names.dedup();

    (flags, names.join("|"))
}

/// All translations must use the same placeholders as the neutral text.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringFormatRule;

impl ResourceTableEntryRule for StringFormatRule {
    fn rule_id(&self) -> &'static str {
        STRING_FORMAT
    }

    fn complies_to_rule(&self, neutral: Option<&str>, values: &[&str]) -> Result<(), String> {
        let Some(neutral) = neutral_text(neutral) else {
            return Ok(());
        };
        let expected = format_signature(neutral);
        if non_empty(values).all(|value| format_signature(value) == expected) {
            Ok(())
        } else {
            Err("Placeholders in the text do not match the neutral text.".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reordered_placeholders_comply() {
        assert!(StringFormatRule.complies_to_rule(Some("{0} of {1}"), &["{1} de {0}"]).is_ok());
        assert!(StringFormatRule.complies_to_rule(Some("{0} of {1}"), &["{0}"]).is_err());
    }

    #[test]
    fn test_alignment_and_format_are_indexed() {
        assert_eq!(format_signature("{0,-5} {2:N2}").0, 0b101);
        assert_eq!(format_signature("{{0}} literal").0, 0);
    }

    #[test]
    fn test_named_placeholders() {
        assert_eq!(format_signature("${user} and ${count}").1, "count|user");
        assert!(
            StringFormatRule
                .complies_to_rule(Some("Hi ${user}"), &["Hallo ${name}"])
                .is_err()
        );
        assert!(
            StringFormatRule
                .complies_to_rule(Some("Hi ${user}"), &["${user}, hallo"])
                .is_ok()
        );
    }
}
