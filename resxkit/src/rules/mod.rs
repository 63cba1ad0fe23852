//! Per-entry translation rules.
//!
//! A rule compares the neutral value of an entry with the values of other cultures and
//! either complies or returns a message. [`ResourceTableEntryRules`] runs all enabled,
//! non-muted rules in a fixed order and collects every message.

mod punctuation;
mod string_format;
mod whitespace;

use std::{collections::BTreeSet, fmt};

pub use punctuation::{PunctuationLeadRule, PunctuationTailRule, normalize_punctuation};
pub use string_format::{StringFormatRule, format_signature};
pub use whitespace::{WhiteSpaceLeadRule, WhiteSpaceTailRule, whitespace_name};

use crate::configuration::Configuration;

pub const STRING_FORMAT: &str = "StringFormat";
pub const WHITE_SPACE_LEAD: &str = "WhiteSpaceLead";
pub const WHITE_SPACE_TAIL: &str = "WhiteSpaceTail";
pub const PUNCTUATION_LEAD: &str = "PunctuationLead";
pub const PUNCTUATION_TAIL: &str = "PunctuationTail";

/// A single validation rule.
pub trait ResourceTableEntryRule: Send + Sync {
    fn rule_id(&self) -> &'static str;

    /// Checks `values` against `neutral`. Empty values always comply.
    fn complies_to_rule(&self, neutral: Option<&str>, values: &[&str]) -> Result<(), String>;
}

/// The configured rule set.
pub struct ResourceTableEntryRules {
    rules: Vec<(Box<dyn ResourceTableEntryRule>, bool)>,
}

impl ResourceTableEntryRules {
    /// All built-in rules, enabled according to `configuration`.
    pub fn new(configuration: &Configuration) -> Self {
        let rules: Vec<Box<dyn ResourceTableEntryRule>> = vec![
            Box::new(StringFormatRule),
            Box::new(WhiteSpaceLeadRule),
            Box::new(WhiteSpaceTailRule),
            Box::new(PunctuationLeadRule),
            Box::new(PunctuationTailRule),
        ];
        Self {
            rules: rules
                .into_iter()
                .map(|rule| {
                    let enabled = configuration.is_rule_enabled(rule.rule_id());
                    (rule, enabled)
                })
                .collect(),
        }
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|(rule, _)| rule.rule_id())
    }

    pub fn is_enabled(&self, rule_id: &str) -> bool {
        self.rules
            .iter()
            .any(|(rule, enabled)| *enabled && rule.rule_id() == rule_id)
    }

    /// Runs every enabled rule not in `muted`; all failure messages are joined by newlines.
    pub fn complies_to_rules(
        &self,
        muted: &BTreeSet<String>,
        neutral: Option<&str>,
        values: &[&str],
    ) -> Result<(), String> {
        let messages: Vec<String> = self
            .rules
            .iter()
            .filter(|(rule, enabled)| *enabled && !muted.contains(rule.rule_id()))
            .filter_map(|(rule, _)| rule.complies_to_rule(neutral, values).err())
            .collect();

        if messages.is_empty() {
            Ok(())
        } else {
            Err(messages.join("\n"))
        }
    }
}

impl fmt::Debug for ResourceTableEntryRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.rules.iter().map(|(rule, enabled)| (rule.rule_id(), enabled)))
            .finish()
    }
}

/// Returns the neutral value if it is worth checking at all.
fn neutral_text(neutral: Option<&str>) -> Option<&str> {
    neutral.filter(|n| !n.is_empty())
}

/// Non-empty values only.
fn non_empty<'a>(values: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
    values.iter().copied().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_order_is_fixed() {
        let rules = ResourceTableEntryRules::new(&Configuration::default());
        assert_eq!(
            rules.rule_ids().collect::<Vec<_>>(),
            vec![
                STRING_FORMAT,
                WHITE_SPACE_LEAD,
                WHITE_SPACE_TAIL,
                PUNCTUATION_LEAD,
                PUNCTUATION_TAIL
            ]
        );
    }

    #[test]
    fn test_messages_are_collected() {
        let rules = ResourceTableEntryRules::new(&Configuration::default());
        let message = rules
            .complies_to_rules(&BTreeSet::new(), Some("{0}: "), &["Wert"])
            .unwrap_err();
        assert_eq!(message.lines().count(), 3);
    }

    #[test]
    fn test_muted_and_disabled_rules_are_skipped() {
        let configuration = Configuration::default().with_rule_enabled(STRING_FORMAT, false);
        let rules = ResourceTableEntryRules::new(&configuration);
        let muted: BTreeSet<String> = [PUNCTUATION_TAIL.to_string(), WHITE_SPACE_TAIL.to_string()]
            .into_iter()
            .collect();
        assert!(rules.complies_to_rules(&muted, Some("{0}: "), &["Wert"]).is_ok());
        assert!(!rules.is_enabled(STRING_FORMAT));
    }

    #[test]
    fn test_empty_values_comply() {
        let rules = ResourceTableEntryRules::new(&Configuration::default());
        assert!(rules.complies_to_rules(&BTreeSet::new(), Some("Hello:"), &[""]).is_ok());
        assert!(rules.complies_to_rules(&BTreeSet::new(), None, &["Bonjour."]).is_ok());
        assert!(rules.complies_to_rules(&BTreeSet::new(), Some(""), &["{3}"]).is_ok());
    }
}
