use resxkit::Configuration;
use resxkit::rules::{
    PUNCTUATION_LEAD, PUNCTUATION_TAIL, ResourceTableEntryRules, STRING_FORMAT, WHITE_SPACE_TAIL,
};
use std::collections::BTreeSet;

fn rules() -> ResourceTableEntryRules {
    ResourceTableEntryRules::new(&Configuration::default())
}

fn check(neutral: &str, value: &str) -> Result<(), String> {
    rules().complies_to_rules(&BTreeSet::new(), Some(neutral), &[value])
}

#[test]
fn test_punctuation_tail() {
    let error = check("Hello:", "Bonjour.").unwrap_err();
    assert!(error.contains("\":\""), "{error}");
    assert!(check("Hello:", "Bonjour:").is_ok());
    assert!(check("Hello:", "Bonjour：").is_ok());
}

#[test]
fn test_string_format_placeholders() {
    assert!(check("{0} of {1}", "{1} de {0}").is_ok());
    assert!(check("{0} of {1}", "{0}").is_err());
    assert!(check("{{literal}} {0}", "{0} {{x}}").is_ok());
    assert!(check("Hi ${name}", "Salut ${name}").is_ok());
    assert!(check("Hi ${name}", "Salut ${nom}").is_err());
}

#[test]
fn test_empty_values_always_comply() {
    assert!(check("Hello:", "").is_ok());
    assert!(rules().complies_to_rules(&BTreeSet::new(), Some(""), &["x."]).is_ok());
    assert!(rules().complies_to_rules(&BTreeSet::new(), None, &["x."]).is_ok());
}

#[test]
fn test_messages_are_collected_in_order() {
    let error = check("{0}: ", "x").unwrap_err();
    let lines: Vec<&str> = error.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Placeholders"));
    assert!(lines[1].starts_with("White space at the end"));
    assert!(lines[2].starts_with("Punctuation at the end"));
}

#[test]
fn test_muted_and_disabled_rules_are_skipped() {
    let muted = BTreeSet::from([PUNCTUATION_TAIL.to_string()]);
    assert!(rules().complies_to_rules(&muted, Some("Hello:"), &["Hallo"]).is_ok());

    let configuration = Configuration::default().with_rule_enabled(STRING_FORMAT, false);
    let rules = ResourceTableEntryRules::new(&configuration);
    assert!(!rules.is_enabled(STRING_FORMAT));
    assert!(rules.is_enabled(WHITE_SPACE_TAIL));
    assert!(rules.complies_to_rules(&BTreeSet::new(), Some("{0}"), &["x"]).is_ok());
}

#[test]
fn test_leading_punctuation() {
    let error = check("...loading", "chargement").unwrap_err();
    assert!(error.contains("start"), "{error}");
    assert!(rules().rule_ids().any(|id| id == PUNCTUATION_LEAD));
}
