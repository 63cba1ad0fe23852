use lazy_static::lazy_static;
use regex::Regex;

use super::{PUNCTUATION_LEAD, PUNCTUATION_TAIL, ResourceTableEntryRule, neutral_text, non_empty};

/// Maps locale-specific punctuation to its ASCII counterpart.
pub fn normalize_punctuation(c: char) -> char {
    match c {
        '，' | '、' | '､' | '،' | '՝' => ',',
        '。' | '．' | '｡' | '։' | '।' | '॥' => '.',
        '：' => ':',
        '；' | '؛' => ';',
        '！' | '՜' => '!',
        '？' | '؟' | '՞' => '?',
        '‐' | '‑' | '‒' | '–' | '—' | '―' | '－' => '-',
        other => other,
    }
}

lazy_static! {
    static ref PUNCTUATION: Regex = Regex::new(r"^[\p{Po}\p{Pd}]$").unwrap();
}

/// Other punctuation and dashes considered by the rules. Quotes, `#`, `&` and inverted
/// marks are not.
fn is_punctuation(c: char) -> bool {
    if matches!(c, '"' | '\'' | '#' | '&' | '¡' | '¿') {
        return false;
    }
    let mut buffer = [0; 4];
    PUNCTUATION.is_match(c.encode_utf8(&mut buffer)) || normalize_punctuation(c) != c
}

fn leading(value: &str) -> String {
    value
        .trim()
        .chars()
        .take_while(|c| is_punctuation(*c))
        .map(normalize_punctuation)
        .collect()
}

fn trailing(value: &str) -> String {
    let mut run: Vec<char> = value
        .trim()
        .chars()
        .rev()
        .take_while(|c| is_punctuation(*c))
        .map(normalize_punctuation)
        .collect();
    run.reverse();
    run.into_iter().collect()
}

fn check(
    neutral: Option<&str>,
    values: &[&str],
    extract: fn(&str) -> String,
    position: &str,
) -> Result<(), String> {
    let Some(neutral) = neutral_text(neutral) else {
        return Ok(());
    };
    let expected = extract(neutral);
    if non_empty(values).all(|value| extract(value) == expected) {
        return Ok(());
    }
    if expected.is_empty() {
        Err(format!(
            "Punctuation at the {} of the text does not match the neutral text. Expected no punctuation.",
            position
        ))
    } else {
        Err(format!(
            "Punctuation at the {} of the text does not match the neutral text. Expected \"{}\".",
            position, expected
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PunctuationLeadRule;

impl ResourceTableEntryRule for PunctuationLeadRule {
    fn rule_id(&self) -> &'static str {
        PUNCTUATION_LEAD
    }

    fn complies_to_rule(&self, neutral: Option<&str>, values: &[&str]) -> Result<(), String> {
        check(neutral, values, leading, "start")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PunctuationTailRule;

impl ResourceTableEntryRule for PunctuationTailRule {
    fn rule_id(&self) -> &'static str {
        PUNCTUATION_TAIL
    }

    fn complies_to_rule(&self, neutral: Option<&str>, values: &[&str]) -> Result<(), String> {
        check(neutral, values, trailing, "end")
    }
}
