use super::{ResourceTableEntryRule, WHITE_SPACE_LEAD, WHITE_SPACE_TAIL, neutral_text, non_empty};

/// Unicode name of common whitespace characters, `U+XXXX` for the rest.
pub fn whitespace_name(c: char) -> String {
    let name = match c {
        ' ' => "SPACE",
        '\t' => "HORIZONTAL TAB",
        '\n' => "LINE FEED",
        '\r' => "CARRIAGE RETURN",
        '\u{0B}' => "VERTICAL TAB",
        '\u{0C}' => "FORM FEED",
        '\u{85}' => "NEXT LINE",
        '\u{A0}' => "NO-BREAK SPACE",
        '\u{2002}' => "EN SPACE",
        '\u{2003}' => "EM SPACE",
        '\u{2009}' => "THIN SPACE",
        '\u{200A}' => "HAIR SPACE",
        '\u{2028}' => "LINE SEPARATOR",
        '\u{2029}' => "PARAGRAPH SEPARATOR",
        '\u{202F}' => "NARROW NO-BREAK SPACE",
        '\u{3000}' => "IDEOGRAPHIC SPACE",
        other => return format!("U+{:04X}", other as u32),
    };
    name.to_string()
}

fn leading(value: &str) -> String {
    value.chars().take_while(|c| c.is_whitespace()).collect()
}

fn trailing(value: &str) -> String {
    let run: Vec<char> = value.chars().rev().take_while(|c| c.is_whitespace()).collect();
    run.into_iter().rev().collect()
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
            "White space at the {} of the text does not match the neutral text. Expected no white space.",
            position
        ))
    } else {
        let names: Vec<String> = expected.chars().map(whitespace_name).collect();
        Err(format!(
            "White space at the {} of the text does not match the neutral text. Expected {}.",
            position,
            names.join(", ")
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WhiteSpaceLeadRule;

impl ResourceTableEntryRule for WhiteSpaceLeadRule {
    fn rule_id(&self) -> &'static str {
        WHITE_SPACE_LEAD
    }

    fn complies_to_rule(&self, neutral: Option<&str>, values: &[&str]) -> Result<(), String> {
        check(neutral, values, leading, "start")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WhiteSpaceTailRule;

impl ResourceTableEntryRule for WhiteSpaceTailRule {
    fn rule_id(&self) -> &'static str {
        WHITE_SPACE_TAIL
    }

    fn complies_to_rule(&self, neutral: Option<&str>, values: &[&str]) -> Result<(), String> {
        check(neutral, values, trailing, "end")
    }
}
