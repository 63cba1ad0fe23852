//! Metadata tokens embedded in resource comments.
//!
//! A comment may carry `@Invariant`, `@State(New|NeedsReview|Approved)` and any number of
//! `@MutedRule(Id)` tokens in front of its free text. Tokens are stripped when parsing and
//! written back first, so the free text itself survives untouched.

use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
    str::FromStr,
};

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::Error;

const INVARIANT_TOKEN: &str = "@Invariant";

lazy_static! {
    static ref TOKEN_REGEX: Regex =
        Regex::new(r"\B@Invariant\b\s?|\B@State\((\w*)\)\s?|\B@MutedRule\((\w*)\)\s?")
            .unwrap();
}

/// Review state of one translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TranslationState {
    New,
    NeedsReview,
    Approved,
}

impl Display for TranslationState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslationState::New => write!(f, "New"),
            TranslationState::NeedsReview => write!(f, "NeedsReview"),
            TranslationState::Approved => write!(f, "Approved"),
        }
    }
}

impl FromStr for TranslationState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(TranslationState::New),
            "NeedsReview" => Ok(TranslationState::NeedsReview),
            "Approved" => Ok(TranslationState::Approved),
            other => Err(Error::DataMismatch(format!(
                "unknown translation state `{}`",
                other
            ))),
        }
    }
}

/// Parsed form of a resource comment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentMetadata {
    /// Free text with all recognized tokens removed.
    pub text: String,
    pub is_invariant: bool,
    pub translation_state: Option<TranslationState>,
    pub muted_rules: BTreeSet<String>,
}

impl CommentMetadata {
    pub fn parse(comment: &str) -> Self {
        let mut metadata = CommentMetadata::default();
        let text = TOKEN_REGEX.replace_all(comment, |caps: &Captures| {
            if let Some(state) = caps.get(1) {
                match state.as_str().parse() {
                    Ok(state) => metadata.translation_state = Some(state),
                    // Unknown states stay part of the text.
                    Err(_) => return caps[0].to_string(),
                }
            } else if let Some(rule) = caps.get(2) {
                if rule.as_str().is_empty() {
                    return caps[0].to_string();
                }
                metadata.muted_rules.insert(rule.as_str().to_string());
            } else {
                metadata.is_invariant = true;
            }
            String::new()
        });
        metadata.text = text.into_owned();
        metadata
    }

    pub fn has_tokens(&self) -> bool {
        self.is_invariant || self.translation_state.is_some() || !self.muted_rules.is_empty()
    }

    /// Writes the tokens followed by the free text.
    pub fn serialize(&self) -> String {
        let mut tokens = Vec::new();
        if self.is_invariant {
            tokens.push(INVARIANT_TOKEN.to_string());
        }
        if let Some(state) = self.translation_state {
            tokens.push(format!("@State({})", state));
        }
        for rule in &self.muted_rules {
            tokens.push(format!("@MutedRule({})", rule));
        }

        if tokens.is_empty() {
            return self.text.clone();
        }
        let mut out = tokens.join(" ");
        if !self.text.is_empty() {
            out.push(' ');
            out.push_str(&self.text);
        }
        out
    }

    pub fn is_rule_muted(&self, rule_id: &str) -> bool {
        self.muted_rules.contains(rule_id)
    }
}
