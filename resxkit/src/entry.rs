//! One logical row of a resource entity: a key across all cultures.
//!
//! Values live in the entity's languages; the entry only caches state derived from
//! them (parsed comment metadata, rule results). The cache is refreshed by the entity
//! whenever one of its own mutators touches the entry.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::{Deserialize, Serialize};

use crate::{
    code_reference::CodeReference,
    comment::{CommentMetadata, TranslationState},
    culture::CultureKey,
    entity::ResourceEntity,
    language::ResourceLanguage,
    rules::ResourceTableEntryRules,
    snapshot::SnapshotItem,
};

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an entry. Survives reloads as long as the key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(u64);

impl EntryId {
    pub(crate) fn next() -> Self {
        EntryId(NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct ResourceTableEntry {
    id: EntryId,
    key: String,
    index: f64,
    metadata: BTreeMap<CultureKey, CommentMetadata>,
    rule_failures: BTreeMap<CultureKey, String>,
    snapshot: Option<BTreeMap<CultureKey, SnapshotItem>>,
    code_references: Option<Arc<[CodeReference]>>,
    validation_message: Option<String>,
}

impl ResourceTableEntry {
    pub(crate) fn new(key: impl Into<String>, index: f64) -> Self {
        Self {
            id: EntryId::next(),
            key: key.into(),
            index,
            metadata: BTreeMap::new(),
            rule_failures: BTreeMap::new(),
            snapshot: None,
            code_references: None,
            validation_message: None,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn index(&self) -> f64 {
        self.index
    }

    pub(crate) fn set_key(&mut self, key: String) {
        self.key = key;
    }

    pub(crate) fn set_index(&mut self, index: f64) {
        self.index = index;
    }

    pub(crate) fn set_validation_message(&mut self, message: Option<String>) {
        self.validation_message = message;
    }

    pub(crate) fn set_code_references(&mut self, references: Option<Arc<[CodeReference]>>) {
        self.code_references = references;
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: Option<BTreeMap<CultureKey, SnapshotItem>>) {
        self.snapshot = snapshot;
    }

    pub(crate) fn metadata(&self, culture: &CultureKey) -> CommentMetadata {
        self.metadata.get(culture).cloned().unwrap_or_default()
    }

    /// Recomputes comment metadata and rule results from the languages.
    pub(crate) fn refresh(
        &mut self,
        languages: &BTreeMap<CultureKey, ResourceLanguage>,
        rules: &ResourceTableEntryRules,
    ) {
        self.metadata = languages
            .iter()
            .filter_map(|(culture, language)| {
                language
                    .comment(&self.key)
                    .map(|comment| (culture.clone(), CommentMetadata::parse(comment)))
            })
            .collect();

        self.rule_failures.clear();
        let Some(neutral) = languages.get(&CultureKey::Neutral) else {
            return;
        };
        let neutral_value = neutral.value(&self.key);
        let muted = self
            .metadata
            .get(&CultureKey::Neutral)
            .map(|m| m.muted_rules.clone())
            .unwrap_or_default();

        for (culture, language) in languages.iter().filter(|(c, _)| !c.is_neutral()) {
            if self.is_invariant(culture) {
                continue;
            }
            let value = language.value(&self.key).unwrap_or_default();
            if let Err(message) = rules.complies_to_rules(&muted, neutral_value, &[value]) {
                self.rule_failures.insert(culture.clone(), message);
            }
        }
    }

    fn is_invariant(&self, culture: &CultureKey) -> bool {
        let flagged = |c: &CultureKey| self.metadata.get(c).is_some_and(|m| m.is_invariant);
        flagged(culture) || flagged(&CultureKey::Neutral)
    }
}

/// Read access to one entry together with the entity that holds its values.
#[derive(Debug, Clone, Copy)]
pub struct EntryView<'a> {
    entity: &'a ResourceEntity,
    entry: &'a ResourceTableEntry,
}

impl<'a> EntryView<'a> {
    pub(crate) fn new(entity: &'a ResourceEntity, entry: &'a ResourceTableEntry) -> Self {
        Self { entity, entry }
    }

    pub fn id(&self) -> EntryId {
        self.entry.id
    }

    pub fn key(&self) -> &'a str {
        &self.entry.key
    }

    pub fn index(&self) -> f64 {
        self.entry.index
    }

    pub fn entity(&self) -> &'a ResourceEntity {
        self.entity
    }

    pub fn value(&self, culture: &CultureKey) -> Option<&'a str> {
        self.entity.language(culture)?.value(&self.entry.key)
    }

    /// Comment text without metadata tokens.
    pub fn comment(&self, culture: &CultureKey) -> Option<&'a str> {
        self.entry
            .metadata
            .get(culture)
            .map(|m| m.text.as_str())
            .filter(|text| !text.is_empty())
    }

    /// Comment as stored in the document, tokens included.
    pub fn raw_comment(&self, culture: &CultureKey) -> Option<&'a str> {
        self.entity.language(culture)?.comment(&self.entry.key)
    }

    /// Invariant in this culture, or in all cultures via the neutral comment.
    pub fn is_invariant(&self, culture: &CultureKey) -> bool {
        self.entry.is_invariant(culture)
    }

    pub fn translation_state(&self, culture: &CultureKey) -> Option<TranslationState> {
        self.entry
            .metadata
            .get(culture)
            .and_then(|m| m.translation_state)
    }

    pub fn muted_rules(&self) -> BTreeSet<String> {
        self.entry
            .metadata
            .get(&CultureKey::Neutral)
            .map(|m| m.muted_rules.clone())
            .unwrap_or_default()
    }

    pub fn is_rule_muted(&self, rule_id: &str) -> bool {
        self.entry
            .metadata
            .get(&CultureKey::Neutral)
            .is_some_and(|m| m.is_rule_muted(rule_id))
    }

    /// Rule messages for `culture`, newline separated.
    pub fn rule_failure(&self, culture: &CultureKey) -> Option<&'a str> {
        self.entry.rule_failures.get(culture).map(String::as_str)
    }

    pub fn has_rule_failures(&self) -> bool {
        !self.entry.rule_failures.is_empty()
    }

    pub fn has_snapshot(&self) -> bool {
        self.entry.snapshot.is_some()
    }

    /// The value captured in the loaded snapshot, if any.
    pub fn snapshot_value(&self, culture: &CultureKey) -> Option<&'a str> {
        self.entry
            .snapshot
            .as_ref()?
            .get(culture)?
            .value
            .as_deref()
    }

    /// True if value or comment changed since the loaded snapshot.
    pub fn differs_from_snapshot(&self, culture: &CultureKey) -> bool {
        let Some(snapshot) = &self.entry.snapshot else {
            return false;
        };
        let item = snapshot.get(culture).cloned().unwrap_or_default();
        let same = |a: Option<&str>, b: Option<&str>| a.unwrap_or("") == b.unwrap_or("");
        !same(item.value.as_deref(), self.value(culture))
            || !same(item.comment.as_deref(), self.raw_comment(culture))
    }

    /// Human readable notes for one cell: rule failures and snapshot differences.
    pub fn annotations(&self, culture: &CultureKey) -> Vec<String> {
        let mut annotations: Vec<String> = self
            .rule_failure(culture)
            .map(|message| message.lines().map(str::to_string).collect())
            .unwrap_or_default();
        if self.differs_from_snapshot(culture) {
            annotations.push(format!(
                "Snapshot: {}",
                self.snapshot_value(culture).unwrap_or_default()
            ));
        }
        annotations
    }

    /// `None` until a code reference scan delivered results for this entry.
    pub fn code_references(&self) -> Option<&'a [CodeReference]> {
        self.entry.code_references.as_deref()
    }

    /// Message left by the last rejected rename.
    pub fn validation_message(&self) -> Option<&'a str> {
        self.entry.validation_message.as_deref()
    }
}
