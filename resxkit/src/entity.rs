//! The logical resource group: one neutral file plus its culture variants.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    fmt::{Display, Formatter},
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    changes::ResourceChange,
    comment::{CommentMetadata, TranslationState},
    context::ResourceContext,
    culture::CultureKey,
    entry::{EntryId, EntryView, ResourceTableEntry},
    error::Error,
    formats::ResourceFormat,
    language::ResourceLanguage,
    project_file::{ProjectFile, TextEncoding},
    snapshot::EntitySnapshot,
};

/// (project, base name, directory), compared case-insensitively.
#[derive(Debug, Clone)]
pub struct EntityIdentity {
    project_name: String,
    base_name: String,
    directory_name: String,
    folded: (String, String, String),
}

impl EntityIdentity {
    pub fn new(
        project_name: impl Into<String>,
        base_name: impl Into<String>,
        directory_name: impl Into<String>,
    ) -> Self {
        let project_name = project_name.into();
        let base_name = base_name.into();
        let directory_name = directory_name.into().replace('\\', "/");
        let folded = (
            project_name.to_lowercase(),
            base_name.to_lowercase(),
            directory_name.to_lowercase(),
        );
        Self {
            project_name,
            base_name,
            directory_name,
            folded,
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Project-relative directory, `/`-separated.
    pub fn directory_name(&self) -> &str {
        &self.directory_name
    }
}

impl PartialEq for EntityIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for EntityIdentity {}

impl Hash for EntityIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl Ord for EntityIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl PartialOrd for EntityIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for EntityIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.directory_name.is_empty() {
            write!(f, "{}/{}", self.project_name, self.base_name)
        } else {
            write!(
                f,
                "{}/{}/{}",
                self.project_name, self.directory_name, self.base_name
            )
        }
    }
}

/// Languages keyed by culture plus the merged, ordered entry table.
#[derive(Debug)]
pub struct ResourceEntity {
    identity: EntityIdentity,
    context: ResourceContext,
    languages: BTreeMap<CultureKey, ResourceLanguage>,
    entries: Vec<ResourceTableEntry>,
    changes: Vec<ResourceChange>,
}

impl ResourceEntity {
    /// Builds an entity from languages that were already loaded, possibly on another thread.
    pub fn new(
        identity: EntityIdentity,
        context: ResourceContext,
        languages: Vec<ResourceLanguage>,
    ) -> Self {
        let mut entity = Self {
            identity,
            context,
            languages: BTreeMap::new(),
            entries: Vec::new(),
            changes: Vec::new(),
        };
        for language in languages {
            entity.insert_language(language);
        }
        entity.reconcile_entries();
        entity
    }

    /// Loads every `(file, culture)` pair and builds the entity.
    pub fn load(
        identity: EntityIdentity,
        context: ResourceContext,
        files: Vec<(ProjectFile, CultureKey)>,
    ) -> Result<Self, Error> {
        let languages = load_languages(&identity, &context, files)?;
        Ok(Self::new(identity, context, languages))
    }

    fn insert_language(&mut self, language: ResourceLanguage) {
        let culture = language.culture().clone();
        if let Some(existing) = self.languages.get(&culture) {
            warn!(
                "{}: `{}` and `{}` both hold culture `{}`, ignoring the latter",
                self.identity,
                existing.file().file_path().display(),
                language.file().file_path().display(),
                culture.display_name()
            );
            return;
        }
        self.languages.insert(culture, language);
    }

    pub fn identity(&self) -> &EntityIdentity {
        &self.identity
    }

    pub fn project_name(&self) -> &str {
        self.identity.project_name()
    }

    pub fn base_name(&self) -> &str {
        self.identity.base_name()
    }

    pub fn directory_name(&self) -> &str {
        self.identity.directory_name()
    }

    pub fn context(&self) -> &ResourceContext {
        &self.context
    }

    pub fn languages(&self) -> impl Iterator<Item = &ResourceLanguage> {
        self.languages.values()
    }

    pub fn language(&self, culture: &CultureKey) -> Option<&ResourceLanguage> {
        self.languages.get(culture)
    }

    pub fn cultures(&self) -> impl Iterator<Item = &CultureKey> {
        self.languages.keys()
    }

    /// The neutral language, or the first one when there is no neutral file.
    pub fn neutral_language(&self) -> Option<&ResourceLanguage> {
        self.languages.values().next()
    }

    pub fn neutral_project_file(&self) -> Option<&ProjectFile> {
        self.languages.get(&CultureKey::Neutral).map(ResourceLanguage::file)
    }

    pub fn format(&self) -> Option<ResourceFormat> {
        self.neutral_language().map(ResourceLanguage::format)
    }

    /// True if any file of this entity is owned by the forms designer.
    pub fn is_winforms_designer_resource(&self) -> bool {
        self.languages
            .values()
            .any(|l| l.file().is_winforms_designer_resource())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by index.
    pub fn entries(&self) -> impl Iterator<Item = EntryView<'_>> {
        self.entries.iter().map(move |entry| EntryView::new(self, entry))
    }

    pub fn entry(&self, id: EntryId) -> Option<EntryView<'_>> {
        self.entries
            .iter()
            .find(|e| e.id() == id)
            .map(|entry| EntryView::new(self, entry))
    }

    pub fn entry_by_key(&self, key: &str) -> Option<EntryView<'_>> {
        self.entries
            .iter()
            .find(|e| e.key() == key)
            .map(|entry| EntryView::new(self, entry))
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut ResourceTableEntry> {
        self.entries.iter_mut()
    }

    /// Drains the change events queued since the last call.
    pub fn take_changes(&mut self) -> Vec<ResourceChange> {
        std::mem::take(&mut self.changes)
    }

    fn position(&self, id: EntryId) -> Result<usize, Error> {
        self.entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| Error::KeyNotFound(format!("entry #{}", id.value())))
    }

    /// Installs freshly loaded languages, keeping unchanged ones and all surviving entries.
    ///
    /// Returns whether anything changed.
    pub fn update_languages(&mut self, languages: Vec<ResourceLanguage>) -> bool {
        let mut previous = std::mem::take(&mut self.languages);
        let mut changed = false;

        for mut language in languages {
            let culture = language.culture().clone();
            if self.languages.contains_key(&culture) {
                self.insert_language(language);
                continue;
            }
            match previous.remove(&culture) {
                Some(old) if old.is_same_content(&language) => {
                    self.languages.insert(culture, old);
                }
                Some(old) => {
                    if language.file().is_winforms_designer_resource()
                        && let Err(e) = language.copy_comments_from(&old)
                    {
                        warn!("{}: could not carry comments forward: {}", self.identity, e);
                    }
                    debug!("{}: `{}` changed on disk", self.identity, culture.display_name());
                    self.changes.push(ResourceChange::LanguageChanged {
                        entity: self.identity.clone(),
                        culture: culture.clone(),
                    });
                    self.languages.insert(culture, language);
                    changed = true;
                }
                None => {
                    self.changes.push(ResourceChange::LanguageAdded {
                        entity: self.identity.clone(),
                        culture: culture.clone(),
                    });
                    self.languages.insert(culture, language);
                    changed = true;
                }
            }
        }

        for culture in previous.into_keys() {
            self.changes.push(ResourceChange::LanguageRemoved {
                entity: self.identity.clone(),
                culture,
            });
            changed = true;
        }

        if changed {
            self.reconcile_entries();
        }
        changed
    }

    /// Re-reads `files` and installs them via [`update_languages`](Self::update_languages).
    pub fn update(&mut self, files: Vec<(ProjectFile, CultureKey)>) -> Result<bool, Error> {
        let languages = load_languages(&self.identity, &self.context, files)?;
        Ok(self.update_languages(languages))
    }

    /// Matches entries to the union of keys, reusing entries whose key survived.
    fn reconcile_entries(&mut self) {
        let mut keys: Vec<&str> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for language in self.languages.values() {
            for key in language.keys() {
                if seen.insert(key.as_str()) {
                    keys.push(key);
                }
            }
        }

        let mut existing: HashMap<String, ResourceTableEntry> = self
            .entries
            .drain(..)
            .map(|entry| (entry.key().to_string(), entry))
            .collect();

        let mut entries = Vec::with_capacity(keys.len());
        for (index, key) in keys.into_iter().enumerate() {
            let entry = match existing.remove(key) {
                Some(mut entry) => {
                    entry.set_index(index as f64);
                    entry
                }
                None => {
                    let entry = ResourceTableEntry::new(key, index as f64);
                    self.changes.push(ResourceChange::EntryAdded {
                        entity: self.identity.clone(),
                        entry: entry.id(),
                    });
                    entry
                }
            };
            entries.push(entry);
        }
        for entry in existing.into_values() {
            self.changes.push(ResourceChange::EntryRemoved {
                entity: self.identity.clone(),
                entry: entry.id(),
            });
        }

        self.entries = entries;
        self.refresh_all();
    }

    fn refresh_all(&mut self) {
        let rules = self.context.rules();
        for entry in &mut self.entries {
            entry.refresh(&self.languages, rules);
        }
    }

    fn refresh_at(&mut self, position: usize) {
        self.entries[position].refresh(&self.languages, self.context.rules());
    }

    /// Adds a key with an empty neutral value. `None` if the entity has no languages.
    pub fn add(&mut self, key: &str) -> Result<Option<EntryId>, Error> {
        if self.entries.iter().any(|e| e.key() == key) {
            return Err(Error::KeyExists(key.to_string()));
        }
        let Some(neutral) = self.languages.values_mut().next() else {
            return Ok(None);
        };
        neutral.set_value(key, Some(""))?;

        let index = self
            .entries
            .iter()
            .map(ResourceTableEntry::index)
            .fold(-1.0, f64::max)
            + 1.0;
        let entry = ResourceTableEntry::new(key, index);
        let id = entry.id();
        self.entries.push(entry);
        let position = self.entries.len() - 1;
        self.refresh_at(position);
        self.changes.push(ResourceChange::EntryAdded {
            entity: self.identity.clone(),
            entry: id,
        });
        Ok(Some(id))
    }

    /// Path of the file that would hold `culture` for this entity.
    pub fn language_file_path(&self, culture: &CultureKey) -> Option<(PathBuf, String)> {
        let language = self.neutral_language()?;
        let format = language.format();
        let neutral = self.context.configuration().neutral_culture();
        let file = language.file();

        let absolute = format.parse_file_name(file.file_path(), neutral.as_ref())?;
        let relative_source = file.relative_path().replace('\\', "/");
        let relative = format.parse_file_name(Path::new(&relative_source), neutral.as_ref())?;

        let path = format.file_path(&absolute.directory, self.base_name(), culture);
        let relative_path = format
            .file_path(&relative.directory, self.base_name(), culture)
            .to_string_lossy()
            .replace('\\', "/");
        Some((path, relative_path))
    }

    /// Adds a culture, creating its file from the format template when it does not exist.
    pub fn add_language(&mut self, culture: CultureKey) -> Result<&ResourceLanguage, Error> {
        if self.languages.contains_key(&culture) {
            return Err(Error::DataMismatch(format!(
                "{} already has a `{}` language",
                self.identity,
                culture.display_name()
            )));
        }
        let (path, relative_path) = self.language_file_path(&culture).ok_or_else(|| {
            Error::DataMismatch(format!("{} has no language to derive from", self.identity))
        })?;
        let format = self
            .format()
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;
        let file = ProjectFile::new(&path, self.project_name(), relative_path);

        if !file.exists() {
            let content =
                format.empty_document(&culture, &self.context.configuration().source_language());
            file.write_text(&content, TextEncoding::Utf8)
                .map_err(|e| Error::save(&path, e))?;
            info!("created {}", path.display());
        }

        let language =
            ResourceLanguage::load(file, culture.clone(), self.identity.clone(), &self.context)?;
        self.languages.insert(culture.clone(), language);
        self.reconcile_entries();
        self.changes.push(ResourceChange::LanguageAdded {
            entity: self.identity.clone(),
            culture: culture.clone(),
        });
        self.languages
            .get(&culture)
            .ok_or_else(|| Error::DataMismatch("language vanished".to_string()))
    }

    /// Deletes the key from every language and drops the row.
    pub fn remove(&mut self, id: EntryId) -> Result<bool, Error> {
        let Ok(position) = self.position(id) else {
            return Ok(false);
        };
        let key = self.entries[position].key().to_string();

        if let Some(language) = self
            .languages
            .values()
            .find(|l| l.contains_key(&key) && !l.can_edit())
        {
            return Err(Error::EditRejected {
                entity: self.identity.to_string(),
                culture: language.culture().display_name(),
            });
        }
        for language in self.languages.values_mut() {
            language.remove_key(&key)?;
        }

        self.entries.remove(position);
        self.changes.push(ResourceChange::EntryRemoved {
            entity: self.identity.clone(),
            entry: id,
        });
        Ok(true)
    }

    /// Moves an entry to `index` and reorders the neutral document to match.
    ///
    /// Fractional values place the entry between neighbours (`1.5` goes between the entries
    /// at 1 and 2); indices are renumbered to `0..n` afterwards.
    pub fn set_index(&mut self, id: EntryId, index: f64) -> Result<(), Error> {
        let position = self.position(id)?;
        let key = self.entries[position].key().to_string();

        let mut order: Vec<(f64, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (if i == position { index } else { e.index() }, i))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        if let Some(neutral) = self.languages.values_mut().next()
            && neutral.contains_key(&key)
        {
            let rank = order.iter().position(|&(_, i)| i == position).unwrap_or(0);
            let after = order[..rank]
                .iter()
                .rev()
                .map(|&(_, i)| self.entries[i].key())
                .find(|k| neutral.contains_key(k))
                .map(str::to_string);
            neutral.move_node_after(&key, after.as_deref())?;
        }

        let mut entries: Vec<Option<ResourceTableEntry>> =
            self.entries.drain(..).map(Some).collect();
        self.entries = order
            .iter()
            .filter_map(|&(_, i)| entries[i].take())
            .collect();
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.set_index(i as f64);
        }
        self.changes
            .push(ResourceChange::OrderChanged(self.identity.clone()));
        Ok(())
    }

    /// Realigns entry indices with the key order of the neutral document.
    pub fn on_item_order_changed(&mut self) {
        let Some(neutral) = self.languages.values().next() else {
            return;
        };
        let ranks: HashMap<&str, usize> = neutral
            .keys()
            .iter()
            .enumerate()
            .map(|(i, k)| (k.as_str(), i))
            .collect();
        let count = ranks.len();

        let mut ranked: Vec<(usize, ResourceTableEntry)> = self
            .entries
            .drain(..)
            .enumerate()
            .map(|(i, e)| (ranks.get(e.key()).copied().unwrap_or(count + i), e))
            .collect();
        ranked.sort_by_key(|(rank, _)| *rank);

        self.entries = ranked.into_iter().map(|(_, e)| e).collect();
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.set_index(i as f64);
        }
        self.changes
            .push(ResourceChange::OrderChanged(self.identity.clone()));
    }

    /// Sorts every document with the configured comparison.
    pub fn sort_nodes(&mut self) -> Result<bool, Error> {
        let comparison = self.context.configuration().resx_sorting_comparison;
        let mut changed = false;
        for language in self.languages.values_mut() {
            changed |= language.sort_nodes(comparison)?;
        }
        if changed {
            self.on_item_order_changed();
        }
        Ok(changed)
    }

    /// Writes every changed language. Returns whether any file was written.
    pub fn save(&mut self) -> Result<bool, Error> {
        if self.context.configuration().sort_file_content_on_save {
            self.sort_nodes()?;
        }
        let mut saved = false;
        for language in self.languages.values_mut() {
            if language.has_changes() {
                saved |= language.save()?;
            }
        }
        if saved {
            self.changes.push(ResourceChange::Saved(self.identity.clone()));
        }
        Ok(saved)
    }

    pub fn has_changes(&self) -> bool {
        self.languages.values().any(ResourceLanguage::has_changes)
    }

    fn language_mut(&mut self, culture: &CultureKey) -> Result<&mut ResourceLanguage, Error> {
        let identity = &self.identity;
        self.languages.get_mut(culture).ok_or_else(|| {
            Error::DataMismatch(format!(
                "{} has no `{}` language",
                identity,
                culture.display_name()
            ))
        })
    }

    fn entry_changed(&mut self, position: usize, culture: Option<CultureKey>) {
        self.refresh_at(position);
        self.changes.push(ResourceChange::EntryChanged {
            entity: self.identity.clone(),
            entry: self.entries[position].id(),
            culture,
        });
    }

    pub fn set_value(
        &mut self,
        id: EntryId,
        culture: &CultureKey,
        value: Option<&str>,
    ) -> Result<bool, Error> {
        let position = self.position(id)?;
        let key = self.entries[position].key().to_string();
        let changed = self.language_mut(culture)?.set_value(&key, value)?;
        if changed {
            self.entry_changed(position, Some(culture.clone()));
        }
        Ok(changed)
    }

    fn update_metadata(
        &mut self,
        id: EntryId,
        culture: &CultureKey,
        update: impl FnOnce(&mut CommentMetadata),
    ) -> Result<bool, Error> {
        let position = self.position(id)?;
        let key = self.entries[position].key().to_string();
        let mut metadata = self.entries[position].metadata(culture);
        update(&mut metadata);
        let comment = metadata.serialize();
        let changed = self
            .language_mut(culture)?
            .set_comment(&key, Some(comment.as_str()))?;
        if changed {
            self.entry_changed(position, Some(culture.clone()));
        }
        Ok(changed)
    }

    /// Sets the comment text of one culture, keeping its metadata tokens.
    pub fn set_comment(&mut self, id: EntryId, culture: &CultureKey, text: &str) -> Result<bool, Error> {
        self.update_metadata(id, culture, |m| m.text = text.to_string())
    }

    pub fn set_invariant(&mut self, id: EntryId, culture: &CultureKey, invariant: bool) -> Result<bool, Error> {
        self.update_metadata(id, culture, |m| m.is_invariant = invariant)
    }

    pub fn set_translation_state(
        &mut self,
        id: EntryId,
        culture: &CultureKey,
        state: Option<TranslationState>,
    ) -> Result<bool, Error> {
        self.update_metadata(id, culture, |m| m.translation_state = state)
    }

    /// Mutes or unmutes a rule for one entry; stored in the neutral comment.
    pub fn set_rule_muted(&mut self, id: EntryId, rule_id: &str, muted: bool) -> Result<bool, Error> {
        self.update_metadata(id, &CultureKey::Neutral, |m| {
            if muted {
                m.muted_rules.insert(rule_id.to_string());
            } else {
                m.muted_rules.remove(rule_id);
            }
        })
    }

    /// Renames an entry in every language.
    ///
    /// A blocked rename leaves everything untouched and stores the returned message on
    /// the entry, where [`EntryView::validation_message`] picks it up.
    pub fn rename_entry(&mut self, id: EntryId, new_key: &str) -> Result<(), String> {
        let position = self.position(id).map_err(|e| e.to_string())?;
        let old_key = self.entries[position].key().to_string();
        if old_key == new_key {
            self.entries[position].set_validation_message(None);
            return Ok(());
        }

        let message = if new_key.trim().is_empty() {
            Some("Key must not be empty.".to_string())
        } else if self.entries.iter().any(|e| e.key() == new_key) {
            Some(format!("Duplicate key `{}`.", new_key))
        } else {
            self.languages
                .values()
                .find(|l| !l.can_edit())
                .map(|l| format!("The `{}` file is not editable.", l.culture().display_name()))
        };
        if let Some(message) = message {
            self.entries[position].set_validation_message(Some(message.clone()));
            return Err(message);
        }

        for language in self.languages.values_mut() {
            if let Err(e) = language.rename_key(&old_key, new_key) {
                let message = e.to_string();
                self.entries[position].set_validation_message(Some(message.clone()));
                return Err(message);
            }
        }

        let entry = &mut self.entries[position];
        entry.set_key(new_key.to_string());
        entry.set_validation_message(None);
        self.entry_changed(position, None);
        Ok(())
    }

    /// Attaches the captured state of this entity, or clears it with `None`.
    pub(crate) fn apply_snapshot(&mut self, snapshot: Option<&EntitySnapshot>) {
        for entry in &mut self.entries {
            let captured = snapshot.map(|s| s.entry_values(entry.key()));
            entry.set_snapshot(captured);
        }
    }
}

fn load_languages(
    identity: &EntityIdentity,
    context: &ResourceContext,
    files: Vec<(ProjectFile, CultureKey)>,
) -> Result<Vec<ResourceLanguage>, Error> {
    files
        .into_iter()
        .map(|(file, culture)| ResourceLanguage::load(file, culture, identity.clone(), context))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project_file::FileText;

    fn resx(entries: &[(&str, &str)]) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root>\n");
        for (key, value) in entries {
            out.push_str(&format!(
                "  <data name=\"{}\" xml:space=\"preserve\">\n    <value>{}</value>\n  </data>\n",
                key, value
            ));
        }
        out.push_str("</root>\n");
        out
    }

    fn language(culture: &str, content: &str) -> ResourceLanguage {
        let culture = CultureKey::parse(culture).unwrap();
        let name = format!("Strings{}.resx", culture.to_suffix());
        ResourceLanguage::from_content(
            ProjectFile::new(&name, "App", &name),
            culture,
            EntityIdentity::new("App", "Strings", ""),
            FileText {
                text: content.to_string(),
                encoding: TextEncoding::Utf8,
            },
            &ResourceContext::default(),
        )
        .unwrap()
    }

    fn entity(neutral: &[(&str, &str)], german: &[(&str, &str)]) -> ResourceEntity {
        ResourceEntity::new(
            EntityIdentity::new("App", "Strings", ""),
            ResourceContext::default(),
            vec![language("", &resx(neutral)), language("de", &resx(german))],
        )
    }

    fn keys(entity: &ResourceEntity) -> Vec<String> {
        entity.entries().map(|e| e.key().to_string()).collect()
    }

    #[test]
    fn test_identity_is_case_insensitive() {
        let a = EntityIdentity::new("App", "Strings", "Properties");
        let b = EntityIdentity::new("app", "STRINGS", "properties");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "App/Properties/Strings");
    }

    #[test]
    fn test_entries_are_union_in_neutral_order() {
        let entity = entity(&[("B", "b"), ("A", "a")], &[("A", "a-de"), ("C", "c-de")]);
        assert_eq!(keys(&entity), vec!["B", "A", "C"]);
        let c = entity.entry_by_key("C").unwrap();
        assert_eq!(c.value(&CultureKey::Neutral), None);
        assert_eq!(c.index(), 2.0);
    }

    #[test]
    fn test_add_rejects_existing_keys() {
        let mut entity = entity(&[("A", "a")], &[]);
        assert!(matches!(entity.add("A"), Err(Error::KeyExists(_))));
        let id = entity.add("New").unwrap().unwrap();
        let view = entity.entry(id).unwrap();
        assert_eq!(view.value(&CultureKey::Neutral), Some(""));
        assert_eq!(view.index(), 1.0);
    }

    #[test]
    fn test_rule_failures_follow_edits() {
        let mut entity = entity(&[("A", "Name:")], &[("A", "Nom:")]);
        let de = CultureKey::parse("de").unwrap();
        let id = entity.entry_by_key("A").unwrap().id();
        assert!(!entity.entry(id).unwrap().has_rule_failures());

        entity.set_value(id, &de, Some("Nom")).unwrap();
        assert!(entity.entry(id).unwrap().rule_failure(&de).is_some());

        entity.set_invariant(id, &de, true).unwrap();
        let view = entity.entry(id).unwrap();
        assert!(view.is_invariant(&de));
        assert!(view.rule_failure(&de).is_none());
    }

    #[test]
    fn test_rename_entry_collision_sets_message() {
        let mut entity = entity(&[("A", "a"), ("B", "b")], &[("A", "a-de")]);
        let id = entity.entry_by_key("A").unwrap().id();
        let message = entity.rename_entry(id, "B").unwrap_err();
        assert_eq!(entity.entry(id).unwrap().validation_message(), Some(message.as_str()));

        entity.rename_entry(id, "Renamed").unwrap();
        let view = entity.entry(id).unwrap();
        assert_eq!(view.key(), "Renamed");
        assert_eq!(view.value(&CultureKey::parse("de").unwrap()), Some("a-de"));
        assert_eq!(view.validation_message(), None);
    }

    #[test]
    fn test_on_item_order_changed_follows_neutral_file() {
        let mut entity = entity(&[("A", "a"), ("B", "b")], &[]);
        assert!(
            entity
                .languages
                .get_mut(&CultureKey::Neutral)
                .unwrap()
                .move_node_after("B", None)
                .unwrap()
        );
        entity.on_item_order_changed();
        assert_eq!(keys(&entity), vec!["B", "A"]);
        assert_eq!(entity.entry_by_key("A").unwrap().index(), 1.0);
    }

    #[test]
    fn test_remove_deletes_key_everywhere() {
        let mut entity = entity(&[("A", "a"), ("B", "b")], &[("A", "a-de")]);
        let id = entity.entry_by_key("A").unwrap().id();
        assert!(entity.remove(id).unwrap());
        assert_eq!(keys(&entity), vec!["B"]);
        assert!(entity.languages().all(|l| !l.contains_key("A")));
        assert!(!entity.remove(id).unwrap());
    }
}
