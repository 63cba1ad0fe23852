//! Groups project files into resource entities and keeps them in sync with disk.
//!
//! Loading is split in two: [`ResourceManager::prepare_load`] does all file I/O and
//! parsing and can run on any thread, while [`ResourceManager::apply_load`] installs the
//! result on the thread that owns the manager.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Instant,
};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    changes::{ChangeBatcher, ResourceChange},
    code_reference::{CodeReferenceResults, CodeReferenceTracker, ReferenceTarget},
    context::ResourceContext,
    culture::CultureKey,
    entity::{EntityIdentity, ResourceEntity},
    error::Error,
    language::ResourceLanguage,
    project_file::{FileFilter, ProjectFile},
    snapshot::Snapshot,
};

/// Languages of one entity, parsed off the owner thread.
#[derive(Debug)]
pub struct PreparedEntity {
    pub identity: EntityIdentity,
    pub languages: Result<Vec<ResourceLanguage>, Error>,
}

/// Output of [`ResourceManager::prepare_load`].
#[derive(Debug, Default)]
pub struct LoadBatch {
    pub entities: Vec<PreparedEntity>,
    pub source_files: Vec<ProjectFile>,
}

/// What [`ResourceManager::apply_load`] did.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub errors: Vec<(EntityIdentity, Error)>,
}

impl LoadSummary {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct ResourceManager {
    context: ResourceContext,
    filter: Arc<dyn FileFilter>,
    entities: BTreeMap<EntityIdentity, ResourceEntity>,
    source_files: Vec<ProjectFile>,
    snapshot: Option<Snapshot>,
    pending: Vec<ResourceChange>,
    changes: ChangeBatcher,
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("entities", &self.entities.len())
            .field("source_files", &self.source_files.len())
            .field("snapshot", &self.snapshot.is_some())
            .finish()
    }
}

impl ResourceManager {
    pub fn new(context: ResourceContext, filter: Arc<dyn FileFilter>) -> Self {
        Self {
            context,
            filter,
            entities: BTreeMap::new(),
            source_files: Vec::new(),
            snapshot: None,
            pending: Vec::new(),
            changes: ChangeBatcher::default(),
        }
    }

    pub fn with_change_batcher(mut self, changes: ChangeBatcher) -> Self {
        self.changes = changes;
        self
    }

    pub fn context(&self) -> &ResourceContext {
        &self.context
    }

    pub fn filter(&self) -> Arc<dyn FileFilter> {
        Arc::clone(&self.filter)
    }

    /// Splits `files` into resource groups and source files, then parses every group.
    pub fn prepare_load(
        context: &ResourceContext,
        filter: &dyn FileFilter,
        files: Vec<ProjectFile>,
    ) -> LoadBatch {
        let neutral = context.configuration().neutral_culture();
        let mut groups: BTreeMap<EntityIdentity, Vec<(ProjectFile, CultureKey)>> =
            BTreeMap::new();
        let mut source_files = Vec::new();

        for file in files {
            if !filter.include_file(&file) {
                continue;
            }
            let Some(format) = file.format() else {
                source_files.push(file);
                continue;
            };
            let relative = file.relative_path().replace('\\', "/");
            let Some(info) = format.parse_file_name(Path::new(&relative), neutral.as_ref()) else {
                warn!("cannot derive a resource name from `{}`", relative);
                continue;
            };
            let identity = EntityIdentity::new(
                file.project_name(),
                info.base_name,
                info.directory.to_string_lossy(),
            );
            groups.entry(identity).or_default().push((file, info.culture));
        }

        debug!(
            "loading {} resource groups, {} source files",
            groups.len(),
            source_files.len()
        );

        let entities = groups
            .into_par_iter()
            .map(|(identity, files)| {
                let languages = files
                    .into_iter()
                    .map(|(file, culture)| {
                        ResourceLanguage::load(file, culture, identity.clone(), context)
                    })
                    .collect();
                PreparedEntity {
                    identity,
                    languages,
                }
            })
            .collect();

        LoadBatch {
            entities,
            source_files,
        }
    }

    /// Runs [`prepare_load`](Self::prepare_load) on a worker thread.
    pub fn spawn_load(
        context: ResourceContext,
        filter: Arc<dyn FileFilter>,
        files: Vec<ProjectFile>,
    ) -> JoinHandle<LoadBatch> {
        thread::spawn(move || Self::prepare_load(&context, filter.as_ref(), files))
    }

    /// Installs a batch: updates known entities, adds new ones and drops vanished ones.
    ///
    /// An entity whose files fail to load keeps its previous state.
    pub fn apply_load(&mut self, batch: LoadBatch) -> LoadSummary {
        let mut summary = LoadSummary::default();
        let mut previous = std::mem::take(&mut self.entities);

        for prepared in batch.entities {
            let identity = prepared.identity;
            let existing = previous.remove(&identity);
            match (prepared.languages, existing) {
                (Ok(languages), Some(mut entity)) => {
                    if entity.update_languages(languages) {
                        summary.updated += 1;
                    } else {
                        summary.unchanged += 1;
                    }
                    self.insert_entity(entity);
                }
                (Ok(languages), None) => {
                    let entity = ResourceEntity::new(identity.clone(), self.context.clone(), languages);
                    self.pending.push(ResourceChange::EntityAdded(identity));
                    summary.added += 1;
                    self.insert_entity(entity);
                }
                (Err(e), existing) => {
                    warn!("{}: {}", identity, e);
                    if let Some(entity) = existing {
                        self.insert_entity(entity);
                    }
                    summary.errors.push((identity, e));
                }
            }
        }

        for identity in previous.into_keys() {
            debug!("{} is gone", identity);
            self.pending.push(ResourceChange::EntityRemoved(identity));
            summary.removed += 1;
        }
        self.source_files = batch.source_files;

        info!(
            "loaded {} entities ({} added, {} updated, {} removed, {} failed)",
            self.entities.len(),
            summary.added,
            summary.updated,
            summary.removed,
            summary.errors.len()
        );
        summary
    }

    fn insert_entity(&mut self, mut entity: ResourceEntity) {
        if let Some(snapshot) = &self.snapshot {
            entity.apply_snapshot(snapshot.entity(entity.identity()));
        }
        self.entities.insert(entity.identity().clone(), entity);
    }

    /// Loads `files` synchronously.
    pub fn load(&mut self, files: Vec<ProjectFile>) -> LoadSummary {
        let batch = Self::prepare_load(&self.context, self.filter.as_ref(), files);
        self.apply_load(batch)
    }

    /// Every culture held by any entity.
    pub fn cultures(&self) -> BTreeSet<CultureKey> {
        self.entities
            .values()
            .flat_map(|e| e.cultures().cloned())
            .collect()
    }

    pub fn entities(&self) -> impl Iterator<Item = &ResourceEntity> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut ResourceEntity> {
        self.entities.values_mut()
    }

    pub fn entity(&self, identity: &EntityIdentity) -> Option<&ResourceEntity> {
        self.entities.get(identity)
    }

    pub fn entity_mut(&mut self, identity: &EntityIdentity) -> Option<&mut ResourceEntity> {
        self.entities.get_mut(identity)
    }

    pub fn source_files(&self) -> &[ProjectFile] {
        &self.source_files
    }

    /// Saves every changed entity; stops at the first failure.
    pub fn save(&mut self) -> Result<usize, Error> {
        let mut saved = 0;
        for entity in self.entities.values_mut() {
            if entity.has_changes() && entity.save()? {
                saved += 1;
            }
        }
        Ok(saved)
    }

    pub fn has_changes(&self) -> bool {
        self.entities.values().any(ResourceEntity::has_changes)
    }

    /// Keys to look for in source files; designer resources are never referenced by name.
    pub fn reference_targets(&self) -> Vec<ReferenceTarget> {
        self.entities
            .values()
            .filter(|e| !e.is_winforms_designer_resource())
            .flat_map(|entity| {
                entity.entries().map(move |entry| ReferenceTarget {
                    entry: entry.id(),
                    key: entry.key().to_string(),
                    base_name: entity.base_name().to_string(),
                })
            })
            .collect()
    }

    /// Clears all known references and returns the targets for a new scan.
    pub fn begin_code_reference_scan(&mut self) -> Vec<ReferenceTarget> {
        for entity in self.entities.values_mut() {
            for entry in entity.entries_mut() {
                entry.set_code_references(None);
            }
        }
        self.reference_targets()
    }

    /// Starts a background scan of the current source files.
    pub fn find_code_references(&mut self, tracker: &mut CodeReferenceTracker) {
        let targets = self.begin_code_reference_scan();
        tracker.start_find(
            self.context.shared_configuration(),
            Arc::clone(&self.filter),
            targets,
            self.source_files.clone(),
        );
    }

    /// Installs finished scan results. Entries created after the scan started stay unknown.
    pub fn apply_code_references(&mut self, results: &CodeReferenceResults) {
        for entity in self.entities.values_mut() {
            for entry in entity.entries_mut() {
                if let Some(references) = results.get(&entry.id()) {
                    entry.set_code_references(Some(Arc::clone(references)));
                }
            }
        }
    }

    pub fn create_snapshot(&self) -> Snapshot {
        Snapshot::from_entities(self.entities.values())
    }

    /// Parses a snapshot and attaches it to every matching entity.
    pub fn load_snapshot(&mut self, json: &str) -> Result<(), Error> {
        let snapshot = Snapshot::from_json(json)?;
        for entity in self.entities.values_mut() {
            entity.apply_snapshot(snapshot.entity(entity.identity()));
        }
        self.snapshot = Some(snapshot);
        Ok(())
    }

    pub fn clear_snapshot(&mut self) {
        self.snapshot = None;
        for entity in self.entities.values_mut() {
            entity.apply_snapshot(None);
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Collects queued change events and returns a batch once they have settled.
    pub fn poll_changes(&mut self, now: Instant) -> Option<Vec<ResourceChange>> {
        let mut collected = std::mem::take(&mut self.pending);
        for entity in self.entities.values_mut() {
            collected.extend(entity.take_changes());
        }
        self.changes.push(collected, now);
        self.changes.poll(now)
    }
}
