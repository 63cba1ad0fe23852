//! Captured copies of all values and comments, used to show what changed since.
//!
//! A snapshot is plain JSON so it can be stored next to a solution and loaded later.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    culture::CultureKey,
    entity::{EntityIdentity, ResourceEntity},
    error::Error,
};

/// Value and raw comment of one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub key: String,
    /// Culture tag (empty for neutral) to captured cell.
    pub data: BTreeMap<String, SnapshotItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub project_name: String,
    pub base_name: String,
    #[serde(default)]
    pub directory_name: String,
    pub entries: Vec<EntrySnapshot>,
}

impl EntitySnapshot {
    pub fn from_entity(entity: &ResourceEntity) -> Self {
        let cultures: Vec<&CultureKey> = entity.cultures().collect();
        let entries = entity
            .entries()
            .map(|entry| EntrySnapshot {
                key: entry.key().to_string(),
                data: cultures
                    .iter()
                    .map(|culture| {
                        let item = SnapshotItem {
                            value: entry.value(culture).map(str::to_string),
                            comment: entry.raw_comment(culture).map(str::to_string),
                        };
                        (culture.tag(), item)
                    })
                    .filter(|(_, item)| item.value.is_some() || item.comment.is_some())
                    .collect(),
            })
            .collect();

        Self {
            project_name: entity.project_name().to_string(),
            base_name: entity.base_name().to_string(),
            directory_name: entity.directory_name().to_string(),
            entries,
        }
    }

    pub fn identity(&self) -> EntityIdentity {
        EntityIdentity::new(&self.project_name, &self.base_name, &self.directory_name)
    }

    /// Captured cells of `key`, empty if the key was not part of the snapshot.
    pub fn entry_values(&self, key: &str) -> BTreeMap<CultureKey, SnapshotItem> {
        let Some(entry) = self.entries.iter().find(|e| e.key == key) else {
            return BTreeMap::new();
        };
        entry
            .data
            .iter()
            .filter_map(|(tag, item)| match CultureKey::parse(tag) {
                Ok(culture) => Some((culture, item.clone())),
                Err(e) => {
                    warn!("skipping snapshot culture: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entities: Vec<EntitySnapshot>,
}

impl Snapshot {
    pub fn from_entities<'a>(entities: impl IntoIterator<Item = &'a ResourceEntity>) -> Self {
        Self {
            entities: entities.into_iter().map(EntitySnapshot::from_entity).collect(),
        }
    }

    pub fn entity(&self, identity: &EntityIdentity) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| &e.identity() == identity)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}
