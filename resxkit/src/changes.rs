//! Change events and their debounced delivery.
//!
//! Entities queue [`ResourceChange`]s as they mutate; the owner drains them through a
//! [`ChangeBatcher`], which holds them back until no new change arrived for a quiet
//! period and then hands them over as one batch.

use std::time::{Duration, Instant};

use crate::{culture::CultureKey, entity::EntityIdentity, entry::EntryId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    EntityAdded(EntityIdentity),
    EntityRemoved(EntityIdentity),
    LanguageAdded {
        entity: EntityIdentity,
        culture: CultureKey,
    },
    LanguageChanged {
        entity: EntityIdentity,
        culture: CultureKey,
    },
    LanguageRemoved {
        entity: EntityIdentity,
        culture: CultureKey,
    },
    EntryAdded {
        entity: EntityIdentity,
        entry: EntryId,
    },
    EntryRemoved {
        entity: EntityIdentity,
        entry: EntryId,
    },
    /// A value, comment or key of the entry changed. `culture` is `None` for key renames
    /// and metadata stored in the neutral comment.
    EntryChanged {
        entity: EntityIdentity,
        entry: EntryId,
        culture: Option<CultureKey>,
    },
    OrderChanged(EntityIdentity),
    Saved(EntityIdentity),
}

impl ResourceChange {
    pub fn entity(&self) -> &EntityIdentity {
        match self {
            ResourceChange::EntityAdded(entity)
            | ResourceChange::EntityRemoved(entity)
            | ResourceChange::OrderChanged(entity)
            | ResourceChange::Saved(entity) => entity,
            ResourceChange::LanguageAdded { entity, .. }
            | ResourceChange::LanguageChanged { entity, .. }
            | ResourceChange::LanguageRemoved { entity, .. }
            | ResourceChange::EntryAdded { entity, .. }
            | ResourceChange::EntryRemoved { entity, .. }
            | ResourceChange::EntryChanged { entity, .. } => entity,
        }
    }
}

/// Pending flag plus quiet period: fires once after signals stop for `quiet_period`.
#[derive(Debug, Clone)]
pub struct Throttle {
    quiet_period: Duration,
    last_signal: Option<Instant>,
}

impl Throttle {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            last_signal: None,
        }
    }

    pub fn signal(&mut self, now: Instant) {
        self.last_signal = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_signal.is_some()
    }

    /// Returns `true` (and clears the pending flag) once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_signal {
            Some(last) if now.saturating_duration_since(last) >= self.quiet_period => {
                self.last_signal = None;
                true
            }
            _ => false,
        }
    }
}

/// Collects changes and releases them as one batch per quiet period.
#[derive(Debug, Clone)]
pub struct ChangeBatcher {
    throttle: Throttle,
    pending: Vec<ResourceChange>,
}

impl ChangeBatcher {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            throttle: Throttle::new(quiet_period),
            pending: Vec::new(),
        }
    }

    pub fn push(&mut self, changes: impl IntoIterator<Item = ResourceChange>, now: Instant) {
        let before = self.pending.len();
        self.pending.extend(changes);
        if self.pending.len() > before {
            self.throttle.signal(now);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.throttle.is_pending()
    }

    pub fn poll(&mut self, now: Instant) -> Option<Vec<ResourceChange>> {
        if self.throttle.poll(now) {
            Some(std::mem::take(&mut self.pending))
        } else {
            None
        }
    }
}

impl Default for ChangeBatcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}
