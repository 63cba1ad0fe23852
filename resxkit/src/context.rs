//! Shared collaborators handed to entities and languages at construction.

use std::{fmt, sync::Arc};

use crate::{
    access::{AllowAll, EditGate},
    configuration::Configuration,
    culture::CultureKey,
    entity::EntityIdentity,
    rules::ResourceTableEntryRules,
};

/// Configuration, rule set and edit gate, cheap to clone and safe to send to workers.
#[derive(Clone)]
pub struct ResourceContext {
    configuration: Arc<Configuration>,
    rules: Arc<ResourceTableEntryRules>,
    gate: Arc<dyn EditGate>,
}

impl ResourceContext {
    pub fn new(configuration: Configuration) -> Self {
        let rules = ResourceTableEntryRules::new(&configuration);
        Self {
            configuration: Arc::new(configuration),
            rules: Arc::new(rules),
            gate: Arc::new(AllowAll),
        }
    }

    pub fn with_edit_gate(mut self, gate: impl EditGate + 'static) -> Self {
        self.gate = Arc::new(gate);
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn shared_configuration(&self) -> Arc<Configuration> {
        Arc::clone(&self.configuration)
    }

    pub fn rules(&self) -> &ResourceTableEntryRules {
        &self.rules
    }

    pub fn can_edit(&self, entity: &EntityIdentity, culture: &CultureKey) -> bool {
        self.gate.can_edit(entity, culture)
    }
}

impl Default for ResourceContext {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl fmt::Debug for ResourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceContext")
            .field("configuration", &self.configuration)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
