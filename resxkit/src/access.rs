//! Edit authorization.
//!
//! Every mutation of a language asks the gate first; a negative answer aborts the
//! mutation with [`Error::EditRejected`](crate::Error::EditRejected) before anything changes.

use crate::{culture::CultureKey, entity::EntityIdentity};

/// Synchronous yes/no decision on whether one culture of one entity may be edited now.
pub trait EditGate: Send + Sync {
    fn can_edit(&self, entity: &EntityIdentity, culture: &CultureKey) -> bool;
}

/// Gate that never objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl EditGate for AllowAll {
    fn can_edit(&self, _entity: &EntityIdentity, _culture: &CultureKey) -> bool {
        true
    }
}

impl<F> EditGate for F
where
    F: Fn(&EntityIdentity, &CultureKey) -> bool + Send + Sync,
{
    fn can_edit(&self, entity: &EntityIdentity, culture: &CultureKey) -> bool {
        self(entity, culture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_gate() {
        let identity = EntityIdentity::new("App", "Resources", "Properties");
        let gate = |_: &EntityIdentity, culture: &CultureKey| culture.is_neutral();
        assert!(gate.can_edit(&identity, &CultureKey::Neutral));
        assert!(!gate.can_edit(&identity, &CultureKey::parse("de").unwrap()));
        assert!(AllowAll.can_edit(&identity, &CultureKey::parse("de").unwrap()));
    }
}
