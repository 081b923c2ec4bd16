//! Single-slot identity cache
//!
//! Holds the most recently fetched entity. The slot is only ever replaced
//! or cleared as a whole.

use parking_lot::Mutex;

use crate::models::Entity;

/// Single-slot memo of the last fetched entity, keyed by identity
pub struct IdentityCache<E> {
    slot: Mutex<Option<E>>,
}

impl<E: Entity> IdentityCache<E> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// The cached entity, if its identity equals `id`
    pub fn get(&self, id: &str) -> Option<E> {
        self.slot
            .lock()
            .as_ref()
            .filter(|entity| entity.id() == Some(id))
            .cloned()
    }

    /// Replace the slot, returning the previous entity
    pub fn replace(&self, entity: E) -> Option<E> {
        self.slot.lock().replace(entity)
    }

    pub fn clear(&self) -> Option<E> {
        self.slot.lock().take()
    }

    pub fn current(&self) -> Option<E> {
        self.slot.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl<E: Entity> Default for IdentityCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Buch;

    fn buch(id: &str, version: &str) -> Buch {
        let mut buch = Buch::new(format!("Titel {}", id));
        buch.assign_identity(id.to_string(), Some(version.to_string()));
        buch
    }

    #[test]
    fn test_get_matches_identity_only() {
        let cache = IdentityCache::new();
        assert!(cache.get("1").is_none());

        cache.replace(buch("1", "\"0\""));
        assert_eq!(cache.get("1").unwrap().version(), Some("\"0\""));
        assert!(cache.get("2").is_none());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let cache = IdentityCache::new();
        cache.replace(buch("1", "\"0\""));
        let previous = cache.replace(buch("2", "\"5\""));

        assert_eq!(previous.unwrap().id(), Some("1"));
        assert!(cache.get("1").is_none());
        assert_eq!(cache.current().unwrap().id(), Some("2"));
    }

    #[test]
    fn test_clear() {
        let cache = IdentityCache::new();
        cache.replace(buch("1", "\"0\""));
        assert!(cache.clear().is_some());
        assert!(cache.is_empty());
    }
}
