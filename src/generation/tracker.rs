// Per-entity request tickets
//
// Requests for the same entity can overlap (the user clicks "regenerate"
// before the first result arrives). Each request gets a ticket; only the
// newest ticket for an entity may apply its result. Generation numbers come
// from one counter shared by all entities, so a ticket is never reissued and
// nothing has to be remembered about an entity once its request resolves.

use std::collections::HashMap;

/// An entity that can have a generation in flight
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    SceneImage(String),
    SceneAudio(String),
    CharacterAvatar(String),
    Story,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub key: EntityKey,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    /// Last generation handed out, across all entities
    last_generation: u64,
    /// Newest unresolved generation per entity
    pending: HashMap<EntityKey, u64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket, superseding any earlier one for the same entity
    pub fn issue(&mut self, key: EntityKey) -> RequestTicket {
        self.last_generation += 1;
        let generation = self.last_generation;

        self.pending.insert(key.clone(), generation);
        RequestTicket { key, generation }
    }

    /// Whether `ticket` is the newest unresolved request for its entity
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.pending.get(&ticket.key) == Some(&ticket.generation)
    }

    /// Mark a ticket resolved; returns false if it was already stale
    pub fn retire(&mut self, ticket: &RequestTicket) -> bool {
        if self.is_current(ticket) {
            self.pending.remove(&ticket.key);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self, key: &EntityKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
