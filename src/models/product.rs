use serde::{Deserialize, Serialize};

/// A product occupying one slot of the store.
///
/// The `id` names the slot and survives evolution: when a slot evolves, the
/// occupant keeps its id, bumps `version` by exactly one, and receives fresh
/// display copy from the generator. The display fields (`name`, `tagline`,
/// `description`, `ascii_art`) are opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub ascii_art: String,
    pub version: u32,
    pub favorite_count: u64,
}

impl Product {
    /// Build the next version of this slot from a generator draft.
    ///
    /// Keeps the slot id, bumps the version by one, zeroes the favorite
    /// counter.
    pub fn evolved(&self, draft: &EvolutionDraft) -> Product {
        Product {
            id: self.id.clone(),
            name: draft.name.clone(),
            tagline: draft.tagline.clone(),
            description: draft.description.clone(),
            ascii_art: draft.ascii_art.clone(),
            version: self.version + 1,
            favorite_count: 0,
        }
    }
}

/// The generator's proposed copy for a slot's next version.
///
/// The `evolution_note` explains what changed; it travels in the evolve
/// response but is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionDraft {
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub ascii_art: String,
    pub evolution_note: String,
}

impl EvolutionDraft {
    /// A draft is usable only if every display field came back non-empty.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.tagline.trim().is_empty()
            && !self.description.trim().is_empty()
            && !self.ascii_art.trim().is_empty()
    }
}
