//! Display-name lookup in both directions.

use std::collections::BTreeMap;
use strictly_werewolf_core::{PlayerId, PlayerSlot};
use tracing::warn;

/// Maps player ids to display names and back.
///
/// Reverse lookup tries raw ids, then case-insensitive names, then a
/// unique partial match.
#[derive(Debug, Clone, Default)]
pub struct NameBook {
    by_id: BTreeMap<PlayerId, String>,
    by_name: BTreeMap<String, PlayerId>,
}

impl NameBook {
    /// Builds the book from the seated players.
    pub fn new<'a>(players: impl IntoIterator<Item = &'a PlayerSlot>) -> Self {
        let mut book = Self::default();
        for slot in players {
            book.by_id.insert(slot.player_id().clone(), slot.name().clone());
            let key = slot.name().to_lowercase();
            if let Some(first) = book.by_name.get(&key) {
                warn!(name = %slot.name(), kept = %first, dropped = %slot.player_id(), "Duplicate display name");
                continue;
            }
            book.by_name.insert(key, slot.player_id().clone());
        }
        book
    }

    /// Display name for an id, falling back to the id itself.
    pub fn name(&self, id: &PlayerId) -> String {
        self.by_id
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Resolves a name or id typed by an agent.
    pub fn resolve(&self, input: &str) -> Option<PlayerId> {
        let cleaned = input.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        if cleaned.is_empty() {
            return None;
        }
        let id = PlayerId::from(cleaned);
        if self.by_id.contains_key(&id) {
            return Some(id);
        }
        let lowered = cleaned.to_lowercase();
        if let Some(id) = self.by_name.get(&lowered) {
            return Some(id.clone());
        }
        let mut partial = self
            .by_name
            .iter()
            .filter(|(name, _)| name.contains(&lowered) || lowered.contains(name.as_str()))
            .map(|(_, id)| id);
        match (partial.next(), partial.next()) {
            (Some(id), None) => Some(id.clone()),
            _ => None,
        }
    }

    /// Names for a list of ids, in order.
    pub fn names(&self, ids: &[PlayerId]) -> Vec<String> {
        ids.iter().map(|id| self.name(id)).collect()
    }
}
