//! Learnings carried between games.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Append-only learnings keyed by display name, shared across games.
///
/// Cloning shares the same store.
#[derive(Debug, Clone, Default)]
pub struct CrossGameMemory {
    inner: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl CrossGameMemory {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends learnings for a player.
    pub fn append(&self, name: &str, learnings: impl IntoIterator<Item = String>) {
        let mut store = self.lock();
        let entry = store.entry(name.to_string()).or_default();
        entry.extend(learnings);
        debug!(player = name, total = entry.len(), "Learnings stored");
    }

    /// Learnings recorded for a player, oldest first.
    pub fn learnings_for(&self, name: &str) -> Vec<String> {
        self.lock().get(name).cloned().unwrap_or_default()
    }

    /// Copy of the whole store.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_store() {
        let memory = CrossGameMemory::new();
        let other = memory.clone();
        memory.append("Ash", vec!["Game 1: quiet".to_string()]);
        other.append("Ash", vec!["Game 2: loud".to_string()]);
        assert_eq!(memory.learnings_for("Ash"), vec!["Game 1: quiet", "Game 2: loud"]);
        assert!(memory.learnings_for("Birch").is_empty());
    }

    #[test]
    fn test_concurrent_appends_are_kept() {
        let memory = CrossGameMemory::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let memory = memory.clone();
                std::thread::spawn(move || memory.append("Ash", vec![format!("note {i}")]))
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread finished");
        }
        assert_eq!(memory.snapshot()["Ash"].len(), 4);
    }
}
