//! Agent-written notes and player assessments.
//!
//! The engine never writes here. Agents fill it through tools, and a
//! capped summary is appended to every briefing.

use std::collections::BTreeMap;
use tracing::debug;

const SUMMARY_NOTES: usize = 10;
const SUMMARY_ASSESSMENTS: usize = 3;
const SUMMARY_LEARNINGS: usize = 5;
const KEPT_LEARNINGS: usize = 10;

/// Per-player memory for one game.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    player_name: String,
    notes: Vec<String>,
    assessments: BTreeMap<String, Vec<String>>,
    learnings: Vec<String>,
}

impl KnowledgeBase {
    /// Creates an empty knowledge base for a player.
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Self::default()
        }
    }

    /// Display name of the owner.
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// All notes as a bulleted block.
    pub fn read_notes(&self) -> String {
        if self.notes.is_empty() {
            return "(no notes yet)".to_string();
        }
        self.notes
            .iter()
            .map(|n| format!("- {}", n))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Appends a note and returns a confirmation.
    pub fn write_notes(&mut self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return "Error: empty note.".to_string();
        }
        self.notes.push(text.to_string());
        debug!(player = %self.player_name, total = self.notes.len(), "Note saved");
        format!("Note saved. ({} total notes)", self.notes.len())
    }

    /// Records an assessment entry for a player.
    pub fn assess_player(&mut self, name: &str, text: &str) -> String {
        let (name, text) = (name.trim(), text.trim());
        if name.is_empty() || text.is_empty() {
            return "Error: both player name and assessment text are required.".to_string();
        }
        let entries = self.assessments.entry(name.to_string()).or_default();
        entries.push(text.to_string());
        format!("Assessment of {} recorded. ({} entries for {})", name, entries.len(), name)
    }

    /// All assessments grouped by player.
    pub fn read_assessments(&self) -> String {
        if self.assessments.is_empty() {
            return "(no assessments yet)".to_string();
        }
        let mut lines = Vec::new();
        for (name, entries) in &self.assessments {
            lines.push(format!("{}:", name));
            lines.extend(entries.iter().map(|e| format!("  - {}", e)));
        }
        lines.join("\n")
    }

    /// Compact summary appended to briefings; empty when nothing is stored.
    pub fn summarize_for_briefing(&self) -> String {
        let mut parts = Vec::new();

        if !self.notes.is_empty() {
            parts.push("=== Your Notes ===".to_string());
            let skip = self.notes.len().saturating_sub(SUMMARY_NOTES);
            parts.extend(self.notes[skip..].iter().map(|n| format!("- {}", n)));
            if skip > 0 {
                parts.push(format!("  ... ({} earlier notes omitted)", skip));
            }
            parts.push(String::new());
        }

        if !self.assessments.is_empty() {
            parts.push("=== Your Player Assessments ===".to_string());
            for (name, entries) in &self.assessments {
                let skip = entries.len().saturating_sub(SUMMARY_ASSESSMENTS);
                parts.push(format!("{}: {}", name, entries[skip..].join("; ")));
            }
            parts.push(String::new());
        }

        if !self.learnings.is_empty() {
            parts.push("=== Lessons from Prior Games ===".to_string());
            let skip = self.learnings.len().saturating_sub(SUMMARY_LEARNINGS);
            parts.extend(self.learnings[skip..].iter().map(|l| format!("- {}", l)));
            parts.push(String::new());
        }

        parts.join("\n")
    }

    /// Summarises this game's notes and assessments for later games.
    pub fn extract_learnings(&self, game_number: u32) -> Vec<String> {
        let mut learnings = Vec::new();
        if !self.notes.is_empty() {
            let skip = self.notes.len().saturating_sub(5);
            learnings.push(format!("Game {} notes: {}", game_number, self.notes[skip..].join("; ")));
        }
        for (name, entries) in &self.assessments {
            let skip = entries.len().saturating_sub(2);
            learnings.push(format!("Game {}: {} -- {}", game_number, name, entries[skip..].join("; ")));
        }
        learnings
    }

    /// Replaces prior-game learnings, keeping the most recent ten.
    pub fn inject_learnings(&mut self, learnings: &[String]) {
        let skip = learnings.len().saturating_sub(KEPT_LEARNINGS);
        self.learnings = learnings[skip..].to_vec();
    }
}
