//! Contracts between consecutive game-state snapshots.
//!
//! A transition may flip players from alive to dead, append events,
//! and replace night actions. Nothing else about the roster may change.

use crate::invariants::{GameInvariants, InvariantSet, InvariantViolation};
use crate::{GameState, PlayerSlot};
use tracing::{instrument, warn};

/// Postcondition check for one state transition.
pub struct TransitionContract;

impl TransitionContract {
    /// Checks that `after` is a legal successor of `before`.
    ///
    /// Collects every violation rather than stopping at the first, and
    /// includes the state invariants of `after`.
    #[instrument(skip_all, fields(from = %before.phase(), to = %after.phase()))]
    pub fn check(before: &GameState, after: &GameState) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        if before.players().len() != after.players().len() {
            violations.push(InvariantViolation::new(format!(
                "Roster size changed from {} to {}",
                before.players().len(),
                after.players().len()
            )));
        } else {
            for (old, new) in before.players().iter().zip(after.players()) {
                if !same_identity(old, new) {
                    violations.push(InvariantViolation::new(format!(
                        "Seat {} changed identity",
                        old.player_id()
                    )));
                }
                if !old.is_alive() && new.is_alive() {
                    violations.push(InvariantViolation::new(format!(
                        "Player {} was resurrected",
                        old.player_id()
                    )));
                }
            }
        }

        if !after.events().starts_with(before.events()) {
            violations.push(InvariantViolation::new("Event log was rewritten"));
        }

        if after.day() < before.day() {
            violations.push(InvariantViolation::new("Day counter went backwards"));
        }

        if let Err(mut state_violations) = GameInvariants::check_all(after) {
            violations.append(&mut state_violations);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            for v in &violations {
                warn!(violation = %v, "Transition contract violated");
            }
            Err(violations)
        }
    }
}

fn same_identity(a: &PlayerSlot, b: &PlayerSlot) -> bool {
    a.player_id() == b.player_id() && a.name() == b.name() && a.role() == b.role() && a.team() == b.team()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EliminationCause, EventKind, GameEvent, Phase, PlayerSlot, Team};

    fn state() -> GameState {
        GameState::new(vec![
            PlayerSlot::new("p1", "A", "werewolf", Team::Werewolf),
            PlayerSlot::new("p2", "B", "villager", Team::Village),
            PlayerSlot::new("p3", "C", "villager", Team::Village),
        ])
        .expect("valid roster")
    }

    #[test]
    fn test_recorded_kill_satisfies_contract() {
        let before = state();
        let after = before
            .with_player_killed(&"p2".into())
            .expect("alive")
            .with_event(GameEvent::new(
                1,
                Phase::Dawn,
                EventKind::Elimination {
                    player_id: "p2".into(),
                    role: "villager".into(),
                    cause: EliminationCause::WolfKill,
                },
            ))
            .with_day(1);
        assert!(TransitionContract::check(&before, &after).is_ok());
    }

    #[test]
    fn test_role_swap_violates_contract() {
        let before = state();
        let after = before.with_player_replaced(PlayerSlot::new("p2", "B", "seer", Team::Village));
        let violations = TransitionContract::check(&before, &after).unwrap_err();
        assert!(violations.iter().any(|v| v.description.contains("identity")));
    }

    #[test]
    fn test_rewritten_log_violates_contract() {
        let event = GameEvent::new(
            0,
            Phase::Setup,
            EventKind::PhaseChange {
                old_phase: Phase::Setup,
                new_phase: Phase::Night,
            },
        );
        let before = state().with_event(event);
        let after = state();
        let violations = TransitionContract::check(&before, &after).unwrap_err();
        assert!(violations.iter().any(|v| v.description.contains("rewritten")));
    }
}
