//! First-class invariants over game state.
//!
//! Invariants are logical properties every reachable [`GameState`]
//! satisfies. They are checked by the orchestrator after each phase and
//! can be tested independently.
//!
//! [`GameState`]: crate::GameState

mod deaths_recorded;
mod known_actors;
mod unique_ids;

pub use deaths_recorded::DeathsRecordedInvariant;
pub use known_actors::KnownActorsInvariant;
pub use unique_ids::UniqueIdsInvariant;

use derive_more::Display;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant or contract.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{description}")]
pub struct InvariantViolation {
    /// Description of the violated property.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together. Implemented for tuples.
pub trait InvariantSet<S> {
    /// Checks every invariant, collecting all violations.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>),+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

impl_invariant_set!(I1);
impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);

/// Every game-state invariant as a composable set.
pub type GameInvariants = (
    UniqueIdsInvariant,
    DeathsRecordedInvariant,
    KnownActorsInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, GameState, PlayerSlot, Team};

    fn state() -> GameState {
        GameState::new(vec![
            PlayerSlot::new("p1", "A", "werewolf", Team::Werewolf),
            PlayerSlot::new("p2", "B", "villager", Team::Village),
        ])
        .expect("valid roster")
    }

    #[test]
    fn test_invariant_set_holds_for_new_game() {
        assert!(GameInvariants::check_all(&state()).is_ok());
    }

    #[test]
    fn test_invariant_set_reports_each_violation() {
        let corrupt = state()
            .with_player_killed(&"p2".into())
            .expect("alive")
            .with_night_action("p7".into(), Action::no_action("ghost"));
        let violations = GameInvariants::check_all(&corrupt).unwrap_err();
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_single_invariant_as_set() {
        type Only = (UniqueIdsInvariant,);
        assert!(Only::check_all(&state()).is_ok());
    }
}
