//! Strictly Werewolf core - the pure rules engine
//!
//! Everything here is synchronous and free of IO. State is immutable:
//! transitions return new snapshots, and every rule function takes its
//! randomness from the caller so runs are reproducible.
//!
//! # Architecture
//!
//! - **State**: [`GameState`], [`PlayerSlot`] and the append-only event log
//! - **Roles**: data-driven [`Role`] and [`Ability`] definitions in a [`RoleRegistry`]
//! - **Rules**: [`resolve_night`], [`tally_votes`], [`apply_vote_result`], [`check_victory`]
//! - **Views**: [`GameStateView`] projections that enforce the information boundary
//! - **Channels**: [`ChannelManager`] permission gates for speech
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use strictly_werewolf_core::{Action, GameState, PlayerSlot, RoleRegistry, Team, resolve_night};
//!
//! let registry = RoleRegistry::with_builtins();
//! let state = GameState::new(vec![
//!     PlayerSlot::new("p1", "Ash", "werewolf", Team::Werewolf),
//!     PlayerSlot::new("p2", "Birch", "villager", Team::Village),
//!     PlayerSlot::new("p3", "Cedar", "villager", Team::Village),
//! ])
//! .unwrap()
//! .with_night_action("p1".into(), Action::UseAbility { ability: "kill".into(), target: "p2".into() });
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let (next, events) = resolve_night(&state, &registry, &mut rng);
//! assert!(!next.get_player(&"p2".into()).unwrap().is_alive());
//! assert_eq!(events.len(), 2);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod channel;
mod contracts;
mod event;
mod roles;
mod rules;
mod state;
mod types;
mod view;

pub mod invariants;

pub use action::Action;
pub use channel::{
    Channel, ChannelManager, ChannelPolicy, DirectChannel, Message, PublicChannel, WolfChannel,
};
pub use contracts::TransitionContract;
pub use event::{EventKind, GameEnd, GameEvent, NightResult, Outcome, VoteResult};
pub use invariants::{GameInvariants, Invariant, InvariantSet, InvariantViolation};
pub use roles::{
    Ability, AbilityEffect, BuiltinRole, DEFAULT_PRIORITY, RegistryError, Role, RoleRegistry,
    TargetClass,
};
pub use rules::{
    TieBreaker, adopt_kill_target, apply_vote_result, check_victory, required_consensus,
    resolve_night, tally_votes,
};
pub use state::{GameState, PlayerSlot, StateError};
pub use types::{ChannelId, EliminationCause, Phase, PlayerId, Team};
pub use view::{GameStateView, PublicPlayer, is_visible_to};
