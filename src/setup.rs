//! Role assignment and initial state construction.

use crate::config::{AgentKind, GameConfig};
use derive_getters::Getters;
use rand::Rng;
use rand::seq::SliceRandom;
use strictly_werewolf_core::{GameState, PlayerSlot, RegistryError, RoleRegistry, StateError};
use tracing::{debug, info, instrument};

/// Role padding used when the configured list is short.
pub const FILLER_ROLE: &str = "villager";

/// One seated player and the agent that will drive it.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct SeatAssignment {
    /// Seat with its assigned role.
    slot: PlayerSlot,
    /// Agent implementation for the seat.
    agent: AgentKind,
}

/// Failure building the initial table.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SetupError {
    /// A role name is not registered.
    #[display("{_0}")]
    Registry(RegistryError),
    /// The roster is inconsistent.
    #[display("{_0}")]
    State(StateError),
}

/// Expands, pads and truncates the configured roles to the table size.
pub fn role_pool(config: &GameConfig) -> Vec<String> {
    let mut roles = config.role_list();
    let seats = *config.num_players();
    if roles.len() < seats {
        roles.resize(seats, FILLER_ROLE.to_string());
    }
    roles.truncate(seats);
    roles
}

/// Assigns shuffled roles to `num_players` seats.
///
/// Seats get ids `p1..pN`; names come from `players` in order, then
/// `Player_{i}`.
#[instrument(skip_all, fields(players = config.num_players()))]
pub fn assign_roles<R: Rng + ?Sized>(
    config: &GameConfig,
    registry: &RoleRegistry,
    rng: &mut R,
) -> Result<Vec<SeatAssignment>, SetupError> {
    let mut roles = role_pool(config);
    roles.shuffle(rng);

    let seats = roles
        .into_iter()
        .zip(config.seat_names())
        .enumerate()
        .map(|(i, (role_name, name))| {
            let role = registry.require(&role_name)?;
            let agent = config.players().get(i).map(|p| *p.agent()).unwrap_or_default();
            let slot = PlayerSlot::new(format!("p{}", i + 1), name, role_name, role.team().clone());
            debug!(player_id = %slot.player_id(), role = %slot.role(), "Seat assigned");
            Ok(SeatAssignment { slot, agent })
        })
        .collect::<Result<Vec<_>, RegistryError>>()?;

    info!(seats = seats.len(), "Roles assigned");
    Ok(seats)
}

/// Builds the initial state for a set of seats.
pub fn initial_state(seats: &[SeatAssignment]) -> Result<GameState, SetupError> {
    Ok(GameState::new(seats.iter().map(|s| s.slot.clone()).collect())?)
}
