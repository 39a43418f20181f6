//! Night-action resolution.
//!
//! Resolution walks pending abilities in priority order. Protections
//! build a set, kill submissions become ballots for a single pack
//! target, and investigations reveal privately. The adopted target dies
//! unless protected.

use crate::roles::DEFAULT_PRIORITY;
use crate::{
    AbilityEffect, Action, EliminationCause, EventKind, GameEvent, GameState, NightResult, Phase,
    PlayerId, RoleRegistry,
};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument, warn};

/// One ability submission with its resolved ordering data.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingAbility {
    actor: PlayerId,
    ability: String,
    target: PlayerId,
    priority: u32,
    effect: AbilityEffect,
}

/// Number of matching ballots needed to adopt a pack kill target.
///
/// Unanimity for up to two ballots, strict majority beyond that.
pub fn required_consensus(ballots: usize) -> usize {
    if ballots <= 2 { ballots } else { ballots / 2 + 1 }
}

/// Picks the pack's kill target from individual ballots.
///
/// Returns `None` when there are no ballots or the top count misses the
/// consensus threshold. Ties at the top are broken uniformly at random.
pub fn adopt_kill_target<R: Rng + ?Sized>(ballots: &[PlayerId], rng: &mut R) -> Option<PlayerId> {
    if ballots.is_empty() {
        return None;
    }
    // First-appearance order keeps tie candidates deterministic for a seed.
    let mut tally: Vec<(&PlayerId, usize)> = Vec::new();
    for ballot in ballots {
        match tally.iter_mut().find(|(id, _)| *id == ballot) {
            Some(entry) => entry.1 += 1,
            None => tally.push((ballot, 1)),
        }
    }
    let top = tally.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let required = required_consensus(ballots.len());
    if top < required {
        debug!(top, required, "No pack consensus");
        return None;
    }
    let leaders: Vec<&PlayerId> = tally
        .iter()
        .filter(|(_, count)| *count == top)
        .map(|(id, _)| *id)
        .collect();
    leaders.choose(rng).map(|id| (*id).clone())
}

/// Resolves every pending night action.
///
/// Returns the new state (with events appended) and the emitted events:
/// one leading night result, then private reveals, then eliminations.
/// All events are stamped with the current day and `DAWN`.
#[instrument(skip(state, registry, rng), fields(day = state.day(), pending = state.night_actions().len()))]
pub fn resolve_night<R: Rng + ?Sized>(
    state: &GameState,
    registry: &RoleRegistry,
    rng: &mut R,
) -> (GameState, Vec<GameEvent>) {
    let day = state.day();
    let mut pending = collect_abilities(state, registry);
    // Stable sort: equal priorities keep submission order.
    pending.sort_by_key(|p| p.priority);

    let mut protected: Vec<PlayerId> = Vec::new();
    let mut ballots: Vec<PlayerId> = Vec::new();
    let mut reveals: Vec<GameEvent> = Vec::new();

    for ability in &pending {
        match ability.effect {
            AbilityEffect::Protect => {
                if !protected.contains(&ability.target) {
                    protected.push(ability.target.clone());
                }
            }
            AbilityEffect::Kill => ballots.push(ability.target.clone()),
            AbilityEffect::Investigate => {
                let Some(subject) = state.get_player(&ability.target) else {
                    warn!(target = %ability.target, "Investigation of unknown player ignored");
                    continue;
                };
                reveals.push(GameEvent::new(
                    day,
                    Phase::Dawn,
                    EventKind::PrivateReveal {
                        player_id: ability.actor.clone(),
                        subject_id: subject.player_id().clone(),
                        role: subject.role().clone(),
                        team: subject.team().clone(),
                        info: format!(
                            "{} ({}) is a {}.",
                            subject.name(),
                            subject.player_id(),
                            subject.role()
                        ),
                    },
                ));
            }
            AbilityEffect::Inert => {
                debug!(ability = %ability.ability, actor = %ability.actor, "Inert ability recorded");
            }
        }
    }

    let mut kills: Vec<PlayerId> = Vec::new();
    let mut saved: Vec<PlayerId> = Vec::new();
    if let Some(target) = adopt_kill_target(&ballots, rng) {
        if protected.contains(&target) {
            info!(%target, "Kill target was protected");
            saved.push(target);
        } else {
            kills.push(target);
        }
    }

    let mut next = state.clone();
    let mut eliminations = Vec::new();
    let mut applied = Vec::new();
    for target in kills {
        let Some(slot) = next.get_player(&target).cloned() else {
            continue;
        };
        if !slot.is_alive() {
            continue;
        }
        match next.with_player_killed(&target) {
            Ok(updated) => next = updated,
            Err(e) => {
                warn!(error = %e, "Skipping kill");
                continue;
            }
        }
        eliminations.push(GameEvent::new(
            day,
            Phase::Dawn,
            EventKind::Elimination {
                player_id: target.clone(),
                role: slot.role().clone(),
                cause: EliminationCause::WolfKill,
            },
        ));
        applied.push(target);
    }

    let mut events = Vec::with_capacity(1 + reveals.len() + eliminations.len());
    events.push(GameEvent::new(
        day,
        Phase::Dawn,
        EventKind::NightResult(NightResult::new(applied, protected, saved)),
    ));
    events.extend(reveals);
    events.extend(eliminations);

    info!(events = events.len(), "Night resolved");
    (next.with_events(events.clone()), events)
}

/// Collects ability submissions in submission order, dropping other actions.
fn collect_abilities(state: &GameState, registry: &RoleRegistry) -> Vec<PendingAbility> {
    state
        .night_actions()
        .iter()
        .filter_map(|(actor, action)| {
            let Action::UseAbility { ability, target } = action else {
                return None;
            };
            let Some(slot) = state.get_player(actor) else {
                warn!(%actor, "Ability from unknown player ignored");
                return None;
            };
            let declared = registry
                .get(slot.role())
                .and_then(|role| role.ability(ability));
            let (priority, effect) = match declared {
                Some(def) => (*def.priority(), *def.effect()),
                None => {
                    debug!(%actor, %ability, "Ability not declared by role, using defaults");
                    (DEFAULT_PRIORITY, AbilityEffect::from_name(ability))
                }
            };
            Some(PendingAbility {
                actor: actor.clone(),
                ability: ability.clone(),
                target: target.clone(),
                priority,
                effect,
            })
        })
        .collect()
}
