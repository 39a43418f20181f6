//! Role definitions and the registry that looks them up by name.
//!
//! Roles are plain data. The resolver reasons about every pending
//! ability uniformly through its [`AbilityEffect`] and priority, so a
//! new role needs no engine changes.

mod builtin;
mod registry;

pub use builtin::BuiltinRole;
pub use registry::{RegistryError, RoleRegistry};

use crate::{Phase, Team};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

/// Priority used for abilities missing from the acting role.
pub const DEFAULT_PRIORITY: u32 = 50;

/// What the resolver does with an ability.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AbilityEffect {
    /// Adds the target to the night's protected set.
    #[display("protect")]
    Protect,
    /// Casts a vote toward the pack's kill target.
    #[display("kill")]
    Kill,
    /// Privately reveals the target's role to the actor.
    #[display("investigate")]
    Investigate,
    /// Recorded but has no effect on resolution.
    #[display("inert")]
    Inert,
}

impl AbilityEffect {
    /// Infers an effect from an ability name; unknown names are inert.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or(AbilityEffect::Inert)
    }
}

/// Which players an ability may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetClass {
    /// Any living player except the actor.
    AliveOthers,
    /// Any living player, including the actor.
    AliveAny,
    /// Any living player not on the actor's team.
    AliveOpponents,
}

/// A role-specific action usable in one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Ability {
    /// Name agents use to invoke it.
    name: String,
    /// Phase it may be used in.
    phase: Phase,
    /// Resolution order; lower resolves first.
    priority: u32,
    /// Short description shown to agents.
    description: String,
    /// Legal targets.
    targets: TargetClass,
    /// Resolver effect.
    effect: AbilityEffect,
}

impl Ability {
    /// Creates a night ability whose effect is inferred from its name.
    pub fn night(name: impl Into<String>, priority: u32, description: impl Into<String>) -> Self {
        let name = name.into();
        let effect = AbilityEffect::from_name(&name);
        Self {
            name,
            phase: Phase::Night,
            priority,
            description: description.into(),
            targets: TargetClass::AliveOthers,
            effect,
        }
    }

    /// Returns a copy with a different target class.
    pub fn with_targets(mut self, targets: TargetClass) -> Self {
        self.targets = targets;
        self
    }

    /// Returns a copy with an explicit effect.
    pub fn with_effect(mut self, effect: AbilityEffect) -> Self {
        self.effect = effect;
        self
    }

    /// Returns a copy usable in another phase.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }
}

/// Stateless description of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Role {
    /// Registry key.
    name: String,
    /// Team the role plays for.
    team: Team,
    /// One-line description.
    description: String,
    /// Strategy text given at game start.
    instructions: String,
    /// Abilities, possibly empty.
    abilities: Vec<Ability>,
}

impl Role {
    /// Creates a role without abilities.
    pub fn new(
        name: impl Into<String>,
        team: Team,
        description: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            team,
            description: description.into(),
            instructions: instructions.into(),
            abilities: Vec::new(),
        }
    }

    /// Returns a copy with one more ability.
    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.abilities.push(ability);
        self
    }

    /// Finds an ability by name.
    pub fn ability(&self, name: &str) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.name() == name)
    }

    /// Abilities usable in a phase.
    pub fn abilities_for(&self, phase: Phase) -> Vec<&Ability> {
        self.abilities.iter().filter(|a| *a.phase() == phase).collect()
    }

    /// Whether the role acts at night.
    pub fn has_night_ability(&self) -> bool {
        !self.abilities_for(Phase::Night).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_inferred_from_name() {
        assert_eq!(AbilityEffect::from_name("protect"), AbilityEffect::Protect);
        assert_eq!(AbilityEffect::from_name("kill"), AbilityEffect::Kill);
        assert_eq!(AbilityEffect::from_name("bless"), AbilityEffect::Inert);
    }

    #[test]
    fn test_custom_role_reuses_effect_under_new_name() {
        let role = Role::new("bodyguard", Team::Village, "Guards.", "Guard well.").with_ability(
            Ability::night("guard", 5, "Guard someone").with_effect(AbilityEffect::Protect),
        );
        let guard = role.ability("guard").expect("declared");
        assert_eq!(*guard.effect(), AbilityEffect::Protect);
        assert!(role.has_night_ability());
        assert!(role.ability("kill").is_none());
    }
}
