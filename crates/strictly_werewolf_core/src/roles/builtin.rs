//! The classic role set: villager, werewolf, seer, doctor.

use super::{Ability, Role, TargetClass};
use crate::Team;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Built-in roles shipped with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum BuiltinRole {
    /// Plain village member.
    Villager,
    /// Member of the pack.
    Werewolf,
    /// Investigates one player per night.
    Seer,
    /// Protects one player per night.
    Doctor,
}

impl BuiltinRole {
    /// Builds the role definition.
    pub fn into_role(self) -> Role {
        match self {
            BuiltinRole::Villager => Role::new(
                "villager",
                Team::Village,
                "An ordinary member of the village with no special powers.",
                "Listen closely during discussion. Watch for inconsistent \
                 stories and vote to remove the players you find least \
                 trustworthy.",
            ),
            BuiltinRole::Werewolf => Role::new(
                "werewolf",
                Team::Werewolf,
                "A member of the pack that hunts at night.",
                "Coordinate with your pack at night and agree on one target. \
                 During the day, blend in and steer suspicion elsewhere.",
            )
            .with_ability(
                Ability::night("kill", 15, "Vote to kill a player tonight")
                    .with_targets(TargetClass::AliveOpponents),
            ),
            BuiltinRole::Seer => Role::new(
                "seer",
                Team::Village,
                "Sees the true nature of one player each night.",
                "Investigate a different player each night. Decide carefully \
                 when to share what you learned.",
            )
            .with_ability(Ability::night(
                "investigate",
                20,
                "Learn the role of a player",
            )),
            BuiltinRole::Doctor => Role::new(
                "doctor",
                Team::Village,
                "Protects one player from attack each night.",
                "Protect a different player each night. Protecting yourself \
                 is allowed.",
            )
            .with_ability(
                Ability::night("protect", 10, "Protect a player from being killed tonight")
                    .with_targets(TargetClass::AliveAny),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AbilityEffect;
    use strum::IntoEnumIterator;

    #[test]
    fn test_builtin_priorities_order_protect_kill_investigate() {
        let priority = |role: BuiltinRole, name: &str| {
            *role
                .into_role()
                .ability(name)
                .expect("builtin ability")
                .priority()
        };
        assert!(priority(BuiltinRole::Doctor, "protect") < priority(BuiltinRole::Werewolf, "kill"));
        assert!(priority(BuiltinRole::Werewolf, "kill") < priority(BuiltinRole::Seer, "investigate"));
    }

    #[test]
    fn test_builtin_names_match_role_names() {
        for builtin in BuiltinRole::iter() {
            assert_eq!(builtin.to_string(), *builtin.into_role().name());
        }
    }

    #[test]
    fn test_villager_has_no_abilities() {
        let role = BuiltinRole::Villager.into_role();
        assert!(!role.has_night_ability());
        let wolf = BuiltinRole::Werewolf.into_role();
        assert_eq!(*wolf.abilities()[0].effect(), AbilityEffect::Kill);
    }
}
