//! Explicit role registry, constructed once and passed by reference.

use super::{BuiltinRole, Role};
use derive_more::{Display, Error};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use tracing::{debug, instrument};

/// Role lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("unknown role: {name}")]
pub struct RegistryError {
    /// Requested role name.
    pub name: String,
}

/// Name-keyed table of role definitions.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: BTreeMap<String, Role>,
}

impl RoleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in role.
    #[instrument]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for builtin in BuiltinRole::iter() {
            registry.register(builtin.into_role());
        }
        registry
    }

    /// Adds or replaces a role.
    pub fn register(&mut self, role: Role) {
        debug!(role = %role.name(), "Registering role");
        self.roles.insert(role.name().clone(), role);
    }

    /// Looks up a role by name.
    pub fn get(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    /// Looks up a role by name, failing with [`RegistryError`].
    pub fn require(&self, name: &str) -> Result<&Role, RegistryError> {
        self.get(name).ok_or_else(|| RegistryError {
            name: name.to_string(),
        })
    }

    /// Every registered role.
    pub fn get_all(&self) -> &BTreeMap<String, Role> {
        &self.roles
    }

    /// Whether a role is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }
}
