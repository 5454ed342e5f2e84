//! Resource type classification tables
//!
//! The severity a key collision gets depends on what kind of resource the
//! type ID names. The tables live in a value passed into detectors by
//! reference, never in ambient global state, so tests and alternate game
//! editions can substitute their own.

use std::collections::HashSet;

use super::Severity;

/// Core system resource types: object definitions, object keys, sim data,
/// CAS parts. Overriding these is most likely to break the base game.
const CORE_SYSTEM_TYPES: [u32; 4] = [0x545503B2, 0x0333406C, 0x034AEECB, 0x00B2D882];

/// Script hook resource types
const SCRIPT_HOOK_TYPES: [u32; 1] = [0xD382BF57];

/// Read-only type-ID classification tables
///
/// Initialized once at startup and shared by reference across detectors.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    core_system_types: HashSet<u32>,
    script_hook_types: HashSet<u32>,
}

impl TypeRegistry {
    /// Build a registry from explicit tables
    pub fn new(
        core_system_types: impl IntoIterator<Item = u32>,
        script_hook_types: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            core_system_types: core_system_types.into_iter().collect(),
            script_hook_types: script_hook_types.into_iter().collect(),
        }
    }

    /// Whether a type ID names a core system resource
    pub fn is_core_system(&self, type_id: u32) -> bool {
        self.core_system_types.contains(&type_id)
    }

    /// Whether a type ID names a script hook resource
    pub fn is_script_hook(&self, type_id: u32) -> bool {
        self.script_hook_types.contains(&type_id)
    }

    /// Severity of a key collision over the given type
    ///
    /// Core system beats script hook when a type appears in both tables.
    pub fn collision_severity(&self, type_id: u32) -> Severity {
        if self.is_core_system(type_id) {
            Severity::Critical
        } else if self.is_script_hook(type_id) {
            Severity::High
        } else {
            Severity::Medium
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new(CORE_SYSTEM_TYPES, SCRIPT_HOOK_TYPES)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_classify_known_types() {
        let registry = TypeRegistry::default();
        assert_eq!(registry.collision_severity(0x545503B2), Severity::Critical);
        assert_eq!(registry.collision_severity(0xD382BF57), Severity::High);
        assert_eq!(registry.collision_severity(0x2F7D0004), Severity::Medium);
    }

    #[test]
    fn substituted_tables_override_defaults() {
        let registry = TypeRegistry::new([42], [43]);
        assert_eq!(registry.collision_severity(42), Severity::Critical);
        assert_eq!(registry.collision_severity(43), Severity::High);
        assert_eq!(registry.collision_severity(0x545503B2), Severity::Medium);
    }

    #[test]
    fn core_system_wins_over_script_hook() {
        let registry = TypeRegistry::new([7], [7]);
        assert_eq!(registry.collision_severity(7), Severity::Critical);
    }
}
