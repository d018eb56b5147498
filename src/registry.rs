//! Opcode registry and alias seeding (§4.2)

use std::collections::HashMap;
use std::sync::Arc;

use crate::embedded;
use crate::primitive::Primitive;
use crate::primitives;
use crate::OPCODE_PREFIX;

/// Global, read-only-after-construction map of canonical path → primitive,
/// plus the alias table seeded from the embedded subroutine filesystem.
pub struct Registry {
    primitives: HashMap<&'static str, Arc<dyn Primitive>>,
    global_aliases: HashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            primitives: HashMap::new(),
            global_aliases: HashMap::new(),
        }
    }

    pub fn register(&mut self, primitive: Arc<dyn Primitive>) {
        self.primitives.insert(primitive.canonical_path(), primitive);
    }

    pub fn get(&self, canonical_path: &str) -> Option<&Arc<dyn Primitive>> {
        self.primitives.get(canonical_path)
    }

    pub fn global_aliases(&self) -> HashMap<String, String> {
        self.global_aliases.clone()
    }

    /// Registers every built-in primitive and walks the embedded subroutine
    /// filesystem once to seed the flat alias table (§4.2, §4.3).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        primitives::register_all(&mut registry);
        for (alias, _) in embedded::FILES {
            registry
                .global_aliases
                .insert(alias.to_string(), format!("{}/{}", OPCODE_PREFIX, alias));
        }
        registry
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_aliases_from_embedded_filesystem() {
        let registry = Registry::with_builtins();
        let aliases = registry.global_aliases();
        assert_eq!(aliases.get("identity"), Some(&"/gnd/identity".to_string()));
        assert_eq!(aliases.get("noop"), Some(&"/gnd/noop".to_string()));
    }

    #[test]
    fn builtin_scalar_primitives_are_registered() {
        let registry = Registry::with_builtins();
        assert!(registry.get("/gnd/let").is_some());
        assert!(registry.get("/gnd/return").is_some());
        assert!(registry.get("/gnd/int").is_some());
    }
}
