//! Slot environment and opcode-alias chain (§3 Scope, §4.2 alias resolution)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::control_flow::RunError;
use crate::value::Value;

struct AliasChainNode {
    aliases: HashMap<String, String>,
    parent: Option<AliasChain>,
}

/// A shared, read-only view over a chain of opcode-alias maps.
///
/// Cloning is cheap (an `Arc` bump): this is deliberately *not* a back
/// reference into the parent scope's mutable slot map, only into its
/// immutable alias table, per the Design Notes in §9.
#[derive(Clone)]
pub struct AliasChain(Arc<AliasChainNode>);

impl AliasChain {
    pub fn new(aliases: HashMap<String, String>, parent: Option<AliasChain>) -> Self {
        Self(Arc::new(AliasChainNode { aliases, parent }))
    }

    pub fn root(aliases: HashMap<String, String>) -> Self {
        Self::new(aliases, None)
    }

    pub fn child(&self) -> Self {
        Self::new(HashMap::new(), Some(self.clone()))
    }

    /// `ResolveOpcode(name)` (§4.2): checks this level's alias map, then
    /// recurses to the parent, terminating in at most depth-of-scope-chain
    /// steps and falling back to `name` unchanged at the root.
    pub fn resolve(&self, name: &str) -> String {
        if let Some(canonical) = self.0.aliases.get(name) {
            return canonical.clone();
        }
        match &self.0.parent {
            Some(parent) => parent.resolve(name),
            None => name.to_string(),
        }
    }
}

/// The runtime environment of a block (§3 Scope).
///
/// Slot lookups are local only: the parent link embedded in `aliases` is
/// never consulted for slots, matching the invariant that a subroutine or
/// task's slots are invisible to its caller.
pub struct Scope {
    slots: HashMap<String, Value>,
    pub script_dir: PathBuf,
    pub aliases: AliasChain,
    pub log_indent: u32,
}

impl Scope {
    pub fn root(script_dir: impl Into<PathBuf>, global_aliases: HashMap<String, String>) -> Self {
        Self {
            slots: HashMap::new(),
            script_dir: script_dir.into(),
            aliases: AliasChain::root(global_aliases),
            log_indent: 0,
        }
    }

    /// Construct a child scope for a subroutine or task invocation: a fresh,
    /// disjoint slot map, the same script directory, and an alias view
    /// chained to this scope's.
    pub fn child(&self) -> Self {
        Self {
            slots: HashMap::new(),
            script_dir: self.script_dir.clone(),
            aliases: self.aliases.child(),
            log_indent: self.log_indent + 1,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    pub fn get_required(&self, name: &str) -> Result<&Value, RunError> {
        if name.is_empty() {
            return Err(RunError::EmptySlotName);
        }
        self.slots.get(name).ok_or_else(|| RunError::UnboundSlot(name.to_string()))
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Result<(), RunError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RunError::EmptySlotName);
        }
        self.slots.insert(name, value);
        Ok(())
    }

    pub fn resolve_opcode(&self, name: &str) -> String {
        self.aliases.resolve(name)
    }

    pub fn script_dir(&self) -> &Path {
        &self.script_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_isolation_across_children() {
        let mut root = Scope::root("/scripts", HashMap::new());
        root.set("x", Value::Int(1)).unwrap();
        let mut child = root.child();
        child.set("x", Value::Int(2)).unwrap();
        assert_eq!(root.get("x"), Some(&Value::Int(1)));
        assert_eq!(child.get("x"), Some(&Value::Int(2)));
    }

    #[test]
    fn alias_resolution_falls_back_to_parent() {
        let mut globals = HashMap::new();
        globals.insert("id".to_string(), "/gnd/identity".to_string());
        let root = Scope::root("/scripts", globals);
        let child = root.child();
        assert_eq!(child.resolve_opcode("id"), "/gnd/identity");
        assert_eq!(child.resolve_opcode("unmapped"), "unmapped");
    }

    #[test]
    fn alias_resolution_idempotent() {
        let mut globals = HashMap::new();
        globals.insert("id".to_string(), "/gnd/identity".to_string());
        let root = Scope::root("/scripts", globals);
        let once = root.resolve_opcode("id");
        let twice = root.resolve_opcode(&once);
        assert_eq!(once, twice);
    }
}
