//! Subroutine loader and cache (§3 Subroutine cache, §4.3 Subroutine loader)

use std::collections::HashMap;
use std::path::Path;

use crate::ast::InstructionList;
use crate::control_flow::RunError;
use crate::parser;
use crate::{OPCODE_PREFIX, ROUTINE_EXTENSION};

/// Per-interpreter cache of parsed instruction lists, keyed by resolved
/// canonical path. Entries are written on first load and never evicted for
/// the lifetime of the owning scope hierarchy; workers spawned by `async`
/// get their own cache rather than sharing their parent's (§5).
#[derive(Default)]
pub struct SubroutineCache {
    entries: HashMap<String, InstructionList>,
}

impl SubroutineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `name` against `dir` per §4.3, load and parse it if not
    /// already cached, and return the (possibly cached) instruction list
    /// together with the callee's resolved path, so the caller can report
    /// errors raised inside it against the callee's own file (§7's "reported
    /// at the call site with the callee's path").
    pub fn load(&mut self, name: &str, dir: &Path) -> Result<(InstructionList, String), RunError> {
        let resolved = resolve_path(name, dir);
        if let Some(cached) = self.entries.get(&resolved) {
            return Ok((cached.clone(), resolved));
        }

        let source = read_source(&resolved)?;
        let parsed = parser::parse(&source).map_err(|e| RunError::LoadFailure {
            path: resolved.clone(),
            cause: e.to_string(),
        })?;
        self.entries.insert(resolved.clone(), parsed.clone());
        Ok((parsed, resolved))
    }
}

/// §4.3 path resolution: embedded prefix, then absolute/relative, then
/// extension normalization.
fn resolve_path(name: &str, dir: &Path) -> String {
    let embedded_prefix = format!("{}/", OPCODE_PREFIX);
    let mut resolved = if let Some(rest) = name.strip_prefix(&embedded_prefix) {
        // Embedded reference: leading slash already stripped above.
        format!("{}/{}", OPCODE_PREFIX.trim_start_matches('/'), rest)
    } else {
        let candidate = Path::new(name);
        if candidate.is_absolute() {
            name.to_string()
        } else {
            dir.join(name).to_string_lossy().into_owned()
        }
    };

    let ext_suffix = format!(".{}", ROUTINE_EXTENSION);
    if !resolved.ends_with(&ext_suffix) {
        resolved.push_str(&ext_suffix);
    }
    resolved
}

fn read_source(resolved: &str) -> Result<String, RunError> {
    if resolved.starts_with(&format!("{}/", OPCODE_PREFIX.trim_start_matches('/'))) {
        crate::embedded::lookup(resolved)
            .map(|s| s.to_string())
            .ok_or_else(|| RunError::LoadFailure {
                path: resolved.to_string(),
                cause: "not found in embedded filesystem".to_string(),
            })
    } else {
        std::fs::read_to_string(resolved).map_err(|e| RunError::LoadFailure {
            path: resolved.to_string(),
            cause: e.to_string(),
        })
    }
}
