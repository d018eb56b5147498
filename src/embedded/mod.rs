//! Embedded subroutine filesystem (§4.2, §4.3, §10.2)
//!
//! A fixed, compile-time list of `.gnd` sources baked into the binary with
//! `include_str!`. Each entry's basename becomes a short opcode alias,
//! registered once at process start by `Registry::with_builtins`. There is
//! no runtime directory walk and no embedding crate: the list below *is*
//! the embedded filesystem.

/// `(alias, source)` pairs, one per embedded `.gnd` file.
pub static FILES: &[(&str, &str)] = &[
    ("identity", include_str!("identity.gnd")),
    ("noop", include_str!("noop.gnd")),
];

/// Look up an embedded file by its resolved path, e.g. `"gnd/identity.gnd"`
/// (the leading slash of `/gnd/...` has already been stripped per §4.3).
pub fn lookup(resolved_path: &str) -> Option<&'static str> {
    let name = resolved_path
        .strip_prefix("gnd/")?
        .strip_suffix(".gnd")
        .unwrap_or(resolved_path);
    FILES.iter().find(|(alias, _)| *alias == name).map(|(_, src)| *src)
}
