//! Built-in primitive families, grouped by concern (§4.1, §4.5).

mod assign;
mod compare;
mod control;
mod io;
mod meta;
mod prompt;
mod scalars;
mod strings;
mod task_ops;

use crate::registry::Registry;

pub fn register_all(registry: &mut Registry) {
    scalars::register(registry);
    compare::register(registry);
    strings::register(registry);
    assign::register(registry);
    control::register(registry);
    meta::register(registry);
    task_ops::register(registry);
    io::register(registry);
    prompt::register(registry);
}
