//! Call-site conventions built on top of the engine.
//!
//! The engine only threads values; these helpers encode the conventions
//! collaborators layer on top of it.

use crate::hooks::{HookEngine, Value};

/// Fires a `pre_*` style filter seeded with `null`.
///
/// A callback that wants to replace the default processing returns any
/// non-null value, which comes back as `Some`. Callbacks registered later are
/// expected to pass a non-null input through unchanged.
pub fn short_circuit(engine: &HookEngine, hook: &str, args: &[Value]) -> Option<Value> {
    match engine.fire_filter(hook, Value::Null, args) {
        Value::Null => None,
        value => Some(value),
    }
}

/// Builds a per-object variant of a base hook name, e.g. `save_post_page`.
///
/// The result is an independent hook; no pattern matching links it to `base`.
pub fn dynamic_hook(base: &str, suffix: &str) -> String {
    format!("{base}_{suffix}")
}
