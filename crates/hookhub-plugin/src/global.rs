//! Process-wide hook engine.
//!
//! Prefer constructing a [`HookEngine`] and passing it to collaborators. This
//! instance exists for hosts that need a single ambient engine; it is created
//! with default settings on first access and lives until process exit.

use once_cell::sync::Lazy;

use crate::hooks::HookEngine;

static ENGINE: Lazy<HookEngine> = Lazy::new(HookEngine::new);

/// Returns the process-wide engine.
pub fn engine() -> &'static HookEngine {
    &ENGINE
}
