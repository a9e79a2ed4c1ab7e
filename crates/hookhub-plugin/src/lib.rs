//! # hookhub-plugin
//!
//! Hook engine and plugin framework for HookHub. Provides:
//!
//! - Named hooks with priority-ordered callbacks (actions and filters)
//! - Reentrant firing with live iteration cursors
//! - A wildcard channel observing every fire
//! - Plugin lifecycle management with owner-scoped callback removal

pub mod api;
pub mod builtin;
pub mod convention;
pub mod global;
pub mod hooks;
pub mod macros;
pub mod manager;
pub mod prelude;
pub mod registry;

pub use api::context::PluginContext;
pub use global::engine;
pub use hooks::{Callback, CallbackEntry, HasResult, HookEngine, HookStats, Value};
pub use manager::PluginManager;
pub use registry::{Plugin, PluginInfo, PluginRegistry};

#[doc(hidden)]
pub use serde_json as __serde_json;
