//! Core type definitions used across the HookHub workspace.

pub mod callback_id;
pub mod hook_name;
pub mod priority;

pub use callback_id::{CallbackId, Instance};
pub use hook_name::HookName;
pub use priority::{DEFAULT_ARITY, DEFAULT_PRIORITY, Priority};
