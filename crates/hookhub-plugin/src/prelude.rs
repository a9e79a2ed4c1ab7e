//! Prelude for convenient imports.

pub use hookhub_core::types::{CallbackId, HookName, Priority};
pub use hookhub_core::{AppError, AppResult};

pub use crate::api::context::PluginContext;
pub use crate::convention::{dynamic_hook, short_circuit};
pub use crate::hooks::{Callback, HasResult, HookEngine, Value};
pub use crate::registry::{Plugin, PluginInfo};

pub use crate::{hook_args, plugin_info};
