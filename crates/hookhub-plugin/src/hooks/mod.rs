//! Hook system — registry, cursor, table, dispatcher, and callback definitions.

pub mod cursor;
pub mod definitions;
pub mod dispatcher;
pub mod registry;
pub mod table;

pub use cursor::IterationCursor;
pub use definitions::{Callback, CallbackEntry, CallbackFn, HasResult, HookStats, Value};
pub use dispatcher::HookEngine;
pub use registry::CallbackRegistry;
pub use table::{HookState, HookTable};
