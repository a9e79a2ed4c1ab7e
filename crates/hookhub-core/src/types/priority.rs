//! Priority and arity defaults.

/// Ordering key for callbacks on one hook. Lower values run earlier.
pub type Priority = i32;

/// Priority used when a registrant does not specify one.
pub const DEFAULT_PRIORITY: Priority = 10;

/// Number of fired arguments handed to a callback when it does not specify one.
pub const DEFAULT_ARITY: usize = 1;
