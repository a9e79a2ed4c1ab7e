//! # hookhub-core
//!
//! Core crate for HookHub. Contains configuration schemas, hook names,
//! callback identities, priorities, and the unified error system.
//!
//! This crate has **no** internal dependencies on other HookHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
