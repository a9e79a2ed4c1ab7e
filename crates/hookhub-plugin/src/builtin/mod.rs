//! Plugins compiled into the host.

pub mod trace;

pub use trace::TraceObserver;
