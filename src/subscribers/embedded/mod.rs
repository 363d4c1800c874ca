//! # Built-in subscribers
//!
//! - [`LogWriter`]: forwards events to `tracing` with the controller name as a field.

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
