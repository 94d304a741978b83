//! Absher Guardian library crate.
//!
//! Exposes core types, the portal activity source, and output formats for the CLI.

pub mod core;
pub mod formats;
pub mod sources;

pub use crate::core::config;
pub use crate::core::event;
pub use crate::core::traits;
