//! Output sinks.

pub mod csv;
