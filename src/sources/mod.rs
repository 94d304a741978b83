//! Event sources.

pub mod absher;
