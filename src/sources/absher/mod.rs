//! Government-services portal activity with heuristic fraud scoring.

pub mod catalog;
pub mod fingerprint;
pub mod generator;
pub mod model;
pub mod risk;

pub use generator::AbsherGenerator;
