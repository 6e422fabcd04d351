//! Configuration
//!
//! Execution settings, loaded once from the environment and passed down.

pub mod env;
pub mod types;
