//! Execution control
//!
//! Spawns the child, bounds it by wall-clock time and reaps it.

pub mod executor;
