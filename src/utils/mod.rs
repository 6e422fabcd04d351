//! Utilities
//!
//! Child output collection.

pub mod output;
