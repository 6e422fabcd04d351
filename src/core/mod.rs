//! Execution core.
//!
//! Request decoding, result normalization, and the supervisor that ties a
//! workspace to one timed child process.

pub mod request;
pub mod supervisor;
pub mod types;
