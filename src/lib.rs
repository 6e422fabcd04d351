//! execbox: run one untrusted source snippet in a timed, self-cleaning child process
//!
//! A request arrives as a JSON object on stdin, the snippet runs once under a
//! wall-clock limit, and exactly one JSON result goes to stdout. The workspace
//! created for the run is removed before control returns, on every path.
//!
//! # Architecture
//!
//! - [`config`]: execution settings loaded once from the environment
//! - [`core::request`]: request decoding; bad input becomes an error message
//! - [`core::supervisor`]: workspace lifecycle and result normalization
//! - [`exec::executor`]: spawn, timed wait, forced termination and reaping
//! - [`safety::workspace`]: single-use workspace directories
//! - [`utils::output`]: full capture of stdout/stderr
//! - [`cli`]: binary wiring
//!
//! This is not a security sandbox. There is no namespace, cgroup or seccomp
//! isolation and the memory limit is advisory. Layer a container or VM
//! underneath when running hostile code.

// Configuration
pub mod config;

// Request decoding, result types, supervisor
pub mod core;

// Child process control
pub mod exec;

// Workspace lifecycle
pub mod safety;

// Utilities
pub mod utils;

// CLI entrypoint wiring
pub mod cli;

pub use crate::config::types::{ExecError, ExecutionConfig, MemoryLimit, Result, Runtime};
pub use crate::core::request::{decode_request, read_request_text, DecodeError};
pub use crate::core::supervisor::{ExecutionReport, Supervisor};
pub use crate::core::types::{
    ErrorResponse, ExecutionRequest, ExecutionResult, ExecutionState, Response,
};
