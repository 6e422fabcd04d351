//! Safety and cleanup
//!
//! Run-scoped workspaces that are always removed before control returns.

pub mod workspace;
