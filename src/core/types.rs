use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::ExitStatus;
use std::time::Duration;

/// Exit code reported when the child never produced a real one
pub const NO_EXIT_CODE: i32 = -1;

/// Normalized request handed from the decoder to the supervisor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
    /// Opaque test definitions; carried through, never interpreted.
    pub test_cases: Vec<serde_json::Value>,
}

/// Result of one execution attempt, as written to the output channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Wall-clock milliseconds
    pub execution_time: f64,
}

impl ExecutionResult {
    /// Child ran to completion (zero or non-zero exit).
    pub fn completed(status: ExitStatus, stdout: String, stderr: String, elapsed: Duration) -> Self {
        let exit_code = exit_code_of(status);
        Self {
            success: exit_code == 0,
            stdout,
            stderr,
            exit_code,
            execution_time: elapsed.as_secs_f64() * 1000.0,
        }
    }

    /// Child exceeded the wall-clock budget. Reported time is the budget itself.
    pub fn timed_out(timeout_seconds: u64) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: format!("Execution timed out after {} seconds", timeout_seconds),
            exit_code: NO_EXIT_CODE,
            execution_time: timeout_seconds.saturating_mul(1000) as f64,
        }
    }

    /// Setup, launch or wait failed before a real exit status was observed.
    pub fn internal_error(message: impl fmt::Display) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: format!("Execution error: {}", message),
            exit_code: NO_EXIT_CODE,
            execution_time: 0.0,
        }
    }
}

/// Signal deaths are reported as the negated signal number.
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    match status.code() {
        Some(code) => code,
        None => status.signal().map(|sig| -sig).unwrap_or(NO_EXIT_CODE),
    }
}

/// Request-level failure message; no child process was started.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }

    /// Fault that escaped everything below the process boundary
    pub fn executor(err: impl fmt::Display) -> Self {
        Self::new(format!("Executor error: {}", err))
    }
}

/// The single message written per invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Executed(ExecutionResult),
    Rejected(ErrorResponse),
}

impl From<ExecutionResult> for Response {
    fn from(result: ExecutionResult) -> Self {
        Self::Executed(result)
    }
}

impl From<ErrorResponse> for Response {
    fn from(error: ErrorResponse) -> Self {
        Self::Rejected(error)
    }
}

/// Lifecycle of one supervised execution.
///
/// `Created` and `CleanedUp` are visited on every invocation; exactly one of the
/// three terminal outcomes sits between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionState {
    Created,
    Running,
    Completed,
    TimedOut,
    Failed,
    CleanedUp,
}

impl ExecutionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::TimedOut => "TIMED_OUT",
            Self::Failed => "FAILED",
            Self::CleanedUp => "CLEANED_UP",
        }
    }

    pub fn is_outcome(self) -> bool {
        matches!(self, Self::Completed | Self::TimedOut | Self::Failed)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
