/// Core configuration types and errors for execbox
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default wall-clock timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Default advisory memory ceiling token
pub const DEFAULT_MEMORY_LIMIT: &str = "128m";

/// Program used to interpret submitted source when none is configured
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Advisory memory ceiling.
///
/// The raw token is always kept so it can be reported back verbatim. `bytes` is
/// populated when the token parses as `<n>[k|m|g]`. Nothing in this crate applies
/// the value to the child process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLimit {
    pub token: String,
    pub bytes: Option<u64>,
}

impl MemoryLimit {
    pub fn parse(token: &str) -> Self {
        let token = token.trim().to_string();
        let bytes = parse_memory_token(&token);
        Self { token, bytes }
    }

    pub fn is_valid(&self) -> bool {
        self.bytes.is_some()
    }
}

impl Default for MemoryLimit {
    fn default() -> Self {
        Self::parse(DEFAULT_MEMORY_LIMIT)
    }
}

impl fmt::Display for MemoryLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

fn parse_memory_token(token: &str) -> Option<u64> {
    let lower = token.to_ascii_lowercase();
    let (digits, multiplier) = match lower.chars().last()? {
        'k' => (&lower[..lower.len() - 1], 1024),
        'm' => (&lower[..lower.len() - 1], 1024 * 1024),
        'g' => (&lower[..lower.len() - 1], 1024 * 1024 * 1024),
        c if c.is_ascii_digit() => (lower.as_str(), 1),
        _ => return None,
    };
    let value: u64 = digits.parse().ok()?;
    value.checked_mul(multiplier)
}

/// Runtime capable of interpreting the submitted source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    /// Interpreter program (bare name resolved through PATH, or absolute path)
    pub program: String,
    /// Extra arguments placed before the source path
    pub args: Vec<String>,
    /// File name of the single source artifact inside the workspace
    pub source_name: String,
    /// Environment variable pointed at the workspace so sibling modules resolve
    pub module_path_var: String,
}

impl Runtime {
    pub fn python(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            source_name: "main.py".to_string(),
            module_path_var: "PYTHONPATH".to_string(),
        }
    }

    /// Full command line for a source file
    pub fn command_for(&self, source: &std::path::Path) -> Vec<String> {
        let mut command = Vec::with_capacity(self.args.len() + 2);
        command.push(self.program.clone());
        command.extend(self.args.iter().cloned());
        command.push(source.to_string_lossy().to_string());
        command
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::python(DEFAULT_INTERPRETER)
    }
}

/// Process-wide execution configuration, loaded once per invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Wall-clock timeout in whole seconds (always > 0)
    pub timeout_seconds: u64,
    /// Advisory memory ceiling (recorded, not enforced)
    pub memory_limit: MemoryLimit,
    /// Interpreter used for the source file
    pub runtime: Runtime,
    /// Parent directory under which per-run workspaces are created
    pub workspace_root: PathBuf,
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Result<Self> {
        if timeout_seconds == 0 {
            return Err(ExecError::Config(
                "timeout must be a positive number of seconds".to_string(),
            ));
        }
        self.timeout_seconds = timeout_seconds;
        Ok(self)
    }

    pub fn with_runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_workspace_root(mut self, root: PathBuf) -> Self {
        self.workspace_root = root;
        self
    }

    pub fn with_memory_limit(mut self, token: &str) -> Self {
        self.memory_limit = MemoryLimit::parse(token);
        self
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            memory_limit: MemoryLimit::default(),
            runtime: Runtime::default(),
            workspace_root: std::env::temp_dir(),
        }
    }
}

/// Custom error types for execbox
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Process error: {0}")]
    Process(String),
}

/// Result type alias for execbox operations
pub type Result<T> = std::result::Result<T, ExecError>;
