use crate::config::types::{ExecutionConfig, Result as ExecResult, Runtime};
use crate::core::request::{decode_request, read_request_text};
use crate::core::supervisor::Supervisor;
use crate::core::types::{ErrorResponse, Response};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{IsTerminal, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

/// Run one code snippet read as JSON from stdin and print one JSON result.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read the request from this file instead of stdin
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Wall-clock timeout in seconds (overrides EXECUTION_TIMEOUT)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
    /// Advisory memory limit token, e.g. 256m (overrides MAX_MEMORY)
    #[arg(long, value_name = "TOKEN")]
    pub memory: Option<String>,
    /// Interpreter program (overrides EXECUTION_INTERPRETER)
    #[arg(long, value_name = "PROGRAM")]
    pub interpreter: Option<String>,
    /// Directory under which workspaces are created (overrides EXECUTION_WORKSPACE_ROOT)
    #[arg(long, value_name = "DIR")]
    pub workspace_root: Option<PathBuf>,
    /// Pretty-print the result
    #[arg(long)]
    pub pretty: bool,
}

impl Cli {
    /// Environment first, then flags on top
    pub fn load_config(&self) -> ExecResult<ExecutionConfig> {
        self.apply_overrides(ExecutionConfig::from_env()?)
    }

    fn apply_overrides(&self, mut config: ExecutionConfig) -> ExecResult<ExecutionConfig> {
        if let Some(timeout) = self.timeout {
            config = config.with_timeout_seconds(timeout)?;
        }
        if let Some(memory) = &self.memory {
            config = config.with_memory_limit(memory);
        }
        if let Some(program) = &self.interpreter {
            config = config.with_runtime(Runtime::python(program.as_str()));
        }
        if let Some(root) = &self.workspace_root {
            config = config.with_workspace_root(root.clone());
        }
        Ok(config)
    }

    fn read_request(&self) -> std::result::Result<String, ErrorResponse> {
        match &self.input {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                ErrorResponse::executor(format!("failed to read {}: {}", path.display(), e))
            }),
            None => {
                let stdin = std::io::stdin();
                let is_terminal = stdin.is_terminal();
                Ok(read_request_text(stdin.lock(), is_terminal))
            }
        }
    }
}

/// Turn one request message into the one response message.
///
/// Configuration is only loaded once the request carries code, so a bad
/// environment never masks a missing-code error. Panics below this point are
/// reported as executor errors.
pub fn handle_request<F>(text: &str, load_config: F) -> Response
where
    F: FnOnce() -> ExecResult<ExecutionConfig>,
{
    let request = match decode_request(text) {
        Ok(request) => request,
        Err(e) => {
            log::info!("Rejected request: {}", e);
            return ErrorResponse::from(e).into();
        }
    };

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => return ErrorResponse::executor(e).into(),
    };

    if !request.test_cases.is_empty() {
        log::debug!(
            "{} test case(s) accepted; test cases are not run",
            request.test_cases.len()
        );
    }

    let supervisor = Supervisor::new(config);
    match panic::catch_unwind(AssertUnwindSafe(|| supervisor.execute(&request.code))) {
        Ok(result) => result.into(),
        Err(payload) => ErrorResponse::executor(panic_message(payload.as_ref())).into(),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "internal panic".to_string()
    }
}

fn emit<W: Write>(mut out: W, response: &Response, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    }
    .context("failed to serialize response")?;
    writeln!(out, "{}", text).context("failed to write response")?;
    out.flush().context("failed to flush response")?;
    Ok(())
}

pub fn run() -> Result<()> {
    // Logs go to stderr; stdout carries only the response
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let response = match cli.read_request() {
        Ok(text) => handle_request(&text, || cli.load_config()),
        Err(error) => error.into(),
    };

    emit(std::io::stdout().lock(), &response, cli.pretty)
}
