use crate::config::types::{ExecutionConfig, Result};
use crate::core::types::{ExecutionResult, ExecutionState};
use crate::exec::executor::{LaunchSpec, ProcessExecutor, WaitOutcome};
use crate::safety::workspace::Workspace;
use std::path::PathBuf;

/// Everything observed during one `execute` call.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub result: ExecutionResult,
    /// States visited, in order
    pub states: Vec<ExecutionState>,
    /// Directory the attempt ran in, if one was created
    pub workspace: Option<PathBuf>,
    /// Child pid, if a child was started
    pub pid: Option<u32>,
}

impl ExecutionReport {
    pub fn outcome(&self) -> Option<ExecutionState> {
        self.states.iter().copied().find(|state| state.is_outcome())
    }
}

/// Runs one code snippet per call in a private, always-removed workspace.
pub struct Supervisor {
    config: ExecutionConfig,
}

impl Supervisor {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    /// Execute `code` and return its normalized result. Never fails.
    pub fn execute(&self, code: &str) -> ExecutionResult {
        self.execute_with_report(code).result
    }

    pub fn execute_with_report(&self, code: &str) -> ExecutionReport {
        let mut states = Vec::with_capacity(4);
        let mut transition = |state: ExecutionState| {
            log::debug!("execution -> {}", state);
            states.push(state);
        };

        transition(ExecutionState::Created);
        if let Some(bytes) = self.config.memory_limit.bytes {
            log::debug!(
                "Memory limit {} ({} bytes) is advisory and not applied to the child",
                self.config.memory_limit,
                bytes
            );
        }

        let mut workspace: Option<Workspace> = None;
        let mut pid = None;
        let attempt = self.attempt(code, &mut workspace, &mut transition);

        let result = match attempt {
            Ok(WaitOutcome::Exited {
                pid: child,
                status,
                output,
                elapsed,
            }) => {
                pid = Some(child);
                transition(ExecutionState::Completed);
                ExecutionResult::completed(status, output.stdout, output.stderr, elapsed)
            }
            Ok(WaitOutcome::TimedOut { pid: child, elapsed }) => {
                pid = Some(child);
                transition(ExecutionState::TimedOut);
                log::info!(
                    "pid {} timed out after {:?} (limit {}s)",
                    child,
                    elapsed,
                    self.config.timeout_seconds
                );
                ExecutionResult::timed_out(self.config.timeout_seconds)
            }
            Err(e) => {
                transition(ExecutionState::Failed);
                log::warn!("Execution failed: {}", e);
                ExecutionResult::internal_error(e)
            }
        };

        let workspace_dir = workspace.as_ref().map(|ws| ws.dir().to_path_buf());
        if let Some(mut ws) = workspace.take() {
            ws.release();
        }
        transition(ExecutionState::CleanedUp);

        ExecutionReport {
            result,
            states,
            workspace: workspace_dir,
            pid,
        }
    }

    /// Workspace setup and the supervised run. The workspace is parked in `slot`
    /// so the caller releases it whatever this returns.
    fn attempt(
        &self,
        code: &str,
        slot: &mut Option<Workspace>,
        transition: &mut impl FnMut(ExecutionState),
    ) -> Result<WaitOutcome> {
        let runtime = &self.config.runtime;
        let workspace = slot.insert(Workspace::create(&self.config.workspace_root)?);
        let source = workspace.write_source(&runtime.source_name, code)?;

        let spec = LaunchSpec {
            command: runtime.command_for(&source),
            workdir: workspace.dir().to_path_buf(),
            env_overrides: vec![(
                runtime.module_path_var.clone(),
                workspace.dir().to_string_lossy().to_string(),
            )],
        };

        log::debug!(
            "Running {} in workspace {}",
            runtime.program,
            workspace.run_id()
        );
        transition(ExecutionState::Running);
        ProcessExecutor::new(self.config.timeout()).run(&spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Runtime;

    fn shell_config(root: &std::path::Path, timeout_seconds: u64) -> ExecutionConfig {
        let runtime = Runtime {
            program: "sh".to_string(),
            args: Vec::new(),
            source_name: "main.sh".to_string(),
            module_path_var: "EXECBOX_MODULE_PATH".to_string(),
        };
        ExecutionConfig::default()
            .with_timeout_seconds(timeout_seconds)
            .unwrap()
            .with_runtime(runtime)
            .with_workspace_root(root.to_path_buf())
    }

    #[test]
    fn test_completed_path_states() {
        let root = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(shell_config(root.path(), 5));
        let report = supervisor.execute_with_report("echo hi");

        assert_eq!(
            report.states,
            vec![
                ExecutionState::Created,
                ExecutionState::Running,
                ExecutionState::Completed,
                ExecutionState::CleanedUp
            ]
        );
        assert_eq!(report.result.stdout, "hi\n");
        assert!(report.result.success);
        assert!(!report.workspace.unwrap().exists());
    }

    #[test]
    fn test_module_path_points_at_workspace() {
        let root = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(shell_config(root.path(), 5));
        let report = supervisor.execute_with_report("printf %s \"$EXECBOX_MODULE_PATH\"");

        let workspace = report.workspace.unwrap();
        assert_eq!(report.result.stdout, workspace.to_string_lossy());
    }

    #[test]
    fn test_source_file_is_written() {
        let root = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(shell_config(root.path(), 5));
        let result = supervisor.execute("ls");
        assert_eq!(result.stdout, "main.sh\n");
    }

    #[test]
    fn test_timed_out_path_states() {
        let root = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(shell_config(root.path(), 1));
        let report = supervisor.execute_with_report("sleep 30");

        assert_eq!(report.outcome(), Some(ExecutionState::TimedOut));
        assert_eq!(report.states.last(), Some(&ExecutionState::CleanedUp));
        assert_eq!(report.result.execution_time, 1000.0);
        assert!(report.pid.is_some());
    }

    #[test]
    fn test_spawn_failure_path_states() {
        let root = tempfile::tempdir().unwrap();
        let mut config = shell_config(root.path(), 5);
        config.runtime.program = "/nonexistent/execbox-interpreter".to_string();
        let report = Supervisor::new(config).execute_with_report("echo hi");

        assert_eq!(
            report.states,
            vec![
                ExecutionState::Created,
                ExecutionState::Running,
                ExecutionState::Failed,
                ExecutionState::CleanedUp
            ]
        );
        assert!(report.result.stderr.starts_with("Execution error: "));
        assert_eq!(report.result.exit_code, -1);
        assert_eq!(report.result.execution_time, 0.0);
        assert!(report.pid.is_none());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_workspace_failure_never_reaches_running() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let report =
            Supervisor::new(shell_config(&blocker, 5)).execute_with_report("echo unreachable");

        assert_eq!(
            report.states,
            vec![
                ExecutionState::Created,
                ExecutionState::Failed,
                ExecutionState::CleanedUp
            ]
        );
        assert!(report.workspace.is_none());
        assert!(report.result.stderr.contains("Workspace error"));
    }
}
