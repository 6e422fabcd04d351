/// Child process launch and wall-clock supervision
use crate::config::types::{ExecError, Result};
use crate::utils::output::{CapturedOutput, OutputCollector};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How often a running child is polled
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Time between SIGTERM and SIGKILL on forced termination
const TERMINATION_GRACE: Duration = Duration::from_millis(100);

/// What to launch
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Program followed by its arguments
    pub command: Vec<String>,
    pub workdir: PathBuf,
    /// Variables set on top of the inherited environment
    pub env_overrides: Vec<(String, String)>,
}

/// How a supervised child ended
#[derive(Debug)]
pub enum WaitOutcome {
    /// The child exited (or was killed by a signal) on its own
    Exited {
        pid: u32,
        status: ExitStatus,
        output: CapturedOutput,
        elapsed: Duration,
    },
    /// The wall-clock budget ran out; the child was killed and reaped, or a
    /// descendant outside its group still held the output pipes
    TimedOut { pid: u32, elapsed: Duration },
}

/// Launches one child in its own process group and waits for it, bounded by a timeout
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Launch and wait. Returns `Err` only when the child could not be started
    /// or could not be monitored; in the latter case it has already been killed.
    pub fn run(&self, spec: &LaunchSpec) -> Result<WaitOutcome> {
        let program = spec
            .command
            .first()
            .ok_or_else(|| ExecError::Config("Empty command provided".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(&spec.command[1..])
            .current_dir(&spec.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // own group, so termination reaches everything the child forks
            .process_group(0);

        for (key, value) in &spec.env_overrides {
            cmd.env(key, value);
        }

        let start_time = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| ExecError::Process(format!("Failed to start {}: {}", program, e)))?;
        let pid = child.id();

        log::debug!("Started pid {} in {}", pid, spec.workdir.display());

        let collector = OutputCollector::start(child.stdout.take(), child.stderr.take());
        self.wait_with_timeout(child, collector, start_time, pid)
    }

    fn wait_with_timeout(
        &self,
        mut child: Child,
        collector: OutputCollector,
        start_time: Instant,
        pid: u32,
    ) -> Result<WaitOutcome> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let elapsed = start_time.elapsed();
                    // Leftover background processes would keep the pipes open
                    sweep_group(pid);
                    // None only for a timeout too large to represent as an Instant
                    let deadline = start_time.checked_add(self.timeout);
                    return Ok(match collector.collect_until(deadline) {
                        Some(output) => WaitOutcome::Exited {
                            pid,
                            status,
                            output,
                            elapsed,
                        },
                        None => {
                            log::info!(
                                "pid {} exited but its output pipes outlived {:?}",
                                pid,
                                self.timeout
                            );
                            WaitOutcome::TimedOut {
                                pid,
                                elapsed: start_time.elapsed(),
                            }
                        }
                    });
                }
                Ok(None) => {
                    if start_time.elapsed() >= self.timeout {
                        log::debug!("pid {} exceeded {:?}; terminating", pid, self.timeout);
                        terminate_process(&mut child, pid);
                        collector.discard();
                        return Ok(WaitOutcome::TimedOut {
                            pid,
                            elapsed: start_time.elapsed(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    terminate_process(&mut child, pid);
                    collector.discard();
                    return Err(ExecError::Process(format!(
                        "Process monitoring error: {}",
                        e
                    )));
                }
            }
        }
    }
}

/// SIGTERM the group, give it a moment, then SIGKILL and reap the leader.
fn terminate_process(child: &mut Child, pid: u32) {
    signal_group(pid, Signal::SIGTERM);

    let deadline = Instant::now() + TERMINATION_GRACE;
    while Instant::now() < deadline {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(_) => break,
        }
    }

    signal_group(pid, Signal::SIGKILL);
    if let Err(e) = child.kill() {
        // already exited and waiting to be reaped
        log::trace!("kill({}) after group kill: {}", pid, e);
    }
    if let Err(e) = child.wait() {
        log::warn!("Failed to reap pid {}: {}", pid, e);
    }
}

fn sweep_group(pid: u32) {
    signal_group(pid, Signal::SIGKILL);
}

fn signal_group(pid: u32, signal: Signal) {
    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => log::warn!("Failed to send {} to process group {}: {}", signal, pid, e),
    }
}
