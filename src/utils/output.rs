/// Child output capture
///
/// Each pipe is drained on its own thread so a child that fills one pipe while
/// the supervisor is polling never blocks. Readers hand their buffers back over
/// a channel, and collection is bounded by a deadline: a descendant that still
/// holds a pipe open cannot stall the caller.
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::io::Read;
use std::process::{ChildStderr, ChildStdout};
use std::thread;
use std::time::Instant;

/// Captured text of both streams
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Background readers attached to a running child
pub struct OutputCollector {
    rx: Receiver<(Stream, Vec<u8>)>,
    pending: usize,
}

impl OutputCollector {
    /// Start draining whichever streams were piped
    pub fn start(stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut pending = 0;
        if let Some(stdout) = stdout {
            spawn_reader(stdout, Stream::Stdout, tx.clone());
            pending += 1;
        }
        if let Some(stderr) = stderr {
            spawn_reader(stderr, Stream::Stderr, tx.clone());
            pending += 1;
        }
        Self { rx, pending }
    }

    /// Wait for both streams to reach EOF and decode them as UTF-8 (lossy).
    ///
    /// Returns `None` if a pipe is still open at `deadline`. With no deadline this
    /// waits for EOF however long it takes.
    pub fn collect_until(self, deadline: Option<Instant>) -> Option<CapturedOutput> {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        for _ in 0..self.pending {
            let received = match deadline {
                Some(deadline) => self.rx.recv_deadline(deadline),
                None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok((Stream::Stdout, bytes)) => stdout = bytes,
                Ok((Stream::Stderr, bytes)) => stderr = bytes,
                Err(RecvTimeoutError::Timeout) => {
                    log::debug!("Output pipes still open at collection deadline");
                    return None;
                }
                // a reader died without reporting; its stream counts as empty
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Some(CapturedOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    /// Stop waiting. Readers finish on their own once the pipes close.
    pub fn discard(self) {
        drop(self.rx);
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    mut stream: R,
    kind: Stream,
    tx: Sender<(Stream, Vec<u8>)>,
) {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Err(e) = stream.read_to_end(&mut buffer) {
            log::debug!("{:?} closed with error: {}", kind, e);
        }
        // receiver gone means the caller stopped waiting
        let _ = tx.send((kind, buffer));
    });
}
