//! Child-process plumbing for one bot executable.
//!
//! A [`BotProcess`] owns the child and two background reader threads that
//! continuously drain its stdout and stderr, so a bot that keeps writing
//! never blocks on a full pipe even when the referee is not reading.
//! Reads are served from the drained buffers and never block past the
//! requested wait.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{instrument, trace};

const KILL_POLL_INTERVAL: Duration = Duration::from_millis(5);

enum Chunk {
    Data(Vec<u8>),
    Failed(io::Error),
}

/// A spawned bot with byte-stream access to its standard streams.
///
/// The process is owned exclusively by its round and shut down on drop.
#[derive(Debug)]
pub struct BotProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Receiver<Chunk>,
    stderr: Receiver<Chunk>,
    grace: Duration,
}

impl BotProcess {
    /// Launch `path` with piped standard streams.
    ///
    /// `grace` is how long [`shutdown`](Self::shutdown) waits for a
    /// voluntary exit before force-killing.
    #[instrument(skip(grace))]
    pub fn spawn(path: &Path, grace: Duration) -> anyhow::Result<BotProcess> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("could not launch bot {}", path.display()))?;
        trace!(pid = child.id(), "bot launched");
        let stdin = child.stdin.take().expect("stdin is piped");
        let stdout = drain(child.stdout.take().expect("stdout is piped"));
        let stderr = drain(child.stderr.take().expect("stderr is piped"));
        Ok(BotProcess {
            child,
            stdin: Some(stdin),
            stdout,
            stderr,
            grace,
        })
    }

    /// Deliver `input` to the bot's stdin.
    ///
    /// Fails with `BrokenPipe` once the peer is gone.
    pub fn feed(&mut self, input: &str) -> io::Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "bot stdin already closed")
        })?;
        stdin.write_all(input.as_bytes())?;
        stdin.flush()
    }

    /// Whatever stdout produced so far, without blocking.
    pub fn read_available(&mut self) -> io::Result<String> {
        self.read_for(Duration::ZERO)
    }

    /// Block up to `wait` for stdout data, then return everything buffered.
    ///
    /// Returns an empty string when the wait elapses without output; the
    /// caller keeps track of its own deadline.
    pub fn read_for(&mut self, wait: Duration) -> io::Result<String> {
        let mut bytes = Vec::new();
        match self.stdout.recv_timeout(wait) {
            Ok(Chunk::Data(chunk)) => bytes.extend_from_slice(&chunk),
            Ok(Chunk::Failed(e)) => return Err(e),
            Err(RecvTimeoutError::Timeout) => return Ok(String::new()),
            Err(RecvTimeoutError::Disconnected) => {
                // Stream closed and fully drained: the bot is gone, so no
                // data can arrive within the wait either.
                thread::sleep(wait);
                return Ok(String::new());
            }
        }
        loop {
            match self.stdout.try_recv() {
                Ok(Chunk::Data(chunk)) => bytes.extend_from_slice(&chunk),
                Ok(Chunk::Failed(e)) => return Err(e),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Drain whatever stderr produced so far, without blocking.
    pub fn read_stderr(&mut self) -> String {
        let mut bytes = Vec::new();
        loop {
            match self.stderr.try_recv() {
                Ok(Chunk::Data(chunk)) => bytes.extend_from_slice(&chunk),
                Ok(Chunk::Failed(_)) | Err(_) => break,
            }
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// True while the process has not exited.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Ask the bot to exit (EOF on stdin), wait for the grace period, then
    /// force-kill and reap it. Safe to call more than once.
    #[instrument(skip(self), fields(pid = self.child.id()))]
    pub fn shutdown(&mut self) {
        self.stdin.take();
        let deadline = Instant::now() + self.grace;
        while Instant::now() < deadline {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    trace!(%status, "bot exited on its own");
                    return;
                }
                Ok(None) => thread::sleep(KILL_POLL_INTERVAL),
                Err(_) => break,
            }
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        trace!("bot force-killed");
    }
}

impl Drop for BotProcess {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn drain(stream: impl Read + Send + 'static) -> Receiver<Chunk> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut stream = stream;
        let mut buf = [0u8; 4096];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(Chunk::Data(buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Chunk::Failed(e));
                    break;
                }
            }
        }
    });
    rx
}
