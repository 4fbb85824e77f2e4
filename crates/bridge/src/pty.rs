//! Child process management.
//!
//! This module owns all raw process and terminal control: allocating the
//! pty pair, spawning the target command on the slave side, and the four
//! operations the control protocol can request against it (write, signal,
//! resize, reap). Everything non-portable lives behind [`ChildControl`] so
//! the dispatcher and event loop can be tested against a fake.

use std::io::{Read, Write};

use nix::errno::Errno;
use nix::unistd::Pid;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::exit::ChildExit;

/// Errors that can occur during child process operations.
#[derive(Error, Debug)]
pub enum PtyError {
    /// Failed to allocate the pty or spawn the command.
    #[error("failed to spawn child: {0}")]
    SpawnFailed(String),

    /// Failed to write to the pty master.
    #[error("failed to write to pty: {0}")]
    WriteFailed(String),

    /// Failed to resize the pty.
    #[error("failed to resize pty: {0}")]
    ResizeFailed(String),

    /// Failed to deliver a signal to the child.
    #[error("failed to signal child: {0}")]
    SignalFailed(String),

    /// Failed to reap the child.
    #[error("failed to wait for child: {0}")]
    WaitFailed(String),
}

/// Buffer size for reading from the pty master.
const READ_BUFFER_SIZE: usize = 4096;

/// Channel capacity for pty events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// One event observed on the pty master.
#[derive(Debug)]
pub enum PtyEvent {
    /// Terminal bytes emitted by the child, to be passed through verbatim.
    Output(Vec<u8>),
    /// The child's side of the terminal is gone (EOF or EIO on the
    /// master). Normal end-of-child condition: the process is ready to be
    /// reaped.
    Closed,
    /// Any other read failure on the master. Fatal.
    Failed(std::io::Error),
}

/// The operations the control protocol can perform against the child.
///
/// [`PtyChild`] is the real implementation; unit tests of the dispatcher
/// and event loop substitute a recording fake.
pub trait ChildControl {
    /// Write raw bytes to the pty master, delivered to the child as if
    /// typed at its terminal.
    fn write(&mut self, data: &[u8]) -> Result<(), PtyError>;

    /// Deliver the given signal number to the child process.
    fn signal(&mut self, signum: i32) -> Result<(), PtyError>;

    /// Resize the child's terminal. Pixel dimensions are set to zero.
    fn resize(&mut self, rows: u16, cols: u16) -> Result<(), PtyError>;
}

/// A command spawned inside a new pseudo-terminal.
///
/// Owns the pty master and the child handle. Exactly one exists per
/// bridge run, held by the event loop for its entire lifetime.
pub struct PtyChild {
    /// The pty master handle.
    master: Box<dyn MasterPty + Send>,

    /// The writer for the pty master.
    writer: Box<dyn Write + Send>,

    /// OS process id of the child.
    pid: Pid,

    /// Keeps the spawned child handle alive for the life of the bridge.
    _child: Box<dyn Child + Send + Sync>,
}

impl PtyChild {
    /// Spawns `program` with `args` attached to a fresh pty of the given
    /// size, with the slave side as its controlling terminal and
    /// stdin/stdout/stderr.
    pub fn spawn(
        program: &str,
        args: &[String],
        rows: u16,
        cols: u16,
    ) -> Result<Self, PtyError> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::SpawnFailed(e.to_string()))?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(args);

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::SpawnFailed(e.to_string()))?;

        // Drop our copy of the slave so the master sees EOF/EIO once the
        // child's side is gone.
        drop(pair.slave);

        let pid = child
            .process_id()
            .ok_or_else(|| PtyError::SpawnFailed("child has no pid".to_string()))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::SpawnFailed(e.to_string()))?;

        tracing::debug!(pid = pid, program = program, "spawned child in pty");

        Ok(Self {
            master: pair.master,
            writer,
            pid: Pid::from_raw(pid as i32),
            _child: child,
        })
    }

    /// Returns the child's process id.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Returns the current pty size.
    pub fn size(&self) -> Result<PtySize, PtyError> {
        self.master
            .get_size()
            .map_err(|e| PtyError::ResizeFailed(e.to_string()))
    }

    /// Starts the blocking reader task over the pty master.
    ///
    /// The task reads until the child's terminal side closes and reports
    /// everything it sees as [`PtyEvent`]s on the returned channel. EOF
    /// and EIO both mean "child side gone" and become [`PtyEvent::Closed`];
    /// any other error is [`PtyEvent::Failed`].
    pub fn start_output_task(&self) -> Result<mpsc::Receiver<PtyEvent>, PtyError> {
        let mut reader = self
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::SpawnFailed(e.to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tokio::task::spawn_blocking(move || {
            let mut buffer = [0u8; READ_BUFFER_SIZE];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => {
                        let _ = tx.blocking_send(PtyEvent::Closed);
                        break;
                    }
                    Ok(n) => {
                        if tx.blocking_send(PtyEvent::Output(buffer[..n].to_vec())).is_err() {
                            // Event loop is gone; nothing left to do.
                            break;
                        }
                    }
                    Err(e) if e.raw_os_error() == Some(nix::libc::EIO) => {
                        let _ = tx.blocking_send(PtyEvent::Closed);
                        break;
                    }
                    Err(e) => {
                        let _ = tx.blocking_send(PtyEvent::Failed(e));
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}

impl ChildControl for PtyChild {
    fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.writer
            .write_all(data)
            .map_err(|e| PtyError::WriteFailed(e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| PtyError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    fn signal(&mut self, signum: i32) -> Result<(), PtyError> {
        // Deliver the raw number and let kill(2) judge it: real-time
        // signals and 0 (existence probe) are valid even though they have
        // no name in any signal table.
        let ret = unsafe { nix::libc::kill(self.pid.as_raw(), signum) };
        Errno::result(ret)
            .map_err(|e| PtyError::SignalFailed(format!("signal {}: {}", signum, e)))?;

        tracing::debug!(pid = %self.pid, signal = signum, "delivered signal to child");
        Ok(())
    }

    fn resize(&mut self, rows: u16, cols: u16) -> Result<(), PtyError> {
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::ResizeFailed(e.to_string()))?;

        tracing::debug!(rows = rows, cols = cols, "resized pty");
        Ok(())
    }
}

/// Blocks until the child terminates and returns its translated status.
///
/// Reaps through raw waitpid(2) so a death by any signal number the
/// kernel can deliver, real-time ones included, translates cleanly.
pub fn wait_child(pid: Pid) -> Result<ChildExit, PtyError> {
    let mut status: nix::libc::c_int = 0;
    loop {
        let ret = unsafe { nix::libc::waitpid(pid.as_raw(), &mut status, 0) };
        if let Err(e) = Errno::result(ret) {
            if e == Errno::EINTR {
                continue;
            }
            return Err(PtyError::WaitFailed(e.to_string()));
        }
        if let Some(exit) = ChildExit::from_raw_status(status) {
            return Ok(exit);
        }
        // Non-terminal status (stopped/continued); keep waiting.
    }
}
