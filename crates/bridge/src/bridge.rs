//! The bridge event loop.
//!
//! One task owns all mutable state: the accumulation buffer of unparsed
//! control bytes and the child handle. It multiplexes two sources with
//! `select!`: the control stream (framed commands from the front end) and
//! the pty event channel fed by the blocking reader task. Child output is
//! passed through to the terminal stream byte for byte; control bytes are
//! decoded into frames and dispatched in arrival order. No ordering is
//! guaranteed between the two directions.

use bytes::{Buf, BytesMut};
use nix::sys::signal::Signal;
use protocol::{framing, Command, ProtocolError};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::dispatch::dispatch;
use crate::pty::{wait_child, ChildControl, PtyChild, PtyError, PtyEvent};

/// Errors that end a bridge run abnormally.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The control stream violated the protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A child process operation failed.
    #[error(transparent)]
    Pty(#[from] PtyError),

    /// An I/O failure on the control or terminal stream, or on the pty
    /// master beyond the normal child-side close.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unparsed control bytes exceeded the configured limit, usually a
    /// frame header declaring a length the sender never delivers.
    #[error("control buffer overflow: {buffered} bytes buffered, limit is {max}")]
    ControlBufferOverflow {
        /// Bytes currently buffered.
        buffered: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The blocking reap task failed to complete.
    #[error("wait task failed: {0}")]
    WaitTask(String),
}

/// Read chunk size for the control stream.
const CONTROL_READ_SIZE: usize = 4096;

/// Runs the bridge until the child is gone or the controller disconnects.
///
/// Returns the process exit code to report:
/// - the child's own exit code (or `128 + signal`) once its terminal side
///   closes and it has been reaped;
/// - `0` when the control stream hits end-of-stream first, after sending
///   the child SIGTERM.
///
/// Generic over the control and terminal streams so tests can drive the
/// loop with in-memory duplex pipes; `main` passes stdin and stdout.
pub async fn run<C, O>(
    mut child: PtyChild,
    mut events: mpsc::Receiver<PtyEvent>,
    mut control: C,
    mut output: O,
    max_buffered: usize,
) -> Result<i32, BridgeError>
where
    C: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(CONTROL_READ_SIZE);
    let mut chunk = vec![0u8; CONTROL_READ_SIZE];

    loop {
        tokio::select! {
            read = control.read(&mut chunk) => {
                let n = read?;
                if n == 0 {
                    // Controller disconnected: stop the child and report a
                    // clean shutdown.
                    tracing::info!("control stream closed, terminating child");
                    if let Err(e) = child.signal(Signal::SIGTERM as i32) {
                        tracing::debug!(error = %e, "child already gone on shutdown");
                    }
                    return Ok(0);
                }

                buf.extend_from_slice(&chunk[..n]);
                while let Some((frame, consumed)) = framing::try_decode(&buf) {
                    buf.advance(consumed);
                    let cmd = Command::parse(&frame)?;
                    dispatch(cmd, &mut child)?;
                }

                if buf.len() > max_buffered {
                    return Err(BridgeError::ControlBufferOverflow {
                        buffered: buf.len(),
                        max: max_buffered,
                    });
                }
            }

            event = events.recv() => {
                match event {
                    Some(PtyEvent::Output(data)) => {
                        output.write_all(&data).await?;
                        output.flush().await?;
                    }
                    Some(PtyEvent::Closed) | None => {
                        // Child's terminal side is gone: reap it and exit
                        // with its translated status.
                        let pid = child.pid();
                        let exit = tokio::task::spawn_blocking(move || wait_child(pid))
                            .await
                            .map_err(|e| BridgeError::WaitTask(e.to_string()))??;

                        tracing::info!(pid = %pid, code = exit.exit_code(), "child exited");
                        return Ok(exit.exit_code());
                    }
                    Some(PtyEvent::Failed(e)) => {
                        return Err(BridgeError::Io(e));
                    }
                }
            }
        }
    }
}
