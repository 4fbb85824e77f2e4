//! Command dispatch.
//!
//! Maps decoded control commands onto the child process operations. This
//! is deliberately thin: the payload layouts were already validated by
//! `Command::parse`, and the child operations carry their own error
//! reporting.

use protocol::Command;

use crate::pty::{ChildControl, PtyError};

/// Apply one decoded command to the child.
///
/// Unknown opcodes are reported on the diagnostic channel and otherwise
/// ignored; the stream stays in sync and later frames are unaffected.
pub fn dispatch(cmd: Command, child: &mut impl ChildControl) -> Result<(), PtyError> {
    match cmd {
        Command::Write(data) => child.write(&data),
        Command::Signal(signum) => child.signal(i32::from(signum)),
        Command::Resize { rows, cols } => child.resize(rows, cols),
        Command::Unknown { opcode, .. } => {
            tracing::warn!(opcode = opcode, "unknown control opcode, ignoring frame");
            Ok(())
        }
    }
}
