//! Wait-status translation.
//!
//! The bridge's own exit code mirrors the child's fate using the
//! conventional POSIX mapping: a normal exit passes the child's code
//! through, a signal death becomes `128 + signal`. Callers that branch on
//! exit-code ranges (e.g. treating >= 128 as "killed") rely on this.
//!
//! Translation works on the raw waitpid(2) status word so every signal
//! number the kernel can report is representable, real-time signals
//! included.

use nix::libc;

/// How the child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// Normal termination with the child's own exit code.
    Code(i32),
    /// Termination by the given signal number.
    Signaled(i32),
}

impl ChildExit {
    /// Translate a raw wait status into a termination record.
    ///
    /// Returns `None` for non-terminal statuses (stopped, continued);
    /// those never end a wait without trace flags, but the caller keeps
    /// waiting if one shows up.
    pub fn from_raw_status(status: i32) -> Option<Self> {
        if libc::WIFEXITED(status) {
            Some(ChildExit::Code(libc::WEXITSTATUS(status)))
        } else if libc::WIFSIGNALED(status) {
            Some(ChildExit::Signaled(libc::WTERMSIG(status)))
        } else {
            None
        }
    }

    /// The process exit code the bridge reports for this termination.
    pub fn exit_code(self) -> i32 {
        match self {
            ChildExit::Code(code) => code,
            ChildExit::Signaled(signal) => 128 + signal,
        }
    }
}
