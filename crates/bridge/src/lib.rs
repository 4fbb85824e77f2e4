//! # ttybridge
//!
//! Terminal-bridging backend for a remote/web terminal front end.
//!
//! The bridge spawns one command attached to a fresh pseudo-terminal,
//! relays the child's terminal output verbatim to its own standard output,
//! and accepts the framed control protocol (see the `protocol` crate) on
//! standard input to inject keystrokes, deliver signals, and propagate
//! window-size changes.
//!
//! ## Architecture
//!
//! ```text
//!  stdin ──frames──▶ ┌────────────────────────────┐
//!                    │  event loop (bridge::run)  │
//!                    │   buffer → decode → dispatch ──▶ pty child
//!  stdout ◀──bytes── │   pty events ◀── reader task ◀── pty master
//!                    └────────────────────────────┘
//! ```
//!
//! The bridge exits with the child's own exit code, `128 + signal` if the
//! child was killed, or `0` if the controller closed the control stream
//! first (the child is then sent SIGTERM).
//!
//! ## Modules
//!
//! - [`pty`]: pty allocation, child spawn, signal/resize/reap
//! - [`dispatch`]: applies decoded commands to the child
//! - [`bridge`]: the select loop multiplexing control input and pty output
//! - [`exit`]: wait-status to exit-code translation
//! - [`config`]: TOML configuration with env overrides

pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod exit;
pub mod pty;

pub use bridge::{run, BridgeError};
pub use config::Config;
pub use exit::ChildExit;
pub use pty::{ChildControl, PtyChild, PtyError, PtyEvent};
