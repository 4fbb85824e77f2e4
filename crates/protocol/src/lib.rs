//! # ttybridge Protocol Library
//!
//! Wire-level definitions for the ttybridge control stream.
//!
//! ## Overview
//!
//! A front end drives a bridge process by writing binary frames to its
//! standard input. Each frame is an opcode, a 16-bit big-endian payload
//! length, and the payload itself:
//!
//! ```text
//! byte 0       : opcode (1=Write, 2=Signal, 3=Resize)
//! bytes 1-2    : unsigned 16-bit payload length L, big-endian
//! bytes 3..3+L : payload
//! ```
//!
//! The bridge's standard output carries the raw terminal bytes of the
//! child process; it is not framed.
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{try_decode, Command};
//!
//! // A front end encodes keystrokes as a Write command...
//! let bytes = Command::Write(b"ls\n".to_vec()).encode().unwrap();
//!
//! // ...and the bridge decodes them from its accumulation buffer.
//! let (frame, consumed) = try_decode(&bytes).unwrap();
//! assert_eq!(consumed, bytes.len());
//! assert_eq!(Command::parse(&frame).unwrap(), Command::Write(b"ls\n".to_vec()));
//! ```
//!
//! ## Modules
//!
//! - [`framing`]: frame codec over an arbitrarily chunked byte stream
//! - [`command`]: opcode and payload-layout definitions
//! - [`error`]: error types

pub mod command;
pub mod error;
pub mod framing;

pub use command::{Command, Opcode};
pub use error::ProtocolError;
pub use framing::{encode, try_decode, Frame, HEADER_LEN, MAX_PAYLOAD_LEN};
