//! Control command definitions.
//!
//! A [`Frame`] is raw transport: opcode plus opaque payload. This module
//! gives the payloads their meaning. Three operations are defined; any
//! other opcode decodes to [`Command::Unknown`] so a front end speaking a
//! newer protocol revision cannot desynchronize the stream.

use crate::error::ProtocolError;
use crate::framing::{encode, Frame};

/// Known frame opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Raw bytes delivered to the child's terminal input.
    Write = 1,
    /// A signal delivered to the child process.
    Signal = 2,
    /// A terminal window-size change.
    Resize = 3,
}

/// A fully decoded control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write the bytes verbatim to the child's terminal, as if typed.
    Write(Vec<u8>),
    /// Deliver the given signal number to the child.
    Signal(u16),
    /// Resize the child's terminal. Pixel dimensions are always zero.
    Resize {
        /// Terminal height in rows.
        rows: u16,
        /// Terminal width in columns.
        cols: u16,
    },
    /// An opcode outside the known set. Carried through, payload
    /// included, for diagnostics and lossless re-encoding; has no effect
    /// on the child.
    Unknown {
        /// The unrecognized opcode value.
        opcode: u8,
        /// The payload as received.
        payload: Vec<u8>,
    },
}

/// Payload length required for a Signal frame: one u16, big-endian.
const SIGNAL_PAYLOAD_LEN: usize = 2;

/// Payload length required for a Resize frame: rows then cols, each u16
/// big-endian.
const RESIZE_PAYLOAD_LEN: usize = 4;

impl Command {
    /// Decode a frame's payload according to its opcode.
    ///
    /// Write payloads are arbitrary. Signal and Resize payloads have fixed
    /// layouts; a length mismatch there is a hard protocol violation, not
    /// something to skip over.
    pub fn parse(frame: &Frame) -> Result<Self, ProtocolError> {
        match frame.opcode {
            op if op == Opcode::Write as u8 => Ok(Command::Write(frame.payload.clone())),
            op if op == Opcode::Signal as u8 => {
                let payload: [u8; SIGNAL_PAYLOAD_LEN] =
                    frame.payload.as_slice().try_into().map_err(|_| {
                        ProtocolError::BadPayload {
                            opcode: frame.opcode,
                            expected: SIGNAL_PAYLOAD_LEN,
                            got: frame.payload.len(),
                        }
                    })?;
                Ok(Command::Signal(u16::from_be_bytes(payload)))
            }
            op if op == Opcode::Resize as u8 => {
                if frame.payload.len() != RESIZE_PAYLOAD_LEN {
                    return Err(ProtocolError::BadPayload {
                        opcode: frame.opcode,
                        expected: RESIZE_PAYLOAD_LEN,
                        got: frame.payload.len(),
                    });
                }
                Ok(Command::Resize {
                    rows: u16::from_be_bytes([frame.payload[0], frame.payload[1]]),
                    cols: u16::from_be_bytes([frame.payload[2], frame.payload[3]]),
                })
            }
            opcode => Ok(Command::Unknown {
                opcode,
                payload: frame.payload.clone(),
            }),
        }
    }

    /// Encode the command as a wire frame.
    ///
    /// Used by front ends and tests driving a bridge; the bridge itself
    /// only decodes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let frame = match self {
            Command::Write(data) => Frame::new(Opcode::Write as u8, data.clone()),
            Command::Signal(signum) => {
                Frame::new(Opcode::Signal as u8, signum.to_be_bytes().to_vec())
            }
            Command::Resize { rows, cols } => {
                let mut payload = Vec::with_capacity(RESIZE_PAYLOAD_LEN);
                payload.extend_from_slice(&rows.to_be_bytes());
                payload.extend_from_slice(&cols.to_be_bytes());
                Frame::new(Opcode::Resize as u8, payload)
            }
            Command::Unknown { opcode, payload } => Frame::new(*opcode, payload.clone()),
        };
        encode(&frame)
    }
}
