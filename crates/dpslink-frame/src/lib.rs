//! Marker-delimited escape framing for the OpenDPS serial protocol.
//!
//! Every device frame is a byte sequence bounded by markers:
//! - A start-of-frame byte (0x7E)
//! - An escaped payload (0x7D introduces a two-byte escape sequence)
//! - An end-of-frame byte (0x7F)
//!
//! This crate is pure byte manipulation — no I/O. The scanner classifies
//! peeked endpoint bytes without consuming them; the codec recovers and
//! produces on-wire payloads; `FrameBuf` accumulates a response under a
//! hard length bound.

pub mod buffer;
pub mod codec;
pub mod error;
pub mod scanner;

pub use buffer::FrameBuf;
pub use codec::{escape, open, seal, unescape, DEFAULT_MAX_FRAME, EOF, ESC, ESC_XOR, SOF};
pub use error::{FrameError, Result};
pub use scanner::{scan, ScanOutcome};
