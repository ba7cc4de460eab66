//! Byte-channel transports for the bridge.
//!
//! Provides the two seams the engine is written against:
//! - [`Endpoint`] — a client-facing bidirectional byte channel (TCP
//!   connection or local console)
//! - [`DeviceChannel`] — the single downstream serial resource
//!
//! Everything here is non-blocking: reads return immediately with zero or
//! more bytes, writes are attempted opportunistically. This is the lowest
//! layer of dpslink; the bridge engine builds on top of these traits.

pub mod console;
pub mod error;
pub mod serial;
pub mod tcp;
pub mod traits;

pub use console::ConsoleEndpoint;
pub use error::{Result, TransportError};
pub use serial::SerialDevice;
pub use tcp::{BridgeListener, TcpEndpoint};
pub use traits::{DeviceChannel, Endpoint};
