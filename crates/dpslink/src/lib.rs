//! Serial bridge multiplexing TCP clients onto one OpenDPS device.
//!
//! dpslink exposes a power-supply-style serial device to many concurrent
//! requesters — TCP clients and a local console — one framed transaction at
//! a time.
//!
//! # Crate Structure
//!
//! - [`transport`] — Non-blocking endpoints and the serial device channel
//! - [`frame`] — Escape framing, frame scanning, bounded accumulation
//! - [`bridge`] — Multiplexer, transaction arbiter, and response router

/// Re-export transport types.
pub mod transport {
    pub use dpslink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use dpslink_frame::*;
}

/// Re-export bridge engine types.
pub mod bridge {
    pub use dpslink_bridge::*;
}
