//! The multiplexing/arbitration engine.
//!
//! Many endpoints, one device, one transaction at a time. The
//! [`EndpointMultiplexer`] bounds how many clients may be connected, the
//! [`TransactionArbiter`] owns the device channel for the duration of one
//! command/response cycle, and the [`ResponseRouter`] returns each outcome
//! to exactly the endpoint that asked. [`Bridge`] ties them together into a
//! single-threaded cooperative polling loop.

pub mod arbiter;
pub mod bridge;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod multiplexer;
pub mod router;

pub use arbiter::{Completion, TransactionArbiter};
pub use bridge::Bridge;
pub use config::{BridgeConfig, QueryPolicy};
pub use endpoint::EndpointRef;
pub use error::{BridgeError, Result};
pub use multiplexer::{AcceptOutcome, EndpointMultiplexer, BUSY_NOTICE};
pub use router::{ResponseRouter, MALFORMED_NOTICE, OVERSIZE_NOTICE, TIMEOUT_NOTICE};
