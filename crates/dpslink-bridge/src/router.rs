use dpslink_transport::{ConsoleEndpoint, Endpoint};
use tracing::{debug, warn};

use crate::arbiter::Completion;
use crate::config::QueryPolicy;
use crate::endpoint::EndpointRef;
use crate::multiplexer::EndpointMultiplexer;

/// Diagnostic written when a transaction deadline elapses.
pub const TIMEOUT_NOTICE: &[u8] = b"TIMEOUT";

/// Diagnostic written when a response exceeds the maximum frame length.
pub const OVERSIZE_NOTICE: &[u8] = b"FRAME TOO LONG";

/// Diagnostic written when an endpoint's consumed bytes do not end with the
/// frame terminator the scanner promised.
pub const MALFORMED_NOTICE: &[u8] = b"uhm";

/// Sole deliverer of transaction outcomes.
///
/// The originating endpoint reference is resolved against the live pool at
/// delivery time; an endpoint that vanished mid-transaction gets its outcome
/// discarded without error. Exactly one message is written per completed
/// transaction, and only to the endpoint that submitted it — never a
/// broadcast.
pub struct ResponseRouter {
    policy: QueryPolicy,
}

impl ResponseRouter {
    pub fn new(policy: QueryPolicy) -> Self {
        Self { policy }
    }

    pub fn deliver<E: Endpoint>(
        &self,
        completion: &Completion,
        origin: Option<EndpointRef>,
        console: Option<&mut ConsoleEndpoint>,
        mux: &mut EndpointMultiplexer<E>,
    ) {
        let Some(origin) = origin else {
            self.dispose_internal(completion);
            return;
        };
        match origin {
            EndpointRef::Console => match console {
                Some(console) => write_outcome(console, completion),
                None => debug!("console not attached; outcome discarded"),
            },
            EndpointRef::Client(index) => match mux.slot_mut(index) {
                Some(endpoint) => write_outcome(endpoint, completion),
                None => debug!(slot = index, "originating client gone; outcome discarded"),
            },
        }
    }

    fn dispose_internal(&self, completion: &Completion) {
        match completion {
            Completion::Response(frame) => {
                debug!(len = frame.len(), "internal query response discarded")
            }
            Completion::Timeout => match self.policy {
                QueryPolicy::Log => warn!("internal query timed out"),
                QueryPolicy::Discard => {}
            },
            Completion::Overflow => match self.policy {
                QueryPolicy::Log => warn!("internal query response overflowed"),
                QueryPolicy::Discard => {}
            },
        }
    }
}

fn write_outcome<E: Endpoint + ?Sized>(endpoint: &mut E, completion: &Completion) {
    let message: &[u8] = match completion {
        Completion::Response(frame) => frame,
        Completion::Timeout => TIMEOUT_NOTICE,
        Completion::Overflow => OVERSIZE_NOTICE,
    };
    if let Err(err) = endpoint.write(message) {
        debug!(%err, "response write failed; outcome dropped");
    }
}
