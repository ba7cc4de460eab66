use std::time::{Duration, Instant};

use dpslink_frame::{FrameBuf, EOF, SOF};
use dpslink_transport::DeviceChannel;
use tracing::{debug, trace};

use crate::endpoint::EndpointRef;
use crate::error::{BridgeError, Result};

/// Sub-state of the in-flight transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    AwaitStart,
    AwaitEnd,
}

/// How a transaction resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Full response frame, start marker through end marker inclusive.
    Response(Vec<u8>),
    /// Deadline elapsed before the response completed.
    Timeout,
    /// Response reached the maximum frame length without an end marker.
    Overflow,
}

/// Owner of exclusive access to the device channel.
///
/// At most one transaction is live system-wide: [`begin`] refuses to start
/// while another is in flight, and the arbiter returns to idle only on
/// completion, timeout, or overflow. In the awaiting states at most one
/// device byte is read per [`poll`] call, matching the non-blocking,
/// byte-at-a-time nature of the channel.
///
/// [`begin`]: TransactionArbiter::begin
/// [`poll`]: TransactionArbiter::poll
pub struct TransactionArbiter {
    state: State,
    origin: Option<EndpointRef>,
    response: FrameBuf,
    deadline: Instant,
    timeout: Duration,
}

impl TransactionArbiter {
    pub fn new(timeout: Duration, max_frame: usize) -> Self {
        Self {
            state: State::Idle,
            origin: None,
            response: FrameBuf::new(max_frame),
            deadline: Instant::now(),
            timeout,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Start a transaction: write the raw frame to the device, arm the
    /// deadline, and record the originating endpoint (`None` for an
    /// internally generated command).
    pub fn begin(
        &mut self,
        device: &mut dyn DeviceChannel,
        frame: &[u8],
        origin: Option<EndpointRef>,
        now: Instant,
    ) -> Result<()> {
        if self.state != State::Idle {
            return Err(BridgeError::Busy);
        }
        device.send(frame)?;
        self.response.clear();
        self.origin = origin;
        self.deadline = now + self.timeout;
        self.state = State::AwaitStart;
        debug!(origin = ?origin.map(|o| o.to_string()), len = frame.len(), "transaction started");
        Ok(())
    }

    /// Advance the in-flight transaction by at most one device byte.
    ///
    /// Returns the completion and the recorded origin once the transaction
    /// resolves; `None` while it is still pending or the arbiter is idle.
    pub fn poll(
        &mut self,
        device: &mut dyn DeviceChannel,
        now: Instant,
    ) -> Result<Option<(Completion, Option<EndpointRef>)>> {
        if self.state == State::Idle {
            return Ok(None);
        }
        if now > self.deadline {
            debug!("transaction deadline elapsed");
            return Ok(Some(self.finish(Completion::Timeout)));
        }
        match self.state {
            State::Idle => Ok(None),
            State::AwaitStart => {
                match device.recv_byte()? {
                    Some(SOF) => {
                        self.response.try_push(SOF)?;
                        self.state = State::AwaitEnd;
                    }
                    Some(other) => trace!(byte = other, "discarding pre-start byte"),
                    None => {}
                }
                Ok(None)
            }
            State::AwaitEnd => {
                if self.response.is_full() {
                    debug!(len = self.response.len(), "response overflow");
                    return Ok(Some(self.finish(Completion::Overflow)));
                }
                let Some(byte) = device.recv_byte()? else {
                    return Ok(None);
                };
                self.response.try_push(byte)?;
                if byte == EOF {
                    let frame = self.response.take();
                    debug!(len = frame.len(), "response complete");
                    return Ok(Some(self.finish(Completion::Response(frame))));
                }
                Ok(None)
            }
        }
    }

    fn finish(&mut self, completion: Completion) -> (Completion, Option<EndpointRef>) {
        let origin = self.origin.take();
        self.state = State::Idle;
        self.response.clear();
        (completion, origin)
    }
}
