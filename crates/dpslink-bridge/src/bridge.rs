use std::time::{Duration, Instant};

use dpslink_frame::{scan, ScanOutcome, EOF};
use dpslink_transport::{ConsoleEndpoint, DeviceChannel, Endpoint};
use tracing::{debug, trace};

use crate::arbiter::{Completion, TransactionArbiter};
use crate::config::BridgeConfig;
use crate::endpoint::EndpointRef;
use crate::error::Result;
use crate::multiplexer::{AcceptOutcome, EndpointMultiplexer};
use crate::router::{ResponseRouter, MALFORMED_NOTICE};

/// Sleep between arbiter polls while driving an internal transaction.
const EXECUTE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// The bridge: many endpoints, one device, one transaction at a time.
///
/// All shared state lives behind this one struct; callers drive it one
/// [`poll_cycle`] at a time from a single thread. A threaded embedding must
/// serialize access behind its own mutex.
///
/// [`poll_cycle`]: Bridge::poll_cycle
pub struct Bridge<D, E> {
    device: D,
    console: Option<ConsoleEndpoint>,
    mux: EndpointMultiplexer<E>,
    arbiter: TransactionArbiter,
    router: ResponseRouter,
    max_frame: usize,
    scratch: Vec<u8>,
}

impl<D: DeviceChannel, E: Endpoint> Bridge<D, E> {
    pub fn new(device: D, config: &BridgeConfig) -> Self {
        Self {
            device,
            console: None,
            mux: EndpointMultiplexer::new(config.max_clients),
            arbiter: TransactionArbiter::new(config.response_timeout, config.max_frame),
            router: ResponseRouter::new(config.query_policy),
            max_frame: config.max_frame,
            scratch: vec![0; config.max_frame],
        }
    }

    /// Attach the local console endpoint. The console is scanned before any
    /// client slot in each idle cycle.
    pub fn with_console(mut self, console: ConsoleEndpoint) -> Self {
        self.console = Some(console);
        self
    }

    /// Offer a new client connection to the slot pool. Accepting is legal
    /// whether or not a transaction is in flight.
    pub fn accept(&mut self, conn: E) -> AcceptOutcome {
        self.mux.accept(conn)
    }

    /// Whether the device channel is free for a new transaction.
    pub fn is_idle(&self) -> bool {
        self.arbiter.is_idle()
    }

    /// How many client slots hold a live connection.
    pub fn live_clients(&self) -> usize {
        self.mux.live_count()
    }

    /// One cooperative polling iteration.
    ///
    /// Idle: reclaim dead slots, drain unsolicited device bytes, then scan
    /// the console and each client slot in priority order for one complete
    /// inbound frame — the first found starts the transaction and the rest
    /// stay buffered. Busy: advance the in-flight transaction by at most
    /// one device byte and route its outcome when it resolves.
    pub fn poll_cycle(&mut self, now: Instant) -> Result<()> {
        self.mux.reap();
        if self.arbiter.is_idle() {
            self.drain_device()?;
            self.scan_endpoints(now)?;
        } else if let Some((completion, origin)) = self.arbiter.poll(&mut self.device, now)? {
            self.router
                .deliver(&completion, origin, self.console.as_mut(), &mut self.mux);
        }
        Ok(())
    }

    /// Drive one internally generated transaction to completion.
    ///
    /// Synchronous replacement for re-entering the polling loop: begins an
    /// origin-less transaction and polls the arbiter until it resolves,
    /// returning the completion directly to the caller. Refuses to start
    /// while another transaction is in flight.
    pub fn execute(&mut self, frame: &[u8]) -> Result<Completion> {
        self.arbiter
            .begin(&mut self.device, frame, None, Instant::now())?;
        loop {
            if let Some((completion, _)) = self.arbiter.poll(&mut self.device, Instant::now())? {
                return Ok(completion);
            }
            std::thread::sleep(EXECUTE_POLL_INTERVAL);
        }
    }

    fn drain_device(&mut self) -> Result<()> {
        while let Some(byte) = self.device.recv_byte()? {
            trace!(byte, "discarding unsolicited device byte");
        }
        Ok(())
    }

    fn scan_endpoints(&mut self, now: Instant) -> Result<()> {
        if let Some(console) = self.console.as_mut() {
            if let Some(frame) = take_frame(console, &mut self.scratch, self.max_frame) {
                self.arbiter
                    .begin(&mut self.device, &frame, Some(EndpointRef::Console), now)?;
                return Ok(());
            }
        }
        for index in 0..self.mux.capacity() {
            let Some(endpoint) = self.mux.slot_mut(index) else {
                continue;
            };
            if let Some(frame) = take_frame(endpoint, &mut self.scratch, self.max_frame) {
                self.arbiter.begin(
                    &mut self.device,
                    &frame,
                    Some(EndpointRef::Client(index)),
                    now,
                )?;
                return Ok(());
            }
        }
        Ok(())
    }
}

/// Peek an endpoint's pending bytes and classify them.
///
/// Garbage is consumed and dropped. A complete frame is consumed and
/// returned; if the consumed bytes no longer end with the terminator the
/// scanner saw (the endpoint's buffer changed between peek and read), the
/// endpoint is told `"uhm"` and no frame is returned.
fn take_frame<E: Endpoint + ?Sized>(
    endpoint: &mut E,
    scratch: &mut [u8],
    max_frame: usize,
) -> Option<Vec<u8>> {
    let peeked = match endpoint.peek(scratch) {
        Ok(n) => n,
        Err(err) => {
            debug!(%err, "endpoint peek failed");
            return None;
        }
    };
    match scan(&scratch[..peeked], max_frame) {
        ScanOutcome::Wait => None,
        ScanOutcome::Discard(count) => {
            let _ = endpoint.read(&mut scratch[..count]);
            trace!(count, "discarded garbage bytes");
            None
        }
        ScanOutcome::Frame(len) => {
            let read = endpoint.read(&mut scratch[..len]).unwrap_or(0);
            if read != len || scratch[len - 1] != EOF {
                let _ = endpoint.write(MALFORMED_NOTICE);
                debug!(expected = len, read, "malformed frame terminator");
                return None;
            }
            Some(scratch[..len].to_vec())
        }
    }
}
