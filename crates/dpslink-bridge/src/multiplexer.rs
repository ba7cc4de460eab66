use dpslink_transport::Endpoint;
use tracing::debug;

/// Notice written to a connection rejected at capacity.
pub const BUSY_NOTICE: &[u8] = b"busy";

/// Result of offering a new connection to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// The connection now occupies this slot.
    Admitted(usize),
    /// Pool full; the connection was sent the busy notice and dropped.
    Rejected,
}

/// Fixed-capacity pool of client endpoint slots.
///
/// A slot is free when it is empty or its previous occupant is no longer
/// live, so a slot can be reused immediately after its connection drops.
/// Connections beyond capacity are rejected outright — this is a hard
/// bound, never a queue.
pub struct EndpointMultiplexer<E> {
    slots: Vec<Option<E>>,
}

impl<E: Endpoint> EndpointMultiplexer<E> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Place a new connection in a free slot, or reject it with the busy
    /// notice when the pool is full.
    pub fn accept(&mut self, mut conn: E) -> AcceptOutcome {
        let free = self
            .slots
            .iter()
            .position(|slot| slot.as_ref().is_none_or(|ep| !ep.is_live()));
        match free {
            Some(index) => {
                debug!(slot = index, "client admitted");
                self.slots[index] = Some(conn);
                AcceptOutcome::Admitted(index)
            }
            None => {
                let _ = conn.write(BUSY_NOTICE);
                debug!("client rejected, pool full");
                AcceptOutcome::Rejected
            }
        }
    }

    /// Release slots whose occupant is no longer live.
    pub fn reap(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.as_ref().is_some_and(|ep| !ep.is_live()) {
                debug!(slot = index, "client slot reclaimed");
                *slot = None;
            }
        }
    }

    /// Borrow the live occupant of a slot, if any.
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut E> {
        self.slots
            .get_mut(index)?
            .as_mut()
            .filter(|ep| ep.is_live())
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// How many slots hold a live connection.
    pub fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.as_ref().is_some_and(|ep| ep.is_live()))
            .count()
    }
}
