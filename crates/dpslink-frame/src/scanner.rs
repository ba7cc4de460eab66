use crate::codec::{EOF, SOF};

/// Classification of an endpoint's peeked (not yet consumed) bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Discard this many leading bytes as garbage and retry next cycle.
    Discard(usize),
    /// Not enough data yet; leave the buffer untouched.
    Wait,
    /// A complete frame occupies the first `n` bytes; consume exactly `n`.
    Frame(usize),
}

/// Locate a complete frame in a peeked byte buffer.
///
/// The scanner never looks past the first end marker, so bytes belonging to
/// a following frame are never claimed by the same call.
///
/// - fewer than 2 bytes available → [`ScanOutcome::Wait`]
/// - no start marker anywhere → discard everything
/// - start marker at offset > 0 → discard the garbage prefix
/// - start marker first, no end marker yet → wait, unless the buffer has
///   already reached `max_frame` without one, in which case the whole run
///   is discarded as garbage
/// - start marker first, end marker at offset `e` → frame of `e + 1` bytes
pub fn scan(buf: &[u8], max_frame: usize) -> ScanOutcome {
    if buf.len() < 2 {
        return ScanOutcome::Wait;
    }
    let Some(sof) = buf.iter().position(|&b| b == SOF) else {
        return ScanOutcome::Discard(buf.len());
    };
    if sof > 0 {
        return ScanOutcome::Discard(sof);
    }
    match buf.iter().position(|&b| b == EOF) {
        Some(eof) => ScanOutcome::Frame(eof + 1),
        None if buf.len() >= max_frame => ScanOutcome::Discard(buf.len()),
        None => ScanOutcome::Wait,
    }
}
