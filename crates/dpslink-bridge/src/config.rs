use std::time::Duration;

/// Disposition of a failed internally generated transaction.
///
/// Internally generated queries have no originating endpoint, so a timeout
/// or overflow outcome has nowhere natural to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPolicy {
    /// Emit a warning describing the failure.
    #[default]
    Log,
    /// Drop the outcome silently.
    Discard,
}

/// Bridge engine tunables.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Maximum simultaneous client connections (fixed slot pool size).
    pub max_clients: usize,
    /// Maximum frame length in bytes, markers included.
    pub max_frame: usize,
    /// Deadline for a device response, measured from the command write.
    pub response_timeout: Duration,
    /// Disposition of failed internally generated transactions.
    pub query_policy: QueryPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_clients: 4,
            max_frame: dpslink_frame::DEFAULT_MAX_FRAME,
            response_timeout: Duration::from_secs(3),
            query_policy: QueryPolicy::default(),
        }
    }
}
