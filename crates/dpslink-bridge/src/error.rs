/// Errors that can occur in the bridge engine.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] dpslink_transport::TransportError),

    /// Framing-level error.
    #[error("frame error: {0}")]
    Frame(#[from] dpslink_frame::FrameError),

    /// I/O failure on the device channel.
    #[error("device I/O error: {0}")]
    Device(#[from] std::io::Error),

    /// A transaction is already in flight on the device channel.
    #[error("a transaction is already in flight")]
    Busy,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
