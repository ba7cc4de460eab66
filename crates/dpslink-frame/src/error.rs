/// Errors that can occur while building or accumulating frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame exceeds the configured maximum length.
    #[error("frame too long ({size} bytes, max {max})")]
    TooLong { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
