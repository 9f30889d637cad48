use crate::FrameId;

/// Frame replacer error.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum EvictError<F: FrameId> {
    /// Trying to remove pinned frame.
    #[error("Trying to remove pinned frame: {0}")]
    PinnedFrameRemoval(F),

    /// Cannot track any more frames.
    #[error("Frame replacer is full")]
    FrameReplacerFull,

    /// Logical clock arrived at maximum value.
    #[error("Logical clock exhausted")]
    SequenceExhausted,
}

/// Frame replacer result type.
pub type EvictResult<T, F> = Result<T, EvictError<F>>;
