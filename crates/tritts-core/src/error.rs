use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("no response within {0:?}")]
    StreamTimeout(Duration),

    #[error("segment {index} failed: {source}")]
    SegmentFailure {
        index: usize,
        #[source]
        source: Box<SynthesisError>,
    },

    #[error("no reconstruction strategy registered for model: {0}")]
    ModelNotFound(String),

    #[error("no segment produced audio")]
    NoAudio,

    #[error("segments missing from output: {0:?}")]
    MissingSegments(Vec<usize>),
}

impl SynthesisError {
    /// Attach a segment index, unless the error already carries one.
    pub fn for_segment(self, index: usize) -> Self {
        match self {
            SynthesisError::SegmentFailure { .. } => self,
            other => SynthesisError::SegmentFailure {
                index,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error with any segment wrapper removed.
    pub fn root(&self) -> &SynthesisError {
        match self {
            SynthesisError::SegmentFailure { source, .. } => source.root(),
            other => other,
        }
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to read audio file: {0}")]
    Read(String),

    #[error("failed to write audio file: {0}")]
    Write(String),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_segment_wraps_once() {
        let err = SynthesisError::StreamError("boom".to_string())
            .for_segment(3)
            .for_segment(7);
        match &err {
            SynthesisError::SegmentFailure { index, .. } => assert_eq!(*index, 3),
            _ => panic!("expected SegmentFailure"),
        }
        assert!(matches!(err.root(), SynthesisError::StreamError(_)));
    }

    #[test]
    fn test_segment_failure_display_includes_index_and_cause() {
        let err = SynthesisError::StreamTimeout(Duration::from_secs(30)).for_segment(2);
        let msg = err.to_string();
        assert!(msg.contains("segment 2"), "got: {msg}");
        assert!(msg.contains("30s"), "got: {msg}");
    }
}
