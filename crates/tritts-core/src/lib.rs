pub mod config;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod log_capture;
pub mod segmenter;
pub mod types;

pub use config::{MissingSegmentPolicy, RunConfig};
pub use error::{AudioError, SynthesisError};
#[cfg(any(test, feature = "test-util"))]
pub use log_capture::LogCapture;
pub use segmenter::{segment_text, split_text, word_count};
pub use types::{
    AudioChunk, PaddedReference, ReferenceVoice, Segment, SegmentResult, SynthesisRequest,
    SynthesisStats,
};
