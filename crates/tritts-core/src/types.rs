use crate::error::SynthesisError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub text: String,
}

/// One streamed response. Final chunks carry no samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub is_final: bool,
}

impl AudioChunk {
    pub fn audio(samples: Vec<f32>) -> Self {
        Self {
            samples,
            is_final: false,
        }
    }

    pub fn final_marker() -> Self {
        Self {
            samples: Vec::new(),
            is_final: true,
        }
    }
}

/// Prompt audio and its transcript, as loaded from disk.
#[derive(Debug, Clone)]
pub struct ReferenceVoice {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
    pub text: String,
}

impl ReferenceVoice {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Reference audio zero-extended to the streaming buffer length.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedReference {
    pub samples: Vec<f32>,
    pub original_len: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub reference: Option<PaddedReference>,
    pub target_text: String,
    pub cache_mode: bool,
}

#[derive(Debug)]
pub struct SegmentResult {
    pub index: usize,
    pub outcome: Result<Vec<f32>, SynthesisError>,
    pub total_latency: Duration,
    pub first_chunk_latency: Option<Duration>,
    pub chunk_count: usize,
}

impl SegmentResult {
    pub fn failed(index: usize, error: SynthesisError, total_latency: Duration) -> Self {
        Self {
            index,
            outcome: Err(error.for_segment(index)),
            total_latency,
            first_chunk_latency: None,
            chunk_count: 0,
        }
    }

    pub fn waveform(&self) -> Option<&[f32]> {
        self.outcome.as_deref().ok()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisStats {
    pub total_time: Duration,
    pub num_segments: usize,
    pub succeeded: usize,
    pub failed: Vec<usize>,
    pub output_samples: usize,
    pub avg_first_chunk_latency: Option<Duration>,
}

impl SynthesisStats {
    /// Seconds of output audio at the given sample rate.
    pub fn audio_duration_secs(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.output_samples as f64 / sample_rate as f64
    }

    /// Wall-clock time divided by audio duration, when there is audio.
    pub fn real_time_factor(&self, sample_rate: u32) -> Option<f64> {
        let duration = self.audio_duration_secs(sample_rate);
        (duration > 0.0).then(|| self.total_time.as_secs_f64() / duration)
    }
}
