use crate::error::SynthesisError;
use std::time::Duration;

/// What to do with segments that produced no audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingSegmentPolicy {
    /// Log the failure and leave a gap; the output is shorter by that segment.
    #[default]
    Skip,
    /// Any missing segment fails the whole run.
    Fail,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub server_addr: String,
    pub server_port: u16,
    pub model_name: String,
    pub min_words: usize,
    pub max_words: usize,
    /// Seconds of cross-fade between adjacent chunks of one segment.
    pub chunk_overlap_duration: f64,
    pub output_sample_rate: u32,
    pub reference_sample_rate: u32,
    /// Granularity, in seconds, of the zero-padded reference buffer.
    pub padding_unit_secs: u32,
    pub cache_mode: bool,
    pub receive_timeout: Duration,
    /// Bounds of the random pause between launches. Inverted bounds are swapped.
    pub min_launch_delay: Duration,
    pub max_launch_delay: Duration,
    /// 0 means one stream per segment with no cap.
    pub max_concurrency: usize,
    pub missing_policy: MissingSegmentPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            server_addr: "localhost".to_string(),
            server_port: 8001,
            model_name: "cosyvoice2".to_string(),
            min_words: 10,
            max_words: 30,
            chunk_overlap_duration: 0.1,
            output_sample_rate: 24000,
            reference_sample_rate: 16000,
            padding_unit_secs: 10,
            cache_mode: true,
            receive_timeout: Duration::from_secs(30),
            min_launch_delay: Duration::from_secs(1),
            max_launch_delay: Duration::from_secs(2),
            max_concurrency: 0,
            missing_policy: MissingSegmentPolicy::Skip,
        }
    }
}

impl RunConfig {
    pub fn server_url(&self) -> String {
        let addr = self.server_addr.trim_end_matches('/');
        if addr.starts_with("http://") || addr.starts_with("https://") {
            format!("{}:{}", addr, self.server_port)
        } else {
            format!("http://{}:{}", addr, self.server_port)
        }
    }

    /// Cross-fade window length in output samples.
    pub fn overlap_samples(&self) -> usize {
        (self.chunk_overlap_duration * self.output_sample_rate as f64) as usize
    }

    pub fn validate(&self) -> Result<(), SynthesisError> {
        if self.min_words == 0 {
            return Err(SynthesisError::InvalidInput(
                "min_words must be at least 1".to_string(),
            ));
        }
        if self.min_words > self.max_words {
            return Err(SynthesisError::InvalidInput(format!(
                "min_words ({}) exceeds max_words ({})",
                self.min_words, self.max_words
            )));
        }
        if !self.chunk_overlap_duration.is_finite() || self.chunk_overlap_duration < 0.0 {
            return Err(SynthesisError::InvalidInput(format!(
                "chunk_overlap_duration must be a non-negative number, got {}",
                self.chunk_overlap_duration
            )));
        }
        if self.output_sample_rate == 0 || self.reference_sample_rate == 0 {
            return Err(SynthesisError::InvalidInput(
                "sample rates must be positive".to_string(),
            ));
        }
        if self.padding_unit_secs == 0 {
            return Err(SynthesisError::InvalidInput(
                "padding_unit_secs must be positive".to_string(),
            ));
        }
        if self.receive_timeout.is_zero() {
            return Err(SynthesisError::InvalidInput(
                "receive_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
