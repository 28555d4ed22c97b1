use crate::transport::{InferenceStream, InferenceTransport, StreamRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use tritts_core::{AudioChunk, SynthesisError};

/// Seconds of audio produced per character of target text.
const SECS_PER_CHAR: f64 = 0.06;
const CHUNK_SECS: f64 = 0.5;

/// Offline transport that answers every request with silence.
///
/// The amount of audio scales with the target text length so dry runs
/// exercise segmentation, scheduling and reassembly without a server.
pub struct NullTransport {
    sample_rate: u32,
}

impl NullTransport {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    fn chunks_for(&self, text: &str) -> VecDeque<AudioChunk> {
        let total =
            (text.chars().count() as f64 * SECS_PER_CHAR * self.sample_rate as f64).round() as usize;
        let chunk_len = ((CHUNK_SECS * self.sample_rate as f64).round() as usize).max(1);

        let mut chunks: VecDeque<AudioChunk> = (0..total)
            .step_by(chunk_len)
            .map(|start| AudioChunk::audio(vec![0.0; chunk_len.min(total - start)]))
            .collect();
        chunks.push_back(AudioChunk::final_marker());
        chunks
    }
}

#[async_trait]
impl InferenceTransport for NullTransport {
    fn name(&self) -> &str {
        "null"
    }

    async fn is_live(&self) -> Result<bool, SynthesisError> {
        Ok(true)
    }

    async fn open_stream(&self) -> Result<Box<dyn InferenceStream>, SynthesisError> {
        Ok(Box::new(NullStream {
            sample_rate: self.sample_rate,
            pending: VecDeque::new(),
        }))
    }
}

struct NullStream {
    sample_rate: u32,
    pending: VecDeque<AudioChunk>,
}

#[async_trait]
impl InferenceStream for NullStream {
    async fn send(&mut self, request: StreamRequest) -> Result<(), SynthesisError> {
        let chunks = NullTransport::new(self.sample_rate).chunks_for(&request.request.target_text);
        tracing::trace!(
            request_id = %request.request_id,
            chunks = chunks.len(),
            "NullTransport queued silent response"
        );
        self.pending.extend(chunks);
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<AudioChunk>, SynthesisError> {
        Ok(self.pending.pop_front())
    }

    async fn close(&mut self) {
        self.pending.clear();
    }
}
