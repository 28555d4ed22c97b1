use crate::transport::{InferenceStream, InferenceTransport, StreamRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tritts_audio::Reconstruction;
use tritts_core::{SegmentResult, SynthesisError, SynthesisRequest};
use uuid::Uuid;

/// Chunks received on one stream before the final marker.
struct Received {
    chunks: Vec<Vec<f32>>,
    first_chunk_latency: Option<Duration>,
}

/// Drives one streaming call per segment and stitches the chunks it returns.
pub struct StreamConsumer {
    transport: Arc<dyn InferenceTransport>,
    strategy: Arc<dyn Reconstruction>,
    model_name: String,
    receive_timeout: Duration,
}

impl StreamConsumer {
    pub fn new(
        transport: Arc<dyn InferenceTransport>,
        strategy: Arc<dyn Reconstruction>,
        model_name: &str,
        receive_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            strategy,
            model_name: model_name.to_string(),
            receive_timeout,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Synthesize one segment. Failures are reported in the result, never raised.
    pub async fn run(&self, index: usize, request: SynthesisRequest) -> SegmentResult {
        let started = Instant::now();

        let opened = tokio::time::timeout(self.receive_timeout, self.transport.open_stream())
            .await
            .unwrap_or(Err(SynthesisError::StreamTimeout(self.receive_timeout)));
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(segment = index, "failed to open stream: {e}");
                return SegmentResult::failed(index, e, started.elapsed());
            }
        };

        let request = StreamRequest {
            request_id: Uuid::new_v4().to_string(),
            model_name: self.model_name.clone(),
            request,
        };
        let received = self.exchange(index, stream.as_mut(), request, started).await;
        stream.close().await;
        let total_latency = started.elapsed();

        match received {
            Ok(received) => {
                let chunk_count = received.chunks.len();
                let waveform = self.strategy.reconstruct(&received.chunks);
                if chunk_count > 0 {
                    tracing::info!(
                        segment = index,
                        samples = waveform.len(),
                        chunks = chunk_count,
                        "synthesis completed in {:.3}s",
                        total_latency.as_secs_f64()
                    );
                } else {
                    tracing::warn!(segment = index, "stream finished without audio");
                }
                SegmentResult {
                    index,
                    outcome: Ok(waveform),
                    total_latency,
                    first_chunk_latency: received.first_chunk_latency,
                    chunk_count,
                }
            }
            Err(e) => SegmentResult::failed(index, e, total_latency),
        }
    }

    async fn exchange(
        &self,
        index: usize,
        stream: &mut dyn InferenceStream,
        request: StreamRequest,
        started: Instant,
    ) -> Result<Received, SynthesisError> {
        let request_id = request.request_id.clone();
        // Starting the call waits for response headers, which some servers
        // only send along with the first message.
        let sent = match tokio::time::timeout(self.receive_timeout, stream.send(request)).await {
            Ok(sent) => sent,
            Err(_) => {
                tracing::error!(
                    segment = index,
                    request_id = %request_id,
                    "timeout waiting for response"
                );
                return Err(SynthesisError::StreamTimeout(self.receive_timeout));
            }
        };
        sent.map_err(|e| {
            tracing::error!(segment = index, request_id = %request_id, "failed to send request: {e}");
            e
        })?;

        let mut chunks: Vec<Vec<f32>> = Vec::new();
        let mut first_chunk_latency = None;
        let mut total_samples = 0usize;

        loop {
            let message = match tokio::time::timeout(self.receive_timeout, stream.recv()).await {
                Ok(message) => message,
                Err(_) => {
                    tracing::error!(segment = index, "timeout waiting for response");
                    return Err(SynthesisError::StreamTimeout(self.receive_timeout));
                }
            };

            let chunk = match message {
                Ok(Some(chunk)) => chunk,
                Ok(None) => {
                    tracing::error!(segment = index, "stream ended before the final response");
                    return Err(SynthesisError::StreamError(
                        "stream ended before the final response".to_string(),
                    ));
                }
                Err(e) => {
                    tracing::error!(segment = index, "RPC error: {e}");
                    return Err(e);
                }
            };

            if chunk.is_final {
                break;
            }
            if chunk.samples.is_empty() {
                continue;
            }

            total_samples += chunk.samples.len();
            if first_chunk_latency.is_none() {
                let latency = started.elapsed();
                first_chunk_latency = Some(latency);
                tracing::info!(
                    segment = index,
                    samples = chunk.samples.len(),
                    "first chunk received, latency {:.3}s (TTFB)",
                    latency.as_secs_f64()
                );
            } else {
                tracing::debug!(
                    segment = index,
                    chunk = chunks.len() + 1,
                    samples = chunk.samples.len(),
                    total_samples,
                    "chunk received"
                );
            }
            chunks.push(chunk.samples);
        }

        Ok(Received {
            chunks,
            first_chunk_latency,
        })
    }
}
