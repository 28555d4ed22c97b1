use async_trait::async_trait;
use tritts_core::{AudioChunk, SynthesisError, SynthesisRequest};

/// One synthesis request as sent on a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub request_id: String,
    pub model_name: String,
    pub request: SynthesisRequest,
}

/// Opens bidirectional synthesis streams to an inference server.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the server reports itself live.
    async fn is_live(&self) -> Result<bool, SynthesisError>;

    /// Open a fresh stream. Each stream is used for exactly one request.
    async fn open_stream(&self) -> Result<Box<dyn InferenceStream>, SynthesisError>;
}

/// One open bidirectional stream.
///
/// Callers must `close` the stream on every exit path once it is open.
#[async_trait]
pub trait InferenceStream: Send {
    async fn send(&mut self, request: StreamRequest) -> Result<(), SynthesisError>;

    /// Next message in arrival order. `Ok(None)` means the server ended the
    /// stream; server-reported errors come back as `StreamError`.
    async fn recv(&mut self) -> Result<Option<AudioChunk>, SynthesisError>;

    async fn close(&mut self);
}
