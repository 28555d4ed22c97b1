use crate::proto::{
    self, ModelInferRequest, ModelStreamInferResponse, ServerLiveRequest, ServerLiveResponse,
};
use crate::transport::{InferenceStream, InferenceTransport, StreamRequest};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tritts_core::{AudioChunk, SynthesisError};

const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// Talks to a Triton server over the KServe v2 gRPC protocol.
///
/// Every stream gets its own freshly connected channel.
pub struct GrpcTransport {
    endpoint: Endpoint,
    url: String,
}

impl GrpcTransport {
    pub fn new(url: &str) -> Result<Self, SynthesisError> {
        let endpoint = Endpoint::from_shared(url.to_string())
            .map_err(|e| SynthesisError::InvalidInput(format!("invalid server url '{url}': {e}")))?
            .connect_timeout(Duration::from_secs(10))
            .http2_keep_alive_interval(Duration::from_secs(30))
            .keep_alive_timeout(Duration::from_secs(10))
            .keep_alive_while_idle(true);
        Ok(Self {
            endpoint,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn connect(&self) -> Result<tonic::client::Grpc<Channel>, SynthesisError> {
        let channel = self.endpoint.connect().await.map_err(|e| {
            SynthesisError::StreamError(format!("failed to connect to {}: {e}", self.url))
        })?;
        Ok(tonic::client::Grpc::new(channel)
            .max_decoding_message_size(MAX_MESSAGE_SIZE)
            .max_encoding_message_size(MAX_MESSAGE_SIZE))
    }
}

async fn ready(grpc: &mut tonic::client::Grpc<Channel>) -> Result<(), SynthesisError> {
    grpc.ready()
        .await
        .map_err(|e| SynthesisError::StreamError(format!("service was not ready: {e}")))
}

fn status_error(status: tonic::Status) -> SynthesisError {
    SynthesisError::StreamError(format!("{:?}: {}", status.code(), status.message()))
}

#[async_trait]
impl InferenceTransport for GrpcTransport {
    fn name(&self) -> &str {
        "grpc"
    }

    async fn is_live(&self) -> Result<bool, SynthesisError> {
        let mut grpc = self.connect().await?;
        ready(&mut grpc).await?;
        let codec = ProstCodec::<ServerLiveRequest, ServerLiveResponse>::default();
        let response = grpc
            .unary(
                tonic::Request::new(ServerLiveRequest {}),
                PathAndQuery::from_static(proto::SERVER_LIVE_PATH),
                codec,
            )
            .await
            .map_err(status_error)?;
        Ok(response.into_inner().live)
    }

    async fn open_stream(&self) -> Result<Box<dyn InferenceStream>, SynthesisError> {
        let grpc = self.connect().await?;
        tracing::debug!(url = %self.url, service = proto::SERVICE, "stream channel connected");
        let (tx, rx) = mpsc::channel(1);
        Ok(Box::new(GrpcStream {
            grpc,
            tx: Some(tx),
            rx: Some(rx),
            inbound: None,
        }))
    }
}

struct GrpcStream {
    grpc: tonic::client::Grpc<Channel>,
    tx: Option<mpsc::Sender<ModelInferRequest>>,
    // Held until the call starts so the first request rides along with the headers
    rx: Option<mpsc::Receiver<ModelInferRequest>>,
    inbound: Option<tonic::Streaming<ModelStreamInferResponse>>,
}

#[async_trait]
impl InferenceStream for GrpcStream {
    async fn send(&mut self, request: StreamRequest) -> Result<(), SynthesisError> {
        let message = proto::infer_request(&request.model_name, &request.request_id, &request.request);
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| SynthesisError::StreamError("stream already closed".to_string()))?;
        tx.send(message)
            .await
            .map_err(|_| SynthesisError::StreamError("request stream closed".to_string()))?;

        if let Some(rx) = self.rx.take() {
            ready(&mut self.grpc).await?;
            let codec = ProstCodec::<ModelInferRequest, ModelStreamInferResponse>::default();
            let response = self
                .grpc
                .streaming(
                    tonic::Request::new(ReceiverStream::new(rx)),
                    PathAndQuery::from_static(proto::MODEL_STREAM_INFER_PATH),
                    codec,
                )
                .await
                .map_err(status_error)?;
            self.inbound = Some(response.into_inner());
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<AudioChunk>, SynthesisError> {
        let inbound = self
            .inbound
            .as_mut()
            .ok_or_else(|| SynthesisError::StreamError("no request in flight".to_string()))?;
        match inbound.message().await.map_err(status_error)? {
            Some(response) => proto::decode_stream_response(response).map(Some),
            None => Ok(None),
        }
    }

    async fn close(&mut self) {
        // Dropping the sender half-closes the request side; dropping the
        // inbound stream cancels whatever the server still has in flight.
        self.tx.take();
        self.rx.take();
        self.inbound.take();
    }
}
