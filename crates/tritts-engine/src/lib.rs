pub mod consumer;
pub mod delay;
pub mod grpc;
pub mod null_transport;
pub mod proto;
pub mod reassemble;
pub mod registry;
pub mod request;
pub mod scheduler;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;
pub mod synthesizer;
pub mod transport;

pub use consumer::StreamConsumer;
pub use delay::{FixedDelay, LaunchDelay, UniformDelay};
pub use grpc::GrpcTransport;
pub use null_transport::NullTransport;
pub use reassemble::combine;
pub use registry::{StrategyFactory, StrategyRegistry};
pub use request::{build_request, padded_reference_len};
pub use scheduler::SegmentScheduler;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{ScriptStep, ScriptedTransport};
pub use synthesizer::Synthesizer;
pub use transport::{InferenceStream, InferenceTransport, StreamRequest};
