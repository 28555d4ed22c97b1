//! Messages of the KServe v2 `inference.GRPCInferenceService` used by the client,
//! declared directly with prost so no protoc step is needed at build time.
//!
//! Field tags follow `grpc_service.proto` from Triton Inference Server. Only the
//! subset needed for streaming synthesis is declared; unknown fields sent by
//! the server are skipped by the decoder.

use std::collections::HashMap;
use tritts_core::{AudioChunk, SynthesisError, SynthesisRequest};

pub const SERVICE: &str = "inference.GRPCInferenceService";
pub const MODEL_STREAM_INFER_PATH: &str = "/inference.GRPCInferenceService/ModelStreamInfer";
pub const SERVER_LIVE_PATH: &str = "/inference.GRPCInferenceService/ServerLive";

pub const FINAL_RESPONSE_PARAM: &str = "triton_final_response";
pub const ENABLE_EMPTY_FINAL_PARAM: &str = "triton_enable_empty_final_response";
pub const WAVEFORM_OUTPUT: &str = "waveform";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServerLiveRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServerLiveResponse {
    #[prost(bool, tag = "1")]
    pub live: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InferParameter {
    #[prost(oneof = "infer_parameter::ParameterChoice", tags = "1, 2, 3, 4, 5")]
    pub parameter_choice: Option<infer_parameter::ParameterChoice>,
}

pub mod infer_parameter {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ParameterChoice {
        #[prost(bool, tag = "1")]
        BoolParam(bool),
        #[prost(int64, tag = "2")]
        Int64Param(i64),
        #[prost(string, tag = "3")]
        StringParam(String),
        #[prost(double, tag = "4")]
        DoubleParam(f64),
        #[prost(uint64, tag = "5")]
        Uint64Param(u64),
    }
}

impl InferParameter {
    pub fn bool(value: bool) -> Self {
        Self {
            parameter_choice: Some(infer_parameter::ParameterChoice::BoolParam(value)),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.parameter_choice {
            Some(infer_parameter::ParameterChoice::BoolParam(b)) => Some(b),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InferTensorContents {
    #[prost(bool, repeated, tag = "1")]
    pub bool_contents: Vec<bool>,
    #[prost(int32, repeated, tag = "2")]
    pub int_contents: Vec<i32>,
    #[prost(int64, repeated, tag = "3")]
    pub int64_contents: Vec<i64>,
    #[prost(uint32, repeated, tag = "4")]
    pub uint_contents: Vec<u32>,
    #[prost(uint64, repeated, tag = "5")]
    pub uint64_contents: Vec<u64>,
    #[prost(float, repeated, tag = "6")]
    pub fp32_contents: Vec<f32>,
    #[prost(double, repeated, tag = "7")]
    pub fp64_contents: Vec<f64>,
    #[prost(bytes = "vec", repeated, tag = "8")]
    pub bytes_contents: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InferInputTensor {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub datatype: String,
    #[prost(int64, repeated, tag = "3")]
    pub shape: Vec<i64>,
    #[prost(map = "string, message", tag = "4")]
    pub parameters: HashMap<String, InferParameter>,
    #[prost(message, optional, tag = "5")]
    pub contents: Option<InferTensorContents>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InferRequestedOutputTensor {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(map = "string, message", tag = "2")]
    pub parameters: HashMap<String, InferParameter>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModelInferRequest {
    #[prost(string, tag = "1")]
    pub model_name: String,
    #[prost(string, tag = "2")]
    pub model_version: String,
    #[prost(string, tag = "3")]
    pub id: String,
    #[prost(map = "string, message", tag = "4")]
    pub parameters: HashMap<String, InferParameter>,
    #[prost(message, repeated, tag = "5")]
    pub inputs: Vec<InferInputTensor>,
    #[prost(message, repeated, tag = "6")]
    pub outputs: Vec<InferRequestedOutputTensor>,
    #[prost(bytes = "vec", repeated, tag = "7")]
    pub raw_input_contents: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InferOutputTensor {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub datatype: String,
    #[prost(int64, repeated, tag = "3")]
    pub shape: Vec<i64>,
    #[prost(map = "string, message", tag = "4")]
    pub parameters: HashMap<String, InferParameter>,
    #[prost(message, optional, tag = "5")]
    pub contents: Option<InferTensorContents>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModelInferResponse {
    #[prost(string, tag = "1")]
    pub model_name: String,
    #[prost(string, tag = "2")]
    pub model_version: String,
    #[prost(string, tag = "3")]
    pub id: String,
    #[prost(map = "string, message", tag = "4")]
    pub parameters: HashMap<String, InferParameter>,
    #[prost(message, repeated, tag = "5")]
    pub outputs: Vec<InferOutputTensor>,
    #[prost(bytes = "vec", repeated, tag = "6")]
    pub raw_output_contents: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModelStreamInferResponse {
    #[prost(string, tag = "1")]
    pub error_message: String,
    #[prost(message, optional, tag = "2")]
    pub infer_response: Option<ModelInferResponse>,
}

// ── Tensor encoding ────────────────────────────────────────────

fn input(name: &str, datatype: &str, shape: Vec<i64>) -> InferInputTensor {
    InferInputTensor {
        name: name.to_string(),
        datatype: datatype.to_string(),
        shape,
        parameters: HashMap::new(),
        contents: None,
    }
}

/// Raw BYTES tensor element: 4-byte little-endian length, then the bytes.
pub fn encode_bytes_element(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(4 + bytes.len());
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
    out
}

pub fn encode_fp32(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

pub fn decode_fp32(raw: &[u8]) -> Result<Vec<f32>, SynthesisError> {
    if raw.len() % 4 != 0 {
        return Err(SynthesisError::StreamError(format!(
            "FP32 tensor of {} bytes is not a whole number of samples",
            raw.len()
        )));
    }
    Ok(raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Build the wire request for one segment.
///
/// Reference tensors are only present when the request carries a reference;
/// cache-mode requests send `target_text` alone.
pub fn infer_request(
    model_name: &str,
    request_id: &str,
    request: &SynthesisRequest,
) -> ModelInferRequest {
    let mut inputs = Vec::with_capacity(4);
    let mut raw = Vec::with_capacity(4);

    if let Some(reference) = &request.reference {
        inputs.push(input(
            "reference_wav",
            "FP32",
            vec![1, reference.samples.len() as i64],
        ));
        raw.push(encode_fp32(&reference.samples));

        inputs.push(input("reference_wav_len", "INT32", vec![1, 1]));
        raw.push((reference.original_len as i32).to_le_bytes().to_vec());

        inputs.push(input("reference_text", "BYTES", vec![1, 1]));
        raw.push(encode_bytes_element(&reference.text));
    }

    inputs.push(input("target_text", "BYTES", vec![1, 1]));
    raw.push(encode_bytes_element(&request.target_text));

    let mut parameters = HashMap::new();
    parameters.insert(ENABLE_EMPTY_FINAL_PARAM.to_string(), InferParameter::bool(true));

    ModelInferRequest {
        model_name: model_name.to_string(),
        model_version: String::new(),
        id: request_id.to_string(),
        parameters,
        inputs,
        outputs: vec![InferRequestedOutputTensor {
            name: WAVEFORM_OUTPUT.to_string(),
            parameters: HashMap::new(),
        }],
        raw_input_contents: raw,
    }
}

/// Interpret one streamed response as an error, a final marker, or audio.
pub fn decode_stream_response(
    response: ModelStreamInferResponse,
) -> Result<AudioChunk, SynthesisError> {
    if !response.error_message.is_empty() {
        return Err(SynthesisError::StreamError(response.error_message));
    }
    let infer = response.infer_response.ok_or_else(|| {
        SynthesisError::StreamError("response carries neither error nor result".to_string())
    })?;

    let is_final = infer
        .parameters
        .get(FINAL_RESPONSE_PARAM)
        .and_then(InferParameter::as_bool)
        .unwrap_or(false);
    if is_final {
        return Ok(AudioChunk::final_marker());
    }

    let position = infer
        .outputs
        .iter()
        .position(|o| o.name == WAVEFORM_OUTPUT)
        .ok_or_else(|| {
            SynthesisError::StreamError(format!("response has no '{WAVEFORM_OUTPUT}' output"))
        })?;

    let samples = match infer.raw_output_contents.get(position) {
        Some(raw) => decode_fp32(raw)?,
        None => infer.outputs[position]
            .contents
            .as_ref()
            .map(|c| c.fp32_contents.clone())
            .unwrap_or_default(),
    };
    Ok(AudioChunk::audio(samples))
}
