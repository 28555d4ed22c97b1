//! An in-process transport that replays scripted server behavior, keyed by
//! the target text of each request.

use crate::transport::{InferenceStream, InferenceTransport, StreamRequest};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tritts_core::{AudioChunk, SynthesisError};

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// Deliver an audio chunk.
    Chunk(Vec<f32>),
    /// Wait before the next step.
    Delay(Duration),
    /// Deliver the final marker.
    Final,
    /// Deliver a server-side error.
    Error(String),
    /// Never deliver anything again.
    Hang,
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

pub struct ScriptedTransport {
    scripts: HashMap<String, Vec<ScriptStep>>,
    default_script: Vec<ScriptStep>,
    fail_open: bool,
    stall_send: bool,
    counters: Arc<Counters>,
    requests: Arc<Mutex<Vec<StreamRequest>>>,
}

impl ScriptedTransport {
    /// Requests without a script receive `default_script`.
    pub fn new(default_script: Vec<ScriptStep>) -> Self {
        Self {
            scripts: HashMap::new(),
            default_script,
            fail_open: false,
            stall_send: false,
            counters: Arc::new(Counters::default()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_script(mut self, target_text: &str, steps: Vec<ScriptStep>) -> Self {
        self.scripts.insert(target_text.to_string(), steps);
        self
    }

    /// Make every `open_stream` fail, as an unreachable server would.
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Make `send` never complete, as a server that withholds its response
    /// headers would.
    pub fn stalling_send(mut self) -> Self {
        self.stall_send = true;
        self
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// Most streams that were open at the same time.
    pub fn peak_active(&self) -> usize {
        self.counters.peak_active.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl InferenceTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn is_live(&self) -> Result<bool, SynthesisError> {
        Ok(!self.fail_open)
    }

    async fn open_stream(&self) -> Result<Box<dyn InferenceStream>, SynthesisError> {
        if self.fail_open {
            return Err(SynthesisError::StreamError("connection refused".to_string()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak_active.fetch_max(active, Ordering::SeqCst);

        Ok(Box::new(ScriptedStream {
            scripts: self.scripts.clone(),
            default_script: self.default_script.clone(),
            steps: VecDeque::new(),
            stall_send: self.stall_send,
            counters: Arc::clone(&self.counters),
            requests: Arc::clone(&self.requests),
            closed: false,
        }))
    }
}

struct ScriptedStream {
    scripts: HashMap<String, Vec<ScriptStep>>,
    default_script: Vec<ScriptStep>,
    steps: VecDeque<ScriptStep>,
    stall_send: bool,
    counters: Arc<Counters>,
    requests: Arc<Mutex<Vec<StreamRequest>>>,
    closed: bool,
}

#[async_trait]
impl InferenceStream for ScriptedStream {
    async fn send(&mut self, request: StreamRequest) -> Result<(), SynthesisError> {
        if self.stall_send {
            std::future::pending::<()>().await;
        }
        let script = self
            .scripts
            .get(&request.request.target_text)
            .unwrap_or(&self.default_script);
        self.steps = script.iter().cloned().collect();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<AudioChunk>, SynthesisError> {
        loop {
            match self.steps.pop_front() {
                Some(ScriptStep::Delay(d)) => tokio::time::sleep(d).await,
                Some(ScriptStep::Chunk(samples)) => return Ok(Some(AudioChunk::audio(samples))),
                Some(ScriptStep::Final) => return Ok(Some(AudioChunk::final_marker())),
                Some(ScriptStep::Error(msg)) => return Err(SynthesisError::StreamError(msg)),
                Some(ScriptStep::Hang) => std::future::pending::<()>().await,
                None => return Ok(None),
            }
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            self.counters.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
