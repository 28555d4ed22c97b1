use crate::consumer::StreamConsumer;
use crate::delay::{LaunchDelay, UniformDelay};
use crate::reassemble::combine;
use crate::registry::StrategyRegistry;
use crate::request::build_request;
use crate::scheduler::SegmentScheduler;
use crate::transport::InferenceTransport;
use std::sync::Arc;
use tokio::time::Instant;
use tritts_core::{
    segment_text, MissingSegmentPolicy, ReferenceVoice, RunConfig, SynthesisError, SynthesisStats,
};

/// Text in, one waveform out: segment, schedule, reassemble.
pub struct Synthesizer {
    config: RunConfig,
    reference: Option<ReferenceVoice>,
    scheduler: SegmentScheduler,
}

impl Synthesizer {
    pub fn new(
        config: RunConfig,
        transport: Arc<dyn InferenceTransport>,
        reference: Option<ReferenceVoice>,
    ) -> Result<Self, SynthesisError> {
        Self::with_registry(config, transport, reference, &StrategyRegistry::new())
    }

    pub fn with_registry(
        config: RunConfig,
        transport: Arc<dyn InferenceTransport>,
        reference: Option<ReferenceVoice>,
        registry: &StrategyRegistry,
    ) -> Result<Self, SynthesisError> {
        config.validate()?;
        let strategy = registry.create(&config.model_name, config.overlap_samples())?;
        tracing::debug!(
            model = %config.model_name,
            strategy = strategy.name(),
            transport = transport.name(),
            "synthesizer configured"
        );

        let consumer = StreamConsumer::new(
            transport,
            strategy,
            &config.model_name,
            config.receive_timeout,
        );
        let delay = UniformDelay::new(config.min_launch_delay, config.max_launch_delay);
        let scheduler = SegmentScheduler::new(consumer, Arc::new(delay))
            .with_max_concurrency(config.max_concurrency);

        Ok(Self {
            config,
            reference,
            scheduler,
        })
    }

    /// Replace the randomized launch jitter.
    pub fn with_launch_delay(mut self, delay: Arc<dyn LaunchDelay>) -> Self {
        self.scheduler = self.scheduler.with_launch_delay(delay);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub async fn synthesize(
        &self,
        text: &str,
    ) -> Result<(Vec<f32>, SynthesisStats), SynthesisError> {
        let started = Instant::now();

        let segments = segment_text(text, self.config.min_words, self.config.max_words);
        if segments.is_empty() {
            return Err(SynthesisError::InvalidInput(
                "target text has no content to synthesize".to_string(),
            ));
        }
        tracing::info!("text split into {} segments", segments.len());
        for segment in &segments {
            tracing::info!(segment = segment.index, "segment text: {}", segment.text);
        }

        let reference = self.reference.as_ref();
        let cache_mode = self.config.cache_mode;
        let padding = self.config.padding_unit_secs;
        let results = self
            .scheduler
            .synthesize(&segments, |segment| {
                build_request(&segment.text, reference, cache_mode, padding)
            })
            .await;

        let (audio, stats) = combine(&segments, &results, started.elapsed());
        if !stats.failed.is_empty() {
            tracing::warn!(
                failed = ?stats.failed,
                "{} of {} segments produced no audio",
                stats.failed.len(),
                stats.num_segments
            );
        }

        if stats.succeeded == 0 || audio.is_empty() {
            return Err(SynthesisError::NoAudio);
        }
        if self.config.missing_policy == MissingSegmentPolicy::Fail && !stats.failed.is_empty() {
            return Err(SynthesisError::MissingSegments(stats.failed));
        }

        Ok((audio, stats))
    }
}
