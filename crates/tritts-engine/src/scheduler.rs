use crate::consumer::StreamConsumer;
use crate::delay::LaunchDelay;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tritts_core::{Segment, SegmentResult, SynthesisError, SynthesisRequest};

struct Launched {
    index: usize,
    launched_at: Instant,
    handle: JoinHandle<SegmentResult>,
}

/// Launches one stream consumer per segment, staggered by a launch delay,
/// and collects every outcome keyed by segment index.
pub struct SegmentScheduler {
    consumer: Arc<StreamConsumer>,
    delay: Arc<dyn LaunchDelay>,
    permits: Option<Arc<Semaphore>>,
}

impl SegmentScheduler {
    pub fn new(consumer: StreamConsumer, delay: Arc<dyn LaunchDelay>) -> Self {
        Self {
            consumer: Arc::new(consumer),
            delay,
            permits: None,
        }
    }

    /// Cap the number of streams open at once. Zero means unlimited.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.permits = (max > 0).then(|| Arc::new(Semaphore::new(max)));
        self
    }

    pub fn with_launch_delay(mut self, delay: Arc<dyn LaunchDelay>) -> Self {
        self.delay = delay;
        self
    }

    /// Run every segment and wait for all of them.
    ///
    /// Segments are launched in index order; later ones start while earlier
    /// ones are still streaming. A segment whose request cannot be built is
    /// recorded as failed without opening a stream. The returned map holds
    /// exactly one entry per input segment.
    pub async fn synthesize<F>(
        &self,
        segments: &[Segment],
        mut request_for: F,
    ) -> BTreeMap<usize, SegmentResult>
    where
        F: FnMut(&Segment) -> Result<SynthesisRequest, SynthesisError>,
    {
        let mut results = BTreeMap::new();
        let mut launched = Vec::with_capacity(segments.len());

        for (position, segment) in segments.iter().enumerate() {
            if position > 0 {
                let delay = self.delay.delay_before(segment.index);
                if delay > Duration::ZERO {
                    tracing::debug!(
                        segment = segment.index,
                        "waiting {:.2}s before launching next segment",
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }

            let request = match request_for(segment) {
                Ok(request) => request,
                Err(e) => {
                    tracing::error!(segment = segment.index, "failed to build request: {e}");
                    results.insert(
                        segment.index,
                        SegmentResult::failed(segment.index, e, Duration::ZERO),
                    );
                    continue;
                }
            };

            tracing::info!(
                segment = segment.index,
                text = %segment.text,
                "launching segment {}/{}",
                position + 1,
                segments.len()
            );
            launched.push(self.spawn(segment.index, request));
        }
        tracing::info!("all {} tasks launched", segments.len());

        for task in launched {
            let result = match task.handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(segment = task.index, "segment task panicked: {e}");
                    SegmentResult::failed(
                        task.index,
                        SynthesisError::StreamError("task panicked".to_string()),
                        task.launched_at.elapsed(),
                    )
                }
            };
            if let Err(e) = &result.outcome {
                tracing::error!(segment = task.index, "segment failed: {e}");
            }
            results.insert(task.index, result);
        }

        results
    }

    fn spawn(&self, index: usize, request: SynthesisRequest) -> Launched {
        let consumer = Arc::clone(&self.consumer);
        let permits = self.permits.clone();
        let launched_at = Instant::now();

        let handle = tokio::spawn(async move {
            // Held until the segment completes
            let _permit = match permits {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        return SegmentResult::failed(
                            index,
                            SynthesisError::StreamError("scheduler closed".to_string()),
                            launched_at.elapsed(),
                        )
                    }
                },
                None => None,
            };
            consumer.run(index, request).await
        });

        Launched {
            index,
            launched_at,
            handle,
        }
    }
}
