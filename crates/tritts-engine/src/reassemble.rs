use std::collections::BTreeMap;
use std::time::Duration;
use tritts_core::{Segment, SegmentResult, SynthesisStats};

/// Concatenate segment waveforms in index order.
///
/// Segments without audio are skipped and reported in `failed`. The output
/// is a plain concatenation; no smoothing is applied across segment seams.
pub fn combine(
    segments: &[Segment],
    results: &BTreeMap<usize, SegmentResult>,
    total_time: Duration,
) -> (Vec<f32>, SynthesisStats) {
    let mut audio = Vec::new();
    let mut failed = Vec::new();
    let mut succeeded = 0;
    let mut first_chunk_latencies = Vec::new();

    for segment in segments {
        match results.get(&segment.index) {
            Some(result) => match result.waveform() {
                Some(waveform) => {
                    audio.extend_from_slice(waveform);
                    succeeded += 1;
                    if let Some(latency) = result.first_chunk_latency {
                        first_chunk_latencies.push(latency);
                    }
                }
                None => {
                    tracing::error!(segment = segment.index, "no audio for segment, skipping");
                    failed.push(segment.index);
                }
            },
            None => {
                tracing::error!(segment = segment.index, "segment has no result, skipping");
                failed.push(segment.index);
            }
        }
    }

    let avg_first_chunk_latency = (!first_chunk_latencies.is_empty()).then(|| {
        first_chunk_latencies.iter().sum::<Duration>() / first_chunk_latencies.len() as u32
    });

    let stats = SynthesisStats {
        total_time,
        num_segments: segments.len(),
        succeeded,
        failed,
        output_samples: audio.len(),
        avg_first_chunk_latency,
    };
    (audio, stats)
}
