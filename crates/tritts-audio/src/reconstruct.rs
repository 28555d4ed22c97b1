//! Strategies for turning one segment's streamed chunks into a single waveform.

/// Joins the audio chunks of one streamed segment.
pub trait Reconstruction: Send + Sync {
    fn name(&self) -> &str;
    fn reconstruct(&self, chunks: &[Vec<f32>]) -> Vec<f32>;
}

/// Chunks joined end to end with no blending.
#[derive(Debug, Default, Clone, Copy)]
pub struct Concatenate;

impl Reconstruction for Concatenate {
    fn name(&self) -> &str {
        "concatenate"
    }

    fn reconstruct(&self, chunks: &[Vec<f32>]) -> Vec<f32> {
        chunks.concat()
    }
}

/// Linear cross-fade over `overlap` samples between each pair of adjacent chunks.
///
/// The tail of chunk `i - 1` fades out while the head of chunk `i` fades in;
/// everything outside the overlap windows is copied unchanged. When a chunk is
/// too short for the full window the overlap shrinks to what is available, so
/// no sample is ever used in two windows.
#[derive(Debug, Clone, Copy)]
pub struct CrossFade {
    overlap: usize,
}

impl CrossFade {
    pub fn new(overlap: usize) -> Self {
        Self { overlap }
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

/// `n` evenly spaced values from `start` to `end`, both included.
fn linspace(start: f32, end: f32, n: usize) -> impl Iterator<Item = f32> {
    let step = if n > 1 {
        (end - start) / (n - 1) as f32
    } else {
        0.0
    };
    (0..n).map(move |i| if i + 1 == n && n > 1 { end } else { start + step * i as f32 })
}

impl Reconstruction for CrossFade {
    fn name(&self) -> &str {
        "cross-fade"
    }

    fn reconstruct(&self, chunks: &[Vec<f32>]) -> Vec<f32> {
        let Some((first, rest)) = chunks.split_first() else {
            return Vec::new();
        };
        if self.overlap == 0 || rest.is_empty() {
            return chunks.concat();
        }

        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut out = Vec::with_capacity(total);

        let mut prev: &[f32] = first;
        // Samples at the head of `prev` already consumed by the previous window
        let mut prev_head = 0usize;

        for cur in rest {
            let overlap = self
                .overlap
                .min(prev.len() - prev_head)
                .min(cur.len());
            let tail_start = prev.len() - overlap;

            out.extend_from_slice(&prev[prev_head..tail_start]);

            let fade_out = linspace(1.0, 0.0, overlap);
            let fade_in = linspace(0.0, 1.0, overlap);
            out.extend(
                cur[..overlap]
                    .iter()
                    .zip(&prev[tail_start..])
                    .zip(fade_in.zip(fade_out))
                    .map(|((&head, &tail), (fin, fout))| head * fin + tail * fout),
            );

            prev = cur;
            prev_head = overlap;
        }
        out.extend_from_slice(&prev[prev_head..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenate_joins_in_order() {
        let chunks = vec![vec![1.0, 2.0], vec![], vec![3.0]];
        assert_eq!(Concatenate.reconstruct(&chunks), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_concatenate_empty() {
        assert!(Concatenate.reconstruct(&[]).is_empty());
    }

    #[test]
    fn test_linspace_endpoints() {
        let values: Vec<f32> = linspace(1.0, 0.0, 5).collect();
        assert_eq!(values, vec![1.0, 0.75, 0.5, 0.25, 0.0]);
        let single: Vec<f32> = linspace(0.0, 1.0, 1).collect();
        assert_eq!(single, vec![0.0]);
        assert_eq!(linspace(0.0, 1.0, 0).count(), 0);
    }

    #[test]
    fn test_cross_fade_single_chunk_is_untouched() {
        let chunks = vec![vec![0.1, 0.2, 0.3]];
        assert_eq!(CrossFade::new(2).reconstruct(&chunks), chunks[0]);
    }

    #[test]
    fn test_cross_fade_zero_overlap_concatenates() {
        let chunks = vec![vec![1.0, 1.0], vec![2.0, 2.0]];
        assert_eq!(CrossFade::new(0).reconstruct(&chunks), vec![1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_cross_fade_blends_constant_chunks_linearly() {
        let a = vec![1.0f32; 10];
        let b = vec![3.0f32; 10];
        let out = CrossFade::new(5).reconstruct(&[a, b]);

        assert_eq!(out.len(), 15);
        assert_eq!(&out[..5], &[1.0f32; 5]);
        // First overlap sample equals the fading-out edge, last equals the fading-in one
        assert!((out[5] - 1.0).abs() < 1e-6);
        assert!((out[9] - 3.0).abs() < 1e-6);
        for (k, &v) in out[5..10].iter().enumerate() {
            let t = k as f32 / 4.0;
            assert!((v - (1.0 * (1.0 - t) + 3.0 * t)).abs() < 1e-6, "k={k} v={v}");
        }
        assert_eq!(&out[10..], &[3.0f32; 5]);
    }

    #[test]
    fn test_cross_fade_three_chunks_length() {
        let chunks = vec![vec![0.5; 8], vec![0.5; 8], vec![0.5; 8]];
        let out = CrossFade::new(3).reconstruct(&chunks);
        assert_eq!(out.len(), 24 - 2 * 3);
        // Blending equal values is the identity
        assert!(out.iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_cross_fade_short_chunk_shrinks_overlap() {
        // Middle chunk is shorter than two windows; nothing is read twice
        let chunks = vec![vec![1.0; 6], vec![2.0; 3], vec![4.0; 6]];
        let out = CrossFade::new(2).reconstruct(&chunks);
        // overlaps: min(2, 6, 3) = 2, then min(2, 3 - 2, 6) = 1
        assert_eq!(out.len(), 15 - 2 - 1);
        assert_eq!(out[..4], [1.0f32; 4]);
        assert_eq!(out[4], 1.0);
        assert_eq!(out[5], 2.0);
        // single-sample window keeps the fading-out side
        assert_eq!(out[6], 2.0);
        assert_eq!(out[7..], [4.0f32; 5]);
    }
}
