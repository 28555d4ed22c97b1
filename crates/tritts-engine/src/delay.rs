//! Pauses between segment launches, standing in for text that arrives
//! incrementally from an upstream generator.

use rand::Rng;
use std::time::Duration;

pub trait LaunchDelay: Send + Sync {
    /// How long to wait before launching the segment at `index` (never called for 0).
    fn delay_before(&self, index: usize) -> Duration;
}

/// Uniformly random delay in `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct UniformDelay {
    min: Duration,
    max: Duration,
}

impl UniformDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }
}

impl LaunchDelay for UniformDelay {
    fn delay_before(&self, _index: usize) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FixedDelay(pub Duration);

impl LaunchDelay for FixedDelay {
    fn delay_before(&self, _index: usize) -> Duration {
        self.0
    }
}

impl<F> LaunchDelay for F
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn delay_before(&self, index: usize) -> Duration {
        self(index)
    }
}
