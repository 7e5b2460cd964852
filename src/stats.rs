//! Processing-time statistics.

use std::time::Duration;

/// Summary printed at the end of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingSummary {
    pub count: usize,
    /// Element at index `count / 2` of the sorted samples (upper median for
    /// even counts).
    pub median: Duration,
    pub mean: Duration,
    pub total: Duration,
}

/// Collects one processing duration per frame for the whole run.
#[derive(Clone, Debug, Default)]
pub struct StatsCollector {
    samples: Vec<Duration>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, processing: Duration) {
        self.samples.push(processing);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consume the samples. `None` when nothing was recorded.
    pub fn summarize(self) -> Option<TimingSummary> {
        summarize(self.samples)
    }
}

pub fn summarize(mut samples: Vec<Duration>) -> Option<TimingSummary> {
    if samples.is_empty() {
        return None;
    }
    samples.sort_unstable();
    let count = samples.len();
    let total: Duration = samples.iter().sum();
    Some(TimingSummary {
        count,
        median: samples[count / 2],
        mean: Duration::from_nanos((total.as_nanos() / count as u128) as u64),
        total,
    })
}

impl std::fmt::Display for TimingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Frames processed: {}", self.count)?;
        writeln!(f, "median tracking time: {:.6}", self.median.as_secs_f64())?;
        write!(f, "mean tracking time: {:.6}", self.mean.as_secs_f64())
    }
}
