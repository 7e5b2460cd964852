//! Per-frame timestamps.
//!
//! Cameras carry no reliable timeline, so live frames are stamped with the
//! monotonic clock at read time. Recorded sources are stamped with the
//! decoder's playback position, independent of how fast they are read.

use std::time::Instant;

use crate::ingest::{SourceDescriptor, VideoSource};

#[derive(Clone, Copy, Debug)]
pub enum TimestampPolicy {
    /// Seconds on the monotonic clock, measured from `origin`.
    WallClock { origin: Instant },
    /// Source playback position, milliseconds converted to seconds.
    Playback,
}

impl TimestampPolicy {
    pub fn for_source(descriptor: &SourceDescriptor) -> Self {
        if descriptor.is_live() {
            TimestampPolicy::WallClock {
                origin: Instant::now(),
            }
        } else {
            TimestampPolicy::Playback
        }
    }

    /// Timestamp in seconds for the frame just read from `source`.
    pub fn timestamp(&self, source: &dyn VideoSource) -> f64 {
        match self {
            TimestampPolicy::WallClock { origin } => origin.elapsed().as_secs_f64(),
            TimestampPolicy::Playback => source.position_ms() / 1000.0,
        }
    }
}
