//! The paced acquire → timestamp → process → measure → show → pace cycle.
//!
//! Single-threaded. Every blocking point (read, tracker call, key poll, pacing
//! sleep) runs on the caller's thread. The loop owns the source and releases
//! it when the loop ends, whichever way it ends.

use std::time::{Duration, Instant};

use crate::display::{FrameDisplay, ESC_KEY};
use crate::frame::FrameRecord;
use crate::ingest::{SourceDescriptor, VideoSource};
use crate::pacing::{compute_sleep, RateConfig};
use crate::stats::StatsCollector;
use crate::timestamp::TimestampPolicy;
use crate::tracker::Tracker;

/// Why the loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopExit {
    /// The source had no more frames (or could not produce one).
    EndOfStream,
    /// The exit key was pressed.
    ExitKey,
}

#[derive(Debug)]
pub struct LoopOutcome {
    pub frames: u64,
    pub exit: LoopExit,
    pub stats: StatsCollector,
}

pub struct FrameLoop {
    source: Box<dyn VideoSource>,
    timestamps: TimestampPolicy,
    rate: RateConfig,
    key_poll: Duration,
}

impl FrameLoop {
    /// Take ownership of an opened source; the rate is fixed here from what
    /// the source reports.
    pub fn new(
        source: Box<dyn VideoSource>,
        descriptor: &SourceDescriptor,
        key_poll: Duration,
    ) -> Self {
        let rate = RateConfig::from_reported(source.reported_fps());
        if rate.used_fallback() {
            log::info!(
                "reported frame rate {} unusable, pacing at {} fps",
                rate.reported_fps,
                rate.effective_fps
            );
        }
        Self {
            source,
            timestamps: TimestampPolicy::for_source(descriptor),
            rate,
            key_poll,
        }
    }

    pub fn rate(&self) -> RateConfig {
        self.rate
    }

    pub fn run(mut self, tracker: &mut dyn Tracker, display: &mut dyn FrameDisplay) -> LoopOutcome {
        let interval = self.rate.frame_interval();
        let mut stats = StatsCollector::new();
        let mut frames = 0u64;

        let exit = loop {
            let frame = match self.source.read() {
                Ok(Some(frame)) => frame,
                Ok(None) => break LoopExit::EndOfStream,
                Err(err) => {
                    log::warn!(
                        "read from {} failed, ending stream: {:#}",
                        self.source.describe(),
                        err
                    );
                    break LoopExit::EndOfStream;
                }
            };
            let timestamp = self.timestamps.timestamp(self.source.as_ref());
            let shown = frame.clone();

            let started = Instant::now();
            tracker.process_frame(FrameRecord::new(frame, timestamp));
            let processing = started.elapsed();

            stats.record(processing);
            frames += 1;

            if display.show(&shown, self.key_poll) == Some(ESC_KEY) {
                log::info!("exit key pressed after {} frames", frames);
                break LoopExit::ExitKey;
            }

            let pause = compute_sleep(interval, processing);
            if !pause.is_zero() {
                std::thread::sleep(pause);
            }
        };

        display.close();
        log::info!(
            "released {} ({} frames read)",
            self.source.describe(),
            self.source.frames_read()
        );
        drop(self.source);

        LoopOutcome {
            frames,
            exit,
            stats,
        }
    }
}
