//! Frame pacing.
//!
//! `RateConfig` turns the rate a source reports into the rate the loop runs at.
//! `compute_sleep` says how long to hold the loop after a frame so delivery
//! approximates that rate. Late frames are not compensated and nothing is
//! skipped.

use std::time::Duration;

/// Rate used when a source reports nothing usable (webcams often report 0).
pub const FALLBACK_FPS: f64 = 30.0;

/// Highest reported rate taken at face value.
pub const MAX_FPS: f64 = 120.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateConfig {
    pub reported_fps: f64,
    /// Always in `(0, MAX_FPS]`.
    pub effective_fps: f64,
    pub frame_interval_secs: f64,
}

impl RateConfig {
    pub fn from_reported(reported_fps: f64) -> Self {
        let effective_fps = if reported_fps > 0.0 && reported_fps <= MAX_FPS {
            reported_fps
        } else {
            FALLBACK_FPS
        };
        Self {
            reported_fps,
            effective_fps,
            frame_interval_secs: 1.0 / effective_fps,
        }
    }

    /// Saturates at `Duration::MAX` for rates too small to represent.
    pub fn frame_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.frame_interval_secs).unwrap_or(Duration::MAX)
    }

    pub fn used_fallback(&self) -> bool {
        self.effective_fps != self.reported_fps
    }
}

/// `max(frame_interval - processing, 0)`.
pub fn compute_sleep(frame_interval: Duration, processing: Duration) -> Duration {
    frame_interval.saturating_sub(processing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_rates_are_kept() {
        for fps in [0.5, 24.0, 29.97, 60.0, 120.0] {
            let rate = RateConfig::from_reported(fps);
            assert_eq!(rate.effective_fps, fps);
            assert!(!rate.used_fallback());
        }
    }

    #[test]
    fn unusable_rates_fall_back_to_thirty() {
        for fps in [0.0, -1.0, 120.0001, 1000.0, f64::NAN, f64::INFINITY] {
            let rate = RateConfig::from_reported(fps);
            assert_eq!(rate.effective_fps, FALLBACK_FPS, "reported {}", fps);
            assert!(rate.used_fallback());
        }
    }

    #[test]
    fn zero_rate_gives_a_thirtieth_of_a_second() {
        let rate = RateConfig::from_reported(0.0);
        assert!((rate.frame_interval_secs - 1.0 / 30.0).abs() < 1e-12);
        assert_eq!(rate.frame_interval().as_millis(), 33);
    }

    #[test]
    fn vanishing_rates_saturate_the_interval() {
        for fps in [1e-300, f64::MIN_POSITIVE, 5e-324] {
            let rate = RateConfig::from_reported(fps);
            assert_eq!(rate.effective_fps, fps);
            assert_eq!(rate.frame_interval(), Duration::MAX);
        }
        let slow = RateConfig::from_reported(0.5);
        assert_eq!(slow.frame_interval(), Duration::from_secs(2));
    }

    #[test]
    fn sleeps_for_the_remaining_interval() {
        let interval = Duration::from_millis(40);
        assert_eq!(
            compute_sleep(interval, Duration::from_millis(15)),
            Duration::from_millis(25)
        );
        assert_eq!(compute_sleep(interval, Duration::ZERO), interval);
    }

    #[test]
    fn late_frames_do_not_sleep() {
        let interval = Duration::from_millis(40);
        assert_eq!(compute_sleep(interval, interval), Duration::ZERO);
        assert_eq!(
            compute_sleep(interval, Duration::from_millis(90)),
            Duration::ZERO
        );
    }
}
