//! Synthetic frame source.
//!
//! `stub://` inputs produce generated frames with a file-like timeline:
//! - a fixed number of frames, then end of stream
//! - a reported frame rate
//! - a playback position that advances by one frame interval per read
//!
//! Query parameters: `frames`, `fps`, `width`, `height`, e.g.
//! `stub://clip?frames=120&fps=24&width=640&height=480`.

use anyhow::{anyhow, Result};

use super::VideoSource;
use crate::frame::{Frame, BYTES_PER_PIXEL};

pub const STUB_SCHEME: &str = "stub://";

/// Configuration for a synthetic source.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticConfig {
    pub name: String,
    /// Frames produced before end of stream.
    pub frames: u64,
    /// Reported frame rate. Zero mimics devices that do not report a rate.
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            name: "synthetic".to_string(),
            frames: 300,
            fps: 30.0,
            width: 320,
            height: 240,
        }
    }
}

impl SyntheticConfig {
    /// Parse a `stub://name?key=value&...` URI.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix(STUB_SCHEME)
            .ok_or_else(|| anyhow!("synthetic sources only accept {} URIs", STUB_SCHEME))?;
        let (name, query) = match rest.split_once('?') {
            Some((name, query)) => (name, Some(query)),
            None => (rest, None),
        };

        let mut cfg = Self::default();
        if !name.trim().is_empty() {
            cfg.name = name.to_string();
        }
        for pair in query.unwrap_or_default().split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("malformed stub parameter '{}'", pair))?;
            match key {
                "frames" => cfg.frames = parse_param(key, value)?,
                "fps" => cfg.fps = parse_param(key, value)?,
                "width" => cfg.width = parse_param(key, value)?,
                "height" => cfg.height = parse_param(key, value)?,
                other => return Err(anyhow!("unknown stub parameter '{}'", other)),
            }
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(anyhow!("stub frame size must be non-zero"));
        }
        Ok(cfg)
    }
}

fn parse_param<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("invalid value '{}' for stub parameter '{}'", value, key))
}

/// Generated frames on a file-like timeline.
pub struct SyntheticSource {
    config: SyntheticConfig,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        log::info!(
            "SyntheticSource: opened {} ({} frames, {}x{})",
            config.name,
            config.frames,
            config.width,
            config.height
        );
        Self {
            config,
            frame_count: 0,
        }
    }

    /// A diagonal gradient shifted by one step per frame.
    fn generate_pixels(&self) -> Vec<u8> {
        let pixel_count =
            self.config.width as usize * self.config.height as usize * BYTES_PER_PIXEL;
        (0..pixel_count)
            .map(|i| ((i as u64 + self.frame_count) % 256) as u8)
            .collect()
    }

    fn frame_interval_ms(&self) -> f64 {
        if self.config.fps > 0.0 {
            1000.0 / self.config.fps
        } else {
            0.0
        }
    }
}

impl VideoSource for SyntheticSource {
    fn read(&mut self) -> Result<Option<Frame>> {
        if self.frame_count >= self.config.frames {
            return Ok(None);
        }
        let pixels = self.generate_pixels();
        self.frame_count += 1;
        Ok(Some(Frame::new(
            pixels,
            self.config.width,
            self.config.height,
        )))
    }

    fn reported_fps(&self) -> f64 {
        self.config.fps
    }

    /// Position of the last frame read, like a decoder's current timestamp.
    fn position_ms(&self) -> f64 {
        self.frame_count.saturating_sub(1) as f64 * self.frame_interval_ms()
    }

    fn describe(&self) -> String {
        format!("{}{} (synthetic)", STUB_SCHEME, self.config.name)
    }

    fn frames_read(&self) -> u64 {
        self.frame_count
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        log::debug!(
            "SyntheticSource: released {} after {} frames",
            self.config.name,
            self.frame_count
        );
    }
}
