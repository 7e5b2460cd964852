//! Video source acquisition.
//!
//! This module provides the sources frames are read from:
//! - Local video files and stream URIs (feature: ingest-file-ffmpeg)
//! - USB/V4L2 cameras (feature: ingest-v4l2)
//! - Synthetic `stub://` sources (always available, used offline and in tests)
//!
//! Opening is split in two:
//! - `BackendCatalog`: ordered backend candidates for this build
//! - `SourceResolver`: classifies the input token and walks the catalog
//!
//! Every source yields owned RGB24 `Frame`s and reports the rate and playback
//! position the timestamp policy and pacing scheduler need.

use anyhow::Result;

use crate::frame::Frame;

pub mod catalog;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
#[cfg(all(feature = "ingest-v4l2", target_os = "linux"))]
mod normalize;
pub mod resolver;
pub mod synthetic;
#[cfg(all(feature = "ingest-v4l2", target_os = "linux"))]
pub(crate) mod v4l2;

pub use catalog::{BackendCandidate, BackendCatalog, BackendId};
pub use resolver::{
    AttemptOutcome, OpenAttempt, OpenError, Resolved, SourceDescriptor, SourceKind,
    SourceResolver,
};
pub use synthetic::{SyntheticConfig, SyntheticSource};

/// An open decoder or capture handle.
///
/// Dropping the value releases the underlying handle.
pub trait VideoSource {
    /// Read the next frame. `Ok(None)` marks the end of the stream.
    fn read(&mut self) -> Result<Option<Frame>>;

    /// Frame rate as reported by the container or device. May be 0 or bogus.
    fn reported_fps(&self) -> f64;

    /// Current playback position in milliseconds on the source's own timeline.
    fn position_ms(&self) -> f64;

    /// Short human-readable description for diagnostics.
    fn describe(&self) -> String;

    /// Frames handed out so far.
    fn frames_read(&self) -> u64;
}

impl<S: VideoSource + ?Sized> VideoSource for Box<S> {
    fn read(&mut self) -> Result<Option<Frame>> {
        (**self).read()
    }

    fn reported_fps(&self) -> f64 {
        (**self).reported_fps()
    }

    fn position_ms(&self) -> f64 {
        (**self).position_ms()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn frames_read(&self) -> u64 {
        (**self).frames_read()
    }
}

/// Performs a single open attempt with a specific backend.
///
/// The resolver owns the iteration; an opener only answers "did this one
/// backend open this one input".
pub trait SourceOpener {
    fn open_camera(&mut self, index: u32, backend: BackendId) -> Result<Box<dyn VideoSource>>;

    fn open_path(&mut self, target: &str, backend: BackendId) -> Result<Box<dyn VideoSource>>;
}

/// Opener backed by the decoders compiled into this build.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemOpener;

impl SourceOpener for SystemOpener {
    fn open_camera(&mut self, index: u32, backend: BackendId) -> Result<Box<dyn VideoSource>> {
        match backend {
            BackendId::V4l2 | BackendId::Any => open_v4l2(&format!("/dev/video{}", index)),
            other => anyhow::bail!("backend {} cannot open camera devices", other),
        }
    }

    fn open_path(&mut self, target: &str, backend: BackendId) -> Result<Box<dyn VideoSource>> {
        match backend {
            BackendId::Ffmpeg => open_ffmpeg(target),
            BackendId::V4l2 => open_v4l2(target),
            BackendId::Synthetic => open_synthetic(target),
            BackendId::Any => {
                if target.starts_with(synthetic::STUB_SCHEME) {
                    open_synthetic(target)
                } else if target.starts_with("/dev/video") && BackendId::V4l2.is_compiled_in() {
                    open_v4l2(target)
                } else if BackendId::Ffmpeg.is_compiled_in() {
                    open_ffmpeg(target)
                } else {
                    anyhow::bail!(
                        "no decoder compiled in for '{}' (enable the ingest-file-ffmpeg feature)",
                        target
                    )
                }
            }
        }
    }
}

fn open_synthetic(target: &str) -> Result<Box<dyn VideoSource>> {
    let config = SyntheticConfig::from_uri(target)?;
    Ok(Box::new(SyntheticSource::new(config)))
}

#[cfg(feature = "ingest-file-ffmpeg")]
fn open_ffmpeg(target: &str) -> Result<Box<dyn VideoSource>> {
    Ok(Box::new(file_ffmpeg::FfmpegFileSource::open(target)?))
}

#[cfg(not(feature = "ingest-file-ffmpeg"))]
fn open_ffmpeg(_target: &str) -> Result<Box<dyn VideoSource>> {
    anyhow::bail!("file decoding requires the ingest-file-ffmpeg feature")
}

#[cfg(all(feature = "ingest-v4l2", target_os = "linux"))]
fn open_v4l2(device: &str) -> Result<Box<dyn VideoSource>> {
    Ok(Box::new(v4l2::V4l2Source::open(device)?))
}

#[cfg(not(all(feature = "ingest-v4l2", target_os = "linux")))]
fn open_v4l2(_device: &str) -> Result<Box<dyn VideoSource>> {
    anyhow::bail!("camera capture requires the ingest-v4l2 feature on Linux")
}
