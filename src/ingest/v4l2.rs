//! V4L2 camera source.
//!
//! Opens a local device node (e.g. `/dev/video0`), captures through an mmap
//! stream and converts each buffer to RGB24. The playback position is the
//! driver's buffer timestamp relative to the first captured frame.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::normalize::{normalize_to_rgb, PixelFormat};
use super::VideoSource;
use crate::frame::Frame;

/// Preferred capture size; the driver may pick something else.
const PREFERRED_WIDTH: u32 = 640;
const PREFERRED_HEIGHT: u32 = 480;
const STREAM_BUFFERS: u32 = 4;

pub(crate) struct V4l2Source {
    device_path: String,
    state: V4l2State,
    pixel_format: PixelFormat,
    width: u32,
    height: u32,
    reported_fps: f64,
    first_timestamp_ms: Option<f64>,
    position_ms: f64,
    frame_count: u64,
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Source {
    pub(crate) fn open(device_path: &str) -> Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(device_path)
            .with_context(|| format!("open v4l2 device {}", device_path))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = PREFERRED_WIDTH;
        format.height = PREFERRED_HEIGHT;
        format.fourcc = v4l::FourCC::new(b"YUYV");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Source: failed to set format on {}: {}",
                    device_path,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };
        let pixel_format = PixelFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
            anyhow!(
                "unsupported v4l2 pixel format {} on {}",
                format.fourcc,
                device_path
            )
        })?;

        // A missing or zero interval is reported as 0 fps; the rate policy
        // substitutes its fallback.
        let reported_fps = match device.params() {
            Ok(params) if params.interval.numerator > 0 => {
                f64::from(params.interval.denominator) / f64::from(params.interval.numerator)
            }
            Ok(_) => 0.0,
            Err(err) => {
                log::warn!(
                    "V4l2Source: failed to read params on {}: {}",
                    device_path,
                    err
                );
                0.0
            }
        };

        let state = V4l2StateTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, STREAM_BUFFERS)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!(
            "V4l2Source: opened {} ({}x{} {:?}, {:.3} fps)",
            device_path,
            format.width,
            format.height,
            pixel_format,
            reported_fps
        );

        Ok(Self {
            device_path: device_path.to_string(),
            state,
            pixel_format,
            width: format.width,
            height: format.height,
            reported_fps,
            first_timestamp_ms: None,
            position_ms: 0.0,
            frame_count: 0,
        })
    }
}

impl VideoSource for V4l2Source {
    fn read(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        let (width, height, format) = (self.width, self.height, self.pixel_format);
        let (pixels, timestamp_ms) = self.state.with_stream_mut(|stream| {
            let (buf, meta) = stream
                .next()
                .map_err(|err| anyhow::Error::new(err).context("capture v4l2 frame"))?;
            let timestamp_ms =
                meta.timestamp.sec as f64 * 1000.0 + meta.timestamp.usec as f64 / 1000.0;
            normalize_to_rgb(buf, width, height, format).map(|pixels| (pixels, timestamp_ms))
        })?;

        let first = *self.first_timestamp_ms.get_or_insert(timestamp_ms);
        self.position_ms = (timestamp_ms - first).max(0.0);
        self.frame_count += 1;
        Ok(Some(Frame::new(pixels, width, height)))
    }

    fn reported_fps(&self) -> f64 {
        self.reported_fps
    }

    fn position_ms(&self) -> f64 {
        self.position_ms
    }

    fn describe(&self) -> String {
        format!("{} (v4l2)", self.device_path)
    }

    fn frames_read(&self) -> u64 {
        self.frame_count
    }
}

impl Drop for V4l2Source {
    fn drop(&mut self) {
        log::debug!(
            "V4l2Source: released {} after {} frames",
            self.device_path,
            self.frame_count
        );
    }
}
