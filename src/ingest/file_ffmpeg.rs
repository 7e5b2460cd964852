//! Video file / stream URI source using FFmpeg.
//!
//! Frames are decoded in-memory and converted to RGB24. The playback position
//! comes from the decoded frame's presentation timestamp rescaled by the stream
//! time base, so it follows the recording's timeline rather than read speed.

use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;

use super::VideoSource;
use crate::frame::Frame;

pub(crate) struct FfmpegFileSource {
    target: String,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    time_base: ffmpeg::Rational,
    reported_fps: f64,
    position_ms: f64,
    frame_count: u64,
    eof_sent: bool,
}

impl FfmpegFileSource {
    pub(crate) fn open(target: &str) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&target)
            .with_context(|| format!("failed to open '{}' with ffmpeg", target))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow::anyhow!("input has no video track"))?;
        let stream_index = input_stream.index();
        let time_base = input_stream.time_base();
        let reported_fps = rational_to_f64(input_stream.avg_frame_rate())
            .or_else(|| rational_to_f64(input_stream.rate()))
            .unwrap_or(0.0);
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        log::info!(
            "FfmpegFileSource: opened {} ({}x{}, {:.3} fps)",
            target,
            decoder.width(),
            decoder.height(),
            reported_fps
        );

        Ok(Self {
            target: target.to_string(),
            input,
            stream_index,
            decoder,
            scaler,
            time_base,
            reported_fps,
            position_ms: 0.0,
            frame_count: 0,
            eof_sent: false,
        })
    }

    /// Pull one decoded frame out of the decoder, if it has one ready.
    fn receive(&mut self) -> Result<Option<Frame>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        if let Some(pts) = decoded.timestamp().or_else(|| decoded.pts()) {
            self.position_ms = pts as f64 * f64::from(self.time_base.numerator()) * 1000.0
                / f64::from(self.time_base.denominator());
        }

        let mut rgb_frame = ffmpeg::frame::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb_frame)
            .context("scale frame to RGB")?;
        let (pixels, width, height) = frame_to_pixels(&rgb_frame)?;
        self.frame_count += 1;
        Ok(Some(Frame::new(pixels, width, height)))
    }
}

impl VideoSource for FfmpegFileSource {
    fn read(&mut self) -> Result<Option<Frame>> {
        if let Some(frame) = self.receive()? {
            return Ok(Some(frame));
        }

        while !self.eof_sent {
            let mut packet = ffmpeg::Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() != self.stream_index {
                        continue;
                    }
                    self.decoder
                        .send_packet(&packet)
                        .context("send packet to ffmpeg decoder")?;
                }
                Err(ffmpeg::Error::Eof) => {
                    self.decoder.send_eof().context("flush ffmpeg decoder")?;
                    self.eof_sent = true;
                }
                Err(err) => {
                    return Err(anyhow::Error::new(err).context("read packet from input"));
                }
            }
            if let Some(frame) = self.receive()? {
                return Ok(Some(frame));
            }
        }

        // Decoder drained after EOF.
        self.receive()
    }

    fn reported_fps(&self) -> f64 {
        self.reported_fps
    }

    fn position_ms(&self) -> f64 {
        self.position_ms
    }

    fn describe(&self) -> String {
        format!("{} (ffmpeg)", self.target)
    }

    fn frames_read(&self) -> u64 {
        self.frame_count
    }
}

impl Drop for FfmpegFileSource {
    fn drop(&mut self) {
        log::debug!(
            "FfmpegFileSource: released {} after {} frames",
            self.target,
            self.frame_count
        );
    }
}

fn rational_to_f64(rate: ffmpeg::Rational) -> Option<f64> {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        return None;
    }
    Some(f64::from(rate.numerator()) / f64::from(rate.denominator()))
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        let len = row_bytes * height as usize;
        let pixels = data
            .get(..len)
            .context("ffmpeg frame is shorter than its dimensions")?;
        return Ok((pixels.to_vec(), width, height));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    Ok((pixels, width, height))
}
