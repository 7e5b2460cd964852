//! Decoded frames.
//!
//! - `Frame`: one decoded RGB24 image produced by a `VideoSource`.
//! - `FrameRecord`: a frame paired with the timestamp the tracker observes.
//!
//! A `FrameRecord` is built fresh every loop iteration and moved into the
//! tracker. The driver keeps nothing after the iteration ends.

use std::sync::Arc;

/// Bytes per pixel of every frame handed out by the ingestion layer (RGB24).
pub const BYTES_PER_PIXEL: usize = 3;

/// One decoded image.
///
/// Pixel storage is shared so the display can render the image the tracker
/// consumed without a second copy.
#[derive(Clone, Debug)]
pub struct Frame {
    pixels: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Wrap an RGB24 buffer. Called by sources after decode/conversion.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            pixels: pixels.into(),
            width,
            height,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    /// True when the buffer length matches `width * height * 3`.
    pub fn is_well_formed(&self) -> bool {
        self.pixels.len() == self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }
}

/// A frame and its timestamp in seconds.
#[derive(Debug)]
pub struct FrameRecord {
    pub image: Frame,
    pub timestamp: f64,
}

impl FrameRecord {
    pub fn new(image: Frame, timestamp: f64) -> Self {
        Self { image, timestamp }
    }
}
