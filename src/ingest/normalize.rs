//! Conversion of camera pixel layouts to RGB24.

use anyhow::{anyhow, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PixelFormat {
    Rgb24,
    /// Packed 4:2:2, `Y0 U Y1 V`. What most UVC webcams deliver.
    Yuyv,
    Nv12,
}

impl PixelFormat {
    pub(crate) fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"RGB3" => Some(PixelFormat::Rgb24),
            b"YUYV" => Some(PixelFormat::Yuyv),
            b"NV12" => Some(PixelFormat::Nv12),
            _ => None,
        }
    }
}

pub(crate) fn normalize_to_rgb(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    let w = width as usize;
    let h = height as usize;
    let pixel_count = w
        .checked_mul(h)
        .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
    let expected = match format {
        PixelFormat::Rgb24 => pixel_count * 3,
        PixelFormat::Yuyv => pixel_count * 2,
        PixelFormat::Nv12 => pixel_count + pixel_count / 2,
    };
    // Drivers may pad the final buffer; anything shorter is corrupt.
    let pixels = pixels.get(..expected).ok_or_else(|| {
        anyhow!(
            "{:?} frame length mismatch: expected {}, got {}",
            format,
            expected,
            pixels.len()
        )
    })?;

    match format {
        PixelFormat::Rgb24 => Ok(pixels.to_vec()),
        PixelFormat::Yuyv => Ok(yuyv_to_rgb(pixels, pixel_count)),
        PixelFormat::Nv12 => Ok(nv12_to_rgb(pixels, w, h)),
    }
}

fn yuyv_to_rgb(pixels: &[u8], pixel_count: usize) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    for chunk in pixels.chunks_exact(4) {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;
        push_rgb(&mut rgb, chunk[0] as f32, u, v);
        push_rgb(&mut rgb, chunk[2] as f32, u, v);
    }
    rgb
}

fn nv12_to_rgb(pixels: &[u8], w: usize, h: usize) -> Vec<u8> {
    let y_plane = w * h;
    let mut rgb = Vec::with_capacity(y_plane * 3);
    for j in 0..h {
        for i in 0..w {
            let uv_index = y_plane + (j / 2) * w + (i / 2) * 2;
            let u = pixels[uv_index] as f32 - 128.0;
            let v = pixels[uv_index + 1] as f32 - 128.0;
            push_rgb(&mut rgb, pixels[j * w + i] as f32, u, v);
        }
    }
    rgb
}

fn push_rgb(out: &mut Vec<u8>, y: f32, u: f32, v: f32) {
    out.push(clamp_to_u8(y + 1.402_f32 * v));
    out.push(clamp_to_u8(y - 0.344_136_f32 * u - 0.714_136_f32 * v));
    out.push(clamp_to_u8(y + 1.772_f32 * u));
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nv12_conversion_produces_gray() -> Result<()> {
        let nv12 = [vec![128u8; 4], vec![128u8; 2]].concat();
        let rgb = normalize_to_rgb(&nv12, 2, 2, PixelFormat::Nv12)?;
        assert_eq!(rgb, vec![128u8; 12]);
        Ok(())
    }

    #[test]
    fn yuyv_conversion_produces_gray() -> Result<()> {
        let yuyv = vec![128u8; 2 * 2 * 2];
        let rgb = normalize_to_rgb(&yuyv, 2, 2, PixelFormat::Yuyv)?;
        assert_eq!(rgb, vec![128u8; 12]);
        Ok(())
    }

    #[test]
    fn padded_buffers_are_trimmed_and_short_ones_rejected() -> Result<()> {
        let padded = vec![1u8; 12];
        let trimmed = normalize_to_rgb(&padded, 1, 3, PixelFormat::Rgb24)?;
        assert_eq!(trimmed.len(), 9);
        let short = normalize_to_rgb(&[1u8; 5], 1, 3, PixelFormat::Rgb24);
        assert!(short.is_err());
        Ok(())
    }

    #[test]
    fn maps_known_fourccs() {
        assert_eq!(PixelFormat::from_fourcc(b"YUYV"), Some(PixelFormat::Yuyv));
        assert_eq!(PixelFormat::from_fourcc(b"MJPG"), None);
    }
}
