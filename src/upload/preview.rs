//! Preview derivation for upload drafts using the image crate.
//!
//! Decodes the candidate file and produces a small, displayable JPEG so the
//! user sees what they are about to submit. Stores the exact derived
//! dimensions to avoid re-scaling in the rendering layer.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

/// Longest edge of a derived preview, in pixels.
pub const PREVIEW_EDGE: u32 = 512;

/// JPEG quality for preview encoding (0-100).
const JPEG_QUALITY: u8 = 85;

/// Decoded, downscaled preview of an upload candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub width: u32,
    pub height: u32,
    /// JPEG-encoded preview bytes.
    pub jpeg: Vec<u8>,
}

/// Decodes image bytes and renders a preview no larger than
/// [`PREVIEW_EDGE`] on its longest side, preserving aspect ratio.
pub(crate) fn render_preview(bytes: &[u8]) -> Result<Preview> {
    let img = image::load_from_memory(bytes).context("Failed to decode image data")?;

    let scaled = if img.width() > PREVIEW_EDGE || img.height() > PREVIEW_EDGE {
        img.thumbnail(PREVIEW_EDGE, PREVIEW_EDGE)
    } else {
        img
    };

    // RGB8 for JPEG (no alpha channel).
    let rgb = scaled.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .context("Failed to encode preview")?;

    debug!(width, height, bytes = jpeg.len(), "preview rendered");
    Ok(Preview {
        width,
        height,
        jpeg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 80, 120])));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn small_images_keep_their_dimensions() {
        let preview = render_preview(&png_bytes(64, 48)).unwrap();
        assert_eq!((preview.width, preview.height), (64, 48));
        assert!(!preview.jpeg.is_empty());
    }

    #[test]
    fn large_images_are_bounded_by_the_preview_edge() {
        let preview = render_preview(&png_bytes(1200, 800)).unwrap();
        assert_eq!(preview.width, 512);
        assert!((340..=342).contains(&preview.height));
    }

    #[test]
    fn preview_round_trips_through_the_decoder() {
        let preview = render_preview(&png_bytes(64, 64)).unwrap();
        let decoded = image::load_from_memory(&preview.jpeg).unwrap();
        assert_eq!(decoded.width(), preview.width);
        assert_eq!(decoded.height(), preview.height);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(render_preview(b"definitely not an image").is_err());
    }
}
