//! JPEG round trip of an interleaved RGB image.

use super::EncodingError;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};

/// Compress raw RGB pixel data to JPEG at the given quality (1-100).
pub fn compress_jpeg(
    data: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodingError> {
    let img: ImageBuffer<Rgb<u8>, _> = ImageBuffer::from_raw(width, height, data).ok_or(
        EncodingError::PlaneTooShort {
            plane: "RGB",
            expected: width as usize * height as usize * 3,
            actual: data.len(),
        },
    )?;

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    img.write_with_encoder(encoder)
        .map_err(|e| EncodingError::Compress(e.to_string()))?;
    Ok(buf)
}

/// Decodes JPEG bytes into an RGB pixel grid.
pub fn decode_jpeg(bytes: &[u8]) -> Result<RgbImage, EncodingError> {
    if bytes.is_empty() {
        return Err(EncodingError::Decode("empty image".to_string()));
    }
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(|e| EncodingError::Decode(e.to_string()))?;
    Ok(image.to_rgb8())
}
