//! Frame encoding: raw camera frame to classifier tensor.
//!
//! ```text
//! planar YUV → NV21 → RGB → JPEG (q90) → decode → 224×224 → [0,1] tensor
//! ```
//!
//! Every step is deterministic. A frame that cannot be converted or
//! decoded yields an [`EncodingError`], which the pipeline treats as
//! "no gesture".

mod jpeg;
mod tensor;
mod yuv;

pub use jpeg::{compress_jpeg, decode_jpeg};
pub use tensor::{Tensor, INPUT_CHANNELS, INPUT_SIZE};
pub use yuv::{nv21_to_rgb, to_nv21, ycbcr_to_rgb};

use crate::capture::RawFrame;
use thiserror::Error;

/// Quality factor of the intermediate JPEG.
pub const JPEG_QUALITY: u8 = 90;

/// Errors raised while turning a frame into a tensor.
#[derive(Debug, Clone, Error)]
pub enum EncodingError {
    /// Zero-sized frame.
    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions {
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
    },

    /// A plane holds fewer bytes than its strides address.
    #[error("{plane} plane too short: need {expected} bytes, got {actual}")]
    PlaneTooShort {
        /// Plane name.
        plane: &'static str,
        /// Bytes the strides address.
        expected: usize,
        /// Bytes present.
        actual: usize,
    },

    /// Plane strides that cannot address any real buffer.
    #[error("{plane} plane strides overflow")]
    StrideOverflow {
        /// Plane name.
        plane: &'static str,
    },

    /// The JPEG encoder rejected the image.
    #[error("JPEG compression failed: {0}")]
    Compress(String),

    /// The intermediate JPEG did not decode.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// The conversion panicked; the frame is skipped.
    #[error("encoder panicked: {0}")]
    Panicked(String),
}

/// Converts raw frames into classifier input.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    quality: u8,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self {
            quality: JPEG_QUALITY,
        }
    }
}

impl FrameEncoder {
    /// Creates an encoder with the fixed JPEG quality.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the full conversion for one frame.
    pub fn encode(&self, frame: &RawFrame) -> Result<Tensor, EncodingError> {
        let jpeg = self.compress(frame)?;
        let image = decode_jpeg(&jpeg)?;
        let tensor = Tensor::from_image(&image);

        tracing::trace!(
            sequence = frame.sequence(),
            jpeg_bytes = jpeg.len(),
            "Frame encoded"
        );
        Ok(tensor)
    }

    /// Converts the planar frame into a compressed JPEG.
    pub fn compress(&self, frame: &RawFrame) -> Result<Vec<u8>, EncodingError> {
        let nv21 = to_nv21(frame)?;
        let (width, height) = (frame.width(), frame.height());
        let rgb = nv21_to_rgb(&nv21, width as usize, height as usize)?;
        compress_jpeg(&rgb, width, height, self.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Camera, CaptureConfig, MockCamera};

    fn uniform_frame(width: u32, height: u32, y: u8, u: u8, v: u8) -> RawFrame {
        let luma = (width * height) as usize;
        let chroma = (width.div_ceil(2) * height.div_ceil(2)) as usize;
        let mut data = vec![y; luma];
        data.extend(std::iter::repeat(u).take(chroma));
        data.extend(std::iter::repeat(v).take(chroma));
        RawFrame::from_i420(&data, width, height, 1)
    }

    #[test]
    fn test_gray_frame_normalizes_to_mid_range() {
        let tensor = FrameEncoder::new()
            .encode(&uniform_frame(320, 240, 128, 128, 128))
            .unwrap();

        for c in 0..INPUT_CHANNELS {
            let mean = tensor.channel_mean(c);
            assert!((mean - 128.0 / 255.0).abs() < 0.02, "channel {c}: {mean}");
        }
    }

    #[test]
    fn test_red_frame_keeps_channel_order() {
        let tensor = FrameEncoder::new()
            .encode(&uniform_frame(64, 64, 76, 85, 255))
            .unwrap();

        assert!(tensor.channel_mean(0) > 0.85);
        assert!(tensor.channel_mean(1) < 0.15);
        assert!(tensor.channel_mean(2) < 0.15);
    }

    #[test]
    fn test_mock_camera_frame_encodes() {
        let mut camera = MockCamera::new();
        camera.open(&CaptureConfig::with_dimensions(160, 120)).unwrap();
        let frame = camera.capture().unwrap();

        let tensor = FrameEncoder::new().encode(&frame).unwrap();
        assert_eq!(tensor.shape(), Tensor::SHAPE);
    }

    #[test]
    fn test_empty_buffer_is_encoding_error() {
        let frame = RawFrame::from_i420(&[], 640, 480, 1);
        assert!(matches!(
            FrameEncoder::new().encode(&frame),
            Err(EncodingError::PlaneTooShort { .. })
        ));
    }

    #[test]
    fn test_compress_emits_jpeg() {
        let jpeg = FrameEncoder::new()
            .compress(&uniform_frame(32, 32, 200, 128, 128))
            .unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
