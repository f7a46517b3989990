//! Classifier input tensor.

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Side length of the square classifier input.
pub const INPUT_SIZE: usize = 224;

/// Colour channels per pixel (R, G, B).
pub const INPUT_CHANNELS: usize = 3;

/// Batch-of-one, height x width x channel tensor with values in `[0, 1]`.
///
/// Immutable once built. Shape is always
/// `[1, INPUT_SIZE, INPUT_SIZE, INPUT_CHANNELS]`.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
}

impl Tensor {
    /// Tensor shape in NHWC order.
    pub const SHAPE: [usize; 4] = [1, INPUT_SIZE, INPUT_SIZE, INPUT_CHANNELS];

    /// Number of elements.
    pub const LEN: usize = INPUT_SIZE * INPUT_SIZE * INPUT_CHANNELS;

    /// Scales `image` to the input resolution and normalizes every channel.
    pub fn from_image(image: &RgbImage) -> Self {
        let size = INPUT_SIZE as u32;
        let resized = if image.dimensions() == (size, size) {
            image.clone()
        } else {
            imageops::resize(image, size, size, FilterType::Triangle)
        };

        let mut data = Vec::with_capacity(Self::LEN);
        for pixel in resized.pixels() {
            let [r, g, b] = pixel.0;
            data.push(r as f32 / 255.0);
            data.push(g as f32 / 255.0);
            data.push(b as f32 / 255.0);
        }

        Self { data }
    }

    /// Builds a tensor from raw values, or `None` if the length is wrong
    /// or any value falls outside `[0, 1]`.
    pub fn from_values(data: Vec<f32>) -> Option<Self> {
        if data.len() != Self::LEN || !data.iter().all(|v| (0.0..=1.0).contains(v)) {
            return None;
        }
        Some(Self { data })
    }

    /// Returns the shape in NHWC order.
    #[inline]
    pub fn shape(&self) -> [usize; 4] {
        Self::SHAPE
    }

    /// Returns the flat, row-major values.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Value at row `y`, column `x`, channel `c`.
    #[inline]
    pub fn get(&self, y: usize, x: usize, c: usize) -> f32 {
        self.data[(y * INPUT_SIZE + x) * INPUT_CHANNELS + c]
    }

    /// Mean of one channel, handy for sanity checks.
    pub fn channel_mean(&self, c: usize) -> f32 {
        let sum: f32 = self.data.iter().skip(c).step_by(INPUT_CHANNELS).sum();
        sum / (INPUT_SIZE * INPUT_SIZE) as f32
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &Self::SHAPE)
            .field("mean_rgb", &[self.channel_mean(0), self.channel_mean(1), self.channel_mean(2)])
            .finish()
    }
}
