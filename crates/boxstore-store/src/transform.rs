//! Image bytes -> channel-first float tensor.

use image::{imageops, ImageError, RgbImage};
use ndarray::Array3;

use crate::config::{validate_transform, TransformConfig};
use crate::error::Result;

/// Decode, convert to RGB, resize, and scale to `[0, 1]` in `[C, H, W]`
/// layout.
#[derive(Debug, Clone)]
pub struct ImageTransform {
    config: TransformConfig,
}

impl ImageTransform {
    pub fn new(config: TransformConfig) -> Result<Self> {
        validate_transform(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Output tensor shape, `[3, height, width]`.
    pub fn output_shape(&self) -> [usize; 3] {
        [3, self.config.height as usize, self.config.width as usize]
    }

    pub fn apply(&self, bytes: &[u8]) -> std::result::Result<Array3<f32>, ImageError> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = (self.config.width, self.config.height);
        let resized = if rgb.dimensions() == (width, height) {
            rgb
        } else {
            imageops::resize(&rgb, width, height, self.config.filter.into())
        };
        Ok(to_tensor(&resized))
    }
}

/// `[3, H, W]` tensor with each channel byte divided by 255.
pub fn to_tensor(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    Array3::from_shape_fn((3, height as usize, width as usize), |(c, y, x)| {
        f32::from(image.get_pixel(x as u32, y as u32).0[c]) / 255.0
    })
}
