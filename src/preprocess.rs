//! Turns a captured picture of the drawing area into the classifier input.
//!
//! The steps mirror how the training digits look: a single grey channel,
//! white ink on black, 28x28 samples scaled into `[0, 1]`.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Pixel, RgbaImage};
use ndarray::{Array2, Array4, ArrayView2, Axis};

/// Side length of the classifier input.
pub const INPUT_SIDE: usize = 28;
/// Largest value a grey sample can take.
pub const MAX_INTENSITY: f32 = 255.0;

/// A single-sample, single-channel 28x28 tensor (NCHW) with every value in
/// `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct FixedImage {
    tensor: Array4<f32>,
}

impl FixedImage {
    pub const SHAPE: [usize; 4] = [1, 1, INPUT_SIDE, INPUT_SIDE];

    /// An all-zero image, i.e. nothing drawn.
    pub fn blank() -> Self {
        Self {
            tensor: Array4::zeros((1, 1, INPUT_SIDE, INPUT_SIDE)),
        }
    }

    /// Wraps a 28x28 grid. Returns `None` for any other size or when a value
    /// falls outside `[0, 1]`.
    pub fn from_grid(grid: Array2<f32>) -> Option<Self> {
        if grid.dim() != (INPUT_SIDE, INPUT_SIDE) {
            return None;
        }
        if !grid.iter().all(|v| (0.0..=1.0).contains(v)) {
            return None;
        }
        let tensor = grid.into_shape_with_order(Self::SHAPE).ok()?;
        Some(Self { tensor })
    }

    pub fn tensor(&self) -> &Array4<f32> {
        &self.tensor
    }

    /// The 28x28 plane without the batch and channel axes.
    pub fn grid(&self) -> ArrayView2<'_, f32> {
        self.tensor.index_axis(Axis(0), 0).index_axis_move(Axis(0), 0)
    }

    /// Samples in row-major order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.tensor.iter().copied().collect()
    }
}

/// Runs the full pipeline: grayscale, invert, resample, normalise.
///
/// A zero-sized capture yields a blank image.
pub fn preprocess(captured: &RgbaImage) -> FixedImage {
    if captured.width() == 0 || captured.height() == 0 {
        return FixedImage::blank();
    }
    let mut gray = to_grayscale(captured);
    invert(&mut gray);
    let resampled = resample(&gray);
    normalize(&resampled)
}

pub fn to_grayscale(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| image.get_pixel(x, y).to_luma())
}

/// Black-on-white becomes white-on-black. Applying it twice is a no-op.
pub fn invert(image: &mut GrayImage) {
    imageops::invert(image);
}

/// Lanczos resampling down to the classifier's 28x28 grid.
pub fn resample(image: &GrayImage) -> GrayImage {
    let side = INPUT_SIDE as u32;
    if image.dimensions() == (side, side) {
        return image.clone();
    }
    imageops::resize(image, side, side, FilterType::Lanczos3)
}

fn normalize(image: &GrayImage) -> FixedImage {
    debug_assert_eq!(image.dimensions(), (INPUT_SIDE as u32, INPUT_SIDE as u32));
    let tensor = Array4::from_shape_fn(FixedImage::SHAPE, |(_, _, y, x)| {
        let Luma([value]) = *image.get_pixel(x as u32, y as u32);
        f32::from(value) / MAX_INTENSITY
    });
    FixedImage { tensor }
}
