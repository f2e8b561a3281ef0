use image::RgbaImage;
use image::imageops;
use num_traits::ToPrimitive;
use thiserror::Error;

use crate::surface::DrawingSurface;

/// Errors that abort a single capture attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    /// The surface region has no area, e.g. while the window is minimised.
    #[error("the drawing area has no visible pixels")]
    EmptyRegion,
    #[error("region {region:?} lies outside the {frame_width}x{frame_height} frame")]
    RegionOutOfBounds {
        region: SurfaceRegion,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("screen capture unavailable: {0}")]
    Unavailable(String),
}

/// Where the drawing surface sits inside the window, in logical points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRegion {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Region covering a whole surface placed at the window origin.
    pub fn of_surface(surface: &DrawingSurface) -> Self {
        Self::new(0.0, 0.0, surface.size(), surface.size())
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Physical pixel rectangle `(x, y, width, height)` for the given scale.
    fn to_pixels(self, pixels_per_point: f32) -> Option<(u32, u32, u32, u32)> {
        let x = (self.x * pixels_per_point).round().to_u32()?;
        let y = (self.y * pixels_per_point).round().to_u32()?;
        let width = (self.width * pixels_per_point).round().to_u32()?;
        let height = (self.height * pixels_per_point).round().to_u32()?;
        Some((x, y, width, height))
    }
}

/// Something that can produce the pixels currently shown in a region.
pub trait CaptureSource {
    /// Grabs exactly the pixels of `region`.
    ///
    /// The surface is handed in for sources that render it themselves;
    /// sources reading real screen pixels ignore it.
    fn grab(
        &mut self,
        surface: &DrawingSurface,
        region: SurfaceRegion,
    ) -> Result<RgbaImage, CaptureError>;
}

/// Crops the drawing area out of a screenshot of the whole window.
#[derive(Debug, Clone)]
pub struct FrameCapture {
    frame: RgbaImage,
    pixels_per_point: f32,
}

impl FrameCapture {
    pub fn new(frame: RgbaImage, pixels_per_point: f32) -> Self {
        Self {
            frame,
            pixels_per_point,
        }
    }
}

impl CaptureSource for FrameCapture {
    fn grab(
        &mut self,
        _surface: &DrawingSurface,
        region: SurfaceRegion,
    ) -> Result<RgbaImage, CaptureError> {
        if region.is_empty() {
            return Err(CaptureError::EmptyRegion);
        }
        let (frame_width, frame_height) = self.frame.dimensions();
        let out_of_bounds = CaptureError::RegionOutOfBounds {
            region,
            frame_width,
            frame_height,
        };
        let (x, y, width, height) = region
            .to_pixels(self.pixels_per_point)
            .ok_or_else(|| out_of_bounds.clone())?;
        if width == 0 || height == 0 {
            return Err(CaptureError::EmptyRegion);
        }
        let fits = x.checked_add(width).is_some_and(|right| right <= frame_width)
            && y.checked_add(height).is_some_and(|bottom| bottom <= frame_height);
        if !fits {
            return Err(out_of_bounds);
        }
        Ok(imageops::crop_imm(&self.frame, x, y, width, height).to_image())
    }
}

/// Renders the surface offscreen instead of reading the screen. Useful when
/// no window is around, e.g. in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCapture;

impl CaptureSource for RasterCapture {
    fn grab(
        &mut self,
        surface: &DrawingSurface,
        _region: SurfaceRegion,
    ) -> Result<RgbaImage, CaptureError> {
        let image = surface.render();
        if image.width() == 0 || image.height() == 0 {
            return Err(CaptureError::EmptyRegion);
        }
        Ok(image)
    }
}
