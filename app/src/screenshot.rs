use digit_pad::{CaptureError, CaptureSource, DrawingSurface, FrameCapture, SurfaceRegion};
use eframe::egui::ColorImage;
use image::RgbaImage;

/// Pixels of the window as delivered by an egui viewport screenshot.
pub enum ScreenshotCapture {
    Frame(FrameCapture),
    /// No screenshot arrived, e.g. the window is minimised.
    Missing,
}

impl ScreenshotCapture {
    pub fn from_color_image(image: &ColorImage, pixels_per_point: f32) -> Self {
        let [width, height] = image.size;
        let raw: Vec<u8> = image.pixels.iter().flat_map(|color| color.to_array()).collect();
        let frame = u32::try_from(width)
            .ok()
            .zip(u32::try_from(height).ok())
            .and_then(|(width, height)| RgbaImage::from_raw(width, height, raw));
        match frame {
            Some(frame) => ScreenshotCapture::Frame(FrameCapture::new(frame, pixels_per_point)),
            None => ScreenshotCapture::Missing,
        }
    }
}

impl CaptureSource for ScreenshotCapture {
    fn grab(
        &mut self,
        surface: &DrawingSurface,
        region: SurfaceRegion,
    ) -> Result<RgbaImage, CaptureError> {
        match self {
            ScreenshotCapture::Frame(frame) => frame.grab(surface, region),
            ScreenshotCapture::Missing => Err(CaptureError::Unavailable(
                "the window did not deliver a screenshot".to_string(),
            )),
        }
    }
}
