use image::{Rgba, RgbaImage};
use num_traits::ToPrimitive;

use crate::config::PadConfig;

pub const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A pointer position in surface coordinates (logical pixels, origin at the
/// top-left corner of the drawing area).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// One straight piece of a stroke. `from == to` is a dot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Segment {
    /// Squared distance from `p` to the closest point of the segment.
    pub fn distance_sq_to(&self, p: Point) -> f32 {
        let dx = self.to.x - self.from.x;
        let dy = self.to.y - self.from.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return self.from.distance_sq(p);
        }
        let t = (((p.x - self.from.x) * dx + (p.y - self.from.y) * dy) / len_sq).clamp(0.0, 1.0);
        let closest = Point::new(self.from.x + t * dx, self.from.y + t * dy);
        closest.distance_sq(p)
    }
}

/// The stroke session: every segment drawn since the last clear, plus the
/// anchor the next segment starts from.
#[derive(Debug, Clone)]
pub struct DrawingSurface {
    size: f32,
    stroke_width: f32,
    anchor: Option<Point>,
    segments: Vec<Segment>,
}

impl DrawingSurface {
    pub fn new(size: f32, stroke_width: f32) -> Self {
        Self {
            size,
            stroke_width,
            anchor: None,
            segments: Vec::new(),
        }
    }

    pub fn from_config(config: &PadConfig) -> Self {
        Self::new(config.canvas_size, config.stroke_width)
    }

    /// Starts a new stroke at `(x, y)`.
    pub fn begin(&mut self, x: f32, y: f32) {
        self.anchor = Some(Point::new(x, y));
    }

    /// Draws from the anchor to `(x, y)` and moves the anchor there.
    ///
    /// Without an anchor the point is recorded as a dot, so that anything
    /// the pointer touched ends up on the canvas.
    pub fn extend(&mut self, x: f32, y: f32) {
        let to = Point::new(x, y);
        let from = self.anchor.unwrap_or(to);
        self.segments.push(Segment { from, to });
        self.anchor = Some(to);
    }

    /// Lifts the pen; the next `extend` without `begin` starts a fresh dot.
    pub fn end(&mut self) {
        self.anchor = None;
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.anchor = None;
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Rasterises the session at one pixel per logical pixel: round-capped
    /// black strokes on white paper, the same picture the window shows.
    pub fn render(&self) -> RgbaImage {
        let side = self.size.round().to_u32().unwrap_or(0);
        let mut image = RgbaImage::from_pixel(side, side, PAPER);
        if side == 0 {
            return image;
        }
        let radius = self.stroke_width / 2.0;
        let radius_sq = radius * radius;
        let last = (side - 1) as f32;

        for segment in &self.segments {
            // Only visit the pixels inside the segment's padded bounding box.
            let min_x = (segment.from.x.min(segment.to.x) - radius).floor().clamp(0.0, last);
            let max_x = (segment.from.x.max(segment.to.x) + radius).ceil().clamp(0.0, last);
            let min_y = (segment.from.y.min(segment.to.y) - radius).floor().clamp(0.0, last);
            let max_y = (segment.from.y.max(segment.to.y) + radius).ceil().clamp(0.0, last);

            for py in min_y as u32..=max_y as u32 {
                for px in min_x as u32..=max_x as u32 {
                    let centre = Point::new(px as f32 + 0.5, py as f32 + 0.5);
                    if segment.distance_sq_to(centre) <= radius_sq {
                        image.put_pixel(px, py, INK);
                    }
                }
            }
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn surface() -> DrawingSurface {
        DrawingSurface::new(280.0, 20.0)
    }

    #[test]
    fn new_surface_is_empty() {
        let surface = surface();
        assert!(surface.is_empty());
        assert_eq!(surface.anchor(), None);
    }

    #[test]
    fn begin_alone_draws_nothing() {
        let mut surface = surface();
        surface.begin(10.0, 10.0);
        assert!(surface.is_empty());
        assert_eq!(surface.anchor(), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn extend_connects_to_previous_point() {
        let mut surface = surface();
        surface.begin(10.0, 10.0);
        surface.extend(20.0, 15.0);
        surface.extend(30.0, 40.0);

        assert_eq!(
            surface.segments(),
            &[
                Segment { from: Point::new(10.0, 10.0), to: Point::new(20.0, 15.0) },
                Segment { from: Point::new(20.0, 15.0), to: Point::new(30.0, 40.0) },
            ]
        );
        assert_eq!(surface.anchor(), Some(Point::new(30.0, 40.0)));
    }

    #[test]
    fn extend_without_anchor_records_a_dot() {
        let mut surface = surface();
        surface.extend(0.0, 0.0);
        assert!(!surface.is_empty());
        assert_eq!(surface.segments()[0].from, surface.segments()[0].to);
    }

    #[test]
    fn end_disconnects_strokes() {
        let mut surface = surface();
        surface.begin(10.0, 10.0);
        surface.extend(20.0, 20.0);
        surface.end();
        surface.extend(100.0, 100.0);
        assert_eq!(surface.segments()[1].from, Point::new(100.0, 100.0));
    }

    #[test]
    fn clear_resets_everything() {
        let mut surface = surface();
        surface.begin(1.0, 2.0);
        surface.extend(3.0, 4.0);
        surface.clear();
        assert!(surface.is_empty());
        assert_eq!(surface.anchor(), None);
    }

    #[test]
    fn empty_iff_no_extend_since_clear() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let mut surface = surface();
        let mut extended = false;

        for _ in 0..2_000 {
            let x = rng.random_range(0.0..280.0);
            let y = rng.random_range(0.0..280.0);
            match rng.random_range(0..4) {
                0 => surface.begin(x, y),
                1 => {
                    surface.extend(x, y);
                    extended = true;
                }
                2 => surface.end(),
                _ => {
                    surface.clear();
                    extended = false;
                    assert!(surface.is_empty());
                }
            }
            assert_eq!(surface.is_empty(), !extended);
        }
    }

    #[test]
    fn distance_to_segment() {
        let segment = Segment { from: Point::new(0.0, 0.0), to: Point::new(10.0, 0.0) };
        assert_eq!(segment.distance_sq_to(Point::new(5.0, 3.0)), 9.0);
        assert_eq!(segment.distance_sq_to(Point::new(-4.0, 3.0)), 25.0);
        assert_eq!(segment.distance_sq_to(Point::new(13.0, 4.0)), 25.0);
    }

    #[test]
    fn render_blank_surface_is_white() {
        let image = surface().render();
        assert_eq!(image.dimensions(), (280, 280));
        assert!(image.pixels().all(|p| *p == PAPER));
    }

    #[test]
    fn render_paints_thick_strokes() {
        let mut surface = surface();
        surface.begin(40.0, 140.0);
        surface.extend(240.0, 140.0);
        let image = surface.render();

        assert_eq!(*image.get_pixel(140, 140), INK);
        // Within half the stroke width of the line.
        assert_eq!(*image.get_pixel(140, 131), INK);
        assert_eq!(*image.get_pixel(140, 160), PAPER);
        // Round caps reach past the end points.
        assert_eq!(*image.get_pixel(35, 140), INK);
        assert_eq!(*image.get_pixel(20, 140), PAPER);
    }

    #[test]
    fn render_clips_strokes_at_the_border() {
        let mut surface = surface();
        surface.begin(-50.0, -50.0);
        surface.extend(400.0, 400.0);
        let image = surface.render();
        assert_eq!(*image.get_pixel(0, 0), INK);
        assert_eq!(*image.get_pixel(279, 279), INK);
    }
}
