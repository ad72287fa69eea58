// The drawing surface: strokes accumulate here, separate from the live frame.
// Visual expectation: whatever is on the surface is stamped over every frame
// you see, and the same pixels end up in the saved picture.

use std::path::Path;

use image::RgbImage;

use crate::error::Error;
use crate::raster::draw_segment;
use crate::types::{BLACK, BLUE, Color, FrameBuffer, Point, WHITE};

/// "Nothing drawn here." Erasing paints this back.
pub const BACKGROUND: Color = BLACK;
/// Paper color for saved drawings.
pub const SAVE_BACKGROUND: Color = WHITE;
/// Saved in a lossless format so stored stroke colours survive exactly.
pub const DEFAULT_SAVE_FILE: &str = "drawing.png";

#[derive(Clone, Debug)]
pub struct BrushConfig {
    pub color: Color,
    pub draw_thickness: u32,
    pub eraser_thickness: u32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self { color: BLUE, draw_thickness: 15, eraser_thickness: 50 }
    }
}

/// Current brush. Thickness is derived from the eraser flag, so it is the
/// eraser thickness exactly when the eraser is on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrushState {
    color: Color,
    eraser: bool,
    draw_thickness: u32,
    eraser_thickness: u32,
}

impl BrushState {
    pub fn new(config: &BrushConfig) -> Self {
        Self {
            color: config.color,
            eraser: false,
            draw_thickness: config.draw_thickness,
            eraser_thickness: config.eraser_thickness,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_eraser(&self) -> bool {
        self.eraser
    }

    pub fn thickness(&self) -> u32 {
        if self.eraser { self.eraser_thickness } else { self.draw_thickness }
    }

    /// Switch to painting with `color`.
    pub fn select_color(&mut self, color: Color) {
        self.color = color;
        self.eraser = false;
    }

    /// Switch to the eraser; `color` is remembered only for palette highlighting.
    pub fn select_eraser(&mut self, color: Color) {
        self.color = color;
        self.eraser = true;
    }
}

/// Overwrite wherever the surface holds something; no blending.
#[inline]
pub fn merge_pixel(under: Color, over: Color) -> Color {
    if over != BACKGROUND { over } else { under }
}

/// Persistent stroke layer, same size as the camera frame.
#[derive(Clone, Debug)]
pub struct Surface {
    layer: FrameBuffer,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self { layer: FrameBuffer::filled(width, height, BACKGROUND) }
    }

    pub fn width(&self) -> usize {
        self.layer.width
    }

    pub fn height(&self) -> usize {
        self.layer.height
    }

    pub fn layer(&self) -> &FrameBuffer {
        &self.layer
    }

    pub fn matches(&self, frame: &FrameBuffer) -> bool {
        self.layer.same_size(frame)
    }

    pub fn is_empty(&self) -> bool {
        self.layer.pixels.iter().all(|&p| p == BACKGROUND)
    }

    pub fn clear(&mut self) {
        self.layer.pixels.fill(BACKGROUND);
    }

    /// Draw one segment with the brush. The eraser paints the background.
    pub fn stroke(&mut self, from: Point, to: Point, brush: &BrushState) {
        let color = if brush.is_eraser() { BACKGROUND } else { brush.color() };
        draw_segment(&mut self.layer, from, to, brush.thickness(), color);
    }

    /// Stamp the strokes over `frame` in place.
    pub fn composite_onto(&self, frame: &mut FrameBuffer) {
        debug_assert!(self.matches(frame), "surface and frame sizes differ");
        for (dst, &src) in frame.pixels.iter_mut().zip(&self.layer.pixels) {
            *dst = merge_pixel(*dst, src);
        }
    }

    /// The drawing on plain paper, as an RGB image.
    pub fn render_for_save(&self) -> RgbImage {
        let mut paper = FrameBuffer::filled(self.width(), self.height(), SAVE_BACKGROUND);
        self.composite_onto(&mut paper);
        // Length always matches width * height * 3, so from_raw cannot fail here.
        RgbImage::from_raw(self.width() as u32, self.height() as u32, paper.to_rgb8())
            .unwrap_or_else(|| RgbImage::new(self.width() as u32, self.height() as u32))
    }

    /// Write the drawing to `path`; the format follows the file extension.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if is_lossy(path) {
            log::warn!("{} is a lossy format; stroke edges will not be exact", path.display());
        }
        self.render_for_save()
            .save(path)
            .map_err(|e| Error::Save(format!("{}: {e}", path.display())))
    }
}

fn is_lossy(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

/// Continue the stroke to `tip`.
/// With no previous position this only remembers `tip` (no line from nowhere).
/// Returns whether a segment was drawn.
pub fn stroke_to(
    surface: &mut Surface,
    cursor: &mut Option<Point>,
    tip: Point,
    brush: &BrushState,
) -> bool {
    let drawn = match *cursor {
        Some(prev) => {
            surface.stroke(prev, tip, brush);
            true
        }
        None => false,
    };
    *cursor = Some(tip);
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GREEN, RED};

    #[test]
    fn default_brush_is_blue_fifteen() {
        let brush = BrushState::new(&BrushConfig::default());
        assert_eq!(brush.color(), BLUE);
        assert_eq!(brush.thickness(), 15);
        assert!(!brush.is_eraser());
    }

    #[test]
    fn eraser_flag_drives_thickness() {
        let mut brush = BrushState::new(&BrushConfig::default());
        brush.select_eraser(WHITE);
        assert!(brush.is_eraser());
        assert_eq!(brush.thickness(), 50);
        brush.select_color(GREEN);
        assert!(!brush.is_eraser());
        assert_eq!(brush.thickness(), 15);
        assert_eq!(brush.color(), GREEN);
    }

    #[test]
    fn merge_prefers_drawn_pixels() {
        assert_eq!(merge_pixel(RED, BACKGROUND), RED);
        assert_eq!(merge_pixel(RED, GREEN), GREEN);
        // A partially dark stroke color still replaces the whole pixel.
        assert_eq!(merge_pixel(0x00_12_34_56, BLUE), BLUE);
    }

    #[test]
    fn first_stroke_tick_only_remembers() {
        let mut surface = Surface::new(300, 200);
        let brush = BrushState::new(&BrushConfig::default());
        let mut cursor = None;

        assert!(!stroke_to(&mut surface, &mut cursor, Point::new(100, 100), &brush));
        assert!(surface.is_empty());
        assert_eq!(cursor, Some(Point::new(100, 100)));

        assert!(stroke_to(&mut surface, &mut cursor, Point::new(200, 100), &brush));
        assert_eq!(cursor, Some(Point::new(200, 100)));
        assert_eq!(surface.layer().get(150, 100), Some(BLUE));
    }

    #[test]
    fn eraser_restores_background() {
        let mut surface = Surface::new(300, 200);
        let mut brush = BrushState::new(&BrushConfig::default());
        surface.stroke(Point::new(50, 50), Point::new(250, 50), &brush);
        assert_eq!(surface.layer().get(150, 50), Some(BLUE));

        brush.select_eraser(WHITE);
        surface.stroke(Point::new(50, 50), Point::new(250, 50), &brush);
        assert!(surface.is_empty());
    }

    #[test]
    fn clear_twice_stays_empty() {
        let mut surface = Surface::new(40, 30);
        let brush = BrushState::new(&BrushConfig::default());
        surface.stroke(Point::new(5, 5), Point::new(30, 20), &brush);
        assert!(!surface.is_empty());
        surface.clear();
        assert!(surface.is_empty());
        surface.clear();
        assert!(surface.is_empty());
        assert_eq!((surface.width(), surface.height()), (40, 30));
    }

    #[test]
    fn composite_overwrites_only_drawn_pixels() {
        let mut surface = Surface::new(30, 30);
        let brush = BrushState::new(&BrushConfig::default());
        surface.stroke(Point::new(15, 15), Point::new(15, 15), &brush);

        let mut frame = FrameBuffer::filled(30, 30, RED);
        surface.composite_onto(&mut frame);
        assert_eq!(frame.get(15, 15), Some(BLUE));
        assert_eq!(frame.get(0, 0), Some(RED));
    }

    #[test]
    fn save_rendering_uses_white_paper() {
        let mut surface = Surface::new(30, 30);
        let brush = BrushState::new(&BrushConfig::default());
        surface.stroke(Point::new(15, 15), Point::new(15, 15), &brush);

        let img = surface.render_for_save();
        assert_eq!(img.dimensions(), (30, 30));
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(15, 15).0, [0, 0, 255]);
    }

    #[test]
    fn jpeg_paths_are_flagged_lossy() {
        assert!(is_lossy(Path::new("out.JPG")));
        assert!(is_lossy(Path::new("dir/out.jpeg")));
        assert!(!is_lossy(Path::new(DEFAULT_SAVE_FILE)));
        assert!(!is_lossy(Path::new("noext")));
    }
}
