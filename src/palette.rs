//! The color palette shown along the top edge while selecting.
//!
//! Boxes are laid out once from the frame width: box `i` starts at
//! `width * (i + 1) / 6` and is 50 px square.

use crate::canvas::BrushState;
use crate::raster::{fill_rect, stroke_rect};
use crate::types::{BLACK, BLUE, Color, FrameBuffer, GRAY, GREEN, Point, RED, WHITE, YELLOW};

/// The palette color that switches the brush to the eraser.
pub const ERASER_COLOR: Color = WHITE;

const BOX_SIZE: i32 = 50;
const ACTIVE_BORDER: Color = GRAY;
const ERASER_BORDER: Color = BLACK;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteRegion {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub color: Color,
}

impl PaletteRegion {
    /// Strictly inside: points on an edge do not count.
    pub fn contains(&self, p: Point) -> bool {
        self.left < p.x && p.x < self.right && self.top < p.y && p.y < self.bottom
    }

    pub fn is_eraser(&self) -> bool {
        self.color == ERASER_COLOR
    }
}

#[derive(Clone, Debug)]
pub struct Palette {
    regions: Vec<PaletteRegion>,
}

impl Palette {
    /// Blue, green, red, yellow, then the eraser.
    pub fn default_colors() -> Vec<Color> {
        vec![BLUE, GREEN, RED, YELLOW, ERASER_COLOR]
    }

    pub fn new(frame_width: usize) -> Self {
        Self::with_colors(frame_width, &Self::default_colors())
    }

    pub fn with_colors(frame_width: usize, colors: &[Color]) -> Self {
        let regions = colors
            .iter()
            .enumerate()
            .map(|(i, &color)| {
                let left = (frame_width * (i + 1) / 6) as i32;
                PaletteRegion { left, top: 0, right: left + BOX_SIZE, bottom: BOX_SIZE, color }
            })
            .collect();
        Self { regions }
    }

    pub fn regions(&self) -> &[PaletteRegion] {
        &self.regions
    }

    /// Update the brush from whichever region contains `tip`.
    /// Later regions win on overlap; no match leaves the brush alone.
    /// Returns whether anything matched.
    pub fn hit_test(&self, tip: Point, brush: &mut BrushState) -> bool {
        let mut hit = false;
        for region in self.regions.iter().filter(|r| r.contains(tip)) {
            if region.is_eraser() {
                brush.select_eraser(region.color);
            } else {
                brush.select_color(region.color);
            }
            hit = true;
        }
        hit
    }

    /// Draw the boxes onto the output frame.
    /// Visual: filled swatches; the eraser gets a black outline so it shows on
    /// bright backgrounds, and the active color a gray border.
    pub fn render(&self, fb: &mut FrameBuffer, brush: &BrushState) {
        for r in &self.regions {
            fill_rect(fb, r.left, r.top, r.right, r.bottom, r.color);
            if r.is_eraser() {
                stroke_rect(fb, r.left, r.top, r.right, r.bottom, 2, ERASER_BORDER);
            }
            if r.color == brush.color() {
                stroke_rect(fb, r.left, r.top, r.right, r.bottom, 3, ACTIVE_BORDER);
            }
        }
    }
}
