// Core types shared by the capture, gesture, canvas and output layers.

/// Packed pixel color, 0x00RRGGBB (the layout minifb expects).
pub type Color = u32;

pub const BLACK: Color = 0x00_00_00_00;
pub const WHITE: Color = 0x00_FF_FF_FF;
pub const GRAY: Color = 0x00_80_80_80;
pub const BLUE: Color = 0x00_00_00_FF;
pub const GREEN: Color = 0x00_00_FF_00;
pub const RED: Color = 0x00_FF_00_00;
pub const YELLOW: Color = 0x00_FF_FF_00;

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> Color {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
pub fn unpack_rgb(c: Color) -> [u8; 3] {
    [((c >> 16) & 0xFF) as u8, ((c >> 8) & 0xFF) as u8, (c & 0xFF) as u8]
}

/// A position in frame pixel space. Signed so off-screen landmarks stay representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<Color>, // row-major, length = width * height
}

impl FrameBuffer {
    /// A frame filled with one color.
    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    pub fn same_size(&self, other: &FrameBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width + x as usize])
    }

    /// Flip left/right in place so the feed behaves like a mirror.
    pub fn mirror_horizontal(&mut self) {
        if self.width == 0 {
            return;
        }
        for row in self.pixels.chunks_exact_mut(self.width) {
            row.reverse();
        }
    }

    /// Unpack into tightly packed RGB8 bytes (encoders and models want this).
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for &px in &self.pixels {
            out.extend_from_slice(&unpack_rgb(px));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack_agree() {
        assert_eq!(pack_rgb(0x12, 0x34, 0x56), 0x00_12_34_56);
        assert_eq!(unpack_rgb(0x00_12_34_56), [0x12, 0x34, 0x56]);
        assert_eq!(unpack_rgb(BLUE), [0, 0, 255]);
    }

    #[test]
    fn mirror_reverses_each_row() {
        let mut fb = FrameBuffer { width: 3, height: 2, pixels: vec![1, 2, 3, 4, 5, 6] };
        fb.mirror_horizontal();
        assert_eq!(fb.pixels, vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn get_is_bounds_checked() {
        let fb = FrameBuffer::filled(2, 2, WHITE);
        assert_eq!(fb.get(1, 1), Some(WHITE));
        assert_eq!(fb.get(2, 0), None);
        assert_eq!(fb.get(-1, 0), None);
    }
}
