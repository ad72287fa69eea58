// Software drawing primitives on a FrameBuffer.
// Visual effects provided here:
// 1) Thin lines (hand skeleton) and thick round-capped strokes (brush/eraser).
// 2) Filled and outlined boxes (the color palette).
// 3) A tiny 5x7 bitmap font to render HUD text on top of the video.

use crate::types::{BLACK, Color, FrameBuffer, Point};

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
/// Visual: the exact pixel at (x,y) changes color.
#[inline]
pub fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Draw a thin line between a and b using Bresenham.
/// Visual: a straight 1-pixel line appears on top of the camera image.
pub fn draw_line(fb: &mut FrameBuffer, a: Point, b: Point, color: Color) {
    let Some((a, b)) = clip_line(a, b, fb.width, fb.height) else {
        return;
    };
    let (mut x0, mut y0, x1, y1) = (a.x, a.y, b.x, b.y);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

/// Clip a..b to the frame (Liang-Barsky). `None` when the line misses it.
/// Lines already inside come back unchanged.
fn clip_line(a: Point, b: Point, width: usize, height: usize) -> Option<(Point, Point)> {
    if width == 0 || height == 0 {
        return None;
    }
    let (x0, y0) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - x0, b.y as f64 - y0);
    let (xmax, ymax) = ((width - 1) as f64, (height - 1) as f64);

    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, x0), (dx, xmax - x0), (-dy, y0), (dy, ymax - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }

    let at = |t: f64| Point::new((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
    Some((at(t0), at(t1)))
}

/// Draw a segment `thickness` pixels wide with round caps.
/// Every pixel whose center lies within thickness/2 of the segment is set to
/// exactly `color` (hard edges, so erasing fully restores the background).
/// A zero-length segment draws a filled disc.
pub fn draw_segment(fb: &mut FrameBuffer, a: Point, b: Point, thickness: u32, color: Color) {
    if thickness <= 1 {
        draw_line(fb, a, b, color);
        return;
    }
    if fb.width == 0 || fb.height == 0 {
        return;
    }

    let r = thickness as f32 / 2.0;
    let r2 = r * r;
    let reach = r.ceil() as i32;

    // Scan just the bounding box of the capsule, clipped to the frame.
    let min_x = a.x.min(b.x).saturating_sub(reach).max(0);
    let max_x = a.x.max(b.x).saturating_add(reach).min(fb.width as i32 - 1);
    let min_y = a.y.min(b.y).saturating_sub(reach).max(0);
    let max_y = a.y.max(b.y).saturating_add(reach).min(fb.height as i32 - 1);

    let dx = b.x as f32 - a.x as f32;
    let dy = b.y as f32 - a.y as f32;
    let len2 = dx * dx + dy * dy;

    for y in min_y..=max_y {
        let row = y as usize * fb.width;
        for x in min_x..=max_x {
            let px = x as f32 - a.x as f32;
            let py = y as f32 - a.y as f32;
            // Project onto the segment, clamped to its ends (the round caps).
            let t = if len2 > 0.0 { ((px * dx + py * dy) / len2).clamp(0.0, 1.0) } else { 0.0 };
            let ex = px - t * dx;
            let ey = py - t * dy;
            if ex * ex + ey * ey <= r2 {
                fb.pixels[row + x as usize] = color;
            }
        }
    }
}

/// Fill the box spanning (left,top)..=(right,bottom), clipped to the frame.
pub fn fill_rect(fb: &mut FrameBuffer, left: i32, top: i32, right: i32, bottom: i32, color: Color) {
    if fb.width == 0 || fb.height == 0 {
        return;
    }
    let x0 = left.min(right).max(0);
    let x1 = left.max(right).min(fb.width as i32 - 1);
    let y0 = top.min(bottom).max(0);
    let y1 = top.max(bottom).min(fb.height as i32 - 1);
    for y in y0..=y1 {
        let row = y as usize * fb.width;
        for x in x0..=x1 {
            fb.pixels[row + x as usize] = color;
        }
    }
}

/// Outline a box with a border `thickness` pixels wide, centered on its edges.
pub fn stroke_rect(
    fb: &mut FrameBuffer,
    left: i32, top: i32, right: i32, bottom: i32,
    thickness: u32,
    color: Color,
) {
    let t = thickness.max(1) as i32;
    for off in -(t / 2)..=((t - 1) / 2) {
        let (l, tp, r, b) = (left - off, top - off, right + off, bottom + off);
        draw_line(fb, Point::new(l, tp), Point::new(r, tp), color);
        draw_line(fb, Point::new(r, tp), Point::new(r, b), color);
        draw_line(fb, Point::new(r, b), Point::new(l, b), color);
        draw_line(fb, Point::new(l, b), Point::new(l, tp), color);
    }
}

/* ---------- 5x7 bitmap font (ASCII subset for "DRAW | FPS: 00.0") ---------- */

/// Return a 5x7 glyph bitmap for a limited character set.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        // Digits 0..9
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        // Uppercase letters for the mode names, "ERASER" and "FPS"
        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),

        // Punctuation: space, vertical bar, colon, dot
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y).
/// Visual: a tiny glyph appears with a 1-pixel black shadow for contrast.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: Color) {
    if let Some(rows) = glyph5x7(ch) {
        for (shift, c) in [(1, BLACK), (0, color)] {
            for (ry, rowbits) in rows.iter().enumerate() {
                for rx in 0..5 {
                    if (rowbits & (1 << (4 - rx))) != 0 {
                        put_pixel(fb, x + rx + shift, y + ry as i32 + shift, c);
                    }
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs.
/// Visual: a compact HUD string appears; each glyph is 5x7 with 1-pixel spacing.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: Color) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color);
        x += 6; // 5 pixels glyph width + 1 pixel spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BLUE, WHITE};

    #[test]
    fn thick_horizontal_segment_has_round_caps() {
        let mut fb = FrameBuffer::filled(300, 200, BLACK);
        draw_segment(&mut fb, Point::new(100, 100), Point::new(200, 100), 15, BLUE);

        // Half-width 7.5: rows 93..=107 are covered along the body.
        assert_eq!(fb.get(150, 93), Some(BLUE));
        assert_eq!(fb.get(150, 107), Some(BLUE));
        assert_eq!(fb.get(150, 92), Some(BLACK));
        assert_eq!(fb.get(150, 108), Some(BLACK));
        // Caps extend past the endpoints.
        assert_eq!(fb.get(93, 100), Some(BLUE));
        assert_eq!(fb.get(92, 100), Some(BLACK));
        assert_eq!(fb.get(207, 100), Some(BLUE));
        assert_eq!(fb.get(208, 100), Some(BLACK));
        // Corners of the bounding box stay untouched.
        assert_eq!(fb.get(93, 93), Some(BLACK));
    }

    #[test]
    fn segment_is_clipped_at_the_frame_edge() {
        let mut fb = FrameBuffer::filled(20, 20, BLACK);
        draw_segment(&mut fb, Point::new(-5, 2), Point::new(30, 2), 4, WHITE);
        assert_eq!(fb.get(0, 2), Some(WHITE));
        assert_eq!(fb.get(19, 2), Some(WHITE));
    }

    #[test]
    fn zero_length_segment_is_a_disc() {
        let mut fb = FrameBuffer::filled(20, 20, BLACK);
        draw_segment(&mut fb, Point::new(10, 10), Point::new(10, 10), 6, WHITE);
        assert_eq!(fb.get(10, 10), Some(WHITE));
        assert_eq!(fb.get(13, 10), Some(WHITE));
        assert_eq!(fb.get(14, 10), Some(BLACK));
    }

    #[test]
    fn fill_rect_is_inclusive() {
        let mut fb = FrameBuffer::filled(10, 10, BLACK);
        fill_rect(&mut fb, 2, 3, 4, 5, WHITE);
        assert_eq!(fb.pixels.iter().filter(|&&p| p == WHITE).count(), 9);
        assert_eq!(fb.get(4, 5), Some(WHITE));
        assert_eq!(fb.get(5, 5), Some(BLACK));
    }

    #[test]
    fn stroke_rect_leaves_the_inside_alone() {
        let mut fb = FrameBuffer::filled(20, 20, BLACK);
        stroke_rect(&mut fb, 5, 5, 14, 14, 2, WHITE);
        assert_eq!(fb.get(5, 5), Some(WHITE));
        assert_eq!(fb.get(6, 10), Some(WHITE));
        assert_eq!(fb.get(4, 10), Some(BLACK));
        assert_eq!(fb.get(10, 10), Some(BLACK));
    }

    #[test]
    fn extreme_coordinates_are_clipped_not_overflowed() {
        let mut fb = FrameBuffer::filled(20, 20, BLACK);
        let far = Point::new(i32::MAX, 10);
        draw_segment(&mut fb, Point::new(5, 10), far, 2, WHITE);
        draw_segment(&mut fb, far, far, 6, WHITE);
        draw_line(&mut fb, Point::new(i32::MIN, i32::MIN), Point::new(i32::MAX, i32::MAX), BLUE);
        assert_eq!(fb.get(5, 10), Some(WHITE));
        assert_eq!(fb.get(19, 10), Some(WHITE));
        assert_eq!(fb.get(3, 10), Some(BLACK));
        assert_eq!(fb.get(0, 0), Some(BLUE));
        assert_eq!(fb.get(19, 19), Some(BLUE));
    }

    #[test]
    fn line_outside_the_frame_draws_nothing() {
        let mut fb = FrameBuffer::filled(10, 10, BLACK);
        draw_line(&mut fb, Point::new(-50, -3), Point::new(50, -3), WHITE);
        assert!(fb.pixels.iter().all(|&p| p == BLACK));
    }
}
