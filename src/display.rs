// Interactive window output.
// Visual effects provided here:
// 1) A window that shows the composited camera image.
// 2) A small HUD with the current mode, brush and FPS.
// Keys: Q or ESC quits, C clears the drawing, S saves it.

use std::time::Instant;

use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};

use crate::error::Error;
use crate::gesture::Mode;
use crate::raster::draw_text_5x7;
use crate::session::{Command, OutputSink};
use crate::types::{FrameBuffer, WHITE};

/// Window settings, passed in explicitly at startup.
#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub title: String,
    /// Integer upscale factor (1, 2 or 4)
    pub scale: u8,
    pub show_hud: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { title: "Air Draw".into(), scale: 1, show_hud: true }
    }
}

pub struct Drawer {
    window: Window,
    show_hud: bool,
    hud: FrameBuffer, // scratch copy so the HUD never leaks into session frames
    last_fps_time: Instant,
    frames_this_second: u32,
    fps_text: String,
}

impl Drawer {
    /// Create a window sized to the camera feed.
    /// Visual: a new empty window appears with the chosen title.
    pub fn new(config: &DisplayConfig, width: usize, height: usize) -> Result<Self, Error> {
        let scale = match config.scale {
            2 => Scale::X2,
            4 => Scale::X4,
            _ => Scale::X1,
        };
        let options = WindowOptions { scale, ..WindowOptions::default() };
        let window = Window::new(&config.title, width, height, options)
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self {
            window,
            show_hud: config.show_hud,
            hud: FrameBuffer::filled(width, height, 0),
            last_fps_time: Instant::now(),
            frames_this_second: 0,
            fps_text: String::from("FPS: 0.0"),
        })
    }

    /// Returns false when the user closes the window.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn tick_fps(&mut self) {
        self.frames_this_second += 1;
        let elapsed = self.last_fps_time.elapsed();
        if elapsed.as_secs() >= 1 {
            let fps = self.frames_this_second as f32 / elapsed.as_secs_f32();
            self.fps_text = format!("FPS: {fps:.1}");
            self.frames_this_second = 0;
            self.last_fps_time = Instant::now();
        }
    }
}

impl OutputSink for Drawer {
    /// Push the pixels for this frame to the screen.
    /// Visual: the window immediately displays the new image.
    fn present(&mut self, frame: &FrameBuffer, mode: Mode) -> Result<(), Error> {
        self.tick_fps();

        let shown = if self.show_hud {
            if !self.hud.same_size(frame) {
                self.hud = frame.clone();
            } else {
                self.hud.pixels.copy_from_slice(&frame.pixels);
            }
            let text = format!("{} | {}", mode.label(), self.fps_text);
            draw_text_5x7(&mut self.hud, 8, frame.height as i32 - 16, &text, WHITE);
            &self.hud
        } else {
            frame
        };

        self.window
            .update_with_buffer(&shown.pixels, shown.width, shown.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    fn commands(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        if self.window.is_key_pressed(Key::C, KeyRepeat::No) {
            out.push(Command::Clear);
        }
        if self.window.is_key_pressed(Key::S, KeyRepeat::No) {
            out.push(Command::Save);
        }
        if !self.is_open()
            || self.window.is_key_down(Key::Escape)
            || self.window.is_key_pressed(Key::Q, KeyRepeat::No)
        {
            out.push(Command::Quit);
        }
        out
    }
}
