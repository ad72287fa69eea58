// The per-tick state machine and the loop that drives it.
// Visual expectation: each call to `tick` turns one raw camera frame into the
// frame you see: mirrored, with the hand skeleton, the palette while
// selecting, and every stroke drawn so far stamped on top.

use std::path::PathBuf;
use std::time::Instant;

use crate::camera::FrameSource;
use crate::canvas::{BrushConfig, BrushState, DEFAULT_SAVE_FILE, Surface, stroke_to};
use crate::error::Error;
use crate::gesture::{self, Mode};
use crate::landmarks::{self, Hand, LandmarkProvider};
use crate::palette::Palette;
use crate::types::{FrameBuffer, Point};

/// Requests from the user, via keys or HTTP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Clear,
    Save,
    Quit,
}

/// Where finished frames go. Also the source of user commands.
pub trait OutputSink {
    fn present(&mut self, frame: &FrameBuffer, mode: Mode) -> Result<(), Error>;

    /// Commands issued since the last call, oldest first.
    fn commands(&mut self) -> Vec<Command>;
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub brush: BrushConfig,
    pub save_path: PathBuf,
    /// Draw the landmark skeleton on output frames
    pub draw_landmarks: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            brush: BrushConfig::default(),
            save_path: PathBuf::from(DEFAULT_SAVE_FILE),
            draw_landmarks: true,
        }
    }
}

pub struct Session<P> {
    provider: P,
    config: SessionConfig,
    surface: Surface,
    brush: BrushState,
    palette: Palette,
    cursor: Option<Point>,
    mode: Mode,
}

impl<P: LandmarkProvider> Session<P> {
    pub fn new(provider: P, width: usize, height: usize, config: SessionConfig) -> Self {
        Self {
            provider,
            surface: Surface::new(width, height),
            brush: BrushState::new(&config.brush),
            palette: Palette::new(width),
            cursor: None,
            mode: Mode::Idle,
            config,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn brush(&self) -> &BrushState {
        &self.brush
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Last drawn fingertip position; `None` when no stroke is in progress.
    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    /// Mode resolved on the most recent tick.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Process one raw camera frame and return the frame to show.
    pub fn tick(&mut self, mut frame: FrameBuffer) -> FrameBuffer {
        frame.mirror_horizontal();

        if !self.surface.matches(&frame) {
            log::warn!(
                "frame size changed to {}x{}; starting a new drawing",
                frame.width,
                frame.height
            );
            self.surface = Surface::new(frame.width, frame.height);
            self.palette = Palette::new(frame.width);
            self.cursor = None;
        }

        // A failing provider costs us this tick's gesture, not the frame.
        let hand: Option<Hand> = match self.provider.detect(&frame) {
            Ok(hands) => hands.into_iter().next(),
            Err(e) => {
                log::warn!("skipping gestures this frame: {e}");
                None
            }
        };

        if self.config.draw_landmarks && let Some(hand) = &hand {
            landmarks::draw_hand(&mut frame, hand);
        }

        self.mode = gesture::resolve(hand.as_ref());
        let tip = hand.as_ref().and_then(Hand::index_tip);

        match (self.mode, tip) {
            (Mode::Select, tip) => {
                if let Some(tip) = tip {
                    self.palette.hit_test(tip, &mut self.brush);
                }
                self.palette.render(&mut frame, &self.brush);
                self.cursor = None;
            }
            (Mode::Draw, Some(tip)) => {
                stroke_to(&mut self.surface, &mut self.cursor, tip, &self.brush);
            }
            _ => self.cursor = None,
        }

        self.surface.composite_onto(&mut frame);
        frame
    }

    /// Wipe the drawing. The brush is kept.
    pub fn clear(&mut self) {
        self.surface.clear();
        log::info!("canvas cleared");
    }

    /// Save the drawing on white paper to the configured path.
    pub fn save(&self) -> Result<PathBuf, Error> {
        let path = self.config.save_path.clone();
        self.surface.save(&path)?;
        log::info!("drawing saved to {}", path.display());
        Ok(path)
    }

    /// Apply a non-quit command. Save failures are logged, not fatal.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Clear => self.clear(),
            Command::Save => {
                if let Err(e) = self.save() {
                    log::error!("{e}");
                }
            }
            Command::Quit => {}
        }
    }
}

/// Pump frames from `source` through `session` into `sink` until the source
/// runs dry or a quit command arrives.
pub fn run<P, S, O>(session: &mut Session<P>, source: &mut S, sink: &mut O) -> Result<(), Error>
where
    P: LandmarkProvider,
    S: FrameSource + ?Sized,
    O: OutputSink + ?Sized,
{
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;

    loop {
        let raw = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::info!("capture ended: {e}");
                return Ok(());
            }
        };

        let out = session.tick(raw);
        sink.present(&out, session.mode())?;

        for command in sink.commands() {
            if command == Command::Quit {
                log::info!("quit requested");
                return Ok(());
            }
            session.apply(command);
        }

        frames_this_second += 1;
        let elapsed = last_fps_time.elapsed();
        if elapsed.as_secs() >= 1 {
            log::debug!("{:.1} fps", frames_this_second as f32 / elapsed.as_secs_f32());
            frames_this_second = 0;
            last_fps_time = Instant::now();
        }
    }
}
