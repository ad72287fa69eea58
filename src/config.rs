//! Command-line and environment configuration.
//!
//! Everything the capture, tracking and output layers need is gathered here
//! and handed to them explicitly at startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::camera::CaptureConfig;
use crate::canvas::{BrushConfig, DEFAULT_SAVE_FILE};
use crate::display::DisplayConfig;
use crate::landmarks::TrackerConfig;
use crate::onnx::{ModelConfig, TensorLayout};
use crate::session::SessionConfig;

#[derive(Debug, Parser)]
#[command(name = "air-draw", version, about = "Draw in the air over a live webcam feed")]
pub struct Cli {
    #[command(flatten)]
    pub capture: CaptureArgs,

    #[command(flatten)]
    pub tracker: TrackerArgs,

    #[command(flatten)]
    pub drawing: DrawingArgs,

    /// Where frames go; defaults to a local window
    #[command(subcommand)]
    pub output: Option<Output>,
}

#[derive(Debug, Subcommand)]
pub enum Output {
    /// Show frames in a desktop window (Q quit, C clear, S save)
    Window(WindowArgs),
    /// Stream frames to browsers as MJPEG over HTTP
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Camera index (0 = default webcam)
    #[arg(long = "camera", env = "AIR_DRAW_CAMERA", default_value_t = 0)]
    pub index: u32,

    /// Requested frame width
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Requested frame height
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Requested frame rate
    #[arg(long, default_value_t = 30)]
    pub fps: u32,
}

#[derive(Debug, Args)]
pub struct TrackerArgs {
    /// ONNX hand landmark model; without one no hands are detected
    #[arg(long, env = "AIR_DRAW_MODEL")]
    pub model: Option<PathBuf>,

    /// Input tensor layout of the model
    #[arg(long, value_enum, default_value_t = TensorLayout::Nhwc)]
    pub model_layout: TensorLayout,

    /// Side of the model's square input, in pixels
    #[arg(long, default_value_t = 224)]
    pub model_input: u32,

    /// Inference threads
    #[arg(long, default_value_t = 2)]
    pub model_threads: usize,

    /// Most hands to report per frame
    #[arg(long, default_value_t = 1)]
    pub max_hands: usize,

    /// Presence score needed to pick up a new hand
    #[arg(long, default_value_t = 0.85, value_parser = parse_confidence)]
    pub min_detection_confidence: f32,

    /// Presence score needed to keep a hand seen last frame
    #[arg(long, default_value_t = 0.85, value_parser = parse_confidence)]
    pub min_tracking_confidence: f32,
}

#[derive(Debug, Args)]
pub struct DrawingArgs {
    /// Brush width in pixels
    #[arg(long, default_value_t = 15)]
    pub brush_thickness: u32,

    /// Eraser width in pixels
    #[arg(long, default_value_t = 50)]
    pub eraser_thickness: u32,

    /// File written by the save command; format follows the extension
    #[arg(long, default_value = DEFAULT_SAVE_FILE)]
    pub save_path: PathBuf,

    /// Don't draw the hand skeleton
    #[arg(long)]
    pub no_skeleton: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum WindowScale {
    #[default]
    #[value(name = "1")]
    X1,
    #[value(name = "2")]
    X2,
    #[value(name = "4")]
    X4,
}

#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Window title
    #[arg(long, default_value = "Air Draw")]
    pub title: String,

    /// Upscale factor
    #[arg(long, value_enum, default_value_t = WindowScale::X1)]
    pub scale: WindowScale,

    /// Hide the mode/FPS overlay
    #[arg(long)]
    pub no_hud: bool,
}

impl Default for WindowArgs {
    fn default() -> Self {
        Self { title: "Air Draw".into(), scale: WindowScale::X1, no_hud: false }
    }
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// JPEG quality for streamed frames (1-100)
    #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: u8,
}

impl ServeArgs {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse_confidence(s: &str) -> Result<f32, String> {
    let v: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{v} is not between 0 and 1"))
    }
}

impl Cli {
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            index: self.capture.index,
            width: self.capture.width,
            height: self.capture.height,
            fps: self.capture.fps,
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            max_hands: self.tracker.max_hands,
            min_detection_confidence: self.tracker.min_detection_confidence,
            min_tracking_confidence: self.tracker.min_tracking_confidence,
        }
    }

    /// `None` when no model path was given.
    pub fn model_config(&self) -> Option<ModelConfig> {
        self.tracker.model.as_ref().map(|path| ModelConfig {
            path: path.clone(),
            input_size: self.tracker.model_input,
            layout: self.tracker.model_layout,
            threads: self.tracker.model_threads,
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            brush: BrushConfig {
                draw_thickness: self.drawing.brush_thickness,
                eraser_thickness: self.drawing.eraser_thickness,
                ..BrushConfig::default()
            },
            save_path: self.drawing.save_path.clone(),
            draw_landmarks: !self.drawing.no_skeleton,
        }
    }
}

impl WindowArgs {
    pub fn display_config(&self) -> DisplayConfig {
        DisplayConfig {
            title: self.title.clone(),
            scale: match self.scale {
                WindowScale::X1 => 1,
                WindowScale::X2 => 2,
                WindowScale::X4 => 4,
            },
            show_hud: !self.no_hud,
        }
    }
}
