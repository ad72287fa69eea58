//! Air Draw: paint over a live webcam feed with hand gestures.
//!
//! One raised finger draws, two raised fingers pick a color (or the eraser)
//! from a palette along the top edge. Frames go to a local window or are
//! streamed to browsers as MJPEG.

pub mod camera;
pub mod canvas;
pub mod config;
pub mod display;
pub mod error;
pub mod gesture;
pub mod landmarks;
pub mod onnx;
pub mod palette;
pub mod raster;
pub mod session;
pub mod stream;
pub mod types;

pub use error::Error;
