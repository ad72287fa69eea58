// Opens a camera and converts frames into a buffer the session can draw on.
// Visual expectation: when the session loop calls `next_frame()`, you get a
// FrameBuffer where each pixel is 0x00RRGGBB, ready to mirror and composite.

use crate::error::Error;
use crate::types::{FrameBuffer, pack_rgb};

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

/// Anything that hands out frames one at a time.
/// An `Err` from `next_frame` means the stream is over.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<FrameBuffer, Error>;

    /// Width and height of the frames this source produces.
    fn resolution(&self) -> (u32, u32);
}

/// Which device to open and what to ask it for.
#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { index: 0, width: 1280, height: 720, fps: 30 }
    }
}

// A small wrapper around nokhwa::Camera so the session loop stays clean.
// The stream is stopped when this is dropped, on every exit path.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open the configured camera at a target resolution (falls back if not exact).
    /// On success, nothing is shown on screen yet; we just hold an open stream.
    pub fn open(config: &CaptureConfig) -> Result<Self, Error> {
        let idx = CameraIndex::Index(config.index);

        let fmt = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::MJPEG, // most webcams only reach 720p at full rate as MJPEG
            config.fps,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::DeviceUnavailable(format!("create camera {}: {e}", config.index)))?;

        cam.open_stream()
            .map_err(|e| Error::DeviceUnavailable(format!("open stream: {e}")))?;

        // The actual stream might choose a slightly different resolution.
        let actual = cam.resolution();
        log::info!(
            "camera {} streaming at {}x{} (requested {}x{})",
            config.index,
            actual.width(),
            actual.height(),
            config.width,
            config.height
        );

        Ok(Self { cam, width: actual.width(), height: actual.height() })
    }
}

impl FrameSource for CameraCapture {
    /// Grab one frame from the camera and convert it to 0x00RRGGBB pixels.
    /// Blocks until the device delivers a frame.
    fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::FrameRead(format!("fetch frame: {e}")))?;

        // Decode to an ImageBuffer<Rgb<u8>, Vec<u8>> (handles MJPEG/YUYV alike).
        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::FrameRead(format!("decode RGB: {e}")))?;

        let (w, h) = rgb_img.dimensions();
        let pixels = rgb_img.pixels().map(|p| pack_rgb(p[0], p[1], p[2])).collect();

        Ok(FrameBuffer { width: w as usize, height: h as usize, pixels })
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        match self.cam.stop_stream() {
            Ok(()) => log::info!("camera released"),
            Err(e) => log::warn!("failed to stop camera stream: {e}"),
        }
    }
}
