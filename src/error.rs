// One error type for the whole crate. Every variant states *where* things went wrong.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String), // Opening/starting the camera failed
    #[error("camera frame error: {0}")]
    FrameRead(String), // Grabbing/decoding a frame failed (end of stream)
    #[error("landmark provider error: {0}")]
    Provider(String), // Loading or running the hand model failed
    #[error("frame encoding error: {0}")]
    Encode(String), // JPEG encoding of an output frame failed
    #[error("save error: {0}")]
    Save(String), // Writing the drawing to disk failed
    #[error("window init error: {0}")]
    WindowInit(String), // Creating the window failed
    #[error("window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed
    #[error("server error: {0}")]
    Server(#[from] std::io::Error), // Binding or serving HTTP failed
}
