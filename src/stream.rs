//! Browser delivery: a viewer page, an MJPEG stream and command endpoints.
//!
//! One capture worker thread owns the camera and the session. It publishes
//! each finished frame as JPEG through a `watch` channel, so every viewer
//! shares the same tick loop and the device is never read concurrently.
//!
//! Routes:
//! - `GET /` viewer page
//! - `GET /video_feed` `multipart/x-mixed-replace` JPEG stream
//! - `POST /api/clear`, `POST /api/save`, `POST /api/quit`

use std::convert::Infallible;
use std::net::SocketAddr;
use std::thread::JoinHandle;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use image::ImageEncoder;
use image::codecs::jpeg::JpegEncoder;
use tokio::sync::{oneshot, watch};

use crate::camera::FrameSource;
use crate::error::Error;
use crate::gesture::Mode;
use crate::landmarks::LandmarkProvider;
use crate::session::{self, Command, OutputSink, Session};
use crate::types::FrameBuffer;

pub const BOUNDARY: &str = "frame";
const INDEX_HTML: &str = include_str!("../web/index.html");

/// Latest encoded frame; `None` until the first one is ready.
pub type FrameFeed = watch::Receiver<Option<Bytes>>;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    frames: FrameFeed,
    commands: Sender<Command>,
}

impl AppState {
    pub fn new(frames: FrameFeed, commands: Sender<Command>) -> Self {
        Self { frames, commands }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/video_feed", get(video_feed_handler))
        .route("/api/clear", post(clear_handler))
        .route("/api/save", post(save_handler))
        .route("/api/quit", post(quit_handler))
        .with_state(state)
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// One part of the multipart body.
pub fn multipart_part(jpeg: &[u8]) -> Bytes {
    let head = format!("--{BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n");
    let mut part = Vec::with_capacity(head.len() + jpeg.len() + 2);
    part.extend_from_slice(head.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}

/// Stream frames until the capture worker goes away.
async fn video_feed_handler(State(state): State<AppState>) -> Response {
    let mut rx = state.frames.clone();
    let parts = async_stream::stream! {
        loop {
            let latest = rx.borrow_and_update().clone();
            if let Some(jpeg) = latest {
                yield Ok::<Bytes, Infallible>(multipart_part(&jpeg));
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    };

    (
        [(header::CONTENT_TYPE, format!("multipart/x-mixed-replace; boundary={BOUNDARY}"))],
        Body::from_stream(parts),
    )
        .into_response()
}

fn enqueue(state: &AppState, command: Command) -> StatusCode {
    match state.commands.send(command) {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn clear_handler(State(state): State<AppState>) -> StatusCode {
    enqueue(&state, Command::Clear)
}

async fn save_handler(State(state): State<AppState>) -> StatusCode {
    enqueue(&state, Command::Save)
}

async fn quit_handler(State(state): State<AppState>) -> StatusCode {
    enqueue(&state, Command::Quit)
}

/// Encode a frame as baseline RGB JPEG.
pub fn encode_jpeg(frame: &FrameBuffer, quality: u8) -> Result<Bytes, Error> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(
            &frame.to_rgb8(),
            frame.width as u32,
            frame.height as u32,
            image::ColorType::Rgb8.into(),
        )
        .map_err(|e| Error::Encode(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// Output sink that publishes JPEGs to viewers and takes commands from HTTP.
pub struct StreamSink {
    frames: watch::Sender<Option<Bytes>>,
    commands: Receiver<Command>,
    quality: u8,
}

impl StreamSink {
    pub fn new(frames: watch::Sender<Option<Bytes>>, commands: Receiver<Command>, quality: u8) -> Self {
        Self { frames, commands, quality }
    }
}

impl OutputSink for StreamSink {
    fn present(&mut self, frame: &FrameBuffer, _mode: Mode) -> Result<(), Error> {
        match encode_jpeg(frame, self.quality) {
            Ok(jpeg) => {
                self.frames.send_replace(Some(jpeg));
            }
            // Viewers just miss this frame.
            Err(e) => log::warn!("dropping frame: {e}"),
        }
        Ok(())
    }

    fn commands(&mut self) -> Vec<Command> {
        let mut pending = Vec::new();
        loop {
            match self.commands.try_recv() {
                Ok(command) => pending.push(command),
                Err(TryRecvError::Empty) => break,
                // Nobody can send commands any more: the server is gone.
                Err(TryRecvError::Disconnected) => {
                    pending.push(Command::Quit);
                    break;
                }
            }
        }
        pending
    }
}

/// What the worker needs: a frame source and a session, built on the worker thread.
pub type WorkerParts = (Box<dyn FrameSource>, Session<Box<dyn LandmarkProvider>>);

/// Handle to the running capture worker.
pub struct CaptureWorker {
    pub frames: FrameFeed,
    pub commands: Sender<Command>,
    done: oneshot::Receiver<()>,
    handle: JoinHandle<()>,
}

/// Start the capture worker. `open` runs on the worker thread; if it fails
/// (no camera), the error comes back here and nothing is left running.
pub fn spawn_capture_worker<F>(open: F, jpeg_quality: u8) -> Result<CaptureWorker, Error>
where
    F: FnOnce() -> Result<WorkerParts, Error> + Send + 'static,
{
    let (frame_tx, frame_rx) = watch::channel(None);
    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), Error>>(1);
    let (done_tx, done_rx) = oneshot::channel();

    let handle = std::thread::Builder::new()
        .name("capture".to_string())
        .spawn(move || {
            let (mut source, mut session) = match open() {
                Ok(parts) => {
                    let _ = ready_tx.send(Ok(()));
                    parts
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let mut sink = StreamSink::new(frame_tx, command_rx, jpeg_quality);
            if let Err(e) = session::run(&mut session, source.as_mut(), &mut sink) {
                log::error!("capture loop failed: {e}");
            }

            // Closing the feed ends every open stream; then release the device.
            drop(sink);
            drop(source);
            log::info!("capture worker stopped");
            let _ = done_tx.send(());
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(CaptureWorker {
            frames: frame_rx,
            commands: command_tx,
            done: done_rx,
            handle,
        }),
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(e)
        }
        Err(_) => {
            let _ = handle.join();
            Err(Error::DeviceUnavailable("capture worker exited during startup".into()))
        }
    }
}

/// Resolve when the worker finishes, or ask it to stop on Ctrl-C.
async fn shutdown_signal(commands: Sender<Command>, done: oneshot::Receiver<()>) {
    tokio::select! {
        _ = done => log::info!("capture finished, shutting down"),
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted, stopping capture");
            let _ = commands.send(Command::Quit);
        }
    }
}

/// Serve the viewer until the capture worker stops.
/// The worker is stopped and joined on every exit path, so the device is
/// released before any error is returned.
pub async fn serve(addr: SocketAddr, worker: CaptureWorker) -> Result<(), Error> {
    let CaptureWorker { frames, commands, done, handle } = worker;

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("cannot listen on {addr}: {e}");
            stop_worker(&commands, handle).await;
            return Err(e.into());
        }
    };
    log::info!("viewer at http://{}/", listener.local_addr().unwrap_or(addr));

    let app = router(AppState::new(frames, commands.clone()));
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(commands.clone(), done))
        .await;

    stop_worker(&commands, handle).await;
    served?;
    Ok(())
}

/// Ask the capture loop to quit and wait until it has released the device.
async fn stop_worker(commands: &Sender<Command>, handle: JoinHandle<()>) {
    let _ = commands.send(Command::Quit);
    match tokio::task::spawn_blocking(move || handle.join()).await {
        Ok(Ok(())) => {}
        _ => log::error!("capture worker panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BLUE, RED};

    #[test]
    fn multipart_part_is_framed() {
        let part = multipart_part(b"JPEG");
        assert_eq!(&part[..], b"--frame\r\nContent-Type: image/jpeg\r\n\r\nJPEG\r\n");
    }

    #[test]
    fn encode_jpeg_produces_a_decodable_image() {
        let frame = FrameBuffer::filled(32, 16, BLUE);
        let jpeg = encode_jpeg(&frame, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn sink_publishes_frames_and_drains_commands() {
        let (frame_tx, frame_rx) = watch::channel(None);
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let mut sink = StreamSink::new(frame_tx, command_rx, 75);

        sink.present(&FrameBuffer::filled(8, 8, RED), Mode::Idle).unwrap();
        assert!(frame_rx.borrow().is_some());

        command_tx.send(Command::Clear).unwrap();
        command_tx.send(Command::Save).unwrap();
        assert_eq!(sink.commands(), vec![Command::Clear, Command::Save]);
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn sink_quits_once_every_command_sender_is_gone() {
        let (frame_tx, _frame_rx) = watch::channel(None);
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let mut sink = StreamSink::new(frame_tx, command_rx, 75);

        command_tx.send(Command::Save).unwrap();
        drop(command_tx);
        assert_eq!(sink.commands(), vec![Command::Save, Command::Quit]);
    }

    #[test]
    fn worker_startup_failure_is_reported() {
        let result = spawn_capture_worker(
            || Err(Error::DeviceUnavailable("no camera".into())),
            80,
        );
        assert!(matches!(result, Err(Error::DeviceUnavailable(_))));
    }
}
