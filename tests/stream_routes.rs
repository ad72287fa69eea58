//! HTTP surface of the streaming server, exercised without binding a socket.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use air_draw::camera::FrameSource;
use air_draw::error::Error;
use air_draw::landmarks::{LandmarkProvider, NoHands};
use air_draw::session::{Command, Session, SessionConfig};
use air_draw::stream::{AppState, encode_jpeg, router, serve, spawn_capture_worker};
use air_draw::types::{BLUE, FrameBuffer};
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use bytes::Bytes;
use tokio::sync::watch;
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn post(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn index_serves_the_viewer_page() {
    let (_frame_tx, frame_rx) = watch::channel(None);
    let (command_tx, _command_rx) = crossbeam_channel::unbounded();
    let app = router(AppState::new(frame_rx, command_tx));

    let resp = app.oneshot(get("/")).await.expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let html = String::from_utf8(body.to_vec()).expect("utf8");
    assert!(html.contains("/video_feed"));
}

#[tokio::test]
async fn video_feed_streams_multipart_jpegs_until_capture_stops() {
    let jpeg = encode_jpeg(&FrameBuffer::filled(16, 16, BLUE), 80).expect("encode");
    let (frame_tx, frame_rx) = watch::channel::<Option<Bytes>>(None);
    frame_tx.send_replace(Some(jpeg.clone()));
    // Capture already finished: the stream yields the last frame and ends.
    drop(frame_tx);

    let (command_tx, _command_rx) = crossbeam_channel::unbounded();
    let app = router(AppState::new(frame_rx, command_tx));

    let resp = app.oneshot(get("/video_feed")).await.expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=frame"
    );

    let body = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let head = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
    assert!(body.starts_with(head));
    assert_eq!(&body[head.len()..body.len() - 2], &jpeg[..]);
    assert!(body.ends_with(b"\r\n"));
}

#[tokio::test]
async fn command_routes_reach_the_capture_worker() {
    let (_frame_tx, frame_rx) = watch::channel(None);
    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    let app = router(AppState::new(frame_rx, command_tx));

    for (uri, expected) in [
        ("/api/clear", Command::Clear),
        ("/api/save", Command::Save),
        ("/api/quit", Command::Quit),
    ] {
        let resp = app.clone().oneshot(post(uri)).await.expect("response");
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(command_rx.try_recv(), Ok(expected));
    }
}

#[tokio::test]
async fn commands_fail_when_the_worker_is_gone() {
    let (_frame_tx, frame_rx) = watch::channel(None);
    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    drop(command_rx);
    let app = router(AppState::new(frame_rx, command_tx));

    let resp = app.oneshot(post("/api/clear")).await.expect("response");
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

/// Endless camera stand-in that counts reads and notes when it is released.
struct CountingCamera {
    reads: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

impl FrameSource for CountingCamera {
    fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(2));
        Ok(FrameBuffer::filled(32, 24, BLUE))
    }

    fn resolution(&self) -> (u32, u32) {
        (32, 24)
    }
}

impl Drop for CountingCamera {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn failed_bind_stops_the_capture_worker() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = taken.local_addr().expect("addr");

    let reads = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicBool::new(false));
    let camera = CountingCamera { reads: reads.clone(), released: released.clone() };
    let worker = spawn_capture_worker(
        move || {
            let provider: Box<dyn LandmarkProvider> = Box::new(NoHands);
            let session = Session::new(provider, 32, 24, SessionConfig::default());
            Ok((Box::new(camera) as Box<dyn FrameSource>, session))
        },
        80,
    )
    .expect("worker");

    let result = serve(addr, worker).await;
    assert!(matches!(result, Err(Error::Server(_))));
    assert!(released.load(Ordering::SeqCst), "camera still held after serve returned");

    let after_return = reads.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(reads.load(Ordering::SeqCst), after_return);
}
