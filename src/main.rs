// What you SEE:
// • Live mirrored camera feed with your hand skeleton drawn on it.
// • Raise only your index finger: draw with the current color.
// • Raise index + middle: the palette appears; touch a swatch to pick it
//   (the white one is the eraser).
// • Window mode keys: C clears, S saves, Q/ESC quits.
// • `serve` mode: open http://localhost:5000/ in a browser instead.

use std::net::SocketAddr;

use air_draw::camera::{CameraCapture, FrameSource};
use air_draw::config::{Cli, Output, WindowArgs};
use air_draw::display::Drawer;
use air_draw::landmarks::{LandmarkProvider, NoHands};
use air_draw::onnx::OnnxHandLandmarker;
use air_draw::session::{self, Session};
use air_draw::stream;
use anyhow::Context;
use clap::Parser;

/// Load the hand model, or fall back to a provider that never sees hands.
fn build_provider(cli: &Cli) -> Box<dyn LandmarkProvider> {
    let Some(model) = cli.model_config() else {
        log::warn!("no --model given; hand tracking disabled");
        return Box::new(NoHands);
    };
    match OnnxHandLandmarker::load(&model, cli.tracker_config()) {
        Ok(provider) => Box::new(provider),
        Err(e) => {
            log::warn!("{e}; hand tracking disabled");
            Box::new(NoHands)
        }
    }
}

fn run_window(cli: &Cli, args: &WindowArgs) -> anyhow::Result<()> {
    let mut cam = CameraCapture::open(&cli.capture_config())?;
    let (w, h) = cam.resolution();

    let mut drawer = Drawer::new(&args.display_config(), w as usize, h as usize)?;
    let mut session = Session::new(build_provider(cli), w as usize, h as usize, cli.session_config());

    session::run(&mut session, &mut cam, &mut drawer)?;
    Ok(())
}

fn run_server(cli: Cli, addr: SocketAddr, jpeg_quality: u8) -> anyhow::Result<()> {
    // The camera and model live on the worker thread for their whole life.
    let worker = stream::spawn_capture_worker(
        move || {
            let cam = CameraCapture::open(&cli.capture_config())?;
            let (w, h) = cam.resolution();
            let session =
                Session::new(build_provider(&cli), w as usize, h as usize, cli.session_config());
            Ok((Box::new(cam) as Box<dyn FrameSource>, session))
        },
        jpeg_quality,
    )
    .context("starting capture")?;

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(stream::serve(addr, worker))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut cli = Cli::parse();
    match cli.output.take() {
        None => run_window(&cli, &WindowArgs::default()),
        Some(Output::Window(args)) => run_window(&cli, &args),
        Some(Output::Serve(args)) => run_server(cli, args.addr(), args.jpeg_quality),
    }
}
