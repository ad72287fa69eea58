//! Hand landmark detection with ONNX Runtime.
//!
//! Runs a MediaPipe-style hand landmark model (for example the PINTO Model Zoo
//! `hand_landmark` export) on the whole frame. The model is expected to produce
//! a 63-value output (21 × x,y,z in input pixels) and a single hand-presence
//! score; other outputs are ignored.

use std::path::PathBuf;

use ndarray::Array4;

use crate::error::Error;
use crate::landmarks::{Hand, LANDMARK_COUNT, LandmarkProvider, TrackerConfig};
use crate::types::{FrameBuffer, Point, unpack_rgb};

/// Memory order the model wants its input tensor in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TensorLayout {
    /// (1, H, W, 3), as exported from TFLite
    #[default]
    Nhwc,
    /// (1, 3, H, W)
    Nchw,
}

#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// Side of the square model input, in pixels
    pub input_size: u32,
    pub layout: TensorLayout,
    pub threads: usize,
}

pub struct OnnxHandLandmarker {
    session: ort::session::Session,
    input_size: u32,
    layout: TensorLayout,
    max_hands: usize,
    gate: PresenceGate,
}

/// Decides whether a presence score counts as a hand.
/// A new hand must reach the detection threshold; a hand reported on the
/// previous frame only has to reach the tracking threshold.
#[derive(Clone, Debug)]
pub struct PresenceGate {
    min_detection: f32,
    min_tracking: f32,
    tracking: bool,
}

impl PresenceGate {
    pub fn new(tracker: &TrackerConfig) -> Self {
        Self {
            min_detection: tracker.min_detection_confidence,
            min_tracking: tracker.min_tracking_confidence,
            tracking: false,
        }
    }

    /// Whether a hand was reported last frame.
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Judge one frame's raw score. Models without a presence output are
    /// taken at their word.
    pub fn accept(&mut self, raw: Option<f32>) -> bool {
        let score = presence(raw.unwrap_or(1.0));
        let threshold = if self.tracking { self.min_tracking } else { self.min_detection };
        self.tracking = score >= threshold;
        self.tracking
    }

    /// Forget the current hand.
    pub fn lose(&mut self) {
        self.tracking = false;
    }
}

impl OnnxHandLandmarker {
    /// Load the model from disk.
    pub fn load(model: &ModelConfig, tracker: TrackerConfig) -> Result<Self, Error> {
        if !model.path.exists() {
            return Err(Error::Provider(format!("model not found: {}", model.path.display())));
        }

        let session = ort::session::Session::builder()
            .map_err(|e| Error::Provider(format!("create session builder: {e}")))?
            .with_intra_threads(model.threads)
            .map_err(|e| Error::Provider(format!("set threads: {e}")))?
            .commit_from_file(&model.path)
            .map_err(|e| Error::Provider(format!("load {}: {e}", model.path.display())))?;

        log::info!(
            "loaded hand landmark model {} ({}x{} {:?})",
            model.path.display(),
            model.input_size,
            model.input_size,
            model.layout
        );

        Ok(Self {
            session,
            input_size: model.input_size,
            layout: model.layout,
            max_hands: tracker.max_hands,
            gate: PresenceGate::new(&tracker),
        })
    }
}

impl LandmarkProvider for OnnxHandLandmarker {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Vec<Hand>, Error> {
        if self.max_hands == 0 || frame.pixels.is_empty() {
            return Ok(Vec::new());
        }

        let size = self.input_size as usize;
        let input = preprocess(frame, self.input_size, self.layout);
        let shape = match self.layout {
            TensorLayout::Nhwc => (1, size, size, 3),
            TensorLayout::Nchw => (1, 3, size, size),
        };
        let input_array = Array4::from_shape_vec(shape, input)
            .map_err(|e| Error::Provider(format!("create input array: {e}")))?;
        let input_tensor = ort::value::Tensor::from_array(input_array)
            .map_err(|e| Error::Provider(format!("create tensor: {e}")))?;

        // Outputs borrow the session; copy what we need out before touching self again.
        let (landmarks, score) = {
            let outputs = self
                .session
                .run(ort::inputs![input_tensor])
                .map_err(|e| Error::Provider(format!("inference failed: {e}")))?;

            let mut landmarks: Option<Vec<f32>> = None;
            let mut score: Option<f32> = None;
            for (_name, value) in outputs.iter() {
                let Ok((_shape, data)) = value.try_extract_tensor::<f32>() else {
                    continue;
                };
                if landmarks.is_none() && data.len() == LANDMARK_COUNT * 3 {
                    landmarks = Some(data.to_vec());
                } else if score.is_none() && data.len() == 1 {
                    score = Some(data[0]);
                }
            }
            (landmarks, score)
        };

        let landmarks = landmarks
            .ok_or_else(|| Error::Provider("model has no 21x3 landmark output".into()))?;
        let Some(hand) = decode_hand(&landmarks, self.input_size, frame.width, frame.height) else {
            log::debug!("discarding non-finite landmarks");
            self.gate.lose();
            return Ok(Vec::new());
        };
        if !self.gate.accept(score) {
            return Ok(Vec::new());
        }
        Ok(vec![hand])
    }
}

/// Nearest-neighbour resize to a square RGB tensor in [0, 1].
pub fn preprocess(frame: &FrameBuffer, size: u32, layout: TensorLayout) -> Vec<f32> {
    let side = size as usize;
    let plane = side * side;
    let mut output = vec![0.0f32; plane * 3];
    if frame.width == 0 || frame.height == 0 {
        return output;
    }

    let x_ratio = frame.width as f32 / size as f32;
    let y_ratio = frame.height as f32 / size as f32;

    for y in 0..side {
        let src_y = ((y as f32 * y_ratio) as usize).min(frame.height - 1);
        for x in 0..side {
            let src_x = ((x as f32 * x_ratio) as usize).min(frame.width - 1);
            let rgb = unpack_rgb(frame.pixels[src_y * frame.width + src_x]);
            let pixel_idx = y * side + x;
            for (c, v) in rgb.iter().enumerate() {
                let value = *v as f32 / 255.0;
                match layout {
                    TensorLayout::Nhwc => output[pixel_idx * 3 + c] = value,
                    TensorLayout::Nchw => output[c * plane + pixel_idx] = value,
                }
            }
        }
    }

    output
}

/// Some exports emit the presence logit rather than a probability.
/// Non-finite scores count as no hand.
pub fn presence(raw: f32) -> f32 {
    if !raw.is_finite() {
        0.0
    } else if (0.0..=1.0).contains(&raw) {
        raw
    } else {
        1.0 / (1.0 + (-raw).exp())
    }
}

/// Turn 21 × (x, y, z) model-space values into a hand in frame pixels.
/// `None` if any coordinate is not finite; points are kept within one frame
/// size of the visible area.
pub fn decode_hand(values: &[f32], input_size: u32, frame_width: usize, frame_height: usize) -> Option<Hand> {
    let sx = frame_width as f32 / input_size as f32;
    let sy = frame_height as f32 / input_size as f32;
    let (w, h) = (frame_width as f32, frame_height as f32);
    let mut points = Vec::with_capacity(LANDMARK_COUNT);
    for xyz in values.chunks_exact(3).take(LANDMARK_COUNT) {
        let (x, y) = (xyz[0] * sx, xyz[1] * sy);
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        points.push(Point::new(x.clamp(-w, 2.0 * w) as i32, y.clamp(-h, 2.0 * h) as i32));
    }
    Some(Hand::from_points(points))
}
