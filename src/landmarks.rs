//! Hand landmarks and the provider capability that produces them.
//!
//! A provider takes a color frame and returns zero or more hands, each an
//! ordered list of 21 keypoints in frame pixel coordinates (MediaPipe topology).

use crate::error::Error;
use crate::raster::{draw_line, draw_segment};
use crate::types::{Color, FrameBuffer, Point};

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Hand skeleton connections for the overlay
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP), (WRIST, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP),
    (PINKY_DIP, PINKY_TIP),
];

/// One tracked point: its landmark id and where it sits in the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Keypoint {
    pub id: usize,
    pub pos: Point,
}

/// One detected hand. Keypoints are ordered by id; a well-behaved provider
/// always reports all 21.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hand {
    pub keypoints: Vec<Keypoint>,
}

impl Hand {
    /// Build a hand from positions listed in landmark order.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        let keypoints = points
            .into_iter()
            .enumerate()
            .map(|(id, pos)| Keypoint { id, pos })
            .collect();
        Self { keypoints }
    }

    /// Position of landmark `id`, if the provider reported it.
    pub fn point(&self, id: usize) -> Option<Point> {
        match self.keypoints.get(id) {
            Some(kp) if kp.id == id => Some(kp.pos),
            // Out-of-order list: fall back to a search.
            _ => self.keypoints.iter().find(|kp| kp.id == id).map(|kp| kp.pos),
        }
    }

    pub fn index_tip(&self) -> Option<Point> {
        self.point(INDEX_TIP)
    }
}

/// Knobs handed to whichever provider is in use.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    pub max_hands: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { max_hands: 1, min_detection_confidence: 0.85, min_tracking_confidence: 0.85 }
    }
}

/// The hand landmark capability. Implementations own their model state.
pub trait LandmarkProvider {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Vec<Hand>, Error>;
}

impl<P: LandmarkProvider + ?Sized> LandmarkProvider for Box<P> {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Vec<Hand>, Error> {
        (**self).detect(frame)
    }
}

/// Provider used when no model is available: never sees a hand.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHands;

impl LandmarkProvider for NoHands {
    fn detect(&mut self, _frame: &FrameBuffer) -> Result<Vec<Hand>, Error> {
        Ok(Vec::new())
    }
}

const BONE_COLOR: Color = 0x00_FF_FF_FF;
const JOINT_COLOR: Color = 0x00_FF_00_00;

/// Draw the hand skeleton and a dot on every landmark.
/// Visual: white bones with red joints on top of the live frame.
pub fn draw_hand(fb: &mut FrameBuffer, hand: &Hand) {
    for &(a, b) in HAND_CONNECTIONS.iter() {
        if let (Some(pa), Some(pb)) = (hand.point(a), hand.point(b)) {
            draw_segment(fb, pa, pb, 2, BONE_COLOR);
        }
    }
    for kp in &hand.keypoints {
        draw_segment(fb, kp.pos, kp.pos, 6, JOINT_COLOR);
        draw_line(fb, kp.pos, kp.pos, BONE_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BLACK;

    #[test]
    fn point_looks_up_by_id() {
        let hand = Hand::from_points((0..LANDMARK_COUNT as i32).map(|i| Point::new(i, i * 2)));
        assert_eq!(hand.point(INDEX_TIP), Some(Point::new(8, 16)));
        assert_eq!(hand.index_tip(), Some(Point::new(8, 16)));
    }

    #[test]
    fn point_handles_missing_and_shuffled_keypoints() {
        let hand = Hand {
            keypoints: vec![
                Keypoint { id: INDEX_TIP, pos: Point::new(1, 2) },
                Keypoint { id: WRIST, pos: Point::new(3, 4) },
            ],
        };
        assert_eq!(hand.point(INDEX_TIP), Some(Point::new(1, 2)));
        assert_eq!(hand.point(WRIST), Some(Point::new(3, 4)));
        assert_eq!(hand.point(MIDDLE_TIP), None);
    }

    #[test]
    fn no_hands_reports_nothing() {
        let frame = FrameBuffer::filled(4, 4, BLACK);
        assert!(NoHands.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn draw_hand_marks_the_landmarks() {
        let mut fb = FrameBuffer::filled(64, 64, BLACK);
        let hand = Hand::from_points((0..LANDMARK_COUNT as i32).map(|i| Point::new(10 + i, 30)));
        draw_hand(&mut fb, &hand);
        assert_eq!(fb.get(18, 30), Some(BONE_COLOR));
        assert_eq!(fb.get(18, 32), Some(JOINT_COLOR));
        assert_eq!(fb.get(18, 50), Some(BLACK));
    }
}
