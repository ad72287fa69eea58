//! Gesture classification: which fingers are up, and what that means.
//!
//! A finger counts as extended when its tip sits strictly higher on screen
//! (smaller y) than its PIP joint. Only index and middle are looked at.
//! Every tick is judged on its own landmarks; there is no smoothing.

use crate::landmarks::{Hand, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FingerState {
    pub index: bool,
    pub middle: bool,
}

impl FingerState {
    pub fn count(&self) -> usize {
        self.index as usize + self.middle as usize
    }
}

/// Per-tick interaction mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    Draw,
    Select,
}

impl Mode {
    /// 0 fingers → Idle, 1 → Draw, 2 → Select.
    pub fn from_fingers(fingers: FingerState) -> Self {
        match fingers.count() {
            1 => Mode::Draw,
            2 => Mode::Select,
            _ => Mode::Idle,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Idle => "IDLE",
            Mode::Draw => "DRAW",
            Mode::Select => "SELECT",
        }
    }
}

/// Missing keypoints read as "not extended".
fn extended(hand: &Hand, tip: usize, pip: usize) -> bool {
    match (hand.point(tip), hand.point(pip)) {
        (Some(t), Some(p)) => t.y < p.y,
        _ => false,
    }
}

pub fn classify(hand: &Hand) -> FingerState {
    FingerState {
        index: extended(hand, INDEX_TIP, INDEX_PIP),
        middle: extended(hand, MIDDLE_TIP, MIDDLE_PIP),
    }
}

/// Mode for this tick; no hand means Idle.
pub fn resolve(hand: Option<&Hand>) -> Mode {
    hand.map_or(Mode::Idle, |h| Mode::from_fingers(classify(h)))
}
