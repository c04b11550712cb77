// src/gestures/classifier.rs
//! Rule-based hand-shape classifier
//!
//! Works on the 21-point hand skeleton the browser's landmark model emits.
//! Five fingertip distances are computed per frame and pushed through an
//! ordered threshold table; the first matching rule wins. Thresholds are in
//! the model's normalized coordinate space and were tuned against recordings
//! of the supported hand shapes.

use serde::Serialize;
use thiserror::Error;

use super::models::Landmark;

/// Landmark indices in the 21-point hand skeleton
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

/// Number of landmarks the hand model emits per detected hand
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Letter codes the threshold table can produce
pub const LETTER_CODES: &[&str] = &["A", "B", "L", "O", "V", "W", "Y"];

/// Frames a code must persist before the smoother commits it
pub const DEFAULT_STABLE_FRAMES: usize = 5;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("expected {expected} landmarks, got {got}")]
    NotEnoughLandmarks { expected: usize, got: usize },
}

/// The five fingertip distances the threshold table is written against
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FingerDistances {
    pub thumb_index: f32,
    pub thumb_middle: f32,
    pub thumb_ring: f32,
    pub thumb_pinky: f32,
    pub index_middle: f32,
}

impl FingerDistances {
    /// Compute the distances for one frame of landmarks
    pub fn from_frame(landmarks: &[Landmark]) -> Result<Self, ClassifierError> {
        if landmarks.len() < HAND_LANDMARK_COUNT {
            return Err(ClassifierError::NotEnoughLandmarks {
                expected: HAND_LANDMARK_COUNT,
                got: landmarks.len(),
            });
        }

        let thumb = landmarks[THUMB_TIP];
        Ok(Self {
            thumb_index: distance(thumb, landmarks[INDEX_TIP]),
            thumb_middle: distance(thumb, landmarks[MIDDLE_TIP]),
            thumb_ring: distance(thumb, landmarks[RING_TIP]),
            thumb_pinky: distance(thumb, landmarks[PINKY_TIP]),
            index_middle: distance(landmarks[INDEX_TIP], landmarks[MIDDLE_TIP]),
        })
    }
}

/// Euclidean distance between two landmarks
pub fn distance(a: Landmark, b: Landmark) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2) + (a.z - b.z).powi(2)).sqrt()
}

/// Map one frame's distances to a letter code
///
/// First match wins, so tighter shapes are tested before looser ones: a
/// fully curled hand ("O") would otherwise be swallowed by the fist rule
/// ("A").
pub fn classify(d: &FingerDistances) -> Option<&'static str> {
    if d.thumb_index < 0.08
        && d.thumb_middle < 0.08
        && d.thumb_ring < 0.08
        && d.thumb_pinky < 0.08
    {
        // All fingertips curled onto the thumb
        Some("O")
    } else if d.thumb_index < 0.1 && d.thumb_middle < 0.1 {
        // Fist with the thumb alongside
        Some("A")
    } else if d.thumb_pinky > 0.35 && d.thumb_middle < 0.2 && d.thumb_ring < 0.2 {
        // Thumb and pinky out, middle fingers curled
        Some("Y")
    } else if d.index_middle < 0.1
        && d.thumb_index > 0.25
        && d.thumb_middle > 0.25
        && d.thumb_ring > 0.25
        && d.thumb_pinky > 0.25
    {
        // Four fingers extended and together, palm open
        Some("B")
    } else if d.index_middle > 0.15
        && d.thumb_index > 0.25
        && d.thumb_middle > 0.25
        && d.thumb_ring < 0.2
    {
        // Index and middle spread, ring curled
        Some("V")
    } else if d.thumb_index > 0.25
        && d.thumb_middle > 0.3
        && d.thumb_ring > 0.3
        && d.thumb_pinky < 0.2
    {
        // Index, middle and ring up, pinky curled
        Some("W")
    } else if d.thumb_index > 0.35 && d.thumb_middle < 0.2 {
        // Index up, thumb out, rest curled
        Some("L")
    } else {
        None
    }
}

/// Classify one frame of landmarks end to end
pub fn classify_frame(landmarks: &[Landmark]) -> Result<Option<&'static str>, ClassifierError> {
    let distances = FingerDistances::from_frame(landmarks)?;
    Ok(classify(&distances))
}

/// Debounces the per-frame classifier output
///
/// A held gesture classifies identically on every animation frame. The
/// smoother commits a code once it has been seen on `stable_frames`
/// consecutive frames, and not again until the hand leaves the shape
/// (a no-code frame) or moves to a different one.
#[derive(Debug)]
pub struct GestureSmoother {
    stable_frames: usize,
    candidate: Option<&'static str>,
    run_length: usize,
    last_committed: Option<&'static str>,
}

impl GestureSmoother {
    pub fn new(stable_frames: usize) -> Self {
        Self {
            stable_frames: stable_frames.max(1),
            candidate: None,
            run_length: 0,
            last_committed: None,
        }
    }

    /// Feed one frame's classification; returns a code when it commits
    pub fn observe(&mut self, code: Option<&'static str>) -> Option<&'static str> {
        match code {
            None => {
                self.candidate = None;
                self.run_length = 0;
                self.last_committed = None;
                None
            }
            Some(c) => {
                if self.candidate == Some(c) {
                    self.run_length += 1;
                } else {
                    self.candidate = Some(c);
                    self.run_length = 1;
                }

                if self.run_length >= self.stable_frames && self.last_committed != Some(c) {
                    self.last_committed = Some(c);
                    Some(c)
                } else {
                    None
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.candidate = None;
        self.run_length = 0;
        self.last_committed = None;
    }
}

impl Default for GestureSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_STABLE_FRAMES)
    }
}
