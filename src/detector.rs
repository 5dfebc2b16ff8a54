//! Symptom classification
//!
//! Stateless per-frame thresholding. Each rule reads only the blend shapes it
//! needs; if any of them is missing from the frame, that rule alone is
//! skipped. Debouncing and all side effects happen in the session controller.

use crate::config::DetectorConfig;
use crate::types::{FrameSample, SymptomKind};

/// A detection that passed its threshold but has not been debounced yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymptomCandidate {
    pub kind: SymptomKind,
    /// Derived intensity score
    pub intensity: i32,
}

/// Per-frame classification result. Rules fire independently; any subset may
/// be present for a single frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameOutcome {
    pub blink: Option<SymptomCandidate>,
    pub twitch: Option<SymptomCandidate>,
    /// Sustained eye strain observed this frame (not debounced)
    pub eye_strain: bool,
}

/// Stateless classifier applying the configured thresholds to one sample
pub struct SymptomDetector;

impl SymptomDetector {
    /// Classify a single frame against the configured thresholds
    pub fn classify(sample: &FrameSample, config: &DetectorConfig) -> FrameOutcome {
        FrameOutcome {
            blink: classify_blink(sample, config),
            twitch: classify_twitch(sample, config),
            eye_strain: detect_strain(sample, config),
        }
    }
}

/// Both eyelids closing together past the threshold is a blink candidate
fn classify_blink(sample: &FrameSample, config: &DetectorConfig) -> Option<SymptomCandidate> {
    match (sample.left_eye_blink, sample.right_eye_blink) {
        (Some(left), Some(right))
            if left > config.blink_threshold && right > config.blink_threshold =>
        {
            Some(SymptomCandidate {
                kind: SymptomKind::Blink,
                intensity: ((left + right) * 50.0).round() as i32,
            })
        }
        _ => None,
    }
}

/// Mean activation across the three brow regions past the threshold is a
/// twitch candidate
fn classify_twitch(sample: &FrameSample, config: &DetectorConfig) -> Option<SymptomCandidate> {
    match (
        sample.brow_inner_up,
        sample.brow_outer_up_left,
        sample.brow_outer_up_right,
    ) {
        (Some(inner), Some(outer_left), Some(outer_right)) => {
            let combined = (inner + outer_left + outer_right) / 3.0;
            if combined > config.twitch_threshold {
                Some(SymptomCandidate {
                    kind: SymptomKind::Twitch,
                    intensity: (combined * 100.0).round() as i32,
                })
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Mean closure/squint across both eyes past the threshold flags strain
fn detect_strain(sample: &FrameSample, config: &DetectorConfig) -> bool {
    match (
        sample.left_eye_blink,
        sample.right_eye_blink,
        sample.eye_squint_left,
        sample.eye_squint_right,
    ) {
        (Some(blink_left), Some(blink_right), Some(squint_left), Some(squint_right)) => {
            let combined = (blink_left + blink_right + squint_left + squint_right) / 4.0;
            combined > config.strain_threshold
        }
        _ => false,
    }
}
