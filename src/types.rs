//! Core types for the Ocusense engine
//!
//! This module defines the data structures that flow through the engine:
//! per-frame samples, symptom events, session summaries, and the read-only
//! snapshot exposed to the host UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Symptom kind for provenance and per-kind debouncing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomKind {
    Blink,
    Twitch,
}

impl SymptomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymptomKind::Blink => "blink",
            SymptomKind::Twitch => "twitch",
        }
    }
}

/// A single frame of facial-expression intensities from the tracking capability.
///
/// Every intensity is a normalized [0,1] activation. A `None` field means the
/// tracker did not report that blend shape for this frame; rules that need a
/// missing field are skipped for the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSample {
    /// Frame capture time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Left eyelid closure intensity
    pub left_eye_blink: Option<f32>,
    /// Right eyelid closure intensity
    pub right_eye_blink: Option<f32>,
    /// Inner brow raise intensity
    pub brow_inner_up: Option<f32>,
    /// Left outer brow raise intensity
    pub brow_outer_up_left: Option<f32>,
    /// Right outer brow raise intensity
    pub brow_outer_up_right: Option<f32>,
    /// Left eye squint intensity
    pub eye_squint_left: Option<f32>,
    /// Right eye squint intensity
    pub eye_squint_right: Option<f32>,
}

impl FrameSample {
    /// Create an empty sample at the given instant
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            left_eye_blink: None,
            right_eye_blink: None,
            brow_inner_up: None,
            brow_outer_up_left: None,
            brow_outer_up_right: None,
            eye_squint_left: None,
            eye_squint_right: None,
        }
    }
}

/// A discrete, debounced symptom occurrence. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomEvent {
    /// Unique event identifier
    pub id: Uuid,
    /// When the event was accepted
    pub timestamp: DateTime<Utc>,
    /// Symptom kind
    pub kind: SymptomKind,
    /// Derived intensity score
    pub intensity: i32,
    /// Free-form notes (reserved, currently always empty)
    pub notes: String,
    /// Suspected trigger (reserved, currently always absent)
    pub trigger: Option<String>,
}

impl SymptomEvent {
    /// Create a new event with a fresh identifier
    pub fn new(timestamp: DateTime<Utc>, kind: SymptomKind, intensity: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            kind,
            intensity,
            notes: String::new(),
            trigger: None,
        }
    }
}

/// Summary of one completed exercise run. Created exactly once per session,
/// immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSession {
    /// Unique session identifier
    pub id: Uuid,
    /// Completion time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Configured duration in seconds (not elapsed wall-clock)
    pub duration_sec: u32,
    /// Blink events accepted during the session
    pub blink_count: u32,
    /// Twitch events accepted during the session
    pub twitch_count: u32,
    /// Whether sustained eye strain was observed at any point
    pub eye_strain_detected: bool,
}

/// Exercise lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Running,
    Stopped,
}

/// Read-only snapshot of the published engine state.
///
/// `revision` increases monotonically on every observable mutation, so a host
/// can poll cheaply and re-render only when it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    /// Change counter, bumped on every observable mutation
    pub revision: u64,
    /// Current lifecycle phase
    pub phase: SessionPhase,
    /// True iff the phase is `Running`
    pub is_exercise_active: bool,
    /// Blinks accepted since the last session start
    pub blink_count: u32,
    /// Twitches accepted since the last session start
    pub twitch_count: u32,
    /// Sticky strain flag for the current session
    pub eye_strain_detected: bool,
    /// Seconds left on the countdown
    pub remaining_sec: u32,
    /// Configured exercise duration in seconds
    pub exercise_duration_sec: u32,
}

/// Post-session findings derived from a completed session summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAssessment {
    /// Blink count exceeded the excessive-blinking threshold
    pub excessive_blinking: bool,
    /// Twitch count exceeded the eyebrow-twitching threshold
    pub eyebrow_twitching: bool,
    /// Eye strain was flagged during the session
    pub eye_strain: bool,
}

/// Supported exercise durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPreset {
    /// 30 seconds
    Short,
    /// 60 seconds
    Standard,
    /// 120 seconds
    Extended,
}

impl DurationPreset {
    /// Duration in seconds
    pub fn seconds(&self) -> u32 {
        match self {
            DurationPreset::Short => 30,
            DurationPreset::Standard => 60,
            DurationPreset::Extended => 120,
        }
    }

    /// Map raw seconds back to a preset, if one matches
    pub fn try_from_seconds(seconds: u32) -> Option<Self> {
        match seconds {
            30 => Some(DurationPreset::Short),
            60 => Some(DurationPreset::Standard),
            120 => Some(DurationPreset::Extended),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symptom_kind_serialization() {
        let kind = SymptomKind::Twitch;
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"twitch\"");

        let parsed: SymptomKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, SymptomKind::Twitch);
    }

    #[test]
    fn test_frame_sample_partial_deserialization() {
        let json = r#"{
            "timestamp": "2025-03-01T09:00:00Z",
            "left_eye_blink": 0.55,
            "right_eye_blink": 0.62
        }"#;

        let sample: FrameSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.left_eye_blink, Some(0.55));
        assert_eq!(sample.right_eye_blink, Some(0.62));
        assert!(sample.brow_inner_up.is_none());
        assert!(sample.eye_squint_left.is_none());
    }

    #[test]
    fn test_symptom_event_reserved_fields() {
        let event = SymptomEvent::new(Utc::now(), SymptomKind::Blink, 55);
        assert!(event.notes.is_empty());
        assert!(event.trigger.is_none());
    }

    #[test]
    fn test_duration_preset_round_trip() {
        for preset in [
            DurationPreset::Short,
            DurationPreset::Standard,
            DurationPreset::Extended,
        ] {
            assert_eq!(DurationPreset::try_from_seconds(preset.seconds()), Some(preset));
        }
        assert_eq!(DurationPreset::try_from_seconds(45), None);
    }
}
