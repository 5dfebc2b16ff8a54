//! Exercise session lifecycle
//!
//! The controller is the single owner of all mutable engine state: the
//! lifecycle phase machine, the countdown, the per-session counters, the
//! symptom logs, and the session history. Every mutation goes through
//! `&mut self` on one serialized context; the outside world reads snapshots.
//!
//! The 1-second cadence is supplied by the host scheduler calling
//! [`SessionController::tick`]. Cancellation is the phase gate itself: ticks
//! and frames outside `Running` are no-ops, so a late callback after stop can
//! never mutate a finished session.

use crate::capability::{FrameSink, TrackingCapability};
use crate::config::DetectorConfig;
use crate::debounce::EventDebouncer;
use crate::detector::SymptomDetector;
use crate::error::EngineError;
use crate::history::{SessionHistory, SymptomLog};
use crate::types::{
    DurationPreset, ExerciseSession, FrameSample, SessionAssessment, SessionPhase, SymptomEvent,
    SymptomKind, TrackingSnapshot,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Countdown-driven exercise session controller and detection state owner
pub struct SessionController {
    config: DetectorConfig,
    debouncer: EventDebouncer,
    capability: Box<dyn TrackingCapability>,

    phase: SessionPhase,
    duration_sec: u32,
    remaining_sec: u32,
    blink_count: u32,
    twitch_count: u32,
    eye_strain_detected: bool,

    blink_log: SymptomLog,
    twitch_log: SymptomLog,
    history: SessionHistory,

    revision: u64,
}

impl SessionController {
    /// Create a controller with default configuration and the shortest
    /// duration preset
    pub fn new(capability: Box<dyn TrackingCapability>) -> Self {
        Self::with_config(capability, DetectorConfig::default())
    }

    /// Create a controller with a specific detection configuration
    pub fn with_config(capability: Box<dyn TrackingCapability>, config: DetectorConfig) -> Self {
        let debouncer = EventDebouncer::from_config(&config);
        let log_capacity = config.log_capacity;
        Self {
            config,
            debouncer,
            capability,
            phase: SessionPhase::Idle,
            duration_sec: DurationPreset::Short.seconds(),
            remaining_sec: 0,
            blink_count: 0,
            twitch_count: 0,
            eye_strain_detected: false,
            blink_log: SymptomLog::new(log_capacity),
            twitch_log: SymptomLog::new(log_capacity),
            history: SessionHistory::new(),
            revision: 0,
        }
    }

    /// Select the exercise duration. Takes effect at the next `start`.
    pub fn configure_duration(&mut self, preset: DurationPreset) {
        self.duration_sec = preset.seconds();
        self.bump();
    }

    /// Begin a session: reset counters and the strain flag, arm the
    /// countdown, and acquire the tracking capability.
    ///
    /// Refused without any state change when the capability reports itself
    /// unavailable. Starting while a session is running performs the same
    /// reset; the aborted run is not recorded.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if !self.capability.is_available() {
            return Err(EngineError::CapabilityUnavailable);
        }

        self.capability.acquire();
        self.blink_count = 0;
        self.twitch_count = 0;
        self.eye_strain_detected = false;
        self.remaining_sec = self.duration_sec;
        self.phase = SessionPhase::Running;
        self.bump();
        Ok(())
    }

    /// Advance the countdown by one second. No-op outside `Running`.
    ///
    /// Returns the recorded session summary when the countdown reaches zero
    /// and the session stops automatically.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<&ExerciseSession> {
        if self.phase != SessionPhase::Running {
            return None;
        }

        if self.remaining_sec > 0 {
            self.remaining_sec -= 1;
            self.bump();
        }

        if self.remaining_sec == 0 {
            return self.stop(now);
        }
        None
    }

    /// End the running session: mark inactive, release the capability, and
    /// record the summary at the front of the history.
    ///
    /// Idempotent: stopping while not running is a no-op returning `None`.
    /// The phase flips before the capability is released, so frames the
    /// tracker delivers during teardown are already gated off.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<&ExerciseSession> {
        if self.phase != SessionPhase::Running {
            return None;
        }

        self.phase = SessionPhase::Stopped;
        self.capability.release();

        let session = ExerciseSession {
            id: Uuid::new_v4(),
            timestamp: now,
            duration_sec: self.duration_sec,
            blink_count: self.blink_count,
            twitch_count: self.twitch_count,
            eye_strain_detected: self.eye_strain_detected,
        };
        self.history.record(session);
        self.bump();
        self.history.latest()
    }

    /// Derive post-session findings from a completed summary
    pub fn assess(&self, session: &ExerciseSession) -> SessionAssessment {
        SessionAssessment {
            excessive_blinking: session.blink_count > self.config.excessive_blink_count,
            eyebrow_twitching: session.twitch_count > self.config.excessive_twitch_count,
            eye_strain: session.eye_strain_detected,
        }
    }

    /// Read-only snapshot of the published state
    pub fn snapshot(&self) -> TrackingSnapshot {
        TrackingSnapshot {
            revision: self.revision,
            phase: self.phase,
            is_exercise_active: self.is_exercise_active(),
            blink_count: self.blink_count,
            twitch_count: self.twitch_count,
            eye_strain_detected: self.eye_strain_detected,
            remaining_sec: self.remaining_sec,
            exercise_duration_sec: self.duration_sec,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_exercise_active(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn blink_log(&self) -> &SymptomLog {
        &self.blink_log
    }

    pub fn twitch_log(&self) -> &SymptomLog {
        &self.twitch_log
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Change counter; increases on every observable mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    fn log_symptom(&mut self, kind: SymptomKind, timestamp: DateTime<Utc>, intensity: i32) {
        let event = SymptomEvent::new(timestamp, kind, intensity);
        match kind {
            SymptomKind::Blink => {
                self.blink_count += 1;
                self.blink_log.push(event);
            }
            SymptomKind::Twitch => {
                self.twitch_count += 1;
                self.twitch_log.push(event);
            }
        }
    }
}

impl FrameSink for SessionController {
    /// Classify one frame and apply accepted detections.
    ///
    /// Frames arriving outside a running session are dropped, which also
    /// covers late tracker callbacks delivered during stop teardown.
    fn on_frame_sample(&mut self, sample: FrameSample) {
        if self.phase != SessionPhase::Running {
            return;
        }

        let outcome = SymptomDetector::classify(&sample, &self.config);
        let mut changed = false;

        if let Some(candidate) = outcome.blink {
            if self
                .debouncer
                .accept(SymptomKind::Blink, sample.timestamp, self.blink_log.latest())
            {
                self.log_symptom(SymptomKind::Blink, sample.timestamp, candidate.intensity);
                changed = true;
            }
        }

        if let Some(candidate) = outcome.twitch {
            if self.debouncer.accept(
                SymptomKind::Twitch,
                sample.timestamp,
                self.twitch_log.latest(),
            ) {
                self.log_symptom(SymptomKind::Twitch, sample.timestamp, candidate.intensity);
                changed = true;
            }
        }

        if outcome.eye_strain && !self.eye_strain_detected {
            self.eye_strain_detected = true;
            changed = true;
        }

        if changed {
            self.bump();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;
    use std::rc::Rc;

    struct StubCapability {
        available: bool,
        acquired: Rc<Cell<u32>>,
        released: Rc<Cell<u32>>,
    }

    impl StubCapability {
        fn available() -> Self {
            Self {
                available: true,
                acquired: Rc::new(Cell::new(0)),
                released: Rc::new(Cell::new(0)),
            }
        }

        fn unavailable() -> Self {
            Self {
                available: false,
                ..Self::available()
            }
        }
    }

    impl TrackingCapability for StubCapability {
        fn is_available(&self) -> bool {
            self.available
        }

        fn acquire(&mut self) {
            self.acquired.set(self.acquired.get() + 1);
        }

        fn release(&mut self) {
            self.released.set(self.released.get() + 1);
        }
    }

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn blink_sample(ms: i64, left: f32, right: f32) -> FrameSample {
        let mut sample = FrameSample::at(at_ms(ms));
        sample.left_eye_blink = Some(left);
        sample.right_eye_blink = Some(right);
        sample
    }

    fn controller() -> SessionController {
        SessionController::new(Box::new(StubCapability::available()))
    }

    #[test]
    fn test_start_refused_when_capability_unavailable() {
        let mut controller = SessionController::new(Box::new(StubCapability::unavailable()));
        let result = controller.start();

        assert!(matches!(result, Err(EngineError::CapabilityUnavailable)));
        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert!(!controller.is_exercise_active());
        assert!(controller.history().is_empty());
    }

    #[test]
    fn test_start_resets_counters_and_arms_countdown() {
        let mut controller = controller();
        controller.configure_duration(DurationPreset::Standard);
        controller.start().unwrap();

        controller.on_frame_sample(blink_sample(100, 0.5, 0.5));
        assert_eq!(controller.snapshot().blink_count, 1);

        controller.stop(at_ms(5_000));
        controller.start().unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.blink_count, 0);
        assert_eq!(snapshot.twitch_count, 0);
        assert!(!snapshot.eye_strain_detected);
        assert_eq!(snapshot.remaining_sec, 60);
        assert!(snapshot.is_exercise_active);
    }

    #[test]
    fn test_countdown_reaches_zero_and_stops() {
        let mut controller = controller();
        controller.configure_duration(DurationPreset::Short);
        controller.start().unwrap();

        let mut completed = None;
        for i in 1..=30 {
            if let Some(session) = controller.tick(at_ms(i * 1_000)) {
                completed = Some(session.clone());
            }
        }

        let session = completed.expect("countdown should complete the session");
        assert_eq!(session.duration_sec, 30);
        assert_eq!(controller.phase(), SessionPhase::Stopped);
        assert_eq!(controller.snapshot().remaining_sec, 0);
        // Further ticks are no-ops and record nothing
        assert!(controller.tick(at_ms(31_000)).is_none());
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn test_remaining_never_goes_negative() {
        let mut controller = controller();
        controller.start().unwrap();

        for i in 1..=100 {
            controller.tick(at_ms(i * 1_000));
        }
        assert_eq!(controller.snapshot().remaining_sec, 0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut controller = controller();
        controller.start().unwrap();

        assert!(controller.stop(at_ms(1_000)).is_some());
        assert!(controller.stop(at_ms(2_000)).is_none());
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn test_stop_releases_capability_after_marking_inactive() {
        let stub = StubCapability::available();
        let acquired = Rc::clone(&stub.acquired);
        let released = Rc::clone(&stub.released);

        let mut controller = SessionController::new(Box::new(stub));
        controller.start().unwrap();
        assert_eq!(acquired.get(), 1);

        controller.stop(at_ms(1_000));
        assert_eq!(released.get(), 1);

        // Redundant stop does not release again
        controller.stop(at_ms(2_000));
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_frames_ignored_when_not_running() {
        let mut controller = controller();
        controller.on_frame_sample(blink_sample(0, 0.9, 0.9));
        assert_eq!(controller.snapshot().blink_count, 0);

        controller.start().unwrap();
        controller.stop(at_ms(2_000));

        // Late frame after stop must not mutate the finished session's counters
        controller.on_frame_sample(blink_sample(2_100, 0.9, 0.9));
        assert_eq!(controller.snapshot().blink_count, 0);
        assert_eq!(controller.history().latest().unwrap().blink_count, 0);
    }

    #[test]
    fn test_session_summary_matches_counters_and_configured_duration() {
        let mut controller = controller();
        controller.configure_duration(DurationPreset::Extended);
        controller.start().unwrap();

        controller.on_frame_sample(blink_sample(100, 0.5, 0.5));
        controller.on_frame_sample(blink_sample(500, 0.6, 0.6));

        // Stop early: duration stays the configured value, not elapsed time
        let session = controller.stop(at_ms(3_000)).unwrap();
        assert_eq!(session.duration_sec, 120);
        assert_eq!(session.blink_count, 2);
        assert_eq!(session.twitch_count, 0);
        assert_eq!(session.timestamp, at_ms(3_000));
    }

    #[test]
    fn test_restart_while_running_records_no_session() {
        let mut controller = controller();
        controller.start().unwrap();
        controller.on_frame_sample(blink_sample(100, 0.5, 0.5));

        controller.start().unwrap();
        assert!(controller.history().is_empty());
        assert_eq!(controller.snapshot().blink_count, 0);
        assert!(controller.is_exercise_active());
    }

    #[test]
    fn test_strain_flag_is_monotonic_within_session() {
        let mut controller = controller();
        controller.start().unwrap();

        let mut strained = FrameSample::at(at_ms(100));
        strained.left_eye_blink = Some(0.8);
        strained.right_eye_blink = Some(0.8);
        strained.eye_squint_left = Some(0.7);
        strained.eye_squint_right = Some(0.7);
        controller.on_frame_sample(strained);
        assert!(controller.snapshot().eye_strain_detected);

        // Relaxed frames do not clear the flag
        let mut relaxed = FrameSample::at(at_ms(200));
        relaxed.left_eye_blink = Some(0.0);
        relaxed.right_eye_blink = Some(0.0);
        relaxed.eye_squint_left = Some(0.0);
        relaxed.eye_squint_right = Some(0.0);
        controller.on_frame_sample(relaxed);
        assert!(controller.snapshot().eye_strain_detected);

        // A new start does
        controller.stop(at_ms(1_000));
        controller.start().unwrap();
        assert!(!controller.snapshot().eye_strain_detected);
    }

    #[test]
    fn test_assessment_thresholds() {
        let controller = controller();
        let base = ExerciseSession {
            id: Uuid::new_v4(),
            timestamp: at_ms(0),
            duration_sec: 30,
            blink_count: 11,
            twitch_count: 6,
            eye_strain_detected: true,
        };

        let assessment = controller.assess(&base);
        assert!(assessment.excessive_blinking);
        assert!(assessment.eyebrow_twitching);
        assert!(assessment.eye_strain);

        let quiet = ExerciseSession {
            blink_count: 10,
            twitch_count: 5,
            eye_strain_detected: false,
            ..base
        };
        let assessment = controller.assess(&quiet);
        assert!(!assessment.excessive_blinking);
        assert!(!assessment.eyebrow_twitching);
        assert!(!assessment.eye_strain);
    }

    #[test]
    fn test_revision_advances_on_mutation() {
        let mut controller = controller();
        let initial = controller.revision();

        controller.configure_duration(DurationPreset::Standard);
        let configured = controller.revision();
        assert!(configured > initial);

        controller.start().unwrap();
        assert!(controller.revision() > configured);

        // A frame with nothing to report leaves the revision untouched
        let quiet = controller.revision();
        controller.on_frame_sample(FrameSample::at(at_ms(100)));
        assert_eq!(controller.revision(), quiet);
    }
}
