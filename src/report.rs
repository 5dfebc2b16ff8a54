//! Session report encoding
//!
//! Materializes the engine's published state into a versioned JSON payload
//! for the host UI layer: current snapshot, both symptom logs, and the
//! session history with per-session findings.

use crate::error::EngineError;
use crate::session::SessionController;
use crate::types::{ExerciseSession, SessionAssessment, SymptomEvent, TrackingSnapshot};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One completed session with its derived findings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub session: ExerciseSession,
    pub assessment: SessionAssessment,
}

/// Complete report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub generated_at_utc: String,
    pub snapshot: TrackingSnapshot,
    /// Recent blink events, newest first
    pub blink_log: Vec<SymptomEvent>,
    /// Recent twitch events, newest first
    pub twitch_log: Vec<SymptomEvent>,
    /// Completed sessions, newest first
    pub sessions: Vec<SessionEntry>,
}

/// Encoder producing report payloads for a controller
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build a report from the controller's published state
    pub fn encode(&self, controller: &SessionController, now: DateTime<Utc>) -> SessionReport {
        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let sessions = controller
            .history()
            .sessions()
            .iter()
            .map(|session| SessionEntry {
                session: session.clone(),
                assessment: controller.assess(session),
            })
            .collect();

        SessionReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            generated_at_utc: now.to_rfc3339(),
            snapshot: controller.snapshot(),
            blink_log: controller.blink_log().iter().cloned().collect(),
            twitch_log: controller.twitch_log().iter().cloned().collect(),
            sessions,
        }
    }

    /// Encode to a pretty JSON string
    pub fn encode_to_json(
        &self,
        controller: &SessionController,
        now: DateTime<Utc>,
    ) -> Result<String, EngineError> {
        let report = self.encode(controller, now);
        serde_json::to_string_pretty(&report).map_err(EngineError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::AlwaysAvailable;
    use crate::types::FrameSample;
    use chrono::TimeZone;

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn run_one_session() -> SessionController {
        let mut controller = SessionController::new(Box::new(AlwaysAvailable));
        controller.start().unwrap();

        let mut sample = FrameSample::at(at_ms(100));
        sample.left_eye_blink = Some(0.5);
        sample.right_eye_blink = Some(0.5);
        crate::capability::FrameSink::on_frame_sample(&mut controller, sample);

        controller.stop(at_ms(5_000));
        controller
    }

    #[test]
    fn test_report_contains_state_and_history() {
        let controller = run_one_session();
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&controller, at_ms(6_000));

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.blink_log.len(), 1);
        assert!(report.twitch_log.is_empty());
        assert_eq!(report.sessions.len(), 1);
        assert_eq!(report.sessions[0].session.blink_count, 1);
        assert!(!report.sessions[0].assessment.excessive_blinking);
    }

    #[test]
    fn test_report_json_shape() {
        let controller = run_one_session();
        let encoder = ReportEncoder::new();
        let json = encoder.encode_to_json(&controller, at_ms(6_000)).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["report_version"], REPORT_VERSION);
        assert_eq!(value["producer"]["name"], "ocusense");
        assert_eq!(value["snapshot"]["phase"], "stopped");
        assert_eq!(value["sessions"][0]["session"]["duration_sec"], 30);
    }
}
