//! Event debouncing
//!
//! Sustained high intensity across consecutive tracking frames produces one
//! physiological event, not many. The debouncer suppresses re-detections by
//! enforcing a minimum interval between accepted events of the same kind.

use crate::config::DetectorConfig;
use crate::types::{SymptomEvent, SymptomKind};
use chrono::{DateTime, Duration, Utc};

/// Rate limiter for symptom events, one minimum interval per kind.
///
/// Purely a decision function: it inspects the most recent logged event of a
/// kind and the candidate timestamp, and never mutates anything itself.
#[derive(Debug, Clone)]
pub struct EventDebouncer {
    min_blink_gap: Duration,
    min_twitch_gap: Duration,
}

impl EventDebouncer {
    /// Build a debouncer from the configured per-kind intervals
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            min_blink_gap: Duration::milliseconds(config.blink_debounce_ms),
            min_twitch_gap: Duration::milliseconds(config.twitch_debounce_ms),
        }
    }

    /// Minimum interval between accepted events of the given kind
    pub fn min_interval(&self, kind: SymptomKind) -> Duration {
        match kind {
            SymptomKind::Blink => self.min_blink_gap,
            SymptomKind::Twitch => self.min_twitch_gap,
        }
    }

    /// Decide whether a candidate detection at `now` is a genuinely separate
    /// occurrence. Accepts when no prior event of the kind exists, or when the
    /// gap since the last accepted event exceeds the kind's minimum interval.
    pub fn accept(
        &self,
        kind: SymptomKind,
        now: DateTime<Utc>,
        last: Option<&SymptomEvent>,
    ) -> bool {
        match last {
            None => true,
            Some(event) => now - event.timestamp > self.min_interval(kind),
        }
    }
}

impl Default for EventDebouncer {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}
