//! Detection configuration
//!
//! All thresholds and debounce intervals live here so they can be tuned
//! without touching the detection rules.

use serde::{Deserialize, Serialize};

/// Both eyelids must exceed this closure intensity to count as a blink
pub const DEFAULT_BLINK_THRESHOLD: f32 = 0.4;

/// Mean brow activation above this counts as a twitch
pub const DEFAULT_TWITCH_THRESHOLD: f32 = 0.3;

/// Mean eye closure/squint above this flags eye strain
pub const DEFAULT_STRAIN_THRESHOLD: f32 = 0.6;

/// Minimum gap between accepted blinks (milliseconds)
pub const DEFAULT_BLINK_DEBOUNCE_MS: i64 = 300;

/// Minimum gap between accepted twitches (milliseconds)
pub const DEFAULT_TWITCH_DEBOUNCE_MS: i64 = 500;

/// Entries retained per symptom log
pub const DEFAULT_LOG_CAPACITY: usize = 10;

/// Blink count above which a session is assessed as excessive blinking
pub const DEFAULT_EXCESSIVE_BLINK_COUNT: u32 = 10;

/// Twitch count above which a session is assessed as eyebrow twitching
pub const DEFAULT_EXCESSIVE_TWITCH_COUNT: u32 = 5;

/// Tunable parameters for symptom detection and session assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Per-eyelid closure threshold for blink candidates
    pub blink_threshold: f32,
    /// Mean brow activation threshold for twitch candidates
    pub twitch_threshold: f32,
    /// Mean eye closure/squint threshold for the strain flag
    pub strain_threshold: f32,
    /// Minimum interval between accepted blinks (ms)
    pub blink_debounce_ms: i64,
    /// Minimum interval between accepted twitches (ms)
    pub twitch_debounce_ms: i64,
    /// Bounded capacity of each symptom log
    pub log_capacity: usize,
    /// Session blink count considered excessive
    pub excessive_blink_count: u32,
    /// Session twitch count considered excessive
    pub excessive_twitch_count: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            blink_threshold: DEFAULT_BLINK_THRESHOLD,
            twitch_threshold: DEFAULT_TWITCH_THRESHOLD,
            strain_threshold: DEFAULT_STRAIN_THRESHOLD,
            blink_debounce_ms: DEFAULT_BLINK_DEBOUNCE_MS,
            twitch_debounce_ms: DEFAULT_TWITCH_DEBOUNCE_MS,
            log_capacity: DEFAULT_LOG_CAPACITY,
            excessive_blink_count: DEFAULT_EXCESSIVE_BLINK_COUNT,
            excessive_twitch_count: DEFAULT_EXCESSIVE_TWITCH_COUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = DetectorConfig::default();
        assert_eq!(config.blink_threshold, DEFAULT_BLINK_THRESHOLD);
        assert_eq!(config.twitch_threshold, DEFAULT_TWITCH_THRESHOLD);
        assert_eq!(config.strain_threshold, DEFAULT_STRAIN_THRESHOLD);
        assert_eq!(config.blink_debounce_ms, DEFAULT_BLINK_DEBOUNCE_MS);
        assert_eq!(config.twitch_debounce_ms, DEFAULT_TWITCH_DEBOUNCE_MS);
        assert_eq!(config.log_capacity, DEFAULT_LOG_CAPACITY);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = DetectorConfig {
            blink_threshold: 0.5,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let loaded: DetectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.blink_threshold, 0.5);
        assert_eq!(loaded.twitch_debounce_ms, DEFAULT_TWITCH_DEBOUNCE_MS);
    }
}
