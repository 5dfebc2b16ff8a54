//! Ocusense - On-device detection engine for ocular symptom events
//!
//! Ocusense turns a continuous stream of per-frame facial-expression
//! intensities into discrete, debounced symptom events (blinks, eyebrow
//! twitches, eye-strain onset) and aggregates them into countdown-driven
//! exercise-session summaries.
//!
//! ## Pipeline
//!
//! Frame samples flow through stateless classification → per-kind debouncing
//! → bounded symptom logs, with session lifecycle and counters owned by a
//! single controller. Camera capture and blend-shape extraction live in the
//! host; the engine only consumes [`types::FrameSample`]s pushed through the
//! [`capability::FrameSink`] seam.

pub mod capability;
pub mod config;
pub mod debounce;
pub mod detector;
pub mod error;
pub mod history;
pub mod report;
pub mod session;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use capability::{AlwaysAvailable, FrameSink, TrackingCapability};
pub use config::DetectorConfig;
pub use debounce::EventDebouncer;
pub use detector::{FrameOutcome, SymptomDetector};
pub use error::EngineError;
pub use history::{SessionHistory, SymptomLog};
pub use report::{ReportEncoder, SessionReport};
pub use session::SessionController;
pub use types::{
    DurationPreset, ExerciseSession, FrameSample, SessionAssessment, SessionPhase, SymptomEvent,
    SymptomKind, TrackingSnapshot,
};

/// Engine version embedded in all report payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "ocusense";
