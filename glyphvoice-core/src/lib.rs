//! glyphvoice-core - Stroke-and-speech practice scoring
//!
//! This crate scores a user's attempt at writing a pictographic
//! character stroke by stroke while speaking each stroke's name. Pen
//! paths and speech transcriptions arrive as independently timed events;
//! the engine fuses them per stroke, scores shape accuracy and temporal
//! overlap, and aggregates everything into a final character score.
//!
//! Rendering, pen capture, and the speech engine live outside this
//! crate; only their events cross the boundary.

pub mod attempt;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod feedback;
pub mod geometry;
pub mod session;
pub mod timing;
pub mod types;

pub use attempt::{AttemptState, StrokeAttempt};
pub use config::ScoringConfig;
pub use engine::{spawn_engine, EngineHandle};
pub use error::{AttemptError, ConfigError, GlyphvoiceError, SessionError};
pub use events::{InputEvent, OutputEvent, RejectReason};
pub use feedback::{feedback_for, StrokeFeedback};
pub use geometry::{score_shape, TRIVIAL_PATH_SCORE};
pub use session::SessionAggregator;
pub use timing::{concurrency_score, overlap_ratio};
pub use types::*;
