//! Scored results: per-stroke and per-session

use serde::{Deserialize, Serialize};

use super::speech::SpeechOutcome;

/// The immutable outcome of one scored stroke attempt
///
/// Computed once when the attempt resolves and appended to the session
/// history; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeResult {
    /// 1-based index of the stroke within the character
    pub index: u32,
    /// Geometric similarity to the reference path, [0, 100]
    pub shape_score: f64,
    /// Temporal overlap of drawing and speaking, [0, 100]
    pub concurrency_score: f64,
    /// How the naming attempt resolved (never `Pending`)
    pub speech: SpeechOutcome,
    /// Whether the user produced any utterance for this stroke
    pub speech_attempted: bool,
}

/// Rendering classification for a drawn stroke
///
/// A pure function of shape accuracy alone; naming and timing do not
/// affect the color a stroke is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeClassification {
    Acceptable,
    NeedsRevision,
}

/// Aggregate score for one full character attempt
///
/// Derived on demand from the recorded stroke history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionScore {
    /// Mean shape accuracy over recorded strokes, [0, 100]
    pub shape_accuracy: f64,
    /// Fraction of recorded strokes with a matched name, as [0, 100]
    pub naming_correctness: f64,
    /// Mean concurrency over strokes that had a speech attempt, [0, 100]
    pub concurrency: f64,
    /// Weighted overall score, [0, 100]
    pub overall: f64,
    /// Strokes actually recorded
    pub recorded: usize,
    /// Strokes the character expects
    pub expected: usize,
    /// Human-readable qualitative summary
    pub summary: String,
}

impl SessionScore {
    /// Completion ratio recorded/expected in [0, 1]; 1.0 when nothing was expected
    pub fn completion_ratio(&self) -> f64 {
        if self.expected == 0 {
            1.0
        } else {
            self.recorded as f64 / self.expected as f64
        }
    }
}
