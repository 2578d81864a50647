//! Session aggregation and final scoring
//!
//! The aggregator owns the ordered stroke history for one character
//! attempt. Results are append-only; the final score is derived from the
//! history on demand and the whole aggregator is replaced wholesale when
//! a new character is selected.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ScoringConfig;
use crate::error::SessionError;
use crate::types::{
    ExpectedStroke, SessionScore, StrokeClassification, StrokeResult,
};

/// Weight of shape accuracy in the overall score
const SHAPE_WEIGHT: f64 = 0.5;
/// Weight of naming correctness in the overall score
const NAMING_WEIGHT: f64 = 0.3;
/// Weight of concurrency in the overall score
const CONCURRENCY_WEIGHT: f64 = 0.2;

/// Completion ratio below which the summary adds encouragement
const LOW_COMPLETION_RATIO: f64 = 0.5;

/// Owns the stroke history for one character attempt
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    id: Uuid,
    started_at: DateTime<Utc>,
    strokes: Vec<ExpectedStroke>,
    results: Vec<StrokeResult>,
    config: ScoringConfig,
}

impl SessionAggregator {
    /// Start a session for a character's expected strokes
    pub fn new(strokes: Vec<ExpectedStroke>, config: ScoringConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            strokes,
            results: Vec::new(),
            config,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Look up the reference stroke for a 1-based index
    pub fn expected(&self, index: u32) -> Option<&ExpectedStroke> {
        self.strokes.iter().find(|s| s.order == index)
    }

    /// Number of strokes the character expects
    pub fn expected_count(&self) -> usize {
        self.strokes.len()
    }

    /// Number of results recorded so far
    pub fn recorded_count(&self) -> usize {
        self.results.len()
    }

    /// Whether every expected stroke has a recorded result
    pub fn is_complete(&self) -> bool {
        self.results.len() >= self.strokes.len()
    }

    /// The recorded history, in recording order
    pub fn results(&self) -> &[StrokeResult] {
        &self.results
    }

    /// Append a stroke result to the history
    ///
    /// Each index may be scored at most once per character attempt; a
    /// duplicate is logged and rejected, never a crash.
    pub fn record(&mut self, result: StrokeResult) -> Result<(), SessionError> {
        if self.results.iter().any(|r| r.index == result.index) {
            warn!(index = result.index, "duplicate stroke result ignored");
            return Err(SessionError::DuplicateIndex(result.index));
        }
        debug!(
            index = result.index,
            shape = result.shape_score,
            concurrency = result.concurrency_score,
            "stroke result recorded"
        );
        self.results.push(result);
        Ok(())
    }

    /// Classify a recorded stroke for rendering
    ///
    /// Depends on shape accuracy alone; naming and timing are
    /// deliberately ignored so a well-drawn silent stroke renders as
    /// acceptable.
    pub fn classification(&self, index: u32) -> Option<StrokeClassification> {
        self.results
            .iter()
            .find(|r| r.index == index)
            .map(|r| self.classify_shape(r.shape_score))
    }

    fn classify_shape(&self, shape_score: f64) -> StrokeClassification {
        if shape_score < self.config.revision_threshold {
            StrokeClassification::NeedsRevision
        } else {
            StrokeClassification::Acceptable
        }
    }

    /// Compute the aggregate score for whatever has been recorded
    ///
    /// Lenient on partial completion: scores the recorded strokes and
    /// reports the completion ratio instead of failing. Zero recorded
    /// strokes produce an all-zero score with a no-data summary.
    pub fn final_score(&self) -> SessionScore {
        let recorded = self.results.len();
        let expected = self.strokes.len();

        if recorded == 0 {
            return SessionScore {
                shape_accuracy: 0.0,
                naming_correctness: 0.0,
                concurrency: 0.0,
                overall: 0.0,
                recorded,
                expected,
                summary: "No strokes were recorded for this character yet.".to_string(),
            };
        }

        let shape_accuracy =
            self.results.iter().map(|r| r.shape_score).sum::<f64>() / recorded as f64;

        let matched = self.results.iter().filter(|r| r.speech.is_matched()).count();
        let naming_correctness = matched as f64 / recorded as f64 * 100.0;

        let spoken: Vec<&StrokeResult> =
            self.results.iter().filter(|r| r.speech_attempted).collect();
        let concurrency = if spoken.is_empty() {
            0.0
        } else {
            spoken.iter().map(|r| r.concurrency_score).sum::<f64>() / spoken.len() as f64
        };

        let overall = (SHAPE_WEIGHT * shape_accuracy
            + NAMING_WEIGHT * naming_correctness
            + CONCURRENCY_WEIGHT * concurrency)
            .clamp(0.0, 100.0);

        let summary = self.summary_text(
            recorded,
            expected,
            shape_accuracy,
            matched,
            concurrency,
            !spoken.is_empty(),
        );

        SessionScore {
            shape_accuracy,
            naming_correctness,
            concurrency,
            overall,
            recorded,
            expected,
            summary,
        }
    }

    fn summary_text(
        &self,
        recorded: usize,
        expected: usize,
        shape_accuracy: f64,
        matched: usize,
        concurrency: f64,
        any_speech: bool,
    ) -> String {
        let mut lines = Vec::new();
        lines.push(format!("You completed {recorded} of {expected} strokes."));

        if shape_accuracy >= 90.0 {
            lines.push("Your stroke shapes look excellent.".to_string());
        } else if shape_accuracy >= 70.0 {
            lines.push("Your stroke shapes are coming along well.".to_string());
        } else {
            lines.push("Keep practicing the stroke shapes.".to_string());
        }

        lines.push(format!("You named {matched} of {recorded} strokes correctly."));

        if any_speech {
            if concurrency >= 70.0 {
                lines.push("Your speaking and drawing were well synchronized.".to_string());
            } else {
                lines.push("Try to say each name while the pen is moving.".to_string());
            }
        }

        let ratio = if expected == 0 {
            1.0
        } else {
            recorded as f64 / expected as f64
        };
        if ratio < LOW_COMPLETION_RATIO {
            lines.push("Good start! Try to finish the whole character next time.".to_string());
        }

        lines.join(" ")
    }

    /// Replace everything for a new character
    ///
    /// Drops the full history and the session identity; nothing from the
    /// previous character survives.
    pub fn reset(&mut self, strokes: Vec<ExpectedStroke>) {
        debug!(session = %self.id, "session reset for new character");
        *self = SessionAggregator::new(strokes, self.config.clone());
    }
}
