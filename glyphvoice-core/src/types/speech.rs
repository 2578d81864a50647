//! Speech transcription types
//!
//! The speech collaborator delivers finalized utterances with
//! millisecond word timings; the core never sees raw audio.

use serde::{Deserialize, Serialize};

/// A finalized utterance from the speech collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSegment {
    /// What the engine heard
    pub transcript: String,
    /// Whether the transcript matched the expected stroke name
    pub matches_expected: bool,
    /// Engine confidence in [0, 1]
    pub confidence: f32,
    /// Utterance start, session-relative milliseconds
    pub start_ms: u64,
    /// Utterance end, session-relative milliseconds
    pub end_ms: u64,
}

/// Resolution of the naming attempt for one stroke
///
/// `Pending` exists only while an attempt is open; a finalized
/// [`StrokeResult`](crate::types::StrokeResult) never carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SpeechOutcome {
    /// Speech has not resolved yet
    Pending,
    /// The user said the expected stroke name
    Matched,
    /// The user said something else, or said nothing before the deadline
    NotMatched {
        /// The transcript, when an utterance was heard at all
        heard: Option<String>,
    },
    /// The speech engine errored or was never available
    Unavailable,
}

impl SpeechOutcome {
    /// Whether this outcome is resolved (anything but `Pending`)
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched)
    }
}
