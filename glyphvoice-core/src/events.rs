//! Event type definitions
//!
//! The core consumes input events from the drawing and speech
//! collaborators over a single channel and publishes output events for
//! the rendering collaborator. Both sides are plain data; no callback
//! objects cross the boundary.

use serde::{Deserialize, Serialize};

use crate::feedback::StrokeFeedback;
use crate::types::{ExpectedStroke, Point, SessionScore, StrokeResult};

/// Events emitted by the capture collaborators (normalized)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Pen touched down for the current stroke
    StrokeBegin { at_ms: u64 },

    /// Pen lifted; the full captured path for one attempt
    StrokeEnd {
        index: u32,
        points: Vec<Point>,
        started_ms: u64,
        ended_ms: u64,
    },

    /// The speech engine detected the start of an utterance
    SpeechStarted { at_ms: u64 },

    /// A finalized transcription arrived
    SpeechFinalized {
        transcript: String,
        matches_expected: bool,
        confidence: f32,
        start_ms: u64,
        end_ms: u64,
    },

    /// The speech engine reported an error for this utterance
    SpeechError,

    /// The speech engine is not available at all
    SpeechUnavailable,

    /// The user switched to a new character; drop everything in flight
    CharacterSelected { strokes: Vec<ExpectedStroke> },
}

/// Why an input event was rejected instead of scored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The drawn path contained no points; the stroke must be redrawn
    EmptyStroke,
    /// The event's stroke index did not match the open attempt
    StaleIndex,
    /// A result for this index was already recorded
    DuplicateIndex,
}

/// Events published by the engine for UI collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    /// One stroke attempt was scored
    StrokeScored {
        result: StrokeResult,
        feedback: StrokeFeedback,
    },

    /// An attempt's input was rejected; the open index is unchanged
    AttemptRejected { index: u32, reason: RejectReason },

    /// The last expected stroke was scored; the character is done
    CharacterComplete { score: SessionScore },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_event_serialization_roundtrip() {
        let events = vec![
            InputEvent::StrokeBegin { at_ms: 10 },
            InputEvent::StrokeEnd {
                index: 1,
                points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
                started_ms: 10,
                ended_ms: 420,
            },
            InputEvent::SpeechStarted { at_ms: 50 },
            InputEvent::SpeechFinalized {
                transcript: "one".to_string(),
                matches_expected: true,
                confidence: 0.92,
                start_ms: 50,
                end_ms: 400,
            },
            InputEvent::SpeechError,
            InputEvent::SpeechUnavailable,
        ];
        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let parsed: InputEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event, parsed);
        }
    }

    #[test]
    fn input_event_uses_snake_case_tags() {
        let json = serde_json::to_string(&InputEvent::SpeechUnavailable).unwrap();
        assert!(json.contains("speech_unavailable"));
    }

    #[test]
    fn reject_reason_serialization_roundtrip() {
        for reason in [
            RejectReason::EmptyStroke,
            RejectReason::StaleIndex,
            RejectReason::DuplicateIndex,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            let parsed: RejectReason = serde_json::from_str(&json).unwrap();
            assert_eq!(reason, parsed);
        }
    }
}
