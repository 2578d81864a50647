//! Categorical per-stroke feedback
//!
//! Maps a scored result onto three independent human-readable messages.
//! Bands are fixed thresholds, monotonic in the score.

use serde::{Deserialize, Serialize};

use crate::types::{SpeechOutcome, StrokeResult};

/// Feedback messages for one scored stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeFeedback {
    /// Quality of the drawn shape
    pub shape: String,
    /// How the naming attempt went
    pub naming: String,
    /// Timing quality; absent when no utterance was scored
    pub timing: Option<String>,
}

/// Quality band for a [0, 100] score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Excellent,
    Good,
    Okay,
    NeedsWork,
}

fn band(score: f64) -> Band {
    if score >= 90.0 {
        Band::Excellent
    } else if score >= 70.0 {
        Band::Good
    } else if score >= 50.0 {
        Band::Okay
    } else {
        Band::NeedsWork
    }
}

/// Generate feedback for a stroke result
pub fn feedback_for(result: &StrokeResult) -> StrokeFeedback {
    StrokeFeedback {
        shape: shape_message(result.shape_score),
        naming: naming_message(&result.speech),
        timing: timing_message(result),
    }
}

fn shape_message(score: f64) -> String {
    match band(score) {
        Band::Excellent => "Excellent stroke shape!".to_string(),
        Band::Good => "Good stroke shape.".to_string(),
        Band::Okay => "Okay shape, trace the example more closely.".to_string(),
        Band::NeedsWork => "The shape needs work, try following the guide.".to_string(),
    }
}

fn naming_message(speech: &SpeechOutcome) -> String {
    match speech {
        SpeechOutcome::Matched => "You said the right stroke name.".to_string(),
        SpeechOutcome::NotMatched { heard: Some(text) } => {
            format!("Heard \"{text}\", but that's not this stroke's name.")
        }
        SpeechOutcome::NotMatched { heard: None } => {
            "Say the stroke name while you draw.".to_string()
        }
        SpeechOutcome::Unavailable => {
            "Couldn't listen for the stroke name this time.".to_string()
        }
        // A finalized result never carries Pending
        SpeechOutcome::Pending => "Still listening...".to_string(),
    }
}

fn timing_message(result: &StrokeResult) -> Option<String> {
    if !result.speech_attempted {
        return None;
    }
    let text = match band(result.concurrency_score) {
        Band::Excellent => "Perfectly in sync with your pen.",
        Band::Good => "Nicely timed with the stroke.",
        Band::Okay => "Try to speak while the pen is moving.",
        Band::NeedsWork => "Speak and draw at the same time.",
    };
    Some(text.to_string())
}
