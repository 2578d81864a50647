//! Per-stroke attempt state machine
//!
//! Drawing and speech arrive on independent, unordered timelines. The
//! machine fuses them for exactly one stroke index at a time and decides
//! when enough information exists to score. By the time an attempt is
//! ready, its speech field is always resolved; a truly pending speech
//! state can never reach the scorer.

use tracing::{debug, warn};

use crate::error::AttemptError;
use crate::types::{DrawnStrokeSample, SpeechOutcome, SpeechSegment};

/// How much longer than the grace period to wait once an utterance has
/// started but not yet finalized
pub(crate) const FINALIZE_GRACE_FACTOR: u64 = 4;

fn naming_outcome(segment: &SpeechSegment) -> SpeechOutcome {
    if segment.matches_expected {
        SpeechOutcome::Matched
    } else {
        SpeechOutcome::NotMatched {
            heard: Some(segment.transcript.clone()),
        }
    }
}

/// Lifecycle of one stroke attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptState {
    /// Waiting for the pen path
    AwaitingDraw,
    /// Path captured; waiting for speech, a timeout, or a speech failure
    AwaitingSpeech {
        sample: DrawnStrokeSample,
        /// Whether an utterance start has been detected
        speech_started: bool,
        /// Session time after which the attempt resolves without speech
        deadline_ms: u64,
    },
    /// All inputs resolved; the attempt can be scored
    Ready(ReadyAttempt),
}

/// A fully resolved attempt, ready for the scorers
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyAttempt {
    pub sample: DrawnStrokeSample,
    /// Resolved naming outcome, never `Pending`
    pub speech: SpeechOutcome,
    /// Whether the user produced a scored utterance
    pub speech_attempted: bool,
    /// Utterance interval when one was heard
    pub speech_interval: Option<(u64, u64)>,
}

/// State machine fusing draw and speech events for a single stroke index
///
/// Speech normally begins while the pen is still down, so utterance
/// activity observed in `AwaitingDraw` is buffered and applied once the
/// pen path arrives.
#[derive(Debug, Clone)]
pub struct StrokeAttempt {
    index: u32,
    grace_ms: u64,
    state: AttemptState,
    /// An utterance started while the pen was still down
    pending_speech_started: bool,
    /// A transcription finalized while the pen was still down
    pending_segment: Option<SpeechSegment>,
}

impl StrokeAttempt {
    /// Open an attempt for a stroke index
    pub fn new(index: u32, grace_ms: u64) -> Self {
        Self {
            index,
            grace_ms,
            state: AttemptState::AwaitingDraw,
            pending_speech_started: false,
            pending_segment: None,
        }
    }

    /// The stroke index this attempt is open for
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    /// The session time at which the speech wait expires, if waiting
    pub fn deadline_ms(&self) -> Option<u64> {
        match &self.state {
            AttemptState::AwaitingSpeech { deadline_ms, .. } => Some(*deadline_ms),
            _ => None,
        }
    }

    /// Accept the captured pen path for this stroke
    ///
    /// An empty path invalidates the attempt: the state stays
    /// `AwaitingDraw` for the same index and the user must redraw. A
    /// sample for any other index is stale and rejected.
    pub fn on_draw_finished(&mut self, sample: DrawnStrokeSample) -> Result<(), AttemptError> {
        if sample.index != self.index {
            warn!(
                got = sample.index,
                open = self.index,
                "dropping stroke sample for wrong index"
            );
            return Err(AttemptError::StaleIndex {
                got: sample.index,
                open: self.index,
            });
        }
        if !matches!(self.state, AttemptState::AwaitingDraw) {
            warn!(
                index = self.index,
                "dropping duplicate stroke sample while attempt is in flight"
            );
            return Err(AttemptError::StaleIndex {
                got: sample.index,
                open: self.index,
            });
        }
        if sample.is_empty() {
            debug!(index = self.index, "empty stroke sample, attempt reset");
            return Err(AttemptError::EmptyStroke { index: self.index });
        }

        let mut speech_started = std::mem::take(&mut self.pending_speech_started);
        if let Some(segment) = self.pending_segment.take() {
            // A transcription that concluded before the pen even went
            // down belongs to an earlier stroke, not this one
            if segment.end_ms >= sample.started_ms {
                self.state = AttemptState::Ready(ReadyAttempt {
                    sample,
                    speech: naming_outcome(&segment),
                    speech_attempted: true,
                    speech_interval: Some((segment.start_ms, segment.end_ms)),
                });
                return Ok(());
            }
            debug!(index = self.index, "dropping buffered transcription from before pen-down");
            speech_started = false;
        }

        let factor = if speech_started { FINALIZE_GRACE_FACTOR } else { 1 };
        let deadline_ms = sample.ended_ms + self.grace_ms * factor;
        self.state = AttemptState::AwaitingSpeech {
            sample,
            speech_started,
            deadline_ms,
        };
        Ok(())
    }

    /// Note that an utterance has started
    ///
    /// Extends the deadline so a slow transcription of a real utterance
    /// is not cut off by the short no-speech grace period. Before the
    /// pen path arrives the start is remembered and the extension is
    /// applied at pen-up.
    pub fn on_speech_started(&mut self, _at_ms: u64) {
        match &mut self.state {
            AttemptState::AwaitingDraw => {
                self.pending_speech_started = true;
            }
            AttemptState::AwaitingSpeech {
                sample,
                speech_started,
                deadline_ms,
            } => {
                *speech_started = true;
                *deadline_ms = sample.ended_ms + self.grace_ms * FINALIZE_GRACE_FACTOR;
            }
            AttemptState::Ready(_) => {}
        }
    }

    /// Accept a finalized transcription
    ///
    /// While the pen is still down the segment is buffered until the
    /// path arrives. A late result for an already-resolved stroke is
    /// rejected; it must never merge into the next one.
    pub fn on_speech_finalized(&mut self, segment: SpeechSegment) -> Result<(), AttemptError> {
        let sample = match &self.state {
            AttemptState::AwaitingDraw => {
                self.pending_speech_started = false;
                self.pending_segment = Some(segment);
                return Ok(());
            }
            AttemptState::AwaitingSpeech { sample, .. } => sample.clone(),
            AttemptState::Ready(_) => {
                debug!(index = self.index, "dropping late speech result");
                return Err(AttemptError::NotOpen);
            }
        };

        self.state = AttemptState::Ready(ReadyAttempt {
            sample,
            speech: naming_outcome(&segment),
            speech_attempted: true,
            speech_interval: Some((segment.start_ms, segment.end_ms)),
        });
        Ok(())
    }

    /// The speech subsystem errored or is unavailable
    ///
    /// The attempt still resolves; the stroke is scored on shape alone
    /// with a zero concurrency score.
    pub fn on_speech_failed(&mut self) {
        if let AttemptState::AwaitingSpeech { sample, .. } = &self.state {
            let sample = sample.clone();
            self.state = AttemptState::Ready(ReadyAttempt {
                sample,
                speech: SpeechOutcome::Unavailable,
                speech_attempted: false,
                speech_interval: None,
            });
        }
    }

    /// The grace period expired
    ///
    /// No utterance started: the user simply did not speak, a real
    /// not-matched outcome. An utterance started but never finalized:
    /// the subsystem failed to deliver, surfaced as unavailable.
    pub fn on_grace_elapsed(&mut self, now_ms: u64) {
        let AttemptState::AwaitingSpeech {
            sample,
            speech_started,
            deadline_ms,
        } = &self.state
        else {
            return;
        };
        if now_ms < *deadline_ms {
            return;
        }
        let sample = sample.clone();

        let (speech, attempted) = if *speech_started {
            debug!(index = self.index, "utterance never finalized, treating speech as unavailable");
            (SpeechOutcome::Unavailable, false)
        } else {
            (SpeechOutcome::NotMatched { heard: None }, false)
        };
        self.state = AttemptState::Ready(ReadyAttempt {
            sample,
            speech,
            speech_attempted: attempted,
            speech_interval: None,
        });
    }

    /// Take the resolved attempt out of the machine, if ready
    pub fn take_ready(&mut self) -> Option<ReadyAttempt> {
        if matches!(self.state, AttemptState::Ready(_)) {
            let state = std::mem::replace(&mut self.state, AttemptState::AwaitingDraw);
            if let AttemptState::Ready(ready) = state {
                debug_assert!(ready.speech.is_resolved());
                return Some(ready);
            }
        }
        None
    }
}
