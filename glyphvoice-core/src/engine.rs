//! Scoring engine event loop
//!
//! A single consumer task owns the aggregator and the open attempt, so
//! every mutation happens from one place and no locks are needed.
//! Collaborators push [`InputEvent`]s over an mpsc channel; scored
//! results come back on a broadcast channel. Shape scoring, the one
//! CPU-heavy step, runs on the blocking pool.

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, warn};

use crate::attempt::{AttemptState, ReadyAttempt, StrokeAttempt, FINALIZE_GRACE_FACTOR};
use crate::config::ScoringConfig;
use crate::error::AttemptError;
use crate::events::{InputEvent, OutputEvent, RejectReason};
use crate::feedback::feedback_for;
use crate::geometry::score_shape;
use crate::session::SessionAggregator;
use crate::timing::concurrency_score;
use crate::types::{DrawnStrokeSample, SpeechSegment, StrokeResult};

const INPUT_BUFFER: usize = 64;
const OUTPUT_BUFFER: usize = 64;

/// Handle to a running scoring engine
pub struct EngineHandle {
    events: mpsc::Sender<InputEvent>,
    output: broadcast::Sender<OutputEvent>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Push an input event to the engine
    pub async fn send(&self, event: InputEvent) -> Result<(), mpsc::error::SendError<InputEvent>> {
        self.events.send(event).await
    }

    /// Subscribe to engine output
    ///
    /// Subscribe before sending events; a broadcast receiver only sees
    /// events published after it was created.
    pub fn subscribe(&self) -> broadcast::Receiver<OutputEvent> {
        self.output.subscribe()
    }

    /// Close the input channel and wait for the loop to drain and exit
    pub async fn shutdown(self) {
        drop(self.events);
        let _ = self.task.await;
    }
}

/// The engine state owned by the consumer task
struct ScoringEngine {
    config: ScoringConfig,
    aggregator: SessionAggregator,
    attempt: Option<StrokeAttempt>,
    /// Wall-clock moment the current speech wait expires
    grace_deadline: Option<Instant>,
    output: broadcast::Sender<OutputEvent>,
}

impl ScoringEngine {
    /// Spawn the engine loop on the current runtime
    pub fn spawn(config: ScoringConfig) -> EngineHandle {
        let (events_tx, events_rx) = mpsc::channel(INPUT_BUFFER);
        let (output_tx, _) = broadcast::channel(OUTPUT_BUFFER);

        let engine = ScoringEngine {
            aggregator: SessionAggregator::new(Vec::new(), config.clone()),
            config,
            attempt: None,
            grace_deadline: None,
            output: output_tx.clone(),
        };
        let task = tokio::spawn(engine.run(events_rx));

        EngineHandle {
            events: events_tx,
            output: output_tx,
            task,
        }
    }

    async fn run(mut self, mut events: mpsc::Receiver<InputEvent>) {
        loop {
            let deadline = self.grace_deadline;
            tokio::select! {
                maybe_event = events.recv() => {
                    match maybe_event {
                        Some(event) => self.handle(event).await,
                        None => {
                            debug!("input channel closed, engine loop exiting");
                            break;
                        }
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.handle_grace_elapsed().await;
                }
            }
        }
    }

    async fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::CharacterSelected { strokes } => {
                // Full reset: in-flight attempt and history are dropped
                self.aggregator.reset(strokes);
                self.grace_deadline = None;
                self.attempt = if self.aggregator.expected_count() > 0 {
                    Some(StrokeAttempt::new(1, self.config.grace_ms))
                } else {
                    None
                };
            }
            InputEvent::StrokeBegin { at_ms } => {
                debug!(at_ms, "stroke began");
            }
            InputEvent::StrokeEnd {
                index,
                points,
                started_ms,
                ended_ms,
            } => {
                let sample = DrawnStrokeSample::new(index, points, started_ms, ended_ms);
                self.handle_stroke_end(sample).await;
            }
            InputEvent::SpeechStarted { at_ms } => {
                if let Some(attempt) = self.attempt.as_mut() {
                    attempt.on_speech_started(at_ms);
                    if attempt.deadline_ms().is_some() && self.grace_deadline.is_some() {
                        self.grace_deadline = Some(
                            Instant::now()
                                + Duration::from_millis(
                                    self.config.grace_ms * FINALIZE_GRACE_FACTOR,
                                ),
                        );
                    }
                }
            }
            InputEvent::SpeechFinalized {
                transcript,
                matches_expected,
                confidence,
                start_ms,
                end_ms,
            } => {
                let segment = SpeechSegment {
                    transcript,
                    matches_expected,
                    confidence,
                    start_ms,
                    end_ms,
                };
                if let Some(attempt) = self.attempt.as_mut() {
                    if attempt.on_speech_finalized(segment).is_ok() {
                        self.grace_deadline = None;
                        self.try_score().await;
                    }
                } else {
                    debug!("speech result with no open attempt, dropped");
                }
            }
            InputEvent::SpeechError | InputEvent::SpeechUnavailable => {
                if let Some(attempt) = self.attempt.as_mut() {
                    attempt.on_speech_failed();
                    self.grace_deadline = None;
                    self.try_score().await;
                }
            }
        }
    }

    async fn handle_stroke_end(&mut self, sample: DrawnStrokeSample) {
        let Some(attempt) = self.attempt.as_mut() else {
            warn!(index = sample.index, "stroke sample with no character selected, dropped");
            return;
        };
        let index = sample.index;
        match attempt.on_draw_finished(sample) {
            Ok(()) => {
                // A transcription buffered during the draw resolves the
                // attempt at pen-up; a remembered utterance start means
                // the finalize window applies from the beginning
                let wait_ms = match attempt.state() {
                    AttemptState::Ready(_) => None,
                    AttemptState::AwaitingSpeech {
                        speech_started: true,
                        ..
                    } => Some(self.config.grace_ms * FINALIZE_GRACE_FACTOR),
                    _ => Some(self.config.grace_ms),
                };
                match wait_ms {
                    Some(ms) => {
                        self.grace_deadline = Some(Instant::now() + Duration::from_millis(ms));
                    }
                    None => {
                        self.grace_deadline = None;
                        self.try_score().await;
                    }
                }
            }
            Err(AttemptError::EmptyStroke { index }) => {
                self.publish(OutputEvent::AttemptRejected {
                    index,
                    reason: RejectReason::EmptyStroke,
                });
            }
            Err(AttemptError::StaleIndex { got, .. }) => {
                self.publish(OutputEvent::AttemptRejected {
                    index: got,
                    reason: RejectReason::StaleIndex,
                });
            }
            Err(AttemptError::NotOpen) => {
                warn!(index, "stroke sample dropped, no attempt open");
            }
        }
    }

    async fn handle_grace_elapsed(&mut self) {
        self.grace_deadline = None;
        if let Some(attempt) = self.attempt.as_mut() {
            if let Some(deadline_ms) = attempt.deadline_ms() {
                attempt.on_grace_elapsed(deadline_ms);
                self.try_score().await;
            }
        }
    }

    /// Score and publish the open attempt if it has resolved
    async fn try_score(&mut self) {
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        let index = attempt.index();
        let Some(ready) = attempt.take_ready() else {
            return;
        };

        let Some(expected) = self.aggregator.expected(index).cloned() else {
            warn!(index, "resolved attempt has no reference stroke, dropped");
            return;
        };

        // Shape scoring is the CPU-heavy step; keep it off the loop
        let drawn = ready.sample.points.clone();
        let reference = expected.path.clone();
        let category = expected.category;
        let config = self.config.clone();
        let shape_score = tokio::task::spawn_blocking(move || {
            score_shape(&drawn, &reference, category, &config)
        })
        .await
        .unwrap_or_else(|e| {
            warn!(index, error = %e, "shape scoring task failed");
            0.0
        });

        let result = build_result(index, shape_score, &ready);
        let feedback = feedback_for(&result);

        if self.aggregator.record(result.clone()).is_err() {
            self.publish(OutputEvent::AttemptRejected {
                index,
                reason: RejectReason::DuplicateIndex,
            });
            return;
        }
        self.publish(OutputEvent::StrokeScored { result, feedback });

        // Advance to the next stroke or finish the character
        if self.aggregator.is_complete() {
            self.attempt = None;
            self.publish(OutputEvent::CharacterComplete {
                score: self.aggregator.final_score(),
            });
        } else {
            self.attempt = Some(StrokeAttempt::new(index + 1, self.config.grace_ms));
        }
    }

    fn publish(&self, event: OutputEvent) {
        // No subscribers is fine; results remain in the aggregator
        let _ = self.output.send(event);
    }
}

fn build_result(index: u32, shape_score: f64, ready: &ReadyAttempt) -> StrokeResult {
    let concurrency = concurrency_score(
        ready.sample.started_ms,
        ready.sample.ended_ms,
        ready.speech_interval,
    );
    StrokeResult {
        index,
        shape_score,
        concurrency_score: concurrency,
        speech: ready.speech.clone(),
        speech_attempted: ready.speech_attempted,
    }
}

/// Spawn a scoring engine with the given configuration
pub fn spawn_engine(config: ScoringConfig) -> EngineHandle {
    ScoringEngine::spawn(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExpectedStroke, Point, SpeechOutcome, StrokeCategory};

    /// Long grace period so the wall-clock timer cannot fire while a
    /// test is still delivering its speech events
    fn patient_config() -> ScoringConfig {
        ScoringConfig {
            grace_ms: 60_000,
            ..ScoringConfig::default()
        }
    }

    fn line_strokes(n: u32) -> Vec<ExpectedStroke> {
        (1..=n)
            .map(|i| {
                ExpectedStroke::new(
                    i,
                    StrokeCategory::Horizontal,
                    format!("name-{i}"),
                    vec![
                        Point::new(0.0, i as f64 * 10.0),
                        Point::new(100.0, i as f64 * 10.0),
                    ],
                )
                .unwrap()
            })
            .collect()
    }

    fn stroke_end(index: u32) -> InputEvent {
        InputEvent::StrokeEnd {
            index,
            points: vec![
                Point::new(0.0, index as f64 * 10.0),
                Point::new(50.0, index as f64 * 10.0),
                Point::new(100.0, index as f64 * 10.0),
            ],
            started_ms: 100,
            ended_ms: 600,
        }
    }

    fn matched_speech() -> InputEvent {
        InputEvent::SpeechFinalized {
            transcript: "name-1".to_string(),
            matches_expected: true,
            confidence: 0.95,
            start_ms: 100,
            end_ms: 600,
        }
    }

    #[tokio::test]
    async fn scores_a_stroke_with_matched_speech() {
        let handle = spawn_engine(patient_config());
        let mut output = handle.subscribe();

        handle
            .send(InputEvent::CharacterSelected {
                strokes: line_strokes(2),
            })
            .await
            .unwrap();
        handle.send(stroke_end(1)).await.unwrap();
        handle.send(matched_speech()).await.unwrap();

        let event = output.recv().await.unwrap();
        let OutputEvent::StrokeScored { result, feedback } = event else {
            panic!("expected StrokeScored, got {event:?}");
        };
        assert_eq!(result.index, 1);
        assert!(result.shape_score > 90.0);
        // Identical intervals: fully concurrent
        assert_eq!(result.concurrency_score, 100.0);
        assert_eq!(result.speech, SpeechOutcome::Matched);
        assert!(feedback.timing.is_some());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn completes_character_after_last_stroke() {
        let handle = spawn_engine(patient_config());
        let mut output = handle.subscribe();

        handle
            .send(InputEvent::CharacterSelected {
                strokes: line_strokes(1),
            })
            .await
            .unwrap();
        handle.send(stroke_end(1)).await.unwrap();
        handle.send(matched_speech()).await.unwrap();

        let first = output.recv().await.unwrap();
        assert!(matches!(first, OutputEvent::StrokeScored { .. }));

        let second = output.recv().await.unwrap();
        let OutputEvent::CharacterComplete { score } = second else {
            panic!("expected CharacterComplete, got {second:?}");
        };
        assert_eq!(score.recorded, 1);
        assert_eq!(score.expected, 1);
        assert!(score.overall > 0.0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn empty_stroke_is_rejected_and_index_stays_open() {
        let handle = spawn_engine(patient_config());
        let mut output = handle.subscribe();

        handle
            .send(InputEvent::CharacterSelected {
                strokes: line_strokes(1),
            })
            .await
            .unwrap();
        handle
            .send(InputEvent::StrokeEnd {
                index: 1,
                points: vec![],
                started_ms: 0,
                ended_ms: 10,
            })
            .await
            .unwrap();

        let event = output.recv().await.unwrap();
        assert_eq!(
            event,
            OutputEvent::AttemptRejected {
                index: 1,
                reason: RejectReason::EmptyStroke
            }
        );

        // The same index can still be drawn and scored
        handle.send(stroke_end(1)).await.unwrap();
        handle.send(matched_speech()).await.unwrap();
        let event = output.recv().await.unwrap();
        assert!(matches!(
            event,
            OutputEvent::StrokeScored { result, .. } if result.index == 1
        ));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn out_of_order_stroke_is_rejected_as_stale() {
        let handle = spawn_engine(patient_config());
        let mut output = handle.subscribe();

        handle
            .send(InputEvent::CharacterSelected {
                strokes: line_strokes(3),
            })
            .await
            .unwrap();
        // Stroke 2 while stroke 1 is open
        handle.send(stroke_end(2)).await.unwrap();

        let event = output.recv().await.unwrap();
        assert_eq!(
            event,
            OutputEvent::AttemptRejected {
                index: 2,
                reason: RejectReason::StaleIndex
            }
        );

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn speech_unavailable_still_scores_shape() {
        let handle = spawn_engine(patient_config());
        let mut output = handle.subscribe();

        handle
            .send(InputEvent::CharacterSelected {
                strokes: line_strokes(1),
            })
            .await
            .unwrap();
        handle.send(stroke_end(1)).await.unwrap();
        handle.send(InputEvent::SpeechUnavailable).await.unwrap();

        let event = output.recv().await.unwrap();
        let OutputEvent::StrokeScored { result, feedback } = event else {
            panic!("expected StrokeScored, got {event:?}");
        };
        assert_eq!(result.speech, SpeechOutcome::Unavailable);
        assert!(result.shape_score > 90.0);
        assert_eq!(result.concurrency_score, 0.0);
        assert!(feedback.timing.is_none());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn grace_timeout_scores_without_speech() {
        let handle = spawn_engine(patient_config());
        let mut output = handle.subscribe();

        handle
            .send(InputEvent::CharacterSelected {
                strokes: line_strokes(1),
            })
            .await
            .unwrap();
        handle.send(stroke_end(1)).await.unwrap();

        // No speech arrives; paused time auto-advances past the grace period
        let event = output.recv().await.unwrap();
        let OutputEvent::StrokeScored { result, .. } = event else {
            panic!("expected StrokeScored, got {event:?}");
        };
        assert_eq!(result.speech, SpeechOutcome::NotMatched { heard: None });
        assert!(!result.speech_attempted);
        assert_eq!(result.concurrency_score, 0.0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn transcription_before_pen_up_scores_at_pen_up() {
        let handle = spawn_engine(patient_config());
        let mut output = handle.subscribe();

        handle
            .send(InputEvent::CharacterSelected {
                strokes: line_strokes(2),
            })
            .await
            .unwrap();
        // Fast recognizer: the matched word lands before the pen lifts
        handle
            .send(InputEvent::SpeechStarted { at_ms: 150 })
            .await
            .unwrap();
        handle.send(matched_speech()).await.unwrap();
        handle.send(stroke_end(1)).await.unwrap();

        let event = output.recv().await.unwrap();
        let OutputEvent::StrokeScored { result, .. } = event else {
            panic!("expected StrokeScored, got {event:?}");
        };
        assert_eq!(result.index, 1);
        assert_eq!(result.speech, SpeechOutcome::Matched);
        assert!(result.speech_attempted);
        assert_eq!(result.concurrency_score, 100.0);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn utterance_started_mid_stroke_outlives_the_short_grace() {
        let handle = spawn_engine(ScoringConfig::default());
        let mut output = handle.subscribe();

        handle
            .send(InputEvent::CharacterSelected {
                strokes: line_strokes(1),
            })
            .await
            .unwrap();
        // Speech begins while drawing; transcription is slow
        handle
            .send(InputEvent::SpeechStarted { at_ms: 200 })
            .await
            .unwrap();
        handle.send(stroke_end(1)).await.unwrap();
        // Paused time runs well past the short no-speech grace period
        // before the transcription finally lands
        tokio::time::sleep(Duration::from_millis(600)).await;
        handle.send(matched_speech()).await.unwrap();

        let event = output.recv().await.unwrap();
        let OutputEvent::StrokeScored { result, .. } = event else {
            panic!("expected StrokeScored, got {event:?}");
        };
        // The stroke must not have been resolved as silent
        assert_eq!(result.speech, SpeechOutcome::Matched);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn character_switch_drops_in_flight_attempt() {
        let handle = spawn_engine(patient_config());
        let mut output = handle.subscribe();

        handle
            .send(InputEvent::CharacterSelected {
                strokes: line_strokes(3),
            })
            .await
            .unwrap();
        handle.send(stroke_end(1)).await.unwrap();

        // Switch characters while stroke 1 waits on speech
        handle
            .send(InputEvent::CharacterSelected {
                strokes: line_strokes(1),
            })
            .await
            .unwrap();
        // The new character starts over at stroke 1
        handle.send(stroke_end(1)).await.unwrap();
        handle.send(matched_speech()).await.unwrap();

        let event = output.recv().await.unwrap();
        let OutputEvent::StrokeScored { result, .. } = event else {
            panic!("expected StrokeScored, got {event:?}");
        };
        assert_eq!(result.index, 1);

        // New character has one stroke, so it completes
        let event = output.recv().await.unwrap();
        let OutputEvent::CharacterComplete { score } = event else {
            panic!("expected CharacterComplete, got {event:?}");
        };
        assert_eq!(score.expected, 1);
        assert_eq!(score.recorded, 1);

        handle.shutdown().await;
    }
}
