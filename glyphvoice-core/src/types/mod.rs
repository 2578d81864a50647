//! Core data model for stroke-and-speech scoring

mod result;
mod speech;
mod stroke;

pub use result::{SessionScore, StrokeClassification, StrokeResult};
pub use speech::{SpeechOutcome, SpeechSegment};
pub use stroke::{BoundingBox, DrawnStrokeSample, ExpectedStroke, Point, StrokeCategory};
