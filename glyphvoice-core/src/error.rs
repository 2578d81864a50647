//! Error types for glyphvoice-core
//!
//! Every failure mode here is locally recovered by the engine loop;
//! nothing propagates as a fatal condition. A practice run must always
//! be able to reach a final score, possibly a degraded one.

use thiserror::Error;

/// Top-level error type for glyphvoice-core
#[derive(Error, Debug)]
pub enum GlyphvoiceError {
    #[error("Attempt error: {0}")]
    Attempt(#[from] AttemptError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while fusing events into a stroke attempt
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error("Drawn stroke {index} contained no points")]
    EmptyStroke { index: u32 },

    #[error("Event for stroke {got} while stroke {open} is open")]
    StaleIndex { got: u32, open: u32 },

    #[error("No attempt is currently open")]
    NotOpen,
}

/// Errors related to session aggregation
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Stroke {0} was already recorded for this character")]
    DuplicateIndex(u32),

    #[error("No expected stroke with index {0}")]
    UnknownStroke(u32),

    #[error("Expected stroke {0} has an empty reference path")]
    EmptyReferencePath(u32),
}

/// Errors loading or validating scoring configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
