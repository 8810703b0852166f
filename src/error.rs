//! Error types for the battlebot crate

use thiserror::Error;

/// Main error type for the battlebot crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("unsupported battle format '{format}' (known formats: {known})")]
    UnsupportedFormat { format: String, known: String },

    #[error("no legal actions supplied for the current decision")]
    NoLegalActions,

    #[error("action {action} is outside the action space of size {action_space_size}")]
    ActionOutOfRange {
        action: usize,
        action_space_size: usize,
    },

    #[error("action space size mismatch: expected {expected}, got {got}")]
    ActionSpaceMismatch { expected: usize, got: usize },

    #[error("state key {state} has {got} features but this agent encodes {expected}")]
    StateKeyArity {
        expected: usize,
        got: usize,
        state: String,
    },

    #[error("episode finished callback received a battle that is not finished")]
    EpisodeNotFinished,

    #[error("update for action {action} in state {state} produced a non-finite value")]
    NonFiniteValue { state: String, action: usize },

    #[error("could not load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("unsupported model save format version {found} (expected {expected})")]
    UnsupportedModelVersion { found: u32, expected: u32 },

    #[error("saved model was trained with {saved} but the configuration asks for {configured}")]
    AlgorithmMismatch { saved: String, configured: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },

    #[error("invalid agent mode '{input}'. Expected one of: {expected}")]
    ParseAgentMode { input: String, expected: String },

    #[error("invalid TD algorithm '{input}'. Expected one of: {expected}")]
    ParseAlgorithm { input: String, expected: String },

    #[error("invalid opponent '{input}'. Expected one of: {expected}")]
    ParseOpponent { input: String, expected: String },

    #[error("no battle is running")]
    BattleNotRunning,

    #[error("action {action} cannot be executed in the current battle state")]
    ActionNotExecutable { action: usize },

    #[error("battle did not finish within {limit} turns")]
    TurnLimitExceeded { limit: usize },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
