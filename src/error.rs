use thiserror::Error;

use crate::storage::StoreError;

/// Errors surfaced by the drill engine.
///
/// None of these are fatal to the app: `AppState::dispatch` logs them, keeps them as
/// diagnostics and falls back to the home screen.
#[derive(Debug, Error)]
pub enum DrillError {
    #[error("unknown level: {0}")]
    UnknownLevel(String),

    #[error("level {0} produced no pairings")]
    EmptyPairings(String),

    #[error("level {level} points at undefined next level {next}")]
    UndefinedNext { level: String, next: String },

    #[error("level {0} is the end-of-content sentinel")]
    NotPlayable(String),

    #[error("level {level} is not an {expected} level")]
    WrongKind { level: String, expected: &'static str },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type DrillResult<T> = Result<T, DrillError>;
