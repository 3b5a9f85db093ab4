//! Drill engine: pairing generation, session assembly, scoring, progress and the
//! per-session state machines.

pub mod builder;
pub mod catalog;
pub mod grid;
pub mod keypad;
pub mod pairing;
pub mod progress;
pub mod runtime;
pub mod scheduler;
pub mod scoring;
pub mod types;

pub use builder::{build_session, SessionBuilder, SESSION_SIZE};
pub use catalog::{Catalog, LevelDefinition, LevelKind, StageDefinition, SENTINEL_LEVEL_ID};
pub use grid::{GridExercise, GridPhase, TapResult};
pub use keypad::{AnswerPad, KeypadKey, PadAction};
pub use pairing::{DigitRule, PairingRule};
pub use progress::{LevelBadge, ProgressTracker, StageSummary};
pub use runtime::{AdditionSession, Advance, Judgement, SessionOutcome, SessionPhase};
pub use scheduler::{Deferred, Scheduler, SessionToken};
pub use scoring::{ScoreTable, StarThreshold};
pub use types::{pairing_key, NumberRange, OperandPair, PairingKey, StarRating};
