//! Progression engine for an addition drilling app.
//!
//! Levels generate addition facts (or a find-the-number grid), sessions are scored into
//! a 0-4 star rating, and the best rating per level decides what to play next. The host
//! owns the UI: it forwards [`DrillEvent`]s to [`AppState`] and renders through the
//! [`Presenter`] and [`Notifier`] traits. Logging is set up once per process with
//! [`logging::init_from_config`], using the same [`DrillConfig`] passed to the state.

pub mod clock;
pub mod config;
pub mod drill;
pub mod error;
pub mod events;
pub mod frontend;
pub mod logging;
pub mod profile;
pub mod state;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DrillConfig;
pub use error::{DrillError, DrillResult};
pub use events::{DrillEvent, Screen};
pub use frontend::{Cue, Frontend, HomeSummary, Notifier, NullFrontend, Presenter};
pub use state::AppState;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
