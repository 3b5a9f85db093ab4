//! Collaborator contracts for the host UI.
//!
//! The engine never draws or plays anything itself; it calls a [`Presenter`] for screens
//! and a [`Notifier`] for sound and vibration cues.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::drill::progress::StageSummary;
use crate::drill::types::StarRating;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Correct,
    /// Right answer, but slower than the level's time threshold.
    CorrectSlow,
    Wrong,
    LevelComplete,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Correct => "correct",
            Cue::CorrectSlow => "correct_slow",
            Cue::Wrong => "wrong",
            Cue::LevelComplete => "level_complete",
        }
    }

    /// Vibration on/off durations in milliseconds.
    pub fn haptic_pattern(&self) -> &'static [u64] {
        match self {
            Cue::Correct | Cue::CorrectSlow => &[50],
            Cue::Wrong => &[80, 40, 80],
            Cue::LevelComplete => &[100, 50, 100, 50, 100],
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the home screen shows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HomeSummary {
    pub display_name: String,
    pub avatar_seed: String,
    pub current_level: String,
    pub next_level: Option<String>,
    pub overall_percent: f64,
    pub all_mastered: bool,
    pub stages: Vec<StageSummary>,
}

pub trait Presenter {
    fn render_problem(&mut self, op1: u32, op2: u32);

    fn render_feedback(&mut self, is_correct: bool, correct_answer: u32, elapsed_seconds: f64);

    fn render_session_complete(
        &mut self,
        accuracy_percent: f64,
        avg_time_seconds: f64,
        stars: StarRating,
        level_id: &str,
    );

    /// `target` is `None` once every number has been found.
    fn render_grid(
        &mut self,
        min: u32,
        max: u32,
        hide_numbers: bool,
        target: Option<u32>,
        matched: &BTreeSet<u32>,
    );

    fn render_home(&mut self, _summary: &HomeSummary) {}

    fn render_answer_input(&mut self, _text: &str) {}
}

/// Fire-and-forget cue sink. Implementations swallow their own failures.
pub trait Notifier {
    fn notify(&mut self, cue: Cue);
}

pub trait Frontend: Presenter + Notifier {}

impl<T: Presenter + Notifier> Frontend for T {}

/// Discards everything. Useful for headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullFrontend;

impl Presenter for NullFrontend {
    fn render_problem(&mut self, _op1: u32, _op2: u32) {}

    fn render_feedback(&mut self, _is_correct: bool, _correct_answer: u32, _elapsed: f64) {}

    fn render_session_complete(&mut self, _acc: f64, _avg: f64, _stars: StarRating, _id: &str) {}

    fn render_grid(&mut self, _min: u32, _max: u32, _hide: bool, _t: Option<u32>, _m: &BTreeSet<u32>) {}
}

impl Notifier for NullFrontend {
    fn notify(&mut self, cue: Cue) {
        tracing::trace!(cue = %cue, "cue dropped");
    }
}
