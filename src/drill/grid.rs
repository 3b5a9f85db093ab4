//! Grid "find the number" exercise.
//!
//! `Idle -> Active -> AllMatched -> Complete`. Every tap on something other than the
//! current target counts as a wrong attempt; taps outside the range are ignored.

use rand::seq::IteratorRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::drill::progress::ProgressTracker;
use crate::drill::runtime::SessionOutcome;
use crate::drill::scoring::{grid_accuracy, grid_avg_seconds, ScoreTable};
use crate::drill::types::NumberRange;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridPhase {
    Idle,
    Active,
    /// Everything found; completion is applied after a short pause.
    AllMatched,
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapResult {
    /// The target was found. Carries the new target, `None` once all are matched.
    Matched { next_target: Option<u32> },
    Wrong,
    Ignored,
}

#[derive(Clone, Debug)]
pub struct GridExercise {
    level_id: String,
    range: NumberRange,
    hide_numbers: bool,
    matched: BTreeSet<u32>,
    target: Option<u32>,
    wrong_attempts: u32,
    started_ms: u64,
    matched_all_ms: Option<u64>,
    phase: GridPhase,
}

impl GridExercise {
    pub fn new(level_id: impl Into<String>, range: NumberRange, hide_numbers: bool) -> Self {
        Self {
            level_id: level_id.into(),
            range,
            hide_numbers,
            matched: BTreeSet::new(),
            target: None,
            wrong_attempts: 0,
            started_ms: 0,
            matched_all_ms: None,
            phase: GridPhase::Idle,
        }
    }

    pub fn level_id(&self) -> &str {
        &self.level_id
    }

    pub fn range(&self) -> NumberRange {
        self.range
    }

    pub fn hide_numbers(&self) -> bool {
        self.hide_numbers
    }

    pub fn matched(&self) -> &BTreeSet<u32> {
        &self.matched
    }

    pub fn target(&self) -> Option<u32> {
        self.target
    }

    pub fn wrong_attempts(&self) -> u32 {
        self.wrong_attempts
    }

    pub fn phase(&self) -> GridPhase {
        self.phase
    }

    pub fn total(&self) -> usize {
        self.range.len()
    }

    pub fn start<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R) -> Option<u32> {
        self.matched.clear();
        self.wrong_attempts = 0;
        self.started_ms = now_ms;
        self.matched_all_ms = None;
        self.phase = GridPhase::Active;
        self.pick_target(now_ms, rng);
        self.target
    }

    pub fn tap<R: Rng + ?Sized>(&mut self, number: u32, now_ms: u64, rng: &mut R) -> TapResult {
        if self.phase != GridPhase::Active || !self.range.contains(number) {
            return TapResult::Ignored;
        }
        if Some(number) != self.target {
            self.wrong_attempts += 1;
            return TapResult::Wrong;
        }
        self.matched.insert(number);
        self.pick_target(now_ms, rng);
        TapResult::Matched {
            next_target: self.target,
        }
    }

    /// Seconds from start until the last number was found.
    pub fn elapsed_seconds(&self, now_ms: u64) -> f64 {
        let end = self.matched_all_ms.unwrap_or(now_ms);
        end.saturating_sub(self.started_ms) as f64 / 1000.0
    }

    pub fn finish(
        &mut self,
        now_ms: u64,
        scores: &ScoreTable,
        progress: &mut ProgressTracker,
    ) -> SessionOutcome {
        self.phase = GridPhase::Complete;
        let total = self.total();
        SessionOutcome::record(
            &self.level_id,
            grid_accuracy(self.wrong_attempts, total),
            grid_avg_seconds(self.elapsed_seconds(now_ms), total),
            scores,
            progress,
        )
    }

    fn pick_target<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R) {
        let matched = &self.matched;
        self.target = self.range.iter().filter(|n| !matched.contains(n)).choose(rng);
        if self.target.is_none() {
            tracing::debug!(level_id = %self.level_id, wrong = self.wrong_attempts, "grid all matched");
            self.matched_all_ms = Some(now_ms);
            self.phase = GridPhase::AllMatched;
        }
    }
}
