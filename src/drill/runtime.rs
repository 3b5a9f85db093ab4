//! Addition Session Runtime
//!
//! Per-question state machine: `Idle -> AwaitingAnswer -> Judging -> (AwaitingAnswer |
//! Complete)`. The runtime owns timing and counters; the delay between judging and the
//! next question is driven from outside through [`AdditionSession::advance`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::drill::progress::ProgressTracker;
use crate::drill::scoring::{session_accuracy, ScoreTable};
use crate::drill::types::{OperandPair, StarRating};
use crate::frontend::Cue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    AwaitingAnswer,
    Judging,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Judgement {
    pub pair: OperandPair,
    /// `None` when the input was empty or not a number.
    pub submitted: Option<i64>,
    pub is_correct: bool,
    pub correct_answer: u32,
    pub elapsed_ms: u64,
    pub cue: Cue,
    pub streak: u32,
    pub is_last: bool,
}

impl Judgement {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Next(OperandPair),
    Finished,
}

/// Final statistics of a finished session, addition or grid.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionOutcome {
    pub level_id: String,
    pub accuracy_percent: f64,
    pub avg_seconds: f64,
    pub stars_earned: StarRating,
    pub previous_rating: StarRating,
    pub stored_rating: StarRating,
    pub new_record: bool,
    /// Wall-clock time the result was recorded, set by the owning state.
    pub finished_at: Option<DateTime<Utc>>,
}

impl SessionOutcome {
    /// Scores the session and records the result. Ratings never decrease.
    pub fn record(
        level_id: &str,
        accuracy_percent: f64,
        avg_seconds: f64,
        scores: &ScoreTable,
        progress: &mut ProgressTracker,
    ) -> Self {
        let stars_earned = scores.score_session(accuracy_percent, avg_seconds);
        let previous_rating = progress.rating(level_id);
        let stored_rating = progress.record_result(level_id, stars_earned);
        tracing::info!(
            level_id,
            accuracy = accuracy_percent,
            avg_seconds,
            stars = %stars_earned,
            stored = %stored_rating,
            "session complete"
        );
        Self {
            level_id: level_id.to_string(),
            accuracy_percent,
            avg_seconds,
            stars_earned,
            previous_rating,
            stored_rating,
            new_record: stored_rating > previous_rating,
            finished_at: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AdditionSession {
    level_id: String,
    time_threshold_ms: u64,
    time_gate: bool,
    pairs: Vec<OperandPair>,
    index: usize,
    answered: usize,
    correct: usize,
    streak: u32,
    best_streak: u32,
    total_answer_ms: u64,
    question_started_ms: u64,
    phase: SessionPhase,
}

impl AdditionSession {
    /// With `time_gate` on, correct answers slower than the threshold do not count as correct.
    pub fn new(
        level_id: impl Into<String>,
        time_threshold_ms: u64,
        pairs: Vec<OperandPair>,
        time_gate: bool,
    ) -> Self {
        Self {
            level_id: level_id.into(),
            time_threshold_ms,
            time_gate,
            pairs,
            index: 0,
            answered: 0,
            correct: 0,
            streak: 0,
            best_streak: 0,
            total_answer_ms: 0,
            question_started_ms: 0,
            phase: SessionPhase::Idle,
        }
    }

    pub fn level_id(&self) -> &str {
        &self.level_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn answered(&self) -> usize {
        self.answered
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn current_pair(&self) -> Option<OperandPair> {
        match self.phase {
            SessionPhase::AwaitingAnswer | SessionPhase::Judging => self.pairs.get(self.index).copied(),
            _ => None,
        }
    }

    /// Presents the first question. An empty session completes immediately.
    pub fn start(&mut self, now_ms: u64) -> Advance {
        if self.phase != SessionPhase::Idle {
            tracing::warn!(level_id = %self.level_id, phase = ?self.phase, "session already started");
        }
        self.index = 0;
        self.answered = 0;
        self.correct = 0;
        self.streak = 0;
        self.best_streak = 0;
        self.total_answer_ms = 0;
        self.present(now_ms)
    }

    pub fn submit(&mut self, input: &str, now_ms: u64) -> Option<Judgement> {
        if self.phase != SessionPhase::AwaitingAnswer {
            tracing::debug!(level_id = %self.level_id, phase = ?self.phase, "answer ignored");
            return None;
        }
        let Some(pair) = self.pairs.get(self.index).copied() else {
            self.phase = SessionPhase::Complete;
            return None;
        };

        let elapsed_ms = now_ms.saturating_sub(self.question_started_ms);
        let submitted = input.trim().parse::<i64>().ok();
        let is_correct = submitted == Some(pair.answer() as i64);
        let in_time = elapsed_ms <= self.time_threshold_ms;

        let cue = match (is_correct, in_time) {
            (true, true) => Cue::Correct,
            (true, false) => Cue::CorrectSlow,
            (false, _) => Cue::Wrong,
        };

        if is_correct && (in_time || !self.time_gate) {
            self.correct += 1;
        }
        if is_correct {
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
        self.answered += 1;
        self.total_answer_ms += elapsed_ms;
        self.phase = SessionPhase::Judging;

        Some(Judgement {
            pair,
            submitted,
            is_correct,
            correct_answer: pair.answer(),
            elapsed_ms,
            cue,
            streak: self.streak,
            is_last: self.answered >= self.pairs.len(),
        })
    }

    /// Leaves the judgement: shows the next question, or reports the session finished.
    pub fn advance(&mut self, now_ms: u64) -> Advance {
        match self.phase {
            SessionPhase::Judging => {}
            SessionPhase::Complete => return Advance::Finished,
            _ => {
                tracing::debug!(level_id = %self.level_id, phase = ?self.phase, "advance ignored");
                return match self.current_pair() {
                    Some(pair) => Advance::Next(pair),
                    None => Advance::Finished,
                };
            }
        }
        if self.answered >= self.pairs.len() {
            self.phase = SessionPhase::Complete;
            return Advance::Finished;
        }
        self.index += 1;
        self.present(now_ms)
    }

    pub fn accuracy_percent(&self) -> f64 {
        session_accuracy(self.correct, self.answered)
    }

    /// Mean answering time; judgement pauses are not included.
    pub fn avg_seconds(&self) -> f64 {
        if self.answered == 0 {
            return 0.0;
        }
        self.total_answer_ms as f64 / self.answered as f64 / 1000.0
    }

    /// Completes the session, scores it and records the result.
    pub fn finish(&mut self, scores: &ScoreTable, progress: &mut ProgressTracker) -> SessionOutcome {
        self.phase = SessionPhase::Complete;
        SessionOutcome::record(
            &self.level_id,
            self.accuracy_percent(),
            self.avg_seconds(),
            scores,
            progress,
        )
    }

    fn present(&mut self, now_ms: u64) -> Advance {
        match self.pairs.get(self.index).copied() {
            Some(pair) => {
                self.question_started_ms = now_ms;
                self.phase = SessionPhase::AwaitingAnswer;
                Advance::Next(pair)
            }
            None => {
                tracing::warn!(
                    level_id = %self.level_id,
                    index = self.index,
                    len = self.pairs.len(),
                    "question index past session end, finishing"
                );
                self.phase = SessionPhase::Complete;
                Advance::Finished
            }
        }
    }
}
