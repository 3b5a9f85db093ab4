#![allow(dead_code)]

use std::collections::BTreeSet;

use sumdrill::drill::catalog::Catalog;
use sumdrill::drill::types::StarRating;
use sumdrill::{AppState, Cue, DrillConfig, DrillEvent, HomeSummary, KeyValueStore, ManualClock, MemoryStore, Notifier, Presenter, Screen};

#[derive(Clone, Debug, PartialEq)]
pub enum UiCall {
    Problem(u32, u32),
    Feedback { correct: bool, answer: u32, seconds: f64 },
    Complete { accuracy: f64, avg: f64, stars: u8, level: String },
    Grid { target: Option<u32>, matched: usize },
    Home(HomeSummary),
    Input(String),
}

/// Records every call so tests can assert on what the host would have shown.
#[derive(Default)]
pub struct RecordingFrontend {
    pub calls: Vec<UiCall>,
    pub cues: Vec<Cue>,
}

impl RecordingFrontend {
    pub fn problems(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, UiCall::Problem(..)))
            .count()
    }

    pub fn last_complete(&self) -> Option<&UiCall> {
        self.calls
            .iter()
            .rev()
            .find(|c| matches!(c, UiCall::Complete { .. }))
    }
}

impl Presenter for RecordingFrontend {
    fn render_problem(&mut self, op1: u32, op2: u32) {
        self.calls.push(UiCall::Problem(op1, op2));
    }

    fn render_feedback(&mut self, is_correct: bool, correct_answer: u32, elapsed_seconds: f64) {
        self.calls.push(UiCall::Feedback {
            correct: is_correct,
            answer: correct_answer,
            seconds: elapsed_seconds,
        });
    }

    fn render_session_complete(
        &mut self,
        accuracy_percent: f64,
        avg_time_seconds: f64,
        stars: StarRating,
        level_id: &str,
    ) {
        self.calls.push(UiCall::Complete {
            accuracy: accuracy_percent,
            avg: avg_time_seconds,
            stars: stars.value(),
            level: level_id.to_string(),
        });
    }

    fn render_grid(
        &mut self,
        _min: u32,
        _max: u32,
        _hide_numbers: bool,
        target: Option<u32>,
        matched: &BTreeSet<u32>,
    ) {
        self.calls.push(UiCall::Grid {
            target,
            matched: matched.len(),
        });
    }

    fn render_home(&mut self, summary: &HomeSummary) {
        self.calls.push(UiCall::Home(summary.clone()));
    }

    fn render_answer_input(&mut self, text: &str) {
        self.calls.push(UiCall::Input(text.to_string()));
    }
}

impl Notifier for RecordingFrontend {
    fn notify(&mut self, cue: Cue) {
        self.cues.push(cue);
    }
}

pub type TestState = AppState<MemoryStore, ManualClock>;

pub fn seeded_config(seed: u64) -> DrillConfig {
    DrillConfig {
        rng_seed: Some(seed),
        ..DrillConfig::default()
    }
}

pub fn create_test_state(seed: u64) -> (TestState, ManualClock) {
    let clock = ManualClock::new(1_000_000);
    let state = AppState::new(
        seeded_config(seed),
        Catalog::standard(),
        MemoryStore::new(),
        clock.clone(),
    );
    (state, clock)
}

/// Answers the question on screen after `think_ms`, then waits out the feedback pause.
pub fn answer_current<S: KeyValueStore>(
    state: &mut AppState<S, ManualClock>,
    clock: &ManualClock,
    ui: &mut RecordingFrontend,
    think_ms: u64,
    correct: bool,
) -> Screen {
    let pair = match state.screen() {
        Screen::Question { pair, .. } => *pair,
        other => panic!("expected a question, got {:?}", other),
    };
    let answer = if correct { pair.answer() } else { pair.answer() + 1 };
    clock.advance(think_ms);
    state.dispatch(DrillEvent::AnswerSubmitted(answer.to_string()), ui);
    clock.advance(state.config().feedback_delay_ms);
    state.tick(ui)
}
