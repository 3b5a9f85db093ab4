//! Application state
//!
//! Single owner of catalog, progress, profile and the active exercise. Hosts feed it
//! [`DrillEvent`]s and call [`AppState::tick`] when [`AppState::next_due_ms`] passes.
//! Nothing here propagates errors to the host: failures are logged, kept as diagnostics,
//! and the app falls back to the home screen.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use crate::clock::{Clock, SystemClock};
use crate::config::DrillConfig;
use crate::drill::builder::SessionBuilder;
use crate::drill::catalog::{Catalog, LevelKind};
use crate::drill::grid::{GridExercise, GridPhase, TapResult};
use crate::drill::keypad::{AnswerPad, KeypadKey, PadAction};
use crate::drill::progress::ProgressTracker;
use crate::drill::runtime::{AdditionSession, Advance, SessionOutcome};
use crate::drill::scheduler::{Deferred, Scheduler, SessionToken};
use crate::drill::types::StarRating;
use crate::error::{DrillError, DrillResult};
use crate::events::{DrillEvent, Screen};
use crate::frontend::{Cue, Frontend, HomeSummary};
use crate::profile::{random_avatar_seed, UserProfile, DEFAULT_DISPLAY_NAME};
use crate::storage::{KeyValueStore, StorageKeys, StoreError};

// ==================== Active Exercise ====================

#[derive(Debug)]
enum ActiveExercise {
    Addition(AdditionSession),
    Grid(GridExercise),
}

impl ActiveExercise {
    fn level_id(&self) -> &str {
        match self {
            ActiveExercise::Addition(session) => session.level_id(),
            ActiveExercise::Grid(grid) => grid.level_id(),
        }
    }
}

// ==================== AppState ====================

pub struct AppState<S: KeyValueStore, C: Clock = SystemClock> {
    config: DrillConfig,
    catalog: Catalog,
    builder: SessionBuilder,
    progress: ProgressTracker,
    profile: UserProfile,
    current_level: String,
    store: S,
    keys: StorageKeys,
    clock: C,
    rng: ChaCha8Rng,
    scheduler: Scheduler,
    active: Option<ActiveExercise>,
    token: Option<SessionToken>,
    /// Result of a fully played exercise whose completion screen is still pending.
    settled: Option<SessionOutcome>,
    pad: AnswerPad,
    screen: Screen,
    diagnostics: Vec<String>,
}

impl<S: KeyValueStore, C: Clock> AppState<S, C> {
    /// Fresh state with defaults; nothing is read from the store. Invalid config fields
    /// fall back to their defaults and are reported as diagnostics.
    pub fn new(mut config: DrillConfig, catalog: Catalog, store: S, clock: C) -> Self {
        let mut diagnostics = Vec::new();
        for issue in config.repair() {
            tracing::warn!(issue = %issue, "config field reset to default");
            diagnostics.push(issue.to_string());
        }

        let mut rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let profile = UserProfile::new(&mut rng);
        let current_level = catalog.first_level_id().unwrap_or_default().to_string();
        let keys = StorageKeys::new(&config.storage_namespace);

        for issue in catalog.validate() {
            tracing::warn!(issue = %issue, "catalog issue");
            diagnostics.push(issue.to_string());
        }

        Self {
            builder: SessionBuilder::new(config.session_size),
            config,
            catalog,
            progress: ProgressTracker::new(),
            profile,
            current_level,
            store,
            keys,
            clock,
            rng,
            scheduler: Scheduler::new(),
            active: None,
            token: None,
            settled: None,
            pad: AnswerPad::new(),
            screen: Screen::Home,
            diagnostics,
        }
    }

    /// Builds the state and restores whatever the store holds.
    pub fn load(config: DrillConfig, catalog: Catalog, store: S, clock: C) -> Self {
        let mut state = Self::new(config, catalog, store, clock);
        state.reload();
        state
    }

    /// Restores persisted fields. Each field falls back to its default on its own.
    pub fn reload(&mut self) {
        self.progress = match self.read_key(&self.keys.level_progress.clone()) {
            Some(text) => parse_progress(&text).unwrap_or_else(|err| {
                self.diagnose(format!("level progress unreadable: {err}"));
                ProgressTracker::new()
            }),
            None => ProgressTracker::new(),
        };

        let stored_level = self.read_key(&self.keys.current_level.clone());
        self.current_level = match stored_level {
            Some(id) if self.is_playable(&id) => id,
            Some(id) => {
                self.diagnose(format!("stored level {id} is not playable"));
                self.default_level()
            }
            None => self.default_level(),
        };

        self.profile.display_name = self
            .read_key(&self.keys.display_name.clone())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());
        self.profile.avatar_seed = match self.read_key(&self.keys.avatar_seed.clone()) {
            Some(seed) if !seed.trim().is_empty() => seed,
            _ => random_avatar_seed(&mut self.rng),
        };

        tracing::info!(
            current_level = %self.current_level,
            rated_levels = self.progress.ratings().len(),
            "state loaded"
        );
    }

    /// Writes every persisted field.
    pub fn save(&mut self) -> DrillResult<()> {
        let progress = serde_json::to_string(&self.progress).map_err(StoreError::from)?;
        self.store.set(&self.keys.level_progress, &progress)?;
        self.store.set(&self.keys.current_level, &self.current_level)?;
        self.store.set(&self.keys.display_name, &self.profile.display_name)?;
        self.store.set(&self.keys.avatar_seed, &self.profile.avatar_seed)?;
        Ok(())
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &DrillConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn current_level(&self) -> &str {
        &self.current_level
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn answer_text(&self) -> &str {
        self.pad.text()
    }

    pub fn active_session(&self) -> Option<&AdditionSession> {
        match &self.active {
            Some(ActiveExercise::Addition(session)) => Some(session),
            _ => None,
        }
    }

    pub fn active_grid(&self) -> Option<&GridExercise> {
        match &self.active {
            Some(ActiveExercise::Grid(grid)) => Some(grid),
            _ => None,
        }
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.scheduler.next_due_ms()
    }

    pub fn take_diagnostics(&mut self) -> Vec<String> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn home_summary(&self) -> HomeSummary {
        HomeSummary {
            display_name: self.profile.display_name.clone(),
            avatar_seed: self.profile.avatar_seed.clone(),
            current_level: self.current_level.clone(),
            next_level: self
                .progress
                .next_level_to_play(&self.catalog)
                .map(str::to_string),
            overall_percent: self.progress.overall_progress(&self.catalog),
            all_mastered: self.progress.all_mastered(&self.catalog),
            stages: self.progress.stage_summaries(&self.catalog),
        }
    }

    // ==================== Dispatch ====================

    pub fn dispatch<F: Frontend + ?Sized>(&mut self, event: DrillEvent, ui: &mut F) -> Screen {
        tracing::debug!(event = ?event, "dispatch");
        let result = match event {
            DrillEvent::StartPractice => {
                let level = self.current_level.clone();
                self.start_level(&level, ui)
            }
            DrillEvent::LevelSelected(level) => self.start_level(&level, ui),
            DrillEvent::AnswerSubmitted(text) => {
                self.submit_answer(&text, ui);
                Ok(())
            }
            DrillEvent::Keypad(key) => {
                self.press_key(key, ui);
                Ok(())
            }
            DrillEvent::CellTapped(number) => {
                self.tap_cell(number, ui);
                Ok(())
            }
            DrillEvent::ContinueToNextLevel => self.continue_to_next(ui),
            DrillEvent::ReturnHome => {
                self.go_home(ui);
                Ok(())
            }
            DrillEvent::ProfileRenamed(name) => {
                if self.profile.rename(&name) {
                    self.persist();
                }
                self.refresh_home(ui);
                Ok(())
            }
            DrillEvent::AvatarShuffled => {
                self.profile.shuffle_avatar(&mut self.rng);
                self.persist();
                self.refresh_home(ui);
                Ok(())
            }
        };

        if let Err(err) = result {
            self.fail(err, ui);
        }
        self.screen.clone()
    }

    /// Runs every scheduled transition that is due.
    pub fn tick<F: Frontend + ?Sized>(&mut self, ui: &mut F) -> Screen {
        let now = self.clock.now_ms();
        for task in self.scheduler.take_due(now) {
            if Some(task.token) != self.token {
                tracing::debug!(token = task.token.value(), action = ?task.action, "stale task dropped");
                continue;
            }
            match task.action {
                Deferred::NextQuestion => self.next_question(now, ui),
                Deferred::FinishGrid => self.show_completion(now, ui),
            }
        }
        self.screen.clone()
    }

    // ==================== Level Flow ====================

    fn start_level<F: Frontend + ?Sized>(&mut self, level_id: &str, ui: &mut F) -> DrillResult<()> {
        self.leave_level();
        let level = self.catalog.require(level_id)?.clone();
        let now = self.clock.now_ms();

        match &level.kind {
            LevelKind::Sentinel => return Err(DrillError::NotPlayable(level.id.clone())),
            LevelKind::Addition { .. } => {
                let pairs = self.builder.for_level(&level, &mut self.rng)?;
                let mut session = AdditionSession::new(
                    level.id.clone(),
                    level.time_threshold_ms,
                    pairs,
                    self.config.level_time_gate,
                );
                let first = session.start(now);
                self.token = Some(self.scheduler.new_session_token());
                self.active = Some(ActiveExercise::Addition(session));
                match first {
                    Advance::Next(pair) => {
                        ui.render_problem(pair.op1, pair.op2);
                        ui.render_answer_input("");
                        self.screen = Screen::Question {
                            level_id: level.id.clone(),
                            pair,
                            number: 1,
                            total: self.config.session_size,
                        };
                    }
                    Advance::Finished => self.show_completion(now, ui),
                }
            }
            LevelKind::Grid {
                range,
                hide_numbers,
            } => {
                let mut grid = GridExercise::new(level.id.clone(), *range, *hide_numbers);
                let target = grid.start(now, &mut self.rng);
                let token = self.scheduler.new_session_token();
                self.token = Some(token);
                ui.render_grid(range.min, range.max, *hide_numbers, target, grid.matched());
                self.screen = grid_screen(&grid);
                let all_matched = grid.phase() == GridPhase::AllMatched;
                self.active = Some(ActiveExercise::Grid(grid));
                if all_matched {
                    self.settle(now);
                    self.scheduler.schedule(
                        token,
                        now + self.config.grid_completion_delay_ms,
                        Deferred::FinishGrid,
                    );
                }
            }
        }

        tracing::info!(level_id = %level.id, kind = level.kind.label(), "level started");
        self.current_level = level.id;
        self.persist();
        Ok(())
    }

    fn submit_answer<F: Frontend + ?Sized>(&mut self, text: &str, ui: &mut F) {
        let now = self.clock.now_ms();
        let Some(ActiveExercise::Addition(session)) = &mut self.active else {
            tracing::debug!("answer without an active addition session");
            return;
        };
        let Some(judgement) = session.submit(text, now) else {
            return;
        };
        let level_id = session.level_id().to_string();

        self.pad.lock();
        ui.notify(judgement.cue);
        ui.render_feedback(
            judgement.is_correct,
            judgement.correct_answer,
            judgement.elapsed_seconds(),
        );
        if judgement.is_last {
            self.settle(now);
        }
        if let Some(token) = self.token {
            self.scheduler
                .schedule(token, now + self.config.feedback_delay_ms, Deferred::NextQuestion);
        }
        self.screen = Screen::Feedback {
            level_id,
            judgement,
        };
    }

    fn press_key<F: Frontend + ?Sized>(&mut self, key: KeypadKey, ui: &mut F) {
        if self.active_session().is_none() {
            return;
        }
        match self.pad.press(key) {
            PadAction::Edited(text) => ui.render_answer_input(&text),
            PadAction::Submitted(text) => {
                ui.render_answer_input("");
                self.submit_answer(&text, ui);
            }
            PadAction::Ignored => {}
        }
    }

    fn tap_cell<F: Frontend + ?Sized>(&mut self, number: u32, ui: &mut F) {
        let now = self.clock.now_ms();
        let Some(ActiveExercise::Grid(grid)) = &mut self.active else {
            tracing::debug!(number, "tap without an active grid");
            return;
        };
        let all_matched = match grid.tap(number, now, &mut self.rng) {
            TapResult::Matched { next_target } => {
                ui.notify(Cue::Correct);
                let range = grid.range();
                ui.render_grid(range.min, range.max, grid.hide_numbers(), next_target, grid.matched());
                next_target.is_none()
            }
            TapResult::Wrong => {
                ui.notify(Cue::Wrong);
                false
            }
            TapResult::Ignored => return,
        };
        self.screen = grid_screen(grid);
        if all_matched {
            self.settle(now);
            if let Some(token) = self.token {
                self.scheduler.schedule(
                    token,
                    now + self.config.grid_completion_delay_ms,
                    Deferred::FinishGrid,
                );
            }
        }
    }

    fn next_question<F: Frontend + ?Sized>(&mut self, now: u64, ui: &mut F) {
        let Some(ActiveExercise::Addition(session)) = &mut self.active else {
            return;
        };
        match session.advance(now) {
            Advance::Next(pair) => {
                let level_id = session.level_id().to_string();
                let number = session.answered() + 1;
                self.pad.reset();
                ui.render_problem(pair.op1, pair.op2);
                ui.render_answer_input("");
                self.screen = Screen::Question {
                    level_id,
                    pair,
                    number,
                    total: self.config.session_size,
                };
            }
            Advance::Finished => self.show_completion(now, ui),
        }
    }

    /// Scores the active exercise once it has been played through and persists the
    /// rating. The completion screen follows separately, so leaving during the
    /// closing pause keeps the result.
    fn settle(&mut self, now: u64) {
        if self.settled.is_some() {
            return;
        }
        let scores = &self.config.star_thresholds;
        let mut outcome = match &mut self.active {
            Some(ActiveExercise::Addition(session)) => session.finish(scores, &mut self.progress),
            Some(ActiveExercise::Grid(grid)) => grid.finish(now, scores, &mut self.progress),
            None => return,
        };
        outcome.finished_at = Some(self.clock.wall_time());
        self.settled = Some(outcome);
        self.persist();
    }

    fn show_completion<F: Frontend + ?Sized>(&mut self, now: u64, ui: &mut F) {
        self.settle(now);
        let Some(outcome) = self.settled.take() else {
            return;
        };
        self.active = None;
        self.complete(outcome, ui);
    }

    fn complete<F: Frontend + ?Sized>(&mut self, outcome: SessionOutcome, ui: &mut F) {
        self.token = None;
        self.pad.reset();
        ui.notify(Cue::LevelComplete);
        ui.render_session_complete(
            outcome.accuracy_percent,
            outcome.avg_seconds,
            outcome.stars_earned,
            &outcome.level_id,
        );
        let next_level = match self.catalog.next_of(&outcome.level_id) {
            Ok(next) => next.map(|level| level.id.clone()),
            Err(err) => {
                self.diagnose(err.to_string());
                None
            }
        };
        self.persist();
        self.screen = Screen::LevelComplete {
            outcome,
            next_level,
        };
    }

    fn continue_to_next<F: Frontend + ?Sized>(&mut self, ui: &mut F) -> DrillResult<()> {
        let Screen::LevelComplete { outcome, .. } = &self.screen else {
            tracing::debug!("continue outside level-complete screen");
            return Ok(());
        };
        let finished = outcome.level_id.clone();
        match self.catalog.next_of(&finished)? {
            Some(next) => {
                let next = next.id.clone();
                self.start_level(&next, ui)
            }
            None => {
                self.go_home(ui);
                Ok(())
            }
        }
    }

    fn go_home<F: Frontend + ?Sized>(&mut self, ui: &mut F) {
        self.leave_level();
        self.screen = Screen::Home;
        self.refresh_home(ui);
    }

    fn refresh_home<F: Frontend + ?Sized>(&mut self, ui: &mut F) {
        if self.screen.is_home() {
            ui.render_home(&self.home_summary());
        }
    }

    fn leave_level(&mut self) {
        if let Some(token) = self.token.take() {
            let dropped = self.scheduler.cancel_session(token);
            if dropped > 0 {
                tracing::debug!(token = token.value(), dropped, "cancelled pending transitions");
            }
        }
        if let Some(active) = self.active.take() {
            tracing::debug!(level_id = %active.level_id(), "left level");
        }
        if let Some(outcome) = self.settled.take() {
            tracing::debug!(level_id = %outcome.level_id, stored = %outcome.stored_rating, "left before completion screen");
        }
        self.pad.reset();
    }

    fn fail<F: Frontend + ?Sized>(&mut self, err: DrillError, ui: &mut F) {
        tracing::error!(error = %err, "drill error, returning home");
        self.diagnostics.push(err.to_string());
        self.go_home(ui);
    }

    // ==================== Persistence helpers ====================

    fn persist(&mut self) {
        if let Err(err) = self.save() {
            tracing::warn!(error = %err, "failed to persist state");
            self.diagnostics.push(err.to_string());
        }
    }

    fn read_key(&mut self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                self.diagnose(format!("failed to read {key}: {err}"));
                None
            }
        }
    }

    fn diagnose(&mut self, message: String) {
        tracing::warn!(%message, "falling back to default");
        self.diagnostics.push(message);
    }

    fn is_playable(&self, level_id: &str) -> bool {
        self.catalog
            .get(level_id)
            .is_some_and(|level| !level.is_sentinel())
    }

    fn default_level(&self) -> String {
        self.progress
            .next_level_to_play(&self.catalog)
            .unwrap_or_default()
            .to_string()
    }
}

fn grid_screen(grid: &GridExercise) -> Screen {
    Screen::Grid {
        level_id: grid.level_id().to_string(),
        target: grid.target(),
        found: grid.matched().len(),
        total: grid.total(),
    }
}

/// Parses the stored ratings object. Entries that are not integers are skipped;
/// values above the crown tier are clamped.
fn parse_progress(text: &str) -> Result<ProgressTracker, serde_json::Error> {
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(text)?;
    let ratings = raw
        .into_iter()
        .filter_map(|(level, value)| {
            let stars = value.as_u64()?;
            Some((level, StarRating::new(stars.min(u8::MAX as u64) as u8)))
        })
        .collect();
    Ok(ProgressTracker::from_ratings(ratings))
}
