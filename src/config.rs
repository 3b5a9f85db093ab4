//! Engine configuration from defaults, environment or JSON.

use serde::{Deserialize, Serialize};

use crate::drill::builder::SESSION_SIZE;
use crate::drill::scoring::ScoreTable;
use crate::drill::types::StarRating;
use crate::error::{DrillError, DrillResult};

pub const DEFAULT_FEEDBACK_DELAY_MS: u64 = 1200;
pub const DEFAULT_GRID_COMPLETION_DELAY_MS: u64 = 1000;
pub const DEFAULT_NAMESPACE: &str = "sumdrill";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillConfig {
    pub session_size: usize,
    /// Pause between a judgement and the next question.
    pub feedback_delay_ms: u64,
    /// Pause between the last grid match and completion.
    pub grid_completion_delay_ms: u64,
    /// Count correct answers slower than the level threshold as wrong.
    pub level_time_gate: bool,
    pub rng_seed: Option<u64>,
    pub storage_namespace: String,
    pub star_thresholds: ScoreTable,
    pub log_level: String,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            session_size: SESSION_SIZE,
            feedback_delay_ms: DEFAULT_FEEDBACK_DELAY_MS,
            grid_completion_delay_ms: DEFAULT_GRID_COMPLETION_DELAY_MS,
            level_time_gate: false,
            rng_seed: None,
            storage_namespace: DEFAULT_NAMESPACE.to_string(),
            star_thresholds: ScoreTable::default(),
            log_level: "info".to_string(),
        }
    }
}

impl DrillConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("SUMDRILL_SESSION_SIZE") {
            config.session_size = val.parse().unwrap_or(SESSION_SIZE);
        }
        if let Some(val) = lookup("SUMDRILL_FEEDBACK_DELAY_MS") {
            config.feedback_delay_ms = val.parse().unwrap_or(DEFAULT_FEEDBACK_DELAY_MS);
        }
        if let Some(val) = lookup("SUMDRILL_GRID_DELAY_MS") {
            config.grid_completion_delay_ms =
                val.parse().unwrap_or(DEFAULT_GRID_COMPLETION_DELAY_MS);
        }
        if let Some(val) = lookup("SUMDRILL_LEVEL_TIME_GATE") {
            config.level_time_gate = val.parse().unwrap_or(false);
        }
        if let Some(val) = lookup("SUMDRILL_SEED") {
            config.rng_seed = val.parse().ok();
        }
        if let Some(val) = lookup("SUMDRILL_NAMESPACE") {
            if !val.trim().is_empty() {
                config.storage_namespace = val.trim().to_string();
            }
        }
        if let Some(val) = lookup("RUST_LOG") {
            config.log_level = val;
        }

        config
    }

    pub fn from_json(text: &str) -> DrillResult<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| DrillError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DrillResult<()> {
        match self.issues().into_iter().next() {
            Some(issue) => Err(DrillError::InvalidConfig(issue)),
            None => Ok(()),
        }
    }

    /// Resets each invalid field to its default. Returns one error per reset field.
    pub fn repair(&mut self) -> Vec<DrillError> {
        let defaults = Self::default();
        let mut repaired = Vec::new();
        if let Some(issue) = session_size_issue(self.session_size) {
            self.session_size = defaults.session_size;
            repaired.push(DrillError::InvalidConfig(issue));
        }
        if let Some(issue) = namespace_issue(&self.storage_namespace) {
            self.storage_namespace = defaults.storage_namespace;
            repaired.push(DrillError::InvalidConfig(issue));
        }
        if let Some(issue) = thresholds_issue(&self.star_thresholds) {
            self.star_thresholds = defaults.star_thresholds;
            repaired.push(DrillError::InvalidConfig(issue));
        }
        repaired
    }

    fn issues(&self) -> Vec<String> {
        [
            session_size_issue(self.session_size),
            namespace_issue(&self.storage_namespace),
            thresholds_issue(&self.star_thresholds),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

fn session_size_issue(size: usize) -> Option<String> {
    (size == 0).then(|| "session_size must be positive".to_string())
}

fn namespace_issue(namespace: &str) -> Option<String> {
    namespace
        .trim()
        .is_empty()
        .then(|| "storage_namespace is empty".to_string())
}

fn thresholds_issue(table: &ScoreTable) -> Option<String> {
    let thresholds = table.thresholds();
    if thresholds.is_empty() {
        return Some("star_thresholds is empty".into());
    }
    thresholds.iter().find_map(|tier| {
        if tier.stars == 0 || tier.stars > StarRating::MAX {
            Some(format!(
                "star tier {} out of range 1..={}",
                tier.stars,
                StarRating::MAX
            ))
        } else if !(0.0..=100.0).contains(&tier.min_accuracy) || tier.max_avg_seconds < 0.0 {
            Some(format!("star tier {} has out-of-range bounds", tier.stars))
        } else {
            None
        }
    })
}
