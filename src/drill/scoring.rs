//! Scoring Engine
//!
//! Maps session accuracy and average answer time to a star tier. The threshold table is
//! data: callers may supply their own through `DrillConfig`.

use serde::{Deserialize, Serialize};

use crate::drill::types::StarRating;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarThreshold {
    pub stars: u8,
    /// Minimum accuracy in percent (inclusive).
    pub min_accuracy: f64,
    /// Maximum average seconds per question (inclusive).
    pub max_avg_seconds: f64,
}

impl StarThreshold {
    pub fn new(stars: u8, min_accuracy: f64, max_avg_seconds: f64) -> Self {
        Self {
            stars,
            min_accuracy,
            max_avg_seconds,
        }
    }

    pub fn matches(&self, accuracy_percent: f64, avg_seconds: f64) -> bool {
        accuracy_percent >= self.min_accuracy && avg_seconds <= self.max_avg_seconds
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<StarThreshold>", into = "Vec<StarThreshold>")]
pub struct ScoreTable {
    thresholds: Vec<StarThreshold>,
}

impl ScoreTable {
    /// Tiers are kept strictest (highest stars) first regardless of input order.
    pub fn new(mut thresholds: Vec<StarThreshold>) -> Self {
        thresholds.sort_by(|a, b| b.stars.cmp(&a.stars));
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &[StarThreshold] {
        &self.thresholds
    }

    pub fn score_session(&self, accuracy_percent: f64, avg_seconds: f64) -> StarRating {
        if accuracy_percent.is_nan() || avg_seconds.is_nan() {
            return StarRating::NONE;
        }
        self.thresholds
            .iter()
            .find(|tier| tier.matches(accuracy_percent, avg_seconds))
            .map(|tier| StarRating::new(tier.stars))
            .unwrap_or(StarRating::NONE)
    }
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self::new(vec![
            StarThreshold::new(4, 100.0, 3.0),
            StarThreshold::new(3, 90.0, 3.5),
            StarThreshold::new(2, 85.0, 4.0),
            StarThreshold::new(1, 80.0, 5.0),
        ])
    }
}

impl From<Vec<StarThreshold>> for ScoreTable {
    fn from(thresholds: Vec<StarThreshold>) -> Self {
        Self::new(thresholds)
    }
}

impl From<ScoreTable> for Vec<StarThreshold> {
    fn from(table: ScoreTable) -> Self {
        table.thresholds
    }
}

// ==================== Grid Metrics ====================

/// `max(0, 100 - wrong / total * 100)`; zero when the grid is empty.
pub fn grid_accuracy(wrong_attempts: u32, total_numbers: usize) -> f64 {
    if total_numbers == 0 {
        return 0.0;
    }
    (100.0 - wrong_attempts as f64 * 100.0 / total_numbers as f64).max(0.0)
}

pub fn grid_avg_seconds(elapsed_seconds: f64, total_numbers: usize) -> f64 {
    if total_numbers == 0 {
        return 0.0;
    }
    elapsed_seconds / total_numbers as f64
}

/// Accuracy in percent for an addition session; zero when nothing was answered.
pub fn session_accuracy(correct: usize, answered: usize) -> f64 {
    if answered == 0 {
        return 0.0;
    }
    correct as f64 * 100.0 / answered as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_tiers() {
        let table = ScoreTable::default();
        assert_eq!(table.score_session(100.0, 2.9).value(), 4);
        assert_eq!(table.score_session(92.0, 3.4).value(), 3);
        assert_eq!(table.score_session(80.0, 5.0).value(), 1);
        assert_eq!(table.score_session(79.0, 5.0).value(), 0);
        assert_eq!(table.score_session(100.0, 10.0).value(), 0);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let table = ScoreTable::default();
        assert_eq!(table.score_session(100.0, 3.0).value(), 4);
        assert_eq!(table.score_session(85.0, 4.0).value(), 2);
        assert_eq!(table.score_session(100.0, 3.01).value(), 3);
    }

    #[test]
    fn test_unsorted_table_is_evaluated_strictest_first() {
        let table = ScoreTable::new(vec![
            StarThreshold::new(1, 50.0, 10.0),
            StarThreshold::new(2, 90.0, 2.0),
        ]);
        assert_eq!(table.thresholds()[0].stars, 2);
        assert_eq!(table.score_session(95.0, 1.0).value(), 2);
        assert_eq!(table.score_session(60.0, 1.0).value(), 1);
    }

    #[test]
    fn test_nan_scores_zero() {
        assert_eq!(ScoreTable::default().score_session(f64::NAN, 1.0), StarRating::NONE);
    }

    #[test]
    fn test_table_serde_as_list() {
        let json = r#"[{"stars":1,"min_accuracy":50.0,"max_avg_seconds":9.0}]"#;
        let table: ScoreTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.score_session(50.0, 9.0).value(), 1);
    }

    #[test]
    fn test_grid_metrics() {
        assert_eq!(grid_accuracy(0, 10), 100.0);
        assert_eq!(grid_accuracy(3, 10), 70.0);
        assert_eq!(grid_accuracy(25, 10), 0.0);
        assert_eq!(grid_avg_seconds(25.0, 10), 2.5);
        assert_eq!(grid_accuracy(1, 0), 0.0);
    }

    #[test]
    fn test_session_accuracy() {
        assert_eq!(session_accuracy(15, 20), 75.0);
        assert_eq!(session_accuracy(0, 0), 0.0);
    }
}
