//! Progress Tracker
//!
//! Best star rating per level. Ratings only ever go up.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::drill::catalog::Catalog;
use crate::drill::types::StarRating;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressTracker {
    ratings: BTreeMap<String, StarRating>,
}

/// One level as shown on the home screen.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelBadge {
    pub level_id: String,
    pub name: String,
    pub stars: StarRating,
    pub is_next: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage_id: String,
    pub name: String,
    pub description: String,
    pub percent: f64,
    pub levels: Vec<LevelBadge>,
    pub contains_next: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ratings(ratings: BTreeMap<String, StarRating>) -> Self {
        Self { ratings }
    }

    pub fn ratings(&self) -> &BTreeMap<String, StarRating> {
        &self.ratings
    }

    pub fn rating(&self, level_id: &str) -> StarRating {
        self.ratings.get(level_id).copied().unwrap_or_default()
    }

    /// Stores `max(stored, stars)` and returns the stored value.
    pub fn record_result(&mut self, level_id: &str, stars: StarRating) -> StarRating {
        let entry = self.ratings.entry(level_id.to_string()).or_default();
        if stars > *entry {
            tracing::debug!(level_id, previous = %entry, stars = %stars, "new best rating");
            *entry = stars;
        }
        *entry
    }

    /// First playable level below the crown tier, else the catalog's first level.
    pub fn next_level_to_play<'a>(&self, catalog: &'a Catalog) -> Option<&'a str> {
        catalog
            .playable_levels()
            .find(|level| !self.rating(&level.id).is_crown())
            .map(|level| level.id.as_str())
            .or_else(|| catalog.first_level_id())
    }

    pub fn stage_progress(&self, catalog: &Catalog, stage_id: &str) -> f64 {
        self.percent_of(catalog.levels_in_stage(stage_id).map(|level| level.id.as_str()))
    }

    pub fn overall_progress(&self, catalog: &Catalog) -> f64 {
        self.percent_of(catalog.playable_levels().map(|level| level.id.as_str()))
    }

    pub fn all_mastered(&self, catalog: &Catalog) -> bool {
        catalog
            .playable_levels()
            .all(|level| self.rating(&level.id).is_crown())
    }

    pub fn stage_summaries(&self, catalog: &Catalog) -> Vec<StageSummary> {
        let next = self.next_level_to_play(catalog);
        catalog
            .stages()
            .iter()
            .filter_map(|stage| {
                let levels: Vec<LevelBadge> = catalog
                    .levels_in_stage(&stage.id)
                    .map(|level| LevelBadge {
                        level_id: level.id.clone(),
                        name: level.name.clone(),
                        stars: self.rating(&level.id),
                        is_next: Some(level.id.as_str()) == next,
                    })
                    .collect();
                if levels.is_empty() {
                    return None;
                }
                Some(StageSummary {
                    stage_id: stage.id.clone(),
                    name: stage.name.clone(),
                    description: stage.description.clone(),
                    percent: self.stage_progress(catalog, &stage.id),
                    contains_next: levels.iter().any(|badge| badge.is_next),
                    levels,
                })
            })
            .collect()
    }

    fn percent_of<'a>(&self, ids: impl Iterator<Item = &'a str>) -> f64 {
        let (sum, count) = ids.fold((0u32, 0u32), |(sum, count), id| {
            (sum + self.rating(id).value() as u32, count + 1)
        });
        if count == 0 {
            return 0.0;
        }
        sum as f64 / (StarRating::MAX as u32 * count) as f64 * 100.0
    }
}
