//! Level / Stage Catalog
//!
//! Static, ordered table of levels grouped into stages. Definition order is the play
//! order used by the progress tracker; the `END` sentinel marks the end of content.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::drill::pairing::{DigitRule, PairingRule, DEFAULT_CONSTRAINED_CAP};
use crate::drill::types::NumberRange;
use crate::error::{DrillError, DrillResult};

// ==================== Constants ====================

pub const FASTER_TIME_THRESHOLD_MS: u64 = 3000;
pub const DEFAULT_TIME_THRESHOLD_MS: u64 = 4000;
pub const SENTINEL_LEVEL_ID: &str = "END";

// ==================== Definitions ====================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LevelKind {
    Addition { rule: PairingRule },
    Grid { range: NumberRange, hide_numbers: bool },
    Sentinel,
}

impl LevelKind {
    pub fn label(&self) -> &'static str {
        match self {
            LevelKind::Addition { .. } => "addition",
            LevelKind::Grid { .. } => "grid",
            LevelKind::Sentinel => "sentinel",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub id: String,
    pub stage: Option<String>,
    pub name: String,
    pub kind: LevelKind,
    /// Per-answer time budget; answers slower than this get the "slow" cue.
    pub time_threshold_ms: u64,
    pub next: Option<String>,
}

impl LevelDefinition {
    pub fn addition(
        id: &str,
        stage: &str,
        name: &str,
        rule: PairingRule,
        time_threshold_ms: u64,
        next: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            stage: Some(stage.to_string()),
            name: name.to_string(),
            kind: LevelKind::Addition { rule },
            time_threshold_ms,
            next: Some(next.to_string()),
        }
    }

    pub fn grid(
        id: &str,
        stage: &str,
        name: &str,
        range: NumberRange,
        hide_numbers: bool,
        next: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            stage: Some(stage.to_string()),
            name: name.to_string(),
            kind: LevelKind::Grid {
                range,
                hide_numbers,
            },
            time_threshold_ms: DEFAULT_TIME_THRESHOLD_MS,
            next: Some(next.to_string()),
        }
    }

    pub fn sentinel(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            stage: None,
            name: name.to_string(),
            kind: LevelKind::Sentinel,
            time_threshold_ms: 0,
            next: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self.kind, LevelKind::Sentinel)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl StageDefinition {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Problems found by [`Catalog::validate`]. Reported, never enforced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogIssue {
    #[error("duplicate level id {0}")]
    DuplicateId(String),
    #[error("level {level} points at undefined next level {next}")]
    DanglingNext { level: String, next: String },
    #[error("level {level} names unknown stage {stage}")]
    UnknownStage { level: String, stage: String },
    #[error("level {0} is not the sentinel but has no stage")]
    Unstaged(String),
}

// ==================== Catalog ====================

#[derive(Clone, Debug)]
pub struct Catalog {
    stages: Vec<StageDefinition>,
    levels: Vec<LevelDefinition>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Later duplicates of an id are kept in `levels` but unreachable by lookup.
    pub fn new(stages: Vec<StageDefinition>, levels: Vec<LevelDefinition>) -> Self {
        let mut index = HashMap::with_capacity(levels.len());
        for (i, level) in levels.iter().enumerate() {
            index.entry(level.id.clone()).or_insert(i);
        }
        Self {
            stages,
            levels,
            index,
        }
    }

    pub fn standard() -> Self {
        let sweep = |fixed| PairingRule::FixedOperandSweep {
            fixed,
            range_min: 1,
            range_max: 9,
        };

        let stages = vec![
            StageDefinition::new("A", "Addition basics", "Adding numbers from 1 to 9."),
            StageDefinition::new("B", "Tens and units", "Adding tens and units without carrying."),
            StageDefinition::new("C", "Carrying", "Sums that carry into the next column."),
            StageDefinition::new("T", "Number grid", "Find each number on the grid."),
        ];

        let mut levels = Vec::new();
        for fixed in 1..=9u32 {
            let threshold = if fixed <= 2 {
                FASTER_TIME_THRESHOLD_MS
            } else {
                DEFAULT_TIME_THRESHOLD_MS
            };
            let next = if fixed < 9 {
                format!("A{}", fixed + 1)
            } else {
                "AMix1".to_string()
            };
            levels.push(LevelDefinition::addition(
                &format!("A{fixed}"),
                "A",
                &format!("+{fixed}"),
                sweep(fixed),
                threshold,
                &next,
            ));
        }
        levels.push(LevelDefinition::addition(
            "AMix1",
            "A",
            "Mix (1-9)",
            PairingRule::RandomRange {
                min1: 1,
                max1: 9,
                min2: 1,
                max2: 9,
                count: 30,
            },
            DEFAULT_TIME_THRESHOLD_MS + 1000,
            "B1",
        ));

        levels.push(LevelDefinition::addition(
            "B1",
            "B",
            "10 + n",
            PairingRule::FixedOperandSweep {
                fixed: 10,
                range_min: 1,
                range_max: 9,
            },
            FASTER_TIME_THRESHOLD_MS,
            "B2",
        ));
        levels.push(LevelDefinition::addition(
            "B2",
            "B",
            "Tens + units",
            PairingRule::ConstrainedSweep {
                op1: NumberRange::new(11, 89),
                op2: NumberRange::new(1, 9),
                units: DigitRule::NoCarry,
                tens: DigitRule::Any,
                cap: Some(DEFAULT_CONSTRAINED_CAP),
            },
            DEFAULT_TIME_THRESHOLD_MS + 1000,
            "B3",
        ));
        levels.push(LevelDefinition::addition(
            "B3",
            "B",
            "Tens + tens",
            PairingRule::ConstrainedSweep {
                op1: NumberRange::new(10, 89),
                op2: NumberRange::new(10, 89),
                units: DigitRule::NoCarry,
                tens: DigitRule::NoCarry,
                cap: Some(DEFAULT_CONSTRAINED_CAP),
            },
            DEFAULT_TIME_THRESHOLD_MS + 2000,
            "C1",
        ));

        levels.push(LevelDefinition::addition(
            "C1",
            "C",
            "Crossing ten",
            PairingRule::ConstrainedSweep {
                op1: NumberRange::new(2, 9),
                op2: NumberRange::new(2, 9),
                units: DigitRule::Carry,
                tens: DigitRule::Any,
                cap: Some(DEFAULT_CONSTRAINED_CAP),
            },
            DEFAULT_TIME_THRESHOLD_MS,
            "C2",
        ));
        levels.push(LevelDefinition::addition(
            "C2",
            "C",
            "Carrying tens",
            PairingRule::ConstrainedSweep {
                op1: NumberRange::new(11, 79),
                op2: NumberRange::new(11, 19),
                units: DigitRule::Carry,
                tens: DigitRule::NoCarry,
                cap: Some(DEFAULT_CONSTRAINED_CAP),
            },
            DEFAULT_TIME_THRESHOLD_MS + 2000,
            "T1",
        ));

        levels.push(LevelDefinition::grid(
            "T1",
            "T",
            "Grid 1-10",
            NumberRange::new(1, 10),
            false,
            "T2",
        ));
        levels.push(LevelDefinition::grid(
            "T2",
            "T",
            "Grid 1-20",
            NumberRange::new(1, 20),
            false,
            "T3",
        ));
        levels.push(LevelDefinition::grid(
            "T3",
            "T",
            "Hidden grid 1-10",
            NumberRange::new(1, 10),
            true,
            SENTINEL_LEVEL_ID,
        ));

        levels.push(LevelDefinition::sentinel(SENTINEL_LEVEL_ID, "The end!"));

        Self::new(stages, levels)
    }

    pub fn get(&self, id: &str) -> Option<&LevelDefinition> {
        self.index.get(id).map(|&i| &self.levels[i])
    }

    pub fn require(&self, id: &str) -> DrillResult<&LevelDefinition> {
        self.get(id)
            .ok_or_else(|| DrillError::UnknownLevel(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All levels in definition order, sentinel included.
    pub fn levels(&self) -> &[LevelDefinition] {
        &self.levels
    }

    pub fn playable_levels(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.levels.iter().filter(|level| !level.is_sentinel())
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    pub fn stage(&self, id: &str) -> Option<&StageDefinition> {
        self.stages.iter().find(|stage| stage.id == id)
    }

    pub fn levels_in_stage<'a>(
        &'a self,
        stage_id: &'a str,
    ) -> impl Iterator<Item = &'a LevelDefinition> + 'a {
        self.playable_levels()
            .filter(move |level| level.stage.as_deref() == Some(stage_id))
    }

    pub fn first_level_id(&self) -> Option<&str> {
        self.playable_levels().next().map(|level| level.id.as_str())
    }

    /// The level after `id`, or `None` when `id` is last or the next one is the sentinel.
    pub fn next_of(&self, id: &str) -> DrillResult<Option<&LevelDefinition>> {
        let level = self.require(id)?;
        let Some(next_id) = level.next.as_deref() else {
            return Ok(None);
        };
        match self.get(next_id) {
            Some(next) if next.is_sentinel() => Ok(None),
            Some(next) => Ok(Some(next)),
            None => Err(DrillError::UndefinedNext {
                level: level.id.clone(),
                next: next_id.to_string(),
            }),
        }
    }

    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        let stage_ids: HashSet<&str> = self.stages.iter().map(|s| s.id.as_str()).collect();

        for level in &self.levels {
            if !seen.insert(level.id.as_str()) {
                issues.push(CatalogIssue::DuplicateId(level.id.clone()));
            }
            if let Some(next) = &level.next {
                if !self.contains(next) {
                    issues.push(CatalogIssue::DanglingNext {
                        level: level.id.clone(),
                        next: next.clone(),
                    });
                }
            }
            match &level.stage {
                Some(stage) if !stage_ids.contains(stage.as_str()) => {
                    issues.push(CatalogIssue::UnknownStage {
                        level: level.id.clone(),
                        stage: stage.clone(),
                    });
                }
                None if !level.is_sentinel() => {
                    issues.push(CatalogIssue::Unstaged(level.id.clone()));
                }
                _ => {}
            }
        }
        issues
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_standard_catalog_is_well_formed() {
        let catalog = Catalog::standard();
        assert!(catalog.validate().is_empty(), "{:?}", catalog.validate());
        assert_eq!(catalog.first_level_id(), Some("A1"));
        assert!(catalog.get(SENTINEL_LEVEL_ID).unwrap().is_sentinel());
        assert!(catalog.playable_levels().all(|l| !l.is_sentinel()));
    }

    #[test]
    fn test_standard_addition_levels_generate_pairs() {
        let catalog = Catalog::standard();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for level in catalog.playable_levels() {
            if let LevelKind::Addition { rule } = &level.kind {
                assert!(!rule.generate(&mut rng).is_empty(), "level {}", level.id);
            }
        }
    }

    #[test]
    fn test_next_chain_reaches_sentinel_without_cycles() {
        let catalog = Catalog::standard();
        let mut visited = HashSet::new();
        let mut current = catalog.first_level_id().map(str::to_string);
        while let Some(id) = current {
            assert!(visited.insert(id.clone()), "cycle at {}", id);
            current = catalog.next_of(&id).unwrap().map(|l| l.id.clone());
        }
        assert_eq!(visited.len(), catalog.playable_levels().count());
    }

    #[test]
    fn test_next_of_reports_undefined_next() {
        let catalog = Catalog::new(
            vec![StageDefinition::new("A", "A", "")],
            vec![LevelDefinition::addition(
                "A1",
                "A",
                "+1",
                PairingRule::FixedOperandSweep {
                    fixed: 1,
                    range_min: 1,
                    range_max: 9,
                },
                FASTER_TIME_THRESHOLD_MS,
                "A2",
            )],
        );
        assert!(matches!(
            catalog.next_of("A1"),
            Err(DrillError::UndefinedNext { .. })
        ));
        assert_eq!(
            catalog.validate(),
            vec![CatalogIssue::DanglingNext {
                level: "A1".into(),
                next: "A2".into()
            }]
        );
    }

    #[test]
    fn test_levels_in_stage_follow_definition_order() {
        let catalog = Catalog::standard();
        let ids: Vec<_> = catalog.levels_in_stage("T").map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2", "T3"]);
        assert_eq!(catalog.levels_in_stage("A").count(), 10);
        assert_eq!(catalog.levels_in_stage("Z").count(), 0);
    }

    #[test]
    fn test_level_definition_serde_shape() {
        let catalog = Catalog::standard();
        let json = serde_json::to_value(catalog.get("T3").unwrap()).unwrap();
        assert_eq!(json["kind"]["kind"], "grid");
        assert_eq!(json["kind"]["hide_numbers"], true);
    }
}
