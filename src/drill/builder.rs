//! Session Builder
//!
//! Expands a level's unique pairs into a fixed-size session: every fact goes into the
//! pool twice, the pool is shuffled, and adjacent entries with the same pairing key are
//! separated by swapping where possible.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::drill::catalog::{LevelDefinition, LevelKind};
use crate::drill::types::OperandPair;
use crate::error::{DrillError, DrillResult};

/// Number of questions in one addition session.
pub const SESSION_SIZE: usize = 20;

pub struct SessionBuilder {
    session_size: usize,
}

impl SessionBuilder {
    pub fn new(session_size: usize) -> Self {
        Self { session_size }
    }

    pub fn session_size(&self) -> usize {
        self.session_size
    }

    /// Generates the level's unique pairs and assembles a session from them.
    pub fn for_level<R: Rng + ?Sized>(
        &self,
        level: &LevelDefinition,
        rng: &mut R,
    ) -> DrillResult<Vec<OperandPair>> {
        let rule = match &level.kind {
            LevelKind::Addition { rule } => rule,
            LevelKind::Grid { .. } => {
                return Err(DrillError::WrongKind {
                    level: level.id.clone(),
                    expected: "addition",
                })
            }
            LevelKind::Sentinel => return Err(DrillError::NotPlayable(level.id.clone())),
        };

        let unique = rule.generate(rng);
        if unique.is_empty() {
            return Err(DrillError::EmptyPairings(level.id.clone()));
        }
        Ok(build_session(&unique, self.session_size, rng))
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new(SESSION_SIZE)
    }
}

/// Builds a session of exactly `session_size` entries from a non-empty unique pool.
///
/// An empty pool yields an empty session.
pub fn build_session<R: Rng + ?Sized>(
    unique: &[OperandPair],
    session_size: usize,
    rng: &mut R,
) -> Vec<OperandPair> {
    if unique.is_empty() {
        return Vec::new();
    }

    let mut pool: Vec<OperandPair> = Vec::with_capacity((unique.len() * 2).max(session_size));
    pool.extend_from_slice(unique);
    pool.extend_from_slice(unique);
    if pool.len() < session_size {
        tracing::debug!(
            unique = unique.len(),
            session_size,
            "unique pool smaller than half a session, repeating facts"
        );
        while pool.len() < session_size {
            pool.extend_from_slice(unique);
        }
    }

    pool.shuffle(rng);
    separate_adjacent_repeats(&mut pool);
    pool.truncate(session_size);

    if pool.len() != session_size {
        tracing::warn!(
            built = pool.len(),
            session_size,
            "session size mismatch"
        );
    }
    pool
}

/// Swaps entries so no two neighbours share a pairing key, where an arrangement allows.
///
/// Returns the number of collisions that could not be resolved.
pub fn separate_adjacent_repeats(pairs: &mut [OperandPair]) -> usize {
    let mut unresolved = 0;
    for i in 1..pairs.len() {
        let previous = pairs[i - 1].key();
        if pairs[i].key() != previous {
            continue;
        }

        if let Some(j) = (i + 1..pairs.len()).find(|&j| pairs[j].key() != previous) {
            pairs.swap(i, j);
            continue;
        }

        // Everything after `i` repeats the key. Slot the entry back into the prefix
        // between two entries that do not carry it; the prefix stays repeat-free.
        let slot = (0..i.saturating_sub(1))
            .rev()
            .find(|&p| pairs[p].key() != previous && (p == 0 || pairs[p - 1].key() != previous));
        match slot {
            Some(p) => pairs[p..=i].rotate_right(1),
            None => {
                unresolved += 1;
                tracing::debug!(index = i, key = %previous, "no swap candidate for repeated fact");
            }
        }
    }
    unresolved
}

/// Count of neighbouring entries sharing a pairing key.
pub fn adjacent_repeat_count(pairs: &[OperandPair]) -> usize {
    pairs
        .windows(2)
        .filter(|w| w[0].key() == w[1].key())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill::catalog::Catalog;
    use crate::drill::pairing::fixed_operand_sweep;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    #[test]
    fn test_session_has_fixed_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let unique = fixed_operand_sweep(3, 1, 9, &mut rng);
        let session = build_session(&unique, SESSION_SIZE, &mut rng);
        assert_eq!(session.len(), SESSION_SIZE);
    }

    #[test]
    fn test_small_pool_is_padded_to_session_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let unique = vec![
            OperandPair::new(1, 2),
            OperandPair::new(3, 4),
            OperandPair::new(5, 6),
        ];
        let session = build_session(&unique, SESSION_SIZE, &mut rng);
        assert_eq!(session.len(), SESSION_SIZE);
        assert_eq!(adjacent_repeat_count(&session), 0);
    }

    #[test]
    fn test_each_fact_appears_at_most_twice_in_doubled_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let unique: Vec<_> = (1..=30).map(|i| OperandPair::new(i, i + 100)).collect();
        let session = build_session(&unique, SESSION_SIZE, &mut rng);
        let mut counts: HashMap<OperandPair, usize> = HashMap::new();
        for pair in &session {
            *counts.entry(*pair).or_default() += 1;
        }
        assert!(counts.values().all(|&c| c <= 2));
    }

    #[test]
    fn test_no_adjacent_repeats_for_standard_levels() {
        let catalog = Catalog::standard();
        let builder = SessionBuilder::default();
        for seed in 0..25 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for level in catalog.playable_levels() {
                if !matches!(level.kind, LevelKind::Addition { .. }) {
                    continue;
                }
                let session = builder.for_level(level, &mut rng).unwrap();
                assert_eq!(session.len(), SESSION_SIZE, "level {}", level.id);
                assert_eq!(
                    adjacent_repeat_count(&session),
                    0,
                    "level {} seed {}",
                    level.id,
                    seed
                );
            }
        }
    }

    #[test]
    fn test_single_fact_pool_tolerates_repeats() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let session = build_session(&[OperandPair::new(1, 1)], 6, &mut rng);
        assert_eq!(session.len(), 6);
        assert_eq!(adjacent_repeat_count(&session), 5);
    }

    #[test]
    fn test_separation_uses_backward_search_at_tail() {
        let a = OperandPair::new(1, 2);
        let b = OperandPair::new(3, 4);
        let mut pairs = vec![b, a, b, a, a];
        let unresolved = separate_adjacent_repeats(&mut pairs);
        assert_eq!(unresolved, 0);
        assert_eq!(adjacent_repeat_count(&pairs), 0);
    }

    #[test]
    fn test_for_level_rejects_grid_and_sentinel() {
        let catalog = Catalog::standard();
        let builder = SessionBuilder::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let grid = catalog.get("T1").unwrap();
        assert!(matches!(
            builder.for_level(grid, &mut rng),
            Err(DrillError::WrongKind { .. })
        ));

        let end = catalog.get("END").unwrap();
        assert!(matches!(
            builder.for_level(end, &mut rng),
            Err(DrillError::NotPlayable(_))
        ));
    }
}
