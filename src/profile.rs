//! Learner profile: display name and avatar seed.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DISPLAY_NAME: &str = "Player";
pub const AVATAR_SEED_LEN: usize = 13;
pub const MAX_DISPLAY_NAME_LEN: usize = 24;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Display name and avatar seed. Kept apart from level progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    pub avatar_seed: String,
}

impl UserProfile {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            avatar_seed: random_avatar_seed(rng),
        }
    }

    /// Trims and caps the name; a blank name keeps the current one.
    pub fn rename(&mut self, name: &str) -> bool {
        let trimmed: String = name.trim().chars().take(MAX_DISPLAY_NAME_LEN).collect();
        if trimmed.is_empty() {
            return false;
        }
        self.display_name = trimmed;
        true
    }

    pub fn shuffle_avatar<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &str {
        self.avatar_seed = random_avatar_seed(rng);
        &self.avatar_seed
    }
}

pub fn random_avatar_seed<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..AVATAR_SEED_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}
