//! Common Types
//!
//! Small value types shared by every drill module.

use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== Operand Pairs ====================

/// One addition fact. The expected answer is `op1 + op2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperandPair {
    pub op1: u32,
    pub op2: u32,
}

impl OperandPair {
    pub fn new(op1: u32, op2: u32) -> Self {
        Self { op1, op2 }
    }

    pub fn answer(&self) -> u32 {
        self.op1 + self.op2
    }

    pub fn key(&self) -> PairingKey {
        PairingKey::new(self.op1, self.op2)
    }
}

/// Order-independent identity of a fact: `3+5` and `5+3` share the key `3+5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairingKey {
    low: u32,
    high: u32,
}

impl PairingKey {
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn low(&self) -> u32 {
        self.low
    }

    pub fn high(&self) -> u32 {
        self.high
    }
}

impl fmt::Display for PairingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.low, self.high)
    }
}

/// Convenience matching the key format used in logs and persisted diagnostics.
pub fn pairing_key(op1: u32, op2: u32) -> PairingKey {
    PairingKey::new(op1, op2)
}

// ==================== Star Ratings ====================

/// Per-level mastery, 0..=4. Four is the crown tier.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub struct StarRating(u8);

impl StarRating {
    pub const NONE: StarRating = StarRating(0);
    pub const CROWN: StarRating = StarRating(4);
    pub const MAX: u8 = 4;

    /// Values above the crown tier are clamped.
    pub fn new(stars: u8) -> Self {
        Self(stars.min(Self::MAX))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_crown(&self) -> bool {
        self.0 == Self::MAX
    }

    /// Display form: a crown for the top tier, otherwise filled/empty stars out of three.
    pub fn glyphs(&self) -> String {
        if self.is_crown() {
            return "👑".to_string();
        }
        let filled = self.0 as usize;
        let mut out = "★".repeat(filled);
        out.push_str(&"☆".repeat(3 - filled));
        out
    }
}

impl From<u8> for StarRating {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<StarRating> for u8 {
    fn from(value: StarRating) -> Self {
        value.0
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==================== Number Ranges ====================

/// Inclusive range of numbers shown by a grid exercise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: u32,
    pub max: u32,
}

impl NumberRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn len(&self) -> usize {
        if self.max < self.min {
            0
        } else {
            (self.max - self.min + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, n: u32) -> bool {
        n >= self.min && n <= self.max
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.min..=self.max
    }
}
