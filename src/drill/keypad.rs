//! On-screen answer keypad.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Longest answer the pad accepts; no drill sum needs more digits.
pub const MAX_ANSWER_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypadKey {
    Digit(u8),
    Backspace,
    Clear,
    Enter,
}

impl FromStr for KeypadKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backspace" => Ok(KeypadKey::Backspace),
            "clear" => Ok(KeypadKey::Clear),
            "enter" => Ok(KeypadKey::Enter),
            _ => match s.parse::<u8>() {
                Ok(d) if d <= 9 && s.len() == 1 => Ok(KeypadKey::Digit(d)),
                _ => Err(format!("unknown keypad key: {s}")),
            },
        }
    }
}

/// What a key press did to the pad.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PadAction {
    Edited(String),
    Submitted(String),
    Ignored,
}

#[derive(Clone, Debug, Default)]
pub struct AnswerPad {
    buffer: String,
    locked: bool,
}

impl AnswerPad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Locks the pad while a judgement is on screen.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.locked = false;
    }

    pub fn press(&mut self, key: KeypadKey) -> PadAction {
        if self.locked {
            return PadAction::Ignored;
        }
        match key {
            KeypadKey::Digit(d) if d <= 9 => {
                if self.buffer.len() >= MAX_ANSWER_LEN {
                    return PadAction::Ignored;
                }
                self.buffer.push(char::from(b'0' + d));
            }
            KeypadKey::Digit(_) => return PadAction::Ignored,
            KeypadKey::Backspace => {
                self.buffer.pop();
            }
            KeypadKey::Clear => self.buffer.clear(),
            KeypadKey::Enter => return PadAction::Submitted(std::mem::take(&mut self.buffer)),
        }
        PadAction::Edited(self.buffer.clone())
    }
}
