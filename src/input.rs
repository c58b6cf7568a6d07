use std::collections::HashSet;

use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::player::MoveIntent;

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
}

impl KeyCode {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };
        if ch.is_ascii_alphabetic() {
            return Some(Self::Character(ch.to_ascii_uppercase()));
        }
        ch.to_digit(10).map(|digit| Self::Digit(digit as u8))
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" => Space,
        "Enter" | "Return" => Enter,
        "Left" | "ArrowLeft" => Left,
        "Right" | "ArrowRight" => Right,
        "Up" | "ArrowUp" => Up,
        "Down" | "ArrowDown" => Down,
        "Escape" | "Esc" => Escape,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the non-character keys the game listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Left,
    Right,
    Up,
    Down,
    Escape,
}

/// Discrete signals raised on key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Interact,
    ToggleConsumption,
}

const FORWARD_KEYS: [KeyCode; 2] = [KeyCode::Character('W'), KeyCode::Named(NamedKey::Up)];
const BACKWARD_KEYS: [KeyCode; 2] = [KeyCode::Character('S'), KeyCode::Named(NamedKey::Down)];
const LEFT_KEYS: [KeyCode; 2] = [KeyCode::Character('A'), KeyCode::Named(NamedKey::Left)];
const RIGHT_KEYS: [KeyCode; 2] = [KeyCode::Character('D'), KeyCode::Named(NamedKey::Right)];

fn action_for(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::Character('E') => Some(Action::Interact),
        KeyCode::Character('U') => Some(Action::ToggleConsumption),
        _ => None,
    }
}

/// Thread-safe input buffer filled by the platform layer and drained by the
/// game once per frame.
#[derive(Debug, Default)]
pub struct InputState {
    keys: RwLock<HashSet<KeyCode>>,
    actions: RwLock<Vec<Action>>,
    look: RwLock<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` held; the first press of an action key queues its action.
    pub fn set_key_down(&self, key: KeyCode) {
        let newly_pressed = self.keys.write().insert(key);
        if newly_pressed {
            if let Some(action) = action_for(key) {
                self.actions.write().push(action);
            }
        }
    }

    pub fn set_key_up(&self, key: KeyCode) {
        self.keys.write().remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.read().contains(&key)
    }

    pub fn is_key_down_by_name(&self, name: &str) -> bool {
        KeyCode::from_name(name).is_some_and(|key| self.is_key_down(key))
    }

    /// Accumulates pointer motion until the next frame takes it.
    pub fn add_look(&self, delta: Vec2) {
        *self.look.write() += delta;
    }

    pub fn take_look_delta(&self) -> Vec2 {
        std::mem::take(&mut *self.look.write())
    }

    pub fn drain_actions(&self) -> Vec<Action> {
        std::mem::take(&mut *self.actions.write())
    }

    /// Movement intents derived from the held keys.
    pub fn move_intent(&self) -> MoveIntent {
        let keys = self.keys.read();
        let any = |bound: &[KeyCode]| bound.iter().any(|key| keys.contains(key));
        MoveIntent {
            forward: any(&FORWARD_KEYS),
            backward: any(&BACKWARD_KEYS),
            left: any(&LEFT_KEYS),
            right: any(&RIGHT_KEYS),
        }
    }
}
