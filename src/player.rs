use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Movement intents held by the input boundary for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    pub const FORWARD: Self = Self {
        forward: true,
        backward: false,
        left: false,
        right: false,
    };

    pub fn is_idle(self) -> bool {
        self == Self::default()
    }
}

/// Kinematic player state.
///
/// The position only changes through [`PlayerState::apply_movement`], which
/// callers reach after validating the candidate against the collider index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    position: Vec3,
    yaw: f32,
    pitch: f32,
}

impl PlayerState {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Horizontal unit vector the player is facing; yaw 0 looks down -Z.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Horizontal unit vector to the player's right.
    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Computes where the player would stand after `dt` seconds of `intent`.
    ///
    /// Diagonal input is normalized so it is not faster than straight input.
    /// The vertical coordinate is carried over untouched.
    pub fn next_position(&self, dt: f32, intent: MoveIntent, move_speed: f32) -> Vec3 {
        let input = Vec2::new(
            axis(intent.right, intent.left),
            axis(intent.forward, intent.backward),
        )
        .normalize_or_zero();
        let velocity = (self.right() * input.x + self.forward() * input.y) * move_speed;
        Vec3::new(
            self.position.x + velocity.x * dt,
            self.position.y,
            self.position.z + velocity.z * dt,
        )
    }

    pub fn apply_movement(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Applies a look delta in pixels; pitch stays within `pitch_limit`.
    pub fn apply_look(&mut self, delta: Vec2, sensitivity: f32, pitch_limit: f32) {
        self.yaw -= delta.x * sensitivity;
        self.pitch = (self.pitch - delta.y * sensitivity).clamp(-pitch_limit, pitch_limit);
    }

    /// Dot product between the facing direction and the direction to `target`.
    pub fn facing_dot(&self, target: Vec3) -> f32 {
        (target - self.position).normalize_or_zero().dot(self.forward())
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    f32::from(u8::from(positive)) - f32::from(u8::from(negative))
}
