use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::player::PlayerState;

/// Camera frame used to anchor view-relative props.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Viewpoint {
    /// Converts a view-space offset (x right, y up, -z ahead) to world space.
    pub fn to_world(&self, offset: Vec3) -> Vec3 {
        self.position + self.right * offset.x + self.up * offset.y - self.forward * offset.z
    }
}

/// Supplies the active camera frame for the current player state.
pub trait ViewpointProvider: Send + Sync {
    fn viewpoint(&self, player: &PlayerState) -> Viewpoint;
}

/// Camera sitting at the player's eyes, looking along yaw and pitch.
#[derive(Debug, Clone, Copy)]
pub struct FirstPersonView {
    pub eye_height: f32,
}

impl FirstPersonView {
    pub const fn new(eye_height: f32) -> Self {
        Self { eye_height }
    }
}

impl ViewpointProvider for FirstPersonView {
    fn viewpoint(&self, player: &PlayerState) -> Viewpoint {
        let (yaw, pitch) = (player.yaw(), player.pitch());
        let forward = Vec3::new(
            -yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        );
        let right = player.right();
        Viewpoint {
            position: player.position() + Vec3::Y * self.eye_height,
            forward,
            right,
            up: right.cross(forward),
        }
    }
}

/// Viewpoint that ignores the player entirely.
#[derive(Debug, Clone, Copy)]
pub struct StaticViewpoint(pub Viewpoint);

impl StaticViewpoint {
    /// Camera at `position` looking down -Z.
    pub fn looking_ahead(position: Vec3) -> Self {
        Self(Viewpoint {
            position,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        })
    }
}

impl ViewpointProvider for StaticViewpoint {
    fn viewpoint(&self, _player: &PlayerState) -> Viewpoint {
        self.0
    }
}

impl<T> ViewpointProvider for Arc<T>
where
    T: ViewpointProvider + ?Sized,
{
    fn viewpoint(&self, player: &PlayerState) -> Viewpoint {
        (**self).viewpoint(player)
    }
}
