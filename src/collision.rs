use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::player::PlayerState;

/// Static volume the player cannot walk through.
///
/// Only the XZ footprint takes part in queries; heights are kept so the
/// layout can be round-tripped and drawn by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Collider {
    Box { center: Vec3, half_extents: Vec3 },
    Cylinder { center: Vec3, radius: f32, height: f32 },
}

impl Collider {
    /// Builds a box from its full size, as authored in world files.
    pub fn from_size(center: Vec3, size: Vec3) -> Self {
        Self::Box {
            center,
            half_extents: size * 0.5,
        }
    }

    /// Returns true when a disc of `radius` at `position` overlaps this footprint.
    pub fn blocks(&self, position: Vec3, radius: f32) -> bool {
        match *self {
            Collider::Box {
                center,
                half_extents,
            } => {
                let min_x = center.x - half_extents.x - radius;
                let max_x = center.x + half_extents.x + radius;
                let min_z = center.z - half_extents.z - radius;
                let max_z = center.z + half_extents.z + radius;
                position.x > min_x && position.x < max_x && position.z > min_z && position.z < max_z
            }
            Collider::Cylinder {
                center,
                radius: cylinder_radius,
                ..
            } => {
                let planar = Vec2::new(position.x - center.x, position.z - center.z);
                planar.length() < cylinder_radius + radius
            }
        }
    }
}

/// Flat list of every collider in the world.
///
/// Worlds carry tens of colliders, so queries are a linear scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColliderIndex {
    colliders: Vec<Collider>,
}

impl ColliderIndex {
    pub fn from_colliders(colliders: Vec<Collider>) -> Self {
        Self { colliders }
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Returns true if any collider blocks `candidate`.
    pub fn query(&self, candidate: Vec3, player_radius: f32) -> bool {
        self.colliders
            .iter()
            .any(|collider| collider.blocks(candidate, player_radius))
    }
}

/// Result of one movement resolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Blocked,
}

/// Commits `candidate` to the player if it is clear of every collider.
///
/// A blocked candidate is discarded whole: the player keeps the previous
/// position, with no sliding along the free axis.
pub fn resolve_step(
    player: &mut PlayerState,
    candidate: Vec3,
    colliders: &ColliderIndex,
    player_radius: f32,
) -> StepOutcome {
    if colliders.query(candidate, player_radius) {
        StepOutcome::Blocked
    } else {
        player.apply_movement(candidate);
        StepOutcome::Moved
    }
}
