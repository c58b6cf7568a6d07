use std::sync::Arc;

use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::items::ItemKind;
use crate::sequence::{PropId, PropShape};

/// Opaque identifier for something the scene host is drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

/// What a visual represents; the host picks the model or mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualKind {
    /// Collectible lying in the world.
    Item(ItemKind),
    /// Item laid out on the station after a deposit.
    Deposit(ItemKind),
    /// Cutscene prop anchored to the viewpoint.
    Prop { prop: PropId, shape: PropShape },
    /// Finished unit briefly shown on the station.
    CraftedDisplay,
    /// Unit held in front of the camera while it is consumed.
    HeldUnit,
    SmokePuff,
}

/// Transform and appearance pushed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub visible: bool,
    pub opacity: f32,
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            visible: true,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("asset for {kind:?} is unavailable: {reason}")]
    AssetUnavailable { kind: VisualKind, reason: String },
}

/// Rendering collaborator the gameplay core draws through.
pub trait SceneHost: Send + Sync {
    /// Spawns the authored asset for `kind`.
    fn spawn_visual(&self, kind: VisualKind, pose: Pose) -> Result<VisualHandle, SceneError>;
    /// Spawns a simple procedural stand-in; must not fail.
    fn spawn_placeholder(&self, kind: VisualKind, pose: Pose) -> VisualHandle;
    fn update_visual(&self, handle: VisualHandle, pose: Pose);
    fn remove_visual(&self, handle: VisualHandle);
}

impl<T> SceneHost for Arc<T>
where
    T: SceneHost + ?Sized,
{
    fn spawn_visual(&self, kind: VisualKind, pose: Pose) -> Result<VisualHandle, SceneError> {
        (**self).spawn_visual(kind, pose)
    }

    fn spawn_placeholder(&self, kind: VisualKind, pose: Pose) -> VisualHandle {
        (**self).spawn_placeholder(kind, pose)
    }

    fn update_visual(&self, handle: VisualHandle, pose: Pose) {
        (**self).update_visual(handle, pose)
    }

    fn remove_visual(&self, handle: VisualHandle) {
        (**self).remove_visual(handle)
    }
}

/// Spawns `kind`, substituting a placeholder when the asset is unavailable.
pub fn spawn_or_placeholder(scene: &dyn SceneHost, kind: VisualKind, pose: Pose) -> VisualHandle {
    match scene.spawn_visual(kind, pose) {
        Ok(handle) => handle,
        Err(err) => {
            warn!("{err}; using placeholder");
            scene.spawn_placeholder(kind, pose)
        }
    }
}
