use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::visual::{Pose, SceneError, SceneHost, VisualHandle, VisualKind};

/// Visual as recorded by the headless scene model.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub handle: VisualHandle,
    pub kind: VisualKind,
    pub pose: Pose,
    /// True when the authored asset was missing and a stand-in was spawned.
    pub placeholder: bool,
}

#[derive(Debug, Default)]
struct SceneState {
    objects: Vec<SceneObject>,
    next_handle: u64,
    missing: HashSet<VisualKind>,
}

impl SceneState {
    fn insert(&mut self, kind: VisualKind, pose: Pose, placeholder: bool) -> VisualHandle {
        self.next_handle += 1;
        let handle = VisualHandle(self.next_handle);
        self.objects.push(SceneObject {
            handle,
            kind,
            pose,
            placeholder,
        });
        handle
    }
}

/// Thread-safe scene host that keeps every live visual in memory.
///
/// Used by the headless binary and by tests in place of a renderer.
#[derive(Debug, Default)]
pub struct SceneModel {
    state: Arc<RwLock<SceneState>>,
}

impl Clone for SceneModel {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl SceneModel {
    /// Creates an empty scene model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later spawn of `kind` fail as if its asset were missing.
    pub fn mark_missing(&self, kind: VisualKind) {
        self.state.write().missing.insert(kind);
    }

    /// Returns a snapshot of all live visuals.
    pub fn all_objects(&self) -> Vec<SceneObject> {
        self.state.read().objects.clone()
    }

    /// Returns a clone of the requested visual.
    pub fn get(&self, handle: VisualHandle) -> Option<SceneObject> {
        self.state
            .read()
            .objects
            .iter()
            .find(|object| object.handle == handle)
            .cloned()
    }

    /// Counts live visuals matching `predicate`.
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&VisualKind) -> bool,
    {
        self.state
            .read()
            .objects
            .iter()
            .filter(|object| predicate(&object.kind))
            .count()
    }

    pub fn len(&self) -> usize {
        self.state.read().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SceneHost for SceneModel {
    fn spawn_visual(&self, kind: VisualKind, pose: Pose) -> Result<VisualHandle, SceneError> {
        let mut state = self.state.write();
        if state.missing.contains(&kind) {
            return Err(SceneError::AssetUnavailable {
                kind,
                reason: "not bundled with this build".into(),
            });
        }
        Ok(state.insert(kind, pose, false))
    }

    fn spawn_placeholder(&self, kind: VisualKind, pose: Pose) -> VisualHandle {
        self.state.write().insert(kind, pose, true)
    }

    fn update_visual(&self, handle: VisualHandle, pose: Pose) {
        let mut state = self.state.write();
        if let Some(object) = state.objects.iter_mut().find(|o| o.handle == handle) {
            object.pose = pose;
        }
    }

    fn remove_visual(&self, handle: VisualHandle) {
        self.state.write().objects.retain(|object| object.handle != handle);
    }
}
