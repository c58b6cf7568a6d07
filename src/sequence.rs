use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::Deferred;
use crate::timeline::Timeline;
use crate::ui::UiSink;
use crate::viewpoint::Viewpoint;
use crate::visual::{spawn_or_placeholder, Pose, SceneHost, VisualHandle, VisualKind};

/// Cutscene props, positioned relative to the viewpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropId {
    LeftHand,
    RightHand,
    Paper,
    Tobacco,
    Taga,
    Filter,
    Crafted,
}

/// Mesh variant a prop is drawn with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropShape {
    #[default]
    Plain,
    Rolled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepOp {
    /// Moves a prop to a view-space offset.
    Place { prop: PropId, offset: Vec3 },
    Rotate { prop: PropId, rotation: Vec3 },
    Scale { prop: PropId, factor: f32 },
    Show(PropId),
    Hide(PropId),
    /// Swaps the prop's mesh, keeping its pose.
    Reshape { prop: PropId, shape: PropShape },
}

impl StepOp {
    /// The prop this op acts on.
    pub fn prop(&self) -> PropId {
        match *self {
            StepOp::Place { prop, .. }
            | StepOp::Rotate { prop, .. }
            | StepOp::Scale { prop, .. }
            | StepOp::Show(prop)
            | StepOp::Hide(prop)
            | StepOp::Reshape { prop, .. } => prop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    /// Time to hold this step before the next one runs.
    pub duration: Duration,
    pub ops: Vec<StepOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Initial placement of a prop when the rig is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropSetup {
    pub prop: PropId,
    pub offset: Vec3,
    pub visible: bool,
}

/// What the owner should do when a sequence runs out of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completion {
    Crafted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSequence {
    pub name: String,
    pub props: Vec<PropSetup>,
    pub steps: Vec<Step>,
    pub completion: Completion,
}

impl StepSequence {
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|step| step.duration).sum()
    }
}

/// Local pose of one prop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropPose {
    pub offset: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
    pub visible: bool,
    pub shape: PropShape,
}

impl PropPose {
    fn world(&self, view: &Viewpoint) -> Pose {
        Pose {
            position: view.to_world(self.offset),
            rotation: self.rotation,
            scale: Vec3::splat(self.scale),
            visible: self.visible,
            opacity: 1.0,
        }
    }
}

#[derive(Debug)]
struct RigProp {
    id: PropId,
    pose: PropPose,
    visual: VisualHandle,
}

/// Props of a running cutscene and their scene visuals.
#[derive(Debug, Default)]
pub struct CutsceneRig {
    props: Vec<RigProp>,
}

impl CutsceneRig {
    fn build(setups: &[PropSetup], scene: &dyn SceneHost, view: &Viewpoint) -> Self {
        let props = setups
            .iter()
            .map(|setup| {
                let pose = PropPose {
                    offset: setup.offset,
                    rotation: Vec3::ZERO,
                    scale: 1.0,
                    visible: setup.visible,
                    shape: PropShape::Plain,
                };
                let kind = VisualKind::Prop {
                    prop: setup.prop,
                    shape: pose.shape,
                };
                RigProp {
                    id: setup.prop,
                    visual: spawn_or_placeholder(scene, kind, pose.world(view)),
                    pose,
                }
            })
            .collect();
        Self { props }
    }

    pub fn pose(&self, id: PropId) -> Option<&PropPose> {
        self.props.iter().find(|p| p.id == id).map(|p| &p.pose)
    }

    fn apply(&mut self, op: &StepOp, scene: &dyn SceneHost, view: &Viewpoint) {
        let id = op.prop();
        let Some(prop) = self.props.iter_mut().find(|p| p.id == id) else {
            debug!("cutscene op targets missing prop {id:?}");
            return;
        };
        match *op {
            StepOp::Place { offset, .. } => prop.pose.offset = offset,
            StepOp::Rotate { rotation, .. } => prop.pose.rotation = rotation,
            StepOp::Scale { factor, .. } => prop.pose.scale = factor,
            StepOp::Show(_) => prop.pose.visible = true,
            StepOp::Hide(_) => prop.pose.visible = false,
            StepOp::Reshape { shape, .. } => {
                prop.pose.shape = shape;
                scene.remove_visual(prop.visual);
                let kind = VisualKind::Prop { prop: id, shape };
                prop.visual = spawn_or_placeholder(scene, kind, prop.pose.world(view));
            }
        }
    }

    /// Re-anchors every prop to the current viewpoint.
    fn follow(&self, scene: &dyn SceneHost, view: &Viewpoint) {
        for prop in &self.props {
            scene.update_visual(prop.visual, prop.pose.world(view));
        }
    }

    fn dismantle(self, scene: &dyn SceneHost) {
        for prop in self.props {
            scene.remove_visual(prop.visual);
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("sequence `{0}` is already playing")]
    AlreadyPlaying(String),
}

/// Progress reported by [`StepSequencer::play`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceStatus {
    Playing { index: usize, name: String },
    Completed(Completion),
    /// The advance belonged to a run that is no longer active.
    Stale,
}

#[derive(Debug)]
struct ActiveRun {
    token: u64,
    sequence: StepSequence,
    rig: CutsceneRig,
}

/// Plays at most one [`StepSequence`] at a time.
pub struct StepSequencer {
    scene: Arc<dyn SceneHost>,
    ui: Arc<dyn UiSink>,
    message_duration: Duration,
    active: Option<ActiveRun>,
    runs: u64,
}

impl StepSequencer {
    pub fn new(scene: Arc<dyn SceneHost>, ui: Arc<dyn UiSink>, message_duration: Duration) -> Self {
        Self {
            scene,
            ui,
            message_duration,
            active: None,
            runs: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn rig(&self) -> Option<&CutsceneRig> {
        self.active.as_ref().map(|run| &run.rig)
    }

    /// Builds the rig and runs the first step immediately.
    pub fn start(
        &mut self,
        sequence: StepSequence,
        view: &Viewpoint,
        timeline: &mut Timeline<Deferred>,
    ) -> Result<SequenceStatus, SequenceError> {
        if let Some(run) = &self.active {
            return Err(SequenceError::AlreadyPlaying(run.sequence.name.clone()));
        }
        self.runs += 1;
        let token = self.runs;
        debug!(
            "starting sequence `{}` ({} steps, {:?})",
            sequence.name,
            sequence.steps.len(),
            sequence.total_duration()
        );
        let rig = CutsceneRig::build(&sequence.props, self.scene.as_ref(), view);
        self.active = Some(ActiveRun {
            token,
            sequence,
            rig,
        });
        Ok(self.play(token, 0, view, timeline))
    }

    /// Executes step `index` of run `token` and schedules the next one.
    ///
    /// Past the last step the rig is torn down and the completion is returned.
    pub fn play(
        &mut self,
        token: u64,
        index: usize,
        view: &Viewpoint,
        timeline: &mut Timeline<Deferred>,
    ) -> SequenceStatus {
        let scene = self.scene.as_ref();
        let Some(run) = self.active.as_mut().filter(|run| run.token == token) else {
            return SequenceStatus::Stale;
        };

        let ActiveRun { sequence, rig, .. } = run;
        let Some(step) = sequence.steps.get(index) else {
            let completion = sequence.completion;
            debug!("sequence `{}` finished", sequence.name);
            if let Some(run) = self.active.take() {
                run.rig.dismantle(scene);
            }
            return SequenceStatus::Completed(completion);
        };

        debug!(
            "step {}/{}: {}",
            index + 1,
            sequence.steps.len(),
            step.name
        );
        for op in &step.ops {
            rig.apply(op, scene, view);
        }
        rig.follow(scene, view);
        if let Some(message) = &step.message {
            self.ui.show_message(message, self.message_duration);
        }
        timeline.after(
            step.duration,
            Deferred::AdvanceSequence {
                token,
                index: index + 1,
            },
        );
        SequenceStatus::Playing {
            index,
            name: step.name.clone(),
        }
    }

    /// Keeps the props glued to a moving viewpoint between steps.
    pub fn follow(&self, view: &Viewpoint) {
        if let Some(run) = &self.active {
            run.rig.follow(self.scene.as_ref(), view);
        }
    }
}
