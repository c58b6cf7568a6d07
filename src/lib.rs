pub mod app;
pub mod collision;
pub mod config;
pub mod consumption;
pub mod cutscene;
pub mod data_model;
pub mod game;
pub mod input;
pub mod items;
pub mod player;
pub mod scene;
pub mod sequence;
pub mod timeline;
pub mod ui;
pub mod viewpoint;
pub mod visual;

pub use collision::{resolve_step, Collider, ColliderIndex, StepOutcome};
pub use config::{ConsumptionConfig, GameConfig};
pub use consumption::{Consumption, ConsumptionError, ConsumptionEvent};
pub use data_model::{SceneModel, SceneObject};
pub use game::{Deferred, Game, Hosts, Interaction};
pub use input::{Action, InputState, KeyCode, NamedKey};
pub use items::{CraftCounter, InteractError, ItemKind, ItemManager, KindFlags};
pub use player::{MoveIntent, PlayerState};
pub use scene::WorldLayout;
pub use sequence::{StepSequence, StepSequencer};
pub use timeline::Timeline;
pub use ui::{MessageLog, UiSink};
pub use viewpoint::{FirstPersonView, StaticViewpoint, Viewpoint, ViewpointProvider};
pub use visual::{Pose, SceneError, SceneHost, VisualHandle, VisualKind};
