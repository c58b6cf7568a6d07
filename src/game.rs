use std::sync::Arc;
use std::time::Duration;

use glam::{Vec2, Vec3};
use log::{debug, info, warn};

use crate::collision::{resolve_step, ColliderIndex, StepOutcome};
use crate::config::GameConfig;
use crate::consumption::{Consumption, ConsumptionError, ConsumptionEvent};
use crate::cutscene::crafting_cutscene;
use crate::input::{Action, InputState};
use crate::items::{CraftCounter, InteractError, ItemKind, ItemManager, StationOutcome};
use crate::player::{MoveIntent, PlayerState};
use crate::scene::WorldLayout;
use crate::sequence::{Completion, SequenceStatus, StepSequencer};
use crate::timeline::Timeline;
use crate::ui::UiSink;
use crate::viewpoint::{Viewpoint, ViewpointProvider};
use crate::visual::{spawn_or_placeholder, Pose, SceneHost, VisualHandle, VisualKind};

/// Work scheduled on the game [`Timeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    Message(String),
    AdvanceSequence { token: u64, index: usize },
    /// Repopulates the collectibles and releases the movement lock.
    Respawn,
    RemoveVisual(VisualHandle),
}

/// What a single interact signal ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Collected(ItemKind),
    Deposited(ItemKind),
    Assembling,
    Rejected(InteractError),
    Ignored,
}

/// Collaborators the game draws and reports through.
#[derive(Clone)]
pub struct Hosts {
    pub scene: Arc<dyn SceneHost>,
    pub ui: Arc<dyn UiSink>,
    pub view: Arc<dyn ViewpointProvider>,
}

/// Gameplay orchestrator, driven one frame at a time.
pub struct Game {
    config: GameConfig,
    colliders: ColliderIndex,
    player: PlayerState,
    timeline: Timeline<Deferred>,
    items: ItemManager,
    counter: CraftCounter,
    sequencer: StepSequencer,
    consumption: Consumption,
    movement_locked: bool,
    hosts: Hosts,
}

impl Game {
    /// Builds the world and spawns the first batch of collectibles.
    pub fn new(world: WorldLayout, seed: u64, hosts: Hosts) -> Self {
        let WorldLayout {
            config,
            player_start,
            player_yaw,
            station,
            colliders,
        } = world;
        let mut rng = fastrand::Rng::with_seed(seed);
        let items = ItemManager::new(
            config.clone(),
            station,
            rng.fork(),
            Arc::clone(&hosts.scene),
            Arc::clone(&hosts.ui),
        );
        let sequencer = StepSequencer::new(
            Arc::clone(&hosts.scene),
            Arc::clone(&hosts.ui),
            config.message_duration,
        );
        let consumption = Consumption::new(
            config.consumption.clone(),
            config.message_duration,
            rng.fork(),
            Arc::clone(&hosts.scene),
            Arc::clone(&hosts.ui),
        );

        let mut game = Self {
            colliders: ColliderIndex::from_colliders(colliders),
            player: PlayerState::new(player_start, player_yaw),
            timeline: Timeline::new(),
            items,
            counter: CraftCounter::default(),
            sequencer,
            consumption,
            movement_locked: false,
            config,
            hosts,
        };
        let exhausted = game.items.populate();
        if exhausted > 0 {
            warn!("{exhausted} collectibles placed without full separation");
        }
        game.hosts.ui.update_deposits(game.items.inventory().deposited());
        game.hosts.ui.update_craft_counter(game.counter.get());
        info!(
            "world ready: {} colliders, station at {}",
            game.colliders.len(),
            game.items.station()
        );
        game
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn items(&self) -> &ItemManager {
        &self.items
    }

    pub fn craft_count(&self) -> u32 {
        self.counter.get()
    }

    pub fn consumption(&self) -> &Consumption {
        &self.consumption
    }

    pub fn sequencer(&self) -> &StepSequencer {
        &self.sequencer
    }

    pub fn is_movement_locked(&self) -> bool {
        self.movement_locked
    }

    pub fn now(&self) -> Duration {
        self.timeline.now()
    }

    pub fn pending_tasks(&self) -> usize {
        self.timeline.pending()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn viewpoint(&self) -> Viewpoint {
        self.hosts.view.viewpoint(&self.player)
    }

    /// Consumes one frame of buffered input and advances the simulation.
    pub fn update(&mut self, input: &InputState, dt: f32) {
        self.look(input.take_look_delta());
        for action in input.drain_actions() {
            match action {
                Action::Interact => {
                    self.interact();
                }
                Action::ToggleConsumption => {
                    if let Err(err) = self.toggle_consumption() {
                        debug!("consumption toggle rejected: {err}");
                    }
                }
            }
        }
        self.tick(dt, input.move_intent());
    }

    /// Advances the clock by `dt` seconds.
    ///
    /// Negative or non-finite deltas are treated as zero.
    pub fn tick(&mut self, dt: f32, intent: MoveIntent) {
        let delta = Duration::try_from_secs_f32(dt).unwrap_or_default();
        let dt = delta.as_secs_f32();
        self.timeline.advance(delta);
        self.run_due_tasks();

        if !self.movement_locked && !intent.is_idle() {
            let candidate = self
                .player
                .next_position(dt, intent, self.config.move_speed);
            let outcome = resolve_step(
                &mut self.player,
                candidate,
                &self.colliders,
                self.config.player_radius,
            );
            if outcome == StepOutcome::Blocked {
                debug!("step to {candidate} blocked");
            }
        }

        let view = self.viewpoint();
        self.sequencer.follow(&view);
        let now = self.timeline.now();
        if let Some(ConsumptionEvent::Stopped { fully_consumed }) =
            self.consumption
                .tick(dt, now, &view, &mut self.counter)
        {
            debug!("consumption ended (fully consumed: {fully_consumed})");
        }
    }

    /// Applies look input unless a cutscene holds the camera.
    pub fn look(&mut self, delta: Vec2) {
        if self.movement_locked || delta == Vec2::ZERO {
            return;
        }
        self.player.apply_look(
            delta,
            self.config.mouse_sensitivity,
            self.config.pitch_limit,
        );
    }

    /// Handles one interact signal: collect first, then the station.
    pub fn interact(&mut self) -> Interaction {
        if self.movement_locked {
            debug!("interact ignored while movement is locked");
            return Interaction::Ignored;
        }
        let result = self.dispatch_interaction();
        match result {
            Ok(interaction) => interaction,
            Err(err) => {
                if err.is_user_facing() {
                    self.hosts
                        .ui
                        .show_message(&err.to_string(), self.config.message_duration);
                } else {
                    debug!("interaction rejected: {err}");
                }
                Interaction::Rejected(err)
            }
        }
    }

    fn dispatch_interaction(&mut self) -> Result<Interaction, InteractError> {
        if let Some(kind) = self.items.try_collect(&self.player, &mut self.timeline)? {
            return Ok(Interaction::Collected(kind));
        }
        match self.items.try_station(&self.player, &mut self.timeline)? {
            StationOutcome::OutOfReach => Ok(Interaction::Ignored),
            StationOutcome::Deposited(kind) => Ok(Interaction::Deposited(kind)),
            StationOutcome::ReadyToAssemble => self.assemble().map(|_| Interaction::Assembling),
        }
    }

    /// Clears the station and starts the crafting cutscene.
    pub fn assemble(&mut self) -> Result<(), InteractError> {
        if self.sequencer.is_playing() {
            return Err(InteractError::Busy);
        }
        self.items.begin_assembly()?;
        self.movement_locked = true;
        let view = self.viewpoint();
        match self
            .sequencer
            .start(crafting_cutscene(), &view, &mut self.timeline)
        {
            Ok(SequenceStatus::Completed(completion)) => self.on_sequence_complete(completion),
            Ok(_) => {}
            Err(err) => {
                warn!("{err}");
                self.movement_locked = false;
                return Err(InteractError::Busy);
            }
        }
        info!("crafting started");
        Ok(())
    }

    /// Starts or stops consuming a crafted unit.
    pub fn toggle_consumption(&mut self) -> Result<ConsumptionEvent, ConsumptionError> {
        let result = if !self.consumption.is_active() && self.sequencer.is_playing() {
            Err(ConsumptionError::Busy)
        } else {
            let view = self.viewpoint();
            self.consumption.toggle(&mut self.counter, &view)
        };
        if let Err(err) = result {
            self.hosts
                .ui
                .show_message(&err.to_string(), self.config.message_duration);
        }
        result
    }

    fn run_due_tasks(&mut self) {
        while let Some(task) = self.timeline.pop_due() {
            match task {
                Deferred::Message(text) => {
                    self.hosts
                        .ui
                        .show_message(&text, self.config.message_duration);
                }
                Deferred::AdvanceSequence { token, index } => {
                    let view = self.viewpoint();
                    let status = self.sequencer.play(token, index, &view, &mut self.timeline);
                    match status {
                        SequenceStatus::Completed(completion) => {
                            self.on_sequence_complete(completion)
                        }
                        SequenceStatus::Stale => debug!("dropped stale sequence advance"),
                        SequenceStatus::Playing { .. } => {}
                    }
                }
                Deferred::Respawn => {
                    let exhausted = self.items.populate();
                    if exhausted > 0 {
                        warn!("{exhausted} collectibles placed without full separation");
                    }
                    self.movement_locked = false;
                    info!("collectibles respawned");
                }
                Deferred::RemoveVisual(handle) => self.hosts.scene.remove_visual(handle),
            }
        }
    }

    fn on_sequence_complete(&mut self, completion: Completion) {
        match completion {
            Completion::Crafted => {
                let total = self.items.finish_assembly(&mut self.counter);
                let display = spawn_or_placeholder(
                    self.hosts.scene.as_ref(),
                    VisualKind::CraftedDisplay,
                    Pose::at(self.items.station() + Vec3::Y * self.config.deposit_lift),
                );
                self.timeline
                    .after(self.config.crafted_display, Deferred::RemoveVisual(display));
                self.timeline.after(self.config.respawn_delay, Deferred::Respawn);
                info!("crafted unit #{total}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::Collider;
    use crate::data_model::SceneModel;
    use crate::ui::MessageLog;
    use crate::viewpoint::FirstPersonView;

    fn open_world() -> WorldLayout {
        WorldLayout {
            colliders: Vec::new(),
            ..WorldLayout::builtin()
        }
    }

    fn game(world: WorldLayout) -> (Game, SceneModel, MessageLog) {
        let scene = SceneModel::new();
        let ui = MessageLog::new();
        let hosts = Hosts {
            scene: Arc::new(scene.clone()),
            ui: Arc::new(ui.clone()),
            view: Arc::new(FirstPersonView::new(0.8)),
        };
        (Game::new(world, 11, hosts), scene, ui)
    }

    #[test]
    fn new_game_spawns_one_item_per_kind() {
        let (game, scene, _ui) = game(WorldLayout::builtin());
        assert_eq!(game.items().items().len(), 4);
        assert_eq!(scene.count(|k| matches!(k, VisualKind::Item(_))), 4);
        assert!(!game.is_movement_locked());
    }

    #[test]
    fn walking_forward_moves_down_negative_z() {
        let (mut game, _scene, _ui) = game(open_world());
        for _ in 0..10 {
            game.tick(0.05, MoveIntent::FORWARD);
        }
        let position = game.player().position();
        assert!((position.z + 5.0).abs() < 1e-4, "{position}");
        assert_eq!(position.y, 1.0);
    }

    #[test]
    fn table_blocks_the_walk() {
        let (mut game, _scene, _ui) = game(WorldLayout::builtin());
        for _ in 0..120 {
            game.tick(1.0 / 60.0, MoveIntent::FORWARD);
        }
        let z = game.player().position().z;
        // Table front edge at z = -3.5 plus the player radius.
        assert!(z > -3.0 - 1e-3, "player walked into the table: {z}");
        assert!(z < -2.5, "player stopped too early: {z}");
    }

    #[test]
    fn negative_dt_is_clamped() {
        let (mut game, _scene, _ui) = game(open_world());
        game.tick(-1.0, MoveIntent::FORWARD);
        game.tick(f32::NAN, MoveIntent::FORWARD);
        assert_eq!(game.now(), Duration::ZERO);
        assert_eq!(game.player().position(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn assemble_requires_every_deposit() {
        let (mut game, _scene, _ui) = game(open_world());
        assert_eq!(game.assemble(), Err(InteractError::StationIncomplete));
        assert!(!game.is_movement_locked());
        assert!(!game.sequencer().is_playing());
    }

    #[test]
    fn smoking_without_units_is_refused() {
        let (mut game, _scene, ui) = game(open_world());
        assert_eq!(game.toggle_consumption(), Err(ConsumptionError::NoUnits));
        assert!(ui.saw("no cigarette"));
    }

    #[test]
    fn colliders_come_from_the_layout() {
        let world = WorldLayout {
            colliders: vec![Collider::from_size(Vec3::new(0.0, 0.5, -2.0), Vec3::ONE)],
            ..open_world()
        };
        let (mut game, _scene, _ui) = game(world);
        for _ in 0..60 {
            game.tick(1.0 / 60.0, MoveIntent::FORWARD);
        }
        assert!(game.player().position().z > -1.0 - 1e-3);
    }

    #[test]
    fn look_is_ignored_while_locked() {
        let (mut game, _scene, _ui) = game(open_world());
        game.movement_locked = true;
        game.look(Vec2::new(100.0, 0.0));
        assert_eq!(game.player().yaw(), 0.0);
        game.movement_locked = false;
        game.look(Vec2::new(100.0, 0.0));
        assert!((game.player().yaw() + 0.2).abs() < 1e-6);
    }
}
