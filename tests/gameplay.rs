use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use once_cell::sync::Lazy;

use rollcraft::{
    ConsumptionError, ConsumptionEvent, FirstPersonView, Game, GameConfig, Hosts, Interaction,
    ItemKind, MessageLog, MoveIntent, SceneModel, VisualKind, WorldLayout,
};

/// A tiny open world: every collectible spawns within reach of the player
/// and the station sits just past them.
static CRAMPED: Lazy<WorldLayout> = Lazy::new(|| WorldLayout {
    config: GameConfig {
        terrain_size: 1.0,
        ..GameConfig::default()
    },
    player_start: Vec3::new(0.0, 1.0, 1.2),
    player_yaw: 0.0,
    station: Vec3::new(0.0, 1.0, -1.5),
    colliders: Vec::new(),
});

/// Power-of-two step so frame times land exactly on step boundaries.
const FRAME: f32 = 1.0 / 64.0;

struct Harness {
    game: Game,
    scene: SceneModel,
    ui: MessageLog,
}

impl Harness {
    fn new() -> Self {
        let scene = SceneModel::new();
        let ui = MessageLog::new();
        let hosts = Hosts {
            scene: Arc::new(scene.clone()),
            ui: Arc::new(ui.clone()),
            view: Arc::new(FirstPersonView::new(0.8)),
        };
        let game = Game::new(CRAMPED.clone(), 42, hosts);
        Self { game, scene, ui }
    }

    fn run_for(&mut self, seconds: f32) {
        let frames = (seconds / FRAME).ceil() as u32;
        for _ in 0..frames {
            self.game.tick(FRAME, MoveIntent::default());
        }
    }

    fn collect_all(&mut self) {
        for _ in 0..4 {
            assert!(matches!(self.game.interact(), Interaction::Collected(_)));
        }
        assert!(self.game.items().inventory().has_all_items());
    }

    fn deposit_all(&mut self) -> Vec<ItemKind> {
        (0..4)
            .map(|_| match self.game.interact() {
                Interaction::Deposited(kind) => kind,
                other => panic!("expected a deposit, got {other:?}"),
            })
            .collect()
    }

    fn craft_one(&mut self) {
        self.collect_all();
        self.deposit_all();
        assert_eq!(self.game.interact(), Interaction::Assembling);
        self.run_for(19.1);
    }
}

#[test]
fn full_cycle_collect_deposit_craft_respawn_consume() {
    let mut h = Harness::new();
    assert_eq!(h.scene.count(|k| matches!(k, VisualKind::Item(_))), 4);

    h.collect_all();
    assert_eq!(h.game.items().items().len(), 0);
    h.run_for(1.1);
    assert!(h.ui.saw("You have everything!"));

    let order = h.deposit_all();
    assert_eq!(order, ItemKind::ALL.to_vec());
    assert_eq!(h.scene.count(|k| matches!(k, VisualKind::Deposit(_))), 4);
    h.run_for(1.1);
    assert!(h.ui.saw("Everything is on the table!"));

    assert_eq!(h.game.interact(), Interaction::Assembling);
    assert!(h.game.is_movement_locked());
    assert_eq!(h.scene.count(|k| matches!(k, VisualKind::Deposit(_))), 0);
    assert_eq!(h.scene.count(|k| matches!(k, VisualKind::Prop { .. })), 7);

    h.run_for(18.9);
    assert_eq!(h.game.craft_count(), 0, "cutscene still running");
    h.run_for(0.2);
    assert_eq!(h.game.craft_count(), 1);
    assert!(h.ui.saw("Your cigarette is ready!"));
    assert!(h.ui.saw("Total: 1"));
    assert_eq!(h.scene.count(|k| matches!(k, VisualKind::Prop { .. })), 0);
    assert_eq!(h.scene.count(|k| *k == VisualKind::CraftedDisplay), 1);
    assert!(h.game.is_movement_locked(), "settling before respawn");
    assert!(h.game.items().inventory().deposited().count() == 0);

    h.run_for(2.1);
    assert!(!h.game.is_movement_locked());
    assert_eq!(h.game.items().items().len(), 4);
    h.run_for(1.0);
    assert_eq!(h.scene.count(|k| *k == VisualKind::CraftedDisplay), 0);

    assert_eq!(h.game.toggle_consumption(), Ok(ConsumptionEvent::Started));
    h.run_for(17.0);
    assert!(h.game.consumption().is_active());
    h.run_for(1.0);
    assert!(!h.game.consumption().is_active());
    assert_eq!(h.game.craft_count(), 0);
    assert!(h.ui.saw("finished"));
    assert_eq!(h.scene.count(|k| *k == VisualKind::SmokePuff), 0);
}

#[test]
fn interact_and_look_are_ignored_during_the_cutscene() {
    let mut h = Harness::new();
    h.collect_all();
    h.deposit_all();
    assert_eq!(h.game.interact(), Interaction::Assembling);

    assert_eq!(h.game.interact(), Interaction::Ignored);
    h.game.look(glam::Vec2::new(200.0, 0.0));
    assert_eq!(h.game.player().yaw(), 0.0);
    let before = h.game.player().position();
    for _ in 0..30 {
        h.game.tick(FRAME, MoveIntent::FORWARD);
    }
    assert_eq!(h.game.player().position(), before);
}

#[test]
fn consumption_cannot_start_mid_cutscene_but_can_be_stopped() {
    let mut h = Harness::new();
    h.craft_one();
    h.run_for(2.1);
    assert_eq!(h.game.craft_count(), 1);

    assert_eq!(h.game.toggle_consumption(), Ok(ConsumptionEvent::Started));
    h.game.tick(FRAME, MoveIntent::default());

    // Items respawned within reach, so a second unit can be crafted while smoking.
    h.collect_all();
    h.deposit_all();
    assert_eq!(h.game.interact(), Interaction::Assembling);
    assert_eq!(
        h.game.toggle_consumption(),
        Ok(ConsumptionEvent::Stopped {
            fully_consumed: false
        })
    );
    assert_eq!(
        h.game.toggle_consumption(),
        Err(ConsumptionError::Busy)
    );
    assert!(h.ui.saw("while rolling"));
    assert_eq!(h.game.craft_count(), 1);
}

#[test]
fn missing_crafted_asset_uses_a_placeholder() {
    let mut h = Harness::new();
    h.scene.mark_missing(VisualKind::CraftedDisplay);
    h.craft_one();
    let display = h
        .scene
        .all_objects()
        .into_iter()
        .find(|object| object.kind == VisualKind::CraftedDisplay)
        .unwrap();
    assert!(display.placeholder);
}

#[test]
fn timeline_stays_empty_once_everything_settles() {
    let mut h = Harness::new();
    h.craft_one();
    h.run_for(3.1);
    assert_eq!(h.game.pending_tasks(), 0);
    assert!(h.game.now() > Duration::from_secs(22));
}
