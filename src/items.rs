use std::f32::consts::{FRAC_PI_2, FRAC_PI_6};
use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GameConfig;
use crate::game::Deferred;
use crate::player::PlayerState;
use crate::timeline::Timeline;
use crate::ui::UiSink;
use crate::visual::{spawn_or_placeholder, Pose, SceneHost, VisualHandle, VisualKind};

/// The four ingredients a crafted unit is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Filter,
    Paper,
    Tobacco,
    Taga,
}

impl ItemKind {
    /// Fixed iteration order; deposits always pick the first eligible kind.
    pub const ALL: [ItemKind; 4] = [
        ItemKind::Filter,
        ItemKind::Paper,
        ItemKind::Tobacco,
        ItemKind::Taga,
    ];

    fn index(self) -> usize {
        match self {
            ItemKind::Filter => 0,
            ItemKind::Paper => 1,
            ItemKind::Tobacco => 2,
            ItemKind::Taga => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Filter => "Filter",
            ItemKind::Paper => "Paper",
            ItemKind::Tobacco => "Tobacco",
            ItemKind::Taga => "Taga",
        }
    }

    fn pickup_message(self) -> &'static str {
        match self {
            ItemKind::Filter => "Filter picked up!",
            ItemKind::Paper => "Rolling paper picked up!",
            ItemKind::Tobacco => "Tobacco picked up!",
            ItemKind::Taga => "Taga picked up!",
        }
    }

    /// Orientation of the item once laid on the station.
    fn deposit_rotation(self) -> Vec3 {
        match self {
            ItemKind::Tobacco | ItemKind::Taga => Vec3::new(-FRAC_PI_2, 0.0, 0.0),
            ItemKind::Paper => Vec3::new(0.0, FRAC_PI_6, 0.0),
            ItemKind::Filter => Vec3::ZERO,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One boolean per [`ItemKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KindFlags([bool; 4]);

impl KindFlags {
    pub fn get(&self, kind: ItemKind) -> bool {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: ItemKind, value: bool) {
        self.0[kind.index()] = value;
    }

    pub fn all(&self) -> bool {
        self.0.iter().all(|flag| *flag)
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|flag| **flag).count()
    }

    /// Kinds whose flag is set, in [`ItemKind::ALL`] order.
    pub fn kinds(self) -> impl Iterator<Item = ItemKind> {
        ItemKind::ALL.into_iter().filter(move |kind| self.get(*kind))
    }

    pub fn clear(&mut self) {
        self.0 = [false; 4];
    }
}

impl fmt::Display for KindFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in ItemKind::ALL.into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let mark = if self.get(kind) { "yes" } else { "no" };
            write!(f, "{}={mark}", kind.label().to_lowercase())?;
        }
        Ok(())
    }
}

/// Rejected inventory or station transitions.
///
/// The display text doubles as the corrective message shown to the player.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InteractError {
    #[error("You already carry the {0}.")]
    AlreadyHeld(ItemKind),
    #[error("The {0} is already on the table.")]
    AlreadyDeposited(ItemKind),
    #[error("You have nothing left to put on the table.")]
    NothingToDeposit,
    #[error("Put every item on the table before rolling!")]
    StationIncomplete,
    #[error("Your hands are busy right now.")]
    Busy,
}

impl InteractError {
    /// Whether the player should see this rejection or it only gets logged.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, InteractError::NothingToDeposit)
    }
}

/// Held and deposited flags; a kind is never both at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inventory {
    held: KindFlags,
    deposited: KindFlags,
}

impl Inventory {
    pub fn held(&self) -> KindFlags {
        self.held
    }

    pub fn deposited(&self) -> KindFlags {
        self.deposited
    }

    pub fn has_all_items(&self) -> bool {
        self.held.all()
    }

    pub fn has_all_deposits(&self) -> bool {
        self.deposited.all()
    }

    /// Marks `kind` as held.
    pub fn collect(&mut self, kind: ItemKind) -> Result<(), InteractError> {
        if self.held.get(kind) {
            return Err(InteractError::AlreadyHeld(kind));
        }
        if self.deposited.get(kind) {
            return Err(InteractError::AlreadyDeposited(kind));
        }
        self.held.set(kind, true);
        Ok(())
    }

    /// Moves the first held kind not yet on the station onto it.
    pub fn deposit_next(&mut self) -> Option<ItemKind> {
        let kind = ItemKind::ALL
            .into_iter()
            .find(|kind| self.held.get(*kind) && !self.deposited.get(*kind))?;
        self.held.set(kind, false);
        self.deposited.set(kind, true);
        Some(kind)
    }

    pub fn reset_deposits(&mut self) {
        self.deposited.clear();
    }
}

/// Number of finished units available for consumption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftCounter(u32);

impl CraftCounter {
    pub fn new(count: u32) -> Self {
        Self(count)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn increment(&mut self) -> u32 {
        self.0 += 1;
        self.0
    }

    /// Removes one unit, never going below zero.
    pub fn consume_one(&mut self) -> u32 {
        self.0 = self.0.saturating_sub(1);
        self.0
    }
}

/// Ingredient lying in the world waiting to be picked up.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectibleItem {
    pub kind: ItemKind,
    pub position: Vec3,
    pub pickup_radius: f32,
    pub visual: VisualHandle,
}

/// Result of a random placement search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    /// Set when no candidate met the separation constraint and the last
    /// drawn one was used anyway.
    pub exhausted: bool,
}

/// What a station interaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationOutcome {
    OutOfReach,
    Deposited(ItemKind),
    /// Everything is on the station; the caller should assemble.
    ReadyToAssemble,
}

/// Owns the collectibles, the inventory and the station deposits.
pub struct ItemManager {
    config: GameConfig,
    station: Vec3,
    items: Vec<CollectibleItem>,
    inventory: Inventory,
    deposit_visuals: Vec<VisualHandle>,
    rng: fastrand::Rng,
    scene: Arc<dyn SceneHost>,
    ui: Arc<dyn UiSink>,
}

impl ItemManager {
    pub fn new(
        config: GameConfig,
        station: Vec3,
        rng: fastrand::Rng,
        scene: Arc<dyn SceneHost>,
        ui: Arc<dyn UiSink>,
    ) -> Self {
        Self {
            config,
            station,
            items: Vec::new(),
            inventory: Inventory::default(),
            deposit_visuals: Vec::new(),
            rng,
            scene,
            ui,
        }
    }

    pub fn items(&self) -> &[CollectibleItem] {
        &self.items
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn station(&self) -> Vec3 {
        self.station
    }

    pub fn has_all_deposits(&self) -> bool {
        self.inventory.has_all_deposits()
    }

    /// Replaces the collectibles with a fresh batch, one per kind.
    ///
    /// Returns how many placements had to fall back to a too-close position.
    pub fn populate(&mut self) -> usize {
        for item in self.items.drain(..) {
            self.scene.remove_visual(item.visual);
        }
        let mut exhausted = 0;
        for kind in ItemKind::ALL {
            let placement = self.spawn_position();
            if placement.exhausted {
                exhausted += 1;
            }
            let visual = spawn_or_placeholder(
                self.scene.as_ref(),
                VisualKind::Item(kind),
                Pose::at(placement.position),
            );
            self.items.push(CollectibleItem {
                kind,
                position: placement.position,
                pickup_radius: self.config.interaction_distance,
                visual,
            });
        }
        self.ui.update_inventory(self.inventory.held());
        exhausted
    }

    /// Draws a random position at least the minimum separation away from
    /// every item already in the current batch.
    pub fn spawn_position(&mut self) -> Placement {
        let half = self.config.terrain_size / 2.0;
        let attempts = self.config.placement_attempts.max(1);
        let mut position = Vec3::ZERO;
        for _ in 0..attempts {
            position = Vec3::new(
                self.rng.f32() * self.config.terrain_size - half,
                self.config.item_height,
                self.rng.f32() * self.config.terrain_size - half,
            );
            if self.is_well_separated(position) {
                return Placement {
                    position,
                    exhausted: false,
                };
            }
        }
        warn!(
            "no valid item position after {attempts} attempts; using ({:.2}, {:.2})",
            position.x, position.z
        );
        Placement {
            position,
            exhausted: true,
        }
    }

    fn is_well_separated(&self, position: Vec3) -> bool {
        self.items
            .iter()
            .all(|item| position.distance(item.position) >= self.config.min_item_separation)
    }

    /// Picks up the first collectible in reach that the player faces.
    ///
    /// At most one item is handled per call.
    pub fn try_collect(
        &mut self,
        player: &PlayerState,
        timeline: &mut Timeline<Deferred>,
    ) -> Result<Option<ItemKind>, InteractError> {
        let origin = player.position();
        let Some(index) = self.items.iter().position(|item| {
            origin.distance(item.position) < item.pickup_radius
                && player.facing_dot(item.position) > self.config.collect_cone
        }) else {
            return Ok(None);
        };

        let kind = self.items[index].kind;
        self.inventory.collect(kind)?;
        let item = self.items.remove(index);
        self.scene.remove_visual(item.visual);
        self.ui.update_inventory(self.inventory.held());

        let mut message = kind.pickup_message().to_string();
        if self.inventory.has_all_items() {
            message.push_str(" You have every ingredient, take them to the table.");
            timeline.after(
                self.config.hint_delay,
                Deferred::Message("You have everything! Go to the house and drop it all on the table.".into()),
            );
        }
        self.ui.show_message(&message, self.config.message_duration);
        debug!("collected {kind}");
        Ok(Some(kind))
    }

    /// Deposits or reports readiness when the player stands at and faces the station.
    pub fn try_station(
        &mut self,
        player: &PlayerState,
        timeline: &mut Timeline<Deferred>,
    ) -> Result<StationOutcome, InteractError> {
        let distance = player.position().distance(self.station);
        if distance >= self.config.station_reach()
            || player.facing_dot(self.station) <= self.config.station_cone
        {
            return Ok(StationOutcome::OutOfReach);
        }
        if self.inventory.has_all_deposits() {
            return Ok(StationOutcome::ReadyToAssemble);
        }
        self.deposit(timeline).map(StationOutcome::Deposited)
    }

    /// Moves one held kind onto the station.
    pub fn deposit(&mut self, timeline: &mut Timeline<Deferred>) -> Result<ItemKind, InteractError> {
        let kind = self
            .inventory
            .deposit_next()
            .ok_or(InteractError::NothingToDeposit)?;

        let jitter = self.config.deposit_jitter;
        let offset = Vec3::new(
            (self.rng.f32() - 0.5) * jitter,
            self.config.deposit_lift,
            (self.rng.f32() - 0.5) * jitter,
        );
        let pose = Pose {
            rotation: kind.deposit_rotation(),
            ..Pose::at(self.station + offset)
        };
        let visual = spawn_or_placeholder(self.scene.as_ref(), VisualKind::Deposit(kind), pose);
        self.deposit_visuals.push(visual);

        self.ui
            .show_message(&format!("{kind} placed on the table!"), self.config.message_duration);
        self.ui.update_inventory(self.inventory.held());
        self.ui.update_deposits(self.inventory.deposited());

        if self.inventory.has_all_deposits() {
            timeline.after(
                self.config.hint_delay,
                Deferred::Message("Everything is on the table! Press E at the table to roll.".into()),
            );
        }
        Ok(kind)
    }

    /// Clears the station in preparation for the crafting cutscene.
    pub fn begin_assembly(&mut self) -> Result<(), InteractError> {
        if !self.inventory.has_all_deposits() {
            return Err(InteractError::StationIncomplete);
        }
        for visual in self.deposit_visuals.drain(..) {
            self.scene.remove_visual(visual);
        }
        Ok(())
    }

    /// Books a finished unit and empties the station.
    pub fn finish_assembly(&mut self, counter: &mut CraftCounter) -> u32 {
        let total = counter.increment();
        self.inventory.reset_deposits();
        self.ui.update_craft_counter(total);
        self.ui.update_deposits(self.inventory.deposited());
        self.ui.show_message(
            &format!("Congratulations! You rolled a cigarette! Total: {total}"),
            self.config.message_duration,
        );
        total
    }
}
