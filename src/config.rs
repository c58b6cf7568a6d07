use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use anyhow::{Context, Result};
use roxmltree::Node;
use serde::{Deserialize, Serialize};

use crate::scene::{optional_text, parse_f32, parse_millis, parse_u32};

/// Tunable gameplay constants.
///
/// Defaults reproduce the feel of the shipped game; a world file may
/// override any of them through its `<config>` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Walking speed in world units per second.
    pub move_speed: f32,
    /// Footprint radius used for collision queries.
    pub player_radius: f32,
    /// Radians of yaw/pitch per pixel of look input.
    pub mouse_sensitivity: f32,
    /// Absolute pitch limit in radians.
    pub pitch_limit: f32,
    /// Height of the first-person eye above the player origin.
    pub eye_height: f32,
    pub interaction_distance: f32,
    /// Minimum dot product between facing and target direction for pickups.
    pub collect_cone: f32,
    /// Minimum dot product for station interactions (wider than pickups).
    pub station_cone: f32,
    /// Station reach as a multiple of `interaction_distance`.
    pub station_reach_factor: f32,
    /// Side length of the square area collectibles spawn in.
    pub terrain_size: f32,
    pub min_item_separation: f32,
    pub placement_attempts: u32,
    pub item_height: f32,
    pub deposit_jitter: f32,
    pub deposit_lift: f32,
    pub message_duration: Duration,
    pub hint_delay: Duration,
    pub respawn_delay: Duration,
    pub crafted_display: Duration,
    pub consumption: ConsumptionConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            player_radius: 0.5,
            mouse_sensitivity: 0.002,
            pitch_limit: FRAC_PI_2 - 0.1,
            eye_height: 0.8,
            interaction_distance: 2.0,
            collect_cone: 0.5,
            station_cone: 0.3,
            station_reach_factor: 2.0,
            terrain_size: 40.0,
            min_item_separation: 5.0,
            placement_attempts: 100,
            item_height: 1.0,
            deposit_jitter: 0.8,
            deposit_lift: 0.1,
            message_duration: Duration::from_millis(3000),
            hint_delay: Duration::from_millis(1000),
            respawn_delay: Duration::from_millis(2000),
            crafted_display: Duration::from_millis(3000),
            consumption: ConsumptionConfig::default(),
        }
    }
}

impl GameConfig {
    /// Distance within which the station accepts deposits.
    pub fn station_reach(&self) -> f32 {
        self.interaction_distance * self.station_reach_factor
    }

    /// Applies the overrides found under a `<config>` element.
    ///
    /// Durations are given in milliseconds. Absent tags keep their value.
    pub fn apply_xml(&mut self, node: &Node<'_, '_>) -> Result<()> {
        let scalars: [(&str, &mut f32); 15] = [
            ("move_speed", &mut self.move_speed),
            ("player_radius", &mut self.player_radius),
            ("mouse_sensitivity", &mut self.mouse_sensitivity),
            ("pitch_limit", &mut self.pitch_limit),
            ("eye_height", &mut self.eye_height),
            ("interaction_distance", &mut self.interaction_distance),
            ("collect_cone", &mut self.collect_cone),
            ("station_cone", &mut self.station_cone),
            ("station_reach_factor", &mut self.station_reach_factor),
            ("terrain_size", &mut self.terrain_size),
            ("min_item_separation", &mut self.min_item_separation),
            ("item_height", &mut self.item_height),
            ("deposit_jitter", &mut self.deposit_jitter),
            ("deposit_lift", &mut self.deposit_lift),
            ("consumption_rate", &mut self.consumption.rate),
        ];
        for (tag, slot) in scalars {
            *slot = parse_f32(optional_text(node, tag), *slot).with_context(|| format!("<{tag}>"))?;
        }

        let durations: [(&str, &mut Duration); 5] = [
            ("message_duration", &mut self.message_duration),
            ("hint_delay", &mut self.hint_delay),
            ("respawn_delay", &mut self.respawn_delay),
            ("crafted_display", &mut self.crafted_display),
            ("emission_interval", &mut self.consumption.emission_interval),
        ];
        for (tag, slot) in durations {
            *slot = parse_millis(optional_text(node, tag), *slot).with_context(|| format!("<{tag}>"))?;
        }

        self.placement_attempts = parse_u32(optional_text(node, "placement_attempts"), self.placement_attempts)
            .context("<placement_attempts>")?;
        Ok(())
    }
}

/// Constants driving the consumption activity and its smoke particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionConfig {
    pub initial_length: f32,
    /// Length at which a unit counts as fully consumed.
    pub floor_length: f32,
    /// Length lost per second while active.
    pub rate: f32,
    pub emission_interval: Duration,
    /// Bobbing factor above which a puff may be emitted.
    pub puff_threshold: f32,
    /// Angular frequency of the bobbing cycle, in radians per second.
    pub bob_frequency: f32,
    pub pool_capacity: usize,
    pub min_lifespan: f32,
    pub max_lifespan: f32,
}

impl Default for ConsumptionConfig {
    fn default() -> Self {
        Self {
            initial_length: 0.4,
            floor_length: 0.05,
            rate: 0.02,
            emission_interval: Duration::from_millis(300),
            puff_threshold: 0.8,
            bob_frequency: 0.5,
            pool_capacity: 50,
            min_lifespan: 2.0,
            max_lifespan: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_reach_doubles_interaction_distance() {
        let config = GameConfig::default();
        assert_eq!(config.station_reach(), 4.0);
    }

    #[test]
    fn xml_overrides_keep_unlisted_defaults() {
        let xml = "<config><move_speed>4.5</move_speed><hint_delay>250</hint_delay>\
                   <placement_attempts>7</placement_attempts></config>";
        let document = roxmltree::Document::parse(xml).unwrap();
        let mut config = GameConfig::default();
        config.apply_xml(&document.root_element()).unwrap();
        assert_eq!(config.move_speed, 4.5);
        assert_eq!(config.hint_delay, Duration::from_millis(250));
        assert_eq!(config.placement_attempts, 7);
        assert_eq!(config.player_radius, 0.5);
    }

    #[test]
    fn malformed_override_is_an_error() {
        let document = roxmltree::Document::parse("<config><move_speed>fast</move_speed></config>")
            .unwrap();
        let err = GameConfig::default()
            .apply_xml(&document.root_element())
            .unwrap_err();
        assert!(format!("{err:#}").contains("move_speed"));
    }

    #[test]
    fn station_cone_is_wider_than_collect_cone() {
        let config = GameConfig::default();
        assert!(config.station_cone < config.collect_cone);
    }
}
