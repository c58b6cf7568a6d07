use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use log::warn;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::collision::Collider;
use crate::config::GameConfig;

/// Static description of a playable world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldLayout {
    pub config: GameConfig,
    pub player_start: Vec3,
    pub player_yaw: f32,
    /// Centre of the deposit zone on top of the station.
    pub station: Vec3,
    pub colliders: Vec<Collider>,
}

impl Default for WorldLayout {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WorldLayout {
    /// The house clearing the game ships with: a table, some furniture and
    /// a ring of trees.
    pub fn builtin() -> Self {
        let mut colliders = vec![
            Collider::from_size(Vec3::new(0.0, 0.5, -5.0), Vec3::new(5.0, 1.0, 3.0)),
            Collider::from_size(Vec3::new(10.0, 1.0, 5.0), Vec3::new(2.0, 2.0, 2.0)),
            Collider::from_size(Vec3::new(-8.0, 1.5, -8.0), Vec3::new(3.0, 3.0, 1.0)),
            Collider::from_size(Vec3::new(7.0, 1.0, -7.0), Vec3::new(1.0, 2.0, 4.0)),
        ];
        let trees = [
            (15.0, 15.0),
            (-15.0, 15.0),
            (15.0, -15.0),
            (-15.0, -15.0),
            (5.0, 20.0),
            (-5.0, 20.0),
            (0.0, -20.0),
        ];
        colliders.extend(trees.into_iter().map(|(x, z)| Collider::Cylinder {
            center: Vec3::new(x, 5.0, z),
            radius: 2.0,
            height: 10.0,
        }));

        Self {
            config: GameConfig::default(),
            player_start: Vec3::new(0.0, 1.0, 0.0),
            player_yaw: 0.0,
            station: Vec3::new(0.0, 1.0, -5.0),
            colliders,
        }
    }

    /// Parses a `<world>` document.
    ///
    /// Missing `<player>` or `<station>` elements keep the built-in values;
    /// colliders are taken only from the file.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid world XML")?;
        let root = document.root_element();
        if !root.has_tag_name("world") {
            bail!("expected <world> root, found <{}>", root.tag_name().name());
        }

        let mut world = Self::builtin();
        world.colliders.clear();

        for node in root.children().filter(Node::is_element) {
            match node.tag_name().name() {
                "player" => {
                    world.player_start = parse_vec3(optional_text(&node, "position"), world.player_start)
                        .context("<player> position")?;
                    world.player_yaw =
                        parse_f32(optional_text(&node, "yaw"), world.player_yaw).context("<player> yaw")?;
                }
                "station" => {
                    world.station = parse_vec3(optional_text(&node, "position"), world.station)
                        .context("<station> position")?;
                }
                "collider" => {
                    let number = world.colliders.len() + 1;
                    let collider =
                        parse_collider(&node).with_context(|| format!("collider #{number}"))?;
                    world.colliders.push(collider);
                }
                "config" => world.config.apply_xml(&node).context("<config>")?,
                other => warn!("ignoring unknown world element <{other}>"),
            }
        }

        Ok(world)
    }
}

fn parse_collider(node: &Node<'_, '_>) -> Result<Collider> {
    let kind = required_text(node, "type")?;
    let center = parse_vec3(Some(required_text(node, "position")?), Vec3::ZERO)?;
    match kind.as_str() {
        "box" => {
            let size = parse_vec3(Some(required_text(node, "size")?), Vec3::ONE)?;
            Ok(Collider::from_size(center, size))
        }
        "cylinder" => Ok(Collider::Cylinder {
            center,
            radius: parse_f32(Some(required_text(node, "radius")?), 0.0)?,
            height: parse_f32(optional_text(node, "height"), 1.0)?,
        }),
        other => Err(anyhow!("unknown collider type `{other}`")),
    }
}

pub(crate) fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

pub(crate) fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

pub(crate) fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let components = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("bad vector component `{component}`: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match components[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(anyhow!(
            "vector needs 3 components, found {}",
            components.len()
        )),
    }
}

pub(crate) fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float `{value}`: {err}")),
        None => Ok(default),
    }
}

pub(crate) fn parse_u32(value: Option<String>, default: u32) -> Result<u32> {
    match value {
        Some(value) => value
            .parse::<u32>()
            .map_err(|err| anyhow!("failed to parse integer `{value}`: {err}")),
        None => Ok(default),
    }
}

pub(crate) fn parse_millis(value: Option<String>, default: Duration) -> Result<Duration> {
    match value {
        Some(value) => value
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|err| anyhow!("failed to parse milliseconds `{value}`: {err}")),
        None => Ok(default),
    }
}
