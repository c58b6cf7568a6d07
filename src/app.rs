use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;
use log::debug;

use crate::data_model::SceneModel;
use crate::game::{Game, Hosts};
use crate::input::{InputState, KeyCode};
use crate::scene::WorldLayout;
use crate::ui::MessageLog;
use crate::viewpoint::FirstPersonView;

/// Fixed simulation step of the headless runner.
pub const FRAME_SECONDS: f32 = 1.0 / 60.0;
const FRAMES_PER_SECOND: f32 = 60.0;
/// Longest stretch a single `wait` or `tick` may simulate: one hour.
const MAX_COMMAND_FRAMES: u32 = 60 * 60 * 60;

/// One line of an input script.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptCommand {
    Press(KeyCode),
    Release(KeyCode),
    Look(Vec2),
    /// Runs frames for the given number of seconds.
    Wait(f32),
    Tick(u32),
}

impl ScriptCommand {
    fn frames(&self) -> u32 {
        match *self {
            ScriptCommand::Wait(seconds) => (seconds * FRAMES_PER_SECOND).round() as u32,
            ScriptCommand::Tick(frames) => frames,
            _ => 0,
        }
    }
}

/// Parses a script; blank lines and `#` comments are skipped.
pub fn parse_script(text: &str) -> Result<Vec<ScriptCommand>> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = line.split('#').next().unwrap_or_default().trim();
            (!line.is_empty()).then_some((index + 1, line))
        })
        .map(|(number, line)| parse_line(line).with_context(|| format!("line {number}: `{line}`")))
        .collect()
}

fn parse_line(line: &str) -> Result<ScriptCommand> {
    let mut words = line.split_whitespace();
    let verb = words.next().ok_or_else(|| anyhow!("empty command"))?;
    let args: Vec<&str> = words.collect();
    let command = match (verb, args.as_slice()) {
        ("press", [key]) => ScriptCommand::Press(parse_key(key)?),
        ("release", [key]) => ScriptCommand::Release(parse_key(key)?),
        ("look", [dx, dy]) => ScriptCommand::Look(Vec2::new(parse_number(dx)?, parse_number(dy)?)),
        ("wait", [seconds]) => {
            let seconds = parse_number(seconds)?;
            if !seconds.is_finite() || seconds < 0.0 {
                bail!("wait needs a non-negative duration");
            }
            if seconds * FRAMES_PER_SECOND > MAX_COMMAND_FRAMES as f32 {
                bail!("wait of {seconds}s exceeds {MAX_COMMAND_FRAMES} frames");
            }
            ScriptCommand::Wait(seconds)
        }
        ("tick", [frames]) => {
            let frames: u32 = frames
                .parse()
                .map_err(|err| anyhow!("bad frame count `{frames}`: {err}"))?;
            if frames > MAX_COMMAND_FRAMES {
                bail!("tick of {frames} exceeds {MAX_COMMAND_FRAMES} frames");
            }
            ScriptCommand::Tick(frames)
        }
        ("press" | "release" | "look" | "wait" | "tick", _) => {
            bail!("wrong number of arguments for `{verb}`")
        }
        (other, _) => bail!("unknown command `{other}`"),
    };
    Ok(command)
}

fn parse_key(name: &str) -> Result<KeyCode> {
    KeyCode::from_name(name).ok_or_else(|| anyhow!("unknown key `{name}`"))
}

fn parse_number(text: &str) -> Result<f32> {
    text.parse::<f32>()
        .map_err(|err| anyhow!("bad number `{text}`: {err}"))
}

/// A game wired to in-memory scene and HUD recorders.
pub struct Session {
    game: Game,
    input: InputState,
    scene: SceneModel,
    ui: MessageLog,
    frames: u64,
}

impl Session {
    pub fn new(world: WorldLayout, seed: u64) -> Self {
        let scene = SceneModel::new();
        let ui = MessageLog::new();
        let hosts = Hosts {
            scene: Arc::new(scene.clone()),
            ui: Arc::new(ui.clone()),
            view: Arc::new(FirstPersonView::new(world.config.eye_height)),
        };
        Self {
            game: Game::new(world, seed, hosts),
            input: InputState::new(),
            scene,
            ui,
            frames: 0,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn scene(&self) -> &SceneModel {
        &self.scene
    }

    pub fn ui(&self) -> &MessageLog {
        &self.ui
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advances one fixed frame.
    pub fn step(&mut self) {
        self.game.update(&self.input, FRAME_SECONDS);
        self.frames += 1;
    }

    pub fn run(&mut self, commands: &[ScriptCommand]) {
        for command in commands {
            debug!("script: {command:?}");
            match *command {
                ScriptCommand::Press(key) => self.input.set_key_down(key),
                ScriptCommand::Release(key) => self.input.set_key_up(key),
                ScriptCommand::Look(delta) => self.input.add_look(delta),
                ScriptCommand::Wait(_) | ScriptCommand::Tick(_) => {
                    for _ in 0..command.frames() {
                        self.step();
                    }
                }
            }
        }
    }
}

pub fn print_final_state(session: &Session) {
    let game = session.game();
    let player = game.player();
    let position = player.position();
    let inventory = game.items().inventory();
    println!("Final state after {} frames ({:.2}s):", session.frames(), game.now().as_secs_f32());
    println!(
        " - player pos=({:.2}, {:.2}, {:.2}) yaw={:.2} pitch={:.2}",
        position.x,
        position.y,
        position.z,
        player.yaw(),
        player.pitch()
    );
    println!(" - held: {}", inventory.held());
    println!(" - deposited: {}", inventory.deposited());
    println!(" - items in world: {}", game.items().items().len());
    println!(" - crafted: {}", game.craft_count());
    match game.consumption().remaining() {
        Some(length) => println!(" - consuming: yes (length {length:.3})"),
        None => println!(" - consuming: no"),
    }
    println!(" - visuals: {}", session.scene().len());
    println!("Messages:");
    for message in session.ui().messages() {
        println!(" - {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NamedKey;

    #[test]
    fn parses_commands_and_skips_comments() {
        let script = "# walk\npress W\nwait 0.5   # half a second\n\nlook 10 -4\nrelease Up\ntick 3\n";
        let commands = parse_script(script).unwrap();
        assert_eq!(
            commands,
            vec![
                ScriptCommand::Press(KeyCode::Character('W')),
                ScriptCommand::Wait(0.5),
                ScriptCommand::Look(Vec2::new(10.0, -4.0)),
                ScriptCommand::Release(KeyCode::Named(NamedKey::Up)),
                ScriptCommand::Tick(3),
            ]
        );
        assert_eq!(commands[1].frames(), 30);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = parse_script("press W\njump\n").unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("line 2"), "{text}");
        assert!(text.contains("unknown command"), "{text}");

        let err = parse_script("wait -1").unwrap_err();
        assert!(format!("{err:#}").contains("non-negative"));
        assert!(parse_script("press").is_err());
        assert!(format!("{:#}", parse_script("wait inf").unwrap_err()).contains("non-negative"));
        assert!(format!("{:#}", parse_script("wait 1e12").unwrap_err()).contains("exceeds"));
        assert!(format!("{:#}", parse_script("tick 4000000000").unwrap_err()).contains("exceeds"));
        assert!(parse_script("wait 3600\ntick 216000").is_ok());
        assert!(parse_script("press F13").is_err());
    }

    #[test]
    fn session_runs_script_frames() {
        let world = WorldLayout {
            colliders: Vec::new(),
            ..WorldLayout::builtin()
        };
        let mut session = Session::new(world, 5);
        let commands = parse_script("press W\nwait 0.5\nrelease W\ntick 2").unwrap();
        session.run(&commands);
        assert_eq!(session.frames(), 32);
        let z = session.game().player().position().z;
        assert!((z + 5.0).abs() < 1e-3, "{z}");
    }
}
