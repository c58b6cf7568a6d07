use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};
use log::info;

use rollcraft::app::{parse_script, print_final_state, Session};
use rollcraft::WorldLayout;

const DEFAULT_SEED: u64 = 1;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let world = match &options.world {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read world file {path}"))?;
            WorldLayout::from_xml(&xml).with_context(|| format!("failed to parse world {path}"))?
        }
        None => WorldLayout::builtin(),
    };
    println!(
        "Loaded world with {} colliders (station at {:.2}, {:.2}, {:.2})",
        world.colliders.len(),
        world.station.x,
        world.station.y,
        world.station.z
    );

    let mut session = Session::new(world, options.seed);
    if let Some(path) = &options.script {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {path}"))?;
        let commands = parse_script(&text).with_context(|| format!("failed to parse script {path}"))?;
        println!("Running {} script command(s)", commands.len());
        session.run(&commands);
        info!("script finished after {} frames", session.frames());
    }

    print_final_state(&session);
    Ok(())
}

struct CliOptions {
    world: Option<String>,
    script: Option<String>,
    seed: u64,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        const USAGE: &str = "Usage: rollcraft [world.xml] [--script <file>] [--seed <n>]";
        let mut args = env::args().skip(1);
        let mut world = None;
        let mut script = None;
        let mut seed = DEFAULT_SEED;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--script" => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow!("--script needs a file. {USAGE}"))?;
                    script = Some(path);
                }
                "--seed" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--seed needs a value. {USAGE}"))?;
                    seed = value
                        .parse()
                        .with_context(|| format!("invalid seed `{value}`"))?;
                }
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
                path if world.is_none() => world = Some(path.to_string()),
                extra => return Err(anyhow!("Unexpected extra argument: {extra}. {USAGE}")),
            }
        }
        Ok(Self {
            world,
            script,
            seed,
        })
    }
}
