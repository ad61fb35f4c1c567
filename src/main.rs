//! Cellrunner headless runner.
//!
//! Runs the fixed-tick platformer simulation without a window:
//! - **bevy_ecs** for entity-component-system architecture
//! - **configparser** INI configuration and a **serde_json** cell catalog
//!
//! Input is scripted from the command line: a held horizontal direction plus
//! periodic jump and boost presses.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --ticks 3000 --hold right --jump-every 120
//! ```
use std::path::PathBuf;

use bevy_ecs::observer::{Observer, On};
use bevy_ecs::prelude::*;
use cellrunner::components::mapposition::MapPosition;
use cellrunner::components::motion::PlayerMotion;
use cellrunner::components::player::PlayerController;
use cellrunner::components::rigidbody::RigidBody;
use cellrunner::events::input::PlayerInput;
use cellrunner::events::motion::{LandEvent, LeaveGroundEvent};
use cellrunner::game::{build_schedule, send_input, setup_world, step};
use cellrunner::resources::cellcatalog::CellCatalog;
use cellrunner::resources::cellmaster::CellMaster;
use cellrunner::resources::gameconfig::GameConfig;
use cellrunner::resources::worldtime::WorldTime;
use clap::{Parser, ValueEnum};
use log::{error, info, warn};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Hold {
    Left,
    Right,
    None,
}

impl Hold {
    fn axis(self) -> f32 {
        match self {
            Hold::Left => -1.0,
            Hold::Right => 1.0,
            Hold::None => 0.0,
        }
    }
}

/// Cellrunner headless simulation
#[derive(Parser)]
#[command(version, about = "Runs the cellrunner platformer simulation headless.")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// JSON cell catalog. Overrides the one named in the configuration.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Number of fixed ticks to simulate.
    #[arg(long, default_value_t = 1500)]
    ticks: u64,

    /// Seed for cell selection. Overrides the configuration.
    #[arg(long)]
    seed: Option<u64>,

    /// Horizontal direction held for the whole run.
    #[arg(long, value_enum, default_value_t = Hold::Right)]
    hold: Hold,

    /// Press jump every N ticks (0 disables).
    #[arg(long, value_name = "N", default_value_t = 0)]
    jump_every: u64,

    /// Press boost every N ticks (0 disables).
    #[arg(long, value_name = "N", default_value_t = 0)]
    boost_every: u64,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    write_config: bool,
}

#[derive(Resource, Default, Debug)]
struct GroundStats {
    landings: u32,
    takeoffs: u32,
}

fn count_landings(_trigger: On<LandEvent>, mut stats: ResMut<GroundStats>) {
    stats.landings += 1;
}

fn count_takeoffs(_trigger: On<LeaveGroundEvent>, mut stats: ResMut<GroundStats>) {
    stats.takeoffs += 1;
}

fn load_catalog(path: Option<&PathBuf>, config: &GameConfig) -> CellCatalog {
    let Some(path) = path else {
        return CellCatalog::builtin(config.cell_size);
    };
    match CellCatalog::load_from_file(&path.to_string_lossy()) {
        Ok(catalog) if !catalog.is_empty() => {
            info!("Loaded {} cell prototypes from {}", catalog.len(), path.display());
            catalog
        }
        Ok(_) => {
            warn!("Catalog {} is empty, using the built-in one", path.display());
            CellCatalog::builtin(config.cell_size)
        }
        Err(e) => {
            error!("Cannot load catalog {}: {}", path.display(), e);
            CellCatalog::builtin(config.cell_size)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(cli.config.clone());
    if let Err(e) = config.load_from_file() {
        warn!("{}; using defaults", e);
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(path) = &cli.catalog {
        config.catalog_path = Some(path.clone());
    }

    if cli.write_config {
        match config.save_to_file() {
            Ok(()) => println!("Configuration written to {}", config.config_path.display()),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let catalog = load_catalog(config.catalog_path.as_ref(), &config);
    let (mut world, player) = setup_world(&config, catalog);
    world.init_resource::<GroundStats>();
    world.spawn(Observer::new(count_landings));
    world.spawn(Observer::new(count_takeoffs));
    world.flush();

    let mut update = build_schedule();
    send_input(&mut world, player, PlayerInput::Directional(cli.hold.axis()));

    for tick in 1..=cli.ticks {
        if cli.jump_every > 0 && tick % cli.jump_every == 0 {
            send_input(&mut world, player, PlayerInput::JumpStarted);
        }
        if cli.boost_every > 0 && tick % cli.boost_every == 0 {
            send_input(&mut world, player, PlayerInput::BoostStarted);
        }
        step(&mut world, &mut update);
    }

    let time = world.resource::<WorldTime>();
    let cells = world.resource::<CellMaster>().len();
    let stats = world.resource::<GroundStats>();
    info!(
        "Simulated {} ticks, {:.2}s, {} cells loaded, {} landings, {} take-offs",
        time.frame_count, time.elapsed, cells, stats.landings, stats.takeoffs
    );
    let player_ref = world.entity(player);
    if let (Some(position), Some(body), Some(motion), Some(controller)) = (
        player_ref.get::<MapPosition>(),
        player_ref.get::<RigidBody>(),
        player_ref.get::<PlayerMotion>(),
        player_ref.get::<PlayerController>(),
    ) {
        info!(
            "Player at ({:.2}, {:.2}) moving ({:.2}, {:.2}), grounded {}, {} jumps left",
            position.pos.x,
            position.pos.y,
            body.velocity.x,
            body.velocity.y,
            motion.grounded(),
            motion.jumps_left()
        );
        if let Some(slot) = world.resource::<CellMaster>().coordinate(position.pos) {
            info!("Player is in cell slot {}", slot);
        }
        info!(
            "Combo {:.1}, score {}, health {}",
            controller.combo, controller.score, controller.health
        );
    }
}
