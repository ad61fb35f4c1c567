//! Simulation configuration resource.
//!
//! Holds every tunable constant of the simulation, loaded from an INI
//! configuration file. Provides defaults for safe startup and methods to
//! load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! fixed_delta = 0.02
//! time_scale = 1.0
//!
//! [world]
//! gravity_y = -9.81
//! cell_width = 200
//! cell_height = 200
//! degeneration_grace = 0.05
//! seed = 1
//! catalog = ./cells.json
//!
//! [motion]
//! max_jumps = 4
//! jump_speed = 2.0
//! horizontal_acceleration = 2.0
//! boost_cooldown = 5.0
//!
//! [player]
//! max_health = 20
//! jump_request_buffer = 0.5
//! ```
//!
//! Every key of [`MotionParams`] and [`PlayerParams`] that is a plain number
//! can be set the same way. Missing keys keep their defaults.

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use glam::Vec2;
use log::{info, warn};
use std::path::PathBuf;

use crate::components::mapcell::{DEFAULT_CELL_SIZE, DEFAULT_DEGENERATION_GRACE};
use crate::components::motion::MotionParams;
use crate::components::player::PlayerParams;
use crate::resources::worldtime::DEFAULT_FIXED_DELTA;

/// Default safe values for startup
const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_WORLD_GRAVITY_Y: f32 = -9.81;
const DEFAULT_BODY_GRAVITY_SCALE: f32 = 0.0;
const DEFAULT_SEED: u64 = 1;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Simulation configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// Unscaled tick length in seconds.
    pub fixed_delta: f32,
    pub time_scale: f32,
    /// World gravity handed to rigid bodies.
    pub world_gravity: Vec2,
    /// Scale of world gravity on the player body. The motion controller
    /// applies its own gravity on top.
    pub body_gravity_scale: f32,
    pub cell_size: Vec2,
    pub degeneration_grace: f32,
    /// Seed for cell selection.
    pub seed: u64,
    /// Optional JSON cell catalog. The built-in catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    pub motion: MotionParams,
    pub player: PlayerParams,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_f32(config: &Ini, section: &str, key: &str, target: &mut f32) {
    if let Some(v) = config.getfloat(section, key).ok().flatten() {
        *target = v as f32;
    }
}

fn read_usize(config: &Ini, section: &str, key: &str, target: &mut usize) {
    if let Some(v) = config.getuint(section, key).ok().flatten() {
        *target = v as usize;
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            fixed_delta: DEFAULT_FIXED_DELTA,
            time_scale: DEFAULT_TIME_SCALE,
            world_gravity: Vec2::new(0.0, DEFAULT_WORLD_GRAVITY_Y),
            body_gravity_scale: DEFAULT_BODY_GRAVITY_SCALE,
            cell_size: DEFAULT_CELL_SIZE,
            degeneration_grace: DEFAULT_DEGENERATION_GRACE,
            seed: DEFAULT_SEED,
            catalog_path: None,
            motion: MotionParams::default(),
            player: PlayerParams::default(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);

        info!(
            "Loaded config: dt={}, scale={}, cell={}x{}, seed={}, jumps={}",
            self.fixed_delta,
            self.time_scale,
            self.cell_size.x,
            self.cell_size.y,
            self.seed,
            self.motion.max_jumps
        );

        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [simulation] section
        read_f32(config, "simulation", "fixed_delta", &mut self.fixed_delta);
        read_f32(config, "simulation", "time_scale", &mut self.time_scale);

        // [world] section
        read_f32(config, "world", "gravity_y", &mut self.world_gravity.y);
        read_f32(config, "world", "cell_width", &mut self.cell_size.x);
        read_f32(config, "world", "cell_height", &mut self.cell_size.y);
        if self.cell_size.x == 0.0 || self.cell_size.y == 0.0 {
            warn!("Configured cell size {:?} has a zero side, no cells will be placed", self.cell_size);
        }
        read_f32(config, "world", "degeneration_grace", &mut self.degeneration_grace);
        if let Some(seed) = config.getuint("world", "seed").ok().flatten() {
            self.seed = seed;
        }
        if let Some(path) = config.get("world", "catalog") {
            if !path.trim().is_empty() {
                self.catalog_path = Some(PathBuf::from(path.trim()));
            }
        }

        // [motion] section
        let m = &mut self.motion;
        if let Some(v) = config.getuint("motion", "max_jumps").ok().flatten() {
            m.max_jumps = v as u32;
        }
        read_f32(config, "motion", "jump_speed", &mut m.jump_speed);
        read_f32(config, "motion", "aerial_control", &mut m.aerial_control);
        read_f32(config, "motion", "plummet_acceleration", &mut m.plummet_acceleration);
        read_f32(config, "motion", "magnetless_buffer", &mut m.magnetless_buffer);
        read_f32(config, "motion", "ground_check_distance", &mut m.ground_check_distance);
        read_f32(config, "motion", "horizontal_acceleration", &mut m.horizontal_acceleration);
        read_f32(config, "motion", "snap_speed_threshold", &mut m.snap_speed_threshold);
        read_f32(config, "motion", "snap_multiplier", &mut m.snap_multiplier);
        read_f32(config, "motion", "brake_multiplier", &mut m.brake_multiplier);
        read_f32(config, "motion", "flat_drag_percent", &mut m.flat_drag_percent);
        read_f32(config, "motion", "boost_speed", &mut m.boost_speed);
        read_f32(config, "motion", "boost_cooldown", &mut m.boost_cooldown);
        read_f32(config, "motion", "gravity", &mut m.gravity.y);
        read_f32(config, "motion", "velocity_zero_threshold", &mut m.velocity_zero_threshold);
        read_usize(config, "motion", "spline_search_resolution", &mut m.spline_search_resolution);
        read_usize(config, "motion", "spline_search_iterations", &mut m.spline_search_iterations);
        read_usize(config, "motion", "spline_refine_iterations", &mut m.spline_refine_iterations);
        read_f32(config, "motion", "spline_surface_offset", &mut m.spline_surface_offset);

        // [player] section
        let p = &mut self.player;
        read_f32(config, "player", "jump_request_buffer", &mut p.jump_request_buffer);
        read_f32(config, "player", "boost_request_buffer", &mut p.boost_request_buffer);
        read_f32(config, "player", "combo_speed_threshold", &mut p.combo_speed_threshold);
        read_f32(config, "player", "combo_per_second", &mut p.combo_per_second);
        read_f32(config, "player", "attack_duration", &mut p.attack_duration);
        read_f32(config, "player", "attack_cooldown", &mut p.attack_cooldown);
        if let Some(v) = config.getint("player", "max_health").ok().flatten() {
            p.max_health = v as i32;
        }
        read_f32(config, "player", "body_gravity_scale", &mut self.body_gravity_scale);
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();
        let mut set = |section: &str, key: &str, value: String| {
            config.set(section, key, Some(value));
        };

        // [simulation] section
        set("simulation", "fixed_delta", self.fixed_delta.to_string());
        set("simulation", "time_scale", self.time_scale.to_string());

        // [world] section
        set("world", "gravity_y", self.world_gravity.y.to_string());
        set("world", "cell_width", self.cell_size.x.to_string());
        set("world", "cell_height", self.cell_size.y.to_string());
        set("world", "degeneration_grace", self.degeneration_grace.to_string());
        set("world", "seed", self.seed.to_string());
        if let Some(path) = &self.catalog_path {
            set("world", "catalog", path.display().to_string());
        }

        // [motion] section
        let m = &self.motion;
        set("motion", "max_jumps", m.max_jumps.to_string());
        set("motion", "jump_speed", m.jump_speed.to_string());
        set("motion", "aerial_control", m.aerial_control.to_string());
        set("motion", "plummet_acceleration", m.plummet_acceleration.to_string());
        set("motion", "magnetless_buffer", m.magnetless_buffer.to_string());
        set("motion", "ground_check_distance", m.ground_check_distance.to_string());
        set("motion", "horizontal_acceleration", m.horizontal_acceleration.to_string());
        set("motion", "snap_speed_threshold", m.snap_speed_threshold.to_string());
        set("motion", "snap_multiplier", m.snap_multiplier.to_string());
        set("motion", "brake_multiplier", m.brake_multiplier.to_string());
        set("motion", "flat_drag_percent", m.flat_drag_percent.to_string());
        set("motion", "boost_speed", m.boost_speed.to_string());
        set("motion", "boost_cooldown", m.boost_cooldown.to_string());
        set("motion", "gravity", m.gravity.y.to_string());
        set("motion", "velocity_zero_threshold", m.velocity_zero_threshold.to_string());
        set("motion", "spline_search_resolution", m.spline_search_resolution.to_string());
        set("motion", "spline_search_iterations", m.spline_search_iterations.to_string());
        set("motion", "spline_refine_iterations", m.spline_refine_iterations.to_string());
        set("motion", "spline_surface_offset", m.spline_surface_offset.to_string());

        // [player] section
        let p = &self.player;
        set("player", "jump_request_buffer", p.jump_request_buffer.to_string());
        set("player", "boost_request_buffer", p.boost_request_buffer.to_string());
        set("player", "combo_speed_threshold", p.combo_speed_threshold.to_string());
        set("player", "combo_per_second", p.combo_per_second.to_string());
        set("player", "attack_duration", p.attack_duration.to_string());
        set("player", "attack_cooldown", p.attack_cooldown.to_string());
        set("player", "max_health", p.max_health.to_string());
        set("player", "body_gravity_scale", self.body_gravity_scale.to_string());

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_motion_and_player_defaults() {
        let cfg = GameConfig::new();
        assert_eq!(cfg.motion, MotionParams::default());
        assert_eq!(cfg.player, PlayerParams::default());
        assert_eq!(cfg.cell_size, Vec2::new(200.0, 200.0));
        assert!(cfg.catalog_path.is_none());
    }

    #[test]
    fn load_from_str_overrides_present_keys_only() {
        let mut cfg = GameConfig::new();
        cfg.load_from_str(
            "[world]\nseed = 42\ncell_width = 100\ncatalog = cells.json\n\n\
             [motion]\nmax_jumps = 2\njump_speed = 3.5\n\n\
             [player]\nmax_health = 5\n",
        )
        .unwrap();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.cell_size, Vec2::new(100.0, 200.0));
        assert_eq!(cfg.catalog_path, Some(PathBuf::from("cells.json")));
        assert_eq!(cfg.motion.max_jumps, 2);
        assert_eq!(cfg.motion.jump_speed, 3.5);
        assert_eq!(cfg.motion.boost_cooldown, 5.0);
        assert_eq!(cfg.player.max_health, 5);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut cfg = GameConfig::with_path("/nonexistent/cellrunner/config.ini");
        assert!(cfg.load_from_file().is_err());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let path = std::env::temp_dir().join(format!("cellrunner-config-{}.ini", std::process::id()));
        let mut cfg = GameConfig::with_path(&path);
        cfg.seed = 7;
        cfg.motion.snap_multiplier = 33.0;
        cfg.player.combo_per_second = 0.75;
        cfg.save_to_file().unwrap();

        let mut loaded = GameConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.seed, 7);
        assert_eq!(loaded.motion.snap_multiplier, 33.0);
        assert_eq!(loaded.player.combo_per_second, 0.75);
        assert_eq!(loaded.motion, cfg.motion);
    }
}
