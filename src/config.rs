/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing, unreadable or
/// incomplete; out-of-range values are clamped rather than rejected.

use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug, Default)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub bombs: BombConfig,
    pub ai: AiConfig,
    pub level: LevelConfig,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub player_step_secs: f32,
}

#[derive(Clone, Debug)]
pub struct BombConfig {
    pub fuse_secs: f32,
    pub flame_secs: f32,
    pub block_destroy_secs: f32,
    pub start_range: u32,
    pub start_capacity: u32,
}

/// Seconds between AI decisions per tier, before jitter.
#[derive(Clone, Debug)]
pub struct AiConfig {
    pub low_interval: f32,
    pub normal_interval: f32,
    pub high_interval: f32,
    pub enemy_step_secs: f32,
}

#[derive(Clone, Debug)]
pub struct LevelConfig {
    pub seed: u64,
    pub density: f32,
    pub start_lives: u32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    bombs: TomlBombs,
    #[serde(default)]
    ai: TomlAi,
    #[serde(default)]
    level: TomlLevel,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_player_step")]
    player_step_secs: f32,
}

#[derive(Deserialize, Debug)]
struct TomlBombs {
    #[serde(default = "default_fuse")]
    fuse_secs: f32,
    #[serde(default = "default_flame")]
    flame_secs: f32,
    #[serde(default = "default_block_destroy")]
    block_destroy_secs: f32,
    #[serde(default = "default_start_range")]
    start_range: u32,
    #[serde(default = "default_start_capacity")]
    start_capacity: u32,
}

#[derive(Deserialize, Debug)]
struct TomlAi {
    #[serde(default = "default_low_interval")]
    low_interval: f32,
    #[serde(default = "default_normal_interval")]
    normal_interval: f32,
    #[serde(default = "default_high_interval")]
    high_interval: f32,
    #[serde(default = "default_enemy_step")]
    enemy_step_secs: f32,
}

#[derive(Deserialize, Debug)]
struct TomlLevel {
    #[serde(default = "default_seed")]
    seed: u64,
    #[serde(default = "default_density")]
    density: f32,
    #[serde(default = "default_lives")]
    start_lives: u32,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 33 }
fn default_player_step() -> f32 { 0.2 }

fn default_fuse() -> f32 { 2.5 }
fn default_flame() -> f32 { 0.5 }
fn default_block_destroy() -> f32 { 0.4 }
fn default_start_range() -> u32 { 1 }
fn default_start_capacity() -> u32 { 1 }

fn default_low_interval() -> f32 { 1.0 }
fn default_normal_interval() -> f32 { 0.7 }
fn default_high_interval() -> f32 { 0.4 }
fn default_enemy_step() -> f32 { 0.4 }

fn default_seed() -> u64 { 1985 }
fn default_density() -> f32 { 0.35 }
fn default_lives() -> u32 { 3 }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            player_step_secs: default_player_step(),
        }
    }
}

impl Default for TomlBombs {
    fn default() -> Self {
        TomlBombs {
            fuse_secs: default_fuse(),
            flame_secs: default_flame(),
            block_destroy_secs: default_block_destroy(),
            start_range: default_start_range(),
            start_capacity: default_start_capacity(),
        }
    }
}

impl Default for TomlAi {
    fn default() -> Self {
        TomlAi {
            low_interval: default_low_interval(),
            normal_interval: default_normal_interval(),
            high_interval: default_high_interval(),
            enemy_step_secs: default_enemy_step(),
        }
    }
}

impl Default for TomlLevel {
    fn default() -> Self {
        TomlLevel {
            seed: default_seed(),
            density: default_density(),
            start_lives: default_lives(),
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self { TomlConfig::default().resolve().speed }
}

impl Default for BombConfig {
    fn default() -> Self { TomlConfig::default().resolve().bombs }
}

impl Default for AiConfig {
    fn default() -> Self { TomlConfig::default().resolve().ai }
}

impl Default for LevelConfig {
    fn default() -> Self { TomlConfig::default().resolve().level }
}

// ── Resolution ──

impl TomlConfig {
    /// Clamp raw values into ranges the simulation can run with.
    fn resolve(self) -> GameConfig {
        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: self.speed.tick_rate_ms.clamp(10, 250),
                player_step_secs: self.speed.player_step_secs.clamp(0.08, 1.0),
            },
            bombs: BombConfig {
                fuse_secs: self.bombs.fuse_secs.clamp(0.5, 10.0),
                flame_secs: self.bombs.flame_secs.clamp(0.1, 3.0),
                block_destroy_secs: self.bombs.block_destroy_secs.clamp(0.05, 3.0),
                start_range: self.bombs.start_range.clamp(1, 8),
                start_capacity: self.bombs.start_capacity.clamp(1, 8),
            },
            ai: AiConfig {
                low_interval: self.ai.low_interval.clamp(0.05, 5.0),
                normal_interval: self.ai.normal_interval.clamp(0.05, 5.0),
                high_interval: self.ai.high_interval.clamp(0.05, 5.0),
                enemy_step_secs: self.ai.enemy_step_secs.clamp(0.08, 2.0),
            },
            level: LevelConfig {
                seed: self.level.seed,
                density: self.level.density.clamp(0.0, 1.0),
                start_lives: self.level.start_lives.clamp(1, 9),
            },
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Self {
        load_toml(&candidate_dirs()).resolve()
    }

    /// Parse a config document directly. Malformed input yields defaults.
    pub fn from_toml_str(text: &str) -> Self {
        match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => cfg.resolve(),
            Err(e) => {
                warn!("config.toml parse error, using defaults: {e}");
                TomlConfig::default().resolve()
            }
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

/// First readable `config.toml` in the candidate directories wins.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match read_toml(&path) {
            Ok(cfg) => {
                info!("Loaded {}", path.display());
                return cfg;
            }
            Err(e) => {
                warn!("{}: {e}; using default settings", path.display());
                return TomlConfig::default();
            }
        }
    }
    TomlConfig::default()
}

fn read_toml(path: &Path) -> Result<TomlConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&text)?)
}
