use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use loam_world::WorldId;

/// Host settings read from `loam.toml`.
#[derive(Clone, Debug, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_world_dir")]
    pub world_dir: PathBuf,
    #[serde(default = "loam_runtime::default_workers")]
    pub workers: usize,
    #[serde(default = "default_autosave_secs")]
    pub autosave_secs: f32,
    #[serde(default = "default_view_radius")]
    pub view_radius: i32,
    #[serde(default = "default_vertical_radius")]
    pub vertical_radius: i32,
    /// Worldgen TOML; built-in defaults when unset.
    #[serde(default)]
    pub worldgen: Option<PathBuf>,
    /// Block catalog TOML; built-in blocks when unset.
    #[serde(default)]
    pub blocks: Option<PathBuf>,
    #[serde(default = "default_spawns")]
    pub spawns: Vec<SpawnPoint>,
}

/// Column the host keeps loaded; the y is resolved with a free-space search.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct SpawnPoint {
    #[serde(default)]
    pub world: WorldId,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub z: i32,
}

fn default_world_dir() -> PathBuf {
    PathBuf::from("world")
}
fn default_autosave_secs() -> f32 {
    30.0
}
fn default_view_radius() -> i32 {
    4
}
fn default_vertical_radius() -> i32 {
    1
}
fn default_spawns() -> Vec<SpawnPoint> {
    vec![SpawnPoint { world: 0, x: 0, z: 0 }]
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            world_dir: default_world_dir(),
            workers: loam_runtime::default_workers(),
            autosave_secs: default_autosave_secs(),
            view_radius: default_view_radius(),
            vertical_radius: default_vertical_radius(),
            worldgen: None,
            blocks: None,
            spawns: default_spawns(),
        }
    }
}

impl HostConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(s)?)
    }
}

pub fn load_host_config(path: &Path) -> Result<HostConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    HostConfig::from_toml_str(&s)
}
