use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::WorldId;

#[derive(Clone, Debug, Deserialize)]
pub struct WorldGenConfig {
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub noise: NoiseParams,
    #[serde(default = "default_worlds")]
    pub worlds: Vec<WorldEntry>,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            noise: NoiseParams::default(),
            worlds: default_worlds(),
        }
    }
}

fn default_worlds() -> Vec<WorldEntry> {
    vec![WorldEntry {
        id: 0,
        generator: GeneratorKind::Standard,
    }]
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NoiseParams {
    #[serde(default = "default_noise_freq")]
    pub frequency: f32,
    #[serde(default)]
    pub noise_type: NoiseKind,
}
fn default_noise_freq() -> f32 {
    0.02
}
impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            frequency: default_noise_freq(),
            noise_type: NoiseKind::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    #[default]
    #[serde(alias = "opensimplex2")]
    OpenSimplex2,
    Perlin,
    Value,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct WorldEntry {
    pub id: WorldId,
    #[serde(default)]
    pub generator: GeneratorKind,
}

/// Generation policy for a world.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Single flat ground layer at y = 0.
    #[default]
    #[serde(alias = "default")]
    Flat,
    /// Noise heightmap on the y = 0 chunk layer.
    Standard,
}

impl WorldGenConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(s)?)
    }
}

pub fn load_config_from_path(path: &Path) -> Result<WorldGenConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    WorldGenConfig::from_toml_str(&s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_worlds_and_aliases() {
        let cfg = WorldGenConfig::from_toml_str(
            r#"
            seed = 99

            [noise]
            frequency = 0.05
            noise_type = "perlin"

            [[worlds]]
            id = 0
            generator = "standard"

            [[worlds]]
            id = 1
            generator = "default"

            [[worlds]]
            id = 2
        "#,
        )
        .unwrap();
        assert_eq!(cfg.seed, 99);
        assert_eq!(cfg.noise.noise_type, NoiseKind::Perlin);
        assert_eq!(cfg.worlds.len(), 3);
        assert_eq!(cfg.worlds[0].generator, GeneratorKind::Standard);
        assert_eq!(cfg.worlds[1].generator, GeneratorKind::Flat);
        assert_eq!(cfg.worlds[2].generator, GeneratorKind::Flat);
    }

    #[test]
    fn empty_config_has_one_standard_world() {
        let cfg = WorldGenConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.worlds, default_worlds());
        assert_eq!(cfg.noise, NoiseParams::default());
    }
}
