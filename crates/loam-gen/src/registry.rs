use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use loam_blocks::BlockRegistry;
use loam_chunk::ChunkGrid;
use loam_world::{ChunkCoord, GeneratorKind, NoiseParams, WorldGenConfig, WorldId};

use crate::error::GenError;
use crate::generator::StagedGenerator;

/// World id → seeded generator, all seeded from one world-wide seed.
pub struct TerrainGenerator {
    seed: u64,
    blocks: Arc<BlockRegistry>,
    noise_params: NoiseParams,
    generators: RwLock<HashMap<WorldId, Arc<StagedGenerator>>>,
}

impl TerrainGenerator {
    pub fn new(seed: u64, blocks: Arc<BlockRegistry>, noise_params: NoiseParams) -> Self {
        Self {
            seed,
            blocks,
            noise_params,
            generators: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &WorldGenConfig, blocks: Arc<BlockRegistry>) -> Result<Self, GenError> {
        let registry = Self::new(cfg.seed, blocks, cfg.noise.clone());
        for entry in &cfg.worlds {
            registry.register_generator(entry.id, entry.generator)?;
        }
        Ok(registry)
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn blocks(&self) -> &Arc<BlockRegistry> {
        &self.blocks
    }

    /// Builds the policy for `kind`, seeds it, and replaces any previous generator for `world`.
    pub fn register_generator(&self, world: WorldId, kind: GeneratorKind) -> Result<(), GenError> {
        let generator = StagedGenerator::for_kind(kind, Arc::clone(&self.blocks), self.noise_params.clone());
        self.register_staged(world, generator)?;
        log::info!(target: "gen", "world {} uses {:?} generator", world, kind);
        Ok(())
    }

    /// Seeds and installs a custom pipeline.
    pub fn register_staged(&self, world: WorldId, mut generator: StagedGenerator) -> Result<(), GenError> {
        generator.set_seed(self.seed)?;
        self.generators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(world, Arc::new(generator));
        Ok(())
    }

    pub fn has_generator(&self, world: WorldId) -> bool {
        self.generators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&world)
    }

    pub fn worlds(&self) -> Vec<WorldId> {
        let mut ids: Vec<WorldId> = self
            .generators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn try_generate_terrain(&self, world: WorldId, coord: ChunkCoord) -> Result<ChunkGrid, GenError> {
        let generator = self
            .generators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&world)
            .cloned()
            .ok_or(GenError::NoGenerator(world))?;
        generator.generate_terrain(coord)
    }

    /// `None` means "no data yet"; the failure is logged and callers retry later.
    pub fn generate_terrain(&self, world: WorldId, coord: ChunkCoord) -> Option<ChunkGrid> {
        match self.try_generate_terrain(world, coord) {
            Ok(grid) => Some(grid),
            Err(e) => {
                log::warn!(target: "gen", "world {} chunk ({}, {}, {}): {}",
                    world, coord.cx, coord.cy, coord.cz, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use loam_blocks::BlockDef;

    use super::*;
    use crate::stage::STONE;

    fn blocks() -> Arc<BlockRegistry> {
        let mut reg = BlockRegistry::new();
        reg.register(&BlockDef::solid(STONE)).unwrap();
        Arc::new(reg)
    }

    #[test]
    fn unknown_world_is_no_data() {
        let registry = TerrainGenerator::new(1, blocks(), NoiseParams::default());
        assert!(registry.generate_terrain(3, ChunkCoord::new(0, 0, 0)).is_none());
        assert_eq!(
            registry.try_generate_terrain(3, ChunkCoord::new(0, 0, 0)),
            Err(GenError::NoGenerator(3))
        );
    }

    #[test]
    fn registered_generators_are_seeded() {
        let registry = TerrainGenerator::new(1, blocks(), NoiseParams::default());
        registry.register_generator(0, GeneratorKind::Flat).unwrap();
        registry.register_generator(4, GeneratorKind::Standard).unwrap();
        assert_eq!(registry.worlds(), vec![0, 4]);
        assert!(registry.generate_terrain(0, ChunkCoord::new(0, 0, 0)).is_some());
        assert!(registry.generate_terrain(4, ChunkCoord::new(0, 0, 0)).is_some());
    }

    #[test]
    fn preseeded_custom_generator_is_rejected() {
        let registry = TerrainGenerator::new(1, blocks(), NoiseParams::default());
        let mut generator = StagedGenerator::new(blocks(), NoiseParams::default());
        generator.set_seed(9).unwrap();
        assert_eq!(registry.register_staged(0, generator), Err(GenError::AlreadySeeded));
        assert!(!registry.has_generator(0));
    }
}
