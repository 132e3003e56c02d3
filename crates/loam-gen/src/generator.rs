use std::sync::Arc;

use loam_blocks::BlockRegistry;
use loam_chunk::ChunkGrid;
use loam_world::{ChunkCoord, GeneratorKind, NoiseParams, NoiseSampler};

use crate::cache::TerrainDataCache;
use crate::error::GenError;
use crate::stage::{FlatGround, NoiseGround, TerrainStage};

/// Ordered stage pipeline run against one scratch cache per chunk.
pub struct StagedGenerator {
    stages: Vec<Box<dyn TerrainStage>>,
    blocks: Arc<BlockRegistry>,
    noise_params: NoiseParams,
    noise: Option<Arc<NoiseSampler>>,
}

impl StagedGenerator {
    pub fn new(blocks: Arc<BlockRegistry>, noise_params: NoiseParams) -> Self {
        Self {
            stages: Vec::new(),
            blocks,
            noise_params,
            noise: None,
        }
    }

    pub fn for_kind(kind: GeneratorKind, blocks: Arc<BlockRegistry>, noise_params: NoiseParams) -> Self {
        let generator = Self::new(blocks, noise_params);
        match kind {
            GeneratorKind::Flat => generator.with_stage(FlatGround),
            GeneratorKind::Standard => generator.with_stage(NoiseGround),
        }
    }

    pub fn with_stage(mut self, stage: impl TerrainStage + 'static) -> Self {
        self.push_stage(Box::new(stage));
        self
    }

    pub fn push_stage(&mut self, stage: Box<dyn TerrainStage>) {
        self.stages.push(stage);
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Seeds the shared noise sampler. Allowed once per generator.
    pub fn set_seed(&mut self, seed: u64) -> Result<(), GenError> {
        if self.noise.is_some() {
            return Err(GenError::AlreadySeeded);
        }
        self.noise = Some(Arc::new(NoiseSampler::new(seed, &self.noise_params)));
        Ok(())
    }

    pub fn generate_terrain(&self, coord: ChunkCoord) -> Result<ChunkGrid, GenError> {
        let noise = self.noise.as_ref().ok_or(GenError::NotSeeded)?;
        let mut cache = TerrainDataCache::new(coord, Arc::clone(noise), Arc::clone(&self.blocks));
        for stage in &self.stages {
            stage.generate(&mut cache)?;
        }
        log::trace!(target: "gen", "generated ({}, {}, {}) through {} stage(s)",
            coord.cx, coord.cy, coord.cz, self.stages.len());
        Ok(cache.into_grid())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use loam_blocks::{BlockData, BlockDef, Direction};

    use super::*;
    use crate::stage::STONE;

    fn blocks() -> Arc<BlockRegistry> {
        let mut reg = BlockRegistry::new();
        reg.register(&BlockDef::solid(STONE)).unwrap();
        reg.register(&BlockDef::solid("ore")).unwrap();
        Arc::new(reg)
    }

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl TerrainStage for Recorder {
        fn name(&self) -> &'static str {
            self.label
        }

        fn generate(&self, cache: &mut TerrainDataCache) -> Result<(), GenError> {
            self.log.lock().unwrap().push(self.label);
            let ore = cache.blocks.resolve_block_id("ore").unwrap();
            cache.grid.set(0, 0, 0, BlockData::new(ore, Direction::North));
            Ok(())
        }
    }

    #[test]
    fn generating_before_seed_fails() {
        let generator = StagedGenerator::for_kind(GeneratorKind::Flat, blocks(), NoiseParams::default());
        assert_eq!(
            generator.generate_terrain(ChunkCoord::new(0, 0, 0)),
            Err(GenError::NotSeeded)
        );
    }

    #[test]
    fn seeding_twice_fails() {
        let mut generator = StagedGenerator::new(blocks(), NoiseParams::default());
        generator.set_seed(1).unwrap();
        assert_eq!(generator.set_seed(2), Err(GenError::AlreadySeeded));
    }

    #[test]
    fn stages_run_in_insertion_order_and_later_wins() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut generator = StagedGenerator::new(blocks(), NoiseParams::default())
            .with_stage(FlatGround)
            .with_stage(Recorder {
                label: "ores",
                log: Arc::clone(&log),
            })
            .with_stage(Recorder {
                label: "caves",
                log: Arc::clone(&log),
            });
        generator.set_seed(3).unwrap();
        assert_eq!(generator.stage_names(), vec!["flat_ground", "ores", "caves"]);
        let grid = generator.generate_terrain(ChunkCoord::new(0, 0, 0)).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["ores", "caves"]);
        assert_eq!(grid.get(0, 0, 0), BlockData::new(2, Direction::North));
        assert_eq!(grid.get(1, 0, 0).id, 1);
    }

    #[test]
    fn empty_pipeline_yields_air() {
        let mut generator = StagedGenerator::new(blocks(), NoiseParams::default());
        generator.set_seed(0).unwrap();
        let grid = generator.generate_terrain(ChunkCoord::new(5, -9, 1)).unwrap();
        assert!(grid.is_all_air());
    }
}
