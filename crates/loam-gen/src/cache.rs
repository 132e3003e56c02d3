use std::sync::Arc;

use loam_blocks::BlockRegistry;
use loam_chunk::ChunkGrid;
use loam_world::{CHUNK_AREA, CHUNK_SIZE, ChunkCoord, NoiseSampler};

/// Scratch state for one chunk's trip through the stage pipeline.
///
/// Owned by a single generation pass and dropped once the grid is taken out.
pub struct TerrainDataCache {
    pub coord: ChunkCoord,
    /// Column heights indexed `x * CHUNK_SIZE + z`.
    pub height_map: Vec<i32>,
    pub grid: ChunkGrid,
    pub noise: Arc<NoiseSampler>,
    pub blocks: Arc<BlockRegistry>,
}

impl TerrainDataCache {
    pub fn new(coord: ChunkCoord, noise: Arc<NoiseSampler>, blocks: Arc<BlockRegistry>) -> Self {
        Self {
            coord,
            height_map: vec![0; CHUNK_AREA],
            grid: ChunkGrid::air(),
            noise,
            blocks,
        }
    }

    #[inline]
    pub fn height(&self, x: usize, z: usize) -> i32 {
        self.height_map[x * CHUNK_SIZE + z]
    }

    #[inline]
    pub fn set_height(&mut self, x: usize, z: usize, h: i32) {
        self.height_map[x * CHUNK_SIZE + z] = h;
    }

    #[inline]
    pub fn global_x(&self, x: usize) -> i32 {
        self.coord.cx * CHUNK_SIZE as i32 + x as i32
    }

    #[inline]
    pub fn global_z(&self, z: usize) -> i32 {
        self.coord.cz * CHUNK_SIZE as i32 + z as i32
    }

    pub fn into_grid(self) -> ChunkGrid {
        self.grid
    }
}
