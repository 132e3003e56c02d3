use std::cmp::Ordering;

use loam_blocks::{BlockData, BlockId, Direction};
use loam_world::CHUNK_SIZE;

use crate::cache::TerrainDataCache;
use crate::error::GenError;

pub const STONE: &str = "stone";

/// One step of a terrain pipeline. Stages run in registration order and may
/// overwrite whatever earlier stages wrote into the cache.
pub trait TerrainStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(&self, cache: &mut TerrainDataCache) -> Result<(), GenError>;
}

pub(crate) fn resolve(cache: &TerrainDataCache, name: &str) -> Result<BlockId, GenError> {
    cache
        .blocks
        .resolve_block_id(name)
        .ok_or_else(|| GenError::UnknownBlock(name.to_string()))
}

/// Height for chunk layers that are entirely above or below the surface layer.
/// Returns `None` for the y = 0 layer, where the stage decides.
#[inline]
fn layer_height(cy: i32) -> Option<i32> {
    match cy.cmp(&0) {
        Ordering::Greater => Some(0),
        Ordering::Less => Some(CHUNK_SIZE as i32),
        Ordering::Equal => None,
    }
}

/// Fills every cell whose global y is at or below its column height with `block`,
/// and everything else with air.
///
/// Heights are chunk-local values compared against `y + cy * CHUNK_SIZE`, so the
/// cell at exactly `y == height` is solid.
pub fn fill_to_height(cache: &mut TerrainDataCache, block: BlockId) {
    let base_y = cache.coord.base_y();
    let solid = BlockData::new(block, Direction::None);
    for x in 0..CHUNK_SIZE {
        for z in 0..CHUNK_SIZE {
            let h = cache.height(x, z);
            for y in 0..CHUNK_SIZE {
                let cell = if h >= y as i32 + base_y {
                    solid
                } else {
                    BlockData::AIR
                };
                cache.grid.set(x, y, z, cell);
            }
        }
    }
}

/// One-block ground slab on the y = 0 chunk layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatGround;

impl TerrainStage for FlatGround {
    fn name(&self) -> &'static str {
        "flat_ground"
    }

    fn generate(&self, cache: &mut TerrainDataCache) -> Result<(), GenError> {
        let h = layer_height(cache.coord.cy).unwrap_or(1);
        cache.height_map.fill(h);
        let stone = resolve(cache, STONE)?;
        fill_to_height(cache, stone);
        Ok(())
    }
}

/// Noise heightmap on the y = 0 chunk layer, scaled to one chunk of relief.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoiseGround;

impl NoiseGround {
    #[inline]
    pub fn column_height(sample: f32) -> i32 {
        ((sample + 1.0) * 0.5 * CHUNK_SIZE as f32).floor() as i32
    }
}

impl TerrainStage for NoiseGround {
    fn name(&self) -> &'static str {
        "noise_ground"
    }

    fn generate(&self, cache: &mut TerrainDataCache) -> Result<(), GenError> {
        match layer_height(cache.coord.cy) {
            Some(h) => cache.height_map.fill(h),
            None => {
                for x in 0..CHUNK_SIZE {
                    for z in 0..CHUNK_SIZE {
                        let gx = cache.global_x(x);
                        let gz = cache.global_z(z);
                        let h = Self::column_height(cache.noise.sample(gx, gz));
                        cache.set_height(x, z, h);
                    }
                }
            }
        }
        let stone = resolve(cache, STONE)?;
        fill_to_height(cache, stone);
        Ok(())
    }
}
