//! World sizing, coordinates, noise sampling, and worldgen parameters.
#![forbid(unsafe_code)]

mod chunk_coord;
pub mod noise;
mod pos;
pub mod worldgen;

pub use chunk_coord::ChunkCoord;
pub use noise::NoiseSampler;
pub use pos::{BlockPos, LocalPos};
pub use worldgen::{GeneratorKind, NoiseParams, WorldGenConfig};

/// Edge length of a cubic chunk, identical on every axis.
pub const CHUNK_SIZE: usize = 16;
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;
pub const CHUNK_VOLUME: usize = CHUNK_AREA * CHUNK_SIZE;

/// Identifies an independent voxel universe.
pub type WorldId = u32;
