//! Staged terrain generation: per-chunk scratch cache, stages, and the world generator registry.
#![forbid(unsafe_code)]

mod cache;
mod error;
mod generator;
mod registry;
pub mod stage;

pub use cache::TerrainDataCache;
pub use error::GenError;
pub use generator::StagedGenerator;
pub use registry::TerrainGenerator;
pub use stage::{FlatGround, NoiseGround, TerrainStage, fill_to_height};
