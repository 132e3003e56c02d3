//! Chunk store: authoritative chunk map, background generation, dirty tracking.
#![forbid(unsafe_code)]

mod listener;
mod store;

pub use listener::{BlockChange, BlockChangeListener, ChangeOrigin};
pub use store::{ArchiveReport, ChunkKey, ChunkState, ChunkStore, Generate};
