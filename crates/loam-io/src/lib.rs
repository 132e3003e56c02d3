//! Chunk and type-registry archive format.
#![forbid(unsafe_code)]

pub mod archive;
pub mod codec;
mod error;

pub use archive::{BLOCK_REGISTRY_FILE, ITEM_REGISTRY_FILE, WorldArchive};
pub use codec::{
    RestoreReport, TypeTableRecord, deserialize_chunk, deserialize_types, restore_blocks,
    restore_items, restore_types, serialize_chunk, serialize_types,
};
pub use error::ArchiveError;
