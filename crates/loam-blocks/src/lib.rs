//! Block and item types, registries, and the tag-to-factory catalog.
#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod items;
pub mod registry;
pub mod types;

pub use catalog::{BlockCatalog, ItemCatalog, TypeCatalog};
pub use config::{BlockDef, BlocksConfig};
pub use items::{ItemDef, ItemId, ItemRegistry};
pub use registry::{BlockRegistry, RegistryError, TypeTable};
pub use types::{BlockData, BlockId, BlockKind, BlockType, Direction};
