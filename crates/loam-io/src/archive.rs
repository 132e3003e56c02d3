use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use loam_blocks::{BlockCatalog, BlockRegistry, ItemCatalog, ItemRegistry, TypeCatalog, TypeTable};
use loam_chunk::ChunkGrid;
use loam_world::{ChunkCoord, WorldId};

use crate::codec::{
    RestoreReport, TypeTableRecord, deserialize_chunk, deserialize_types, restore_types,
    serialize_chunk, serialize_types,
};
use crate::error::ArchiveError;

pub const BLOCK_REGISTRY_FILE: &str = "blocks.lmr";
pub const ITEM_REGISTRY_FILE: &str = "items.lmr";
const CHUNK_EXT: &str = "lmc";

/// On-disk layout: one file per chunk under a per-world directory, plus
/// fixed-name files for the type registries.
#[derive(Clone, Debug)]
pub struct WorldArchive {
    root: PathBuf,
}

impl WorldArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn world_dir(&self, world: WorldId) -> PathBuf {
        self.root.join(format!("world_{world}"))
    }

    pub fn chunk_path(&self, world: WorldId, coord: ChunkCoord) -> PathBuf {
        self.world_dir(world).join(format!(
            "chunk_{}_{}_{}.{CHUNK_EXT}",
            coord.cx, coord.cy, coord.cz
        ))
    }

    /// `Ok(None)` when the chunk was never archived.
    pub fn read_chunk(&self, world: WorldId, coord: ChunkCoord) -> Result<Option<ChunkGrid>, ArchiveError> {
        let path = self.chunk_path(world, coord);
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        deserialize_chunk(&bytes).map(Some)
    }

    pub fn write_chunk(&self, world: WorldId, coord: ChunkCoord, grid: &ChunkGrid) -> Result<(), ArchiveError> {
        let path = self.chunk_path(world, coord);
        write_replace(&path, &serialize_chunk(grid))?;
        Ok(())
    }

    pub fn save_block_registry(&self, reg: &BlockRegistry) -> Result<(), ArchiveError> {
        self.save_types(BLOCK_REGISTRY_FILE, reg)
    }

    /// Restores persisted block ids into `reg`; `Ok(None)` if nothing was saved yet.
    pub fn load_block_registry(
        &self,
        catalog: &BlockCatalog,
        reg: &mut BlockRegistry,
    ) -> Result<Option<RestoreReport>, ArchiveError> {
        self.load_types(BLOCK_REGISTRY_FILE, catalog, reg)
    }

    pub fn save_item_registry(&self, items: &ItemRegistry) -> Result<(), ArchiveError> {
        self.save_types(ITEM_REGISTRY_FILE, items)
    }

    pub fn load_item_registry(
        &self,
        catalog: &ItemCatalog,
        items: &mut ItemRegistry,
    ) -> Result<Option<RestoreReport>, ArchiveError> {
        self.load_types(ITEM_REGISTRY_FILE, catalog, items)
    }

    fn save_types<T: TypeTable>(&self, file: &str, table: &T) -> Result<(), ArchiveError> {
        let bytes = serialize_types(&TypeTableRecord::capture(table));
        write_replace(&self.root.join(file), &bytes)?;
        Ok(())
    }

    fn load_types<T: TypeTable>(
        &self,
        file: &str,
        catalog: &TypeCatalog<T::Def>,
        table: &mut T,
    ) -> Result<Option<RestoreReport>, ArchiveError> {
        let path = self.root.join(file);
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        let record = deserialize_types(&bytes)?;
        let report = restore_types(&record, catalog, table);
        log::info!(target: "archive", "{}: restored {} type(s), skipped {}",
            path.display(), report.restored, report.skipped.len());
        Ok(Some(report))
    }
}

fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Writes to a sibling temp file, then renames over the target.
fn write_replace(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
