//! Dense chunk grid storage.
#![forbid(unsafe_code)]

use loam_blocks::{BlockData, BlockId, Direction};
use loam_world::{CHUNK_SIZE, CHUNK_VOLUME, LocalPos};

/// Every cell of one chunk, flattened as `x*S² + y*S + z`.
///
/// The same order is used on the wire, so `to_wire`/`from_wire` are plain copies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkGrid {
    cells: Box<[BlockData]>,
}

impl Default for ChunkGrid {
    fn default() -> Self {
        Self::air()
    }
}

impl ChunkGrid {
    pub fn air() -> Self {
        Self::filled(BlockData::AIR)
    }

    pub fn filled(block: BlockData) -> Self {
        Self {
            cells: vec![block; CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    /// `None` unless `cells` holds exactly one entry per coordinate.
    pub fn from_cells(cells: Vec<BlockData>) -> Option<Self> {
        if cells.len() != CHUNK_VOLUME {
            return None;
        }
        Some(Self {
            cells: cells.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn idx(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE);
        (x * CHUNK_SIZE + y) * CHUNK_SIZE + z
    }

    #[inline]
    pub fn coords_of(idx: usize) -> LocalPos {
        LocalPos::new(
            idx / (CHUNK_SIZE * CHUNK_SIZE),
            (idx / CHUNK_SIZE) % CHUNK_SIZE,
            idx % CHUNK_SIZE,
        )
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockData {
        self.cells[Self::idx(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: BlockData) {
        self.cells[Self::idx(x, y, z)] = block;
    }

    #[inline]
    pub fn get_local(&self, p: LocalPos) -> BlockData {
        self.get(p.x, p.y, p.z)
    }

    #[inline]
    pub fn set_local(&mut self, p: LocalPos, block: BlockData) {
        self.set(p.x, p.y, p.z, block);
    }

    #[inline]
    pub fn cells(&self) -> &[BlockData] {
        &self.cells
    }

    #[inline]
    pub fn cells_mut(&mut self) -> &mut [BlockData] {
        &mut self.cells
    }

    pub fn non_air_count(&self) -> usize {
        self.cells.iter().filter(|b| !b.is_air()).count()
    }

    #[inline]
    pub fn is_all_air(&self) -> bool {
        self.cells.iter().all(|b| b.is_air())
    }

    /// Parallel id/direction arrays in wire order.
    pub fn to_wire(&self) -> (Vec<BlockId>, Vec<u8>) {
        let ids = self.cells.iter().map(|b| b.id).collect();
        let dirs = self.cells.iter().map(|b| b.direction.as_u8()).collect();
        (ids, dirs)
    }

    /// Rebuilds a grid from wire arrays; rejects wrong lengths and unknown directions.
    pub fn from_wire(ids: &[BlockId], directions: &[u8]) -> Option<Self> {
        if ids.len() != CHUNK_VOLUME || directions.len() != CHUNK_VOLUME {
            return None;
        }
        let cells = ids
            .iter()
            .zip(directions)
            .map(|(id, d)| Direction::from_u8(*d).map(|direction| BlockData::new(*id, direction)))
            .collect::<Option<Vec<_>>>()?;
        Self::from_cells(cells)
    }
}
