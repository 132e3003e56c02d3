use loam_blocks::{BlockData, BlockId, Direction};
use loam_chunk::ChunkGrid;
use loam_world::{BlockPos, ChunkCoord, WorldId};
use serde::{Deserialize, Serialize};

/// Full chunk push. Both arrays are in `x*S² + y*S + z` order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPacket {
    pub world: WorldId,
    pub coord: ChunkCoord,
    pub ids: Vec<BlockId>,
    pub directions: Vec<u8>,
}

impl ChunkPacket {
    pub fn from_grid(world: WorldId, coord: ChunkCoord, grid: &ChunkGrid) -> Self {
        let (ids, directions) = grid.to_wire();
        Self {
            world,
            coord,
            ids,
            directions,
        }
    }

    /// `None` when the arrays have the wrong length or carry an unknown direction.
    pub fn to_grid(&self) -> Option<ChunkGrid> {
        ChunkGrid::from_wire(&self.ids, &self.directions)
    }
}

/// Client's request to change one cell; the host decides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEdit {
    pub world: WorldId,
    pub pos: BlockPos,
    pub id: BlockId,
    pub direction: Direction,
}

/// Host-confirmed cell change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockChanged {
    pub world: WorldId,
    pub pos: BlockPos,
    pub id: BlockId,
    pub direction: Direction,
}

impl BlockChanged {
    #[inline]
    pub fn data(&self) -> BlockData {
        BlockData::new(self.id, self.direction)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostMessage {
    Chunk(ChunkPacket),
    BlockChanged(BlockChanged),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    RequestChunk { world: WorldId, coord: ChunkCoord },
    SetBlock(BlockEdit),
}
