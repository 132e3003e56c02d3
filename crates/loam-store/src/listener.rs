use loam_blocks::{BlockData, BlockId, Direction};
use loam_world::{BlockPos, WorldId};

/// Who caused a change. Remote changes were already decided by the host and
/// must not be echoed back over the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    Local,
    Remote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockChange {
    pub world: WorldId,
    pub pos: BlockPos,
    pub id: BlockId,
    pub direction: Direction,
    pub origin: ChangeOrigin,
}

impl BlockChange {
    #[inline]
    pub fn data(&self) -> BlockData {
        BlockData::new(self.id, self.direction)
    }
}

/// Called synchronously on the writer's thread after the store lock is released.
pub trait BlockChangeListener: Send + Sync {
    fn on_block_changed(&self, change: &BlockChange);
}

impl<F> BlockChangeListener for F
where
    F: Fn(&BlockChange) + Send + Sync,
{
    fn on_block_changed(&self, change: &BlockChange) {
        self(change)
    }
}
