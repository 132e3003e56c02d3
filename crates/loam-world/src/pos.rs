use serde::{Deserialize, Serialize};

use crate::{CHUNK_SIZE, ChunkCoord};

/// Global voxel position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Position inside a chunk; every component lies in `[0, CHUNK_SIZE)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn with_y(self, y: i32) -> Self {
        Self { y, ..self }
    }

    #[inline]
    pub fn up(self) -> Self {
        self.with_y(self.y + 1)
    }

    /// Floor division, so `-1` lands in chunk `-1` rather than `0`.
    #[inline]
    pub fn chunk(self) -> ChunkCoord {
        let s = CHUNK_SIZE as i32;
        ChunkCoord::new(self.x.div_euclid(s), self.y.div_euclid(s), self.z.div_euclid(s))
    }

    #[inline]
    pub fn local(self) -> LocalPos {
        let s = CHUNK_SIZE as i32;
        LocalPos {
            x: self.x.rem_euclid(s) as usize,
            y: self.y.rem_euclid(s) as usize,
            z: self.z.rem_euclid(s) as usize,
        }
    }

    #[inline]
    pub fn split(self) -> (ChunkCoord, LocalPos) {
        (self.chunk(), self.local())
    }

    pub fn from_parts(chunk: ChunkCoord, local: LocalPos) -> Self {
        let s = CHUNK_SIZE as i32;
        Self {
            x: chunk.cx * s + local.x as i32,
            y: chunk.cy * s + local.y as i32,
            z: chunk.cz * s + local.z as i32,
        }
    }
}

impl LocalPos {
    #[inline]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}
