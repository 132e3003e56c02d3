use serde::{Deserialize, Serialize};

pub type BlockId = u16;

/// Axis-aligned facing stored alongside every voxel.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    None = 0,
    North = 1,
    South = 2,
    East = 3,
    West = 4,
    Up = 5,
    Down = 6,
}

impl Direction {
    pub const ALL: [Direction; 7] = [
        Direction::None,
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_u8(v: u8) -> Option<Direction> {
        Self::ALL.get(v as usize).copied()
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::None => Direction::None,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// One voxel cell. Replaced wholesale on edit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockData {
    pub id: BlockId,
    pub direction: Direction,
}

impl BlockData {
    pub const AIR: BlockData = BlockData {
        id: 0,
        direction: Direction::None,
    };

    #[inline]
    pub const fn new(id: BlockId, direction: Direction) -> Self {
        Self { id, direction }
    }

    #[inline]
    pub fn is_air(self) -> bool {
        self.id == 0
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    #[default]
    Solid,
    Liquid,
    Gas,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockType {
    pub id: BlockId,
    /// Stable tag used for persistence and catalog lookup.
    pub name: String,
    pub kind: BlockKind,
    pub transparent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_u8_mapping_is_dense() {
        for (i, d) in Direction::ALL.iter().enumerate() {
            assert_eq!(d.as_u8() as usize, i);
            assert_eq!(Direction::from_u8(i as u8), Some(*d));
        }
        assert_eq!(Direction::from_u8(7), None);
        assert_eq!(Direction::from_u8(255), None);
    }

    #[test]
    fn opposite_is_involution() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn default_block_is_air() {
        assert!(BlockData::default().is_air());
        assert_eq!(BlockData::default(), BlockData::AIR);
    }
}
