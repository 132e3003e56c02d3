//! Binary records for chunk grids and type registries.
//!
//! Chunk records are sparse: only non-air cells are written, as
//! `(index u16, block u16, direction u8)` in ascending index order behind a
//! small header. Reading rebuilds the dense grid or rejects the whole record.

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use loam_blocks::{
    BlockCatalog, BlockData, BlockRegistry, Direction, ItemCatalog, ItemRegistry, TypeCatalog,
    TypeTable,
};
use loam_chunk::ChunkGrid;
use loam_world::{CHUNK_SIZE, CHUNK_VOLUME};

use crate::error::ArchiveError;

const CHUNK_MAGIC: &[u8; 4] = b"LMCK";
const TYPES_MAGIC: &[u8; 4] = b"LMRG";
const VERSION: u8 = 1;
const CHUNK_HEADER_LEN: usize = 4 + 1 + 2 + 4;
const CHUNK_ENTRY_LEN: usize = 2 + 2 + 1;
const MAX_TAG_LEN: usize = u16::MAX as usize;

pub fn serialize_chunk(grid: &ChunkGrid) -> Vec<u8> {
    let count = grid.non_air_count();
    let mut out = Vec::with_capacity(CHUNK_HEADER_LEN + count * CHUNK_ENTRY_LEN);
    write_chunk_to(&mut out, grid, count).expect("writing to a Vec cannot fail");
    out
}

fn write_chunk_to(out: &mut Vec<u8>, grid: &ChunkGrid, count: usize) -> std::io::Result<()> {
    out.write_all(CHUNK_MAGIC)?;
    out.write_u8(VERSION)?;
    out.write_u16::<LittleEndian>(CHUNK_SIZE as u16)?;
    out.write_u32::<LittleEndian>(count as u32)?;
    for (i, cell) in grid.cells().iter().enumerate() {
        if cell.is_air() {
            continue;
        }
        out.write_u16::<LittleEndian>(i as u16)?;
        out.write_u16::<LittleEndian>(cell.id)?;
        out.write_u8(cell.direction.as_u8())?;
    }
    Ok(())
}

pub fn deserialize_chunk(bytes: &[u8]) -> Result<ChunkGrid, ArchiveError> {
    let mut r = Cursor::new(bytes);
    read_magic(&mut r, CHUNK_MAGIC)?;
    let size = r.read_u16::<LittleEndian>().map_err(ArchiveError::from_read)? as usize;
    if size != CHUNK_SIZE {
        return Err(ArchiveError::ChunkSizeMismatch {
            expected: CHUNK_SIZE,
            found: size,
        });
    }
    let count = r.read_u32::<LittleEndian>().map_err(ArchiveError::from_read)? as usize;
    if count > CHUNK_VOLUME {
        return Err(ArchiveError::Corrupt(format!(
            "{count} entries exceed {CHUNK_VOLUME} cells"
        )));
    }
    let expected_len = CHUNK_HEADER_LEN + count * CHUNK_ENTRY_LEN;
    if bytes.len() < expected_len {
        return Err(ArchiveError::Truncated);
    }
    if bytes.len() > expected_len {
        return Err(ArchiveError::Corrupt(format!(
            "{} trailing bytes",
            bytes.len() - expected_len
        )));
    }

    let mut grid = ChunkGrid::air();
    let mut last: Option<usize> = None;
    for _ in 0..count {
        let index = r.read_u16::<LittleEndian>().map_err(ArchiveError::from_read)? as usize;
        let id = r.read_u16::<LittleEndian>().map_err(ArchiveError::from_read)?;
        let dir = r.read_u8().map_err(ArchiveError::from_read)?;
        if index >= CHUNK_VOLUME {
            return Err(ArchiveError::Corrupt(format!("cell index {index} out of range")));
        }
        if last.is_some_and(|prev| index <= prev) {
            return Err(ArchiveError::Corrupt(format!("cell index {index} out of order")));
        }
        if id == 0 {
            return Err(ArchiveError::Corrupt(format!("air stored at cell {index}")));
        }
        let direction = Direction::from_u8(dir)
            .ok_or_else(|| ArchiveError::Corrupt(format!("direction {dir} at cell {index}")))?;
        grid.cells_mut()[index] = BlockData::new(id, direction);
        last = Some(index);
    }
    Ok(grid)
}

/// Persisted `(id, tag)` pairs plus the next-id breakpoint of a type table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeTableRecord {
    pub next_id: u32,
    pub entries: Vec<(u32, String)>,
}

impl TypeTableRecord {
    pub fn capture<T: TypeTable>(table: &T) -> Self {
        Self {
            next_id: table.next_id(),
            entries: table.entries(),
        }
    }
}

pub fn serialize_types(record: &TypeTableRecord) -> Vec<u8> {
    let mut out = Vec::new();
    write_types_to(&mut out, record).expect("writing to a Vec cannot fail");
    out
}

fn write_types_to(out: &mut Vec<u8>, record: &TypeTableRecord) -> std::io::Result<()> {
    out.write_all(TYPES_MAGIC)?;
    out.write_u8(VERSION)?;
    let entries: Vec<&(u32, String)> = record
        .entries
        .iter()
        .filter(|(id, tag)| {
            let fits = tag.len() <= MAX_TAG_LEN;
            if !fits {
                log::warn!(target: "archive", "type id {} has a {}-byte tag; not saved", id, tag.len());
            }
            fits
        })
        .collect();
    out.write_u32::<LittleEndian>(record.next_id)?;
    out.write_u32::<LittleEndian>(entries.len() as u32)?;
    for (id, tag) in entries {
        out.write_u32::<LittleEndian>(*id)?;
        out.write_u16::<LittleEndian>(tag.len() as u16)?;
        out.write_all(tag.as_bytes())?;
    }
    Ok(())
}

/// Entries whose tag is not valid UTF-8 are logged and dropped; structural
/// damage (short reads, bad header) rejects the record.
pub fn deserialize_types(bytes: &[u8]) -> Result<TypeTableRecord, ArchiveError> {
    let mut r = Cursor::new(bytes);
    read_magic(&mut r, TYPES_MAGIC)?;
    let next_id = r.read_u32::<LittleEndian>().map_err(ArchiveError::from_read)?;
    let count = r.read_u32::<LittleEndian>().map_err(ArchiveError::from_read)? as usize;
    let mut entries = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        let id = r.read_u32::<LittleEndian>().map_err(ArchiveError::from_read)?;
        let len = r.read_u16::<LittleEndian>().map_err(ArchiveError::from_read)? as usize;
        let mut raw = vec![0u8; len];
        r.read_exact(&mut raw).map_err(ArchiveError::from_read)?;
        match String::from_utf8(raw) {
            Ok(tag) => entries.push((id, tag)),
            Err(_) => log::warn!(target: "archive", "type id {} has a non-utf8 tag; skipped", id),
        }
    }
    if (r.position() as usize) != bytes.len() {
        return Err(ArchiveError::Corrupt("trailing bytes after type table".into()));
    }
    Ok(TypeTableRecord { next_id, entries })
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub skipped: Vec<(u32, String)>,
}

/// Re-registers each recorded entry through `catalog`. Unknown tags and id
/// conflicts are logged and skipped; the rest of the table still loads.
pub fn restore_types<T: TypeTable>(
    record: &TypeTableRecord,
    catalog: &TypeCatalog<T::Def>,
    table: &mut T,
) -> RestoreReport {
    let mut report = RestoreReport::default();
    for (id, tag) in &record.entries {
        let Some(def) = catalog.create(tag) else {
            log::warn!(target: "archive", "unknown type `{}` (id {}); dropped", tag, id);
            report.skipped.push((*id, tag.clone()));
            continue;
        };
        match table.restore(*id, tag, def) {
            Ok(()) => report.restored += 1,
            Err(e) => {
                log::warn!(target: "archive", "cannot restore `{}` as id {}: {}", tag, id, e);
                report.skipped.push((*id, tag.clone()));
            }
        }
    }
    table.raise_next_id(record.next_id);
    report
}

pub fn restore_blocks(
    record: &TypeTableRecord,
    catalog: &BlockCatalog,
    reg: &mut BlockRegistry,
) -> RestoreReport {
    restore_types(record, catalog, reg)
}

pub fn restore_items(
    record: &TypeTableRecord,
    catalog: &ItemCatalog,
    items: &mut ItemRegistry,
) -> RestoreReport {
    restore_types(record, catalog, items)
}

fn read_magic(r: &mut Cursor<&[u8]>, magic: &[u8; 4]) -> Result<(), ArchiveError> {
    let mut found = [0u8; 4];
    r.read_exact(&mut found).map_err(ArchiveError::from_read)?;
    if &found != magic {
        return Err(ArchiveError::BadMagic);
    }
    let version = r.read_u8().map_err(ArchiveError::from_read)?;
    if version != VERSION {
        return Err(ArchiveError::UnsupportedVersion(version));
    }
    Ok(())
}
