use std::collections::HashMap;

use thiserror::Error;

use super::catalog::BlockCatalog;
use super::config::BlockDef;
use super::types::{BlockId, BlockKind, BlockType};

pub const AIR_NAME: &str = "air";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("id {0} is reserved for air")]
    ReservedId(u32),
    #[error("id {id} already holds `{existing}`")]
    IdTaken { id: u32, existing: String },
    #[error("`{name}` is already registered as id {id}")]
    NameTaken { name: String, id: u32 },
    #[error("id space exhausted")]
    Exhausted,
}

/// Registered type tables that the archive persists as `(id, tag)` pairs
/// plus a monotonic next-id breakpoint.
pub trait TypeTable {
    type Def;

    fn entries(&self) -> Vec<(u32, String)>;
    fn next_id(&self) -> u32;
    fn raise_next_id(&mut self, next: u32);
    fn restore(&mut self, id: u32, tag: &str, def: Self::Def) -> Result<(), RegistryError>;
}

/// Sequential block id assignment with name lookup. Id 0 is always air.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    blocks: Vec<Option<BlockType>>,
    by_name: HashMap<String, BlockId>,
    next_id: u32,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    pub fn new() -> Self {
        let air = BlockType {
            id: 0,
            name: AIR_NAME.to_string(),
            kind: BlockKind::Gas,
            transparent: true,
        };
        let mut by_name = HashMap::new();
        by_name.insert(AIR_NAME.to_string(), 0);
        Self {
            blocks: vec![Some(air)],
            by_name,
            next_id: 1,
        }
    }

    /// Every catalog tag in sorted order.
    pub fn from_catalog(catalog: &BlockCatalog) -> Result<Self, RegistryError> {
        let mut reg = Self::new();
        reg.register_missing(catalog)?;
        Ok(reg)
    }

    /// Registers catalog tags not yet known, e.g. blocks added since the archive was written.
    pub fn register_missing(&mut self, catalog: &BlockCatalog) -> Result<Vec<BlockId>, RegistryError> {
        let mut added = Vec::new();
        for tag in catalog.tags() {
            if self.by_name.contains_key(tag) {
                continue;
            }
            if let Some(def) = catalog.create(tag) {
                added.push(self.register_as(tag, &def)?);
            }
        }
        Ok(added)
    }

    /// Registers `def` under the next free id; re-registering a name returns its id.
    pub fn register(&mut self, def: &BlockDef) -> Result<BlockId, RegistryError> {
        self.register_as(&def.name, def)
    }

    fn register_as(&mut self, tag: &str, def: &BlockDef) -> Result<BlockId, RegistryError> {
        if let Some(id) = self.by_name.get(tag) {
            return Ok(*id);
        }
        let mut id = self.next_id;
        while self.get_raw(id).is_some() {
            id += 1;
        }
        let id16 = BlockId::try_from(id).map_err(|_| RegistryError::Exhausted)?;
        self.insert(id16, tag, def);
        Ok(id16)
    }

    /// Places `def` at an exact id. Used when recovering a persisted registry.
    pub fn register_at(&mut self, id: u32, tag: &str, def: &BlockDef) -> Result<(), RegistryError> {
        if id == 0 {
            return Err(RegistryError::ReservedId(id));
        }
        let id16 = BlockId::try_from(id).map_err(|_| RegistryError::Exhausted)?;
        if let Some(existing) = self.get(id16) {
            if existing.name == tag {
                return Ok(());
            }
            return Err(RegistryError::IdTaken {
                id,
                existing: existing.name.clone(),
            });
        }
        if let Some(other) = self.by_name.get(tag) {
            return Err(RegistryError::NameTaken {
                name: tag.to_string(),
                id: u32::from(*other),
            });
        }
        self.insert(id16, tag, def);
        Ok(())
    }

    fn insert(&mut self, id: BlockId, tag: &str, def: &BlockDef) {
        let slot = id as usize;
        if self.blocks.len() <= slot {
            self.blocks.resize(slot + 1, None);
        }
        self.blocks[slot] = Some(BlockType {
            id,
            name: tag.to_string(),
            kind: def.kind,
            transparent: def.is_transparent(),
        });
        self.by_name.insert(tag.to_string(), id);
        self.next_id = self.next_id.max(u32::from(id) + 1);
    }

    #[inline]
    fn get_raw(&self, id: u32) -> Option<&BlockType> {
        self.blocks.get(id as usize).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.get_raw(u32::from(id))
    }

    pub fn resolve_block_id(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Unknown ids are treated as transparent so they never hide neighbours.
    pub fn is_transparent(&self, id: BlockId) -> bool {
        self.get(id).map(|b| b.transparent).unwrap_or(true)
    }

    pub fn block_kind(&self, id: BlockId) -> Option<BlockKind> {
        self.get(id).map(|b| b.kind)
    }

    /// Registered blocks including air.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.blocks.iter().flatten()
    }
}

impl TypeTable for BlockRegistry {
    type Def = BlockDef;

    fn entries(&self) -> Vec<(u32, String)> {
        self.iter()
            .filter(|b| b.id != 0)
            .map(|b| (u32::from(b.id), b.name.clone()))
            .collect()
    }

    fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Breakpoints past the `BlockId` range are ignored; honouring one would
    /// leave no id for new blocks.
    fn raise_next_id(&mut self, next: u32) {
        if next > u32::from(BlockId::MAX) {
            log::warn!("block id breakpoint {} is out of range; keeping {}", next, self.next_id);
            return;
        }
        self.next_id = self.next_id.max(next);
    }

    fn restore(&mut self, id: u32, tag: &str, def: BlockDef) -> Result<(), RegistryError> {
        self.register_at(id, tag, &def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlocksConfig;

    #[test]
    fn air_is_preregistered() {
        let reg = BlockRegistry::new();
        assert_eq!(reg.resolve_block_id("air"), Some(0));
        assert!(reg.is_transparent(0));
        assert_eq!(reg.block_kind(0), Some(BlockKind::Gas));
        assert_eq!(reg.next_id(), 1);
    }

    #[test]
    fn ids_are_sequential_and_idempotent() {
        let mut reg = BlockRegistry::new();
        let stone = reg.register(&BlockDef::solid("stone")).unwrap();
        let dirt = reg.register(&BlockDef::solid("dirt")).unwrap();
        assert_eq!((stone, dirt), (1, 2));
        assert_eq!(reg.register(&BlockDef::solid("stone")).unwrap(), 1);
        assert_eq!(reg.next_id(), 3);
    }

    #[test]
    fn register_at_rejects_collisions() {
        let mut reg = BlockRegistry::new();
        reg.register_at(5, "stone", &BlockDef::solid("stone")).unwrap();
        assert_eq!(reg.next_id(), 6);
        assert_eq!(
            reg.register_at(5, "dirt", &BlockDef::solid("dirt")),
            Err(RegistryError::IdTaken {
                id: 5,
                existing: "stone".into()
            })
        );
        assert!(matches!(
            reg.register_at(6, "stone", &BlockDef::solid("stone")),
            Err(RegistryError::NameTaken { .. })
        ));
        assert_eq!(
            reg.register_at(0, "x", &BlockDef::solid("x")),
            Err(RegistryError::ReservedId(0))
        );
        // next free id skips the recovered slot
        assert_eq!(reg.register(&BlockDef::solid("dirt")).unwrap(), 6);
    }

    #[test]
    fn out_of_range_breakpoint_keeps_ids_assignable() {
        let mut reg = BlockRegistry::new();
        reg.register_at(4, "stone", &BlockDef::solid("stone")).unwrap();
        reg.raise_next_id(70_000);
        assert_eq!(reg.next_id(), 5);
        assert_eq!(reg.register(&BlockDef::solid("dirt")).unwrap(), 5);
        reg.raise_next_id(u32::from(BlockId::MAX));
        assert_eq!(reg.next_id(), u32::from(BlockId::MAX));
    }

    #[test]
    fn catalog_registration_fills_missing_only() {
        let catalog = BlockCatalog::from_config(&BlocksConfig::builtin());
        let mut reg = BlockRegistry::new();
        reg.register_at(9, "water", &BlockDef::solid("water")).unwrap();
        let added = reg.register_missing(&catalog).unwrap();
        assert_eq!(added.len(), catalog.len() - 1);
        assert_eq!(reg.resolve_block_id("water"), Some(9));
        assert!(reg.resolve_block_id("stone").is_some());
    }
}
