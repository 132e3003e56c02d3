use std::collections::{BTreeMap, HashMap};

use crate::registry::{RegistryError, TypeTable};

pub type ItemId = u32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemDef {
    pub name: String,
    pub max_stack: u16,
    /// Block tag placed when the item is used, if any.
    pub places: Option<String>,
}

impl ItemDef {
    pub fn new(name: &str, max_stack: u16) -> Self {
        Self {
            name: name.to_string(),
            max_stack,
            places: None,
        }
    }

    pub fn placing(name: &str, block: &str) -> Self {
        Self {
            name: name.to_string(),
            max_stack: 64,
            places: Some(block.to_string()),
        }
    }
}

/// Item type table; ids start at 1 and are never reused within a save.
#[derive(Clone, Debug)]
pub struct ItemRegistry {
    items: BTreeMap<ItemId, ItemDef>,
    by_name: HashMap<String, ItemId>,
    next_id: ItemId,
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            by_name: HashMap::new(),
            next_id: 1,
        }
    }
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: ItemDef) -> Result<ItemId, RegistryError> {
        if let Some(id) = self.by_name.get(&def.name) {
            return Ok(*id);
        }
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(RegistryError::Exhausted)?;
        self.by_name.insert(def.name.clone(), id);
        self.items.insert(id, def);
        Ok(id)
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemDef> {
        self.items.get(&id)
    }

    pub fn resolve(&self, name: &str) -> Option<ItemId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl TypeTable for ItemRegistry {
    type Def = ItemDef;

    fn entries(&self) -> Vec<(u32, String)> {
        self.items
            .iter()
            .map(|(id, def)| (*id, def.name.clone()))
            .collect()
    }

    fn next_id(&self) -> u32 {
        self.next_id
    }

    fn raise_next_id(&mut self, next: u32) {
        self.next_id = self.next_id.max(next);
    }

    fn restore(&mut self, id: u32, tag: &str, mut def: ItemDef) -> Result<(), RegistryError> {
        if id == 0 {
            return Err(RegistryError::ReservedId(id));
        }
        if let Some(existing) = self.items.get(&id) {
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
                id: *other,
            });
        }
        def.name = tag.to_string();
        self.by_name.insert(def.name.clone(), id);
        self.items.insert(id, def);
        self.next_id = self.next_id.max(id.saturating_add(1));
        Ok(())
    }
}
