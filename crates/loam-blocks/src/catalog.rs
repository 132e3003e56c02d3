use std::collections::HashMap;
use std::sync::Arc;

use crate::config::BlocksConfig;
use crate::config::BlockDef;
use crate::items::ItemDef;

type Factory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Startup-populated table from a stable string tag to a definition factory.
///
/// Archive recovery resolves persisted type names through this table; a tag
/// with no factory is simply unknown to the running build.
pub struct TypeCatalog<T> {
    factories: HashMap<String, Factory<T>>,
}

pub type BlockCatalog = TypeCatalog<BlockDef>;
pub type ItemCatalog = TypeCatalog<ItemDef>;

impl<T> Default for TypeCatalog<T> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<T> TypeCatalog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any factory already registered under `tag`.
    pub fn register<F>(&mut self, tag: impl Into<String>, factory: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.factories.insert(tag.into(), Arc::new(factory));
    }

    pub fn create(&self, tag: &str) -> Option<T> {
        self.factories.get(tag).map(|f| f())
    }

    #[inline]
    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Tags in sorted order, so registration from a catalog is reproducible.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<T: Clone + Send + Sync + 'static> TypeCatalog<T> {
    pub fn register_value(&mut self, tag: impl Into<String>, value: T) {
        self.register(tag, move || value.clone());
    }
}

impl BlockCatalog {
    pub fn from_config(cfg: &BlocksConfig) -> Self {
        let mut catalog = Self::new();
        for def in &cfg.blocks {
            catalog.register_value(def.name.clone(), def.clone());
        }
        catalog
    }
}
