use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::types::BlockKind;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BlocksConfig {
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub kind: BlockKind,
    #[serde(default)]
    pub transparent: Option<bool>,
}

impl BlockDef {
    pub fn solid(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: BlockKind::Solid,
            transparent: Some(false),
        }
    }

    /// Gas and liquid blocks default to transparent unless the config says otherwise.
    pub fn is_transparent(&self) -> bool {
        self.transparent
            .unwrap_or(!matches!(self.kind, BlockKind::Solid))
    }
}

impl BlocksConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Built-in definitions used when no blocks file is configured.
    pub fn builtin() -> Self {
        Self {
            blocks: vec![
                BlockDef::solid("stone"),
                BlockDef::solid("dirt"),
                BlockDef::solid("grass"),
                BlockDef::solid("sand"),
                BlockDef {
                    name: "water".into(),
                    kind: BlockKind::Liquid,
                    transparent: None,
                },
                BlockDef {
                    name: "glass".into(),
                    kind: BlockKind::Solid,
                    transparent: Some(true),
                },
            ],
        }
    }
}
