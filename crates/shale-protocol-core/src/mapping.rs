use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use shale_nbt::NbtValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("palette is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("palette registers runtime ID {0} twice")]
    DuplicateRuntimeId(i32),
    #[error("palette has no air entry")]
    MissingAir,
}

// === Items ===

#[derive(Debug, Deserialize)]
struct ItemPaletteEntry {
    runtime_id: i32,
    /// Metadata-variant overrides: variant value -> runtime ID.
    #[serde(default)]
    variants: BTreeMap<u32, i32>,
}

/// Bidirectional item table for one protocol version: item name to network
/// runtime ID and back. Constructed once from an embedded palette and
/// immutable afterwards.
pub struct ItemMapping {
    by_name: HashMap<String, ItemPaletteEntry>,
    by_runtime_id: HashMap<i32, String>,
}

impl ItemMapping {
    /// Parse an embedded item palette. The palette maps item names to their
    /// runtime IDs for this version; runtime IDs must be unique so that
    /// every ID a peer can send decodes to exactly one name.
    pub fn from_palette(data: &str) -> Result<Self, MappingError> {
        let entries: BTreeMap<String, ItemPaletteEntry> = serde_json::from_str(data)?;
        let mut by_runtime_id = HashMap::with_capacity(entries.len());
        for (name, entry) in &entries {
            if by_runtime_id.insert(entry.runtime_id, name.clone()).is_some() {
                return Err(MappingError::DuplicateRuntimeId(entry.runtime_id));
            }
        }
        Ok(Self {
            by_name: entries.into_iter().collect(),
            by_runtime_id,
        })
    }

    /// Look up the runtime ID for an item name and metadata variant.
    /// Returns None when the name is not in this version's palette; the
    /// caller substitutes its fallback rather than failing the packet.
    pub fn runtime_id_for(&self, name: &str, variant: u32) -> Option<i32> {
        let entry = self.by_name.get(name)?;
        Some(*entry.variants.get(&variant).unwrap_or(&entry.runtime_id))
    }

    /// Look up the item name for a runtime ID.
    pub fn name_for(&self, runtime_id: i32) -> Option<&str> {
        self.by_runtime_id.get(&runtime_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}

// === Blocks ===

/// A property value of a block state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    String(String),
}

/// A block state: name plus its full property set. Two versions agree on
/// states (names and properties), not on runtime IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct BlockState {
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }
}

/// Remapper pair adjusting block-actor persisted data (sign text and the
/// like) whose schema moved between versions.
#[derive(Clone, Copy)]
pub struct BlockActorRemapper {
    pub downgrade: fn(NbtValue) -> NbtValue,
    pub upgrade: fn(NbtValue) -> NbtValue,
}

/// Bidirectional block-state table for one protocol version. The palette is
/// an ordered list of states; a state's runtime ID is its index in the list.
pub struct BlockMapping {
    states: Vec<BlockState>,
    state_to_runtime_id: HashMap<BlockState, u32>,
    air_runtime_id: u32,
    actor_remapper: Option<BlockActorRemapper>,
}

impl BlockMapping {
    pub fn from_palette(data: &str) -> Result<Self, MappingError> {
        let states: Vec<BlockState> = serde_json::from_str(data)?;
        let mut state_to_runtime_id = HashMap::with_capacity(states.len());
        let mut air_runtime_id = None;
        for (runtime_id, state) in states.iter().enumerate() {
            state_to_runtime_id.insert(state.clone(), runtime_id as u32);
            if state.name == "minecraft:air" {
                air_runtime_id = Some(runtime_id as u32);
            }
        }
        let air_runtime_id = air_runtime_id.ok_or(MappingError::MissingAir)?;
        Ok(Self {
            states,
            state_to_runtime_id,
            air_runtime_id,
            actor_remapper: None,
        })
    }

    /// Attach a block-actor remapper pair to this mapping.
    pub fn with_block_actor_remapper(
        mut self,
        downgrade: fn(NbtValue) -> NbtValue,
        upgrade: fn(NbtValue) -> NbtValue,
    ) -> Self {
        self.actor_remapper = Some(BlockActorRemapper { downgrade, upgrade });
        self
    }

    pub fn state_for(&self, runtime_id: u32) -> Option<&BlockState> {
        self.states.get(runtime_id as usize)
    }

    pub fn runtime_id_for(&self, state: &BlockState) -> Option<u32> {
        self.state_to_runtime_id.get(state).copied()
    }

    /// The defined fallback for unmapped states. Unknown blocks become air,
    /// never an error.
    pub fn air_runtime_id(&self) -> u32 {
        self.air_runtime_id
    }

    pub fn actor_remapper(&self) -> Option<&BlockActorRemapper> {
        self.actor_remapper.as_ref()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[BlockState] {
        &self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEMS: &str = r#"{
        "minecraft:air": {"runtime_id": 0},
        "minecraft:stick": {"runtime_id": 320},
        "minecraft:shield": {"runtime_id": 513},
        "minecraft:oak_log": {"runtime_id": 17, "variants": {"1": 18}}
    }"#;

    const BLOCKS: &str = r#"[
        {"name": "minecraft:air"},
        {"name": "minecraft:stone", "properties": {"stone_type": "granite"}},
        {"name": "minecraft:stone", "properties": {"stone_type": "andesite"}},
        {"name": "minecraft:lever", "properties": {"open_bit": true, "direction": 3}}
    ]"#;

    #[test]
    fn test_item_lookup_roundtrip() {
        let mapping = ItemMapping::from_palette(ITEMS).unwrap();
        for name in ["minecraft:stick", "minecraft:shield", "minecraft:air"] {
            let rid = mapping.runtime_id_for(name, 0).unwrap();
            assert_eq!(mapping.name_for(rid), Some(name));
        }
        assert_eq!(mapping.runtime_id_for("minecraft:missing", 0), None);
        assert_eq!(mapping.name_for(9999), None);
    }

    #[test]
    fn test_item_variant_override() {
        let mapping = ItemMapping::from_palette(ITEMS).unwrap();
        assert_eq!(mapping.runtime_id_for("minecraft:oak_log", 0), Some(17));
        assert_eq!(mapping.runtime_id_for("minecraft:oak_log", 1), Some(18));
        // Unregistered variants fall back to the base runtime ID.
        assert_eq!(mapping.runtime_id_for("minecraft:oak_log", 7), Some(17));
    }

    #[test]
    fn test_duplicate_runtime_id_rejected() {
        let bad = r#"{
            "minecraft:a": {"runtime_id": 1},
            "minecraft:b": {"runtime_id": 1}
        }"#;
        assert!(matches!(
            ItemMapping::from_palette(bad),
            Err(MappingError::DuplicateRuntimeId(1))
        ));
    }

    #[test]
    fn test_block_state_roundtrip() {
        let mapping = BlockMapping::from_palette(BLOCKS).unwrap();
        assert_eq!(mapping.air_runtime_id(), 0);
        for runtime_id in 0..mapping.len() as u32 {
            let state = mapping.state_for(runtime_id).unwrap().clone();
            assert_eq!(mapping.runtime_id_for(&state), Some(runtime_id));
        }
        // States are distinguished by their full property set.
        let granite = BlockState {
            name: "minecraft:stone".into(),
            properties: [("stone_type".into(), PropertyValue::String("granite".into()))]
                .into_iter()
                .collect(),
        };
        assert_eq!(mapping.runtime_id_for(&granite), Some(1));
        assert_eq!(mapping.runtime_id_for(&BlockState::new("minecraft:stone")), None);
    }

    #[test]
    fn test_palette_without_air_rejected() {
        let bad = r#"[{"name": "minecraft:stone"}]"#;
        assert!(matches!(
            BlockMapping::from_palette(bad),
            Err(MappingError::MissingAir)
        ));
    }
}
