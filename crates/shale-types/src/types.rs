use serde::{Deserialize, Serialize};
use shale_nbt::NbtValue;

/// A block position in the world (x, y, z integers).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// A chunk column position (x, z).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// A 3D position or direction with single precision, as Bedrock sends it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A 2D vector, used for movement input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The item type part of a stack: which item it is, and which variant of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemType {
    /// Network runtime ID of the item. 0 is air for every protocol version.
    pub network_id: i32,
    /// Metadata value, distinguishing variants such as dye colours.
    pub metadata: u32,
}

/// An item stack as carried inside packets. The wire layout of a stack is
/// version-specific; this struct is the decoded, version-independent form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemStack {
    pub item_type: ItemType,
    /// Runtime ID of the block this item places, or 0 if it is not a block.
    pub block_runtime_id: i32,
    pub count: u16,
    /// Optional NBT payload attached to the stack (enchantments, names...).
    pub nbt: Option<NbtValue>,
    /// Block names this item may be placed on in adventure mode.
    pub can_be_placed_on: Vec<String>,
    /// Block names this item may break in adventure mode.
    pub can_break: Vec<String>,
}

impl ItemStack {
    /// An empty (air) stack: the 1-byte-tag zero representation on the wire.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.item_type.network_id == 0 || self.count == 0
    }
}

/// An item stack with the session-scoped stack network ID the server uses to
/// track it. A non-zero tracking ID with an empty stack is a protocol error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemInstance {
    pub stack_network_id: i32,
    pub stack: ItemStack,
}

/// A full entity attribute, with the bounds and default the latest protocol
/// replicates. The legacy AddActor layout only carries name/value/min/max.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

/// The value of a game rule. Bedrock replicates these as a tagged union of
/// bool, unsigned int and float.
#[derive(Debug, Clone, PartialEq)]
pub enum GameRuleValue {
    Bool(bool),
    Int(u32),
    Float(f32),
}

/// A named game rule as sent in StartGame and GameRulesChanged.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRule {
    pub name: String,
    /// Whether a player may change the rule from the UI. Not present in the
    /// legacy layout.
    pub can_be_modified_by_player: bool,
    pub value: GameRuleValue,
}

/// A link between two entities, such as a rider and its mount.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityLink {
    pub ridden_entity_unique_id: i64,
    pub rider_entity_unique_id: i64,
    pub link_type: u8,
    pub immediate: bool,
    pub rider_initiated: bool,
}
