use shale_nbt::NbtValue;
use shale_types::{
    Attribute, BlockPos, ChunkPos, EntityLink, GameRule, ItemInstance, ItemStack, Vec2, Vec3,
};
use uuid::Uuid;

use crate::metadata::EntityMetadataMap;
use crate::recipe::{PotionContainerChangeRecipe, PotionRecipe, Recipe};

/// Version-independent packet representation, shaped after the latest
/// protocol. Per-version adapters convert between wire layouts and these;
/// a legacy variant and the latest variant with the same meaning are
/// connected only by the conversion functions.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    // === Serverbound ===
    ActorPickRequest {
        entity_unique_id: i64,
        hotbar_slot: u8,
        /// Whether to copy block NBT. Not present in the legacy layout.
        with_data: bool,
    },
    CommandRequest {
        command_line: String,
        origin: CommandOrigin,
        internal: bool,
        /// Command parser version. Not present in the legacy layout.
        version: i32,
    },
    ModalFormResponse {
        form_id: u32,
        response_data: Option<Vec<u8>>,
        cancel_reason: Option<u8>,
    },
    PlayerAction {
        entity_runtime_id: u64,
        action_type: i32,
        block_position: BlockPos,
        /// Result position of the action. Not present in the legacy layout.
        result_position: BlockPos,
        block_face: i32,
    },
    PlayerAuthInput {
        pitch: f32,
        yaw: f32,
        position: Vec3,
        move_vector: Vec2,
        head_yaw: f32,
        input_data: u64,
        input_mode: u32,
        play_mode: u32,
        /// Interaction model. Not present in the legacy layout; upgraded
        /// packets carry [`interaction_model::CROSSHAIR`].
        interaction_model: i32,
        gaze_direction: Vec3,
        tick: u64,
        delta: Vec3,
    },
    RequestChunkRadius {
        chunk_radius: i32,
        /// Not present in the legacy layout; upgraded packets mirror the
        /// requested radius.
        max_chunk_radius: u8,
    },
    ItemStackRequest {
        requests: Vec<StackRequestEntry>,
    },
    /// Client inventory transaction. The action payload is carried opaquely
    /// behind the request header; its full decoding is left until the exact
    /// wire layout of the target version pairing is confirmed.
    InventoryTransaction {
        legacy_request_id: i32,
        payload: Vec<u8>,
    },
    /// Legacy-only time synchronisation packet. The latest protocol has no
    /// equivalent; upgrading suppresses it.
    TickSync {
        client_request_timestamp: i64,
        server_reception_timestamp: i64,
    },
    /// Legacy-only permission flag set. Downgraded UpdateAbilities packets
    /// are rewritten to this; upgrading suppresses it.
    AdventureSettings {
        flags: u32,
        command_permission_level: u32,
        action_permissions: u32,
        permission_level: u32,
        custom_stored_permissions: u32,
        player_unique_id: i64,
    },

    // === Clientbound ===
    SetActorData {
        entity_runtime_id: u64,
        metadata: EntityMetadataMap,
        tick: u64,
    },
    MobEquipment {
        entity_runtime_id: u64,
        new_item: ItemInstance,
        inventory_slot: u8,
        hotbar_slot: u8,
        window_id: u8,
    },
    MobArmourEquipment {
        entity_runtime_id: u64,
        helmet: ItemInstance,
        chestplate: ItemInstance,
        leggings: ItemInstance,
        boots: ItemInstance,
    },
    AddActor {
        entity_unique_id: i64,
        entity_runtime_id: u64,
        entity_type: String,
        position: Vec3,
        velocity: Vec3,
        pitch: f32,
        yaw: f32,
        head_yaw: f32,
        /// Body yaw. Not present in the legacy layout.
        body_yaw: f32,
        attributes: Vec<AttributeValue>,
        metadata: EntityMetadataMap,
        entity_links: Vec<EntityLink>,
    },
    AddPlayer(Box<AddPlayerData>),
    UpdateAttributes {
        entity_runtime_id: u64,
        attributes: Vec<Attribute>,
        tick: u64,
    },
    GameRulesChanged {
        game_rules: Vec<GameRule>,
    },
    SetTitle {
        action_type: i32,
        text: String,
        fade_in_duration: i32,
        remain_duration: i32,
        fade_out_duration: i32,
        /// XUID of the title target. Not present in the legacy layout.
        xuid: String,
        /// Platform online ID. Not present in the legacy layout.
        platform_online_id: String,
    },
    NetworkChunkPublisherUpdate {
        position: BlockPos,
        radius: u32,
        /// Saved chunks the client may keep. Not present in the legacy
        /// layout.
        saved_chunks: Vec<ChunkPos>,
    },
    SpawnParticleEffect {
        dimension: u8,
        entity_unique_id: i64,
        position: Vec3,
        particle_name: String,
        /// Serialised MoLang variable map. Not present in the legacy layout.
        molang_variables: Option<Vec<u8>>,
    },
    NetworkSettings {
        compression_threshold: u16,
        /// Compression algorithm selector. Not present in the legacy layout.
        compression_algorithm: u16,
        client_throttle: bool,
        client_throttle_threshold: u8,
        client_throttle_scalar: f32,
    },
    CraftingData {
        recipes: Vec<Recipe>,
        potion_recipes: Vec<PotionRecipe>,
        potion_container_change_recipes: Vec<PotionContainerChangeRecipe>,
        clear_recipes: bool,
    },
    CreativeContent {
        items: Vec<CreativeItem>,
    },
    InventoryContent {
        window_id: u32,
        content: Vec<ItemInstance>,
    },
    InventorySlot {
        window_id: u32,
        slot: u32,
        new_item: ItemInstance,
    },
    UpdateBlock {
        position: BlockPos,
        new_block_runtime_id: u32,
        flags: u32,
        layer: u32,
    },
    UpdateBlockSynced {
        position: BlockPos,
        new_block_runtime_id: u32,
        flags: u32,
        layer: u32,
        entity_unique_id: u64,
        transition_type: u64,
    },
    LevelChunk {
        position: ChunkPos,
        sub_chunk_count: u32,
        cache_enabled: bool,
        blob_hashes: Vec<u64>,
        raw_payload: Vec<u8>,
    },
    BlockActorData {
        position: BlockPos,
        nbt: NbtValue,
    },
    StartGame(Box<StartGameData>),
    /// Latest-only replacement for the adventure flag set. Downgrading uses
    /// UpdateAbilities instead and suppresses this packet.
    UpdateAdventureSettings {
        no_pvm: bool,
        no_mvp: bool,
        immutable_world: bool,
        show_name_tags: bool,
        auto_jump: bool,
    },
    UpdateAbilities {
        ability_data: AbilityData,
    },

    /// Unknown or identical-layout packet, passed through unchanged.
    Unknown { id: u32, payload: Vec<u8> },
}

impl Packet {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Packet::ActorPickRequest { .. } => "ActorPickRequest",
            Packet::CommandRequest { .. } => "CommandRequest",
            Packet::ModalFormResponse { .. } => "ModalFormResponse",
            Packet::PlayerAction { .. } => "PlayerAction",
            Packet::PlayerAuthInput { .. } => "PlayerAuthInput",
            Packet::RequestChunkRadius { .. } => "RequestChunkRadius",
            Packet::ItemStackRequest { .. } => "ItemStackRequest",
            Packet::InventoryTransaction { .. } => "InventoryTransaction",
            Packet::TickSync { .. } => "TickSync",
            Packet::AdventureSettings { .. } => "AdventureSettings",
            Packet::SetActorData { .. } => "SetActorData",
            Packet::MobEquipment { .. } => "MobEquipment",
            Packet::MobArmourEquipment { .. } => "MobArmourEquipment",
            Packet::AddActor { .. } => "AddActor",
            Packet::AddPlayer { .. } => "AddPlayer",
            Packet::UpdateAttributes { .. } => "UpdateAttributes",
            Packet::GameRulesChanged { .. } => "GameRulesChanged",
            Packet::SetTitle { .. } => "SetTitle",
            Packet::NetworkChunkPublisherUpdate { .. } => "NetworkChunkPublisherUpdate",
            Packet::SpawnParticleEffect { .. } => "SpawnParticleEffect",
            Packet::NetworkSettings { .. } => "NetworkSettings",
            Packet::CraftingData { .. } => "CraftingData",
            Packet::CreativeContent { .. } => "CreativeContent",
            Packet::InventoryContent { .. } => "InventoryContent",
            Packet::InventorySlot { .. } => "InventorySlot",
            Packet::UpdateBlock { .. } => "UpdateBlock",
            Packet::UpdateBlockSynced { .. } => "UpdateBlockSynced",
            Packet::LevelChunk { .. } => "LevelChunk",
            Packet::BlockActorData { .. } => "BlockActorData",
            Packet::StartGame(_) => "StartGame",
            Packet::UpdateAdventureSettings { .. } => "UpdateAdventureSettings",
            Packet::UpdateAbilities { .. } => "UpdateAbilities",
            Packet::Unknown { .. } => "Unknown",
        }
    }
}

/// Field set of [`Packet::AddPlayer`]. Boxed to keep the enum small.
#[derive(Debug, Clone, PartialEq)]
pub struct AddPlayerData {
    pub uuid: Uuid,
    pub username: String,
    pub entity_runtime_id: u64,
    pub platform_chat_id: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub head_yaw: f32,
    pub held_item: ItemInstance,
    /// Game type of the added player. Not present in the legacy layout.
    pub game_type: i32,
    pub metadata: EntityMetadataMap,
    pub ability_data: AbilityData,
    pub entity_links: Vec<EntityLink>,
    pub device_id: String,
    pub build_platform: i32,
}

/// Origin data of a command request.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOrigin {
    pub origin: u32,
    pub uuid: Uuid,
    pub request_id: String,
    pub player_unique_id: i64,
}

/// Short attribute form replicated in AddActor.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeValue {
    pub name: String,
    pub min: f32,
    pub value: f32,
    pub max: f32,
}

/// An entry of the creative inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct CreativeItem {
    pub creative_item_network_id: u32,
    pub item: ItemStack,
}

/// Interaction model values carried by PlayerAuthInput in the latest layout.
pub mod interaction_model {
    pub const TOUCH: i32 = 0;
    pub const CROSSHAIR: i32 = 1;
    pub const CLASSIC: i32 = 2;
}

/// Play mode values of PlayerAuthInput. The gaze direction is only on the
/// wire when the play mode is reality.
pub mod play_mode {
    pub const NORMAL: u32 = 0;
    pub const SCREEN: u32 = 2;
    pub const VR: u32 = 7;
    pub const REALITY: u32 = 8;
}

/// Ability constants of the latest layered permission system.
pub mod ability {
    pub const BUILD: u32 = 1 << 0;
    pub const MINE: u32 = 1 << 1;
    pub const DOORS_AND_SWITCHES: u32 = 1 << 2;
    pub const OPEN_CONTAINERS: u32 = 1 << 3;
    pub const ATTACK_PLAYERS: u32 = 1 << 4;
    pub const ATTACK_MOBS: u32 = 1 << 5;
    pub const OPERATOR_COMMANDS: u32 = 1 << 6;
    pub const TELEPORT: u32 = 1 << 7;
    pub const INVULNERABLE: u32 = 1 << 8;
    pub const FLYING: u32 = 1 << 9;
    pub const MAY_FLY: u32 = 1 << 10;
    pub const INSTANT_BUILD: u32 = 1 << 11;
    pub const LIGHTNING: u32 = 1 << 12;
    pub const FLY_SPEED: u32 = 1 << 13;
    pub const WALK_SPEED: u32 = 1 << 14;
    pub const MUTED: u32 = 1 << 15;
    pub const WORLD_BUILDER: u32 = 1 << 16;
    pub const NO_CLIP: u32 = 1 << 17;
}

/// Adventure flag constants of the legacy flat permission system.
pub mod adventure_flag {
    pub const WORLD_IMMUTABLE: u32 = 1 << 0;
    pub const NO_PVP: u32 = 1 << 1;
    pub const AUTO_JUMP: u32 = 1 << 5;
    pub const ALLOW_FLIGHT: u32 = 1 << 6;
    pub const NO_CLIP: u32 = 1 << 7;
    pub const WORLD_BUILDER: u32 = 1 << 8;
    pub const FLYING: u32 = 1 << 9;
    pub const MUTED: u32 = 1 << 10;
}

/// Action permission constants of the legacy flat permission system.
pub mod action_permission {
    pub const MINE: u32 = 1 << 0;
    pub const DOORS_AND_SWITCHES: u32 = 1 << 1;
    pub const OPEN_CONTAINERS: u32 = 1 << 2;
    pub const ATTACK_PLAYERS: u32 = 1 << 3;
    pub const ATTACK_MOBS: u32 = 1 << 4;
    pub const OPERATOR_COMMANDS: u32 = 1 << 5;
    pub const TELEPORT: u32 = 1 << 6;
    pub const BUILD: u32 = 1 << 7;
}

/// A single layer of the latest ability system.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityLayer {
    pub layer_type: u16,
    pub abilities: u32,
    pub values: u32,
    pub fly_speed: f32,
    pub walk_speed: f32,
}

/// Per-player ability data replicated by UpdateAbilities and AddPlayer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AbilityData {
    pub entity_unique_id: i64,
    pub player_permissions: u8,
    pub command_permissions: u8,
    pub layers: Vec<AbilityLayer>,
}

/// A single item stack request of an ItemStackRequest packet.
#[derive(Debug, Clone, PartialEq)]
pub struct StackRequestEntry {
    pub request_id: i32,
    pub actions: Vec<StackRequestAction>,
    /// Text filter strings. Not present in the legacy layout.
    pub filter_strings: Vec<String>,
}

/// Slot information referenced by stack request actions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StackRequestSlotInfo {
    pub container_id: u8,
    pub slot: u8,
    pub stack_network_id: i32,
}

/// Stack request action tags. Read as a leading u8 before the payload.
pub mod stack_request_action_type {
    pub const TAKE: u8 = 0;
    pub const PLACE: u8 = 1;
    pub const SWAP: u8 = 2;
    pub const DROP: u8 = 3;
    pub const DESTROY: u8 = 4;
    pub const CONSUME: u8 = 5;
    pub const CREATE: u8 = 6;
    pub const LAB_TABLE_COMBINE: u8 = 9;
    pub const BEACON_PAYMENT: u8 = 10;
    pub const MINE_BLOCK: u8 = 11;
    pub const CRAFT_RECIPE: u8 = 12;
    pub const CRAFT_RECIPE_AUTO: u8 = 13;
    pub const CRAFT_CREATIVE: u8 = 14;
    pub const CRAFT_RESULTS_DEPRECATED: u8 = 17;
}

/// A single action of an item stack request.
#[derive(Debug, Clone, PartialEq)]
pub enum StackRequestAction {
    Take {
        count: u8,
        source: StackRequestSlotInfo,
        destination: StackRequestSlotInfo,
    },
    Place {
        count: u8,
        source: StackRequestSlotInfo,
        destination: StackRequestSlotInfo,
    },
    Swap {
        source: StackRequestSlotInfo,
        destination: StackRequestSlotInfo,
    },
    Drop {
        count: u8,
        source: StackRequestSlotInfo,
        randomly: bool,
    },
    Destroy {
        count: u8,
        source: StackRequestSlotInfo,
    },
    Consume {
        count: u8,
        source: StackRequestSlotInfo,
    },
    Create {
        results_slot: u8,
    },
    LabTableCombine,
    BeaconPayment {
        primary_effect: i32,
        secondary_effect: i32,
    },
    MineBlock {
        hotbar_slot: i32,
        predicted_durability: i32,
        stack_network_id: i32,
    },
    CraftRecipe {
        recipe_network_id: u32,
    },
    CraftRecipeAuto {
        recipe_network_id: u32,
        times_crafted: u8,
    },
    CraftCreative {
        creative_item_network_id: u32,
    },
    CraftResultsDeprecated {
        result_items: Vec<ItemStack>,
        times_crafted: u8,
    },
}

impl StackRequestAction {
    pub fn type_tag(&self) -> u8 {
        use crate::packets::stack_request_action_type as t;
        match self {
            StackRequestAction::Take { .. } => t::TAKE,
            StackRequestAction::Place { .. } => t::PLACE,
            StackRequestAction::Swap { .. } => t::SWAP,
            StackRequestAction::Drop { .. } => t::DROP,
            StackRequestAction::Destroy { .. } => t::DESTROY,
            StackRequestAction::Consume { .. } => t::CONSUME,
            StackRequestAction::Create { .. } => t::CREATE,
            StackRequestAction::LabTableCombine => t::LAB_TABLE_COMBINE,
            StackRequestAction::BeaconPayment { .. } => t::BEACON_PAYMENT,
            StackRequestAction::MineBlock { .. } => t::MINE_BLOCK,
            StackRequestAction::CraftRecipe { .. } => t::CRAFT_RECIPE,
            StackRequestAction::CraftRecipeAuto { .. } => t::CRAFT_RECIPE_AUTO,
            StackRequestAction::CraftCreative { .. } => t::CRAFT_CREATIVE,
            StackRequestAction::CraftResultsDeprecated { .. } => t::CRAFT_RESULTS_DEPRECATED,
        }
    }
}

/// The StartGame field set shared by both supported layouts. Boxed inside
/// [`Packet::StartGame`] to keep the enum small.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StartGameData {
    pub entity_unique_id: i64,
    pub entity_runtime_id: u64,
    pub player_game_mode: i32,
    pub player_position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub world_seed: i64,
    pub dimension: i32,
    pub generator: i32,
    pub world_game_mode: i32,
    pub difficulty: i32,
    pub world_spawn: BlockPos,
    pub achievements_disabled: bool,
    pub day_cycle_lock_time: i32,
    pub rain_level: f32,
    pub lightning_level: f32,
    pub multi_player_game: bool,
    pub commands_enabled: bool,
    pub texture_pack_required: bool,
    pub game_rules: Vec<GameRule>,
    pub bonus_chest_enabled: bool,
    pub start_with_map_enabled: bool,
    pub player_permissions: i32,
    pub server_chunk_tick_radius: i32,
    pub base_game_version: String,
    pub level_id: String,
    pub world_name: String,
    pub trial: bool,
    /// Movement authority mode. The latest layout wraps this in a settings
    /// struct; the legacy layout carries it flat.
    pub server_authoritative_movement_mode: u32,
    pub time: i64,
    pub enchantment_seed: i32,
    pub multi_player_correlation_id: String,
    pub server_authoritative_inventory: bool,
}
