use bytes::{BufMut, BytesMut};
use shale_nbt::{Encoding, NbtValue};

use shale_protocol_core::*;

use crate::downgrader;
use crate::io::LegacyItemIo;
use crate::mappings;
use crate::upgrader;

/// Adapter of the 1.16.100 release line. Decoding produces the shared
/// representation with the fields the legacy wire lacks left defaulted; the
/// conversion passes fill them in and rewrite identifiers.
pub struct Protocol419 {
    items: ItemMapping,
    blocks: BlockMapping,
    latest_items: ItemMapping,
    latest_blocks: BlockMapping,
    io: LegacyItemIo,
    shield_network_id: i32,
}

impl Protocol419 {
    pub fn new() -> Self {
        let items = mappings::item_mapping();
        let blocks = mappings::block_mapping().with_block_actor_remapper(
            downgrader::downgrade_block_actor,
            upgrader::upgrade_block_actor,
        );
        let shield_network_id = items.runtime_id_for("minecraft:shield", 0).unwrap_or(0);
        Self {
            items,
            blocks,
            latest_items: shale_protocol_latest::item_mapping(),
            latest_blocks: shale_protocol_latest::block_mapping(),
            io: LegacyItemIo::new(shield_network_id),
            shield_network_id,
        }
    }

    fn upgrade_translator(&self) -> PacketTranslator<'_> {
        let translator = PacketTranslator::new(
            &self.items,
            &self.latest_items,
            &self.blocks,
            &self.latest_blocks,
        );
        match self.blocks.actor_remapper() {
            Some(remapper) => translator.with_actor_remap(remapper.upgrade),
            None => translator,
        }
    }

    fn downgrade_translator(&self) -> PacketTranslator<'_> {
        let translator = PacketTranslator::new(
            &self.latest_items,
            &self.items,
            &self.latest_blocks,
            &self.blocks,
        );
        match self.blocks.actor_remapper() {
            Some(remapper) => translator.with_actor_remap(remapper.downgrade),
            None => translator,
        }
    }
}

impl Default for Protocol419 {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolAdapter for Protocol419 {
    fn protocol_version(&self) -> i32 {
        mappings::PROTOCOL_VERSION
    }

    fn version(&self) -> &'static str {
        mappings::VERSION
    }

    fn decode_packet(
        &self,
        id: u32,
        payload: &mut BytesMut,
        ctx: &SessionContext,
    ) -> CodecResult<Packet> {
        decode(id, payload, &self.io, ctx)
    }

    fn encode_packet(
        &self,
        packet: &Packet,
        ctx: &SessionContext,
    ) -> CodecResult<(u32, BytesMut)> {
        encode(packet, &self.io, ctx)
    }

    fn convert_to_latest(&self, packet: Packet, _ctx: &SessionContext) -> CodecResult<Vec<Packet>> {
        let upgraded = match packet {
            // Neither has a latest equivalent; the latest protocol tracks
            // time through PlayerAuthInput ticks and permissions through
            // UpdateAbilities.
            Packet::TickSync { .. } | Packet::AdventureSettings { .. } => return Ok(Vec::new()),
            Packet::PlayerAuthInput {
                pitch,
                yaw,
                position,
                move_vector,
                head_yaw,
                input_data,
                input_mode,
                play_mode,
                interaction_model: _,
                gaze_direction,
                tick,
                delta,
            } => Packet::PlayerAuthInput {
                pitch,
                yaw,
                position,
                move_vector,
                head_yaw,
                input_data,
                input_mode,
                play_mode,
                interaction_model: interaction_model::CROSSHAIR,
                gaze_direction,
                tick,
                delta,
            },
            Packet::RequestChunkRadius { chunk_radius, .. } => Packet::RequestChunkRadius {
                chunk_radius,
                max_chunk_radius: chunk_radius.clamp(0, u8::MAX as i32) as u8,
            },
            Packet::AddActor {
                entity_unique_id,
                entity_runtime_id,
                entity_type,
                position,
                velocity,
                pitch,
                yaw,
                head_yaw,
                body_yaw: _,
                attributes,
                metadata,
                entity_links,
            } => Packet::AddActor {
                entity_unique_id,
                entity_runtime_id,
                entity_type,
                position,
                velocity,
                pitch,
                yaw,
                head_yaw,
                body_yaw: yaw,
                attributes,
                metadata: upgrader::upgrade_metadata(metadata),
                entity_links,
            },
            Packet::AddPlayer(mut data) => {
                data.metadata = upgrader::upgrade_metadata(data.metadata);
                Packet::AddPlayer(data)
            }
            Packet::SetActorData {
                entity_runtime_id,
                metadata,
                tick,
            } => Packet::SetActorData {
                entity_runtime_id,
                metadata: upgrader::upgrade_metadata(metadata),
                tick,
            },
            other => other,
        };
        Ok(vec![self.upgrade_translator().translate(upgraded)?])
    }

    fn convert_from_latest(
        &self,
        packet: Packet,
        ctx: &SessionContext,
    ) -> CodecResult<Vec<Packet>> {
        let translated = self.downgrade_translator().translate(packet)?;
        let downgraded = match translated {
            // The latest flag set replicates what the legacy client already
            // derives from UpdateAbilities, so it is dropped outright.
            Packet::UpdateAdventureSettings { .. } => return Ok(Vec::new()),
            Packet::UpdateAbilities { ability_data } => {
                // Ability sets for other players have no legacy packet, and
                // an empty layer stack carries no state worth forwarding.
                if ability_data.layers.is_empty()
                    || ability_data.entity_unique_id != ctx.entity_unique_id
                {
                    return Ok(Vec::new());
                }
                let (flags, action_permissions) =
                    downgrader::adventure_from_abilities(&ability_data);
                Packet::AdventureSettings {
                    flags,
                    command_permission_level: ability_data.command_permissions as u32,
                    action_permissions,
                    permission_level: ability_data.player_permissions as u32,
                    custom_stored_permissions: 0,
                    player_unique_id: ability_data.entity_unique_id,
                }
            }
            Packet::SetActorData {
                entity_runtime_id,
                metadata,
                tick,
            } => Packet::SetActorData {
                entity_runtime_id,
                metadata: downgrader::downgrade_metadata(metadata),
                tick,
            },
            Packet::AddActor {
                entity_unique_id,
                entity_runtime_id,
                entity_type,
                position,
                velocity,
                pitch,
                yaw,
                head_yaw,
                body_yaw,
                attributes,
                metadata,
                entity_links,
            } => Packet::AddActor {
                entity_unique_id,
                entity_runtime_id,
                entity_type,
                position,
                velocity,
                pitch,
                yaw,
                head_yaw,
                body_yaw,
                attributes,
                metadata: downgrader::downgrade_metadata(metadata),
                entity_links,
            },
            Packet::AddPlayer(mut data) => {
                data.metadata = downgrader::downgrade_metadata(data.metadata);
                Packet::AddPlayer(data)
            }
            Packet::CraftingData {
                recipes,
                potion_recipes,
                potion_container_change_recipes,
                clear_recipes,
            } => Packet::CraftingData {
                recipes: downgrader::downgrade_recipes(recipes, &self.items),
                potion_recipes,
                potion_container_change_recipes,
                clear_recipes,
            },
            other => other,
        };
        Ok(vec![downgraded])
    }

    fn shield_network_id(&self) -> i32 {
        self.shield_network_id
    }

    fn cipher(&self, key: &[u8; 32]) -> Cipher {
        Cipher::Cfb8(Cfb8Cipher::new(key))
    }
}

// === Packet ID constants ===

const ID_START_GAME: u32 = 0x0b;
const ID_ADD_PLAYER: u32 = 0x0c;
const ID_ADD_ACTOR: u32 = 0x0d;
const ID_UPDATE_BLOCK: u32 = 0x15;
const ID_TICK_SYNC: u32 = 0x17;
const ID_UPDATE_ATTRIBUTES: u32 = 0x1d;
const ID_INVENTORY_TRANSACTION: u32 = 0x1e;
const ID_MOB_EQUIPMENT: u32 = 0x1f;
const ID_MOB_ARMOUR_EQUIPMENT: u32 = 0x20;
const ID_ACTOR_PICK_REQUEST: u32 = 0x23;
const ID_PLAYER_ACTION: u32 = 0x24;
const ID_SET_ACTOR_DATA: u32 = 0x27;
const ID_INVENTORY_CONTENT: u32 = 0x31;
const ID_INVENTORY_SLOT: u32 = 0x32;
const ID_CRAFTING_DATA: u32 = 0x34;
const ID_ADVENTURE_SETTINGS: u32 = 0x37;
const ID_BLOCK_ACTOR_DATA: u32 = 0x38;
const ID_LEVEL_CHUNK: u32 = 0x3a;
const ID_REQUEST_CHUNK_RADIUS: u32 = 0x45;
const ID_GAME_RULES_CHANGED: u32 = 0x48;
const ID_COMMAND_REQUEST: u32 = 0x4d;
const ID_SET_TITLE: u32 = 0x58;
const ID_MODAL_FORM_RESPONSE: u32 = 0x65;
const ID_UPDATE_BLOCK_SYNCED: u32 = 0x6e;
const ID_SPAWN_PARTICLE_EFFECT: u32 = 0x76;
const ID_NETWORK_CHUNK_PUBLISHER_UPDATE: u32 = 0x79;
const ID_NETWORK_SETTINGS: u32 = 0x8f;
const ID_PLAYER_AUTH_INPUT: u32 = 0x90;
const ID_CREATIVE_CONTENT: u32 = 0x91;
const ID_ITEM_STACK_REQUEST: u32 = 0x93;

// === Legacy-only structure codecs ===

fn read_adventure_settings(buf: &mut BytesMut) -> CodecResult<Packet> {
    Ok(Packet::AdventureSettings {
        flags: read_varu32(buf)?,
        command_permission_level: read_varu32(buf)?,
        action_permissions: read_varu32(buf)?,
        permission_level: read_varu32(buf)?,
        custom_stored_permissions: read_varu32(buf)?,
        player_unique_id: read_i64(buf)?,
    })
}

#[allow(clippy::too_many_arguments)]
fn write_adventure_settings(
    buf: &mut BytesMut,
    flags: u32,
    command_permission_level: u32,
    action_permissions: u32,
    permission_level: u32,
    custom_stored_permissions: u32,
    player_unique_id: i64,
) {
    write_varu32(buf, flags);
    write_varu32(buf, command_permission_level);
    write_varu32(buf, action_permissions);
    write_varu32(buf, permission_level);
    write_varu32(buf, custom_stored_permissions);
    write_i64(buf, player_unique_id);
}

fn read_start_game(buf: &mut BytesMut) -> CodecResult<Packet> {
    let mut data = StartGameData {
        entity_unique_id: read_vari64(buf)?,
        entity_runtime_id: read_varu64(buf)?,
        player_game_mode: read_vari32(buf)?,
        player_position: read_vec3(buf)?,
        pitch: read_f32(buf)?,
        yaw: read_f32(buf)?,
        world_seed: read_i64(buf)?,
        dimension: read_vari32(buf)?,
        generator: read_vari32(buf)?,
        world_game_mode: read_vari32(buf)?,
        difficulty: read_vari32(buf)?,
        world_spawn: read_ublock_pos(buf)?,
        achievements_disabled: read_bool(buf)?,
        day_cycle_lock_time: read_vari32(buf)?,
        rain_level: read_f32(buf)?,
        lightning_level: read_f32(buf)?,
        multi_player_game: read_bool(buf)?,
        commands_enabled: read_bool(buf)?,
        texture_pack_required: read_bool(buf)?,
        game_rules: read_game_rules(buf)?,
        bonus_chest_enabled: read_bool(buf)?,
        start_with_map_enabled: read_bool(buf)?,
        player_permissions: read_vari32(buf)?,
        server_chunk_tick_radius: read_vari32(buf)?,
        base_game_version: read_string(buf, MAX_STRING_LEN)?,
        level_id: read_string(buf, MAX_STRING_LEN)?,
        world_name: read_string(buf, MAX_STRING_LEN)?,
        trial: read_bool(buf)?,
        ..StartGameData::default()
    };
    // This version carries the movement mode alone, without the rewind
    // settings that joined it later.
    data.server_authoritative_movement_mode = read_varu32(buf)?;
    data.time = read_i64(buf)?;
    data.enchantment_seed = read_vari32(buf)?;
    data.multi_player_correlation_id = read_string(buf, MAX_STRING_LEN)?;
    data.server_authoritative_inventory = read_bool(buf)?;
    Ok(Packet::StartGame(Box::new(data)))
}

fn write_start_game(buf: &mut BytesMut, data: &StartGameData) {
    write_vari64(buf, data.entity_unique_id);
    write_varu64(buf, data.entity_runtime_id);
    write_vari32(buf, data.player_game_mode);
    write_vec3(buf, &data.player_position);
    write_f32(buf, data.pitch);
    write_f32(buf, data.yaw);
    write_i64(buf, data.world_seed);
    write_vari32(buf, data.dimension);
    write_vari32(buf, data.generator);
    write_vari32(buf, data.world_game_mode);
    write_vari32(buf, data.difficulty);
    write_ublock_pos(buf, &data.world_spawn);
    write_bool(buf, data.achievements_disabled);
    write_vari32(buf, data.day_cycle_lock_time);
    write_f32(buf, data.rain_level);
    write_f32(buf, data.lightning_level);
    write_bool(buf, data.multi_player_game);
    write_bool(buf, data.commands_enabled);
    write_bool(buf, data.texture_pack_required);
    write_game_rules(buf, &data.game_rules);
    write_bool(buf, data.bonus_chest_enabled);
    write_bool(buf, data.start_with_map_enabled);
    write_vari32(buf, data.player_permissions);
    write_vari32(buf, data.server_chunk_tick_radius);
    write_string(buf, &data.base_game_version);
    write_string(buf, &data.level_id);
    write_string(buf, &data.world_name);
    write_bool(buf, data.trial);
    write_varu32(buf, data.server_authoritative_movement_mode);
    write_i64(buf, data.time);
    write_vari32(buf, data.enchantment_seed);
    write_string(buf, &data.multi_player_correlation_id);
    write_bool(buf, data.server_authoritative_inventory);
}

// === Decoding ===

fn decode(
    id: u32,
    buf: &mut BytesMut,
    io: &LegacyItemIo,
    ctx: &SessionContext,
) -> CodecResult<Packet> {
    let packet = match id {
        ID_ACTOR_PICK_REQUEST => Packet::ActorPickRequest {
            entity_unique_id: read_i64(buf)?,
            hotbar_slot: read_u8(buf)?,
            with_data: false,
        },
        ID_COMMAND_REQUEST => Packet::CommandRequest {
            command_line: read_string(buf, MAX_STRING_LEN)?,
            origin: read_command_origin(buf)?,
            internal: read_bool(buf)?,
            version: 0,
        },
        ID_MODAL_FORM_RESPONSE => Packet::ModalFormResponse {
            form_id: read_varu32(buf)?,
            // The legacy response is unconditional; a cancelled form sends
            // the JSON literal "null" here.
            response_data: Some(read_byte_slice(buf, "form response")?),
            cancel_reason: None,
        },
        ID_PLAYER_ACTION => {
            let entity_runtime_id = read_varu64(buf)?;
            let action_type = read_vari32(buf)?;
            let block_position = read_ublock_pos(buf)?;
            let block_face = read_vari32(buf)?;
            Packet::PlayerAction {
                entity_runtime_id,
                action_type,
                block_position,
                result_position: block_position,
                block_face,
            }
        }
        ID_PLAYER_AUTH_INPUT => {
            let pitch = read_f32(buf)?;
            let yaw = read_f32(buf)?;
            let position = read_vec3(buf)?;
            let move_vector = read_vec2(buf)?;
            let head_yaw = read_f32(buf)?;
            let input_data = read_varu64(buf)?;
            let input_mode = read_varu32(buf)?;
            let play_mode = read_varu32(buf)?;
            let gaze_direction = if play_mode == play_mode::REALITY {
                read_vec3(buf)?
            } else {
                Default::default()
            };
            Packet::PlayerAuthInput {
                pitch,
                yaw,
                position,
                move_vector,
                head_yaw,
                input_data,
                input_mode,
                play_mode,
                interaction_model: interaction_model::TOUCH,
                gaze_direction,
                tick: read_varu64(buf)?,
                delta: read_vec3(buf)?,
            }
        }
        ID_REQUEST_CHUNK_RADIUS => Packet::RequestChunkRadius {
            chunk_radius: read_vari32(buf)?,
            max_chunk_radius: 0,
        },
        ID_ITEM_STACK_REQUEST => {
            let count = check_len(read_varu32(buf)? as u64, 64, "stack request list")?;
            let mut requests = Vec::with_capacity(count);
            for _ in 0..count {
                let request_id = read_vari32(buf)?;
                let action_count =
                    check_len(read_varu32(buf)? as u64, 256, "stack request actions")?;
                let mut actions = Vec::with_capacity(action_count);
                for _ in 0..action_count {
                    actions.push(read_stack_request_action(buf, io, ctx)?);
                }
                requests.push(StackRequestEntry {
                    request_id,
                    actions,
                    filter_strings: Vec::new(),
                });
            }
            Packet::ItemStackRequest { requests }
        }
        ID_INVENTORY_TRANSACTION => Packet::InventoryTransaction {
            legacy_request_id: read_vari32(buf)?,
            payload: buf.split().to_vec(),
        },
        ID_TICK_SYNC => Packet::TickSync {
            client_request_timestamp: read_i64(buf)?,
            server_reception_timestamp: read_i64(buf)?,
        },
        ID_ADVENTURE_SETTINGS => read_adventure_settings(buf)?,
        ID_SET_ACTOR_DATA => Packet::SetActorData {
            entity_runtime_id: read_varu64(buf)?,
            metadata: read_metadata(buf)?,
            tick: read_varu64(buf)?,
        },
        ID_MOB_EQUIPMENT => Packet::MobEquipment {
            entity_runtime_id: read_varu64(buf)?,
            new_item: io.read_item_instance(buf, ctx)?,
            inventory_slot: read_u8(buf)?,
            hotbar_slot: read_u8(buf)?,
            window_id: read_u8(buf)?,
        },
        ID_MOB_ARMOUR_EQUIPMENT => Packet::MobArmourEquipment {
            entity_runtime_id: read_varu64(buf)?,
            helmet: io.read_item_instance(buf, ctx)?,
            chestplate: io.read_item_instance(buf, ctx)?,
            leggings: io.read_item_instance(buf, ctx)?,
            boots: io.read_item_instance(buf, ctx)?,
        },
        ID_ADD_ACTOR => {
            let entity_unique_id = read_vari64(buf)?;
            let entity_runtime_id = read_varu64(buf)?;
            let entity_type = read_string(buf, MAX_STRING_LEN)?;
            let position = read_vec3(buf)?;
            let velocity = read_vec3(buf)?;
            let pitch = read_f32(buf)?;
            let yaw = read_f32(buf)?;
            let head_yaw = read_f32(buf)?;
            Packet::AddActor {
                entity_unique_id,
                entity_runtime_id,
                entity_type,
                position,
                velocity,
                pitch,
                yaw,
                head_yaw,
                body_yaw: yaw,
                attributes: read_attribute_values(buf)?,
                metadata: read_metadata(buf)?,
                entity_links: read_entity_links(buf)?,
            }
        }
        ID_ADD_PLAYER => {
            let uuid = read_uuid(buf)?;
            let username = read_string(buf, MAX_STRING_LEN)?;
            // The wire carries the unique ID twice; the copy in the flat
            // permission block below wins when they disagree.
            let _entity_unique_id = read_vari64(buf)?;
            let entity_runtime_id = read_varu64(buf)?;
            let platform_chat_id = read_string(buf, MAX_STRING_LEN)?;
            let position = read_vec3(buf)?;
            let velocity = read_vec3(buf)?;
            let pitch = read_f32(buf)?;
            let yaw = read_f32(buf)?;
            let head_yaw = read_f32(buf)?;
            let held_item = io.read_item_instance(buf, ctx)?;
            let metadata = read_metadata(buf)?;
            let flags = read_varu32(buf)?;
            let command_permission_level = read_varu32(buf)?;
            let action_permissions = read_varu32(buf)?;
            let permission_level = read_varu32(buf)?;
            let _custom_stored_permissions = read_varu32(buf)?;
            let user_id = read_i64(buf)?;
            let entity_links = read_entity_links(buf)?;
            let device_id = read_string(buf, MAX_STRING_LEN)?;
            let build_platform = read_u32(buf)? as i32;
            Packet::AddPlayer(Box::new(AddPlayerData {
                uuid,
                username,
                entity_runtime_id,
                platform_chat_id,
                position,
                velocity,
                pitch,
                yaw,
                head_yaw,
                held_item,
                game_type: 0,
                metadata,
                ability_data: upgrader::abilities_from_adventure(
                    flags,
                    action_permissions,
                    command_permission_level,
                    permission_level,
                    user_id,
                ),
                entity_links,
                device_id,
                build_platform,
            }))
        }
        ID_UPDATE_ATTRIBUTES => Packet::UpdateAttributes {
            entity_runtime_id: read_varu64(buf)?,
            attributes: read_full_attributes(buf)?,
            tick: read_varu64(buf)?,
        },
        ID_GAME_RULES_CHANGED => Packet::GameRulesChanged {
            game_rules: read_game_rules(buf)?,
        },
        ID_SET_TITLE => Packet::SetTitle {
            action_type: read_vari32(buf)?,
            text: read_string(buf, MAX_STRING_LEN)?,
            fade_in_duration: read_vari32(buf)?,
            remain_duration: read_vari32(buf)?,
            fade_out_duration: read_vari32(buf)?,
            xuid: String::new(),
            platform_online_id: String::new(),
        },
        ID_NETWORK_CHUNK_PUBLISHER_UPDATE => Packet::NetworkChunkPublisherUpdate {
            position: read_block_pos(buf)?,
            radius: read_varu32(buf)?,
            saved_chunks: Vec::new(),
        },
        ID_SPAWN_PARTICLE_EFFECT => Packet::SpawnParticleEffect {
            dimension: read_u8(buf)?,
            entity_unique_id: read_vari64(buf)?,
            position: read_vec3(buf)?,
            particle_name: read_string(buf, MAX_STRING_LEN)?,
            molang_variables: None,
        },
        ID_NETWORK_SETTINGS => Packet::NetworkSettings {
            compression_threshold: read_u16(buf)?,
            compression_algorithm: 0,
            client_throttle: false,
            client_throttle_threshold: 0,
            client_throttle_scalar: 0.0,
        },
        ID_CRAFTING_DATA => read_crafting_data(buf, io, ctx)?,
        ID_CREATIVE_CONTENT => {
            let count = check_len(read_varu32(buf)? as u64, 4096, "creative item list")?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(CreativeItem {
                    creative_item_network_id: read_varu32(buf)?,
                    item: io.read_item_stack(buf, ctx)?,
                });
            }
            Packet::CreativeContent { items }
        }
        ID_INVENTORY_CONTENT => {
            let window_id = read_varu32(buf)?;
            let count = check_len(read_varu32(buf)? as u64, 1024, "inventory content")?;
            let mut content = Vec::with_capacity(count);
            for _ in 0..count {
                content.push(io.read_item_instance(buf, ctx)?);
            }
            Packet::InventoryContent { window_id, content }
        }
        ID_INVENTORY_SLOT => Packet::InventorySlot {
            window_id: read_varu32(buf)?,
            slot: read_varu32(buf)?,
            new_item: io.read_item_instance(buf, ctx)?,
        },
        ID_UPDATE_BLOCK => Packet::UpdateBlock {
            position: read_ublock_pos(buf)?,
            new_block_runtime_id: read_varu32(buf)?,
            flags: read_varu32(buf)?,
            layer: read_varu32(buf)?,
        },
        ID_UPDATE_BLOCK_SYNCED => Packet::UpdateBlockSynced {
            position: read_ublock_pos(buf)?,
            new_block_runtime_id: read_varu32(buf)?,
            flags: read_varu32(buf)?,
            layer: read_varu32(buf)?,
            entity_unique_id: read_varu64(buf)?,
            transition_type: read_varu64(buf)?,
        },
        ID_LEVEL_CHUNK => read_level_chunk(buf)?,
        ID_BLOCK_ACTOR_DATA => Packet::BlockActorData {
            position: read_ublock_pos(buf)?,
            nbt: NbtValue::read_root(buf, Encoding::NetworkLittleEndian)?.1,
        },
        ID_START_GAME => read_start_game(buf)?,
        _ => Packet::Unknown {
            id,
            payload: buf.split().to_vec(),
        },
    };
    Ok(packet)
}

// === Encoding ===

fn encode(
    packet: &Packet,
    io: &LegacyItemIo,
    ctx: &SessionContext,
) -> CodecResult<(u32, BytesMut)> {
    let mut buf = BytesMut::new();
    let id = match packet {
        Packet::ActorPickRequest {
            entity_unique_id,
            hotbar_slot,
            with_data: _,
        } => {
            write_i64(&mut buf, *entity_unique_id);
            write_u8(&mut buf, *hotbar_slot);
            ID_ACTOR_PICK_REQUEST
        }
        Packet::CommandRequest {
            command_line,
            origin,
            internal,
            version: _,
        } => {
            write_string(&mut buf, command_line);
            write_command_origin(&mut buf, origin);
            write_bool(&mut buf, *internal);
            ID_COMMAND_REQUEST
        }
        Packet::ModalFormResponse {
            form_id,
            response_data,
            cancel_reason: _,
        } => {
            write_varu32(&mut buf, *form_id);
            // A cancelled latest-side response has no data; the legacy wire
            // spells cancellation as the JSON literal "null".
            match response_data {
                Some(data) => write_byte_slice(&mut buf, data),
                None => write_byte_slice(&mut buf, b"null"),
            }
            ID_MODAL_FORM_RESPONSE
        }
        Packet::PlayerAction {
            entity_runtime_id,
            action_type,
            block_position,
            result_position: _,
            block_face,
        } => {
            write_varu64(&mut buf, *entity_runtime_id);
            write_vari32(&mut buf, *action_type);
            write_ublock_pos(&mut buf, block_position);
            write_vari32(&mut buf, *block_face);
            ID_PLAYER_ACTION
        }
        Packet::PlayerAuthInput {
            pitch,
            yaw,
            position,
            move_vector,
            head_yaw,
            input_data,
            input_mode,
            play_mode,
            interaction_model: _,
            gaze_direction,
            tick,
            delta,
        } => {
            write_f32(&mut buf, *pitch);
            write_f32(&mut buf, *yaw);
            write_vec3(&mut buf, position);
            write_vec2(&mut buf, move_vector);
            write_f32(&mut buf, *head_yaw);
            write_varu64(&mut buf, *input_data);
            write_varu32(&mut buf, *input_mode);
            write_varu32(&mut buf, *play_mode);
            if *play_mode == play_mode::REALITY {
                write_vec3(&mut buf, gaze_direction);
            }
            write_varu64(&mut buf, *tick);
            write_vec3(&mut buf, delta);
            ID_PLAYER_AUTH_INPUT
        }
        Packet::RequestChunkRadius { chunk_radius, .. } => {
            write_vari32(&mut buf, *chunk_radius);
            ID_REQUEST_CHUNK_RADIUS
        }
        Packet::ItemStackRequest { requests } => {
            write_varu32(&mut buf, requests.len() as u32);
            for request in requests {
                write_vari32(&mut buf, request.request_id);
                write_varu32(&mut buf, request.actions.len() as u32);
                for action in &request.actions {
                    write_stack_request_action(&mut buf, action, io, ctx);
                }
            }
            ID_ITEM_STACK_REQUEST
        }
        Packet::InventoryTransaction {
            legacy_request_id,
            payload,
        } => {
            write_vari32(&mut buf, *legacy_request_id);
            buf.put_slice(payload);
            ID_INVENTORY_TRANSACTION
        }
        Packet::TickSync {
            client_request_timestamp,
            server_reception_timestamp,
        } => {
            write_i64(&mut buf, *client_request_timestamp);
            write_i64(&mut buf, *server_reception_timestamp);
            ID_TICK_SYNC
        }
        Packet::AdventureSettings {
            flags,
            command_permission_level,
            action_permissions,
            permission_level,
            custom_stored_permissions,
            player_unique_id,
        } => {
            write_adventure_settings(
                &mut buf,
                *flags,
                *command_permission_level,
                *action_permissions,
                *permission_level,
                *custom_stored_permissions,
                *player_unique_id,
            );
            ID_ADVENTURE_SETTINGS
        }
        Packet::SetActorData {
            entity_runtime_id,
            metadata,
            tick,
        } => {
            write_varu64(&mut buf, *entity_runtime_id);
            write_metadata(&mut buf, metadata);
            write_varu64(&mut buf, *tick);
            ID_SET_ACTOR_DATA
        }
        Packet::MobEquipment {
            entity_runtime_id,
            new_item,
            inventory_slot,
            hotbar_slot,
            window_id,
        } => {
            write_varu64(&mut buf, *entity_runtime_id);
            io.write_item_instance(&mut buf, new_item, ctx);
            write_u8(&mut buf, *inventory_slot);
            write_u8(&mut buf, *hotbar_slot);
            write_u8(&mut buf, *window_id);
            ID_MOB_EQUIPMENT
        }
        Packet::MobArmourEquipment {
            entity_runtime_id,
            helmet,
            chestplate,
            leggings,
            boots,
        } => {
            write_varu64(&mut buf, *entity_runtime_id);
            io.write_item_instance(&mut buf, helmet, ctx);
            io.write_item_instance(&mut buf, chestplate, ctx);
            io.write_item_instance(&mut buf, leggings, ctx);
            io.write_item_instance(&mut buf, boots, ctx);
            ID_MOB_ARMOUR_EQUIPMENT
        }
        Packet::AddActor {
            entity_unique_id,
            entity_runtime_id,
            entity_type,
            position,
            velocity,
            pitch,
            yaw,
            head_yaw,
            body_yaw: _,
            attributes,
            metadata,
            entity_links,
        } => {
            write_vari64(&mut buf, *entity_unique_id);
            write_varu64(&mut buf, *entity_runtime_id);
            write_string(&mut buf, entity_type);
            write_vec3(&mut buf, position);
            write_vec3(&mut buf, velocity);
            write_f32(&mut buf, *pitch);
            write_f32(&mut buf, *yaw);
            write_f32(&mut buf, *head_yaw);
            write_attribute_values(&mut buf, attributes);
            write_metadata(&mut buf, metadata);
            write_entity_links(&mut buf, entity_links);
            ID_ADD_ACTOR
        }
        Packet::AddPlayer(data) => {
            let (flags, action_permissions) =
                downgrader::adventure_from_abilities(&data.ability_data);
            write_uuid(&mut buf, &data.uuid);
            write_string(&mut buf, &data.username);
            write_vari64(&mut buf, data.ability_data.entity_unique_id);
            write_varu64(&mut buf, data.entity_runtime_id);
            write_string(&mut buf, &data.platform_chat_id);
            write_vec3(&mut buf, &data.position);
            write_vec3(&mut buf, &data.velocity);
            write_f32(&mut buf, data.pitch);
            write_f32(&mut buf, data.yaw);
            write_f32(&mut buf, data.head_yaw);
            io.write_item_instance(&mut buf, &data.held_item, ctx);
            write_metadata(&mut buf, &data.metadata);
            write_adventure_settings(
                &mut buf,
                flags,
                data.ability_data.command_permissions as u32,
                action_permissions,
                data.ability_data.player_permissions as u32,
                0,
                data.ability_data.entity_unique_id,
            );
            write_entity_links(&mut buf, &data.entity_links);
            write_string(&mut buf, &data.device_id);
            write_u32(&mut buf, data.build_platform as u32);
            ID_ADD_PLAYER
        }
        Packet::UpdateAttributes {
            entity_runtime_id,
            attributes,
            tick,
        } => {
            write_varu64(&mut buf, *entity_runtime_id);
            write_full_attributes(&mut buf, attributes);
            write_varu64(&mut buf, *tick);
            ID_UPDATE_ATTRIBUTES
        }
        Packet::GameRulesChanged { game_rules } => {
            write_game_rules(&mut buf, game_rules);
            ID_GAME_RULES_CHANGED
        }
        Packet::SetTitle {
            action_type,
            text,
            fade_in_duration,
            remain_duration,
            fade_out_duration,
            xuid: _,
            platform_online_id: _,
        } => {
            write_vari32(&mut buf, *action_type);
            write_string(&mut buf, text);
            write_vari32(&mut buf, *fade_in_duration);
            write_vari32(&mut buf, *remain_duration);
            write_vari32(&mut buf, *fade_out_duration);
            ID_SET_TITLE
        }
        Packet::NetworkChunkPublisherUpdate {
            position,
            radius,
            saved_chunks: _,
        } => {
            write_block_pos(&mut buf, position);
            write_varu32(&mut buf, *radius);
            ID_NETWORK_CHUNK_PUBLISHER_UPDATE
        }
        Packet::SpawnParticleEffect {
            dimension,
            entity_unique_id,
            position,
            particle_name,
            molang_variables: _,
        } => {
            write_u8(&mut buf, *dimension);
            write_vari64(&mut buf, *entity_unique_id);
            write_vec3(&mut buf, position);
            write_string(&mut buf, particle_name);
            ID_SPAWN_PARTICLE_EFFECT
        }
        Packet::NetworkSettings {
            compression_threshold,
            ..
        } => {
            write_u16(&mut buf, *compression_threshold);
            ID_NETWORK_SETTINGS
        }
        Packet::CraftingData {
            recipes,
            potion_recipes,
            potion_container_change_recipes,
            clear_recipes,
        } => {
            write_crafting_data(
                &mut buf,
                recipes,
                potion_recipes,
                potion_container_change_recipes,
                *clear_recipes,
                io,
                ctx,
            );
            ID_CRAFTING_DATA
        }
        Packet::CreativeContent { items } => {
            write_varu32(&mut buf, items.len() as u32);
            for entry in items {
                write_varu32(&mut buf, entry.creative_item_network_id);
                io.write_item_stack(&mut buf, &entry.item, ctx);
            }
            ID_CREATIVE_CONTENT
        }
        Packet::InventoryContent { window_id, content } => {
            write_varu32(&mut buf, *window_id);
            write_varu32(&mut buf, content.len() as u32);
            for item in content {
                io.write_item_instance(&mut buf, item, ctx);
            }
            ID_INVENTORY_CONTENT
        }
        Packet::InventorySlot {
            window_id,
            slot,
            new_item,
        } => {
            write_varu32(&mut buf, *window_id);
            write_varu32(&mut buf, *slot);
            io.write_item_instance(&mut buf, new_item, ctx);
            ID_INVENTORY_SLOT
        }
        Packet::UpdateBlock {
            position,
            new_block_runtime_id,
            flags,
            layer,
        } => {
            write_ublock_pos(&mut buf, position);
            write_varu32(&mut buf, *new_block_runtime_id);
            write_varu32(&mut buf, *flags);
            write_varu32(&mut buf, *layer);
            ID_UPDATE_BLOCK
        }
        Packet::UpdateBlockSynced {
            position,
            new_block_runtime_id,
            flags,
            layer,
            entity_unique_id,
            transition_type,
        } => {
            write_ublock_pos(&mut buf, position);
            write_varu32(&mut buf, *new_block_runtime_id);
            write_varu32(&mut buf, *flags);
            write_varu32(&mut buf, *layer);
            write_varu64(&mut buf, *entity_unique_id);
            write_varu64(&mut buf, *transition_type);
            ID_UPDATE_BLOCK_SYNCED
        }
        Packet::LevelChunk {
            position,
            sub_chunk_count,
            cache_enabled,
            blob_hashes,
            raw_payload,
        } => {
            write_level_chunk(
                &mut buf,
                position,
                *sub_chunk_count,
                *cache_enabled,
                blob_hashes,
                raw_payload,
            );
            ID_LEVEL_CHUNK
        }
        Packet::BlockActorData { position, nbt } => {
            write_ublock_pos(&mut buf, position);
            nbt.write_root("", &mut buf, Encoding::NetworkLittleEndian);
            ID_BLOCK_ACTOR_DATA
        }
        Packet::StartGame(data) => {
            write_start_game(&mut buf, data);
            ID_START_GAME
        }
        Packet::Unknown { id, payload } => {
            buf.put_slice(payload);
            *id
        }
        Packet::UpdateAdventureSettings { .. } | Packet::UpdateAbilities { .. } => {
            return Err(CodecError::UnsupportedPacket(packet.name()))
        }
    };
    Ok((id, buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shale_types::{ItemInstance, ItemStack, ItemType, Vec2, Vec3};

    fn ctx() -> SessionContext {
        SessionContext::new(mappings::PROTOCOL_VERSION, 589)
    }

    fn roundtrip(packet: Packet) -> Packet {
        let adapter = Protocol419::new();
        let (id, mut buf) = adapter.encode_packet(&packet, &ctx()).unwrap();
        let decoded = adapter.decode_packet(id, &mut buf, &ctx()).unwrap();
        assert!(buf.is_empty(), "{} leaves trailing bytes", packet.name());
        decoded
    }

    #[test]
    fn test_player_auth_input_has_no_interaction_model_on_wire() {
        let packet = Packet::PlayerAuthInput {
            pitch: 3.0,
            yaw: 180.0,
            position: Vec3::new(8.5, 66.0, 8.5),
            move_vector: Vec2::new(0.0, 1.0),
            head_yaw: 180.0,
            input_data: 0,
            input_mode: 2,
            play_mode: play_mode::NORMAL,
            interaction_model: interaction_model::TOUCH,
            gaze_direction: Vec3::default(),
            tick: 77,
            delta: Vec3::default(),
        };
        assert_eq!(roundtrip(packet.clone()), packet);
    }

    #[test]
    fn test_adventure_settings_roundtrip() {
        let packet = Packet::AdventureSettings {
            flags: adventure_flag::ALLOW_FLIGHT | adventure_flag::AUTO_JUMP,
            command_permission_level: 0,
            action_permissions: action_permission::BUILD | action_permission::MINE,
            permission_level: 1,
            custom_stored_permissions: 0,
            player_unique_id: -4,
        };
        assert_eq!(roundtrip(packet.clone()), packet);
    }

    #[test]
    fn test_tick_sync_roundtrip() {
        let packet = Packet::TickSync {
            client_request_timestamp: 112,
            server_reception_timestamp: 119,
        };
        assert_eq!(roundtrip(packet.clone()), packet);
    }

    #[test]
    fn test_mob_equipment_uses_legacy_item_layout() {
        let packet = Packet::MobEquipment {
            entity_runtime_id: 5,
            new_item: ItemInstance {
                stack_network_id: 2,
                stack: ItemStack {
                    item_type: ItemType {
                        network_id: 280,
                        metadata: 0,
                    },
                    block_runtime_id: 0,
                    count: 4,
                    nbt: None,
                    can_be_placed_on: Vec::new(),
                    can_break: Vec::new(),
                },
            },
            inventory_slot: 0,
            hotbar_slot: 0,
            window_id: 0,
        };
        assert_eq!(roundtrip(packet.clone()), packet);
    }

    #[test]
    fn test_add_player_synthesises_abilities() {
        let adapter = Protocol419::new();
        let data = AddPlayerData {
            uuid: uuid::Uuid::from_u128(99),
            username: "Alex".into(),
            entity_runtime_id: 12,
            platform_chat_id: String::new(),
            position: Vec3::new(1.0, 65.0, -3.0),
            velocity: Vec3::default(),
            pitch: 0.0,
            yaw: 45.0,
            head_yaw: 45.0,
            held_item: ItemInstance {
                stack_network_id: 0,
                stack: ItemStack::empty(),
            },
            game_type: 0,
            metadata: EntityMetadataMap::new(),
            ability_data: upgrader::abilities_from_adventure(
                adventure_flag::ALLOW_FLIGHT,
                action_permission::BUILD | action_permission::MINE,
                0,
                1,
                12,
            ),
            entity_links: Vec::new(),
            device_id: "a-1".into(),
            build_platform: 7,
        };
        let packet = Packet::AddPlayer(Box::new(data));
        let (id, mut buf) = adapter.encode_packet(&packet, &ctx()).unwrap();
        assert_eq!(id, ID_ADD_PLAYER);
        let decoded = adapter.decode_packet(id, &mut buf, &ctx()).unwrap();
        assert!(buf.is_empty());
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_start_game_roundtrip() {
        let packet = Packet::StartGame(Box::new(StartGameData {
            entity_unique_id: -2,
            entity_runtime_id: 2,
            player_position: Vec3::new(0.5, 70.0, 0.5),
            base_game_version: "1.16.100".into(),
            level_id: "bGV2ZWw=".into(),
            world_name: "shale".into(),
            time: 13000,
            ..StartGameData::default()
        }));
        assert_eq!(roundtrip(packet.clone()), packet);
    }

    #[test]
    fn test_latest_only_packets_unrepresentable() {
        let adapter = Protocol419::new();
        let err = adapter
            .encode_packet(
                &Packet::UpdateAdventureSettings {
                    no_pvm: false,
                    no_mvp: false,
                    immutable_world: false,
                    show_name_tags: true,
                    auto_jump: true,
                },
                &ctx(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedPacket("UpdateAdventureSettings")
        ));
    }
}
