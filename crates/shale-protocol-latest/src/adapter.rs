use bytes::{BufMut, BytesMut};
use shale_nbt::{Encoding, NbtValue};
use shale_protocol_core::*;

use crate::io::LatestItemIo;
use crate::mappings;

/// Adapter of the latest supported version. Conversion to and from the
/// shared representation is the identity; only the wire codec does work.
pub struct LatestAdapter {
    items: ItemMapping,
    blocks: BlockMapping,
    io: LatestItemIo,
    shield_network_id: i32,
}

impl LatestAdapter {
    pub fn new() -> Self {
        let items = mappings::item_mapping();
        let blocks = mappings::block_mapping();
        let shield_network_id = items.runtime_id_for("minecraft:shield", 0).unwrap_or(0);
        Self {
            items,
            blocks,
            io: LatestItemIo::new(shield_network_id),
            shield_network_id,
        }
    }

    pub fn items(&self) -> &ItemMapping {
        &self.items
    }

    pub fn blocks(&self) -> &BlockMapping {
        &self.blocks
    }
}

impl Default for LatestAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolAdapter for LatestAdapter {
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

    fn convert_to_latest(
        &self,
        packet: Packet,
        _ctx: &SessionContext,
    ) -> CodecResult<Vec<Packet>> {
        Ok(vec![packet])
    }

    fn convert_from_latest(
        &self,
        packet: Packet,
        _ctx: &SessionContext,
    ) -> CodecResult<Vec<Packet>> {
        Ok(vec![packet])
    }

    fn shield_network_id(&self) -> i32 {
        self.shield_network_id
    }

    fn cipher(&self, key: &[u8; 32]) -> Cipher {
        Cipher::Ctr(CtrCipher::new(key))
    }
}

// === Packet ID constants ===

const ID_START_GAME: u32 = 0x0b;
const ID_ADD_PLAYER: u32 = 0x0c;
const ID_ADD_ACTOR: u32 = 0x0d;
const ID_UPDATE_BLOCK: u32 = 0x15;
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
const ID_UPDATE_ABILITIES: u32 = 0xbb;
const ID_UPDATE_ADVENTURE_SETTINGS: u32 = 0xbc;

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
    // Player movement settings block.
    data.server_authoritative_movement_mode = read_varu32(buf)?;
    let _rewind_history_size = read_vari32(buf)?;
    let _server_authoritative_block_breaking = read_bool(buf)?;
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
    write_vari32(buf, 0); // rewind history size
    write_bool(buf, false); // server-authoritative block breaking
    write_i64(buf, data.time);
    write_vari32(buf, data.enchantment_seed);
    write_string(buf, &data.multi_player_correlation_id);
    write_bool(buf, data.server_authoritative_inventory);
}

// === Decoding ===

fn decode(
    id: u32,
    buf: &mut BytesMut,
    io: &LatestItemIo,
    ctx: &SessionContext,
) -> CodecResult<Packet> {
    let packet = match id {
        ID_ACTOR_PICK_REQUEST => Packet::ActorPickRequest {
            entity_unique_id: read_i64(buf)?,
            hotbar_slot: read_u8(buf)?,
            with_data: read_bool(buf)?,
        },
        ID_COMMAND_REQUEST => Packet::CommandRequest {
            command_line: read_string(buf, MAX_STRING_LEN)?,
            origin: read_command_origin(buf)?,
            internal: read_bool(buf)?,
            version: read_vari32(buf)?,
        },
        ID_MODAL_FORM_RESPONSE => Packet::ModalFormResponse {
            form_id: read_varu32(buf)?,
            response_data: if read_bool(buf)? {
                Some(read_byte_slice(buf, "form response")?)
            } else {
                None
            },
            cancel_reason: if read_bool(buf)? {
                Some(read_u8(buf)?)
            } else {
                None
            },
        },
        ID_PLAYER_ACTION => Packet::PlayerAction {
            entity_runtime_id: read_varu64(buf)?,
            action_type: read_vari32(buf)?,
            block_position: read_ublock_pos(buf)?,
            result_position: read_ublock_pos(buf)?,
            block_face: read_vari32(buf)?,
        },
        ID_PLAYER_AUTH_INPUT => {
            let pitch = read_f32(buf)?;
            let yaw = read_f32(buf)?;
            let position = read_vec3(buf)?;
            let move_vector = read_vec2(buf)?;
            let head_yaw = read_f32(buf)?;
            let input_data = read_varu64(buf)?;
            let input_mode = read_varu32(buf)?;
            let play_mode = read_varu32(buf)?;
            let interaction_model = read_vari32(buf)?;
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
                interaction_model,
                gaze_direction,
                tick: read_varu64(buf)?,
                delta: read_vec3(buf)?,
            }
        }
        ID_REQUEST_CHUNK_RADIUS => Packet::RequestChunkRadius {
            chunk_radius: read_vari32(buf)?,
            max_chunk_radius: read_u8(buf)?,
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
                let filter_count =
                    check_len(read_varu32(buf)? as u64, 64, "filter string list")?;
                let mut filter_strings = Vec::with_capacity(filter_count);
                for _ in 0..filter_count {
                    filter_strings.push(read_string(buf, MAX_STRING_LEN)?);
                }
                requests.push(StackRequestEntry {
                    request_id,
                    actions,
                    filter_strings,
                });
            }
            Packet::ItemStackRequest { requests }
        }
        ID_INVENTORY_TRANSACTION => Packet::InventoryTransaction {
            legacy_request_id: read_vari32(buf)?,
            payload: buf.split().to_vec(),
        },
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
        ID_ADD_ACTOR => Packet::AddActor {
            entity_unique_id: read_vari64(buf)?,
            entity_runtime_id: read_varu64(buf)?,
            entity_type: read_string(buf, MAX_STRING_LEN)?,
            position: read_vec3(buf)?,
            velocity: read_vec3(buf)?,
            pitch: read_f32(buf)?,
            yaw: read_f32(buf)?,
            head_yaw: read_f32(buf)?,
            body_yaw: read_f32(buf)?,
            attributes: read_attribute_values(buf)?,
            metadata: read_metadata(buf)?,
            entity_links: read_entity_links(buf)?,
        },
        ID_ADD_PLAYER => {
            let uuid = read_uuid(buf)?;
            let username = read_string(buf, MAX_STRING_LEN)?;
            let entity_runtime_id = read_varu64(buf)?;
            let platform_chat_id = read_string(buf, MAX_STRING_LEN)?;
            let position = read_vec3(buf)?;
            let velocity = read_vec3(buf)?;
            let pitch = read_f32(buf)?;
            let yaw = read_f32(buf)?;
            let head_yaw = read_f32(buf)?;
            let held_item = io.read_item_instance(buf, ctx)?;
            let game_type = read_vari32(buf)?;
            let metadata = read_metadata(buf)?;
            let ability_data = read_ability_data(buf)?;
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
                game_type,
                metadata,
                ability_data,
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
            xuid: read_string(buf, MAX_STRING_LEN)?,
            platform_online_id: read_string(buf, MAX_STRING_LEN)?,
        },
        ID_NETWORK_CHUNK_PUBLISHER_UPDATE => {
            let position = read_block_pos(buf)?;
            let radius = read_varu32(buf)?;
            let count = check_len(read_u32(buf)? as u64, 4096, "saved chunk list")?;
            let mut saved_chunks = Vec::with_capacity(count);
            for _ in 0..count {
                saved_chunks.push(read_chunk_pos(buf)?);
            }
            Packet::NetworkChunkPublisherUpdate {
                position,
                radius,
                saved_chunks,
            }
        }
        ID_SPAWN_PARTICLE_EFFECT => Packet::SpawnParticleEffect {
            dimension: read_u8(buf)?,
            entity_unique_id: read_vari64(buf)?,
            position: read_vec3(buf)?,
            particle_name: read_string(buf, MAX_STRING_LEN)?,
            molang_variables: if read_bool(buf)? {
                Some(read_byte_slice(buf, "molang variables")?)
            } else {
                None
            },
        },
        ID_NETWORK_SETTINGS => Packet::NetworkSettings {
            compression_threshold: read_u16(buf)?,
            compression_algorithm: read_u16(buf)?,
            client_throttle: read_bool(buf)?,
            client_throttle_threshold: read_u8(buf)?,
            client_throttle_scalar: read_f32(buf)?,
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
        ID_UPDATE_ADVENTURE_SETTINGS => Packet::UpdateAdventureSettings {
            no_pvm: read_bool(buf)?,
            no_mvp: read_bool(buf)?,
            immutable_world: read_bool(buf)?,
            show_name_tags: read_bool(buf)?,
            auto_jump: read_bool(buf)?,
        },
        ID_UPDATE_ABILITIES => Packet::UpdateAbilities {
            ability_data: read_ability_data(buf)?,
        },
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
    io: &LatestItemIo,
    ctx: &SessionContext,
) -> CodecResult<(u32, BytesMut)> {
    let mut buf = BytesMut::new();
    let id = match packet {
        Packet::ActorPickRequest {
            entity_unique_id,
            hotbar_slot,
            with_data,
        } => {
            write_i64(&mut buf, *entity_unique_id);
            write_u8(&mut buf, *hotbar_slot);
            write_bool(&mut buf, *with_data);
            ID_ACTOR_PICK_REQUEST
        }
        Packet::CommandRequest {
            command_line,
            origin,
            internal,
            version,
        } => {
            write_string(&mut buf, command_line);
            write_command_origin(&mut buf, origin);
            write_bool(&mut buf, *internal);
            write_vari32(&mut buf, *version);
            ID_COMMAND_REQUEST
        }
        Packet::ModalFormResponse {
            form_id,
            response_data,
            cancel_reason,
        } => {
            write_varu32(&mut buf, *form_id);
            write_bool(&mut buf, response_data.is_some());
            if let Some(data) = response_data {
                write_byte_slice(&mut buf, data);
            }
            write_bool(&mut buf, cancel_reason.is_some());
            if let Some(reason) = cancel_reason {
                write_u8(&mut buf, *reason);
            }
            ID_MODAL_FORM_RESPONSE
        }
        Packet::PlayerAction {
            entity_runtime_id,
            action_type,
            block_position,
            result_position,
            block_face,
        } => {
            write_varu64(&mut buf, *entity_runtime_id);
            write_vari32(&mut buf, *action_type);
            write_ublock_pos(&mut buf, block_position);
            write_ublock_pos(&mut buf, result_position);
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
            interaction_model,
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
            write_vari32(&mut buf, *interaction_model);
            if *play_mode == play_mode::REALITY {
                write_vec3(&mut buf, gaze_direction);
            }
            write_varu64(&mut buf, *tick);
            write_vec3(&mut buf, delta);
            ID_PLAYER_AUTH_INPUT
        }
        Packet::RequestChunkRadius {
            chunk_radius,
            max_chunk_radius,
        } => {
            write_vari32(&mut buf, *chunk_radius);
            write_u8(&mut buf, *max_chunk_radius);
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
                write_varu32(&mut buf, request.filter_strings.len() as u32);
                for filter in &request.filter_strings {
                    write_string(&mut buf, filter);
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
            body_yaw,
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
            write_f32(&mut buf, *body_yaw);
            write_attribute_values(&mut buf, attributes);
            write_metadata(&mut buf, metadata);
            write_entity_links(&mut buf, entity_links);
            ID_ADD_ACTOR
        }
        Packet::AddPlayer(data) => {
            write_uuid(&mut buf, &data.uuid);
            write_string(&mut buf, &data.username);
            write_varu64(&mut buf, data.entity_runtime_id);
            write_string(&mut buf, &data.platform_chat_id);
            write_vec3(&mut buf, &data.position);
            write_vec3(&mut buf, &data.velocity);
            write_f32(&mut buf, data.pitch);
            write_f32(&mut buf, data.yaw);
            write_f32(&mut buf, data.head_yaw);
            io.write_item_instance(&mut buf, &data.held_item, ctx);
            write_vari32(&mut buf, data.game_type);
            write_metadata(&mut buf, &data.metadata);
            write_ability_data(&mut buf, &data.ability_data);
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
            xuid,
            platform_online_id,
        } => {
            write_vari32(&mut buf, *action_type);
            write_string(&mut buf, text);
            write_vari32(&mut buf, *fade_in_duration);
            write_vari32(&mut buf, *remain_duration);
            write_vari32(&mut buf, *fade_out_duration);
            write_string(&mut buf, xuid);
            write_string(&mut buf, platform_online_id);
            ID_SET_TITLE
        }
        Packet::NetworkChunkPublisherUpdate {
            position,
            radius,
            saved_chunks,
        } => {
            write_block_pos(&mut buf, position);
            write_varu32(&mut buf, *radius);
            write_u32(&mut buf, saved_chunks.len() as u32);
            for chunk in saved_chunks {
                write_chunk_pos(&mut buf, chunk);
            }
            ID_NETWORK_CHUNK_PUBLISHER_UPDATE
        }
        Packet::SpawnParticleEffect {
            dimension,
            entity_unique_id,
            position,
            particle_name,
            molang_variables,
        } => {
            write_u8(&mut buf, *dimension);
            write_vari64(&mut buf, *entity_unique_id);
            write_vec3(&mut buf, position);
            write_string(&mut buf, particle_name);
            write_bool(&mut buf, molang_variables.is_some());
            if let Some(variables) = molang_variables {
                write_byte_slice(&mut buf, variables);
            }
            ID_SPAWN_PARTICLE_EFFECT
        }
        Packet::NetworkSettings {
            compression_threshold,
            compression_algorithm,
            client_throttle,
            client_throttle_threshold,
            client_throttle_scalar,
        } => {
            write_u16(&mut buf, *compression_threshold);
            write_u16(&mut buf, *compression_algorithm);
            write_bool(&mut buf, *client_throttle);
            write_u8(&mut buf, *client_throttle_threshold);
            write_f32(&mut buf, *client_throttle_scalar);
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
        Packet::UpdateAdventureSettings {
            no_pvm,
            no_mvp,
            immutable_world,
            show_name_tags,
            auto_jump,
        } => {
            write_bool(&mut buf, *no_pvm);
            write_bool(&mut buf, *no_mvp);
            write_bool(&mut buf, *immutable_world);
            write_bool(&mut buf, *show_name_tags);
            write_bool(&mut buf, *auto_jump);
            ID_UPDATE_ADVENTURE_SETTINGS
        }
        Packet::UpdateAbilities { ability_data } => {
            write_ability_data(&mut buf, ability_data);
            ID_UPDATE_ABILITIES
        }
        Packet::Unknown { id, payload } => {
            buf.put_slice(payload);
            *id
        }
        Packet::TickSync { .. } | Packet::AdventureSettings { .. } => {
            return Err(CodecError::UnsupportedPacket(packet.name()))
        }
    };
    Ok((id, buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shale_types::{BlockPos, GameRule, GameRuleValue, ItemStack, ItemType, Vec2, Vec3};
    use uuid::Uuid;

    fn ctx() -> SessionContext {
        SessionContext::new(mappings::PROTOCOL_VERSION, mappings::PROTOCOL_VERSION)
    }

    fn roundtrip(packet: Packet) -> Packet {
        let adapter = LatestAdapter::new();
        let (id, mut buf) = adapter.encode_packet(&packet, &ctx()).unwrap();
        let decoded = adapter.decode_packet(id, &mut buf, &ctx()).unwrap();
        assert!(buf.is_empty(), "{} leaves trailing bytes", packet.name());
        decoded
    }

    #[test]
    fn test_player_auth_input_roundtrip() {
        let packet = Packet::PlayerAuthInput {
            pitch: -12.5,
            yaw: 90.0,
            position: Vec3::new(0.5, 64.62, -7.5),
            move_vector: Vec2::new(0.0, 1.0),
            head_yaw: 88.0,
            input_data: 1 << 5,
            input_mode: 1,
            play_mode: play_mode::NORMAL,
            interaction_model: interaction_model::CLASSIC,
            gaze_direction: Vec3::default(),
            tick: 4021,
            delta: Vec3::new(0.0, -0.08, 0.0),
        };
        assert_eq!(roundtrip(packet.clone()), packet);
    }

    #[test]
    fn test_mob_equipment_roundtrip() {
        let packet = Packet::MobEquipment {
            entity_runtime_id: 2,
            new_item: shale_types::ItemInstance {
                stack_network_id: 11,
                stack: ItemStack {
                    item_type: ItemType {
                        network_id: 321,
                        metadata: 0,
                    },
                    block_runtime_id: 0,
                    count: 16,
                    nbt: None,
                    can_be_placed_on: Vec::new(),
                    can_break: Vec::new(),
                },
            },
            inventory_slot: 3,
            hotbar_slot: 3,
            window_id: 0,
        };
        assert_eq!(roundtrip(packet.clone()), packet);
    }

    #[test]
    fn test_update_abilities_roundtrip() {
        let packet = Packet::UpdateAbilities {
            ability_data: AbilityData {
                entity_unique_id: -3,
                player_permissions: 1,
                command_permissions: 0,
                layers: vec![AbilityLayer {
                    layer_type: 1,
                    abilities: ability::MAY_FLY | ability::BUILD,
                    values: ability::BUILD,
                    fly_speed: 0.05,
                    walk_speed: 0.1,
                }],
            },
        };
        assert_eq!(roundtrip(packet.clone()), packet);
    }

    #[test]
    fn test_crafting_data_roundtrip() {
        let packet = Packet::CraftingData {
            recipes: vec![
                Recipe::Shapeless(ShapelessRecipe {
                    recipe_id: "shale:stick_bundle".into(),
                    input: vec![ItemDescriptorCount {
                        descriptor: ItemDescriptor::Default {
                            network_id: 321,
                            metadata: 0,
                        },
                        count: 9,
                    }],
                    output: vec![ItemStack {
                        item_type: ItemType {
                            network_id: 321,
                            metadata: 0,
                        },
                        block_runtime_id: 0,
                        count: 9,
                        nbt: None,
                        can_be_placed_on: Vec::new(),
                        can_break: Vec::new(),
                    }],
                    uuid: Uuid::from_u128(7),
                    block: "crafting_table".into(),
                    priority: 0,
                    recipe_network_id: 41,
                }),
                Recipe::Furnace(FurnaceRecipe {
                    input_type: 304,
                    input_metadata: Some(1),
                    output: ItemStack {
                        item_type: ItemType {
                            network_id: 307,
                            metadata: 0,
                        },
                        block_runtime_id: 0,
                        count: 1,
                        nbt: None,
                        can_be_placed_on: Vec::new(),
                        can_break: Vec::new(),
                    },
                    block: "furnace".into(),
                }),
            ],
            potion_recipes: vec![PotionRecipe {
                input_potion_id: 426,
                input_potion_metadata: 5,
                reagent_item_id: 429,
                reagent_item_metadata: 0,
                output_potion_id: 426,
                output_potion_metadata: 6,
            }],
            potion_container_change_recipes: vec![PotionContainerChangeRecipe {
                input_item_id: 426,
                reagent_item_id: 329,
                output_item_id: 567,
            }],
            clear_recipes: true,
        };
        assert_eq!(roundtrip(packet.clone()), packet);
    }

    #[test]
    fn test_start_game_roundtrip() {
        let packet = Packet::StartGame(Box::new(StartGameData {
            entity_unique_id: -2,
            entity_runtime_id: 2,
            player_game_mode: 1,
            player_position: Vec3::new(0.5, 70.0, 0.5),
            world_spawn: BlockPos::new(0, 70, 0),
            game_rules: vec![GameRule {
                name: "doDaylightCycle".into(),
                can_be_modified_by_player: false,
                value: GameRuleValue::Bool(false),
            }],
            base_game_version: "1.20.0".into(),
            level_id: "bGV2ZWw=".into(),
            world_name: "shale".into(),
            server_authoritative_movement_mode: 1,
            time: 6000,
            server_authoritative_inventory: true,
            ..StartGameData::default()
        }));
        assert_eq!(roundtrip(packet.clone()), packet);
    }

    #[test]
    fn test_unknown_id_passes_through() {
        let adapter = LatestAdapter::new();
        let mut buf = BytesMut::from(&[0xDE, 0xAD][..]);
        let decoded = adapter.decode_packet(0xFE, &mut buf, &ctx()).unwrap();
        assert_eq!(
            decoded,
            Packet::Unknown {
                id: 0xFE,
                payload: vec![0xDE, 0xAD],
            }
        );
        let (id, out) = adapter.encode_packet(&decoded, &ctx()).unwrap();
        assert_eq!(id, 0xFE);
        assert_eq!(out.to_vec(), vec![0xDE, 0xAD]);
    }

    #[test]
    fn test_legacy_only_packets_unrepresentable() {
        let adapter = LatestAdapter::new();
        let err = adapter
            .encode_packet(
                &Packet::TickSync {
                    client_request_timestamp: 0,
                    server_reception_timestamp: 0,
                },
                &ctx(),
            )
            .unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedPacket("TickSync")));
    }
}
