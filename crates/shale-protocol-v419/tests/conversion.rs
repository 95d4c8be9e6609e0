use bytes::{BufMut, BytesMut};
use shale_nbt::{nbt_compound, NbtValue};
use shale_protocol_core::*;
use shale_protocol_v419::Protocol419;
use shale_types::{BlockPos, ItemInstance, ItemStack, ItemType, Vec2, Vec3};

fn ctx() -> SessionContext {
    SessionContext::new(419, 589)
}

fn auth_input() -> Packet {
    Packet::PlayerAuthInput {
        pitch: 0.0,
        yaw: 90.0,
        position: Vec3::new(0.5, 64.0, 0.5),
        move_vector: Vec2::new(0.0, 1.0),
        head_yaw: 90.0,
        input_data: 1 << 2,
        input_mode: 1,
        play_mode: play_mode::NORMAL,
        interaction_model: interaction_model::TOUCH,
        gaze_direction: Vec3::default(),
        tick: 300,
        delta: Vec3::default(),
    }
}

#[test]
fn test_upgraded_auth_input_reports_crosshair() {
    let adapter = Protocol419::new();
    let out = adapter.convert_to_latest(auth_input(), &ctx()).unwrap();
    assert_eq!(out.len(), 1);
    match &out[0] {
        Packet::PlayerAuthInput {
            interaction_model, ..
        } => assert_eq!(*interaction_model, interaction_model::CROSSHAIR),
        other => panic!("expected PlayerAuthInput, got {}", other.name()),
    }
}

#[test]
fn test_upgraded_chunk_radius_mirrors_maximum() {
    let adapter = Protocol419::new();
    let out = adapter
        .convert_to_latest(
            Packet::RequestChunkRadius {
                chunk_radius: 12,
                max_chunk_radius: 0,
            },
            &ctx(),
        )
        .unwrap();
    assert_eq!(
        out,
        vec![Packet::RequestChunkRadius {
            chunk_radius: 12,
            max_chunk_radius: 12,
        }]
    );
}

#[test]
fn test_tick_sync_suppressed_on_upgrade() {
    let adapter = Protocol419::new();
    let out = adapter
        .convert_to_latest(
            Packet::TickSync {
                client_request_timestamp: 1,
                server_reception_timestamp: 2,
            },
            &ctx(),
        )
        .unwrap();
    assert!(out.is_empty());

    let out = adapter
        .convert_to_latest(
            Packet::AdventureSettings {
                flags: 0,
                command_permission_level: 0,
                action_permissions: 0,
                permission_level: 0,
                custom_stored_permissions: 0,
                player_unique_id: 0,
            },
            &ctx(),
        )
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_empty_ability_update_produces_nothing() {
    let adapter = Protocol419::new();
    let mut ctx = ctx();
    ctx.entity_unique_id = 5;
    let out = adapter
        .convert_from_latest(
            Packet::UpdateAbilities {
                ability_data: AbilityData {
                    entity_unique_id: 5,
                    player_permissions: 1,
                    command_permissions: 0,
                    layers: Vec::new(),
                },
            },
            &ctx,
        )
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_foreign_ability_update_produces_nothing() {
    let adapter = Protocol419::new();
    let mut ctx = ctx();
    ctx.entity_unique_id = 5;
    let out = adapter
        .convert_from_latest(
            Packet::UpdateAbilities {
                ability_data: AbilityData {
                    entity_unique_id: 6,
                    player_permissions: 1,
                    command_permissions: 0,
                    layers: vec![AbilityLayer {
                        layer_type: 1,
                        abilities: u32::MAX,
                        values: ability::MAY_FLY,
                        fly_speed: 0.05,
                        walk_speed: 0.1,
                    }],
                },
            },
            &ctx,
        )
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_own_ability_update_becomes_adventure_settings() {
    let adapter = Protocol419::new();
    let mut ctx = ctx();
    ctx.entity_unique_id = 5;
    let out = adapter
        .convert_from_latest(
            Packet::UpdateAbilities {
                ability_data: AbilityData {
                    entity_unique_id: 5,
                    player_permissions: 2,
                    command_permissions: 1,
                    layers: vec![AbilityLayer {
                        layer_type: 1,
                        abilities: u32::MAX,
                        values: ability::MAY_FLY | ability::BUILD | ability::MINE,
                        fly_speed: 0.05,
                        walk_speed: 0.1,
                    }],
                },
            },
            &ctx,
        )
        .unwrap();
    assert_eq!(out.len(), 1);
    match &out[0] {
        Packet::AdventureSettings {
            flags,
            command_permission_level,
            action_permissions,
            permission_level,
            player_unique_id,
            ..
        } => {
            assert_ne!(flags & adventure_flag::ALLOW_FLIGHT, 0);
            assert_ne!(action_permissions & action_permission::BUILD, 0);
            assert_ne!(action_permissions & action_permission::MINE, 0);
            assert_eq!(*command_permission_level, 1);
            assert_eq!(*permission_level, 2);
            assert_eq!(*player_unique_id, 5);
        }
        other => panic!("expected AdventureSettings, got {}", other.name()),
    }
}

#[test]
fn test_latest_flag_set_suppressed_on_downgrade() {
    let adapter = Protocol419::new();
    let out = adapter
        .convert_from_latest(
            Packet::UpdateAdventureSettings {
                no_pvm: false,
                no_mvp: false,
                immutable_world: false,
                show_name_tags: true,
                auto_jump: true,
            },
            &ctx(),
        )
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_unknown_packet_passes_through_unchanged() {
    let adapter = Protocol419::new();
    let packet = Packet::Unknown {
        id: 0xE0,
        payload: vec![1, 2, 3],
    };
    assert_eq!(
        adapter.convert_to_latest(packet.clone(), &ctx()).unwrap(),
        vec![packet.clone()]
    );
    assert_eq!(
        adapter.convert_from_latest(packet.clone(), &ctx()).unwrap(),
        vec![packet]
    );
}

#[test]
fn test_every_shared_item_name_round_trips() {
    let legacy = shale_protocol_v419::item_mapping();
    let latest = shale_protocol_latest::item_mapping();
    let mut shared = 0;
    for name in legacy.names() {
        let Some(latest_id) = latest.runtime_id_for(name, 0) else {
            continue;
        };
        shared += 1;
        assert_eq!(latest.name_for(latest_id), Some(name), "latest {name}");
        let legacy_id = legacy.runtime_id_for(name, 0).unwrap();
        assert_eq!(legacy.name_for(legacy_id), Some(name), "legacy {name}");
    }
    assert!(shared > 0);
}

#[test]
fn test_every_shared_block_state_round_trips() {
    let legacy = shale_protocol_v419::block_mapping();
    let latest = shale_protocol_latest::block_mapping();
    let mut shared = 0;
    for (runtime_id, state) in legacy.states().iter().enumerate() {
        let Some(latest_id) = latest.runtime_id_for(state) else {
            continue;
        };
        shared += 1;
        assert_eq!(latest.state_for(latest_id), Some(state), "state {}", state.name);
        assert_eq!(legacy.runtime_id_for(state), Some(runtime_id as u32));
    }
    assert!(shared > 0);
}

#[test]
fn test_lossless_packet_survives_both_directions() {
    let adapter = Protocol419::new();
    let packet = Packet::NetworkChunkPublisherUpdate {
        position: BlockPos::new(16, 64, -48),
        radius: 96,
        saved_chunks: Vec::new(),
    };

    let up = adapter.convert_to_latest(packet.clone(), &ctx()).unwrap();
    assert_eq!(up, vec![packet.clone()]);
    let down = adapter
        .convert_from_latest(up.into_iter().next().unwrap(), &ctx())
        .unwrap();
    assert_eq!(down, vec![packet]);
}

#[test]
fn test_item_translation_between_palettes() {
    let adapter = Protocol419::new();
    let stick = |network_id| Packet::MobEquipment {
        entity_runtime_id: 1,
        new_item: ItemInstance {
            stack_network_id: 9,
            stack: ItemStack {
                item_type: ItemType {
                    network_id,
                    metadata: 0,
                },
                block_runtime_id: 0,
                count: 3,
                nbt: None,
                can_be_placed_on: Vec::new(),
                can_break: Vec::new(),
            },
        },
        inventory_slot: 0,
        hotbar_slot: 0,
        window_id: 0,
    };
    // Legacy stick 280 upgrades to the latest stick ID.
    let out = adapter.convert_to_latest(stick(280), &ctx()).unwrap();
    assert_eq!(out, vec![stick(321)]);
    // And back down.
    let out = adapter.convert_from_latest(stick(321), &ctx()).unwrap();
    assert_eq!(out, vec![stick(280)]);
}

#[test]
fn test_unmapped_item_downgrades_to_empty() {
    let adapter = Protocol419::new();
    let latest_items = shale_protocol_latest::item_mapping();
    let echo_shard = latest_items
        .runtime_id_for("minecraft:echo_shard", 0)
        .expect("latest palette has echo shards");
    let out = adapter
        .convert_from_latest(
            Packet::InventorySlot {
                window_id: 0,
                slot: 4,
                new_item: ItemInstance {
                    stack_network_id: 30,
                    stack: ItemStack {
                        item_type: ItemType {
                            network_id: echo_shard,
                            metadata: 0,
                        },
                        block_runtime_id: 0,
                        count: 1,
                        nbt: None,
                        can_be_placed_on: Vec::new(),
                        can_break: Vec::new(),
                    },
                },
            },
            &ctx(),
        )
        .unwrap();
    match &out[0] {
        Packet::InventorySlot { new_item, .. } => {
            assert!(new_item.stack.is_empty());
            assert_eq!(new_item.stack_network_id, 0);
        }
        other => panic!("expected InventorySlot, got {}", other.name()),
    }
}

#[test]
fn test_chunk_palette_downgrades_unmapped_block_to_air() {
    let adapter = Protocol419::new();
    let latest_blocks = shale_protocol_latest::block_mapping();
    let legacy_blocks = shale_protocol_v419::block_mapping();
    let sculk = latest_blocks
        .runtime_id_for(&BlockState::new("minecraft:sculk"))
        .expect("latest palette has sculk");
    let stone = {
        let mut state = BlockState::new("minecraft:stone");
        state
            .properties
            .insert("stone_type".into(), PropertyValue::String("stone".into()));
        latest_blocks.runtime_id_for(&state).expect("stone mapped")
    };

    // One sub-chunk, one 4-bit layer: 512 packed words then the palette.
    let mut payload = BytesMut::new();
    payload.put_u8(8);
    payload.put_u8(1);
    payload.put_u8((4 << 1) | 1);
    payload.put_slice(&[0u8; 512 * 4]);
    write_vari32(&mut payload, 2);
    write_vari32(&mut payload, sculk as i32);
    write_vari32(&mut payload, stone as i32);
    payload.put_slice(&[0x2a; 16]); // biome tail

    let out = adapter
        .convert_from_latest(
            Packet::LevelChunk {
                position: shale_types::ChunkPos::new(3, -2),
                sub_chunk_count: 1,
                cache_enabled: false,
                blob_hashes: Vec::new(),
                raw_payload: payload.to_vec(),
            },
            &ctx(),
        )
        .unwrap();
    let rewritten = match &out[0] {
        Packet::LevelChunk { raw_payload, .. } => raw_payload.clone(),
        other => panic!("expected LevelChunk, got {}", other.name()),
    };

    let mut buf = BytesMut::from(&rewritten[..]);
    buf.split_to(3 + 512 * 4);
    assert_eq!(read_vari32(&mut buf).unwrap(), 2);
    // Sculk does not exist in the legacy palette and falls back to air.
    assert_eq!(
        read_vari32(&mut buf).unwrap() as u32,
        legacy_blocks.air_runtime_id()
    );
    assert_ne!(
        read_vari32(&mut buf).unwrap() as u32,
        legacy_blocks.air_runtime_id()
    );
    assert_eq!(buf.to_vec(), vec![0x2a; 16]);
}

#[test]
fn test_metadata_flags_repacked_on_upgrade() {
    let adapter = Protocol419::new();
    let mut metadata = EntityMetadataMap::new();
    metadata.insert(DATA_KEY_FLAGS, MetadataValue::Long(1 << 58));
    metadata.insert(91, MetadataValue::Long(1));
    let out = adapter
        .convert_to_latest(
            Packet::SetActorData {
                entity_runtime_id: 2,
                metadata,
                tick: 10,
            },
            &ctx(),
        )
        .unwrap();
    match &out[0] {
        Packet::SetActorData { metadata, .. } => {
            assert_eq!(
                metadata.get(&DATA_KEY_FLAGS),
                Some(&MetadataValue::Long(1 << 59))
            );
            assert_eq!(
                metadata.get(&data_key::FLAGS_TWO),
                Some(&MetadataValue::Long(2))
            );
        }
        other => panic!("expected SetActorData, got {}", other.name()),
    }
}

#[test]
fn test_sign_text_remapped_both_ways() {
    let adapter = Protocol419::new();
    let legacy_sign = Packet::BlockActorData {
        position: BlockPos::new(1, 64, 1),
        nbt: nbt_compound! {
            "id" => NbtValue::String("Sign".into()),
            "Text" => NbtValue::String("no mining".into()),
        },
    };
    let out = adapter.convert_to_latest(legacy_sign, &ctx()).unwrap();
    let upgraded_nbt = match &out[0] {
        Packet::BlockActorData { nbt, .. } => nbt.clone(),
        other => panic!("expected BlockActorData, got {}", other.name()),
    };
    assert_eq!(
        upgraded_nbt
            .get("FrontText")
            .and_then(|front| front.get("Text"))
            .and_then(NbtValue::as_str),
        Some("no mining")
    );
    assert!(upgraded_nbt.get("BackText").is_some());

    let out = adapter
        .convert_from_latest(
            Packet::BlockActorData {
                position: BlockPos::new(1, 64, 1),
                nbt: upgraded_nbt,
            },
            &ctx(),
        )
        .unwrap();
    match &out[0] {
        Packet::BlockActorData { nbt, .. } => {
            assert_eq!(nbt.get("Text").and_then(NbtValue::as_str), Some("no mining"));
            assert!(nbt.get("FrontText").is_none());
        }
        other => panic!("expected BlockActorData, got {}", other.name()),
    }
}

#[test]
fn test_smithing_recipes_dropped_on_downgrade() {
    let adapter = Protocol419::new();
    let out = adapter
        .convert_from_latest(
            Packet::CraftingData {
                recipes: vec![Recipe::SmithingTransform(SmithingRecipe {
                    recipe_id: "minecraft:netherite_sword".into(),
                    template: ItemDescriptorCount {
                        descriptor: ItemDescriptor::Invalid,
                        count: 1,
                    },
                    base: ItemDescriptorCount {
                        descriptor: ItemDescriptor::Invalid,
                        count: 1,
                    },
                    addition: ItemDescriptorCount {
                        descriptor: ItemDescriptor::Invalid,
                        count: 1,
                    },
                    output: ItemStack::empty(),
                    block: "smithing_table".into(),
                    recipe_network_id: 90,
                })],
                potion_recipes: Vec::new(),
                potion_container_change_recipes: Vec::new(),
                clear_recipes: false,
            },
            &ctx(),
        )
        .unwrap();
    match &out[0] {
        Packet::CraftingData { recipes, .. } => assert!(recipes.is_empty()),
        other => panic!("expected CraftingData, got {}", other.name()),
    }
}
