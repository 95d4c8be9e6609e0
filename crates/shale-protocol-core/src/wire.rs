//! Wire codecs for composite structures whose layout both supported
//! versions agree on. Structures that differ per version live in the
//! version crates; item-shaped fields go through the version's [`ItemIo`].

use bytes::BytesMut;
use shale_types::{Attribute, ChunkPos, EntityLink, GameRule, GameRuleValue};

use crate::codec::{
    check_len, read_bool, read_byte_slice, read_f32, read_i64, read_string, read_u16, read_u32,
    read_u8, read_uuid, read_vari32, read_vari64, read_varu32, write_bool, write_byte_slice,
    write_f32, write_i64, write_string, write_u16, write_u32, write_u8, write_uuid, write_vari32,
    write_vari64, write_varu32, CodecError, CodecResult, MAX_STRING_LEN,
};
use crate::io::ItemIo;
use crate::packets::{AbilityData, AbilityLayer, AttributeValue, CommandOrigin, Packet};
use crate::recipe::{
    read_recipe, write_recipe, PotionContainerChangeRecipe, PotionRecipe, Recipe,
};
use crate::session::SessionContext;

/// Command origins whose requests carry a player unique ID.
pub const ORIGIN_DEV_CONSOLE: u32 = 5;
pub const ORIGIN_TEST: u32 = 12;

pub fn read_attribute_values(buf: &mut BytesMut) -> CodecResult<Vec<AttributeValue>> {
    let count = check_len(read_varu32(buf)? as u64, 256, "attribute list")?;
    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        attributes.push(AttributeValue {
            name: read_string(buf, MAX_STRING_LEN)?,
            min: read_f32(buf)?,
            value: read_f32(buf)?,
            max: read_f32(buf)?,
        });
    }
    Ok(attributes)
}

pub fn write_attribute_values(buf: &mut BytesMut, attributes: &[AttributeValue]) {
    write_varu32(buf, attributes.len() as u32);
    for attribute in attributes {
        write_string(buf, &attribute.name);
        write_f32(buf, attribute.min);
        write_f32(buf, attribute.value);
        write_f32(buf, attribute.max);
    }
}

pub fn read_full_attributes(buf: &mut BytesMut) -> CodecResult<Vec<Attribute>> {
    let count = check_len(read_varu32(buf)? as u64, 256, "attribute list")?;
    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        attributes.push(Attribute {
            min: read_f32(buf)?,
            max: read_f32(buf)?,
            value: read_f32(buf)?,
            default: read_f32(buf)?,
            name: read_string(buf, MAX_STRING_LEN)?,
        });
    }
    Ok(attributes)
}

pub fn write_full_attributes(buf: &mut BytesMut, attributes: &[Attribute]) {
    write_varu32(buf, attributes.len() as u32);
    for attribute in attributes {
        write_f32(buf, attribute.min);
        write_f32(buf, attribute.max);
        write_f32(buf, attribute.value);
        write_f32(buf, attribute.default);
        write_string(buf, &attribute.name);
    }
}

pub fn read_entity_links(buf: &mut BytesMut) -> CodecResult<Vec<EntityLink>> {
    let count = check_len(read_varu32(buf)? as u64, 256, "entity link list")?;
    let mut links = Vec::with_capacity(count);
    for _ in 0..count {
        links.push(EntityLink {
            ridden_entity_unique_id: read_vari64(buf)?,
            rider_entity_unique_id: read_vari64(buf)?,
            link_type: read_u8(buf)?,
            immediate: read_bool(buf)?,
            rider_initiated: read_bool(buf)?,
        });
    }
    Ok(links)
}

pub fn write_entity_links(buf: &mut BytesMut, links: &[EntityLink]) {
    write_varu32(buf, links.len() as u32);
    for link in links {
        write_vari64(buf, link.ridden_entity_unique_id);
        write_vari64(buf, link.rider_entity_unique_id);
        write_u8(buf, link.link_type);
        write_bool(buf, link.immediate);
        write_bool(buf, link.rider_initiated);
    }
}

pub fn read_game_rules(buf: &mut BytesMut) -> CodecResult<Vec<GameRule>> {
    let count = check_len(read_varu32(buf)? as u64, 256, "game rule list")?;
    let mut rules = Vec::with_capacity(count);
    for _ in 0..count {
        let name = read_string(buf, MAX_STRING_LEN)?;
        let can_be_modified_by_player = read_bool(buf)?;
        let value = match read_varu32(buf)? {
            1 => GameRuleValue::Bool(read_bool(buf)?),
            2 => GameRuleValue::Int(read_varu32(buf)?),
            3 => GameRuleValue::Float(read_f32(buf)?),
            other => {
                return Err(CodecError::UnknownEnumTag {
                    value: other as u64,
                    field: "game rule type",
                })
            }
        };
        rules.push(GameRule {
            name,
            can_be_modified_by_player,
            value,
        });
    }
    Ok(rules)
}

pub fn write_game_rules(buf: &mut BytesMut, rules: &[GameRule]) {
    write_varu32(buf, rules.len() as u32);
    for rule in rules {
        write_string(buf, &rule.name);
        write_bool(buf, rule.can_be_modified_by_player);
        match &rule.value {
            GameRuleValue::Bool(v) => {
                write_varu32(buf, 1);
                write_bool(buf, *v);
            }
            GameRuleValue::Int(v) => {
                write_varu32(buf, 2);
                write_varu32(buf, *v);
            }
            GameRuleValue::Float(v) => {
                write_varu32(buf, 3);
                write_f32(buf, *v);
            }
        }
    }
}

pub fn read_ability_data(buf: &mut BytesMut) -> CodecResult<AbilityData> {
    let entity_unique_id = read_i64(buf)?;
    let player_permissions = read_u8(buf)?;
    let command_permissions = read_u8(buf)?;
    let count = check_len(read_u8(buf)? as u64, 8, "ability layer list")?;
    let mut layers = Vec::with_capacity(count);
    for _ in 0..count {
        layers.push(AbilityLayer {
            layer_type: read_u16(buf)?,
            abilities: read_u32(buf)?,
            values: read_u32(buf)?,
            fly_speed: read_f32(buf)?,
            walk_speed: read_f32(buf)?,
        });
    }
    Ok(AbilityData {
        entity_unique_id,
        player_permissions,
        command_permissions,
        layers,
    })
}

pub fn write_ability_data(buf: &mut BytesMut, data: &AbilityData) {
    write_i64(buf, data.entity_unique_id);
    write_u8(buf, data.player_permissions);
    write_u8(buf, data.command_permissions);
    write_u8(buf, data.layers.len() as u8);
    for layer in &data.layers {
        write_u16(buf, layer.layer_type);
        write_u32(buf, layer.abilities);
        write_u32(buf, layer.values);
        write_f32(buf, layer.fly_speed);
        write_f32(buf, layer.walk_speed);
    }
}

pub fn read_command_origin(buf: &mut BytesMut) -> CodecResult<CommandOrigin> {
    let origin = read_varu32(buf)?;
    let uuid = read_uuid(buf)?;
    let request_id = read_string(buf, MAX_STRING_LEN)?;
    let player_unique_id = if origin == ORIGIN_DEV_CONSOLE || origin == ORIGIN_TEST {
        read_vari64(buf)?
    } else {
        0
    };
    Ok(CommandOrigin {
        origin,
        uuid,
        request_id,
        player_unique_id,
    })
}

pub fn write_command_origin(buf: &mut BytesMut, origin: &CommandOrigin) {
    write_varu32(buf, origin.origin);
    write_uuid(buf, &origin.uuid);
    write_string(buf, &origin.request_id);
    if origin.origin == ORIGIN_DEV_CONSOLE || origin.origin == ORIGIN_TEST {
        write_vari64(buf, origin.player_unique_id);
    }
}

pub fn read_chunk_pos(buf: &mut BytesMut) -> CodecResult<ChunkPos> {
    Ok(ChunkPos::new(read_vari32(buf)?, read_vari32(buf)?))
}

pub fn write_chunk_pos(buf: &mut BytesMut, pos: &ChunkPos) {
    write_vari32(buf, pos.x);
    write_vari32(buf, pos.z);
}

pub fn read_crafting_data(
    buf: &mut BytesMut,
    io: &dyn ItemIo,
    ctx: &SessionContext,
) -> CodecResult<Packet> {
    let recipe_count = check_len(read_varu32(buf)? as u64, 4096, "recipe list")?;
    let mut recipes = Vec::with_capacity(recipe_count);
    for _ in 0..recipe_count {
        recipes.push(read_recipe(buf, io, ctx)?);
    }
    let potion_count = check_len(read_varu32(buf)? as u64, 1024, "potion recipe list")?;
    let mut potion_recipes = Vec::with_capacity(potion_count);
    for _ in 0..potion_count {
        potion_recipes.push(PotionRecipe {
            input_potion_id: read_vari32(buf)?,
            input_potion_metadata: read_vari32(buf)?,
            reagent_item_id: read_vari32(buf)?,
            reagent_item_metadata: read_vari32(buf)?,
            output_potion_id: read_vari32(buf)?,
            output_potion_metadata: read_vari32(buf)?,
        });
    }
    let container_count = check_len(read_varu32(buf)? as u64, 1024, "container recipe list")?;
    let mut potion_container_change_recipes = Vec::with_capacity(container_count);
    for _ in 0..container_count {
        potion_container_change_recipes.push(PotionContainerChangeRecipe {
            input_item_id: read_vari32(buf)?,
            reagent_item_id: read_vari32(buf)?,
            output_item_id: read_vari32(buf)?,
        });
    }
    Ok(Packet::CraftingData {
        recipes,
        potion_recipes,
        potion_container_change_recipes,
        clear_recipes: read_bool(buf)?,
    })
}

pub fn write_crafting_data(
    buf: &mut BytesMut,
    recipes: &[Recipe],
    potion_recipes: &[PotionRecipe],
    potion_container_change_recipes: &[PotionContainerChangeRecipe],
    clear_recipes: bool,
    io: &dyn ItemIo,
    ctx: &SessionContext,
) {
    write_varu32(buf, recipes.len() as u32);
    for recipe in recipes {
        write_recipe(buf, recipe, io, ctx);
    }
    write_varu32(buf, potion_recipes.len() as u32);
    for r in potion_recipes {
        write_vari32(buf, r.input_potion_id);
        write_vari32(buf, r.input_potion_metadata);
        write_vari32(buf, r.reagent_item_id);
        write_vari32(buf, r.reagent_item_metadata);
        write_vari32(buf, r.output_potion_id);
        write_vari32(buf, r.output_potion_metadata);
    }
    write_varu32(buf, potion_container_change_recipes.len() as u32);
    for r in potion_container_change_recipes {
        write_vari32(buf, r.input_item_id);
        write_vari32(buf, r.reagent_item_id);
        write_vari32(buf, r.output_item_id);
    }
    write_bool(buf, clear_recipes);
}

pub fn read_level_chunk(buf: &mut BytesMut) -> CodecResult<Packet> {
    let position = read_chunk_pos(buf)?;
    let sub_chunk_count = read_varu32(buf)?;
    let cache_enabled = read_bool(buf)?;
    let mut blob_hashes = Vec::new();
    if cache_enabled {
        let count = check_len(read_varu32(buf)? as u64, 64, "blob hash list")?;
        for _ in 0..count {
            blob_hashes.push(read_i64(buf)? as u64);
        }
    }
    Ok(Packet::LevelChunk {
        position,
        sub_chunk_count,
        cache_enabled,
        blob_hashes,
        raw_payload: read_byte_slice(buf, "chunk payload")?,
    })
}

pub fn write_level_chunk(
    buf: &mut BytesMut,
    position: &ChunkPos,
    sub_chunk_count: u32,
    cache_enabled: bool,
    blob_hashes: &[u64],
    raw_payload: &[u8],
) {
    write_chunk_pos(buf, position);
    write_varu32(buf, sub_chunk_count);
    write_bool(buf, cache_enabled);
    if cache_enabled {
        write_varu32(buf, blob_hashes.len() as u32);
        for hash in blob_hashes {
            write_i64(buf, *hash as i64);
        }
    }
    write_byte_slice(buf, raw_payload);
}
