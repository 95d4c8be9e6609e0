//! Structural downgrades from the latest shapes to the legacy ones. The
//! inverse of the upgrader where an inverse exists; latest-only structures
//! are flattened or dropped.

use shale_nbt::{nbt_compound, NbtValue};
use shale_protocol_core::{
    ability, action_permission, adventure_flag, data_key, AbilityData, EntityMetadataMap,
    ItemDescriptor, ItemDescriptorCount, ItemMapping, MetadataValue, Recipe, DATA_KEY_FLAGS,
};

use crate::upgrader::{DASH_FLAG_BIT, LEGACY_DATA_KEY_FLAGS_TWO};

const LOW_MASK: u64 = (1 << DASH_FLAG_BIT) - 1;

/// Repack the latest flag words into the legacy layout. The latest bit at
/// [`DASH_FLAG_BIT`] has no legacy counterpart and is discarded; all higher
/// bits slide down one position, pulling the first bit of the second word
/// into the top of the first.
pub fn downgrade_flag_words(f1: i64, f2: i64) -> (i64, i64) {
    let (f1, f2) = (f1 as u64, f2 as u64);
    let low = f1 & LOW_MASK;
    let high = (f1 >> (DASH_FLAG_BIT + 1)) << DASH_FLAG_BIT;
    let l1 = low | high | ((f2 & 1) << 63);
    let l2 = f2 >> 1;
    (l1 as i64, l2 as i64)
}

/// Translate a latest entity data key into the legacy key space. Inverse of
/// [`crate::upgrader::upgrade_data_key`] over the legacy key space; see the
/// domain note there.
pub fn downgrade_data_key(key: u32) -> u32 {
    use data_key as k;
    match key {
        k::RADIUS => 60,
        k::WAITING => 61,
        k::PARTICLE => 62,
        k::ATTACH_FACE => 64,
        k::ATTACHED_POSITION => 66,
        k::TRADE_TARGET => 67,
        k::COMMAND_NAME => 70,
        k::LAST_COMMAND_OUTPUT => 71,
        k::TRACK_COMMAND_OUTPUT => 72,
        k::CONTROLLING_SEAT_INDEX => 73,
        k::STRENGTH => 74,
        k::STRENGTH_MAX => 75,
        k::LIFETIME_TICKS => 77,
        k::POSE_INDEX => 78,
        k::TICK_OFFSET => 79,
        k::ALWAYS_SHOW_NAME_TAG => 80,
        k::COLOR_TWO_INDEX => 81,
        k::SCORE => 83,
        k::BALLOON_ANCHOR => 84,
        k::PUFFED_STATE => 85,
        k::BUBBLE_TIME => 86,
        k::AGENT => 87,
        k::EATING_COUNTER => 90,
        k::FLAGS_TWO => LEGACY_DATA_KEY_FLAGS_TWO,
        k::DURATION => 94,
        k::SPAWN_TIME => 95,
        k::CHANGE_RATE => 96,
        k::CHANGE_ON_PICKUP => 97,
        k::PICKUP_COUNT => 98,
        k::INTERACT_TEXT => 99,
        k::TRADE_TIER => 100,
        k::MAX_TRADE_TIER => 101,
        k::TRADE_EXPERIENCE => 102,
        k::SKIN_ID => 104,
        k::COMMAND_BLOCK_TICK_DELAY => 105,
        k::COMMAND_BLOCK_EXECUTE_ON_FIRST_TICK => 106,
        k::AMBIENT_SOUND_INTERVAL => 107,
        k::AMBIENT_SOUND_INTERVAL_RANGE => 108,
        k::AMBIENT_SOUND_EVENT_NAME => 109,
        other => other,
    }
}

/// Rebuild an entity metadata map in the legacy key space, repacking the
/// flag words.
pub fn downgrade_metadata(metadata: EntityMetadataMap) -> EntityMetadataMap {
    let mut out = EntityMetadataMap::new();
    let mut flags = None;
    let mut flags_two = None;
    for (key, value) in metadata {
        match (key, &value) {
            (DATA_KEY_FLAGS, MetadataValue::Long(v)) => flags = Some(*v),
            (data_key::FLAGS_TWO, MetadataValue::Long(v)) => flags_two = Some(*v),
            _ => {
                out.insert(downgrade_data_key(key), value);
            }
        }
    }
    if flags.is_some() || flags_two.is_some() {
        let (l1, l2) = downgrade_flag_words(flags.unwrap_or(0), flags_two.unwrap_or(0));
        out.insert(DATA_KEY_FLAGS, MetadataValue::Long(l1));
        out.insert(LEGACY_DATA_KEY_FLAGS_TWO, MetadataValue::Long(l2));
    }
    out
}

/// Rewrite latest two-sided sign block-actor data into the legacy schema.
/// The back side has no legacy representation and is dropped.
pub fn downgrade_block_actor(nbt: NbtValue) -> NbtValue {
    let is_sign = nbt
        .get("id")
        .and_then(NbtValue::as_str)
        .map(|id| id == "Sign")
        .unwrap_or(false);
    if !is_sign {
        return nbt;
    }
    let mut nbt = nbt;
    let _ = nbt.remove("BackText");
    if let Some(front) = nbt.remove("FrontText") {
        let text = front
            .get("Text")
            .and_then(NbtValue::as_str)
            .unwrap_or_default()
            .to_owned();
        nbt.insert("Text", NbtValue::String(text));
    }
    nbt
}

/// Flatten layered ability data into the legacy adventure flag pair:
/// `(flags, action_permissions)`. Layer values are ORed together, matching
/// how the client applies layers in order.
pub fn adventure_from_abilities(data: &AbilityData) -> (u32, u32) {
    let mut values = 0;
    for layer in &data.layers {
        values |= layer.values & layer.abilities;
    }
    let mut flags = 0;
    let mut action_permissions = 0;
    let flag_pairs = [
        (ability::MAY_FLY, adventure_flag::ALLOW_FLIGHT),
        (ability::FLYING, adventure_flag::FLYING),
        (ability::NO_CLIP, adventure_flag::NO_CLIP),
        (ability::WORLD_BUILDER, adventure_flag::WORLD_BUILDER),
        (ability::MUTED, adventure_flag::MUTED),
    ];
    for (ability_bit, flag) in flag_pairs {
        if values & ability_bit != 0 {
            flags |= flag;
        }
    }
    let permission_pairs = [
        (ability::BUILD, action_permission::BUILD),
        (ability::MINE, action_permission::MINE),
        (
            ability::DOORS_AND_SWITCHES,
            action_permission::DOORS_AND_SWITCHES,
        ),
        (
            ability::OPEN_CONTAINERS,
            action_permission::OPEN_CONTAINERS,
        ),
        (ability::ATTACK_PLAYERS, action_permission::ATTACK_PLAYERS),
        (ability::ATTACK_MOBS, action_permission::ATTACK_MOBS),
        (
            ability::OPERATOR_COMMANDS,
            action_permission::OPERATOR_COMMANDS,
        ),
        (ability::TELEPORT, action_permission::TELEPORT),
    ];
    for (ability_bit, permission) in permission_pairs {
        if values & ability_bit != 0 {
            action_permissions |= permission;
        }
    }
    (flags, action_permissions)
}

/// Resolve a descriptor into a form the legacy layout can carry. Deferred
/// descriptors resolve against the legacy item palette; tag and alias
/// descriptors have no legacy meaning and become empty slots.
pub fn downgrade_descriptor(
    desc: ItemDescriptorCount,
    items: &ItemMapping,
) -> ItemDescriptorCount {
    let count = desc.count;
    let descriptor = match desc.descriptor {
        d @ (ItemDescriptor::Invalid | ItemDescriptor::Default { .. }) => d,
        ItemDescriptor::Deferred { name, metadata } => {
            match items.runtime_id_for(&name, metadata as u32) {
                Some(network_id) => ItemDescriptor::Default {
                    network_id: network_id as i16,
                    metadata,
                },
                None => ItemDescriptor::Invalid,
            }
        }
        ItemDescriptor::ItemTag { .. } | ItemDescriptor::ComplexAlias { .. } => {
            ItemDescriptor::Invalid
        }
    };
    ItemDescriptorCount { descriptor, count }
}

/// Strip recipes the legacy client cannot parse and resolve descriptor
/// forms it cannot carry.
pub fn downgrade_recipes(recipes: Vec<Recipe>, items: &ItemMapping) -> Vec<Recipe> {
    recipes
        .into_iter()
        .filter(|recipe| !matches!(recipe, Recipe::SmithingTransform(_)))
        .map(|recipe| match recipe {
            Recipe::Shapeless(mut r) => {
                r.input = r
                    .input
                    .into_iter()
                    .map(|d| downgrade_descriptor(d, items))
                    .collect();
                Recipe::Shapeless(r)
            }
            Recipe::Shaped(mut r) => {
                r.input = r
                    .input
                    .into_iter()
                    .map(|d| downgrade_descriptor(d, items))
                    .collect();
                Recipe::Shaped(r)
            }
            Recipe::ShulkerBox(mut r) => {
                r.input = r
                    .input
                    .into_iter()
                    .map(|d| downgrade_descriptor(d, items))
                    .collect();
                Recipe::ShulkerBox(r)
            }
            Recipe::ShapelessChemistry(mut r) => {
                r.input = r
                    .input
                    .into_iter()
                    .map(|d| downgrade_descriptor(d, items))
                    .collect();
                Recipe::ShapelessChemistry(r)
            }
            Recipe::ShapedChemistry(mut r) => {
                r.input = r
                    .input
                    .into_iter()
                    .map(|d| downgrade_descriptor(d, items))
                    .collect();
                Recipe::ShapedChemistry(r)
            }
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappings;
    use shale_protocol_core::AbilityLayer;

    #[test]
    fn test_dash_bit_discarded() {
        let (l1, l2) = downgrade_flag_words(1 << DASH_FLAG_BIT, 0);
        assert_eq!((l1, l2), (0, 0));

        let (l1, l2) = downgrade_flag_words(1 << (DASH_FLAG_BIT + 1), 0);
        assert_eq!((l1, l2), (1 << DASH_FLAG_BIT, 0));
    }

    #[test]
    fn test_second_word_pulls_down() {
        let (l1, l2) = downgrade_flag_words(0, 0b11);
        assert_eq!(l1, i64::MIN); // bit 63
        assert_eq!(l2, 0b1);
    }

    /// Every remapped legacy key, plus passthrough keys below the remapped
    /// window, the slots neither version moved, and one far above it.
    const LEGACY_KEYS: [u32; 47] = [
        0, 4, 38, 59, 60, 61, 62, 64, 66, 67, 69, 70, 71, 72, 73, 74, 75, 77, 78, 79, 80, 81, 83,
        84, 85, 86, 87, 89, 90, 91, 93, 94, 95, 96, 97, 98, 99, 100, 101, 102, 104, 105, 106, 107,
        108, 109, 200,
    ];

    #[test]
    fn test_metadata_key_remap_roundtrip() {
        for key in LEGACY_KEYS {
            let latest = crate::upgrader::upgrade_data_key(key);
            assert_eq!(downgrade_data_key(latest), key, "key {key}");
        }
    }

    #[test]
    fn test_vacated_slot_is_not_a_passthrough() {
        // Latest 110 is a remapped key; the number is a vacated slot in the
        // legacy space, not a legacy key that passes through.
        assert_eq!(
            downgrade_data_key(data_key::AMBIENT_SOUND_EVENT_NAME),
            109
        );
        assert!(!LEGACY_KEYS.contains(&110));
    }

    #[test]
    fn test_sign_downgrade_keeps_front_text() {
        let sign = nbt_compound! {
            "id" => NbtValue::String("Sign".into()),
            "FrontText" => nbt_compound! {
                "Text" => NbtValue::String("left side".into()),
            },
            "BackText" => nbt_compound! {
                "Text" => NbtValue::String("right side".into()),
            },
        };
        let down = downgrade_block_actor(sign);
        assert_eq!(down.get("Text").and_then(NbtValue::as_str), Some("left side"));
        assert!(down.get("FrontText").is_none());
        assert!(down.get("BackText").is_none());
    }

    #[test]
    fn test_adventure_from_abilities_masks_by_layer() {
        let data = AbilityData {
            entity_unique_id: 1,
            player_permissions: 1,
            command_permissions: 0,
            layers: vec![AbilityLayer {
                layer_type: 1,
                abilities: ability::MAY_FLY | ability::MINE,
                values: ability::MAY_FLY | ability::MINE | ability::NO_CLIP,
                fly_speed: 0.05,
                walk_speed: 0.1,
            }],
        };
        let (flags, permissions) = adventure_from_abilities(&data);
        assert_ne!(flags & adventure_flag::ALLOW_FLIGHT, 0);
        // NO_CLIP is outside the layer's ability mask and must not leak.
        assert_eq!(flags & adventure_flag::NO_CLIP, 0);
        assert_ne!(permissions & action_permission::MINE, 0);
    }

    #[test]
    fn test_deferred_descriptor_resolves_against_palette() {
        let items = mappings::item_mapping();
        let resolved = downgrade_descriptor(
            ItemDescriptorCount {
                descriptor: ItemDescriptor::Deferred {
                    name: "minecraft:stick".into(),
                    metadata: 0,
                },
                count: 2,
            },
            &items,
        );
        assert_eq!(
            resolved.descriptor,
            ItemDescriptor::Default {
                network_id: 280,
                metadata: 0,
            }
        );

        let unknown = downgrade_descriptor(
            ItemDescriptorCount {
                descriptor: ItemDescriptor::Deferred {
                    name: "minecraft:echo_shard".into(),
                    metadata: 0,
                },
                count: 1,
            },
            &items,
        );
        assert_eq!(unknown.descriptor, ItemDescriptor::Invalid);
    }
}
